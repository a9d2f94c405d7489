// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use oinkpause::affirmation;
use oinkpause::audio::{self, AudioContext};
use oinkpause::config::Settings;
use oinkpause::controller::{keyboard, Controller};
use oinkpause::haptics;
use oinkpause::interaction::{Machine, Timing};
use oinkpause::presenter::{self, TerminalPresenter};
use oinkpause::samples;
use oinkpause::session::SessionLog;
use oinkpause::sound::SoundDispatcher;
use oinkpause::storage::{FileStore, Store};
use oinkpause::synth::{self, SynthParams};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A press-and-hold pause button that oinks."
)]
struct Cli {
    /// The path to the settings file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Starts the interactive pause button.
    Start {},
    /// Lists the available audio output devices.
    Devices {},
    /// Plays the snort through the configured device.
    Snort {
        /// Starting pitch in Hz. Only used with --single.
        #[arg(short, long)]
        pitch: Option<f64>,
        /// Grit rate in Hz. Only used with --single.
        #[arg(short, long)]
        grit: Option<f64>,
        /// Plays one snort instead of the double snort.
        #[arg(short, long)]
        single: bool,
    },
    /// Prints pause statistics and the most recent sessions.
    Stats {},
    /// Saves an audio file as the custom oink.
    LoadSample {
        /// The audio file to use.
        file: PathBuf,
    },
    /// Removes the custom oink.
    ClearSample {},
    /// Prints the effective settings as YAML.
    Config {},
}

fn open_store(settings: &Settings) -> Arc<dyn Store> {
    Arc::new(FileStore::open(&settings.data_file()))
}

fn sound_dispatcher(settings: &Settings, store: Arc<dyn Store>) -> SoundDispatcher {
    let context = Arc::new(AudioContext::new(settings.audio()));
    SoundDispatcher::new(context, store)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Start {} => {
            let store = open_store(&settings);
            let sound = Arc::new(sound_dispatcher(&settings, store.clone()));
            let affirmation = settings.affirmation();
            let timing = Timing {
                tick_interval: settings.tick_interval()?,
                affirmation_timeout: affirmation.timeout()?,
            };
            let (machine, signals) = Machine::new(
                sound,
                SessionLog::load(store.clone()),
                Arc::from(haptics::from_config(settings.haptics())),
                Arc::from(affirmation::from_config(&affirmation)),
                timing,
            );

            Controller::new(
                machine,
                signals,
                store,
                Box::new(TerminalPresenter::new()),
                Arc::new(keyboard::Driver::new()),
            )
            .join()
            .await?;
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Snort {
            pitch,
            grit,
            single,
        } => {
            let context = AudioContext::new(settings.audio());
            let length = if single {
                let defaults = SynthParams::default();
                let params = SynthParams {
                    pitch: pitch.unwrap_or(defaults.pitch),
                    grit: grit.unwrap_or(defaults.grit),
                    ..defaults
                };
                synth::play_snort(&context, params);
                params.duration
            } else {
                synth::play_double_snort(&context);
                synth::SECOND_SNORT_OFFSET + SynthParams::default().duration
            };

            if !context.is_initialized() {
                return Err("audio output is unavailable".into());
            }
            // Let the sound finish before the device closes.
            tokio::time::sleep(Duration::from_secs_f64(length + 0.1)).await;
        }
        Commands::Stats {} => {
            let log = SessionLog::load(open_store(&settings));
            let view = presenter::StatsView {
                stats: log.stats(),
                recent: log.recent(presenter::RECENT_SESSIONS),
            };
            for line in view.lines() {
                println!("{}", line);
            }
        }
        Commands::LoadSample { file } => {
            let sound = sound_dispatcher(&settings, open_store(&settings));
            sound.save_custom_sample(&read_sample(&file)?)?;
            println!("Custom oink saved.");
        }
        Commands::ClearSample {} => {
            let sound = sound_dispatcher(&settings, open_store(&settings));
            sound.clear_custom_sample();
            println!("Custom oink removed.");
        }
        Commands::Config {} => {
            print!("{}", settings.resolved().to_yaml()?);
        }
    }

    Ok(())
}

fn read_sample(file: &Path) -> Result<String, Box<dyn Error>> {
    let bytes = std::fs::read(file)?;
    Ok(samples::encode_data_url(&bytes, samples::mime_for_path(file)))
}
