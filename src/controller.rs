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
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, error, info, span, Instrument, Level};

use crate::interaction::{Machine, Signal};
use crate::presenter::Presenter;
use crate::samples;
use crate::sound::SoundError;
use crate::storage::Store;
use crate::theme::Theme;

pub mod keyboard;

/// Controller events that drive the interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The pause button went down.
    Press,

    /// The pause button came up.
    Release,

    /// Opens the stats overlay. Ignored during a press.
    Stats,

    /// Closes the stats overlay.
    Close,

    /// Toggles sound on and off.
    Sound,

    /// Toggles between the custom sample and the synthesized snort.
    Custom,

    /// Switches between the pink and blue themes.
    Theme,

    /// Loads an audio file as the custom sample.
    LoadSample(PathBuf),

    /// Removes the custom sample.
    ClearSample,

    /// Stops the controller.
    Quit,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Everything the controller loop owns.
struct App {
    machine: Machine,
    store: Arc<dyn Store>,
    theme: Theme,
    presenter: Box<dyn Presenter>,
}

impl App {
    /// Applies an event. Returns false when the controller should stop.
    fn apply(&mut self, event: Event) -> bool {
        match event {
            Event::Press => {
                self.machine.press();
            }
            Event::Release => {
                self.machine.release();
            }
            Event::Stats => {
                self.machine.open_stats();
            }
            Event::Close => self.machine.close_stats(),
            Event::Sound => {
                let enabled = self.machine.sound().toggle_sound();
                self.presenter
                    .notice(if enabled { "Sound on" } else { "Sound off" });
            }
            Event::Custom => {
                let sound = self.machine.sound();
                let prefer = !sound.preferences().prefer_custom;
                match sound.set_prefer_custom(prefer) {
                    Ok(()) if prefer => self.presenter.notice("Using custom oink"),
                    Ok(()) => self.presenter.notice("Using synthesized snort"),
                    Err(SoundError::NoCustomSample) => {
                        self.presenter.notice("No custom oink loaded")
                    }
                    Err(e) => {
                        error!(err = e.to_string(), "Unable to switch sound");
                        self.presenter.notice("Unable to switch sound");
                    }
                }
            }
            Event::Theme => {
                self.theme = self.theme.toggle(self.store.as_ref());
                self.presenter.notice(&format!("Theme: {}", self.theme));
            }
            Event::LoadSample(path) => match self.load_sample(&path) {
                Ok(()) => self.presenter.notice("Custom oink saved"),
                Err(e) => {
                    error!(path = ?path, err = %e, "Unable to load sample");
                    self.presenter.notice(&format!("Unable to load sample: {}", e));
                }
            },
            Event::ClearSample => {
                self.machine.sound().clear_custom_sample();
                self.presenter.notice("Custom oink removed");
            }
            Event::Quit => return false,
        }
        true
    }

    fn load_sample(&self, path: &Path) -> Result<(), String> {
        let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
        let payload = samples::encode_data_url(&bytes, samples::mime_for_path(path));
        self.machine
            .sound()
            .save_custom_sample(&payload)
            .map_err(|e| e.to_string())
    }

    fn render(&mut self) {
        let view = self.machine.view();
        self.presenter.render(&view, self.theme);
    }
}

/// Drives the interaction machine from a driver and renders the results.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver. `signals` must be the receiver
    /// returned alongside the machine.
    pub fn new(
        machine: Machine,
        signals: UnboundedReceiver<Signal>,
        store: Arc<dyn Store>,
        presenter: Box<dyn Presenter>,
        driver: Arc<dyn Driver>,
    ) -> Controller {
        let theme = Theme::load(store.as_ref());
        let app = App {
            machine,
            store,
            theme,
            presenter,
        };
        Controller {
            handle: tokio::spawn(
                Controller::run(app, signals, driver).instrument(span!(Level::INFO, "controller")),
            ),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    async fn run(mut app: App, mut signals: UnboundedReceiver<Signal>, driver: Arc<dyn Driver>) {
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);

        info!(
            sessions = app.machine.log().len(),
            theme = %app.theme,
            "Controller started."
        );
        app.render();

        loop {
            tokio::select! {
                event = events_rx.recv() => {
                    let Some(event) = event else {
                        info!("Controller closing.");
                        break;
                    };
                    debug!(event = format!("{:?}", event), "Received event.");
                    if !app.apply(event) {
                        info!("Quit requested.");
                        break;
                    }
                }
                Some(signal) = signals.recv() => app.machine.handle(signal),
            }
            app.render();
        }

        // A hold in progress is recorded rather than lost.
        app.machine.release();
        drop(events_rx);
        match join_handle.await {
            Ok(Err(e)) => error!("Event monitor failed: {}", e),
            Err(e) => error!("Error waiting for event monitor to stop: {}", e),
            Ok(Ok(())) => {}
        }
    }
}

#[cfg(test)]
mod test {
    use std::io;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::sync::mpsc::{self, Sender, UnboundedSender};
    use tokio::task::JoinHandle;

    use super::{Controller, Driver, Event};
    use crate::affirmation::OfflineGenerator;
    use crate::haptics::Disabled;
    use crate::interaction::{Machine, Timing};
    use crate::presenter::{Presenter, View};
    use crate::session::SessionLog;
    use crate::sound::SoundDispatcher;
    use crate::storage::{self, MemoryStore, Store};
    use crate::testutil::{mock_context, wav_bytes};
    use crate::theme::Theme;

    /// Forwards events pushed through a channel.
    struct TestDriver {
        events: Mutex<Option<mpsc::UnboundedReceiver<Event>>>,
    }

    impl TestDriver {
        fn new() -> (Arc<TestDriver>, UnboundedSender<Event>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Arc::new(TestDriver {
                    events: Mutex::new(Some(rx)),
                }),
                tx,
            )
        }
    }

    impl Driver for TestDriver {
        fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
            let events = self.events.lock().take();
            tokio::spawn(async move {
                let Some(mut events) = events else {
                    return Ok(());
                };
                while let Some(event) = events.recv().await {
                    if events_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(())
            })
        }
    }

    /// Keeps every rendered view and notice.
    #[derive(Clone, Default)]
    struct Recording {
        views: Arc<Mutex<Vec<(View, Theme)>>>,
        notices: Arc<Mutex<Vec<String>>>,
    }

    impl Presenter for Recording {
        fn render(&mut self, view: &View, theme: Theme) {
            self.views.lock().push((view.clone(), theme));
        }

        fn notice(&mut self, text: &str) {
            self.notices.lock().push(text.to_string());
        }
    }

    fn start(store: Arc<MemoryStore>) -> (Controller, UnboundedSender<Event>, Recording) {
        let (context, _mock) = mock_context(8000);
        let sound = Arc::new(SoundDispatcher::new(context, store.clone()));
        let (machine, signals) = Machine::new(
            sound,
            SessionLog::load(store.clone()),
            Arc::new(Disabled),
            Arc::new(OfflineGenerator),
            Timing::default(),
        );
        let (driver, events) = TestDriver::new();
        let presenter = Recording::default();
        let controller = Controller::new(
            machine,
            signals,
            store,
            Box::new(presenter.clone()),
            driver,
        );
        (controller, events, presenter)
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, events, presenter) = start(store.clone());

        events.send(Event::Press).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        events.send(Event::Release).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        events.send(Event::Theme).unwrap();
        events.send(Event::Stats).unwrap();
        events.send(Event::Quit).unwrap();
        controller.join().await.unwrap();

        let views = presenter.views.lock();
        let (last, theme) = views.last().unwrap();
        assert_eq!(*theme, Theme::Blue);
        assert_eq!(last.stats.as_ref().unwrap().stats.total_count, 1);
        assert!(last.card.is_some());
        assert!(views.iter().any(|(view, _)| view.status_line().starts_with("Breathe")));

        assert!(store.get(storage::HISTORY_KEY).is_some());
        assert_eq!(Theme::load(store.as_ref()), Theme::Blue);
        assert_eq!(*presenter.notices.lock(), vec!["Theme: blue".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sound_settings() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, events, presenter) = start(store.clone());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oink.wav");
        std::fs::write(&path, wav_bytes(1, 8000, &[1000; 800])).unwrap();

        events.send(Event::Custom).unwrap();
        events.send(Event::LoadSample(path)).unwrap();
        events.send(Event::Sound).unwrap();
        events.send(Event::ClearSample).unwrap();
        events
            .send(Event::LoadSample(dir.path().join("missing.wav")))
            .unwrap();
        events.send(Event::Quit).unwrap();
        controller.join().await.unwrap();

        let notices = presenter.notices.lock();
        assert_eq!(notices[0], "No custom oink loaded");
        assert_eq!(notices[1], "Custom oink saved");
        assert_eq!(notices[2], "Sound off");
        assert_eq!(notices[3], "Custom oink removed");
        assert!(notices[4].starts_with("Unable to load sample"));
        assert!(store.get(storage::CUSTOM_SAMPLE_KEY).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_records_hold_in_progress() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, events, _presenter) = start(store.clone());

        events.send(Event::Press).unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        events.send(Event::Quit).unwrap();
        controller.join().await.unwrap();

        assert_eq!(SessionLog::load(store).len(), 1);
    }
}
