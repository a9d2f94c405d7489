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
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, span, Level};

use super::mixer::{self, AudioMixer, ScheduledSource, SourceSender};
use super::{next_source_id, AudioError, Source};
use crate::config;

/// Name that selects the host's default output device.
pub const DEFAULT_DEVICE: &str = "default";

/// Commands handled by the thread that owns the cpal stream.
enum StreamCommand {
    Play(Sender<Result<(), AudioError>>),
    Pause(Sender<Result<(), AudioError>>),
    Shutdown,
}

/// Describes an output device without opening it.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// The name of the device.
    pub name: String,
    /// The cpal host the device belongs to.
    pub host: String,
    /// The maximum number of output channels.
    pub max_channels: u16,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name, self.max_channels, self.host
        )
    }
}

/// An open cpal output. The stream lives on its own thread, since cpal streams
/// are not Send on every platform, and the mixer lives inside the stream callback.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// Number of output channels in use.
    channels: u16,
    /// Output sample rate.
    sample_rate: u32,
    /// Frames rendered by the callback so far.
    clock: Arc<AtomicU64>,
    /// Sources are handed to the callback through here.
    source_tx: SourceSender,
    /// Commands for the output thread.
    commands: Sender<StreamCommand>,
    /// Whether the stream is paused.
    suspended: AtomicBool,
    /// Handle to the output thread.
    output_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Device {
    /// Lists output devices across all available hosts.
    pub fn list() -> Result<Vec<DeviceInfo>, AudioError> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout().map_err(|e| AudioError::Unavailable(e.to_string()))?;
        let _shh_stderr = shh::stderr().map_err(|e| AudioError::Unavailable(e.to_string()))?;

        let mut devices = Vec::new();
        for host_id in cpal::available_hosts() {
            let host = match cpal::host_from_id(host_id) {
                Ok(host) => host,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to open host"
                    );
                    continue;
                }
            };
            let host_devices = match host.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Ok(output_configs) = device.supported_output_configs() else {
                    continue;
                };
                let max_channels = output_configs
                    .map(|output_config| output_config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    devices.push(DeviceInfo {
                        name: device.name().unwrap_or_else(|_| "unknown".to_string()),
                        host: host_id.name().to_string(),
                        max_channels,
                    });
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Opens the configured output device and starts its stream.
    pub fn get(config: &config::Audio) -> Result<Device, AudioError> {
        let name = config.device();
        let (device, host_id) = Device::find(name)?;
        let device_name = device.name().unwrap_or_else(|_| name.to_string());

        let default_config = device.default_output_config()?;
        let sample_format = default_config.sample_format();
        let channels = default_config.channels();
        let sample_rate = Device::pick_sample_rate(
            &device,
            sample_format,
            config.sample_rate(),
            default_config.sample_rate().0,
        );

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (mixer, source_tx) = AudioMixer::new(channels, sample_rate);
        let clock = mixer.clock();
        let (commands, command_rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let thread_name = device_name.clone();
        let output_thread = thread::Builder::new()
            .name("oinkpause-audio".to_string())
            .spawn(move || {
                run_output(
                    &thread_name,
                    device,
                    stream_config,
                    sample_format,
                    mixer,
                    command_rx,
                    ready_tx,
                )
            })
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        ready_rx.recv().map_err(|_| AudioError::Closed)??;

        info!(
            device = device_name,
            host = host_id.name(),
            channels,
            sample_rate,
            format = format!("{:?}", sample_format),
            "Opened audio output"
        );

        Ok(Device {
            name: device_name,
            host_id,
            channels,
            sample_rate,
            clock,
            source_tx,
            commands,
            suspended: AtomicBool::new(false),
            output_thread: Mutex::new(Some(output_thread)),
        })
    }

    fn find(name: &str) -> Result<(cpal::Device, cpal::HostId), AudioError> {
        if name == DEFAULT_DEVICE {
            let host = cpal::default_host();
            return host
                .default_output_device()
                .map(|device| (device, host.id()))
                .ok_or_else(|| AudioError::DeviceNotFound(name.to_string()));
        }

        for host_id in cpal::available_hosts() {
            let Ok(host) = cpal::host_from_id(host_id) else {
                continue;
            };
            for device in host.output_devices()? {
                if device.name().is_ok_and(|device_name| device_name.trim() == name) {
                    return Ok((device, host_id));
                }
            }
        }
        Err(AudioError::DeviceNotFound(name.to_string()))
    }

    /// Uses the requested rate if the device supports it in its default format.
    fn pick_sample_rate(
        device: &cpal::Device,
        sample_format: cpal::SampleFormat,
        requested: u32,
        fallback: u32,
    ) -> u32 {
        let supported = device.supported_output_configs().is_ok_and(|mut configs| {
            configs.any(|range| {
                range.sample_format() == sample_format
                    && range.min_sample_rate().0 <= requested
                    && requested <= range.max_sample_rate().0
            })
        });

        if supported {
            requested
        } else {
            debug!(requested, fallback, "Requested sample rate unsupported");
            fallback
        }
    }

    fn send(
        &self,
        command: fn(Sender<Result<(), AudioError>>) -> StreamCommand,
    ) -> Result<(), AudioError> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.commands
            .send(command(reply_tx))
            .map_err(|_| AudioError::Closed)?;
        reply_rx.recv().map_err(|_| AudioError::Closed)?
    }
}

/// Builds the stream and serves commands until shutdown.
fn run_output(
    name: &str,
    device: cpal::Device,
    stream_config: cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    mixer: AudioMixer,
    commands: Receiver<StreamCommand>,
    ready: Sender<Result<(), AudioError>>,
) {
    let span = span!(Level::INFO, "audio output (cpal)", device = name);
    let _enter = span.enter();

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, mixer),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, mixer),
        cpal::SampleFormat::I32 => build_stream::<i32>(&device, &stream_config, mixer),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, mixer),
        other => Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
    }
    .and_then(|stream| {
        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        Ok(stream)
    });

    let stream = match stream {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    for command in commands.iter() {
        match command {
            StreamCommand::Play(reply) => {
                let result = stream.play().map_err(|e| AudioError::Stream(e.to_string()));
                let _ = reply.send(result);
            }
            StreamCommand::Pause(reply) => {
                let result = stream.pause().map_err(|e| AudioError::Stream(e.to_string()));
                let _ = reply.send(result);
            }
            StreamCommand::Shutdown => break,
        }
    }

    debug!("Audio output thread stopping");
}

/// Builds an output stream whose callback mixes directly into the device buffer.
fn build_stream<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    mut mixer: AudioMixer,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    let stream = device.build_output_stream(
        stream_config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if scratch.len() != data.len() {
                scratch.resize(data.len(), 0.0);
            }
            mixer.process_into_output(&mut scratch);
            for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
                *dst = T::from_sample(src);
            }
        },
        |err| error!(err = err.to_string(), "CPAL output stream error"),
        None,
    )?;
    Ok(stream)
}

impl super::Device for Device {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        mixer::frame_to_seconds(self.clock.load(Ordering::Acquire), self.sample_rate)
    }

    fn schedule(&self, source: Box<dyn Source>, start_at: f64) -> Result<(), AudioError> {
        debug!(
            device = self.name,
            source = source.name(),
            start_at,
            "Scheduling source"
        );
        self.source_tx
            .send(ScheduledSource {
                id: next_source_id(),
                source,
                start_frame: mixer::seconds_to_frame(start_at, self.sample_rate),
            })
            .map_err(|_| AudioError::Closed)
    }

    fn resume(&self) -> Result<(), AudioError> {
        self.send(StreamCommand::Play)?;
        self.suspended.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn suspend(&self) -> Result<(), AudioError> {
        self.send(StreamCommand::Pause)?;
        self.suspended.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<super::mock::Device>, AudioError> {
        Err(AudioError::Unavailable(format!(
            "{} is not a mock device",
            self.name
        )))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.channels,
            self.host_id.name()
        )
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        let _ = self.commands.send(StreamCommand::Shutdown);
        if let Some(thread) = self.output_thread.lock().take() {
            let _ = thread.join();
        }
    }
}
