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
// Process-wide handle to the audio output. The device is opened on first use
// and shared by everything that schedules sound.
//

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{AudioError, Device};
use crate::config;

/// How long a failed device creation is remembered before it is tried again.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(5);

type DeviceFactory = Box<dyn Fn() -> Result<Arc<dyn Device>, AudioError> + Send + Sync>;

/// Lazily created audio output shared by the synthesizer and sample playback.
pub struct AudioContext {
    factory: DeviceFactory,
    device: Mutex<Option<Arc<dyn Device>>>,
    sample_rate: u32,
    warned: AtomicBool,
    last_failure: Mutex<Option<Instant>>,
    retry_interval: Duration,
}

impl AudioContext {
    /// Creates a context that opens the configured device on first use.
    pub fn new(config: config::Audio) -> AudioContext {
        let sample_rate = config.sample_rate();
        AudioContext::with_factory(sample_rate, move || super::get_device(&config))
    }

    /// Creates a context around a custom device factory.
    pub fn with_factory<F>(sample_rate: u32, factory: F) -> AudioContext
    where
        F: Fn() -> Result<Arc<dyn Device>, AudioError> + Send + Sync + 'static,
    {
        AudioContext {
            factory: Box::new(factory),
            device: Mutex::new(None),
            sample_rate,
            warned: AtomicBool::new(false),
            last_failure: Mutex::new(None),
            retry_interval: RETRY_INTERVAL,
        }
    }

    /// Changes how long a failed creation is remembered.
    pub fn retry_after(mut self, retry_interval: Duration) -> AudioContext {
        self.retry_interval = retry_interval;
        self
    }

    /// Returns the output device, creating it if needed and resuming it if it was
    /// suspended. Returns None if audio is unavailable; callers treat that as silence.
    /// After a failed creation no new attempt is made until the retry interval passes.
    pub fn device(&self) -> Option<Arc<dyn Device>> {
        let mut guard = self.device.lock();
        if guard.is_none() {
            let mut last_failure = self.last_failure.lock();
            if last_failure.is_some_and(|at| at.elapsed() < self.retry_interval) {
                return None;
            }
            match (self.factory)() {
                Ok(device) => {
                    info!(device = device.to_string(), "Audio output initialized");
                    *last_failure = None;
                    *guard = Some(device);
                }
                Err(e) => {
                    self.report(&e);
                    *last_failure = Some(Instant::now());
                    return None;
                }
            }
        }

        let device = guard.as_ref()?.clone();
        if device.is_suspended() {
            if let Err(e) = device.resume() {
                self.report(&e);
                return None;
            }
        }
        Some(device)
    }

    /// Returns true once the device has been created.
    pub fn is_initialized(&self) -> bool {
        self.device.lock().is_some()
    }

    /// Suspends the device if it exists. Does not create it.
    pub fn suspend(&self) {
        if let Some(device) = self.device.lock().as_ref() {
            if let Err(e) = device.suspend() {
                warn!(err = e.to_string(), "Unable to suspend audio output");
            }
        }
    }

    /// The sample rate sources should be rendered at. Known before the device exists
    /// so samples can be prepared ahead of time.
    pub fn sample_rate(&self) -> u32 {
        match self.device.lock().as_ref() {
            Some(device) => device.sample_rate(),
            None => self.sample_rate,
        }
    }

    fn report(&self, e: &AudioError) {
        if self.warned.swap(true, Ordering::Relaxed) {
            debug!(err = e.to_string(), "Audio output still unavailable");
        } else {
            warn!(err = e.to_string(), "Audio output unavailable, continuing silently");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::audio::mock;
    use crate::audio::Device as _;

    #[test]
    fn test_device_created_lazily_once() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let context = AudioContext::with_factory(48000, move || {
            counter.fetch_add(1, Ordering::Relaxed);
            let device: Arc<dyn Device> = Arc::new(mock::Device::get("mock", 48000));
            Ok(device)
        });

        assert!(!context.is_initialized());
        assert_eq!(created.load(Ordering::Relaxed), 0);

        assert!(context.device().is_some());
        assert!(context.device().is_some());
        assert!(context.is_initialized());
        assert_eq!(created.load(Ordering::Relaxed), 1);
    }

    fn failing_context(attempts: Arc<AtomicUsize>) -> AudioContext {
        AudioContext::with_factory(44100, move || {
            attempts.fetch_add(1, Ordering::Relaxed);
            Err(AudioError::Unavailable("no permission".to_string()))
        })
    }

    #[test]
    fn test_creation_failure_is_remembered() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let context = failing_context(attempts.clone());

        for _ in 0..10 {
            assert!(context.device().is_none());
        }
        assert!(!context.is_initialized());
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
        assert_eq!(context.sample_rate(), 44100);
    }

    #[test]
    fn test_creation_failure_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let context = failing_context(attempts.clone()).retry_after(Duration::ZERO);

        assert!(context.device().is_none());
        assert!(context.device().is_none());
        assert_eq!(attempts.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_suspended_device_is_resumed() {
        let mock = mock::Device::get("mock", 48000);
        let shared = mock.clone();
        let context = AudioContext::with_factory(48000, move || {
            let device: Arc<dyn Device> = Arc::new(shared.clone());
            Ok(device)
        });

        assert!(context.device().is_some());
        context.suspend();
        assert!(mock.is_suspended());

        assert!(context.device().is_some());
        assert!(!mock.is_suspended());

        context.suspend();
        mock.set_fail_resume(true);
        assert!(context.device().is_none());
    }
}
