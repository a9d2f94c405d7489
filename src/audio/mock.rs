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
};

#[cfg(test)]
use std::sync::atomic::AtomicUsize;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::mixer::{self, AudioMixer, ScheduledSource, SourceSender};
use super::{next_source_id, AudioError, Source};

/// A record of something scheduled on the mock device.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled {
    /// The name of the scheduled source.
    pub name: String,
    /// The requested start time in seconds.
    pub start_at: f64,
}

/// A mock device. Doesn't play anything, but keeps a record of what was scheduled
/// and can render it through the real mixer on request.
#[derive(Clone)]
pub struct Device {
    name: String,
    sample_rate: u32,
    clock: Arc<AtomicU64>,
    source_tx: SourceSender,
    mixer: Arc<Mutex<AudioMixer>>,
    scheduled: Arc<Mutex<Vec<Scheduled>>>,
    suspended: Arc<AtomicBool>,
    fail_resume: Arc<AtomicBool>,
    #[cfg(test)]
    resume_calls: Arc<AtomicUsize>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str, sample_rate: u32) -> Device {
        let (mixer, source_tx) = AudioMixer::new(1, sample_rate);
        info!(device = name, sample_rate, "Using mock audio device");
        Device {
            name: name.to_string(),
            sample_rate,
            clock: mixer.clock(),
            source_tx,
            mixer: Arc::new(Mutex::new(mixer)),
            scheduled: Arc::new(Mutex::new(Vec::new())),
            suspended: Arc::new(AtomicBool::new(false)),
            fail_resume: Arc::new(AtomicBool::new(false)),
            #[cfg(test)]
            resume_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Renders the given number of frames through the mixer and advances the clock.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut output = vec![0.0; frames];
        self.mixer.lock().process_into_output(&mut output);
        output
    }

    /// Returns everything scheduled so far.
    pub fn scheduled(&self) -> Vec<Scheduled> {
        self.scheduled.lock().clone()
    }

    /// Forgets the schedule record. Sources already handed to the mixer stay there.
    pub fn clear_scheduled(&self) {
        self.scheduled.lock().clear();
    }

    /// Makes subsequent resume calls fail, as if audio permission was denied.
    pub fn set_fail_resume(&self, fail: bool) {
        self.fail_resume.store(fail, Ordering::Relaxed);
    }

    /// Number of times resume has been called.
    #[cfg(test)]
    pub fn resume_calls(&self) -> usize {
        self.resume_calls.load(Ordering::Relaxed)
    }
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
            "Scheduling source (mock)"
        );
        self.scheduled.lock().push(Scheduled {
            name: source.name().to_string(),
            start_at,
        });
        self.source_tx
            .send(ScheduledSource {
                id: next_source_id(),
                source,
                start_frame: mixer::seconds_to_frame(start_at, self.sample_rate),
            })
            .map_err(|_| AudioError::Closed)
    }

    fn resume(&self) -> Result<(), AudioError> {
        #[cfg(test)]
        self.resume_calls.fetch_add(1, Ordering::Relaxed);

        if self.fail_resume.load(Ordering::Relaxed) {
            return Err(AudioError::Unavailable(format!(
                "{} refused to resume",
                self.name
            )));
        }
        self.suspended.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn suspend(&self) -> Result<(), AudioError> {
        self.suspended.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, AudioError> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
