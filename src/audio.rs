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
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config;

pub mod context;
pub mod cpal;
mod error;
pub mod mixer;
pub mod mock;
pub mod source;

pub use context::AudioContext;
pub use error::AudioError;
pub use source::{BufferSource, Source};

/// Global atomic counter for generating unique source IDs.
static SOURCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Returns a new unique source ID.
pub fn next_source_id() -> u64 {
    SOURCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// An audio output that plays scheduled sources against its own sample clock.
pub trait Device: Any + fmt::Display + Send + Sync {
    /// The output sample rate. Sources must be rendered at this rate.
    fn sample_rate(&self) -> u32;

    /// The current position of the output clock in seconds.
    fn current_time(&self) -> f64;

    /// Schedules a source to start at the given clock time. Times in the past start
    /// immediately. The source is dropped once it is exhausted.
    fn schedule(&self, source: Box<dyn Source>, start_at: f64) -> Result<(), AudioError>;

    /// Resumes a suspended output.
    fn resume(&self) -> Result<(), AudioError>;

    /// Suspends the output. Scheduled sources hold until it is resumed.
    fn suspend(&self) -> Result<(), AudioError>;

    /// Returns true if the output is suspended.
    fn is_suspended(&self) -> bool;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Device>, AudioError>;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::DeviceInfo>, AudioError> {
    cpal::Device::list()
}

/// Gets a device for the given configuration.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, AudioError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device, config.sample_rate())));
    };

    Ok(Arc::new(cpal::Device::get(config)?))
}
