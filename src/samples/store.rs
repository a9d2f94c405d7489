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
use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use tracing::{error, info};

use super::{LoadedSample, SampleError};

/// Decoded samples by name. At most one sample per name; loading a name again
/// replaces it.
#[derive(Default)]
pub struct SampleStore {
    samples: RwLock<HashMap<String, LoadedSample>>,
}

impl SampleStore {
    pub fn new() -> SampleStore {
        SampleStore::default()
    }

    /// Decodes the payload and stores it under the name. On failure the store is left
    /// unchanged, including any sample already held under the name.
    pub fn load(&self, name: &str, payload: &str, sample_rate: u32) -> Result<(), SampleError> {
        match LoadedSample::decode(payload, sample_rate) {
            Ok(sample) => {
                self.insert(name, sample);
                Ok(())
            }
            Err(e) => {
                error!(sample = name, err = e.to_string(), "Unable to load sample");
                Err(e)
            }
        }
    }

    /// Stores an already decoded sample.
    pub fn insert(&self, name: &str, sample: LoadedSample) {
        info!(sample = name, frames = sample.len(), "Sample stored");
        self.samples.write().insert(name.to_string(), sample);
    }

    /// Removes the sample if present.
    pub fn clear(&self, name: &str) {
        if self.samples.write().remove(name).is_some() {
            info!(sample = name, "Sample cleared");
        }
    }

    pub fn get(&self, name: &str) -> Option<LoadedSample> {
        self.samples.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.samples.read().contains_key(name)
    }

    /// Returns the total memory used by stored samples.
    pub fn total_memory_usage(&self) -> usize {
        self.samples.read().values().map(|s| s.memory_size()).sum()
    }
}

impl fmt::Debug for SampleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleStore")
            .field("samples", &self.samples.read().len())
            .field("total_memory_kb", &(self.total_memory_usage() / 1024))
            .finish()
    }
}
