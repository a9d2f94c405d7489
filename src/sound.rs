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
//! Decides what plays when the pause control is pressed.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::audio::{AudioContext, Device};
use crate::preferences::SoundPreferences;
use crate::samples::{LoadedSample, SampleError, SampleStore};
use crate::storage::{StorageError, Store, CUSTOM_SAMPLE_KEY};
use crate::synth;

/// Name the user's custom sound is stored under.
pub const CUSTOM_SAMPLE: &str = "custom_oink";

/// Playback volume of the custom sample.
const CUSTOM_VOLUME: f32 = 1.0;

/// Errors raised when changing the sound setup.
#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("No custom sound has been loaded")]
    NoCustomSample,

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Sound is turned off.
    Muted,
    /// The custom sample was scheduled.
    Custom,
    /// The synthesized double snort was scheduled.
    Synth,
    /// Audio output is unavailable, nothing played.
    Unavailable,
}

/// Plays the press cue and owns the sound preferences and the custom sample.
pub struct SoundDispatcher {
    context: Arc<AudioContext>,
    samples: SampleStore,
    store: Arc<dyn Store>,
    preferences: Mutex<SoundPreferences>,
}

impl SoundDispatcher {
    /// Creates the dispatcher, restoring the persisted custom sample and preferences.
    /// The audio device is not opened here.
    pub fn new(context: Arc<AudioContext>, store: Arc<dyn Store>) -> SoundDispatcher {
        let samples = SampleStore::new();
        let restored = match store.get(CUSTOM_SAMPLE_KEY) {
            Some(payload) if !payload.is_empty() => samples
                .load(CUSTOM_SAMPLE, &payload, context.sample_rate())
                .is_ok(),
            _ => false,
        };

        let preferences = SoundPreferences::load(store.as_ref(), restored);
        info!(
            sound_enabled = preferences.sound_enabled,
            prefer_custom = preferences.prefer_custom,
            custom_sample = restored,
            "Sound preferences loaded"
        );

        SoundDispatcher {
            context,
            samples,
            store,
            preferences: Mutex::new(preferences),
        }
    }

    pub fn preferences(&self) -> SoundPreferences {
        *self.preferences.lock()
    }

    pub fn has_custom_sample(&self) -> bool {
        self.samples.contains(CUSTOM_SAMPLE)
    }

    /// Plays the press cue. Never blocks on decoding or I/O and never fails; audio
    /// problems degrade to silence.
    pub fn dispatch(&self) -> Dispatched {
        let preferences = self.preferences();
        if !preferences.sound_enabled {
            return Dispatched::Muted;
        }

        let custom = if preferences.prefer_custom {
            self.samples.get(CUSTOM_SAMPLE)
        } else {
            None
        };

        let Some(device) = self.context.device() else {
            return Dispatched::Unavailable;
        };

        match custom {
            Some(sample) => self.play_sample(device.as_ref(), sample),
            None => self.play_synth(device.as_ref()),
        }
    }

    /// Flips sound on or off and returns the new state.
    pub fn toggle_sound(&self) -> bool {
        let mut preferences = self.preferences.lock();
        preferences.sound_enabled = !preferences.sound_enabled;
        preferences.save(self.store.as_ref());
        info!(sound_enabled = preferences.sound_enabled, "Sound toggled");
        preferences.sound_enabled
    }

    /// Chooses between the custom sample and the synthesizer. Preferring the custom
    /// sample requires one to be loaded.
    pub fn set_prefer_custom(&self, prefer: bool) -> Result<(), SoundError> {
        let mut preferences = self.preferences.lock();
        if prefer && !self.has_custom_sample() {
            return Err(SoundError::NoCustomSample);
        }
        preferences.prefer_custom = prefer;
        preferences.save(self.store.as_ref());
        info!(prefer_custom = prefer, "Custom sound preference changed");
        Ok(())
    }

    /// Validates and stores a new custom sample, persists it and prefers it. On
    /// failure nothing changes.
    pub fn save_custom_sample(&self, payload: &str) -> Result<(), SoundError> {
        let sample = LoadedSample::decode(payload, self.context.sample_rate()).map_err(|e| {
            error!(err = e.to_string(), "Rejected custom sound");
            e
        })?;

        let mut preferences = self.preferences.lock();
        self.store.set(CUSTOM_SAMPLE_KEY, payload.trim())?;
        self.samples.insert(CUSTOM_SAMPLE, sample);
        preferences.prefer_custom = true;
        preferences.save(self.store.as_ref());
        Ok(())
    }

    /// Removes the custom sample and turns the custom preference off with it.
    pub fn clear_custom_sample(&self) {
        let mut preferences = self.preferences.lock();
        self.samples.clear(CUSTOM_SAMPLE);
        preferences.prefer_custom = false;
        if let Err(e) = self.store.remove(CUSTOM_SAMPLE_KEY) {
            warn!(err = e.to_string(), "Unable to remove persisted custom sound");
        }
        preferences.save(self.store.as_ref());
    }

    /// Plays the custom sample. A sample prepared before the device existed may be at
    /// the wrong rate; it is converted once and the converted copy replaces it.
    fn play_sample(&self, device: &dyn Device, sample: LoadedSample) -> Dispatched {
        let sample = if sample.sample_rate() != device.sample_rate() {
            debug!(
                sample_rate = sample.sample_rate(),
                device_rate = device.sample_rate(),
                "Converting custom sound to the output rate"
            );
            let converted = sample.resample(device.sample_rate());
            self.samples.insert(CUSTOM_SAMPLE, converted.clone());
            converted
        } else {
            sample
        };

        let source = sample.create_source(CUSTOM_SAMPLE, CUSTOM_VOLUME);
        match device.schedule(Box::new(source), device.current_time()) {
            Ok(()) => {
                debug!("Playing custom sound");
                Dispatched::Custom
            }
            Err(e) => {
                warn!(err = e.to_string(), "Unable to play custom sound");
                Dispatched::Unavailable
            }
        }
    }

    fn play_synth(&self, device: &dyn Device) -> Dispatched {
        match synth::schedule_double_snort(device, device.current_time()) {
            Ok(()) => Dispatched::Synth,
            Err(e) => {
                warn!(err = e.to_string(), "Unable to schedule snort");
                Dispatched::Unavailable
            }
        }
    }
}
