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
use tracing::warn;

use crate::storage::{self, Store, PREFER_CUSTOM_KEY, SOUND_ENABLED_KEY};

/// Sound preferences, loaded once at startup and changed only through explicit
/// toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundPreferences {
    /// Whether any sound is played.
    pub sound_enabled: bool,
    /// Whether the custom sample is played instead of the synthesizer.
    pub prefer_custom: bool,
}

impl Default for SoundPreferences {
    fn default() -> Self {
        SoundPreferences {
            sound_enabled: true,
            prefer_custom: false,
        }
    }
}

impl SoundPreferences {
    /// Reads the persisted preferences. The custom preference is only honored if a
    /// custom sample is available; with a sample and no stored preference it
    /// defaults to on.
    pub fn load(store: &dyn Store, has_custom_sample: bool) -> SoundPreferences {
        let defaults = SoundPreferences::default();
        let sound_enabled =
            storage::get_flag(store, SOUND_ENABLED_KEY).unwrap_or(defaults.sound_enabled);
        let prefer_custom = has_custom_sample
            && storage::get_flag(store, PREFER_CUSTOM_KEY).unwrap_or(true);

        SoundPreferences {
            sound_enabled,
            prefer_custom,
        }
    }

    /// Persists both flags. Failures are logged; the in-memory values stay authoritative.
    pub fn save(&self, store: &dyn Store) {
        if let Err(e) = storage::set_flag(store, SOUND_ENABLED_KEY, self.sound_enabled) {
            warn!(err = e.to_string(), "Unable to persist sound preference");
        }
        if let Err(e) = storage::set_flag(store, PREFER_CUSTOM_KEY, self.prefer_custom) {
            warn!(err = e.to_string(), "Unable to persist custom sound preference");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_defaults() {
        let store = MemoryStore::new();
        assert_eq!(
            SoundPreferences::load(&store, false),
            SoundPreferences::default()
        );
        assert!(SoundPreferences::load(&store, true).prefer_custom);
    }

    #[test]
    fn test_round_trip_through_store() {
        let store = MemoryStore::new();
        let preferences = SoundPreferences {
            sound_enabled: false,
            prefer_custom: false,
        };
        preferences.save(&store);

        assert_eq!(store.get(SOUND_ENABLED_KEY).as_deref(), Some("false"));
        assert_eq!(SoundPreferences::load(&store, true), preferences);
    }

    #[test]
    fn test_custom_requires_sample() {
        let store = MemoryStore::new();
        store.set(PREFER_CUSTOM_KEY, "true").unwrap();
        assert!(!SoundPreferences::load(&store, false).prefer_custom);
    }
}
