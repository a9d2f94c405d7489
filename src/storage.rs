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

//! Key-value persistence for history and preferences.
//!
//! All values are strings. Numbers are stored as decimal text, flags as
//! `"true"`/`"false"` and the session history as a JSON array.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// The serialized session history.
pub const HISTORY_KEY: &str = "pause_history";
/// Timestamp of the most recent session. Redundant with the history.
pub const LAST_PAUSE_KEY: &str = "pause_timestamp";
/// Whether sound is enabled.
pub const SOUND_ENABLED_KEY: &str = "app_sound";
/// Whether the custom sample should be preferred over the synthesizer.
pub const PREFER_CUSTOM_KEY: &str = "app_use_custom";
/// The encoded custom sample.
pub const CUSTOM_SAMPLE_KEY: &str = "app_custom_oink_data";
/// The theme identifier.
pub const THEME_KEY: &str = "app_theme";

/// Errors raised while persisting values.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A string key-value store.
pub trait Store: Send + Sync {
    /// Returns the value stored under the key, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores the value under the key, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes the key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Parses a stored boolean flag. Anything other than `"true"`/`"false"` is treated as missing.
pub fn get_flag(store: &dyn Store, key: &str) -> Option<bool> {
    match store.get(key)?.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Stores a boolean flag in its canonical text form.
pub fn set_flag(store: &dyn Store, key: &str, value: bool) -> Result<(), StorageError> {
    store.set(key, if value { "true" } else { "false" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let store = MemoryStore::new();
        assert_eq!(get_flag(&store, SOUND_ENABLED_KEY), None);

        set_flag(&store, SOUND_ENABLED_KEY, false).unwrap();
        assert_eq!(store.get(SOUND_ENABLED_KEY).as_deref(), Some("false"));
        assert_eq!(get_flag(&store, SOUND_ENABLED_KEY), Some(false));

        store.set(SOUND_ENABLED_KEY, "yes").unwrap();
        assert_eq!(get_flag(&store, SOUND_ENABLED_KEY), None);
    }
}
