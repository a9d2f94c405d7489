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
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use super::affirmation::parse_duration;
use super::{Affirmation, Audio, ConfigError};

const DEFAULT_TICK_INTERVAL: &str = "37ms";
const DEFAULT_HAPTICS: bool = true;
const DATA_DIR: &str = "oinkpause";
const DATA_FILE: &str = "store.json";

/// Top level application settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Settings {
    /// Audio output.
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<Audio>,

    /// Where history and preferences are stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    data_file: Option<PathBuf>,

    /// How often the elapsed time is redrawn while holding, e.g. "37ms".
    #[serde(skip_serializing_if = "Option::is_none")]
    tick_interval: Option<String>,

    /// Whether to pulse the terminal bell on press and hold.
    #[serde(skip_serializing_if = "Option::is_none")]
    haptics: Option<bool>,

    /// Affirmation generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    affirmation: Option<Affirmation>,
}

impl Settings {
    /// Parse settings from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Settings, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// Loads the settings file if one is given, otherwise uses the defaults.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        match path {
            Some(path) => Settings::deserialize(path),
            None => Ok(Settings::default()),
        }
    }

    /// Returns a copy with every default filled in.
    pub fn resolved(&self) -> Settings {
        Settings {
            audio: Some(self.audio().resolved()),
            data_file: Some(self.data_file()),
            tick_interval: Some(
                self.tick_interval
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TICK_INTERVAL.to_string()),
            ),
            haptics: Some(self.haptics()),
            affirmation: Some(self.affirmation().resolved()),
        }
    }

    /// Serializes the settings as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }

    pub fn audio(&self) -> Audio {
        self.audio.clone().unwrap_or_default()
    }

    /// Returns the store location (default: `<data dir>/oinkpause/store.json`).
    pub fn data_file(&self) -> PathBuf {
        match &self.data_file {
            Some(data_file) => data_file.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DATA_DIR)
                .join(DATA_FILE),
        }
    }

    /// Returns the display refresh interval while holding (default: 37ms).
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            self.tick_interval
                .as_deref()
                .unwrap_or(DEFAULT_TICK_INTERVAL),
        )
    }

    pub fn haptics(&self) -> bool {
        self.haptics.unwrap_or(DEFAULT_HAPTICS)
    }

    pub fn affirmation(&self) -> Affirmation {
        self.affirmation.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_settings(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oinkpause.yaml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.audio().device(), "default");
        assert_eq!(settings.audio().sample_rate(), 48000);
        assert_eq!(settings.tick_interval().unwrap(), Duration::from_millis(37));
        assert!(settings.haptics());
        assert!(settings.affirmation().command().is_none());
        assert_eq!(
            settings.affirmation().timeout().unwrap(),
            Duration::from_secs(4)
        );
        assert!(settings.data_file().ends_with("oinkpause/store.json"));
    }

    #[test]
    fn test_parse_file() {
        let (_dir, path) = write_settings(
            r#"
audio:
  device: mock-device
  sample_rate: 44100
data_file: /tmp/oinkpause-test.json
tick_interval: 40ms
haptics: false
affirmation:
  command:
    - my-generator
    - --seconds
    - "{seconds}"
  timeout: 2s
"#,
        );

        let settings = Settings::deserialize(&path).unwrap();
        assert_eq!(settings.audio().device(), "mock-device");
        assert_eq!(settings.audio().sample_rate(), 44100);
        assert_eq!(
            settings.data_file(),
            PathBuf::from("/tmp/oinkpause-test.json")
        );
        assert_eq!(settings.tick_interval().unwrap(), Duration::from_millis(40));
        assert!(!settings.haptics());

        let affirmation = settings.affirmation();
        let (program, args) = affirmation.command().unwrap();
        assert_eq!(program, "my-generator");
        assert_eq!(args, ["--seconds".to_string(), "{seconds}".to_string()]);
        assert_eq!(affirmation.timeout().unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_duration() {
        let (_dir, path) = write_settings("tick_interval: soon\n");
        let settings = Settings::deserialize(&path).unwrap();
        assert!(matches!(
            settings.tick_interval(),
            Err(ConfigError::Duration(_, _))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Settings::deserialize(Path::new("/nonexistent/oinkpause.yaml")),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_resolved_yaml() {
        let yaml = Settings::default().resolved().to_yaml().unwrap();
        assert!(yaml.contains("device: default"));
        assert!(yaml.contains("sample_rate: 48000"));
        assert!(yaml.contains("tick_interval: 37ms"));
        assert!(yaml.contains("timeout: 4s"));
    }
}
