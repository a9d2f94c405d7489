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
use std::time::Duration;

use duration_string::DurationString;
use serde::{Deserialize, Serialize};

use super::ConfigError;

const DEFAULT_TIMEOUT: &str = "4s";

/// How affirmations are generated.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Affirmation {
    /// Program and arguments to run. Absent means the fallback messages are always used.
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<Vec<String>>,

    /// How long to wait for the program, e.g. "4s".
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<String>,
}

impl Affirmation {
    pub fn new(command: Vec<String>) -> Affirmation {
        Affirmation {
            command: Some(command),
            timeout: None,
        }
    }

    /// Returns a copy with every default filled in.
    pub fn resolved(&self) -> Affirmation {
        Affirmation {
            command: self.command.clone(),
            timeout: Some(
                self.timeout
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TIMEOUT.to_string()),
            ),
        }
    }

    /// The program and its arguments, if configured.
    pub fn command(&self) -> Option<(&str, &[String])> {
        let (program, args) = self.command.as_deref()?.split_first()?;
        Some((program.as_str(), args))
    }

    /// Returns the generation timeout (default: 4s).
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(self.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }
}

/// Parses a duration string such as "37ms" or "4s".
pub(super) fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    Ok(DurationString::from_string(value.to_string())
        .map_err(|e| ConfigError::Duration(value.to_string(), e.to_string()))?
        .into())
}
