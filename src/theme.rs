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
use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::storage::{Store, THEME_KEY};

/// Color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Pink,
    Blue,
}

impl Theme {
    /// Reads the persisted theme. Missing or unknown values give the default.
    pub fn load(store: &dyn Store) -> Theme {
        store
            .get(THEME_KEY)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    /// Switches to the other theme and persists it.
    pub fn toggle(self, store: &dyn Store) -> Theme {
        let next = match self {
            Theme::Pink => Theme::Blue,
            Theme::Blue => Theme::Pink,
        };
        if let Err(e) = store.set(THEME_KEY, &next.to_string()) {
            warn!(err = e.to_string(), "Unable to persist theme");
        }
        info!(theme = %next, "Theme changed");
        next
    }

    /// ANSI color used for the terminal view.
    pub fn ansi_color(&self) -> &'static str {
        match self {
            Theme::Pink => "\x1b[95m",
            Theme::Blue => "\x1b[96m",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Pink => "pink",
            Theme::Blue => "blue",
        })
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pink" => Ok(Theme::Pink),
            "blue" => Ok(Theme::Blue),
            other => Err(format!("unknown theme {}", other)),
        }
    }
}
