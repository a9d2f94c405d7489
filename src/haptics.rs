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
use std::io::{self, Write};
use std::time::Duration;

use tracing::debug;

/// Pulse on press.
pub const PRESS_PULSE: Duration = Duration::from_millis(15);

/// Pulse when a hold becomes a timed pause.
pub const HOLD_PULSE: Duration = Duration::from_millis(40);

/// Best-effort tactile feedback. Unsupported hardware is a no-op.
pub trait Haptics: Send + Sync {
    fn pulse(&self, duration: Duration);
}

/// No feedback.
#[derive(Debug, Default)]
pub struct Disabled;

impl Haptics for Disabled {
    fn pulse(&self, _duration: Duration) {}
}

/// Rings the terminal bell, the closest thing a terminal has to a vibration motor.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Haptics for TerminalBell {
    fn pulse(&self, duration: Duration) {
        debug!(duration_ms = duration.as_millis() as u64, "Pulse");
        let mut stdout = io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            debug!(err = e.to_string(), "Unable to pulse");
        }
    }
}

/// Picks the implementation for the configuration.
pub fn from_config(enabled: bool) -> Box<dyn Haptics> {
    if enabled {
        Box::new(TerminalBell)
    } else {
        Box::new(Disabled)
    }
}

#[cfg(test)]
pub mod mock {
    use std::time::Duration;

    use parking_lot::Mutex;

    /// Records pulses.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pulses: Mutex<Vec<Duration>>,
    }

    impl Recorder {
        pub fn pulses(&self) -> Vec<Duration> {
            self.pulses.lock().clone()
        }
    }

    impl super::Haptics for Recorder {
        fn pulse(&self, duration: Duration) {
            self.pulses.lock().push(duration);
        }
    }
}
