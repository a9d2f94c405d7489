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
//! The press/hold/release interaction and its timers.

use std::time::Duration;

mod machine;
mod timer;

pub use machine::{Machine, Signal, Timing};
pub use timer::Timer;

/// How long a press must last before it counts as a hold.
pub const LONG_PRESS: Duration = Duration::from_millis(300);

/// Holds at least this long get a generated affirmation.
pub const AFFIRMATION_THRESHOLD: Duration = Duration::from_millis(3000);

/// How long the affirmation card stays up after release.
pub const CARD_DURATION: Duration = Duration::from_millis(5000);
