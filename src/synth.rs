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
use tracing::{debug, warn};

use crate::audio::{AudioContext, AudioError, Device};

mod envelope;
mod filter;
mod oscillator;
mod snort;

pub use snort::{Snort, SynthParams};

/// Offset of the second half of the double snort, in seconds.
pub const SECOND_SNORT_OFFSET: f64 = 0.12;

/// The two voices of the standard cue: start offset and parameters.
pub fn double_snort() -> [(f64, SynthParams); 2] {
    [
        (0.0, SynthParams::new(110.0, 30.0)),
        (SECOND_SNORT_OFFSET, SynthParams::new(90.0, 40.0)),
    ]
}

/// Schedules a single snort on the device at the given clock time.
pub fn schedule(
    device: &dyn Device,
    start_at: f64,
    params: SynthParams,
) -> Result<(), AudioError> {
    let snort = Snort::new(params, device.sample_rate());
    device.schedule(Box::new(snort), start_at)
}

/// Plays a single snort now. Does nothing if audio is unavailable.
pub fn play_snort(context: &AudioContext, params: SynthParams) {
    let Some(device) = context.device() else {
        return;
    };
    let now = device.current_time();
    if let Err(e) = schedule(device.as_ref(), now, params) {
        warn!(err = e.to_string(), "Unable to schedule snort");
    }
}

/// Schedules the standard double snort on the device starting at the given clock time.
pub fn schedule_double_snort(device: &dyn Device, start_at: f64) -> Result<(), AudioError> {
    for (offset, params) in double_snort() {
        schedule(device, start_at + offset, params)?;
    }
    debug!(start_at, "Scheduled double snort");
    Ok(())
}

/// Plays the standard double snort starting now. Does nothing if audio is unavailable.
pub fn play_double_snort(context: &AudioContext) {
    let Some(device) = context.device() else {
        return;
    };
    if let Err(e) = schedule_double_snort(device.as_ref(), device.current_time()) {
        warn!(err = e.to_string(), "Unable to schedule snort");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::mock_context;

    #[test]
    fn test_double_snort_schedule() {
        let (context, mock) = mock_context(8000);
        mock.render(800);

        play_double_snort(&context);

        let scheduled = mock.scheduled();
        assert_eq!(scheduled.len(), 2);
        assert_eq!(scheduled[0].name, "snort(110Hz,30Hz)");
        assert!((scheduled[0].start_at - 0.1).abs() < 1e-9);
        assert_eq!(scheduled[1].name, "snort(90Hz,40Hz)");
        assert!((scheduled[1].start_at - 0.22).abs() < 1e-9);
    }

    #[test]
    fn test_double_snort_renders_and_tears_down() {
        let (context, mock) = mock_context(8000);
        play_double_snort(&context);

        // 0.12s + 0.15s of sound at 8kHz, then silence.
        let output = mock.render(2400);
        assert!(output[..2160].iter().any(|s| s.abs() > 0.0));
        assert!(output[2160..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_unavailable_audio_is_silent() {
        let context = AudioContext::with_factory(8000, || {
            Err(AudioError::Unavailable("denied".to_string()))
        });
        play_double_snort(&context);
        play_snort(&context, SynthParams::default());
    }
}
