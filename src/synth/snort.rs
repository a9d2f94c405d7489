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
use super::envelope::Automation;
use super::filter::BandPass;
use super::oscillator::{Oscillator, Waveform};
use crate::audio::Source;

/// Center of the formant filter.
pub const FORMANT_FREQUENCY: f64 = 600.0;

/// Resonance of the formant filter.
pub const FORMANT_Q: f64 = 4.0;

/// The pitch falls to this fraction of its start over the sound.
pub const PITCH_DROP: f64 = 0.6;

/// Depth of the grit LFO on the VCA.
pub const GRIT_DEPTH: f64 = 0.5;

/// Peak of the master envelope.
pub const PEAK_GAIN: f64 = 0.4;

/// Attack time of the master envelope in seconds.
pub const ATTACK: f64 = 0.02;

/// Level the master envelope decays to by the end of the sound.
pub const FLOOR_GAIN: f64 = 0.001;

/// Parameters for a single snort.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    /// Starting frequency of the sawtooth, in Hz.
    pub pitch: f64,
    /// Rate of the amplitude modulation, in Hz.
    pub grit: f64,
    /// Length of the sound, in seconds.
    pub duration: f64,
}

impl SynthParams {
    pub fn new(pitch: f64, grit: f64) -> SynthParams {
        SynthParams {
            pitch,
            grit,
            ..Default::default()
        }
    }
}

impl Default for SynthParams {
    fn default() -> Self {
        SynthParams {
            pitch: 120.0,
            grit: 35.0,
            duration: 0.15,
        }
    }
}

/// One self-contained snort voice: sawtooth into a grit-modulated VCA, through the
/// formant filter and the master envelope. Ends at the configured duration.
pub struct Snort {
    name: String,
    grit: f64,
    oscillator: Oscillator,
    lfo: Oscillator,
    formant: BandPass,
    frequency: Automation,
    gain: Automation,
    sample_rate: f64,
    frame: u64,
    total_frames: u64,
}

impl Snort {
    pub fn new(params: SynthParams, sample_rate: u32) -> Snort {
        let duration = params.duration.max(ATTACK);
        let frequency = Automation::new(params.pitch)
            .set(params.pitch, 0.0)
            .exponential_ramp_to(params.pitch * PITCH_DROP, duration);
        let gain = Automation::new(0.0)
            .set(0.0, 0.0)
            .linear_ramp_to(PEAK_GAIN, ATTACK)
            .exponential_ramp_to(FLOOR_GAIN, duration);

        Snort {
            name: format!("snort({}Hz,{}Hz)", params.pitch, params.grit),
            grit: params.grit,
            oscillator: Oscillator::new(Waveform::Sawtooth, sample_rate),
            lfo: Oscillator::new(Waveform::Square, sample_rate),
            formant: BandPass::new(FORMANT_FREQUENCY, FORMANT_Q, sample_rate),
            frequency,
            gain,
            sample_rate: sample_rate as f64,
            frame: 0,
            total_frames: (duration * sample_rate as f64).round() as u64,
        }
    }

    /// Number of samples this voice produces.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

impl Source for Snort {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_sample(&mut self) -> Option<f32> {
        if self.frame >= self.total_frames {
            return None;
        }

        let t = self.frame as f64 / self.sample_rate;
        self.frame += 1;

        let saw = self.oscillator.next(self.frequency.value_at(t));
        let vca = 1.0 + GRIT_DEPTH * self.lfo.next(self.grit);
        let shaped = self.formant.process(saw * vca);
        Some((shaped * self.gain.value_at(t)) as f32)
    }
}
