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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sawtooth,
    Square,
}

/// A band-limited oscillator. Discontinuities are smoothed with polyBLEP so low
/// sample rates don't alias badly.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: u32) -> Oscillator {
        Oscillator {
            waveform,
            phase: 0.0,
            sample_rate: sample_rate as f64,
        }
    }

    /// Produces the next sample at the given frequency and advances the phase.
    pub fn next(&mut self, frequency: f64) -> f64 {
        let dt = (frequency / self.sample_rate).clamp(0.0, 0.5);
        let phase = self.phase;

        let sample = match self.waveform {
            Waveform::Sawtooth => 2.0 * phase - 1.0 - poly_blep(phase, dt),
            Waveform::Square => {
                let naive = if phase < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(phase, dt) - poly_blep((phase + 0.5).fract(), dt)
            }
        };

        self.phase = (phase + dt).fract();
        sample
    }
}

fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let t = t / dt;
        t + t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sawtooth_shape() {
        let mut osc = Oscillator::new(Waveform::Sawtooth, 1000);
        let samples: Vec<f64> = (0..100).map(|_| osc.next(10.0)).collect();

        // Rises through the period, wraps once per 100 samples.
        assert!(samples[25] < samples[50]);
        assert!(samples[50] < samples[75]);
        assert!(samples.iter().all(|s| s.abs() <= 1.0 + 1e-9));
    }

    #[test]
    fn test_square_shape() {
        let mut osc = Oscillator::new(Waveform::Square, 1000);
        let samples: Vec<f64> = (0..100).map(|_| osc.next(10.0)).collect();

        assert!((samples[25] - 1.0).abs() < 1e-9);
        assert!((samples[75] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_frequency_holds_phase() {
        let mut osc = Oscillator::new(Waveform::Sawtooth, 1000);
        assert_eq!(osc.next(0.0), -1.0);
        assert_eq!(osc.next(0.0), -1.0);
    }
}
