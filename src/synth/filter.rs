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
use std::f64::consts::PI;

/// A biquad band-pass filter with 0 dB gain at the center frequency, using the
/// Audio EQ Cookbook coefficients.
#[derive(Debug, Clone)]
pub struct BandPass {
    b0: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    // Transposed direct form II state.
    z1: f64,
    z2: f64,
}

impl BandPass {
    pub fn new(center: f64, q: f64, sample_rate: u32) -> BandPass {
        let nyquist = sample_rate as f64 / 2.0;
        let w0 = 2.0 * PI * center.clamp(1.0, nyquist * 0.99) / sample_rate as f64;
        let alpha = w0.sin() / (2.0 * q.max(1e-4));
        let a0 = 1.0 + alpha;

        BandPass {
            b0: alpha / a0,
            b2: -alpha / a0,
            a1: -2.0 * w0.cos() / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Filters one sample.
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.z1;
        self.z1 = -self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak_response(frequency: f64) -> f64 {
        let sample_rate = 48000;
        let mut filter = BandPass::new(600.0, 4.0, sample_rate);
        let step = 2.0 * PI * frequency / sample_rate as f64;

        // Skip the settling time, then measure.
        (0..48000)
            .map(|n| filter.process((step * n as f64).sin()))
            .skip(24000)
            .fold(0.0f64, |peak, sample| peak.max(sample.abs()))
    }

    #[test]
    fn test_passes_center_frequency() {
        let peak = peak_response(600.0);
        assert!((peak - 1.0).abs() < 0.01, "peak was {}", peak);
    }

    #[test]
    fn test_attenuates_away_from_center() {
        assert!(peak_response(100.0) < 0.1);
        assert!(peak_response(5000.0) < 0.1);
    }
}
