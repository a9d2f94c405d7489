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
use std::sync::Arc;

/// A mono source of samples at the output sample rate. Each scheduled source is its
/// own signal chain: nothing is shared between two sources.
pub trait Source: Send {
    /// A short name for logging and inspection.
    fn name(&self) -> &str;

    /// Returns the next sample, or None once the source is exhausted.
    fn next_sample(&mut self) -> Option<f32>;
}

/// Plays a decoded buffer once from the start.
pub struct BufferSource {
    name: String,
    data: Arc<Vec<f32>>,
    position: usize,
    volume: f32,
}

impl BufferSource {
    /// Creates a buffer source sharing the given samples.
    pub fn new(name: &str, data: Arc<Vec<f32>>, volume: f32) -> BufferSource {
        BufferSource {
            name: name.to_string(),
            data,
            position: 0,
            volume,
        }
    }
}

impl Source for BufferSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_sample(&mut self) -> Option<f32> {
        let sample = *self.data.get(self.position)?;
        self.position += 1;
        Some(sample * self.volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_source_plays_once() {
        let data = Arc::new(vec![0.5, -0.5, 1.0]);
        let mut source = BufferSource::new("custom_oink", data.clone(), 0.5);

        assert_eq!(source.name(), "custom_oink");
        assert_eq!(source.next_sample(), Some(0.25));
        assert_eq!(source.next_sample(), Some(-0.25));
        assert_eq!(source.next_sample(), Some(0.5));
        assert_eq!(source.next_sample(), None);
        assert_eq!(source.next_sample(), None);

        // The shared buffer is untouched by playback.
        assert_eq!(data.len(), 3);
    }
}
