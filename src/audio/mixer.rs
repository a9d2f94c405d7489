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
// Core audio mixing logic that can be used by both CPAL and mock implementations
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use super::Source;

/// Channel for handing sources to the mixer without taking a lock.
pub type SourceSender = Sender<ScheduledSource>;

/// A source waiting for, or in the middle of, playback.
pub struct ScheduledSource {
    /// Unique ID for this source
    pub id: u64,
    /// The source itself
    pub source: Box<dyn Source>,
    /// The output frame at which the source starts
    pub start_frame: u64,
}

/// Mixes scheduled mono sources into interleaved output. The mixer is owned by
/// whatever drives the output (the CPAL callback or the mock device), so no
/// locking happens while mixing.
pub struct AudioMixer {
    /// Sources that have been scheduled
    active: Vec<ScheduledSource>,
    /// New sources arrive here
    incoming: Receiver<ScheduledSource>,
    /// Number of frames rendered so far
    clock: Arc<AtomicU64>,
    /// Number of output channels
    num_channels: u16,
    /// Sample rate
    sample_rate: u32,
}

impl AudioMixer {
    /// Creates a new audio mixer along with the sender used to schedule sources on it.
    pub fn new(num_channels: u16, sample_rate: u32) -> (Self, SourceSender) {
        let (source_tx, incoming) = crossbeam_channel::unbounded();
        (
            Self {
                active: Vec::new(),
                incoming,
                clock: Arc::new(AtomicU64::new(0)),
                num_channels: num_channels.max(1),
                sample_rate,
            },
            source_tx,
        )
    }

    /// Returns the shared frame clock.
    pub fn clock(&self) -> Arc<AtomicU64> {
        self.clock.clone()
    }

    /// Mixes into an interleaved output buffer. The buffer length determines the
    /// number of frames rendered.
    pub fn process_into_output(&mut self, output: &mut [f32]) {
        while let Ok(source) = self.incoming.try_recv() {
            self.active.push(source);
        }

        let channels = self.num_channels as usize;
        let base = self.clock.load(Ordering::Acquire);
        let mut frames = 0u64;

        for (index, frame) in output.chunks_mut(channels).enumerate() {
            let position = base + index as u64;
            let mut sum = 0.0f32;

            self.active.retain_mut(|scheduled| {
                if scheduled.start_frame > position {
                    return true;
                }
                match scheduled.source.next_sample() {
                    Some(sample) => {
                        sum += sample;
                        true
                    }
                    None => false,
                }
            });

            frame.fill(sum.clamp(-1.0, 1.0));
            frames += 1;
        }

        self.clock.fetch_add(frames, Ordering::Release);
    }

    /// Number of sources still waiting or playing.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Gets the number of output channels
    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Gets the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Converts a clock time in seconds to an output frame.
pub fn seconds_to_frame(seconds: f64, sample_rate: u32) -> u64 {
    (seconds.max(0.0) * sample_rate as f64).round() as u64
}

/// Converts an output frame to a clock time in seconds.
pub fn frame_to_seconds(frame: u64, sample_rate: u32) -> f64 {
    frame as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{next_source_id, BufferSource};

    fn schedule(tx: &SourceSender, samples: Vec<f32>, start_frame: u64) {
        tx.send(ScheduledSource {
            id: next_source_id(),
            source: Box::new(BufferSource::new("test", Arc::new(samples), 1.0)),
            start_frame,
        })
        .unwrap();
    }

    #[test]
    fn test_basic_mixing() {
        let (mut mixer, tx) = AudioMixer::new(2, 44100);
        schedule(&tx, vec![0.5, 0.8], 0);

        let mut output = vec![0.0; 6];
        mixer.process_into_output(&mut output);

        // Mono sources land on every channel.
        assert_eq!(output, vec![0.5, 0.5, 0.8, 0.8, 0.0, 0.0]);
        assert_eq!(mixer.active_count(), 0);
        assert_eq!(mixer.clock().load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_scheduled_start() {
        let (mut mixer, tx) = AudioMixer::new(1, 44100);
        schedule(&tx, vec![0.25, 0.25], 2);

        let mut output = vec![0.0; 5];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.0, 0.0, 0.25, 0.25, 0.0]);
    }

    #[test]
    fn test_overlapping_sources_sum_and_clamp() {
        let (mut mixer, tx) = AudioMixer::new(1, 44100);
        schedule(&tx, vec![0.5, 0.5, 0.5], 0);
        schedule(&tx, vec![0.2, 0.7], 1);

        let mut output = vec![0.0; 3];
        mixer.process_into_output(&mut output);
        assert_eq!(output[0], 0.5);
        assert!((output[1] - 0.7).abs() < 1e-6);
        assert_eq!(output[2], 1.0);
    }

    #[test]
    fn test_source_in_the_past_starts_immediately() {
        let (mut mixer, tx) = AudioMixer::new(1, 44100);
        let mut output = vec![0.0; 4];
        mixer.process_into_output(&mut output);

        schedule(&tx, vec![0.1], 0);
        mixer.process_into_output(&mut output);
        assert_eq!(output[0], 0.1);
        assert_eq!(mixer.active_count(), 0);
    }

    #[test]
    fn test_time_conversions() {
        assert_eq!(seconds_to_frame(0.12, 48000), 5760);
        assert_eq!(seconds_to_frame(-1.0, 48000), 0);
        assert_eq!(frame_to_seconds(24000, 48000), 0.5);
    }
}
