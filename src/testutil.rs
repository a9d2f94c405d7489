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
//! Helpers shared by unit tests.

use std::io::Cursor;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::audio::{mock, AudioContext, Device};

/// Encodes interleaved 16-bit samples as an in-memory WAV file.
pub fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(
            &mut cursor,
            WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
        )
        .expect("unable to create wav writer");
        for sample in samples {
            writer.write_sample(*sample).expect("unable to write sample");
        }
        writer.finalize().expect("unable to finalize wav");
    }
    cursor.into_inner()
}

/// Same as wav_bytes, base64 encoded the way payloads are persisted.
pub fn wav_base64(channels: u16, sample_rate: u32, samples: &[i16]) -> String {
    STANDARD.encode(wav_bytes(channels, sample_rate, samples))
}

/// An audio context backed by a mock device, plus a handle to inspect it.
pub fn mock_context(sample_rate: u32) -> (Arc<AudioContext>, mock::Device) {
    let mock = mock::Device::get("mock", sample_rate);
    let shared = mock.clone();
    let context = AudioContext::with_factory(sample_rate, move || {
        let device: Arc<dyn Device> = Arc::new(shared.clone());
        Ok(device)
    });
    (Arc::new(context), mock)
}
