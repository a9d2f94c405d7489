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
//! Decoding of encoded sample payloads into mono buffers at the output rate.

use std::io::{Cursor, ErrorKind};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, info, warn};

use super::SampleError;
use crate::audio::BufferSource;

/// A decoded sample that can be played back.
/// The sample data is stored in an Arc for efficient sharing between playbacks.
#[derive(Clone)]
pub struct LoadedSample {
    /// Mono samples at the output rate.
    data: Arc<Vec<f32>>,
    /// Sample rate of the audio data.
    sample_rate: u32,
}

impl LoadedSample {
    pub fn new(data: Vec<f32>, sample_rate: u32) -> LoadedSample {
        LoadedSample {
            data: Arc::new(data),
            sample_rate,
        }
    }

    /// Decodes an encoded payload (base64 or a base64 data URL) and converts it to
    /// mono at the target sample rate.
    pub fn decode(payload: &str, target_sample_rate: u32) -> Result<LoadedSample, SampleError> {
        let (mime, bytes) = decode_payload(payload)?;
        let (samples, channels, source_rate) = decode_audio(bytes, mime.as_deref())?;

        let mono = downmix(&samples, channels);
        if mono.is_empty() {
            return Err(SampleError::Empty);
        }

        let data = if source_rate != target_sample_rate {
            debug!(
                source_rate,
                target_rate = target_sample_rate,
                "Transcoding sample"
            );
            transcode(&mono, source_rate, target_sample_rate)
        } else {
            mono
        };

        let loaded = LoadedSample::new(data, target_sample_rate);
        info!(
            channels,
            source_rate,
            sample_rate = target_sample_rate,
            duration_ms = loaded.duration().as_millis(),
            memory_kb = loaded.memory_size() / 1024,
            "Sample decoded"
        );
        Ok(loaded)
    }

    /// Returns the sample converted to another output rate.
    pub fn resample(&self, target_sample_rate: u32) -> LoadedSample {
        if target_sample_rate == self.sample_rate {
            return self.clone();
        }
        LoadedSample::new(
            transcode(&self.data, self.sample_rate, target_sample_rate),
            target_sample_rate,
        )
    }

    /// Creates a one-shot source for this sample.
    pub fn create_source(&self, name: &str, volume: f32) -> BufferSource {
        BufferSource::new(name, self.data.clone(), volume)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback length of the sample.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.data.len() as f64 / self.sample_rate.max(1) as f64)
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// Splits a payload into an optional MIME type and the decoded bytes. Accepts bare
/// base64 or a `data:<mime>;base64,<data>` URL.
pub fn decode_payload(payload: &str) -> Result<(Option<String>, Vec<u8>), SampleError> {
    let payload = payload.trim();
    let (mime, encoded) = match payload.strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((header, data)) => {
                let mime = header
                    .split(';')
                    .next()
                    .filter(|mime| !mime.is_empty())
                    .map(str::to_string);
                (mime, data)
            }
            None => (None, rest),
        },
        None => (None, payload),
    };

    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    Ok((mime, STANDARD.decode(cleaned)?))
}

/// Encodes raw file bytes as a base64 data URL.
pub fn encode_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Guesses the MIME type of an audio file from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("m4a") | Some("aac") => "audio/mp4",
        _ => "audio/wav",
    }
}

/// Decodes audio bytes with symphonia into interleaved f32 samples. Returns the
/// samples, the channel count and the sample rate.
fn decode_audio(
    bytes: Vec<u8>,
    mime: Option<&str>,
) -> Result<(Vec<f32>, usize, u32), SampleError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(mime) = mime {
        hint.mime_type(mime);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();
    let probed = get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(SampleError::NoTrack)?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(0);

    let decoder_opts: DecoderOptions = Default::default();
    let mut decoder = get_codecs().make(&track.codec_params, &decoder_opts)?;

    let mut samples = Vec::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(err = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count();

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    if samples.is_empty() || channels == 0 || sample_rate == 0 {
        return Err(SampleError::Empty);
    }
    Ok((samples, channels, sample_rate))
}

/// Averages interleaved channels down to mono.
fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resamples mono audio using linear interpolation, which is plenty for short
/// one-shots.
fn transcode(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    let ratio = target_rate as f64 / source_rate as f64;
    let target_frames = (samples.len() as u64 * target_rate as u64).div_ceil(source_rate as u64);

    (0..target_frames as usize)
        .map(|target_frame| {
            let source_pos = target_frame as f64 / ratio;
            let source_frame = source_pos.floor() as usize;
            let frac = source_pos.fract() as f32;

            let s0 = samples.get(source_frame).copied().unwrap_or(0.0);
            let s1 = samples.get(source_frame + 1).copied().unwrap_or(s0);
            s0 + (s1 - s0) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Source;
    use crate::testutil::{wav_base64, wav_bytes};

    #[test]
    fn test_decode_bare_base64() {
        let payload = wav_base64(1, 48000, &[0, 16384, -16384, 0]);
        let sample = LoadedSample::decode(&payload, 48000).unwrap();

        assert_eq!(sample.len(), 4);
        assert_eq!(sample.sample_rate(), 48000);
    }

    #[test]
    fn test_decode_data_url() {
        let bytes = wav_bytes(1, 48000, &[0, 8192, 16384]);
        let payload = encode_data_url(&bytes, "audio/wav");
        assert!(payload.starts_with("data:audio/wav;base64,"));

        let (mime, decoded) = decode_payload(&payload).unwrap();
        assert_eq!(mime.as_deref(), Some("audio/wav"));
        assert_eq!(decoded, bytes);

        let sample = LoadedSample::decode(&payload, 48000).unwrap();
        assert_eq!(sample.len(), 3);
    }

    #[test]
    fn test_stereo_is_downmixed() {
        // Interleaved L/R frames that cancel out.
        let payload = wav_base64(2, 48000, &[16384, -16384, 8192, -8192]);
        let sample = LoadedSample::decode(&payload, 48000).unwrap();

        assert_eq!(sample.len(), 2);
        let mut source = sample.create_source("custom_oink", 1.0);
        assert!(source.next_sample().unwrap().abs() < 1e-6);
        assert!(source.next_sample().unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_resampled_to_target_rate() {
        let payload = wav_base64(1, 24000, &[0; 2400]);
        let sample = LoadedSample::decode(&payload, 48000).unwrap();

        assert_eq!(sample.len(), 4800);
        assert_eq!(sample.duration().as_millis(), 100);
    }

    #[test]
    fn test_invalid_payloads() {
        assert!(matches!(
            LoadedSample::decode("not base64!!", 48000),
            Err(SampleError::Base64(_))
        ));

        let garbage = STANDARD.encode(b"definitely not audio data at all");
        assert!(LoadedSample::decode(&garbage, 48000).is_err());

        let silent = wav_base64(1, 48000, &[]);
        assert!(LoadedSample::decode(&silent, 48000).is_err());
    }

    #[test]
    fn test_transcode_length() {
        let source: Vec<f32> = (0..4410).map(|i| (i as f32 / 100.0).sin()).collect();
        let result = transcode(&source, 44100, 48000);

        let expected_len = (4410.0_f64 * 48000.0 / 44100.0).ceil() as usize;
        assert_eq!(result.len(), expected_len);
        assert_eq!(result[0], source[0]);
    }

    #[test]
    fn test_resample() {
        let sample = LoadedSample::decode(&wav_base64(1, 44100, &[1000; 4410]), 48000).unwrap();
        assert_eq!(sample.len(), 4800);

        let resampled = sample.resample(44100);
        assert_eq!(resampled.len(), 4410);
        assert_eq!(resampled.sample_rate(), 44100);
        assert_eq!(resampled.duration().as_millis(), 100);
        assert_eq!(sample.resample(48000).len(), 4800);
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("oink.MP3")), "audio/mpeg");
        assert_eq!(mime_for_path(Path::new("oink.wav")), "audio/wav");
        assert_eq!(mime_for_path(Path::new("oink")), "audio/wav");
    }
}
