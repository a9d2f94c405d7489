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

//! Decoded one-shot samples, ready for playback.
//!
//! Payloads are decoded ahead of time so that triggering a sample never blocks
//! on I/O or decoding.

mod error;
mod loader;
mod store;

pub use error::SampleError;
pub use loader::{decode_payload, encode_data_url, mime_for_path, LoadedSample};
pub use store::SampleStore;
