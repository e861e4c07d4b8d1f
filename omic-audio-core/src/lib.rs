//! # omic-audio-core
//!
//! Engine-agnostic audio session management.
//!
//! Provides stream lifecycle control with pluggable frame-fill strategies and
//! sized, in-place encoder initialization. Platform backends implement the
//! `AudioEngine` and `CodecEngine` traits and plug into the generic
//! `StreamSession` and `EncoderSession`.
//!
//! ## Architecture
//!
//! ```text
//! omic-audio-core (this crate)
//! ├── traits/       ← AudioEngine, CodecEngine, FillStrategy
//! ├── models/       ← StreamConfiguration, EncoderParameters, errors, states
//! ├── processing/   ← FrameBuffer, sample conversion, WhiteNoise
//! ├── session/      ← StreamSession, EncoderSession
//! └── storage/      ← EncoderMemory
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{
    Application, ChannelCount, Direction, EncoderParameters, PerformanceMode, SampleFormat,
    SharingMode, StreamConfiguration,
};
pub use models::error::{CodecError, EngineError, EngineStatus, StreamError};
pub use models::state::{EncoderStatus, StreamState};
pub use processing::frame_buffer::{FrameBuffer, Sample, SampleBuffer};
pub use processing::noise::{WhiteNoise, DEFAULT_NOISE_AMPLITUDE};
pub use session::encoder::EncoderSession;
pub use session::stream::{StreamDiagnostics, StreamSession};
pub use storage::encoder_memory::EncoderMemory;
pub use traits::audio_engine::{AudioEngine, FillCallback};
pub use traits::codec_engine::CodecEngine;
pub use traits::fill_strategy::{from_fn, FillResult, FillStrategy, FnStrategy, Silence};
