//! # omic-audio-engines
//!
//! Engine backends for omic-audio-core.
//!
//! Provides:
//! - `SoftwareEngine`: timer-paced streams on a worker thread, no device needed
//! - `CpalEngine`: default input/output device via cpal (feature `cpal`)
//! - `OpusCodecEngine`: libopus encoder sizing and in-place init (feature `opus`)
//!
//! ## Platform Requirements
//! - `cpal` on Linux links against ALSA (`libasound2-dev`)
//! - `opus` builds or links libopus through `audiopus_sys`
//!
//! ## Usage
//! ```ignore
//! use omic_audio_core::{StreamConfiguration, StreamSession};
//! use omic_audio_engines::SoftwareEngine;
//!
//! let mut session = StreamSession::with_noise(SoftwareEngine::new());
//! session.open(StreamConfiguration::recording())?;
//! session.start()?;
//! ```

pub mod software;

#[cfg(feature = "cpal")]
pub mod cpal_engine;
#[cfg(feature = "opus")]
pub mod opus;

pub use software::{SoftwareCapabilities, SoftwareEngine, SoftwareStream};

#[cfg(feature = "cpal")]
pub use cpal_engine::{CpalEngine, CpalStream};
#[cfg(feature = "opus")]
pub use opus::OpusCodecEngine;
