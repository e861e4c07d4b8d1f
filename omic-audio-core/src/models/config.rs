use serde::{Deserialize, Serialize};

use super::error::{CodecError, StreamError};

/// Whether the stream records from or plays to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Capture,
    Playback,
}

/// Scheduling hint passed to the audio engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    LowLatency,
    PowerSaving,
    None,
}

/// Whether the stream claims the device for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharingMode {
    Exclusive,
    Shared,
}

/// Sample representation negotiated with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    I16,
    I32,
    F32,
}

impl SampleFormat {
    /// Size of one sample in bytes.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::I16 => 2,
            Self::I32 | Self::F32 => 4,
        }
    }
}

/// Channel layout of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelCount {
    Mono,
    Stereo,
}

impl ChannelCount {
    pub fn count(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// Desired shape of an audio stream.
///
/// Handed to `StreamSession::open` and kept unchanged for the lifetime of
/// the stream. `sample_rate` and `frames_per_callback` are requests; `None`
/// lets the engine pick its native value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfiguration {
    pub direction: Direction,
    pub performance_mode: PerformanceMode,
    pub sharing_mode: SharingMode,
    pub format: SampleFormat,
    pub channel_count: ChannelCount,
    pub sample_rate: Option<u32>,
    pub frames_per_callback: Option<u32>,
}

impl StreamConfiguration {
    /// Mono 16-bit low-latency exclusive capture, the shape used for recording.
    pub fn recording() -> Self {
        Self {
            direction: Direction::Capture,
            performance_mode: PerformanceMode::LowLatency,
            sharing_mode: SharingMode::Exclusive,
            format: SampleFormat::I16,
            channel_count: ChannelCount::Mono,
            sample_rate: None,
            frames_per_callback: None,
        }
    }

    /// Mono float low-latency exclusive playback.
    pub fn playback() -> Self {
        Self {
            direction: Direction::Playback,
            format: SampleFormat::F32,
            ..Self::recording()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StreamError::InvalidConfiguration(format!("malformed configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.sample_rate == Some(0) {
            return Err(StreamError::InvalidConfiguration(
                "sample rate must be positive".into(),
            ));
        }
        if self.frames_per_callback == Some(0) {
            return Err(StreamError::InvalidConfiguration(
                "frames per callback must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for StreamConfiguration {
    fn default() -> Self {
        Self::recording()
    }
}

/// Use-case hint consumed by the codec engine.
///
/// Discriminants are the Opus `OPUS_APPLICATION_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Application {
    Voip = 2048,
    Audio = 2049,
    RestrictedLowDelay = 2051,
}

impl Application {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Result<Self, CodecError> {
        match code {
            2048 => Ok(Self::Voip),
            2049 => Ok(Self::Audio),
            2051 => Ok(Self::RestrictedLowDelay),
            other => Err(CodecError::InvalidApplication(other)),
        }
    }
}

/// Parameters for initializing an encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderParameters {
    pub sample_rate: u32,
    pub channels: u32,
    pub application: Application,
}

impl EncoderParameters {
    pub fn new(sample_rate: u32, channels: u32, application: Application) -> Self {
        Self {
            sample_rate,
            channels,
            application,
        }
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        validate_channels(self.channels)?;
        if self.sample_rate == 0 {
            return Err(CodecError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }
}

impl Default for EncoderParameters {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 1,
            application: Application::RestrictedLowDelay,
        }
    }
}

/// Encoders accept mono or stereo input only.
pub fn validate_channels(channels: u32) -> Result<(), CodecError> {
    if channels == 1 || channels == 2 {
        Ok(())
    } else {
        Err(CodecError::InvalidChannelCount(channels))
    }
}
