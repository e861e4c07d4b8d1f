use std::fmt;

use thiserror::Error;

use super::state::{EncoderStatus, StreamState};

/// Status reported by an audio engine alongside a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineStatus {
    Unsupported,
    InvalidArgument,
    InvalidState,
    DeviceUnavailable,
    Internal,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unsupported => "unsupported",
            Self::InvalidArgument => "invalid argument",
            Self::InvalidState => "invalid state",
            Self::DeviceUnavailable => "device unavailable",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Failure reported by an `AudioEngine`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("audio engine error ({status}): {description}")]
pub struct EngineError {
    pub status: EngineStatus,
    pub description: String,
}

impl EngineError {
    pub fn new(status: EngineStatus, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
        }
    }
}

/// Errors from stream session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("invalid stream configuration: {0}")]
    InvalidConfiguration(String),

    #[error("stream configuration unsupported: {0}")]
    ConfigurationUnsupported(EngineError),

    #[error("cannot {operation} a stream session in the {state} state")]
    LifecycleViolation {
        operation: &'static str,
        state: StreamState,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors from encoder session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid channel count {0}: encoders accept 1 or 2 channels")]
    InvalidChannelCount(u32),

    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("unknown application profile code: {0}")]
    InvalidApplication(i32),

    #[error("codec engine reported encoder size {0}")]
    SizeQueryFailed(i32),

    #[error("failed to allocate {size} bytes of encoder state")]
    AllocationFailure { size: usize },

    #[error("encoder state needs {required} bytes, {available} allocated")]
    InsufficientMemory { required: usize, available: usize },

    #[error("encoder initialization failed ({code}): {message}")]
    CodecInitFailure { code: i32, message: String },

    #[error("cannot {operation} an encoder session in the {status} state")]
    LifecycleViolation {
        operation: &'static str,
        status: EncoderStatus,
    },

    #[error("encoder is not initialized")]
    NotInitialized,
}
