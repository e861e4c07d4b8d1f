use std::mem;

use crate::models::config::{validate_channels, EncoderParameters};
use crate::models::error::CodecError;
use crate::models::state::EncoderStatus;
use crate::storage::encoder_memory::EncoderMemory;
use crate::traits::codec_engine::CodecEngine;

enum EncoderSlot {
    Empty,
    Allocated(EncoderMemory),
    Ready(EncoderMemory),
    Released,
}

impl EncoderSlot {
    fn status(&self) -> EncoderStatus {
        match self {
            Self::Empty => EncoderStatus::Empty,
            Self::Allocated(_) => EncoderStatus::Allocated,
            Self::Ready(_) => EncoderStatus::Ready,
            Self::Released => EncoderStatus::Released,
        }
    }
}

/// Owns one encoder instance's state block.
///
/// Lifecycle: `query_size` → `allocate` → `initialize` → use → `release`.
/// Prefer [`EncoderSession::acquire`], which runs the first three steps and
/// frees the memory on every failure path.
///
/// Not synchronized; keep one session per thread or lock externally.
pub struct EncoderSession<C: CodecEngine> {
    engine: C,
    slot: EncoderSlot,
    params: Option<EncoderParameters>,
}

impl<C: CodecEngine> EncoderSession<C> {
    pub fn new(engine: C) -> Self {
        Self {
            engine,
            slot: EncoderSlot::Empty,
            params: None,
        }
    }

    /// Size, allocate and initialize an encoder in one step.
    pub fn acquire(engine: C, params: EncoderParameters) -> Result<Self, CodecError> {
        params.validate()?;

        let mut session = Self::new(engine);
        let size = session.query_size(params.channels)?;
        session.allocate(size)?;
        session.initialize(params)?;
        Ok(session)
    }

    pub fn status(&self) -> EncoderStatus {
        self.slot.status()
    }

    /// Parameters of the initialized encoder, if any.
    pub fn parameters(&self) -> Option<&EncoderParameters> {
        self.params.as_ref()
    }

    pub fn engine(&self) -> &C {
        &self.engine
    }

    /// Bytes of encoder state needed for `channels`.
    ///
    /// Channel counts other than 1 or 2 are rejected before the engine is
    /// consulted.
    pub fn query_size(&self, channels: u32) -> Result<usize, CodecError> {
        validate_channels(channels)?;

        let size = self.engine.required_size(channels);
        if size <= 0 {
            log::error!("codec engine reported encoder size {} for {} channel(s)", size, channels);
            return Err(CodecError::SizeQueryFailed(size));
        }
        Ok(size as usize)
    }

    /// Reserve `size` bytes for the encoder state. Transitions: empty → allocated.
    pub fn allocate(&mut self, size: usize) -> Result<(), CodecError> {
        if !matches!(self.slot, EncoderSlot::Empty) {
            return Err(self.violation("allocate"));
        }

        let memory = EncoderMemory::allocate(size).map_err(|e| {
            log::error!("{}", e);
            e
        })?;
        log::debug!("allocated {} bytes of encoder state", memory.len());
        self.slot = EncoderSlot::Allocated(memory);
        Ok(())
    }

    /// Initialize the allocated state in place. Transitions: allocated → ready.
    ///
    /// Parameters are validated and the block is checked against the size
    /// the engine needs for `params.channels` before the engine runs. A block
    /// that is too small, or a non-zero engine status, frees the memory and
    /// returns the session to empty, so a half-initialized encoder is never
    /// reachable.
    pub fn initialize(&mut self, params: EncoderParameters) -> Result<(), CodecError> {
        params.validate()?;

        let mut memory = match mem::replace(&mut self.slot, EncoderSlot::Empty) {
            EncoderSlot::Allocated(memory) => memory,
            other => {
                self.slot = other;
                return Err(self.violation("initialize"));
            }
        };

        let required = match self.query_size(params.channels) {
            Ok(required) => required,
            Err(e) => {
                self.slot = EncoderSlot::Allocated(memory);
                return Err(e);
            }
        };
        if memory.len() < required {
            log::error!(
                "encoder state for {} channel(s) needs {} bytes, {} allocated",
                params.channels,
                required,
                memory.len()
            );
            let available = memory.len();
            drop(memory);
            self.params = None;
            return Err(CodecError::InsufficientMemory { required, available });
        }

        let code = self.engine.init_in_place(&mut memory, &params);
        if code != 0 {
            let message = self.engine.describe_error(code);
            log::error!("couldn't init encoder ret: {}; error: {}", code, message);
            drop(memory);
            self.params = None;
            return Err(CodecError::CodecInitFailure { code, message });
        }

        log::debug!(
            "encoder initialized ({} Hz, {} channel(s), {:?})",
            params.sample_rate,
            params.channels,
            params.application
        );
        self.slot = EncoderSlot::Ready(memory);
        self.params = Some(params);
        Ok(())
    }

    /// Initialized encoder state, for engine-specific use.
    pub fn state_mut(&mut self) -> Result<&mut EncoderMemory, CodecError> {
        match &mut self.slot {
            EncoderSlot::Ready(memory) => Ok(memory),
            _ => Err(CodecError::NotInitialized),
        }
    }

    /// Free the encoder state. Safe to call more than once.
    pub fn release(&mut self) {
        match mem::replace(&mut self.slot, EncoderSlot::Released) {
            EncoderSlot::Allocated(memory) | EncoderSlot::Ready(memory) => {
                log::debug!("released {} bytes of encoder state", memory.len());
            }
            EncoderSlot::Empty => self.slot = EncoderSlot::Empty,
            EncoderSlot::Released => {}
        }
        self.params = None;
    }

    fn violation(&self, operation: &'static str) -> CodecError {
        let status = self.slot.status();
        log::error!("cannot {} an encoder in the {} state", operation, status);
        CodecError::LifecycleViolation { operation, status }
    }
}
