//! In-memory engines for exercising sessions without a device or codec.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::{EncoderParameters, SampleFormat, StreamConfiguration};
use crate::models::error::EngineError;
use crate::processing::frame_buffer::SampleBuffer;
use crate::storage::encoder_memory::EncoderMemory;
use crate::traits::audio_engine::{AudioEngine, FillCallback};
use crate::traits::codec_engine::CodecEngine;
use crate::traits::fill_strategy::FillResult;

#[derive(Default)]
struct FakeEngineState {
    outstanding: AtomicUsize,
    running: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    callback: Mutex<Option<FillCallback>>,
}

/// Engine that records lifecycle calls and runs fills only when pumped.
#[derive(Clone, Default)]
pub(crate) struct FakeAudioEngine {
    state: Arc<FakeEngineState>,
    reject_open: Option<EngineError>,
    reject_start: Option<EngineError>,
    skip_drain: bool,
}

pub(crate) struct FakeStream;

impl FakeAudioEngine {
    pub fn accept_all() -> Self {
        Self::default()
    }

    pub fn rejecting(error: EngineError) -> Self {
        Self {
            reject_open: Some(error),
            ..Self::default()
        }
    }

    pub fn failing_start(error: EngineError) -> Self {
        Self {
            reject_start: Some(error),
            ..Self::default()
        }
    }

    /// `request_stop` returns without waiting for an in-flight fill, as a
    /// device pause does.
    pub fn without_drain() -> Self {
        Self {
            skip_drain: true,
            ..Self::default()
        }
    }

    pub fn outstanding_handles(&self) -> usize {
        self.state.outstanding.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.state.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.state.stop_calls.load(Ordering::SeqCst)
    }

    /// Run one fill the way the real-time thread would. `None` while stopped.
    pub fn pump(
        &self,
        num_frames: usize,
        format: SampleFormat,
        channels: usize,
    ) -> Option<(FillResult, SampleBuffer)> {
        if !self.is_running() {
            return None;
        }
        let mut guard = self.state.callback.lock();
        let callback = guard.as_mut()?;

        let mut samples = SampleBuffer::new(format, num_frames * channels);
        let result = callback(&mut samples.as_frame_buffer(), num_frames);
        if result == FillResult::Stop {
            self.state.running.store(false, Ordering::SeqCst);
        }
        Some((result, samples))
    }

    /// Invoke the callback regardless of run state, as a misbehaving engine might.
    pub fn pump_unchecked(&self, num_frames: usize) -> Option<FillResult> {
        let mut guard = self.state.callback.lock();
        let callback = guard.as_mut()?;
        let mut samples = SampleBuffer::new(SampleFormat::F32, num_frames);
        Some(callback(&mut samples.as_frame_buffer(), num_frames))
    }
}

impl AudioEngine for FakeAudioEngine {
    type Stream = FakeStream;

    fn open_stream(
        &self,
        _config: &StreamConfiguration,
        callback: FillCallback,
    ) -> Result<FakeStream, EngineError> {
        if let Some(error) = &self.reject_open {
            return Err(error.clone());
        }
        *self.state.callback.lock() = Some(callback);
        self.state.outstanding.fetch_add(1, Ordering::SeqCst);
        Ok(FakeStream)
    }

    fn request_start(&self, _stream: &mut FakeStream) -> Result<(), EngineError> {
        self.state.start_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.reject_start {
            return Err(error.clone());
        }
        self.state.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn request_stop(&self, _stream: &mut FakeStream) -> Result<(), EngineError> {
        self.state.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.state.running.store(false, Ordering::SeqCst);
        if !self.skip_drain {
            // Taking the lock waits out a fill running on another thread.
            drop(self.state.callback.lock());
        }
        Ok(())
    }

    fn close_stream(&self, _stream: FakeStream) {
        self.state.callback.lock().take();
        self.state.outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Default)]
pub(crate) struct CodecCalls {
    pub size_queries: AtomicUsize,
    pub inits: AtomicUsize,
}

/// Codec engine with a fixed size and a fixed init status.
///
/// With `per_channel`, the reported size is multiplied by the channel count
/// and init fails with `UNDERSIZED` when handed less.
pub(crate) struct FakeCodecEngine {
    size: i32,
    per_channel: bool,
    init_status: i32,
    pub calls: Arc<CodecCalls>,
}

impl FakeCodecEngine {
    pub fn succeeding(size: i32) -> Self {
        Self {
            size,
            per_channel: false,
            init_status: 0,
            calls: Arc::default(),
        }
    }

    pub fn per_channel(bytes_per_channel: i32) -> Self {
        Self {
            per_channel: true,
            ..Self::succeeding(bytes_per_channel)
        }
    }

    pub fn failing_init(size: i32, status: i32) -> Self {
        Self {
            size,
            per_channel: false,
            init_status: status,
            calls: Arc::default(),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.calls.size_queries.load(Ordering::SeqCst) + self.calls.inits.load(Ordering::SeqCst)
    }
}

impl FakeCodecEngine {
    pub const UNDERSIZED: i32 = -99;

    fn size_for(&self, channels: u32) -> i32 {
        if self.per_channel {
            self.size * channels as i32
        } else {
            self.size
        }
    }
}

impl CodecEngine for FakeCodecEngine {
    fn required_size(&self, channels: u32) -> i32 {
        self.calls.size_queries.fetch_add(1, Ordering::SeqCst);
        self.size_for(channels)
    }

    fn init_in_place(&self, memory: &mut EncoderMemory, params: &EncoderParameters) -> i32 {
        self.calls.inits.fetch_add(1, Ordering::SeqCst);
        if memory.len() < self.size_for(params.channels).max(0) as usize {
            return Self::UNDERSIZED;
        }
        if self.init_status == 0 {
            memory.as_bytes_mut()[0] = params.channels as u8;
        }
        self.init_status
    }

    fn describe_error(&self, code: i32) -> String {
        format!("fake codec error {}", code)
    }
}
