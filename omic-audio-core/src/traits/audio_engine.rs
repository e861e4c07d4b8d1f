use crate::models::config::StreamConfiguration;
use crate::models::error::EngineError;
use crate::processing::frame_buffer::FrameBuffer;
use crate::traits::fill_strategy::FillResult;

/// Callback an engine invokes once per scheduling quantum.
///
/// Parameters:
/// - `buffer`: interleaved samples in the configured format, lent for the call.
/// - `num_frames`: frames in `buffer` (`buffer.len() / channels`).
pub type FillCallback =
    Box<dyn FnMut(&mut FrameBuffer<'_>, usize) -> FillResult + Send + 'static>;

/// Interface to the platform audio stack.
///
/// Implemented by:
/// - `SoftwareEngine` (clock-driven, no device)
/// - `CpalEngine` (devices through cpal)
///
/// Engines own the real-time thread. They must never invoke a stream's
/// callback concurrently with itself, and `request_stop` should not return
/// while an invocation is still in flight. `StreamSession` also waits out an
/// in-flight fill after `request_stop`, so a backend whose pause cannot drain
/// is still safe to drive through a session.
pub trait AudioEngine: Send + Sync {
    /// Live stream handle. Owned by exactly one session.
    type Stream;

    /// Realize `config` as a stream that will drive `callback` once started.
    ///
    /// Fails when the direction, modes, format or channel count cannot be
    /// satisfied. Such failures are not transient.
    fn open_stream(
        &self,
        config: &StreamConfiguration,
        callback: FillCallback,
    ) -> Result<Self::Stream, EngineError>;

    /// Begin invoking the stream's callback.
    fn request_start(&self, stream: &mut Self::Stream) -> Result<(), EngineError>;

    /// Stop invoking the callback and drain any in-flight invocation.
    fn request_stop(&self, stream: &mut Self::Stream) -> Result<(), EngineError>;

    /// Release the stream. Called once, after the stream is stopped.
    fn close_stream(&self, stream: Self::Stream);

    /// Human-readable engine name for logs.
    fn name(&self) -> &str;
}
