use crate::processing::frame_buffer::FrameBuffer;

/// Continuation signal returned from every fill invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillResult {
    /// Keep invoking the callback.
    Continue,
    /// Ask the engine to halt the stream after this invocation.
    Stop,
}

/// Produces (or consumes, for capture streams) one buffer of frames per
/// scheduling quantum.
///
/// Runs on the engine's real-time thread. Implementations must write every
/// sample of `buffer` for playback streams and must not block on unbounded
/// work: missing the deadline is an audible underrun, not an error.
pub trait FillStrategy: Send + 'static {
    fn fill(&mut self, buffer: &mut FrameBuffer<'_>, num_frames: usize) -> FillResult;
}

impl FillStrategy for Box<dyn FillStrategy> {
    fn fill(&mut self, buffer: &mut FrameBuffer<'_>, num_frames: usize) -> FillResult {
        (**self).fill(buffer, num_frames)
    }
}

/// Strategy backed by a closure. Built with [`from_fn`].
pub struct FnStrategy<F> {
    f: F,
}

impl<F> FillStrategy for FnStrategy<F>
where
    F: FnMut(&mut FrameBuffer<'_>, usize) -> FillResult + Send + 'static,
{
    fn fill(&mut self, buffer: &mut FrameBuffer<'_>, num_frames: usize) -> FillResult {
        (self.f)(buffer, num_frames)
    }
}

/// Wrap a closure as a fill strategy.
pub fn from_fn<F>(f: F) -> FnStrategy<F>
where
    F: FnMut(&mut FrameBuffer<'_>, usize) -> FillResult + Send + 'static,
{
    FnStrategy { f }
}

/// Writes silence and never stops the stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl FillStrategy for Silence {
    fn fill(&mut self, buffer: &mut FrameBuffer<'_>, _num_frames: usize) -> FillResult {
        buffer.fill_silence();
        FillResult::Continue
    }
}
