use crate::models::config::SampleFormat;

/// A sample type an engine can hand to a fill strategy.
///
/// Normalized values are `f32` in `[-1.0, 1.0]`; integer formats scale to
/// their positive maximum and clamp out-of-range input.
pub trait Sample: Copy + Send + 'static {
    const FORMAT: SampleFormat;
    const EQUILIBRIUM: Self;

    fn from_f32(value: f32) -> Self;

    fn to_f32(self) -> f32;

    fn frame_buffer(samples: &mut [Self]) -> FrameBuffer<'_>;
}

impl Sample for i16 {
    const FORMAT: SampleFormat = SampleFormat::I16;
    const EQUILIBRIUM: Self = 0;

    fn from_f32(value: f32) -> Self {
        (value.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
    }

    fn to_f32(self) -> f32 {
        self as f32 / i16::MAX as f32
    }

    fn frame_buffer(samples: &mut [Self]) -> FrameBuffer<'_> {
        FrameBuffer::I16(samples)
    }
}

impl Sample for i32 {
    const FORMAT: SampleFormat = SampleFormat::I32;
    const EQUILIBRIUM: Self = 0;

    fn from_f32(value: f32) -> Self {
        (value.clamp(-1.0, 1.0) as f64 * i32::MAX as f64) as i32
    }

    fn to_f32(self) -> f32 {
        (self as f64 / i32::MAX as f64) as f32
    }

    fn frame_buffer(samples: &mut [Self]) -> FrameBuffer<'_> {
        FrameBuffer::I32(samples)
    }
}

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::F32;
    const EQUILIBRIUM: Self = 0.0;

    fn from_f32(value: f32) -> Self {
        value
    }

    fn to_f32(self) -> f32 {
        self
    }

    fn frame_buffer(samples: &mut [Self]) -> FrameBuffer<'_> {
        FrameBuffer::F32(samples)
    }
}

/// Interleaved samples lent by the engine for a single fill invocation.
///
/// Holds `num_frames * channels` samples in the negotiated format. The
/// borrow ends when the callback returns.
#[derive(Debug)]
pub enum FrameBuffer<'a> {
    I16(&'a mut [i16]),
    I32(&'a mut [i32]),
    F32(&'a mut [f32]),
}

impl FrameBuffer<'_> {
    pub fn format(&self) -> SampleFormat {
        match self {
            Self::I16(_) => SampleFormat::I16,
            Self::I32(_) => SampleFormat::I32,
            Self::F32(_) => SampleFormat::F32,
        }
    }

    /// Number of samples (not frames) in the buffer.
    pub fn len(&self) -> usize {
        match self {
            Self::I16(s) => s.len(),
            Self::I32(s) => s.len(),
            Self::F32(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fill_silence(&mut self) {
        match self {
            Self::I16(s) => s.fill(i16::EQUILIBRIUM),
            Self::I32(s) => s.fill(i32::EQUILIBRIUM),
            Self::F32(s) => s.fill(f32::EQUILIBRIUM),
        }
    }

    /// Overwrite every sample with normalized values drawn from `next`.
    pub fn fill_with(&mut self, mut next: impl FnMut() -> f32) {
        match self {
            Self::I16(s) => s.iter_mut().for_each(|x| *x = i16::from_f32(next())),
            Self::I32(s) => s.iter_mut().for_each(|x| *x = i32::from_f32(next())),
            Self::F32(s) => s.iter_mut().for_each(|x| *x = next()),
        }
    }

    /// Copy the contents out as normalized `f32`.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self {
            Self::I16(s) => s.iter().map(|x| x.to_f32()).collect(),
            Self::I32(s) => s.iter().map(|x| x.to_f32()).collect(),
            Self::F32(s) => s.to_vec(),
        }
    }
}

impl<'a> From<&'a mut [i16]> for FrameBuffer<'a> {
    fn from(samples: &'a mut [i16]) -> Self {
        Self::I16(samples)
    }
}

impl<'a> From<&'a mut [i32]> for FrameBuffer<'a> {
    fn from(samples: &'a mut [i32]) -> Self {
        Self::I32(samples)
    }
}

impl<'a> From<&'a mut [f32]> for FrameBuffer<'a> {
    fn from(samples: &'a mut [f32]) -> Self {
        Self::F32(samples)
    }
}

/// Owned sample storage an engine can lend out as a `FrameBuffer`.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
}

impl SampleBuffer {
    /// Silent buffer holding `len` samples of `format`.
    pub fn new(format: SampleFormat, len: usize) -> Self {
        match format {
            SampleFormat::I16 => Self::I16(vec![i16::EQUILIBRIUM; len]),
            SampleFormat::I32 => Self::I32(vec![i32::EQUILIBRIUM; len]),
            SampleFormat::F32 => Self::F32(vec![f32::EQUILIBRIUM; len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_frame_buffer(&mut self) -> FrameBuffer<'_> {
        match self {
            Self::I16(v) => FrameBuffer::I16(v),
            Self::I32(v) => FrameBuffer::I32(v),
            Self::F32(v) => FrameBuffer::F32(v),
        }
    }
}
