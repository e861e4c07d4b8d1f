use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::processing::frame_buffer::FrameBuffer;
use crate::traits::fill_strategy::{FillResult, FillStrategy};

/// Peak amplitude of the default noise strategy.
pub const DEFAULT_NOISE_AMPLITUDE: f32 = 0.2;

/// White-noise generator: every sample is an independent uniform draw in
/// `[-amplitude, amplitude)`.
///
/// The reference fill strategy for a stream session. Never stops the stream.
pub struct WhiteNoise {
    amplitude: f32,
    rng: StdRng,
}

impl WhiteNoise {
    pub fn new() -> Self {
        Self::with_amplitude(DEFAULT_NOISE_AMPLITUDE)
    }

    /// Amplitude is clamped to `[0.0, 1.0]`; non-finite values become silence.
    pub fn with_amplitude(amplitude: f32) -> Self {
        Self {
            amplitude: sanitize_amplitude(amplitude),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic generator for reproducible output.
    pub fn seeded(amplitude: f32, seed: u64) -> Self {
        Self {
            amplitude: sanitize_amplitude(amplitude),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    fn next_sample(&mut self) -> f32 {
        (self.rng.random::<f32>() - 0.5) * 2.0 * self.amplitude
    }
}

impl Default for WhiteNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl FillStrategy for WhiteNoise {
    fn fill(&mut self, buffer: &mut FrameBuffer<'_>, _num_frames: usize) -> FillResult {
        buffer.fill_with(|| self.next_sample());
        FillResult::Continue
    }
}

fn sanitize_amplitude(amplitude: f32) -> f32 {
    if amplitude.is_finite() {
        amplitude.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
