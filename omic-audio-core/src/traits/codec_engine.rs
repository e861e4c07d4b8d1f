use crate::models::config::EncoderParameters;
use crate::storage::encoder_memory::EncoderMemory;

/// Interface to a compression library whose encoder state is allocated by
/// the caller and initialized in place.
///
/// Implemented by:
/// - `OpusCodecEngine` (libopus)
pub trait CodecEngine: Send + Sync {
    /// Bytes an encoder needs for `channels`. Values `<= 0` signal an error.
    fn required_size(&self, channels: u32) -> i32;

    /// Initialize the encoder state inside `memory`.
    ///
    /// Returns 0 on success, an engine-specific code otherwise. Sessions
    /// only call this with `memory` of at least
    /// `required_size(params.channels)` bytes.
    fn init_in_place(&self, memory: &mut EncoderMemory, params: &EncoderParameters) -> i32;

    /// Human-readable text for a non-zero status code.
    fn describe_error(&self, code: i32) -> String;
}
