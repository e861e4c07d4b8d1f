//! libopus codec engine.
//!
//! Encoder state lives in caller-owned `EncoderMemory`; libopus only sizes
//! and initializes it.

use std::ffi::CStr;
use std::os::raw::c_int;

use audiopus_sys as ffi;

use omic_audio_core::models::config::EncoderParameters;
use omic_audio_core::storage::encoder_memory::EncoderMemory;
use omic_audio_core::traits::codec_engine::CodecEngine;

// libopus status codes (opus_defines.h).
const OPUS_BAD_ARG: i32 = -1;
const OPUS_BUFFER_TOO_SMALL: i32 = -2;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpusCodecEngine;

impl OpusCodecEngine {
    pub fn new() -> Self {
        Self
    }
}

impl CodecEngine for OpusCodecEngine {
    fn required_size(&self, channels: u32) -> i32 {
        let Ok(channels) = c_int::try_from(channels) else {
            return OPUS_BAD_ARG;
        };
        // SAFETY: a pure size computation with no pointer arguments.
        unsafe { ffi::opus_encoder_get_size(channels) }
    }

    fn init_in_place(&self, memory: &mut EncoderMemory, params: &EncoderParameters) -> i32 {
        let needed = self.required_size(params.channels);
        if needed <= 0 {
            return needed;
        }
        if memory.len() < needed as usize {
            log::error!(
                "encoder memory holds {} bytes, libopus needs {}",
                memory.len(),
                needed
            );
            return OPUS_BUFFER_TOO_SMALL;
        }

        let (Ok(rate), Ok(channels)) = (
            i32::try_from(params.sample_rate),
            c_int::try_from(params.channels),
        ) else {
            return OPUS_BAD_ARG;
        };

        // SAFETY: `memory` is 8-byte aligned, at least `opus_encoder_get_size`
        // bytes long and exclusively borrowed for the duration of the call.
        unsafe {
            ffi::opus_encoder_init(
                memory.as_mut_ptr().cast::<ffi::OpusEncoder>(),
                rate,
                channels,
                params.application.code(),
            )
        }
    }

    fn describe_error(&self, code: i32) -> String {
        // SAFETY: libopus returns a pointer to a static NUL-terminated string
        // for every input, including unknown codes.
        let text = unsafe { ffi::opus_strerror(code) };
        if text.is_null() {
            return format!("opus error {}", code);
        }
        // SAFETY: checked non-null above; the string is static.
        unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
    }
}
