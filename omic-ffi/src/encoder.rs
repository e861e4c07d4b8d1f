//! Encoder entry points.

use std::os::raw::c_int;

use omic_audio_core::{
    Application, CodecEngine, EncoderParameters, EncoderSession, EncoderStatus,
};

use crate::error::{report, FfiError, OMIC_OK};

trait EncoderHandle: Send {
    fn status(&self) -> EncoderStatus;
    fn release(&mut self);
}

impl<C: CodecEngine + 'static> EncoderHandle for EncoderSession<C> {
    fn status(&self) -> EncoderStatus {
        EncoderSession::status(self)
    }

    fn release(&mut self) {
        EncoderSession::release(self)
    }
}

/// Opaque handle to an initialized encoder.
pub struct OmicEncoder {
    session: Box<dyn EncoderHandle>,
}

impl OmicEncoder {
    pub fn status(&self) -> EncoderStatus {
        self.session.status()
    }
}

impl Drop for OmicEncoder {
    fn drop(&mut self) {
        self.session.release();
    }
}

#[cfg_attr(not(feature = "opus"), allow(dead_code))]
pub(crate) fn init_encoder<C: CodecEngine + 'static>(
    engine: C,
    sample_rate: u32,
    channels: u32,
    application: c_int,
) -> Result<OmicEncoder, FfiError> {
    let application = Application::from_code(application)?;
    let params = EncoderParameters::new(sample_rate, channels, application);
    let session = EncoderSession::acquire(engine, params)?;
    Ok(OmicEncoder {
        session: Box::new(session),
    })
}

#[cfg(feature = "opus")]
fn init_default_codec(
    sample_rate: u32,
    channels: u32,
    application: c_int,
) -> Result<OmicEncoder, FfiError> {
    init_encoder(
        omic_audio_engines::OpusCodecEngine::new(),
        sample_rate,
        channels,
        application,
    )
}

#[cfg(not(feature = "opus"))]
fn init_default_codec(
    _sample_rate: u32,
    _channels: u32,
    _application: c_int,
) -> Result<OmicEncoder, FfiError> {
    Err(FfiError::Unsupported("opus"))
}

/// Size, allocate and initialize an encoder.
///
/// Returns 0 and writes the handle to `out_handle` on success, a negative
/// status otherwise. Nothing is written on failure.
///
/// # Safety
/// `out_handle` must be valid for a pointer-sized write.
#[no_mangle]
pub unsafe extern "C" fn omic_encoder_init(
    sample_rate: u32,
    channels: u32,
    application: c_int,
    out_handle: *mut *mut OmicEncoder,
) -> c_int {
    if out_handle.is_null() {
        return report(FfiError::NullPointer("encoder handle output"));
    }
    match init_default_codec(sample_rate, channels, application) {
        Ok(encoder) => {
            // SAFETY: checked non-null; caller guarantees it is writable.
            unsafe { *out_handle = Box::into_raw(Box::new(encoder)) };
            OMIC_OK
        }
        Err(e) => report(e),
    }
}

/// `omic_encoder_init` with the restricted-low-delay profile.
///
/// # Safety
/// Same contract as `omic_encoder_init`.
#[no_mangle]
pub unsafe extern "C" fn omic_encoder_init_default(
    sample_rate: u32,
    channels: u32,
    out_handle: *mut *mut OmicEncoder,
) -> c_int {
    unsafe {
        omic_encoder_init(
            sample_rate,
            channels,
            Application::RestrictedLowDelay.code(),
            out_handle,
        )
    }
}

/// Free the encoder state and the handle.
///
/// # Safety
/// `handle` must be null or a live pointer from `omic_encoder_init`; it is
/// invalid afterwards.
#[no_mangle]
pub unsafe extern "C" fn omic_encoder_release(handle: *mut OmicEncoder) {
    if handle.is_null() {
        return;
    }
    // SAFETY: ownership returns to Rust exactly once per the contract above.
    drop(unsafe { Box::from_raw(handle) });
    log::debug!("encoder handle released");
}
