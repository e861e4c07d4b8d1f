use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::ptr;

use parking_lot::Mutex;
use thiserror::Error;

use omic_audio_core::{CodecError, StreamError};

pub const OMIC_OK: c_int = 0;
pub const OMIC_ERR_INVALID_ARGUMENT: c_int = -1;
pub const OMIC_ERR_ALLOCATION: c_int = -2;
pub const OMIC_ERR_INIT: c_int = -3;
pub const OMIC_ERR_UNSUPPORTED: c_int = -4;
pub const OMIC_ERR_NULL_POINTER: c_int = -5;
pub const OMIC_ERR_STATE: c_int = -6;

/// Failures surfaced across the C boundary.
#[derive(Debug, Error)]
pub enum FfiError {
    #[error("null pointer passed as {0}")]
    NullPointer(&'static str),

    #[error("{0} support was not compiled in")]
    Unsupported(&'static str),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl FfiError {
    /// Negative status code handed to C callers.
    pub fn status(&self) -> c_int {
        match self {
            Self::NullPointer(_) => OMIC_ERR_NULL_POINTER,
            Self::Unsupported(_) => OMIC_ERR_UNSUPPORTED,
            Self::Stream(StreamError::InvalidConfiguration(_)) => OMIC_ERR_INVALID_ARGUMENT,
            Self::Stream(StreamError::ConfigurationUnsupported(_)) => OMIC_ERR_UNSUPPORTED,
            Self::Stream(StreamError::LifecycleViolation { .. }) => OMIC_ERR_STATE,
            Self::Stream(StreamError::Engine(_)) => OMIC_ERR_INIT,
            Self::Codec(
                CodecError::InvalidChannelCount(_)
                | CodecError::InvalidSampleRate(_)
                | CodecError::InvalidApplication(_),
            ) => OMIC_ERR_INVALID_ARGUMENT,
            Self::Codec(CodecError::AllocationFailure { .. }) => OMIC_ERR_ALLOCATION,
            Self::Codec(CodecError::InsufficientMemory { .. }) => OMIC_ERR_INVALID_ARGUMENT,
            Self::Codec(CodecError::SizeQueryFailed(_) | CodecError::CodecInitFailure { .. }) => {
                OMIC_ERR_INIT
            }
            Self::Codec(CodecError::LifecycleViolation { .. } | CodecError::NotInitialized) => {
                OMIC_ERR_STATE
            }
        }
    }
}

static LAST_ERROR: Mutex<Option<CString>> = Mutex::new(None);

/// Record `err` for `omic_last_error_message` and return its status code.
pub(crate) fn report(err: FfiError) -> c_int {
    log::error!("{}", err);
    let status = err.status();
    set_last_error(&err.to_string());
    status
}

pub(crate) fn set_last_error(msg: &str) {
    *LAST_ERROR.lock() = Some(error_cstring(msg));
}

fn error_cstring(msg: &str) -> CString {
    CString::new(msg.replace('\0', " ")).unwrap_or_default()
}

pub(crate) fn to_cstring(s: &str) -> *mut c_char {
    CString::new(s).map_or(ptr::null_mut(), CString::into_raw)
}

/// Message of the most recent failure on any thread, or null.
///
/// The pointer stays valid until the next failing call.
#[no_mangle]
pub extern "C" fn omic_last_error_message() -> *const c_char {
    match LAST_ERROR.lock().as_ref() {
        Some(s) => s.as_ptr(),
        None => ptr::null(),
    }
}

/// Free a string returned by this library.
///
/// # Safety
/// `s` must be null or a pointer obtained from this library that has not
/// been freed yet.
#[no_mangle]
pub unsafe extern "C" fn omic_string_free(s: *mut c_char) {
    if !s.is_null() {
        // SAFETY: produced by `CString::into_raw` in `to_cstring`.
        drop(unsafe { CString::from_raw(s) });
    }
}
