//! Recording session entry points.
//!
//! A recording session captures from the default input with the low-latency
//! mono i16 profile and feeds it white noise through the fill strategy.

use std::os::raw::{c_char, c_int};
use std::ptr;

use omic_audio_core::{AudioEngine, StreamConfiguration, StreamSession};

use crate::error::{report, to_cstring, FfiError, OMIC_OK};

#[cfg(feature = "cpal")]
type DefaultEngine = omic_audio_engines::CpalEngine;
#[cfg(not(feature = "cpal"))]
type DefaultEngine = omic_audio_engines::SoftwareEngine;

pub const CREATED_STATUS: &str = "Created a recorder";

/// Opaque handle owned by the C caller.
pub struct RecordingSession {
    session: StreamSession<DefaultEngine>,
}

/// Open and start a recording stream on `engine`.
///
/// On failure the half-built session is dropped, which closes any opened
/// stream.
pub(crate) fn start_recording<E: AudioEngine>(engine: E) -> Result<StreamSession<E>, FfiError> {
    let mut session = StreamSession::with_noise(engine);
    session.open(StreamConfiguration::recording())?;
    session.start()?;
    Ok(session)
}

/// Create, open and start a recording session.
///
/// Returns null on failure; see `omic_last_error_message`. When `out_status`
/// is non-null it receives a status string to free with `omic_string_free`.
///
/// # Safety
/// `out_status` must be null or valid for a pointer-sized write.
#[no_mangle]
pub unsafe extern "C" fn omic_create_recording_session(
    out_status: *mut *mut c_char,
) -> *mut RecordingSession {
    match start_recording(DefaultEngine::default()) {
        Ok(session) => {
            log::info!("{}", CREATED_STATUS);
            if !out_status.is_null() {
                // SAFETY: caller guarantees a writable location.
                unsafe { *out_status = to_cstring(CREATED_STATUS) };
            }
            Box::into_raw(Box::new(RecordingSession { session }))
        }
        Err(e) => {
            report(e);
            ptr::null_mut()
        }
    }
}

/// Stop the stream. The session can be released afterwards.
///
/// # Safety
/// `handle` must be null or a live pointer from
/// `omic_create_recording_session`.
#[no_mangle]
pub unsafe extern "C" fn omic_stop_recording_session(handle: *mut RecordingSession) -> c_int {
    if handle.is_null() {
        return report(FfiError::NullPointer("recording session"));
    }
    // SAFETY: non-null and owned by the caller per the contract above.
    let recording = unsafe { &mut *handle };
    match recording.session.stop() {
        Ok(()) => OMIC_OK,
        Err(e) => report(e.into()),
    }
}

/// Stop if needed, close the stream and free the handle.
///
/// # Safety
/// `handle` must be null or a live pointer from
/// `omic_create_recording_session`; it is invalid afterwards.
#[no_mangle]
pub unsafe extern "C" fn omic_release_recording_session(handle: *mut RecordingSession) {
    if handle.is_null() {
        return;
    }
    // SAFETY: ownership returns to Rust exactly once per the contract above.
    let mut recording = unsafe { Box::from_raw(handle) };
    if let Err(e) = recording.session.close() {
        report(e.into());
    }
}
