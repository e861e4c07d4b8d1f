//! # omic-ffi
//!
//! C ABI over the omic recording and encoder sessions. See
//! `include/omic.h` for the matching declarations.
//!
//! Handles are boxed Rust values owned by the caller between create and
//! release. Failing calls return null or a negative status and record a
//! message readable through `omic_last_error_message`.

use std::os::raw::c_int;

pub mod encoder;
pub mod error;
pub mod recording;

pub use encoder::{omic_encoder_init, omic_encoder_init_default, omic_encoder_release, OmicEncoder};
pub use error::{
    omic_last_error_message, omic_string_free, FfiError, OMIC_ERR_ALLOCATION, OMIC_ERR_INIT,
    OMIC_ERR_INVALID_ARGUMENT, OMIC_ERR_NULL_POINTER, OMIC_ERR_STATE, OMIC_ERR_UNSUPPORTED,
    OMIC_OK,
};
pub use recording::{
    omic_create_recording_session, omic_release_recording_session, omic_stop_recording_session,
    RecordingSession,
};

/// Install the `env_logger` backend, filtered by `RUST_LOG` (default `info`).
///
/// Returns 0, or `OMIC_ERR_STATE` when a logger is already installed.
#[no_mangle]
pub extern "C" fn omic_init_logging() -> c_int {
    let env = env_logger::Env::default().default_filter_or("info");
    match env_logger::Builder::from_env(env).try_init() {
        Ok(()) => {
            log::debug!("omic logging initialized");
            OMIC_OK
        }
        Err(_) => OMIC_ERR_STATE,
    }
}
