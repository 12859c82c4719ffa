//! C-compatible exports for the handoff boundary
//!
//! Ownership rules for every export in this module:
//!
//! * String inputs are allocated by the caller and only borrowed here.
//! * String outputs are allocated here and must be released exactly once by
//!   the release operation matching their form.
//! * A null input, an input that is not UTF-8, or an exhausted allocator
//!   yields the output's absent sentinel. Nothing panics across the boundary.

use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use handoff_core::transform::try_copy;
use handoff_core::{scalar_sum, Form, HandoffResult};
use tracing::{debug, error, warn};

use crate::audit;
use crate::marshal::{
    borrow_input, cstring_from_str, hand_off_cstring, into_cstring, HandoffRawParts,
    HandoffStrView,
};
use crate::runtime;
use crate::HandoffStatus;

//-----------------------------------------------------------------------------
// Scalar Pass-Through
//-----------------------------------------------------------------------------

/// Sum three scalars of different widths.
///
/// No input width is truncated. Where the sum cannot fit a `uintptr_t`
/// (32-bit targets only) the result saturates at its maximum value.
#[no_mangle]
pub extern "C" fn handoff_scalar_sum(a: u8, b: u16, c: u32) -> usize {
    scalar_sum(a, b, c)
}

//-----------------------------------------------------------------------------
// Null-Terminated String Transforms
//-----------------------------------------------------------------------------

fn export_cstring(op: &'static str, result: HandoffResult<CString>) -> *mut c_char {
    match result {
        Ok(c) => hand_off_cstring(c),
        Err(err) => {
            warn!(op, code = err.error_code(), %err, "returning null handle");
            ptr::null_mut()
        }
    }
}

/// Borrowed input, newly allocated output.
///
/// Returns the configured prefix of `s` as a native-origin string (caller
/// must free with `handoff_free_cstring`), or null.
///
/// # Safety
///
/// `s` must be null or a null-terminated buffer that stays valid for the
/// duration of the call.
#[no_mangle]
pub unsafe extern "C" fn handoff_str_to_string(s: *const c_char) -> *mut c_char {
    let result = borrow_input(s)
        .and_then(|input| runtime::policy().truncate_to_owned(input, 1))
        .and_then(into_cstring);
    export_cstring("str_to_string", result)
}

/// Owned input, newly allocated output.
///
/// The input is first copied into a native-owned `String`, which the
/// transform then consumes; the output reuses that allocation. The caller
/// still owns and frees its own input. Free the result with
/// `handoff_free_cstring`.
///
/// # Safety
///
/// `s` must be null or a null-terminated buffer that stays valid for the
/// duration of the call.
#[no_mangle]
pub unsafe extern "C" fn handoff_string_to_string(s: *const c_char) -> *mut c_char {
    let result = borrow_input(s)
        .and_then(|input| try_copy(input, 1))
        .map(|owned| runtime::policy().truncate_string(owned))
        .and_then(into_cstring);
    export_cstring("string_to_string", result)
}

/// Borrowed input, borrowed output, copied at the boundary.
///
/// The transform itself returns a sub-slice of the input, but a sub-slice
/// carries no terminator, so it is copied into a native-origin string that
/// must be freed with `handoff_free_cstring`.
///
/// # Safety
///
/// `s` must be null or a null-terminated buffer that stays valid for the
/// duration of the call.
#[no_mangle]
pub unsafe extern "C" fn handoff_str_to_str(s: *const c_char) -> *mut c_char {
    let result = borrow_input(s)
        .map(|input| runtime::policy().truncate_str(input))
        .and_then(cstring_from_str);
    export_cstring("str_to_str", result)
}

//-----------------------------------------------------------------------------
// Raw-Parts Transform
//-----------------------------------------------------------------------------

/// Owned input, output described by its raw parts.
///
/// The returned bytes are not null-terminated; read exactly `len` of them.
/// Free with `handoff_free_raw_parts`, passing the value back unchanged.
/// Failure returns all-zero parts, which need no release.
///
/// # Safety
///
/// `s` must be null or a null-terminated buffer that stays valid for the
/// duration of the call.
#[no_mangle]
pub unsafe extern "C" fn handoff_string_to_raw_parts(s: *const c_char) -> HandoffRawParts {
    let result = borrow_input(s)
        .and_then(|input| try_copy(input, 1))
        .map(|owned| runtime::policy().truncate_string(owned));

    match result {
        Ok(owned) => HandoffRawParts::hand_off(owned),
        Err(err) => {
            warn!(op = "string_to_raw_parts", code = err.error_code(), %err, "returning absent raw parts");
            HandoffRawParts::absent()
        }
    }
}

//-----------------------------------------------------------------------------
// Zero-Copy View
//-----------------------------------------------------------------------------

/// Borrowed input, view into the same buffer. Allocates nothing.
///
/// The returned pointer is `s` itself and `len` is the length of the
/// configured prefix. The memory stays owned by the caller: release nothing,
/// and stop using the view once the input is freed.
///
/// # Safety
///
/// `s` must be null or a null-terminated buffer that stays valid for the
/// duration of the call and for as long as the view is read.
#[no_mangle]
pub unsafe extern "C" fn handoff_str_view(s: *const c_char) -> HandoffStrView {
    match borrow_input(s) {
        Ok(input) => HandoffStrView {
            ptr: s,
            len: runtime::policy().prefix_len(input),
        },
        Err(err) => {
            warn!(op = "str_view", code = err.error_code(), %err, "returning absent view");
            HandoffStrView::absent()
        }
    }
}

//-----------------------------------------------------------------------------
// Release Operations
//-----------------------------------------------------------------------------

/// Free a null-terminated string returned by this library.
///
/// Null is a no-op.
///
/// # Safety
///
/// `s` must be null or a handle returned by one of this library's
/// null-terminated exports that has not been freed yet. Releasing a handle
/// twice, or one allocated elsewhere, is undefined behavior.
#[no_mangle]
pub unsafe extern "C" fn handoff_free_cstring(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    if let Err(err) = audit::release(s as usize, Form::NullTerminated) {
        error!(code = err.error_code(), %err, "refusing to free null-terminated string");
        return;
    }
    drop(CString::from_raw(s));
    debug!("released null-terminated string");
}

/// Free a raw-parts string returned by `handoff_string_to_raw_parts`.
///
/// All-zero parts are a no-op.
///
/// # Safety
///
/// `parts` must be exactly the value returned by
/// `handoff_string_to_raw_parts`, not freed before. Altered `len` or `cap`
/// values are undefined behavior.
#[no_mangle]
pub unsafe extern "C" fn handoff_free_raw_parts(parts: HandoffRawParts) {
    if parts.is_absent() {
        return;
    }
    if let Err(err) = audit::release(parts.ptr as usize, Form::RawParts) {
        error!(code = err.error_code(), %err, "refusing to free raw-parts string");
        return;
    }
    drop(parts.reclaim());
    debug!(len = parts.len, cap = parts.cap, "released raw-parts string");
}

//-----------------------------------------------------------------------------
// Utility Functions
//-----------------------------------------------------------------------------

/// Get the library version string (caller must free with `handoff_free_cstring`)
#[no_mangle]
pub extern "C" fn handoff_version() -> *mut c_char {
    let version = format!("handoff-ffi v{}", env!("CARGO_PKG_VERSION"));
    export_cstring("version", cstring_from_str(&version))
}

/// Get the configuration in effect as JSON (caller must free with `handoff_free_cstring`)
#[no_mangle]
pub extern "C" fn handoff_describe_config() -> *mut c_char {
    let result = serde_json::to_string(&runtime::current())
        .map_err(|e| handoff_core::HandoffError::config(e.to_string()))
        .and_then(|json| cstring_from_str(&json));
    export_cstring("describe_config", result)
}

/// Install the process configuration from a TOML document and set up tracing.
///
/// Null installs the defaults. Succeeds at most once per process; later calls
/// return `AlreadyInitialized` and leave the first configuration in place.
///
/// # Safety
///
/// `config_toml` must be null or a null-terminated buffer that stays valid
/// for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn handoff_init(config_toml: *const c_char) -> HandoffStatus {
    let config = if config_toml.is_null() {
        Ok(handoff_core::HandoffConfig::default())
    } else {
        borrow_input(config_toml).and_then(handoff_core::HandoffConfig::from_toml_str)
    };

    match config {
        Ok(config) => runtime::install(config),
        Err(err) => {
            warn!(code = err.error_code(), %err, "rejecting configuration");
            HandoffStatus::from(&err)
        }
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------
