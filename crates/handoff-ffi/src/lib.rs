//! C ABI exports for the handoff boundary
//!
//! Strings cross this boundary in two forms, and the side that allocated a
//! buffer is the only side allowed to free it:
//!
//! * Inputs are allocated by the caller. Native code borrows them for the
//!   duration of one call and never frees them.
//! * Outputs are allocated here. The caller reads them and hands them back
//!   exactly once through the release operation matching their form:
//!   [`handoff_free_cstring`] for null-terminated handles,
//!   [`handoff_free_raw_parts`] for [`HandoffRawParts`].
//!
//! Failure never unwinds across the boundary. String operations return their
//! absent sentinel (a null handle, all-zero raw parts or view) for null
//! input, invalid UTF-8 or an exhausted allocator; the reason is logged.

#![warn(missing_docs)]
// FFI operations require unsafe code for pointer manipulation
#![allow(unsafe_code)]

pub mod audit;
pub mod c_interface;
pub mod marshal;
pub mod runtime;

pub use c_interface::*;
pub use marshal::{HandoffRawParts, HandoffStrView};

use handoff_core::HandoffError;

//-----------------------------------------------------------------------------
// Status Codes
//-----------------------------------------------------------------------------

/// Status codes returned by exports that produce no string
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandoffStatus {
    /// Operation succeeded
    Success = 0,
    /// A required input pointer was null
    NullInput = 1,
    /// Input bytes were not valid UTF-8
    InvalidUtf8 = 2,
    /// Output would contain a zero byte before its terminator
    InteriorNul = 3,
    /// Native allocator refused a buffer
    AllocationFailed = 4,
    /// Caller broke the ownership protocol
    ProtocolViolation = 5,
    /// Configuration could not be parsed or validated
    ConfigError = 6,
    /// Process configuration was already installed
    AlreadyInitialized = 7,
}

impl From<&HandoffError> for HandoffStatus {
    fn from(err: &HandoffError) -> Self {
        match err {
            HandoffError::NullInput => HandoffStatus::NullInput,
            HandoffError::InvalidUtf8(_) => HandoffStatus::InvalidUtf8,
            HandoffError::InteriorNul { .. } => HandoffStatus::InteriorNul,
            HandoffError::AllocationFailed(_) => HandoffStatus::AllocationFailed,
            HandoffError::ProtocolViolation { .. } | HandoffError::ForeignHandle { .. } => {
                HandoffStatus::ProtocolViolation
            }
            HandoffError::Config(_) => HandoffStatus::ConfigError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::Form;

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(HandoffStatus::Success as u32, 0);
        assert_eq!(HandoffStatus::NullInput as u32, 1);
        assert_eq!(HandoffStatus::InvalidUtf8 as u32, 2);
        assert_eq!(HandoffStatus::InteriorNul as u32, 3);
        assert_eq!(HandoffStatus::AllocationFailed as u32, 4);
        assert_eq!(HandoffStatus::ProtocolViolation as u32, 5);
        assert_eq!(HandoffStatus::ConfigError as u32, 6);
        assert_eq!(HandoffStatus::AlreadyInitialized as u32, 7);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(HandoffStatus::from(&HandoffError::NullInput), HandoffStatus::NullInput);
        assert_eq!(
            HandoffStatus::from(&HandoffError::ForeignHandle {
                form: Form::RawParts,
                address: 0x1000,
            }),
            HandoffStatus::ProtocolViolation
        );
        assert_eq!(
            HandoffStatus::from(&HandoffError::config("bad")),
            HandoffStatus::ConfigError
        );
    }
}
