//! Error taxonomy for the handoff boundary.
//!
//! Inside Rust every failure is a [`HandoffError`] propagated with `?`. The
//! export layer is the only place these are flattened into sentinels or
//! status codes.

use std::collections::TryReserveError;
use std::str::Utf8Error;

use thiserror::Error;

use crate::owned::{Form, Lifecycle, LifecycleEvent};

/// Result alias used throughout the workspace
pub type HandoffResult<T> = Result<T, HandoffError>;

/// Everything that can go wrong while preparing a value for the boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandoffError {
    /// The caller passed the null sentinel where content was expected
    #[error("null input handle")]
    NullInput,

    /// Input bytes were not valid UTF-8
    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    /// An output would carry a zero byte before its terminator
    #[error("zero byte at position {position} cannot cross as a C string")]
    InteriorNul {
        /// Byte offset of the first zero byte
        position: usize,
    },

    /// The native allocator refused the output buffer
    #[error("allocation failed: {0}")]
    AllocationFailed(#[from] TryReserveError),

    /// An owned string was driven through an illegal lifecycle transition
    #[error("protocol violation: cannot {event} a {form} string that is {from}")]
    ProtocolViolation {
        /// Form of the string the event was applied to
        form: Form,
        /// State the string was in
        from: Lifecycle,
        /// Event that was rejected
        event: LifecycleEvent,
    },

    /// A release named an address that is not an outstanding allocation of that form
    #[error("no outstanding {form} allocation at {address:#x}")]
    ForeignHandle {
        /// Form the release operation expected
        form: Form,
        /// Address passed to the release operation
        address: usize,
    },

    /// Configuration could not be read, parsed or validated
    #[error("configuration error: {0}")]
    Config(String),
}

impl HandoffError {
    /// Stable, machine readable identifier for log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            HandoffError::NullInput => "HANDOFF_NULL_INPUT",
            HandoffError::InvalidUtf8(_) => "HANDOFF_INVALID_UTF8",
            HandoffError::InteriorNul { .. } => "HANDOFF_INTERIOR_NUL",
            HandoffError::AllocationFailed(_) => "HANDOFF_ALLOCATION_FAILED",
            HandoffError::ProtocolViolation { .. } => "HANDOFF_PROTOCOL_VIOLATION",
            HandoffError::ForeignHandle { .. } => "HANDOFF_FOREIGN_HANDLE",
            HandoffError::Config(_) => "HANDOFF_CONFIG",
        }
    }

    /// Configuration error helper
    pub fn config(reason: impl Into<String>) -> Self {
        HandoffError::Config(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let bad_utf8 = std::str::from_utf8(&[0xff]).unwrap_err();
        let refused = Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err();
        let errors = vec![
            HandoffError::NullInput,
            HandoffError::InvalidUtf8(bad_utf8),
            HandoffError::InteriorNul { position: 3 },
            HandoffError::AllocationFailed(refused),
            HandoffError::ProtocolViolation {
                form: Form::RawParts,
                from: Lifecycle::Released,
                event: LifecycleEvent::Release,
            },
            HandoffError::ForeignHandle {
                form: Form::NullTerminated,
                address: 0x10,
            },
            HandoffError::config("missing"),
        ];

        let mut codes: Vec<_> = errors.iter().map(HandoffError::error_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_protocol_violation_message() {
        let err = HandoffError::ProtocolViolation {
            form: Form::NullTerminated,
            from: Lifecycle::Released,
            event: LifecycleEvent::Release,
        };
        assert_eq!(
            err.to_string(),
            "protocol violation: cannot release a null-terminated string that is released"
        );
    }
}
