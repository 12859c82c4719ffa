//! Ownership model for strings that cross the boundary.
//!
//! Every owned string has exactly one [`Origin`], fixed at allocation time.
//! The origin, not whoever currently holds the pointer, decides which side
//! may free it: a native-origin string goes back through the native release
//! operation that matches its [`Form`], a managed-origin string is freed by
//! the managed side and is only ever borrowed by native code.
//!
//! None of this is materialized on the wire. The managed-side wrapper and
//! the test-build audit use these types to track instances.

use std::fmt;

use crate::error::{HandoffError, HandoffResult};

/// Side of the boundary whose allocator produced a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Allocated by the Rust side, released through a `handoff_free_*` export
    Native,
    /// Allocated by the caller, borrowed by native code for one call
    Managed,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Native => write!(f, "native"),
            Origin::Managed => write!(f, "managed"),
        }
    }
}

/// In-memory shape of an owned string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    /// Bytes followed by a single terminating zero byte, addressed by one pointer
    NullTerminated,
    /// A `(pointer, length, capacity)` triple; may omit the terminator
    RawParts,
}

impl Form {
    /// Name of the export that releases native-origin strings of this form
    pub fn release_operation(self) -> &'static str {
        match self {
            Form::NullTerminated => "handoff_free_cstring",
            Form::RawParts => "handoff_free_raw_parts",
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::NullTerminated => write!(f, "null-terminated"),
            Form::RawParts => write!(f, "raw-parts"),
        }
    }
}

/// Lifecycle state of a single owned string instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Backing memory exists and is still held by the allocating side
    Allocated,
    /// Returned across the boundary; the receiver must release it exactly once
    HandedToCaller,
    /// Backing memory has been freed; no further operation is legal
    Released,
    /// Null handle or zero capacity: nothing was allocated, nothing to release
    Absent,
}

/// Events that move a [`Lifecycle`] forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The value is returned to the other side of the boundary
    HandOff,
    /// The matching release operation runs
    Release,
}

impl Lifecycle {
    /// Starting state for a freshly produced value
    pub fn initial(present: bool) -> Self {
        if present {
            Lifecycle::Allocated
        } else {
            Lifecycle::Absent
        }
    }

    /// Apply `event` to an instance of `form`, rejecting illegal transitions.
    ///
    /// Releasing an absent value is a no-op and stays [`Lifecycle::Absent`].
    /// Anything applied after [`Lifecycle::Released`] is a protocol violation.
    pub fn apply(self, form: Form, event: LifecycleEvent) -> HandoffResult<Lifecycle> {
        match (self, event) {
            (Lifecycle::Allocated, LifecycleEvent::HandOff) => Ok(Lifecycle::HandedToCaller),
            (Lifecycle::Allocated, LifecycleEvent::Release)
            | (Lifecycle::HandedToCaller, LifecycleEvent::Release) => Ok(Lifecycle::Released),
            (Lifecycle::Absent, _) => Ok(Lifecycle::Absent),
            (from, event) => Err(HandoffError::ProtocolViolation { form, from, event }),
        }
    }

    /// Whether the holder still owes a release call
    pub fn needs_release(self) -> bool {
        matches!(self, Lifecycle::Allocated | Lifecycle::HandedToCaller)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Allocated => write!(f, "allocated"),
            Lifecycle::HandedToCaller => write!(f, "handed to caller"),
            Lifecycle::Released => write!(f, "released"),
            Lifecycle::Absent => write!(f, "absent"),
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::HandOff => write!(f, "hand off"),
            LifecycleEvent::Release => write!(f, "release"),
        }
    }
}
