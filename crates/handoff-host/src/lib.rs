//! Managed-side wrapper over the handoff C ABI
//!
//! This crate plays the caller's role. It allocates inputs with the C
//! allocator, calls the exports, and turns every native-origin result into a
//! guard that runs the matching release operation exactly once when dropped.
//! Absent sentinels come back as `None`.

#![warn(missing_docs)]
#![allow(unsafe_code)]

pub mod boundary;
pub mod managed;
pub mod native;

pub use boundary::Transform;
pub use handoff_ffi::HandoffStatus;
pub use managed::ManagedCString;
pub use native::{NativeCString, NativeRawParts};

use handoff_core::{Form, Origin};

/// A string whose backing memory is owned by exactly one side of the boundary
pub trait OwnedString {
    /// Side whose allocator produced the bytes, and the only side that may free them
    fn origin(&self) -> Origin;

    /// Layout of the bytes in memory
    fn form(&self) -> Form;

    /// Content without any terminator
    fn as_bytes(&self) -> &[u8];

    /// Content as UTF-8
    fn to_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }
}
