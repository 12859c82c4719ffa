//! Guards over native-origin strings.
//!
//! A guard is the only holder of its allocation. Dropping it runs the release
//! operation matching the string's form, so the release happens exactly once
//! and after the last read. `into_raw` hands the allocation back out when the
//! caller wants to take over that obligation itself.

use std::ffi::CStr;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::os::raw::c_char;
use std::ptr::NonNull;
use std::slice;

use handoff_core::{Form, Origin};
use handoff_ffi::{handoff_free_cstring, handoff_free_raw_parts, HandoffRawParts};
use tracing::trace;

use crate::OwnedString;

//-----------------------------------------------------------------------------
// Null-Terminated Form
//-----------------------------------------------------------------------------

/// A null-terminated string allocated by the native side
pub struct NativeCString {
    ptr: NonNull<c_char>,
}

// The guard is the sole owner; the native allocator may free from any thread.
unsafe impl Send for NativeCString {}

impl NativeCString {
    /// Take ownership of a handle returned by a null-terminated export.
    ///
    /// Returns `None` for the null sentinel.
    ///
    /// # Safety
    ///
    /// `handle` must be null or a live handle from one of `handoff-ffi`'s
    /// null-terminated exports, and nothing else may release it.
    pub unsafe fn from_handle(handle: *mut c_char) -> Option<Self> {
        NonNull::new(handle).map(|ptr| Self { ptr })
    }

    /// Borrow the content as a `CStr`
    pub fn as_c_str(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    /// Give the handle back without releasing it.
    ///
    /// The caller becomes responsible for passing it to
    /// `handoff_free_cstring` exactly once.
    pub fn into_raw(self) -> *mut c_char {
        ManuallyDrop::new(self).ptr.as_ptr()
    }
}

impl Deref for NativeCString {
    type Target = CStr;

    fn deref(&self) -> &CStr {
        self.as_c_str()
    }
}

impl OwnedString for NativeCString {
    fn origin(&self) -> Origin {
        Origin::Native
    }

    fn form(&self) -> Form {
        Form::NullTerminated
    }

    fn as_bytes(&self) -> &[u8] {
        self.as_c_str().to_bytes()
    }
}

impl fmt::Debug for NativeCString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeCString")
            .field("content", &self.as_c_str())
            .finish()
    }
}

impl Drop for NativeCString {
    fn drop(&mut self) {
        trace!(release = Form::NullTerminated.release_operation(), "dropping native string");
        unsafe { handoff_free_cstring(self.ptr.as_ptr()) };
    }
}

//-----------------------------------------------------------------------------
// Raw-Parts Form
//-----------------------------------------------------------------------------

/// A string allocated by the native side and described by its raw parts
pub struct NativeRawParts {
    parts: HandoffRawParts,
}

// Same ownership story as NativeCString.
unsafe impl Send for NativeRawParts {}

impl NativeRawParts {
    /// Take ownership of parts returned by `handoff_string_to_raw_parts`.
    ///
    /// Returns `None` for the absent sentinel.
    ///
    /// # Safety
    ///
    /// `parts` must be exactly what the export returned, not yet released,
    /// and nothing else may release it.
    pub unsafe fn from_parts(parts: HandoffRawParts) -> Option<Self> {
        if parts.is_absent() {
            None
        } else {
            Some(Self { parts })
        }
    }

    /// Number of content bytes
    pub fn len(&self) -> usize {
        self.parts.len
    }

    /// Whether there are no content bytes
    pub fn is_empty(&self) -> bool {
        self.parts.len == 0
    }

    /// Size of the backing allocation
    pub fn capacity(&self) -> usize {
        self.parts.cap
    }

    /// Give the parts back without releasing them.
    ///
    /// The caller becomes responsible for passing them, unchanged, to
    /// `handoff_free_raw_parts` exactly once.
    pub fn into_raw_parts(self) -> HandoffRawParts {
        ManuallyDrop::new(self).parts
    }
}

impl OwnedString for NativeRawParts {
    fn origin(&self) -> Origin {
        Origin::Native
    }

    fn form(&self) -> Form {
        Form::RawParts
    }

    fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.parts.ptr, self.parts.len) }
    }
}

impl fmt::Debug for NativeRawParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeRawParts")
            .field("content", &String::from_utf8_lossy(self.as_bytes()))
            .field("len", &self.parts.len)
            .field("cap", &self.parts.cap)
            .finish()
    }
}

impl Drop for NativeRawParts {
    fn drop(&mut self) {
        trace!(release = Form::RawParts.release_operation(), "dropping native raw parts");
        unsafe { handoff_free_raw_parts(self.parts) };
    }
}
