//! Managed-origin strings: allocated by the caller, borrowed by native code.

use std::alloc::{handle_alloc_error, Layout};
use std::ffi::CStr;
use std::fmt;
use std::ops::Deref;
use std::os::raw::{c_char, c_void};
use std::ptr::{self, NonNull};

use handoff_core::{Form, HandoffError, HandoffResult, Origin};

use crate::OwnedString;

/// A null-terminated copy of a Rust string in memory from the C allocator.
///
/// This is what a foreign caller hands to native code: the buffer comes from
/// `malloc` and goes back through `free` when the value drops. Native code
/// only ever borrows it for the duration of a call.
pub struct ManagedCString {
    ptr: NonNull<c_char>,
    len: usize,
}

// The buffer is uniquely owned and never shared mutably.
unsafe impl Send for ManagedCString {}

impl ManagedCString {
    /// Copy `s` into a fresh `malloc` allocation and terminate it.
    ///
    /// Fails if `s` contains a zero byte. Aborts through
    /// [`handle_alloc_error`] if the C allocator is exhausted.
    pub fn new(s: &str) -> HandoffResult<Self> {
        if let Some(position) = s.bytes().position(|b| b == 0) {
            return Err(HandoffError::InteriorNul { position });
        }

        let size = s.len() + 1;
        let raw = unsafe { libc::malloc(size) } as *mut c_char;
        let ptr = NonNull::new(raw).unwrap_or_else(|| {
            handle_alloc_error(Layout::from_size_align(size, 1).unwrap_or(Layout::new::<u8>()))
        });

        unsafe {
            ptr::copy_nonoverlapping(s.as_ptr(), ptr.as_ptr() as *mut u8, s.len());
            *ptr.as_ptr().add(s.len()) = 0;
        }
        Ok(Self { ptr, len: s.len() })
    }

    /// Pointer to pass across the boundary
    pub fn as_ptr(&self) -> *const c_char {
        self.ptr.as_ptr()
    }

    /// Borrow as a `CStr`
    pub fn as_c_str(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    /// Length in bytes, excluding the terminator
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the string has no content
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Deref for ManagedCString {
    type Target = CStr;

    fn deref(&self) -> &CStr {
        self.as_c_str()
    }
}

impl OwnedString for ManagedCString {
    fn origin(&self) -> Origin {
        Origin::Managed
    }

    fn form(&self) -> Form {
        Form::NullTerminated
    }

    fn as_bytes(&self) -> &[u8] {
        self.as_c_str().to_bytes()
    }
}

impl fmt::Debug for ManagedCString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedCString")
            .field("content", &self.as_c_str())
            .finish()
    }
}

impl Drop for ManagedCString {
    fn drop(&mut self) {
        unsafe { libc::free(self.ptr.as_ptr() as *mut c_void) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_is_terminated() {
        let s = ManagedCString::new("Datafuse Lab").unwrap();
        assert_eq!(s.len(), 12);
        assert_eq!(s.as_c_str().to_bytes_with_nul(), b"Datafuse Lab\0");
        assert_eq!(s.to_str().unwrap(), "Datafuse Lab");
        assert_eq!(s.origin(), Origin::Managed);
    }

    #[test]
    fn test_empty() {
        let s = ManagedCString::new("").unwrap();
        assert!(s.is_empty());
        assert_eq!(s.as_c_str().to_bytes_with_nul(), b"\0");
    }

    #[test]
    fn test_interior_nul_is_rejected() {
        let err = ManagedCString::new("ab\0c").unwrap_err();
        assert_eq!(err, HandoffError::InteriorNul { position: 2 });
    }
}
