//! Conversions between Rust strings and the boundary's in-memory layouts.
//!
//! Every allocation that leaves through this module is reserved fallibly, so
//! allocator exhaustion becomes [`HandoffError::AllocationFailed`] and, at
//! the export layer, an absent sentinel.

use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::os::raw::c_char;
use std::ptr;

use handoff_core::transform::try_copy;
use handoff_core::{Form, HandoffError, HandoffResult};
use tracing::debug;

use crate::audit;

/// A native-origin string described by its raw parts.
///
/// `len <= cap`, and `ptr` is valid for `cap` bytes when `cap > 0`. The bytes
/// are not null-terminated. A null `ptr` with zero `len` and `cap` is the
/// absent sentinel and needs no release. Anything else must go back through
/// [`crate::handoff_free_raw_parts`] with all three fields unchanged.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffRawParts {
    /// Start of the allocation
    pub ptr: *mut u8,
    /// Number of initialized bytes
    pub len: usize,
    /// Size of the allocation in bytes
    pub cap: usize,
}

impl HandoffRawParts {
    /// The absent sentinel
    pub const fn absent() -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
            cap: 0,
        }
    }

    /// Whether this value describes no allocation
    pub fn is_absent(&self) -> bool {
        self.ptr.is_null() || self.cap == 0
    }

    /// Give up ownership of `s` and describe it by its parts.
    ///
    /// The allocation is recorded as handed to the caller.
    pub fn hand_off(s: String) -> Self {
        if s.capacity() == 0 {
            return Self::absent();
        }
        let mut s = ManuallyDrop::new(s);
        let parts = Self {
            ptr: s.as_mut_ptr(),
            len: s.len(),
            cap: s.capacity(),
        };
        audit::record(parts.ptr as usize, Form::RawParts);
        debug!(len = parts.len, cap = parts.cap, "handing off raw-parts string");
        parts
    }

    /// Rebuild the `String` these parts describe.
    ///
    /// # Safety
    ///
    /// The parts must come unchanged from [`HandoffRawParts::hand_off`] and
    /// must not have been reclaimed before.
    pub(crate) unsafe fn reclaim(self) -> String {
        String::from_raw_parts(self.ptr, self.len, self.cap)
    }
}

/// A window into a caller-owned buffer.
///
/// Produced without allocating. The memory belongs to the caller: it stays
/// valid only while the caller's input does, and nothing is released here.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffStrView {
    /// Start of the viewed bytes, inside the caller's input
    pub ptr: *const c_char,
    /// Number of bytes in the view; `ptr[len]` is not necessarily zero
    pub len: usize,
}

impl HandoffStrView {
    /// The absent sentinel
    pub const fn absent() -> Self {
        Self {
            ptr: ptr::null(),
            len: 0,
        }
    }

    /// Whether this value views nothing
    pub fn is_absent(&self) -> bool {
        self.ptr.is_null()
    }
}

/// Borrow a caller-owned null-terminated input as `&str`.
///
/// # Safety
///
/// `s` must be null or point to a null-terminated buffer that stays alive
/// and unmodified for `'a`.
pub unsafe fn borrow_input<'a>(s: *const c_char) -> HandoffResult<&'a str> {
    if s.is_null() {
        return Err(HandoffError::NullInput);
    }
    // Walks to the terminator, then validates; no copy is made.
    Ok(CStr::from_ptr(s).to_str()?)
}

/// Turn a native `String` into a C string, appending the terminator in place.
///
/// Room for the terminator is reserved fallibly. A `CString` owns an
/// exact-fit buffer, so when `s` carries spare capacity (a truncated owned
/// input) the conversion shrinks the allocation in place. Shrinking never
/// asks for more memory, but it goes through the infallible `realloc` path:
/// an allocator that refuses even that aborts the process, as it would for
/// any Rust allocation.
pub fn into_cstring(s: String) -> HandoffResult<CString> {
    let mut bytes = s.into_bytes();
    bytes.try_reserve_exact(1)?;
    CString::new(bytes).map_err(|e| HandoffError::InteriorNul {
        position: e.nul_position(),
    })
}

/// Copy `s` into a fresh native C string
pub fn cstring_from_str(s: &str) -> HandoffResult<CString> {
    into_cstring(try_copy(s, 1)?)
}

/// Give up ownership of `c` as a raw handle, recorded as handed to the caller
pub fn hand_off_cstring(c: CString) -> *mut c_char {
    let len = c.as_bytes().len();
    let raw = c.into_raw();
    audit::record(raw as usize, Form::NullTerminated);
    debug!(len, "handing off null-terminated string");
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrow_input() {
        let owned = CString::new("Datafuse Lab").unwrap();
        let borrowed = unsafe { borrow_input(owned.as_ptr()) }.unwrap();
        assert_eq!(borrowed, "Datafuse Lab");
        assert_eq!(borrowed.as_ptr(), owned.as_ptr() as *const u8);
    }

    #[test]
    fn test_borrow_input_rejects_null_and_bad_utf8() {
        let err = unsafe { borrow_input(ptr::null()) }.unwrap_err();
        assert_eq!(err, HandoffError::NullInput);

        let bad = CString::new(vec![0x66, 0xff, 0x6f]).unwrap();
        let err = unsafe { borrow_input(bad.as_ptr()) }.unwrap_err();
        assert_eq!(err.error_code(), "HANDOFF_INVALID_UTF8");
    }

    #[test]
    fn test_into_cstring_rejects_interior_nul() {
        let err = into_cstring(String::from("ab\0cd")).unwrap_err();
        assert_eq!(err, HandoffError::InteriorNul { position: 2 });
    }

    #[test]
    fn test_into_cstring_does_not_reallocate_with_spare_byte() {
        let s = try_copy("hello", 1).unwrap();
        let ptr = s.as_ptr();
        let c = into_cstring(s).unwrap();
        assert_eq!(c.as_ptr() as *const u8, ptr);
        assert_eq!(c.as_bytes_with_nul(), b"hello\0");
    }

    #[test]
    fn test_into_cstring_fits_truncated_buffer() {
        let mut s = try_copy("极客幼稚园是一个不错的微信公众号", 1).unwrap();
        s.truncate("极客幼稚园".len());
        assert!(s.capacity() > s.len() + 1);

        let c = into_cstring(s).unwrap();
        assert_eq!(c.as_bytes_with_nul(), "极客幼稚园\0".as_bytes());

        // Round trip through the raw handle; the freed layout must match.
        let raw = c.into_raw();
        let back = unsafe { CString::from_raw(raw) };
        assert_eq!(back.to_str().unwrap(), "极客幼稚园");
    }

    #[test]
    fn test_raw_parts_of_unallocated_string_are_absent() {
        let parts = HandoffRawParts::hand_off(String::new());
        assert!(parts.is_absent());
        assert_eq!(parts, HandoffRawParts::absent());
    }

    #[test]
    fn test_raw_parts_hand_off_and_reclaim() {
        let _serial = crate::audit::serial();
        let parts = HandoffRawParts::hand_off(try_copy("hello", 1).unwrap());
        assert!(!parts.is_absent());
        assert_eq!(parts.len, 5);
        assert!(parts.len <= parts.cap);

        crate::audit::release(parts.ptr as usize, Form::RawParts).unwrap();
        let back = unsafe { parts.reclaim() };
        assert_eq!(back, "hello");
    }
}
