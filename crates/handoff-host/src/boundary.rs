//! Safe calls into the exported operations.
//!
//! Inputs are borrowed `CStr`s owned by the caller (a [`ManagedCString`] or a
//! Rust `CString` both work); they stay owned by the caller across the call.
//! Outputs come back as guards, or `None` where the export returned its
//! absent sentinel.
//!
//! [`ManagedCString`]: crate::ManagedCString

use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_char;
use std::ptr;

use handoff_ffi::{
    handoff_describe_config, handoff_init, handoff_scalar_sum, handoff_str_to_str,
    handoff_str_to_string, handoff_str_view, handoff_string_to_raw_parts,
    handoff_string_to_string, handoff_version, HandoffStatus,
};

use crate::native::{NativeCString, NativeRawParts};

/// Sum three scalars without truncating any input width
pub fn scalar_sum(a: u8, b: u16, c: u32) -> usize {
    handoff_scalar_sum(a, b, c)
}

/// The null-terminated transform variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Borrowed input, newly allocated output
    StrToString,
    /// Input copied into a native `String` and consumed
    StringToString,
    /// Borrowed sub-slice copied at the boundary
    StrToStr,
}

impl Transform {
    /// Every variant, in export order
    pub const ALL: [Transform; 3] = [
        Transform::StrToString,
        Transform::StringToString,
        Transform::StrToStr,
    ];

    fn export(self) -> unsafe extern "C" fn(*const c_char) -> *mut c_char {
        match self {
            Transform::StrToString => handoff_str_to_string,
            Transform::StringToString => handoff_string_to_string,
            Transform::StrToStr => handoff_str_to_str,
        }
    }

    /// Run this variant on `input`
    pub fn apply(self, input: &CStr) -> Option<NativeCString> {
        unsafe { NativeCString::from_handle(self.export()(input.as_ptr())) }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::StrToString => write!(f, "str-to-string"),
            Transform::StringToString => write!(f, "string-to-string"),
            Transform::StrToStr => write!(f, "str-to-str"),
        }
    }
}

/// Borrowed input, newly allocated output
pub fn str_to_string(input: &CStr) -> Option<NativeCString> {
    Transform::StrToString.apply(input)
}

/// Input copied into a native `String` and consumed; newly allocated output
pub fn string_to_string(input: &CStr) -> Option<NativeCString> {
    Transform::StringToString.apply(input)
}

/// Borrowed sub-slice copied into a native allocation at the boundary
pub fn str_to_str(input: &CStr) -> Option<NativeCString> {
    Transform::StrToStr.apply(input)
}

/// Transformed output described by its raw parts
pub fn string_to_raw_parts(input: &CStr) -> Option<NativeRawParts> {
    unsafe { NativeRawParts::from_parts(handoff_string_to_raw_parts(input.as_ptr())) }
}

/// Transformed prefix of `input`, borrowed from `input` itself. Allocates nothing.
pub fn str_view(input: &CStr) -> Option<&str> {
    let view = unsafe { handoff_str_view(input.as_ptr()) };
    if view.is_absent() {
        return None;
    }
    let bytes = input.to_bytes().get(..view.len)?;
    std::str::from_utf8(bytes).ok()
}

/// Library version string
pub fn version() -> Option<NativeCString> {
    unsafe { NativeCString::from_handle(handoff_version()) }
}

/// Configuration in effect, as JSON
pub fn describe_config() -> Option<NativeCString> {
    unsafe { NativeCString::from_handle(handoff_describe_config()) }
}

/// Install the process configuration; `None` installs the defaults
pub fn init(config_toml: Option<&CStr>) -> HandoffStatus {
    let ptr = config_toml.map_or(ptr::null(), CStr::as_ptr);
    unsafe { handoff_init(ptr) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManagedCString, OwnedString};
    use handoff_core::Origin;

    #[test]
    fn test_transforms() {
        let long = ManagedCString::new("极客幼稚园是一个不错的微信公众号").unwrap();
        let short = ManagedCString::new("Datafuse Lab").unwrap();

        for transform in Transform::ALL {
            let out = transform.apply(&long).unwrap();
            assert_eq!(out.to_str().unwrap(), "极客幼稚园", "{}", transform);
            assert_eq!(out.origin(), Origin::Native);

            let out = transform.apply(&short).unwrap();
            assert_eq!(out.to_str().unwrap(), "Datafuse Lab", "{}", transform);
        }
    }

    #[test]
    fn test_invalid_utf8_is_none() {
        let bad = std::ffi::CString::new(vec![0xe6, 0x9e]).unwrap();
        for transform in Transform::ALL {
            assert!(transform.apply(&bad).is_none(), "{}", transform);
        }
        assert!(string_to_raw_parts(&bad).is_none());
        assert!(str_view(&bad).is_none());
    }

    #[test]
    fn test_view_borrows_input() {
        let input = ManagedCString::new("极客幼稚园是一个不错的微信公众号").unwrap();
        let view = str_view(&input).unwrap();
        assert_eq!(view, "极客幼稚园");
        assert_eq!(view.as_ptr(), input.as_ptr() as *const u8);
    }

    #[test]
    fn test_transform_names() {
        let names: Vec<String> = Transform::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["str-to-string", "string-to-string", "str-to-str"]);
    }
}
