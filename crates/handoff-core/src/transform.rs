//! The operations exported across the boundary, expressed over plain Rust types.
//!
//! Each string transform keeps the longest prefix of its input that fits in
//! [`TransformPolicy::max_output_bytes`] and ends on a character boundary.
//! Inputs within the limit come back unchanged. The variants differ only in
//! how they borrow or consume their input, which is what the export layer
//! needs to demonstrate each ownership shape.

use serde::{Deserialize, Serialize};

use crate::error::{HandoffError, HandoffResult};

/// Byte limit applied when no configuration overrides it
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 15;

/// Add three scalars of different widths without truncating any of them.
///
/// The sum of the maximum inputs exceeds `u32::MAX`, so on targets with a
/// 32-bit `usize` an overflowing result saturates at `usize::MAX`.
pub fn scalar_sum(a: u8, b: u16, c: u32) -> usize {
    let sum = u64::from(a) + u64::from(b) + u64::from(c);
    usize::try_from(sum).unwrap_or(usize::MAX)
}

/// Copy `s` into a new native `String` with room for `spare` more bytes.
///
/// The reservation is fallible so an exhausted allocator surfaces as
/// [`HandoffError::AllocationFailed`] instead of aborting the process.
pub fn try_copy(s: &str, spare: usize) -> HandoffResult<String> {
    let mut out = String::new();
    out.try_reserve_exact(s.len().saturating_add(spare))?;
    out.push_str(s);
    Ok(out)
}

/// How string transforms shape their output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformPolicy {
    /// Maximum number of bytes an output may carry, excluding any terminator
    pub max_output_bytes: usize,
}

impl Default for TransformPolicy {
    fn default() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl TransformPolicy {
    /// Create a policy with the given byte limit
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }

    /// Reject limits that would make every output empty
    pub fn validate(&self) -> HandoffResult<()> {
        if self.max_output_bytes == 0 {
            return Err(HandoffError::config("transform.max_output_bytes must be at least 1"));
        }
        Ok(())
    }

    /// Length in bytes of the prefix of `s` this policy keeps
    pub fn prefix_len(&self, s: &str) -> usize {
        if s.len() <= self.max_output_bytes {
            return s.len();
        }
        // Index 0 is always a boundary, so the search cannot come up empty.
        (0..=self.max_output_bytes)
            .rev()
            .find(|&idx| s.is_char_boundary(idx))
            .unwrap_or(0)
    }

    /// Borrowed input, borrowed output. Never allocates.
    pub fn truncate_str<'a>(&self, s: &'a str) -> &'a str {
        &s[..self.prefix_len(s)]
    }

    /// Borrowed input, newly allocated output.
    ///
    /// `spare` extra bytes are reserved up front, e.g. for a terminator the
    /// caller appends later without reallocating.
    pub fn truncate_to_owned(&self, s: &str, spare: usize) -> HandoffResult<String> {
        try_copy(self.truncate_str(s), spare)
    }

    /// Owned input, owned output.
    ///
    /// Truncation happens in place, so the returned `String` keeps the
    /// input's allocation and capacity.
    pub fn truncate_string(&self, mut s: String) -> String {
        let keep = self.prefix_len(&s);
        s.truncate(keep);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LONG_CJK: &str = "极客幼稚园是一个不错的微信公众号";

    #[test]
    fn test_scalar_sum() {
        assert_eq!(scalar_sum(7, 300, 70_000), 70_307);
        assert_eq!(scalar_sum(123, 1234, 1_234_567), 1_235_924);
        assert_eq!(scalar_sum(0, 0, 0), 0);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_scalar_sum_keeps_every_width() {
        let expected = u8::MAX as usize + u16::MAX as usize + u32::MAX as usize;
        assert_eq!(scalar_sum(u8::MAX, u16::MAX, u32::MAX), expected);
    }

    #[test]
    fn test_short_input_is_echoed() {
        let policy = TransformPolicy::default();
        assert_eq!(policy.truncate_str("hello"), "hello");
        assert_eq!(policy.truncate_str("Datafuse Lab"), "Datafuse Lab");
        assert_eq!(policy.truncate_str(""), "");
    }

    #[test]
    fn test_long_input_is_cut_at_limit() {
        let policy = TransformPolicy::default();
        assert_eq!(policy.truncate_str(LONG_CJK), "极客幼稚园");
        assert_eq!(policy.truncate_str("abcdefghijklmnopqrstuvwxyz"), "abcdefghijklmno");
    }

    #[test]
    fn test_cut_never_splits_a_character() {
        // 'é' is two bytes; a limit of 4 lands in the middle of the third one.
        let policy = TransformPolicy::new(4);
        assert_eq!(policy.truncate_str("éééé"), "éé");

        let policy = TransformPolicy::new(1);
        assert_eq!(policy.truncate_str("极"), "");
    }

    #[test]
    fn test_truncate_string_reuses_allocation() {
        let policy = TransformPolicy::default();
        let input = String::from(LONG_CJK);
        let ptr = input.as_ptr();
        let cap = input.capacity();

        let out = policy.truncate_string(input);
        assert_eq!(out, "极客幼稚园");
        assert_eq!(out.as_ptr(), ptr);
        assert_eq!(out.capacity(), cap);
    }

    #[test]
    fn test_try_copy_reserves_spare() {
        let copied = try_copy("hello", 1).unwrap();
        assert_eq!(copied, "hello");
        assert!(copied.capacity() >= 6);
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        assert!(TransformPolicy::new(0).validate().is_err());
        assert!(TransformPolicy::default().validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_variants_agree(s in "\\PC{0,40}", limit in 1usize..40) {
            let policy = TransformPolicy::new(limit);
            let borrowed = policy.truncate_str(&s);

            prop_assert!(borrowed.len() <= limit);
            prop_assert!(s.starts_with(borrowed));
            prop_assert_eq!(policy.truncate_to_owned(&s, 1).unwrap(), borrowed);
            prop_assert_eq!(policy.truncate_string(s.clone()), borrowed);
        }

        #[test]
        fn prop_within_limit_is_identity(s in "[a-zA-Z0-9 ]{0,15}") {
            let policy = TransformPolicy::default();
            prop_assert_eq!(policy.truncate_str(&s), s.as_str());
        }

        #[test]
        fn prop_scalar_sum_is_exact(a: u8, b: u16, c: u32) {
            let expected = u64::from(a) + u64::from(b) + u64::from(c);
            prop_assert_eq!(scalar_sum(a, b, c) as u64, expected);
        }
    }
}
