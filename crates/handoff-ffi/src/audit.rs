//! Ownership audit for test builds.
//!
//! Release builds trust the caller: a double release, a foreign handle or
//! mismatched raw parts is undefined behavior and nothing here runs. With
//! `cfg(test)` or the `audit` feature, every handed-off allocation is
//! tracked by address, and a release that does not match an outstanding
//! allocation of the same form is refused instead of corrupting the heap.

#[cfg(not(any(test, feature = "audit")))]
use handoff_core::{Form, HandoffResult};

#[cfg(any(test, feature = "audit"))]
mod registry {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Mutex, MutexGuard, OnceLock};

    use handoff_core::{Form, HandoffError, HandoffResult, Lifecycle, LifecycleEvent};

    /// Released addresses remembered for double-release diagnostics.
    ///
    /// Older entries are forgotten; releasing one again is still refused,
    /// as a foreign handle instead of a double release.
    pub(crate) const RELEASED_HISTORY: usize = 256;

    #[derive(Default)]
    struct Ledger {
        entries: HashMap<usize, (Form, Lifecycle)>,
        released: VecDeque<usize>,
    }

    impl Ledger {
        fn forget_oldest_released(&mut self) {
            while self.released.len() > RELEASED_HISTORY {
                let Some(address) = self.released.pop_front() else {
                    break;
                };
                // The address may have been handed off again since.
                if matches!(self.entries.get(&address), Some((_, Lifecycle::Released))) {
                    self.entries.remove(&address);
                }
            }
        }
    }

    static LEDGER: OnceLock<Mutex<Ledger>> = OnceLock::new();

    fn ledger() -> MutexGuard<'static, Ledger> {
        LEDGER
            .get_or_init(|| Mutex::new(Ledger::default()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record that the allocation at `address` was handed to the caller
    pub fn record(address: usize, form: Form) {
        let handed = Lifecycle::initial(true)
            .apply(form, LifecycleEvent::HandOff)
            .unwrap_or(Lifecycle::HandedToCaller);
        // The allocator may reuse the address of a released string.
        ledger().entries.insert(address, (form, handed));
    }

    /// Check that `address` may be released as `form`, and mark it released
    pub fn release(address: usize, form: Form) -> HandoffResult<()> {
        let mut ledger = ledger();
        match ledger.entries.get_mut(&address) {
            Some((recorded, state)) if *recorded == form => {
                *state = state.apply(form, LifecycleEvent::Release)?;
            }
            _ => return Err(HandoffError::ForeignHandle { form, address }),
        }
        ledger.released.push_back(address);
        ledger.forget_oldest_released();
        Ok(())
    }

    /// Number of handed-off allocations still awaiting release
    pub fn outstanding() -> usize {
        ledger()
            .entries
            .values()
            .filter(|(_, state)| state.needs_release())
            .count()
    }

    #[cfg(test)]
    pub(crate) fn released_tracked() -> usize {
        ledger()
            .entries
            .values()
            .filter(|(_, state)| *state == Lifecycle::Released)
            .count()
    }
}

/// Serializes unit tests that hand off real allocations.
///
/// A released address can be handed off again right away, so a test that
/// inspects the ledger after a release must not race another test's
/// hand-off.
#[cfg(test)]
pub(crate) fn serial() -> std::sync::MutexGuard<'static, ()> {
    static SERIAL: std::sync::Mutex<()> = std::sync::Mutex::new(());
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(any(test, feature = "audit"))]
pub use registry::{outstanding, record, release};

/// Record that the allocation at `address` was handed to the caller
#[cfg(not(any(test, feature = "audit")))]
#[inline]
pub fn record(_address: usize, _form: Form) {}

/// Check that `address` may be released as `form`, and mark it released
#[cfg(not(any(test, feature = "audit")))]
#[inline]
pub fn release(_address: usize, _form: Form) -> HandoffResult<()> {
    Ok(())
}

/// Number of handed-off allocations still awaiting release; always zero
/// without the audit
#[cfg(not(any(test, feature = "audit")))]
#[inline]
pub fn outstanding() -> usize {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::{Form, HandoffError};

    // Addresses below the first page are never handed out by an allocator,
    // so these cannot collide with real allocations.
    #[test]
    fn test_release_once() {
        let _serial = serial();
        record(0x10, Form::NullTerminated);
        assert!(release(0x10, Form::NullTerminated).is_ok());
    }

    #[test]
    fn test_double_release_is_refused() {
        let _serial = serial();
        record(0x20, Form::RawParts);
        release(0x20, Form::RawParts).unwrap();

        let err = release(0x20, Form::RawParts).unwrap_err();
        assert_eq!(err.error_code(), "HANDOFF_PROTOCOL_VIOLATION");
    }

    #[test]
    fn test_foreign_and_mismatched_releases_are_refused() {
        let _serial = serial();
        let err = release(0x30, Form::NullTerminated).unwrap_err();
        assert_eq!(
            err,
            HandoffError::ForeignHandle {
                form: Form::NullTerminated,
                address: 0x30,
            }
        );

        record(0x40, Form::RawParts);
        assert!(release(0x40, Form::NullTerminated).is_err());
        assert!(release(0x40, Form::RawParts).is_ok());
    }

    #[test]
    fn test_outstanding_counts_unreleased() {
        let _serial = serial();
        let baseline = outstanding();
        record(0x50, Form::NullTerminated);
        record(0x58, Form::RawParts);
        assert_eq!(outstanding(), baseline + 2);

        release(0x50, Form::NullTerminated).unwrap();
        release(0x58, Form::RawParts).unwrap();
        assert_eq!(outstanding(), baseline);
    }

    #[test]
    fn test_released_history_is_bounded() {
        let _serial = serial();
        let addresses: Vec<usize> = (0..2 * registry::RELEASED_HISTORY)
            .map(|i| 0x1000 + i * 8)
            .collect();
        for &address in &addresses {
            record(address, Form::NullTerminated);
            release(address, Form::NullTerminated).unwrap();
        }
        assert!(registry::released_tracked() <= registry::RELEASED_HISTORY);

        // Recent releases are still recognized as double releases.
        let newest = addresses[addresses.len() - 1];
        let err = release(newest, Form::NullTerminated).unwrap_err();
        assert_eq!(err.error_code(), "HANDOFF_PROTOCOL_VIOLATION");

        // Forgotten ones are still refused, as foreign handles.
        let err = release(addresses[0], Form::NullTerminated).unwrap_err();
        assert_eq!(err.error_code(), "HANDOFF_FOREIGN_HANDLE");
    }
}
