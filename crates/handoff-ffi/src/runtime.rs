//! Process-wide configuration for the exported operations.
//!
//! Installed at most once through [`crate::handoff_init`] and read-only
//! afterwards, so every export stays reentrant. Until something is
//! installed the defaults apply.

use std::sync::OnceLock;

use handoff_core::logging::init_tracing;
use handoff_core::{HandoffConfig, TransformPolicy};
use tracing::{debug, info, warn};

use crate::HandoffStatus;

static CONFIG: OnceLock<HandoffConfig> = OnceLock::new();

/// Transform policy currently in effect
pub fn policy() -> TransformPolicy {
    CONFIG.get().map(|config| config.transform).unwrap_or_default()
}

/// Snapshot of the configuration currently in effect
pub fn current() -> HandoffConfig {
    CONFIG.get().cloned().unwrap_or_default()
}

/// Whether a configuration has been installed
pub fn is_initialized() -> bool {
    CONFIG.get().is_some()
}

/// Validate and install `config`, then bring up tracing.
///
/// An invalid configuration is never installed. Once the filter has
/// validated, `init_tracing` can only fail because a global subscriber
/// already exists; a host that installed its own keeps it.
pub fn install(config: HandoffConfig) -> HandoffStatus {
    if let Err(err) = config.validate() {
        warn!(code = err.error_code(), %err, "rejecting configuration");
        return HandoffStatus::from(&err);
    }

    let logging = config.logging.clone();
    if CONFIG.set(config).is_err() {
        return HandoffStatus::AlreadyInitialized;
    }

    if let Err(err) = init_tracing(&logging) {
        debug!(%err, "keeping the host's tracing subscriber");
    }
    info!(
        max_output_bytes = policy().max_output_bytes,
        "handoff configuration installed"
    );
    HandoffStatus::Success
}
