//! Configuration for the native side of the boundary
//!
//! Loaded from TOML. Every section and field is optional; missing values fall
//! back to the defaults below.
//!
//! ```toml
//! [transform]
//! max_output_bytes = 15
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HandoffError, HandoffResult};
use crate::logging::parse_filter;
use crate::transform::TransformPolicy;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandoffConfig {
    /// How string transforms shape their output
    pub transform: TransformPolicy,

    /// Tracing subscriber settings
    pub logging: LoggingConfig,
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "handoff_ffi=debug,warn".
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl HandoffConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> HandoffResult<Self> {
        let config: HandoffConfig =
            toml::from_str(source).map_err(|e| HandoffError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> HandoffResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| HandoffError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Check cross-field and range constraints
    pub fn validate(&self) -> HandoffResult<()> {
        self.transform.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(HandoffError::config("logging.level must not be empty"));
        }
        parse_filter(&self.logging.level)?;
        Ok(())
    }
}
