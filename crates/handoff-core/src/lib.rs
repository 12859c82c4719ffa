// Handoff Core Library
//
// Safe Rust half of the handoff boundary: the string transforms the exported
// functions wrap, the ownership model shared by both sides, and the ambient
// configuration and tracing setup.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for moving strings across a C ABI without losing track of
//! who owns the backing memory.

// Error Handling
// Error taxonomy for everything that can go wrong before a value crosses the boundary
pub mod error;

// Transforms
// The operations exported across the boundary, expressed over plain Rust strings
pub mod transform;

// Ownership Model
// Allocation origin, string form and the per-instance lifecycle state machine
pub mod owned;

// Configuration
pub mod config;

// Logging
pub mod logging;

pub use config::{HandoffConfig, LoggingConfig};
pub use error::{HandoffError, HandoffResult};
pub use owned::{Form, Lifecycle, LifecycleEvent, Origin};
pub use transform::{scalar_sum, TransformPolicy};
