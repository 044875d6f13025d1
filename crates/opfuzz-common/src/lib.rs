//! Common types and utilities shared by every opfuzz harness
//!
//! This crate provides the error taxonomy used to classify harness outcomes,
//! the verdict returned to the fuzzing driver, process-level configuration,
//! logging set-up, the progress counter and the artifact sink for inputs that
//! triggered unexpected failures or reference divergences.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod types;

pub use artifacts::{ArtifactKind, ArtifactRecord, ArtifactSink};
pub use config::{ConfigError, HarnessConfig, PanicPolicy};
pub use error::*;
pub use types::*;
