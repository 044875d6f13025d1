//! Error taxonomy for harness runs
//!
//! Every failure a harness can observe falls into exactly one of two kinds:
//! an [`ExpectedFailure`] (the framework rejected the decoded arguments, or
//! the decoded shape was over budget) or an [`UnexpectedFailure`] (a panic
//! escaped, or an enforced output check did not hold). The entry point
//! dispatches on [`HarnessError::kind`] instead of on concrete error types.

use thiserror::Error;

use crate::types::{FailureKind, Verdict};

/// Top-level error returned by `OperatorHarness::run`.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("expected operation failure: {0}")]
    Expected(#[from] ExpectedFailure),

    #[error("unexpected failure: {0}")]
    Unexpected(#[from] UnexpectedFailure),
}

/// Failures that are a normal outcome of fuzzing an operator.
#[derive(Error, Debug)]
pub enum ExpectedFailure {
    #[error("framework rejected operation: {0}")]
    Framework(#[from] candle_core::Error),

    #[error("decoded shape has {count} elements, budget is {limit}")]
    ElementBudget { count: usize, limit: usize },

    #[error("invalid operator configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Failures that indicate a potential finding.
#[derive(Error, Debug)]
pub enum UnexpectedFailure {
    #[error("panic escaped from {op}: {message}")]
    Panic { op: &'static str, message: String },

    #[error("{op} output check failed: {detail}")]
    OutputMismatch { op: &'static str, detail: String },

    #[error("internal harness error in {op}: {reason}")]
    Internal { op: &'static str, reason: String },
}

impl From<candle_core::Error> for HarnessError {
    fn from(err: candle_core::Error) -> Self {
        HarnessError::Expected(ExpectedFailure::Framework(err))
    }
}

impl HarnessError {
    /// Shorthand for an expected failure caused by an invalid configuration.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        ExpectedFailure::InvalidConfig { reason: reason.into() }.into()
    }

    /// Shorthand for an enforced output check that did not hold.
    pub fn output_mismatch(op: &'static str, detail: impl Into<String>) -> Self {
        UnexpectedFailure::OutputMismatch { op, detail: detail.into() }.into()
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            HarnessError::Expected(_) => FailureKind::ExpectedOperationFailure,
            HarnessError::Unexpected(_) => FailureKind::UnexpectedFailure,
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.kind().verdict()
    }
}

/// Convenience alias used throughout the harness crates.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Render a panic payload the way `std` does for `&str` and `String` payloads.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
