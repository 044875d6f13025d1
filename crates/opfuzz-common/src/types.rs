//! Outcome types handed back to the fuzzing driver

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel returned to libFuzzer when an input should stay in the corpus.
pub const KEEP_SENTINEL: i32 = 0;

/// Sentinel returned to libFuzzer when an input should be discarded.
pub const DISCARD_SENTINEL: i32 = -1;

/// What the fuzzing driver should do with the input that was just executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The input explored the operator normally (including expected rejections).
    Keep,
    /// The input triggered an unexpected failure.
    Discard,
}

impl Verdict {
    /// Integer sentinel following the `LLVMFuzzerTestOneInput` convention.
    pub const fn sentinel(self) -> i32 {
        match self {
            Verdict::Keep => KEEP_SENTINEL,
            Verdict::Discard => DISCARD_SENTINEL,
        }
    }

    pub const fn is_keep(self) -> bool {
        matches!(self, Verdict::Keep)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Keep => write!(f, "keep"),
            Verdict::Discard => write!(f, "discard"),
        }
    }
}

/// The two severities a harness failure can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Framework-reported invalid operation; silent, input kept.
    ExpectedOperationFailure,
    /// Anything else; logged loudly, input discarded.
    UnexpectedFailure,
}

impl FailureKind {
    pub const fn verdict(self) -> Verdict {
        match self {
            FailureKind::ExpectedOperationFailure => Verdict::Keep,
            FailureKind::UnexpectedFailure => Verdict::Discard,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ExpectedOperationFailure => write!(f, "expected"),
            FailureKind::UnexpectedFailure => write!(f, "unexpected"),
        }
    }
}
