//! Operator fuzz harnesses for candle.
//!
//! Each harness turns an arbitrary byte string into one eager operator
//! invocation: parameters and tensors are decoded from the bytes, the
//! operator runs on the CPU device and its output is inspected. The
//! [`fuzz_entry`] function is what a `fuzz_target!` calls.

mod entry;
mod harness;
pub mod ops;
pub mod registry;

#[cfg(test)]
mod testing;

pub use entry::{execute, execute_with, fuzz_entry, DIAGNOSTIC_PREFIX};
pub use harness::{InvokeContext, OperatorHarness};
pub use opfuzz_common::{HarnessConfig, PanicPolicy, Verdict};
