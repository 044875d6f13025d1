//! Helpers for building harness inputs field by field in unit tests.

use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder};

use crate::harness::{InvokeContext, OperatorHarness};

#[derive(Debug, Default)]
pub(crate) struct InputBuilder {
    bytes: Vec<u8>,
}

impl InputBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn u8(mut self, value: u8) -> Self {
        self.bytes.push(value);
        self
    }

    pub(crate) fn i8(self, value: i8) -> Self {
        self.u8(value as u8)
    }

    /// Raw `i64` that decodes to `value` under `bounds`.
    pub(crate) fn dim(mut self, value: usize, bounds: DimBounds) -> Self {
        assert!(bounds.contains(value), "{value} outside {bounds:?}");
        self.bytes.extend_from_slice(&((value - bounds.min) as i64).to_ne_bytes());
        self
    }

    pub(crate) fn dims(self, values: &[usize], bounds: DimBounds) -> Self {
        values.iter().fold(self, |b, &v| b.dim(v, bounds))
    }

    pub(crate) fn f32(mut self, value: f32) -> Self {
        self.bytes.extend_from_slice(&value.to_ne_bytes());
        self
    }

    pub(crate) fn f64(mut self, value: f64) -> Self {
        self.bytes.extend_from_slice(&value.to_ne_bytes());
        self
    }

    pub(crate) fn f32s(self, values: &[f32]) -> Self {
        values.iter().fold(self, |b, &v| b.f32(v))
    }

    pub(crate) fn build(self) -> Vec<u8> {
        self.bytes
    }
}

pub(crate) fn run(harness: &dyn OperatorHarness, data: &[u8]) -> Result<()> {
    let mut decoder = ParamDecoder::new(data);
    harness.run(&mut decoder, &InvokeContext::default())
}

/// Like [`run`], also returning the divergences the harness reported.
pub(crate) fn run_with_divergences(
    harness: &dyn OperatorHarness,
    data: &[u8],
) -> (Result<()>, Vec<String>) {
    let ctx = InvokeContext::default();
    let mut decoder = ParamDecoder::new(data);
    let result = harness.run(&mut decoder, &ctx);
    (result, ctx.take_divergences())
}

pub(crate) fn is_expected(result: &Result<()>) -> bool {
    matches!(result, Err(err) if err.kind() == opfuzz_common::FailureKind::ExpectedOperationFailure)
}
