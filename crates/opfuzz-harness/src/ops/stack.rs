//! `stack`: join N tensors along a new axis.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank, 0..=4
//! i64 xR  dims, 1..=6
//! u8      tensor count, 1..=4
//! i8      new axis in [0, rank]
//! u8      odd: the last tensor gets its own decoded rank and dims
//!         (u8 rank + i64 dims follow, only when the count is at least 2)
//! ..      payloads in order
//! ```
//!
//! With a single tensor there is nothing to mismatch against, so the flag is
//! read but no shape follows and the output is always `[1, ..]` around the
//! new axis.

use candle_core::Tensor;
use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, Shape, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, ALL_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(0, 4))
    .with_dims(DimBounds::new(1, 6));

#[derive(Debug, Clone, Copy)]
pub struct Stack;

impl OperatorHarness for Stack {
    fn name(&self) -> &'static str {
        "stack"
    }

    fn min_input_len(&self) -> usize {
        4
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let materializer = TensorMaterializer::new(LIMITS);
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let count = decoder.size(1, 4);
        let axis = decoder.axis(spec.shape.rank() + 1);
        let shapes = member_shapes(decoder, &spec.shape, count);

        let tensors = shapes
            .iter()
            .map(|shape| {
                let host =
                    materializer.materialize(decoder.cursor_mut(), spec.element_type, shape)?;
                Ok(host.to_tensor(&ctx.device)?)
            })
            .collect::<Result<Vec<_>>>()?;

        let out = Tensor::stack(&tensors, axis)?;

        let mut expected = spec.shape.dims().to_vec();
        expected.insert(axis, count);
        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, &expected)
            .finish()
    }
}

/// `count` copies of `shape`; when there are at least two members and the
/// flag byte is odd, the last one is replaced by a freshly decoded shape.
fn member_shapes(decoder: &mut ParamDecoder<'_>, shape: &Shape, count: usize) -> Vec<Shape> {
    let mut shapes = vec![shape.clone(); count];
    if decoder.flag() && count >= 2 {
        let rank = decoder.rank(LIMITS.rank);
        shapes[count - 1] = decoder.shape(rank, LIMITS.dims);
    }
    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{is_expected, run, InputBuilder};

    #[test]
    fn stacks_along_every_axis() {
        for axis in 0..3i8 {
            let data = InputBuilder::new()
                .u8(0)
                .u8(2)
                .dims(&[2, 3], LIMITS.dims)
                .u8(2)
                .i8(axis)
                .u8(0)
                .build();
            run(&Stack, &data).unwrap();
        }
    }

    #[test]
    fn single_member_ignores_mismatch_flag() {
        let data = InputBuilder::new()
            .u8(1)
            .dim(2, LIMITS.dims)
            .dim(2, LIMITS.dims)
            .build();
        let mut decoder = ParamDecoder::new(&data);
        let shape = Shape::new(vec![2]);
        assert_eq!(member_shapes(&mut decoder, &shape, 1), vec![shape]);
        // Only the flag byte was read; the bytes after it stay payload.
        assert_eq!(decoder.offset(), 1);
    }

    #[test]
    fn single_member_with_flag_stacks_to_leading_one() {
        let data = InputBuilder::new()
            .u8(0)
            .u8(1)
            .dim(2, LIMITS.dims)
            .u8(0)
            .i8(0)
            .u8(1)
            .u8(1)
            .dims(&[2, 2], LIMITS.dims)
            .build();
        let mut decoder = ParamDecoder::new(&data);
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let count = decoder.size(1, 4);
        let axis = decoder.axis(spec.shape.rank() + 1);
        assert_eq!((count, axis), (1, 0));
        assert_eq!(member_shapes(&mut decoder, &spec.shape, count), vec![spec.shape.clone()]);

        run(&Stack, &data).unwrap();
    }

    #[test]
    fn mismatched_member_is_rejected() {
        let data = InputBuilder::new()
            .u8(0)
            .u8(1)
            .dim(2, LIMITS.dims)
            .u8(1)
            .i8(0)
            .u8(1)
            .u8(1)
            .dim(5, LIMITS.dims)
            .build();
        assert!(is_expected(&run(&Stack, &data)));
    }
}
