//! `permute`: reorder tensor dimensions.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank, 0..=5
//! i64 xR  dims, 1..=6
//! u8 x(R-1) permutation swaps
//! u8      odd: repeat the first axis in the second slot (rank >= 2)
//! ..      payload
//! ```
//!
//! An accepted permutation must yield `dims[perm[i]]` at position `i`.

use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, ALL_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(0, 5))
    .with_dims(DimBounds::new(1, 6));

#[derive(Debug, Clone, Copy)]
pub struct Permute;

impl OperatorHarness for Permute {
    fn name(&self) -> &'static str {
        "permute"
    }

    fn min_input_len(&self) -> usize {
        3
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Enforce
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let rank = spec.shape.rank();
        let mut perm = decoder.permutation(rank);
        if decoder.flag() && rank >= 2 {
            perm[1] = perm[0];
        }

        let input = TensorMaterializer::new(LIMITS)
            .materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?
            .to_tensor(&ctx.device)?;

        let out = input.permute(perm.clone())?.contiguous()?;

        let expected: Vec<usize> = perm.iter().map(|&p| spec.shape.dims()[p]).collect();
        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, &expected)
            .element_count(&out, input.elem_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{is_expected, run, InputBuilder};

    #[test]
    fn valid_permutation_passes_enforced_check() {
        let data = InputBuilder::new()
            .u8(0)
            .u8(3)
            .dims(&[2, 3, 4], LIMITS.dims)
            .u8(1)
            .u8(0)
            .u8(0)
            .build();
        run(&Permute, &data).unwrap();
    }

    #[test]
    fn repeated_axis_is_rejected() {
        let data = InputBuilder::new()
            .u8(0)
            .u8(2)
            .dims(&[2, 3], LIMITS.dims)
            .u8(0)
            .u8(1)
            .build();
        assert!(is_expected(&run(&Permute, &data)));
    }

    #[test]
    fn scalar_permutes_to_itself() {
        run(&Permute, &[1, 0, 0]).unwrap();
    }
}
