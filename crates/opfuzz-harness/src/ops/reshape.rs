//! `reshape`: reinterpret a tensor with a decoded target shape.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank, 0..=4
//! i64 xR  dims, 1..=8
//! u8      target rank, 0..=4
//! i64 xT  target dims, 1..=16
//! u8      odd: infer one target dim from the element count
//! u8      index of the inferred dim (only when inferring)
//! ..      payload
//! ```
//!
//! An accepted reshape must produce exactly the target shape with the same
//! element count; anything else is an unexpected failure.

use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, ALL_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(0, 4))
    .with_dims(DimBounds::new(1, 8));

const TARGET_DIMS: DimBounds = DimBounds::new(1, 16);

#[derive(Debug, Clone, Copy)]
pub struct Reshape;

impl OperatorHarness for Reshape {
    fn name(&self) -> &'static str {
        "reshape"
    }

    fn min_input_len(&self) -> usize {
        3
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Enforce
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let target_rank = decoder.rank(LIMITS.rank);
        let mut target = decoder.shape(target_rank, TARGET_DIMS).into_dims();
        if decoder.flag() && target_rank > 0 {
            let slot = decoder.size(0, target_rank - 1);
            infer_dim(&mut target, slot, spec.shape.element_count().unwrap_or(0));
        }

        let input = TensorMaterializer::new(LIMITS)
            .materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?
            .to_tensor(&ctx.device)?;

        let out = input.reshape(target.as_slice())?;

        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, &target)
            .element_count(&out, input.elem_count())
            .finish()
    }
}

/// Replace `target[slot]` so the product matches `count`, when the other
/// dims divide it evenly. Leaves `target` untouched otherwise.
fn infer_dim(target: &mut [usize], slot: usize, count: usize) {
    let rest: usize = target
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != slot)
        .map(|(_, &d)| d)
        .product();
    if rest > 0 && count % rest == 0 {
        target[slot] = count / rest;
    }
}
