//! `cumsum`: cumulative sum along one axis with `exclusive` and `reverse`.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank, 0..=4
//! i64 xR  dims, 1..=10
//! i8      axis, negative values count from the end
//! u8      exclusive flag
//! u8      reverse flag
//! ..      payload
//! ```
//!
//! The output must keep the input's shape and dtype; a violation is an
//! unexpected failure.

use candle_core::Tensor;
use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, ALL_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(0, 4))
    .with_dims(DimBounds::new(1, 10));

#[derive(Debug, Clone, Copy)]
pub struct Cumsum;

impl OperatorHarness for Cumsum {
    fn name(&self) -> &'static str {
        "cumsum"
    }

    fn min_input_len(&self) -> usize {
        3
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Enforce
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        // Rank 0 keeps axis 0, which the framework rejects.
        let axis = decoder.axis(spec.shape.rank());
        let exclusive = decoder.flag();
        let reverse = decoder.flag();

        let input = TensorMaterializer::new(LIMITS)
            .materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?
            .to_tensor(&ctx.device)?;

        let out = cumsum(&input, axis, exclusive, reverse)?;

        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, spec.shape.dims())
            .finish()
    }
}

fn cumsum(
    input: &Tensor,
    axis: usize,
    exclusive: bool,
    reverse: bool,
) -> candle_core::Result<Tensor> {
    let x = if reverse { flip(input, axis)? } else { input.clone() };
    let mut y = x.cumsum(axis)?;
    if exclusive {
        y = (y - &x)?;
    }
    if reverse {
        y = flip(&y, axis)?;
    }
    Ok(y)
}

fn flip(t: &Tensor, axis: usize) -> candle_core::Result<Tensor> {
    let n = t.dim(axis)?;
    let index: Vec<u32> = (0..n as u32).rev().collect();
    let index = Tensor::from_vec(index, n, t.device())?;
    t.index_select(&index, axis)
}
