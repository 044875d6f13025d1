//! `reduce_min`: minimum over a set of axes, optionally keeping them.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank, 1..=4
//! i64 xR  dims, 1..=8
//! u8      axis count, 0..=rank
//! i8 xA   axes (duplicates collapse)
//! u8      keep_dims flag
//! ..      payload
//! ```
//!
//! The output shape follows directly from the axes, so a mismatch is an
//! unexpected failure.

use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, ALL_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(1, 4))
    .with_dims(DimBounds::new(1, 8));

#[derive(Debug, Clone, Copy)]
pub struct ReduceMin;

impl OperatorHarness for ReduceMin {
    fn name(&self) -> &'static str {
        "reduce_min"
    }

    fn min_input_len(&self) -> usize {
        4
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Enforce
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let rank = spec.shape.rank();
        let count = decoder.size(0, rank);
        let mut axes: Vec<usize> = (0..count).map(|_| decoder.axis(rank)).collect();
        // Reduce from the back so earlier axis numbers stay valid.
        axes.sort_unstable_by(|a, b| b.cmp(a));
        axes.dedup();
        let keep_dims = decoder.flag();

        let input = TensorMaterializer::new(LIMITS)
            .materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?
            .to_tensor(&ctx.device)?;

        let mut out = input;
        for &axis in &axes {
            out = if keep_dims { out.min_keepdim(axis)? } else { out.min(axis)? };
        }

        let expected = reduced_shape(spec.shape.dims(), &axes, keep_dims);
        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, &expected)
            .finish()
    }
}

fn reduced_shape(dims: &[usize], axes: &[usize], keep_dims: bool) -> Vec<usize> {
    dims.iter()
        .enumerate()
        .filter_map(|(i, &d)| match (axes.contains(&i), keep_dims) {
            (false, _) => Some(d),
            (true, true) => Some(1),
            (true, false) => None,
        })
        .collect()
}
