//! `slice`: TF-style `begin` / `size` slicing, one `narrow` per axis.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank, 1..=4
//! i64 xR  dims, 1..=10
//! u8 x2R  per axis: begin in [0, dim], size in [-1, dim] (-1 = to the end)
//! ..      payload
//! ```
//!
//! `begin + size` may exceed the axis; the framework is expected to reject it.

use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, ALL_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(1, 4))
    .with_dims(DimBounds::new(1, 10));

#[derive(Debug, Clone, Copy)]
pub struct Slice;

impl OperatorHarness for Slice {
    fn name(&self) -> &'static str {
        "slice"
    }

    fn min_input_len(&self) -> usize {
        4
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let windows: Vec<(usize, usize)> = spec
            .shape
            .dims()
            .iter()
            .map(|&dim| {
                let begin = decoder.size(0, dim);
                let size = match decoder.byte_bounded(-1, dim as i64) {
                    -1 => dim.saturating_sub(begin),
                    n => n as usize,
                };
                (begin, size)
            })
            .collect();

        let mut out = TensorMaterializer::new(LIMITS)
            .materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?
            .to_tensor(&ctx.device)?;
        for (axis, &(begin, size)) in windows.iter().enumerate() {
            out = out.narrow(axis, begin, size)?;
        }

        let expected: Vec<usize> = windows.iter().map(|&(_, size)| size).collect();
        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, &expected)
            .finish()
    }
}
