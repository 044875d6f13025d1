//! `leaky_relu`: `x` for non-negative inputs, `slope * x` otherwise.
//!
//! ```text
//! u8      element type (float types)
//! u8      rank, 0..=4
//! i64 xR  dims, 1..=10
//! f64     negative slope, non-finite -> 0.01, clamped to [-10, 10]
//! ..      payload
//! ```
//!
//! The output is compared with a `where_cond` reference; disagreement is
//! saved as a divergence.

use candle_core::Tensor;
use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, ShapeLimits};
use opfuzz_tensor::{compare_tensors, CheckPolicy, OutputCheck, TensorMaterializer, FLOAT_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(0, 4))
    .with_dims(DimBounds::new(1, 10));

#[derive(Debug, Clone, Copy)]
pub struct LeakyRelu;

impl OperatorHarness for LeakyRelu {
    fn name(&self) -> &'static str {
        "leaky_relu"
    }

    fn min_input_len(&self) -> usize {
        3
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let spec = decoder.tensor_spec(&FLOAT_TYPES, &LIMITS);
        let slope = decoder.finite_f64(0.01, -10.0, 10.0);

        let input = TensorMaterializer::new(LIMITS)
            .materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?
            .to_tensor(&ctx.device)?;

        let out = candle_nn::ops::leaky_relu(&input, slope)?;

        let cmp = compare_tensors(&out, &reference(&input, slope)?, 1e-3, 1e-3)?;
        let detail =
            || format!("slope {slope}: differs from select reference by {}", cmp.max_abs_diff);
        if !cmp.all_close {
            ctx.report_divergence(detail());
        }
        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, spec.shape.dims())
            .ensure(cmp.all_close, detail)
            .finish()
    }
}

fn reference(x: &Tensor, slope: f64) -> candle_core::Result<Tensor> {
    x.ge(0.0)?.where_cond(x, &(x * slope)?)
}
