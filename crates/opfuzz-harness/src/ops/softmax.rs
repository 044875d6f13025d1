//! `softmax`: softmax, log-softmax or the fused last-dim softmax kernel.
//!
//! ```text
//! u8      element type (float types)
//! u8      rank, 1..=4
//! i64 xR  dims, 1..=10
//! i8      axis
//! u8      variant (softmax, log_softmax, softmax_last_dim)
//! ..      payload
//! ```

use candle_nn::ops;
use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, FLOAT_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(1, 4))
    .with_dims(DimBounds::new(1, 10));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Softmax,
    LogSoftmax,
    SoftmaxLastDim,
}

impl Variant {
    const ALL: [Variant; 3] = [Variant::Softmax, Variant::LogSoftmax, Variant::SoftmaxLastDim];
}

#[derive(Debug, Clone, Copy)]
pub struct Softmax;

impl OperatorHarness for Softmax {
    fn name(&self) -> &'static str {
        "softmax"
    }

    fn min_input_len(&self) -> usize {
        3
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let spec = decoder.tensor_spec(&FLOAT_TYPES, &LIMITS);
        let axis = decoder.axis(spec.shape.rank());
        let variant = decoder.choice(&Variant::ALL);

        let input = TensorMaterializer::new(LIMITS)
            .materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?
            .to_tensor(&ctx.device)?;

        let out = match variant {
            Variant::Softmax => ops::softmax(&input, axis)?,
            Variant::LogSoftmax => ops::log_softmax(&input, axis)?,
            Variant::SoftmaxLastDim => ops::softmax_last_dim(&input)?,
        };

        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, spec.shape.dims())
            .finish()
    }
}
