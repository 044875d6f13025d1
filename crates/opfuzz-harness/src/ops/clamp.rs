//! `clamp`: limit every element to `[min, max]`.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank, 0..=4
//! i64 xR  dims, 1..=10
//! f32 x2  min, max: non-finite -> 0 / 1, clamped to +-1e4, ordered, min < max
//! ..      payload
//! ```

use candle_core::DType;
use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, ElementType, OutputCheck, TensorMaterializer, ALL_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(0, 4))
    .with_dims(DimBounds::new(1, 10));

const BOUND_LIMIT: f32 = 1e4;

#[derive(Debug, Clone, Copy)]
pub struct Clamp;

impl OperatorHarness for Clamp {
    fn name(&self) -> &'static str {
        "clamp"
    }

    fn min_input_len(&self) -> usize {
        4
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let (min, max) = decoder.range_f32(BOUND_LIMIT);

        let input = TensorMaterializer::new(LIMITS)
            .materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?
            .to_tensor(&ctx.device)?;

        let out = input.clamp(min, max)?;

        let mut check = OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, spec.shape.dims());
        if matches!(spec.element_type, ElementType::F32 | ElementType::F64) {
            let values = out.flatten_all()?.to_dtype(DType::F64)?.to_vec1::<f64>()?;
            let escaped = values
                .iter()
                .filter(|v| !v.is_nan() && (**v < f64::from(min) || **v > f64::from(max)))
                .count();
            check = check.ensure(escaped == 0, || {
                format!("{escaped} values outside [{min}, {max}]")
            });
        }
        check.finish()
    }
}
