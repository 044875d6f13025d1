//! `div`: element-wise division with an optional rounding mode.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank, 0..=4
//! i64 xR  dims, 1..=6
//! u8      divisor: 0 same shape, 1 scalar, 2 vector over the last dim
//! f64     scalar divisor, zero -> 1 (mode 1 only)
//! u8      rounding mode (none, trunc, floor), float types only
//! ..      payload dividend, payload divisor (zeros -> 1)
//! ```

use candle_core::Tensor;
use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, RoundingMode, Shape, ShapeLimits};
use opfuzz_tensor::{
    broadcast_shape, CheckPolicy, OutputCheck, Sanitizer, TensorMaterializer, ALL_TYPES,
};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(0, 4))
    .with_dims(DimBounds::new(1, 6));

#[derive(Debug, Clone, PartialEq)]
enum Divisor {
    Tensor(Shape),
    Scalar(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct Div;

impl OperatorHarness for Div {
    fn name(&self) -> &'static str {
        "div"
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
        let divisor = match decoder.byte_bounded(0, 2) {
            0 => Divisor::Tensor(spec.shape.clone()),
            1 => Divisor::Scalar(decoder.nonzero_f64()),
            _ => {
                let last = spec.shape.dims().last().copied().unwrap_or(1);
                Divisor::Tensor(Shape::new(vec![last]))
            }
        };
        let rounding = decoder.choice(&RoundingMode::ALL);

        let x = materializer
            .materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?
            .to_tensor(&ctx.device)?;

        let (quotient, expected) = match &divisor {
            Divisor::Scalar(d) => ((&x / *d)?, spec.shape.dims().to_vec()),
            Divisor::Tensor(shape) => {
                let y = materializer
                    .materialize_sanitized(
                        decoder.cursor_mut(),
                        spec.element_type,
                        shape,
                        Sanitizer::NonZero,
                    )?
                    .to_tensor(&ctx.device)?;
                let expected = broadcast_shape(spec.shape.dims(), shape.dims())
                    .unwrap_or_else(|_| spec.shape.dims().to_vec());
                (x.broadcast_div(&y)?, expected)
            }
        };

        let out = if spec.element_type.is_float() {
            round(&quotient, rounding)?
        } else {
            quotient
        };

        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, &expected)
            .finish()
    }
}

fn round(quotient: &Tensor, mode: RoundingMode) -> candle_core::Result<Tensor> {
    match mode {
        RoundingMode::None => Ok(quotient.clone()),
        RoundingMode::Floor => quotient.floor(),
        RoundingMode::Trunc => {
            quotient.ge(0.0)?.where_cond(&quotient.floor()?, &quotient.ceil()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{run, InputBuilder};
    use candle_core::Device;

    #[test]
    fn zero_scalar_divisor_leaves_input_unchanged() {
        let data = InputBuilder::new()
            .u8(0)
            .u8(1)
            .dim(3, LIMITS.dims)
            .u8(1)
            .f64(0.0)
            .u8(0)
            .f32s(&[1.5, -2.0, 8.0])
            .build();
        let mut decoder = ParamDecoder::new(&data);
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        assert_eq!(spec.shape.dims(), &[3]);
        assert_eq!(decoder.byte_bounded(0, 2), 1);
        assert_eq!(decoder.nonzero_f64(), 1.0);
        run(&Div, &data).unwrap();
    }

    #[test]
    fn every_mode_and_rounding_runs() {
        for mode in 0..3 {
            for rounding in 0..3 {
                let mut builder =
                    InputBuilder::new().u8(0).u8(2).dims(&[2, 3], LIMITS.dims).u8(mode);
                if mode == 1 {
                    builder = builder.f64(-4.0);
                }
                run(&Div, &builder.u8(rounding).build()).unwrap();
            }
        }
    }

    #[test]
    fn trunc_rounds_toward_zero() {
        let q = Tensor::new(&[2.5f32, -2.5, 0.0], &Device::Cpu).unwrap();
        let out = round(&q, RoundingMode::Trunc).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(out, vec![2.0, -2.0, 0.0]);
        let out = round(&q, RoundingMode::Floor).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(out, vec![2.0, -3.0, 0.0]);
    }

    #[test]
    fn integer_division_skips_rounding() {
        let data = InputBuilder::new().u8(6).u8(1).dim(4, LIMITS.dims).u8(0).u8(2).build();
        run(&Div, &data).unwrap();
    }
}
