//! `bias_add`: add a 1-D bias along the channel axis.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank, 2..=4
//! i64 xR  value dims, 1..=8
//! u8      data format (NHWC, NCHW)
//! u8      odd: bias length is decoded instead of matching the channel dim
//! u8      bias length 1..=8 (only when the previous byte is odd)
//! ..      value payload, bias payload
//! ```

use opfuzz_common::Result;
use opfuzz_decode::{DataFormat, DimBounds, ParamDecoder, RankBounds, Shape, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, ALL_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(2, 4))
    .with_dims(DimBounds::new(1, 8));

#[derive(Debug, Clone, Copy)]
pub struct BiasAdd;

impl OperatorHarness for BiasAdd {
    fn name(&self) -> &'static str {
        "bias_add"
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
        let format = decoder.choice(&DataFormat::ALL);

        let rank = spec.shape.rank();
        let channels = spec.shape.dims()[format.channel_axis(rank)];
        let bias_len = if decoder.flag() { decoder.size(1, 8) } else { channels };

        let value = materializer.materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?;
        let bias = materializer.materialize(
            decoder.cursor_mut(),
            spec.element_type,
            &Shape::new(vec![bias_len]),
        )?;

        let value = value.to_tensor(&ctx.device)?;
        let bias = bias.to_tensor(&ctx.device)?;
        let bias = match format {
            DataFormat::Nhwc => bias,
            DataFormat::Nchw => {
                // [C] -> [C, 1, ..] so it lines up with axis 1.
                let mut dims = vec![bias_len];
                dims.resize(rank - 1, 1);
                bias.reshape(dims)?
            }
        };

        let out = value.broadcast_add(&bias)?;

        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, spec.shape.dims())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{is_expected, run, InputBuilder};

    #[test]
    fn matching_bias_runs() {
        for format in 0..2 {
            let data = InputBuilder::new()
                .u8(0)
                .u8(1)
                .dims(&[2, 3, 4], LIMITS.dims)
                .u8(format)
                .u8(0)
                .build();
            run(&BiasAdd, &data).unwrap();
        }
    }

    #[test]
    fn channels_last_uses_final_axis_at_every_rank() {
        // Channel dim differs from every other dim, so a wrong axis would
        // size the bias wrongly and fail to broadcast.
        for dims in [&[2, 5][..], &[2, 3, 5], &[2, 3, 4, 5]] {
            let data = InputBuilder::new()
                .u8(0)
                .u8((dims.len() - 2) as u8)
                .dims(dims, LIMITS.dims)
                .u8(0)
                .u8(0)
                .build();
            run(&BiasAdd, &data).unwrap();
        }
    }

    #[test]
    fn mismatched_bias_is_rejected_by_framework() {
        let data = InputBuilder::new()
            .u8(0)
            .u8(0)
            .dims(&[2, 3], LIMITS.dims)
            .u8(0)
            .u8(1)
            .u8(1)
            .build();
        assert!(is_expected(&run(&BiasAdd, &data)));
    }
}
