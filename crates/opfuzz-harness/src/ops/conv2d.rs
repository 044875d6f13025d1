//! `conv2d`: grouped, strided, dilated 2-D convolution over NCHW input.
//!
//! ```text
//! u8      element type (float types)
//! i64 x4  input dims n 1..=4, c 1..=8, h 1..=10, w 1..=10
//! u8      groups, picked among the divisors of c
//! u8      output channels per group, 1..=4
//! u8 x2   kernel h, w, 1..=5
//! u8      stride, 1..=3
//! u8      padding, 0..=2
//! u8      dilation, 1..=3
//! u8      odd: kernel carries one extra input channel
//! ..      payload input, payload kernel
//! ```

use opfuzz_common::{HarnessError, Result};
use opfuzz_decode::{DimBounds, ParamDecoder, Shape, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, FLOAT_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const BATCH: DimBounds = DimBounds::new(1, 4);
const CHANNELS: DimBounds = DimBounds::new(1, 8);
const SPATIAL: DimBounds = DimBounds::new(1, 10);
const LIMITS: ShapeLimits = ShapeLimits::DEFAULT;

#[derive(Debug, Clone, Copy)]
pub struct Conv2d;

impl OperatorHarness for Conv2d {
    fn name(&self) -> &'static str {
        "conv2d"
    }

    fn min_input_len(&self) -> usize {
        8
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let element_type = decoder.element_type(&FLOAT_TYPES);
        let n = decoder.shape(1, BATCH).dims()[0];
        let c = decoder.shape(1, CHANNELS).dims()[0];
        let (h, w) = {
            let hw = decoder.shape(2, SPATIAL);
            (hw.dims()[0], hw.dims()[1])
        };
        let divisors: Vec<usize> = (1..=c).filter(|g| c % g == 0).collect();
        let groups = divisors[decoder.size(0, divisors.len() - 1)];
        let out_channels = groups * decoder.size(1, 4);
        let (kh, kw) = (decoder.size(1, 5), decoder.size(1, 5));
        let stride = decoder.size(1, 3);
        let padding = decoder.size(0, 2);
        let dilation = decoder.size(1, 3);
        let kernel_in = c / groups + usize::from(decoder.flag());

        let (eff_h, eff_w) = (dilation * (kh - 1) + 1, dilation * (kw - 1) + 1);
        let (ph, pw) = (h + 2 * padding, w + 2 * padding);
        if eff_h > ph || eff_w > pw {
            return Err(HarnessError::invalid_config(format!(
                "dilated kernel {eff_h}x{eff_w} larger than padded input {ph}x{pw}"
            )));
        }

        let materializer = TensorMaterializer::new(LIMITS);
        let input = materializer
            .materialize(decoder.cursor_mut(), element_type, &Shape::new(vec![n, c, h, w]))?
            .to_tensor(&ctx.device)?;
        let kernel_shape = Shape::new(vec![out_channels, kernel_in, kh, kw]);
        let kernel = materializer
            .materialize(decoder.cursor_mut(), element_type, &kernel_shape)?
            .to_tensor(&ctx.device)?;

        let out = input.conv2d(&kernel, padding, stride, dilation, groups)?;

        let expected = [n, out_channels, (ph - eff_h) / stride + 1, (pw - eff_w) / stride + 1];
        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, element_type.dtype())
            .shape(&out, &expected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{is_expected, run, InputBuilder};

    fn input(c: usize, groups_byte: u8, kernel: (u8, u8), extra_channel: u8) -> Vec<u8> {
        InputBuilder::new()
            .u8(0)
            .dim(1, BATCH)
            .dim(c, CHANNELS)
            .dims(&[6, 6], SPATIAL)
            .u8(groups_byte)
            .u8(1)
            .u8(kernel.0)
            .u8(kernel.1)
            .u8(0)
            .u8(1)
            .u8(0)
            .u8(extra_channel)
            .build()
    }

    #[test]
    fn grouped_convolution_runs() {
        // c = 4 has divisors [1, 2, 4]; selector 1 picks 2 groups.
        run(&Conv2d, &input(4, 1, (2, 2), 0)).unwrap();
    }

    #[test]
    fn channel_mismatch_is_expected() {
        assert!(is_expected(&run(&Conv2d, &input(4, 0, (2, 2), 1))));
    }

    #[test]
    fn oversized_kernel_is_rejected_before_invocation() {
        // 5x5 kernel with dilation 2 spans 9 > 6 + 2 * 1.
        let data = InputBuilder::new()
            .u8(0)
            .dim(1, BATCH)
            .dim(1, CHANNELS)
            .dims(&[6, 6], SPATIAL)
            .u8(0)
            .u8(0)
            .u8(4)
            .u8(4)
            .u8(0)
            .u8(1)
            .u8(1)
            .u8(0)
            .build();
        assert!(is_expected(&run(&Conv2d, &data)));
    }
}
