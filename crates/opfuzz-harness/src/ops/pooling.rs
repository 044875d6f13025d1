//! `max_pool2d` and `avg_pool2d`: 2-D pooling with TF-style padding.
//!
//! ```text
//! u8      element type (float types)
//! i64 x4  input dims, 1..=10
//! u8      data format (NHWC, NCHW)
//! u8 x2   window h, w: % 5 + 1
//! u8 x2   stride h, w: % 3 + 1
//! u8      padding (SAME, VALID, EXPLICIT)
//! u8 x4   explicit top, bottom, left, right: % 3 (EXPLICIT only)
//! ..      payload
//! ```
//!
//! The framework pools NCHW tensors without padding, so NHWC inputs are
//! permuted and padding is applied beforehand (edge values for max pooling,
//! zeros for average pooling). A window larger than the padded input is
//! rejected before invoking the operator.

use candle_core::Tensor;
use opfuzz_common::{HarnessError, Result};
use opfuzz_decode::{DataFormat, DimBounds, Padding, ParamDecoder, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, FLOAT_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const DIMS: DimBounds = DimBounds::new(1, 10);
const LIMITS: ShapeLimits = ShapeLimits::DEFAULT.with_dims(DIMS);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolKind {
    Max,
    Avg,
}

#[derive(Debug, Clone, Copy)]
pub struct MaxPool2d;

#[derive(Debug, Clone, Copy)]
pub struct AvgPool2d;

impl OperatorHarness for MaxPool2d {
    fn name(&self) -> &'static str {
        "max_pool2d"
    }

    fn min_input_len(&self) -> usize {
        8
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        pool(self.name(), self.check_policy(), PoolKind::Max, decoder, ctx)
    }
}

impl OperatorHarness for AvgPool2d {
    fn name(&self) -> &'static str {
        "avg_pool2d"
    }

    fn min_input_len(&self) -> usize {
        8
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        pool(self.name(), self.check_policy(), PoolKind::Avg, decoder, ctx)
    }
}

/// Padding amounts as `[top, bottom, left, right]`.
type Pads = [usize; 4];

fn pool(
    op: &'static str,
    policy: CheckPolicy,
    kind: PoolKind,
    decoder: &mut ParamDecoder<'_>,
    ctx: &InvokeContext,
) -> Result<()> {
    let element_type = decoder.element_type(&FLOAT_TYPES);
    let shape = decoder.shape(4, DIMS);
    let format = decoder.choice(&DataFormat::ALL);
    let window = (decoder.size(1, 5), decoder.size(1, 5));
    let stride = (decoder.size(1, 3), decoder.size(1, 3));
    let padding = decoder.choice(&Padding::ALL);
    let explicit: Pads = match padding {
        Padding::Explicit => std::array::from_fn(|_| decoder.size(0, 2)),
        _ => [0; 4],
    };

    let input = TensorMaterializer::new(LIMITS)
        .materialize(decoder.cursor_mut(), element_type, &shape)?
        .to_tensor(&ctx.device)?;

    let nchw = match format {
        DataFormat::Nhwc => input.permute((0, 3, 1, 2))?.contiguous()?,
        DataFormat::Nchw => input,
    };
    let (n, c, h, w) = nchw.dims4()?;

    let pads = match padding {
        Padding::Valid => [0; 4],
        Padding::Explicit => explicit,
        Padding::Same => {
            let (top, bottom) = same_padding(h, window.0, stride.0);
            let (left, right) = same_padding(w, window.1, stride.1);
            [top, bottom, left, right]
        }
    };
    let padded = pad(&nchw, pads, kind)?;
    let (ph, pw) = (h + pads[0] + pads[1], w + pads[2] + pads[3]);
    if window.0 > ph || window.1 > pw {
        return Err(HarnessError::invalid_config(format!(
            "window {window:?} larger than padded input {ph}x{pw}"
        )));
    }

    let pooled = match kind {
        PoolKind::Max => padded.max_pool2d_with_stride(window, stride)?,
        PoolKind::Avg => padded.avg_pool2d_with_stride(window, stride)?,
    };
    let (oh, ow) = ((ph - window.0) / stride.0 + 1, (pw - window.1) / stride.1 + 1);
    let (out, expected) = match format {
        DataFormat::Nhwc => (pooled.permute((0, 2, 3, 1))?, [n, oh, ow, c]),
        DataFormat::Nchw => (pooled, [n, c, oh, ow]),
    };

    OutputCheck::new(op, policy)
        .dtype(&out, element_type.dtype())
        .shape(&out, &expected)
        .finish()
}

/// TF `SAME` padding: the output has `ceil(input / stride)` positions.
fn same_padding(input: usize, window: usize, stride: usize) -> (usize, usize) {
    let out = input.div_ceil(stride);
    let total = ((out - 1) * stride + window).saturating_sub(input);
    (total / 2, total - total / 2)
}

fn pad(t: &Tensor, pads: Pads, kind: PoolKind) -> candle_core::Result<Tensor> {
    let [top, bottom, left, right] = pads;
    match kind {
        PoolKind::Max => t.pad_with_same(2, top, bottom)?.pad_with_same(3, left, right),
        PoolKind::Avg => t.pad_with_zeros(2, top, bottom)?.pad_with_zeros(3, left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{is_expected, run, InputBuilder};

    #[test]
    fn same_padding_matches_tf() {
        assert_eq!(same_padding(5, 3, 1), (1, 1));
        assert_eq!(same_padding(5, 2, 2), (0, 1));
        assert_eq!(same_padding(4, 1, 3), (0, 0));
    }

    fn input(format: u8, window: u8, padding: u8) -> Vec<u8> {
        InputBuilder::new()
            .u8(0)
            .dims(&[1, 4, 5, 2], DIMS)
            .u8(format)
            .u8(window)
            .u8(window)
            .u8(1)
            .u8(1)
            .u8(padding)
            .build()
    }

    #[test]
    fn both_kinds_run_in_both_formats() {
        for format in 0..2 {
            for padding in 0..3 {
                let data = input(format, 1, padding);
                run(&MaxPool2d, &data).unwrap();
                run(&AvgPool2d, &data).unwrap();
            }
        }
    }

    #[test]
    fn oversized_window_is_rejected() {
        // NCHW [1, 4, 5, 2]: width 2 cannot hold a 5-wide VALID window.
        let data = input(1, 4, 1);
        assert!(is_expected(&run(&MaxPool2d, &data)));
    }
}
