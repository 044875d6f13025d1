//! `add`: `a + alpha * b` with broadcasting, plus a differential check.
//!
//! ```text
//! u8      element type of a (all types)
//! u8      rank of a, 0..=4
//! i64 xR  dims of a, 1..=6
//! u8      shape of b: 0 same as a, 1 trailing suffix of a, 2 decoded
//!         (rank byte + dims follow for mode 2, suffix length byte for mode 1)
//! u8      odd: element type of b decoded from the next byte, else same as a
//! f64     alpha, NaN/inf -> 1, clamped to [-100, 100]
//! ..      payload a, payload b
//! ```
//!
//! For float inputs the result is compared against the same expression
//! evaluated in f64. Disagreement is logged and saved as a divergence, never
//! enforced.

use candle_core::{DType, Tensor};
use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, Shape, ShapeLimits};
use opfuzz_tensor::{
    broadcast_shape, compare_tensors, CheckPolicy, ElementType, OutputCheck, TensorMaterializer,
    ALL_TYPES,
};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(0, 4))
    .with_dims(DimBounds::new(1, 6));

#[derive(Debug, Clone, Copy)]
pub struct Add;

impl OperatorHarness for Add {
    fn name(&self) -> &'static str {
        "add"
    }

    fn min_input_len(&self) -> usize {
        4
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let materializer = TensorMaterializer::new(LIMITS);
        let a_spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let b_shape = match decoder.byte_bounded(0, 2) {
            0 => a_spec.shape.clone(),
            1 => {
                let dims = a_spec.shape.dims();
                let keep = decoder.size(0, dims.len());
                Shape::from(&dims[dims.len() - keep..])
            }
            _ => {
                let rank = decoder.rank(LIMITS.rank);
                decoder.shape(rank, LIMITS.dims)
            }
        };
        let b_type =
            if decoder.flag() { decoder.element_type(&ALL_TYPES) } else { a_spec.element_type };
        let alpha = decoder.finite_f64(1.0, -100.0, 100.0);

        let a = materializer
            .materialize(decoder.cursor_mut(), a_spec.element_type, &a_spec.shape)?
            .to_tensor(&ctx.device)?;
        let b = materializer
            .materialize(decoder.cursor_mut(), b_type, &b_shape)?
            .to_tensor(&ctx.device)?;

        let out = a.broadcast_add(&b.affine(alpha, 0.0)?)?;

        let mut check = OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, a_spec.element_type.dtype());
        if let Ok(expected) = broadcast_shape(a_spec.shape.dims(), b_shape.dims()) {
            check = check.shape(&out, &expected);
        }
        if a_spec.element_type.is_float() && b_type == a_spec.element_type {
            let reference = reference_add(&a, &b, alpha)?;
            let (rtol, atol) = tolerance(a_spec.element_type);
            let cmp = compare_tensors(&out, &reference, rtol, atol)?;
            let detail = || format!("differs from f64 reference by up to {}", cmp.max_abs_diff);
            if !cmp.all_close {
                ctx.report_divergence(detail());
            }
            check = check.ensure(cmp.all_close, detail);
        }
        check.finish()
    }
}

/// `a + alpha * b` computed in f64 and cast back to `a`'s dtype.
fn reference_add(a: &Tensor, b: &Tensor, alpha: f64) -> candle_core::Result<Tensor> {
    let a64 = a.to_dtype(DType::F64)?;
    let b64 = b.to_dtype(DType::F64)?;
    a64.broadcast_add(&b64.affine(alpha, 0.0)?)?.to_dtype(a.dtype())
}

fn tolerance(element_type: ElementType) -> (f64, f64) {
    match element_type {
        ElementType::F64 => (1e-12, 1e-12),
        ElementType::F32 => (1e-5, 1e-5),
        _ => (2e-2, 2e-2),
    }
}
