//! `matmul`: batched matrix product, optionally broadcasting and with
//! transposed operands.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank of a, 2..=4
//! i64 xR  dims of a, 1..=8
//! u8      odd: b is a plain matrix broadcast over a's batch dims
//! u8      transpose_a flag
//! u8      transpose_b flag
//! u8      n, 1..=8
//! u8      odd: b's inner dim is decoded from the next byte, 1..=8
//! ..      payload a, payload b
//! ```
//!
//! Whenever the framework accepts the operands, the output must have the
//! shape `[batch.., m, n]`; anything else is an unexpected failure.

use candle_core::Tensor;
use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, Shape, ShapeLimits};
use opfuzz_tensor::{
    broadcast_shape, matmul_shape, CheckPolicy, ElementType, OutputCheck, TensorMaterializer,
    ALL_TYPES,
};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(2, 4))
    .with_dims(DimBounds::new(1, 8));

#[derive(Debug, Clone, Copy)]
pub struct Matmul;

impl OperatorHarness for Matmul {
    fn name(&self) -> &'static str {
        "matmul"
    }

    fn min_input_len(&self) -> usize {
        6
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Enforce
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let materializer = TensorMaterializer::new(LIMITS);
        let a_spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let broadcast = decoder.flag();
        let transpose_a = decoder.flag();
        let transpose_b = decoder.flag();
        let n = decoder.size(1, 8);

        let a_dims = a_spec.shape.dims();
        let (batch, k) = (&a_dims[..a_dims.len() - 2], a_dims[a_dims.len() - 1]);
        let inner = if decoder.flag() { decoder.size(1, 8) } else { k };
        let mut b_dims = if broadcast { Vec::new() } else { batch.to_vec() };
        b_dims.extend_from_slice(&[inner, n]);
        let b_shape = Shape::new(b_dims);

        let ty = a_spec.element_type;
        let a = operand(&materializer, decoder, ty, &a_spec.shape, transpose_a, ctx)?;
        let b = operand(&materializer, decoder, ty, &b_shape, transpose_b, ctx)?;

        let out = if broadcast { a.broadcast_matmul(&b)? } else { a.matmul(&b)? };

        let expected = expected_shape(a_spec.shape.dims(), b_shape.dims(), broadcast);
        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, a_spec.element_type.dtype())
            .ensure(expected.is_some(), || {
                format!("accepted incompatible operands {} and {b_shape}", a_spec.shape)
            })
            .shape(&out, expected.as_deref().unwrap_or(out.dims()))
            .finish()
    }
}

/// Materialize `shape`; when `transpose` is set the storage holds the last
/// two dims swapped and the returned tensor is a transposed view of it.
fn operand(
    materializer: &TensorMaterializer,
    decoder: &mut ParamDecoder<'_>,
    element_type: ElementType,
    shape: &Shape,
    transpose: bool,
    ctx: &InvokeContext,
) -> Result<Tensor> {
    if !transpose {
        let host = materializer.materialize(decoder.cursor_mut(), element_type, shape)?;
        return Ok(host.to_tensor(&ctx.device)?);
    }
    let mut stored = shape.dims().to_vec();
    let rank = stored.len();
    stored.swap(rank - 2, rank - 1);
    let host = materializer.materialize(decoder.cursor_mut(), element_type, &Shape::new(stored))?;
    Ok(host.to_tensor(&ctx.device)?.t()?)
}

fn expected_shape(a: &[usize], b: &[usize], broadcast: bool) -> Option<Vec<usize>> {
    if !broadcast {
        return matmul_shape(a, b).ok();
    }
    let (a_batch, a_mat) = a.split_at(a.len() - 2);
    let (b_batch, b_mat) = b.split_at(b.len() - 2);
    if a_mat[1] != b_mat[0] {
        return None;
    }
    let mut out = broadcast_shape(a_batch, b_batch).ok()?;
    out.extend_from_slice(&[a_mat[0], b_mat[1]]);
    Some(out)
}
