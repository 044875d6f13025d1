//! Superficial output inspection and differential comparison.
//!
//! Whether a failed check is merely reported or turned into an unexpected
//! failure is a per-harness choice ([`CheckPolicy`]) and is never unified.

use candle_core::{DType, Tensor};
use opfuzz_common::{HarnessError, Result};
use thiserror::Error;
use tracing::warn;

/// What a harness does when an output check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPolicy {
    /// Log the mismatch and keep going.
    Report,
    /// Turn the mismatch into an unexpected failure.
    Enforce,
}

/// Accumulates output mismatches for one operator call.
#[derive(Debug)]
pub struct OutputCheck {
    op: &'static str,
    policy: CheckPolicy,
    mismatches: Vec<String>,
}

impl OutputCheck {
    pub fn new(op: &'static str, policy: CheckPolicy) -> Self {
        Self { op, policy, mismatches: Vec::new() }
    }

    pub fn dtype(mut self, tensor: &Tensor, expected: DType) -> Self {
        if tensor.dtype() != expected {
            self.mismatches.push(format!("dtype {:?}, expected {expected:?}", tensor.dtype()));
        }
        self
    }

    pub fn rank(mut self, tensor: &Tensor, expected: usize) -> Self {
        if tensor.rank() != expected {
            self.mismatches.push(format!("rank {}, expected {expected}", tensor.rank()));
        }
        self
    }

    pub fn shape(mut self, tensor: &Tensor, expected: &[usize]) -> Self {
        if tensor.dims() != expected {
            self.mismatches.push(format!("shape {:?}, expected {expected:?}", tensor.dims()));
        }
        self
    }

    pub fn element_count(mut self, tensor: &Tensor, expected: usize) -> Self {
        if tensor.elem_count() != expected {
            self.mismatches
                .push(format!("{} elements, expected {expected}", tensor.elem_count()));
        }
        self
    }

    /// Record an arbitrary condition.
    pub fn ensure(mut self, holds: bool, detail: impl FnOnce() -> String) -> Self {
        if !holds {
            self.mismatches.push(detail());
        }
        self
    }

    pub fn mismatches(&self) -> &[String] {
        &self.mismatches
    }

    /// Apply the policy to whatever was recorded.
    pub fn finish(self) -> Result<()> {
        if self.mismatches.is_empty() {
            return Ok(());
        }
        let detail = self.mismatches.join("; ");
        match self.policy {
            CheckPolicy::Report => {
                warn!(op = self.op, "output check: {detail}");
                Ok(())
            }
            CheckPolicy::Enforce => Err(HarnessError::output_mismatch(self.op, detail)),
        }
    }
}

/// Shapes that cannot be combined.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeMismatch {
    #[error("broadcast incompatible: dimension {dim} has sizes {a} and {b}")]
    Broadcast { dim: usize, a: usize, b: usize },

    #[error("matmul needs rank >= 2 operands, got {a_rank} and {b_rank}")]
    MatmulRank { a_rank: usize, b_rank: usize },

    #[error("matmul inner dimensions differ: {a_inner} vs {b_inner}")]
    MatmulInner { a_inner: usize, b_inner: usize },

    #[error("matmul batch dimensions differ: {a:?} vs {b:?}")]
    MatmulBatch { a: Vec<usize>, b: Vec<usize> },
}

/// NumPy broadcast of two shapes (right-aligned, size 1 stretches).
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> std::result::Result<Vec<usize>, ShapeMismatch> {
    let rank = a.len().max(b.len());
    let pad_a = rank - a.len();
    let pad_b = rank - b.len();

    (0..rank)
        .map(|i| {
            let da = if i < pad_a { 1 } else { a[i - pad_a] };
            let db = if i < pad_b { 1 } else { b[i - pad_b] };
            match (da, db) {
                _ if da == db => Ok(da),
                (1, _) => Ok(db),
                (_, 1) => Ok(da),
                _ => Err(ShapeMismatch::Broadcast { dim: i, a: da, b: db }),
            }
        })
        .collect()
}

/// Output shape of a batched `a @ b` with identical batch dimensions.
pub fn matmul_shape(a: &[usize], b: &[usize]) -> std::result::Result<Vec<usize>, ShapeMismatch> {
    if a.len() < 2 || b.len() < 2 {
        return Err(ShapeMismatch::MatmulRank { a_rank: a.len(), b_rank: b.len() });
    }
    let (a_batch, a_mat) = a.split_at(a.len() - 2);
    let (b_batch, b_mat) = b.split_at(b.len() - 2);
    if a_mat[1] != b_mat[0] {
        return Err(ShapeMismatch::MatmulInner { a_inner: a_mat[1], b_inner: b_mat[0] });
    }
    if a_batch != b_batch {
        return Err(ShapeMismatch::MatmulBatch { a: a_batch.to_vec(), b: b_batch.to_vec() });
    }
    let mut out = a_batch.to_vec();
    out.extend_from_slice(&[a_mat[0], b_mat[1]]);
    Ok(out)
}

/// Result of comparing two tensors element-wise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub shapes_match: bool,
    pub dtypes_match: bool,
    /// Largest finite absolute difference; infinite when nothing was compared.
    pub max_abs_diff: f64,
    /// Every element satisfies `|a - b| <= atol + rtol * |b|` (NaN equals NaN).
    pub all_close: bool,
}

/// Element-wise closeness of `a` and `b`, widened to `f64`.
pub fn compare_tensors(
    a: &Tensor,
    b: &Tensor,
    rtol: f64,
    atol: f64,
) -> candle_core::Result<Comparison> {
    let shapes_match = a.dims() == b.dims();
    let dtypes_match = a.dtype() == b.dtype();
    if !shapes_match {
        return Ok(Comparison {
            shapes_match,
            dtypes_match,
            max_abs_diff: f64::INFINITY,
            all_close: false,
        });
    }

    let lhs = a.to_dtype(DType::F64)?.flatten_all()?.to_vec1::<f64>()?;
    let rhs = b.to_dtype(DType::F64)?.flatten_all()?.to_vec1::<f64>()?;

    let mut max_abs_diff: f64 = 0.0;
    let mut all_close = true;
    for (&x, &y) in lhs.iter().zip(&rhs) {
        if x.is_nan() || y.is_nan() {
            all_close &= x.is_nan() && y.is_nan();
            continue;
        }
        if x.is_infinite() || y.is_infinite() {
            all_close &= x == y;
            continue;
        }
        let diff = (x - y).abs();
        max_abs_diff = max_abs_diff.max(diff);
        all_close &= diff <= atol + rtol * y.abs();
    }
    Ok(Comparison { shapes_match, dtypes_match, max_abs_diff, all_close })
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn broadcast_rules() {
        assert_eq!(broadcast_shape(&[3, 1], &[4]), Ok(vec![3, 4]));
        assert_eq!(broadcast_shape(&[], &[2, 2]), Ok(vec![2, 2]));
        assert_eq!(
            broadcast_shape(&[3], &[4]),
            Err(ShapeMismatch::Broadcast { dim: 0, a: 3, b: 4 })
        );
    }

    #[test]
    fn matmul_rules() {
        assert_eq!(matmul_shape(&[2, 3, 4], &[2, 4, 5]), Ok(vec![2, 3, 5]));
        assert!(matches!(matmul_shape(&[3, 4], &[5, 6]), Err(ShapeMismatch::MatmulInner { .. })));
        assert!(matches!(matmul_shape(&[4], &[4, 1]), Err(ShapeMismatch::MatmulRank { .. })));
    }

    #[test]
    fn report_policy_never_fails() {
        let t = Tensor::zeros((2, 2), DType::F32, &Device::Cpu).unwrap();
        let check = OutputCheck::new("test", CheckPolicy::Report).rank(&t, 3).dtype(&t, DType::F64);
        assert_eq!(check.mismatches().len(), 2);
        assert!(check.finish().is_ok());
    }

    #[test]
    fn enforce_policy_fails_loudly() {
        let t = Tensor::zeros((2, 2), DType::F32, &Device::Cpu).unwrap();
        let err = OutputCheck::new("test", CheckPolicy::Enforce).shape(&t, &[4]).finish().unwrap_err();
        assert_eq!(err.kind(), opfuzz_common::FailureKind::UnexpectedFailure);
        assert!(OutputCheck::new("test", CheckPolicy::Enforce).shape(&t, &[2, 2]).finish().is_ok());
    }

    #[test]
    fn comparison_tolerates_nan_pairs() {
        let dev = Device::Cpu;
        let a = Tensor::new(&[1.0f32, f32::NAN, 3.0], &dev).unwrap();
        let b = Tensor::new(&[1.0f32, f32::NAN, 3.5], &dev).unwrap();
        let cmp = compare_tensors(&a, &b, 0.0, 1e-6).unwrap();
        assert!(cmp.shapes_match && cmp.dtypes_match);
        assert!(!cmp.all_close);
        assert_eq!(cmp.max_abs_diff, 0.5);
        assert!(compare_tensors(&a, &a, 0.0, 0.0).unwrap().all_close);
    }
}
