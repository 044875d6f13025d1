//! Operator parameter decoding on top of [`ByteCursor`].
//!
//! Fields are consumed strictly left to right. The modulo and clamping rules
//! here define which parameters a given input maps to, so changing them
//! invalidates every existing corpus.

use tracing::trace;

use crate::cursor::{reduce_into_range, ByteCursor};
use crate::shape::{
    decode_element_type, decode_rank, decode_shape, DimBounds, RankBounds, Shape, ShapeLimits,
    TypeTable,
};

/// Element type and shape of one tensor argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSpec<T> {
    pub element_type: T,
    pub shape: Shape,
}

/// Decoder for one harness invocation. Owns the cursor.
#[derive(Debug, Clone)]
pub struct ParamDecoder<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> ParamDecoder<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { cursor: ByteCursor::new(data) }
    }

    pub const fn from_cursor(cursor: ByteCursor<'a>) -> Self {
        Self { cursor }
    }

    pub fn cursor(&self) -> &ByteCursor<'a> {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut ByteCursor<'a> {
        &mut self.cursor
    }

    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// One selector byte mapped through `table`.
    pub fn element_type<T: Copy + std::fmt::Debug>(&mut self, table: &TypeTable<T>) -> T {
        let selector = self.cursor.consume_u8();
        let ty = decode_element_type(selector, table);
        trace!(selector, ?ty, "element type");
        ty
    }

    /// One byte reduced into `bounds`.
    pub fn rank(&mut self, bounds: RankBounds) -> usize {
        let rank = decode_rank(self.cursor.consume_u8(), bounds);
        trace!(rank, "rank");
        rank
    }

    pub fn shape(&mut self, rank: usize, dims: DimBounds) -> Shape {
        let shape = decode_shape(&mut self.cursor, rank, dims);
        trace!(%shape, "shape");
        shape
    }

    /// Selector byte, rank byte, then one `i64` per dimension.
    pub fn tensor_spec<T: Copy + std::fmt::Debug>(
        &mut self,
        table: &TypeTable<T>,
        limits: &ShapeLimits,
    ) -> TensorSpec<T> {
        let element_type = self.element_type(table);
        let rank = self.rank(limits.rank);
        let shape = self.shape(rank, limits.dims);
        TensorSpec { element_type, shape }
    }

    /// One byte, `% 2`.
    pub fn flag(&mut self) -> bool {
        self.cursor.consume_bool()
    }

    /// `options[byte % N]`.
    pub fn choice<T: Copy, const N: usize>(&mut self, options: &[T; N]) -> T {
        const { assert!(N > 0, "choice needs at least one option") };
        options[usize::from(self.cursor.consume_u8()) % N]
    }

    /// One `i64` reduced into `[min, max]`.
    pub fn bounded(&mut self, min: i64, max: i64) -> i64 {
        self.cursor.consume_bounded(min, max)
    }

    /// One byte reduced into `[min, max]`.
    pub fn byte_bounded(&mut self, min: i64, max: i64) -> i64 {
        self.cursor.consume_byte_bounded(min, max)
    }

    /// Bounded size from one byte, for windows, strides and similar.
    pub fn size(&mut self, min: usize, max: usize) -> usize {
        self.byte_bounded(min as i64, max as i64) as usize
    }

    /// One signed byte read as a possibly negative axis, normalised into
    /// `[0, rank)`. Rank 0 always yields 0.
    pub fn axis(&mut self, rank: usize) -> usize {
        let raw = i64::from(self.cursor.consume::<i8>());
        if rank == 0 {
            return 0;
        }
        let axis = raw.rem_euclid(rank as i64) as usize;
        trace!(raw, axis, rank, "axis");
        axis
    }

    /// In-bounds index: `|raw| % bound`. A zero bound yields 0.
    pub fn index(&mut self, bound: usize) -> usize {
        let raw = self.cursor.consume::<i64>();
        if bound == 0 {
            return 0;
        }
        reduce_into_range(raw, 0, bound as i64 - 1) as usize
    }

    /// Raw `f32`; NaN and infinities become `fallback`, then clamped into
    /// `[min, max]`.
    pub fn finite_f32(&mut self, fallback: f32, min: f32, max: f32) -> f32 {
        let raw = self.cursor.consume::<f32>();
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let value = if raw.is_finite() { raw } else { fallback };
        value.clamp(lo, hi)
    }

    pub fn finite_f64(&mut self, fallback: f64, min: f64, max: f64) -> f64 {
        let raw = self.cursor.consume::<f64>();
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let value = if raw.is_finite() { raw } else { fallback };
        value.clamp(lo, hi)
    }

    /// Raw `i64` with zero replaced by `1`.
    pub fn nonzero_i64(&mut self) -> i64 {
        match self.cursor.consume::<i64>() {
            0 => 1,
            v => v,
        }
    }

    /// Raw `f64` divisor: zero (either sign) becomes `1.0`. Other values,
    /// including NaN and infinities, pass through.
    pub fn nonzero_f64(&mut self) -> f64 {
        let raw = self.cursor.consume::<f64>();
        if raw == 0.0 {
            1.0
        } else {
            raw
        }
    }

    /// Two finite floats clamped to `[-limit, limit]` forming a range with
    /// `min < max`: out-of-order bounds are swapped, equal ones get
    /// `max = min + 1`.
    pub fn range_f32(&mut self, limit: f32) -> (f32, f32) {
        let limit = limit.abs();
        let a = self.finite_f32(0.0, -limit, limit);
        let b = self.finite_f32(1.0, -limit, limit);
        let (min, mut max) = if a <= b { (a, b) } else { (b, a) };
        if min >= max {
            max = min + 1.0;
        }
        trace!(min, max, "range");
        (min, max)
    }

    /// A permutation of `0..rank` driven by one byte per swap.
    pub fn permutation(&mut self, rank: usize) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..rank).collect();
        for i in (1..rank).rev() {
            let j = usize::from(self.cursor.consume_u8()) % (i + 1);
            perm.swap(i, j);
        }
        trace!(?perm, "permutation");
        perm
    }

    /// Up to `n` raw bytes.
    pub fn bytes(&mut self, n: usize) -> &'a [u8] {
        self.cursor.consume_bytes(n)
    }
}
