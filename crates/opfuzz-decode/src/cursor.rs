//! Bounds-checked cursor over an immutable fuzz input.
//!
//! Every read either succeeds in full or falls back to a default value; a
//! read never touches memory outside the input. A short read exhausts the
//! cursor, so all subsequent reads also fall back: partially available
//! trailing bytes are never reinterpreted.

use bytemuck::Pod;
use std::mem::size_of;

/// Single-pass cursor with a monotonically increasing offset.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the whole input, independent of the offset.
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the offset and the end of the input.
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub const fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Reinterpret the next `size_of::<T>()` bytes as a `T`.
    ///
    /// Returns `None` and exhausts the cursor when not enough bytes remain.
    pub fn try_consume<T: Pod>(&mut self) -> Option<T> {
        let size = size_of::<T>();
        let window = self.offset.checked_add(size).and_then(|end| self.data.get(self.offset..end));
        match window {
            Some(bytes) => {
                self.offset += size;
                Some(bytemuck::pod_read_unaligned(bytes))
            }
            None => {
                self.offset = self.data.len();
                None
            }
        }
    }

    /// Like [`try_consume`](Self::try_consume) but substitutes `T::default()`.
    pub fn consume<T: Pod + Default>(&mut self) -> T {
        self.try_consume().unwrap_or_default()
    }

    pub fn consume_u8(&mut self) -> u8 {
        self.consume::<u8>()
    }

    /// One byte reduced with `% 2`; `false` once the input is exhausted.
    pub fn consume_bool(&mut self) -> bool {
        self.consume_u8() % 2 == 1
    }

    /// Consume an `i64` and reduce it into `[min, max]`.
    pub fn consume_bounded(&mut self, min: i64, max: i64) -> i64 {
        reduce_into_range(self.consume::<i64>(), min, max)
    }

    /// Consume a single byte and reduce it into `[min, max]`.
    pub fn consume_byte_bounded(&mut self, min: i64, max: i64) -> i64 {
        reduce_into_range(i64::from(self.consume_u8()), min, max)
    }

    /// Up to `n` bytes, clipped to what remains.
    pub fn consume_bytes(&mut self, n: usize) -> &'a [u8] {
        let take = n.min(self.remaining());
        let bytes = &self.data[self.offset..self.offset + take];
        self.offset += take;
        bytes
    }
}

/// Reduce `raw` into `[min, max]` as `min + |raw| % (max - min + 1)`.
///
/// Bounds given in the wrong order are swapped. `i64::MIN` and spans close to
/// the full `i64` range are handled without overflow.
pub fn reduce_into_range(raw: i64, min: i64, max: i64) -> i64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let span = (i128::from(hi) - i128::from(lo) + 1) as u128;
    let offset = u128::from(raw.unsigned_abs()) % span;
    (i128::from(lo) + offset as i128) as i64
}
