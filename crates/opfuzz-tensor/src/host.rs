//! Host-side tensor storage filled from fuzz input.
//!
//! A [`HostTensor`] owns one typed `Vec` per element type. Filling copies raw
//! element bytes from the cursor (NaN, infinities and overflow patterns are
//! kept as-is) and switches to a deterministic pattern once the input runs
//! out, so every element is always written. Sanitizers run after the fill and
//! only touch elements they actually change.

use bytemuck::Pod;
use candle_core::{Device, Tensor, WithDType};
use half::{bf16, f16};
use opfuzz_decode::{ByteCursor, Shape, ShapeError};

use crate::element::ElementType;

/// Typed element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementBuffer {
    F32(Vec<f32>),
    F64(Vec<f64>),
    F16(Vec<f16>),
    BF16(Vec<bf16>),
    I64(Vec<i64>),
    U32(Vec<u32>),
    U8(Vec<u8>),
}

macro_rules! map_buffer {
    ($buffer:expr, |$values:ident| $body:expr) => {
        match $buffer {
            ElementBuffer::F32($values) => $body,
            ElementBuffer::F64($values) => $body,
            ElementBuffer::F16($values) => $body,
            ElementBuffer::BF16($values) => $body,
            ElementBuffer::I64($values) => $body,
            ElementBuffer::U32($values) => $body,
            ElementBuffer::U8($values) => $body,
        }
    };
}

impl ElementBuffer {
    /// `len` copies of `value` converted to `element_type`.
    pub fn splat(element_type: ElementType, len: usize, value: f64) -> Self {
        fn splat_vec<T: WithDType>(len: usize, value: f64) -> Vec<T> {
            vec![T::from_f64(value); len]
        }
        match element_type {
            ElementType::F32 => ElementBuffer::F32(splat_vec(len, value)),
            ElementType::F64 => ElementBuffer::F64(splat_vec(len, value)),
            ElementType::F16 => ElementBuffer::F16(splat_vec(len, value)),
            ElementType::BF16 => ElementBuffer::BF16(splat_vec(len, value)),
            ElementType::I64 => ElementBuffer::I64(splat_vec(len, value)),
            ElementType::U32 => ElementBuffer::U32(splat_vec(len, value)),
            ElementType::U8 => ElementBuffer::U8(splat_vec(len, value)),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ElementBuffer::F32(_) => ElementType::F32,
            ElementBuffer::F64(_) => ElementType::F64,
            ElementBuffer::F16(_) => ElementType::F16,
            ElementBuffer::BF16(_) => ElementType::BF16,
            ElementBuffer::I64(_) => ElementType::I64,
            ElementBuffer::U32(_) => ElementType::U32,
            ElementBuffer::U8(_) => ElementType::U8,
        }
    }

    pub fn len(&self) -> usize {
        map_buffer!(self, |values| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How the elements of a filled tensor were produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Elements copied from input bytes
    pub from_input: usize,
    /// Elements set from the fallback pattern
    pub synthesized: usize,
}

impl FillReport {
    pub fn total(&self) -> usize {
        self.from_input + self.synthesized
    }
}

/// Fallback pattern for element `index`: `(index + 1) % 100`.
pub fn fallback_value<T: WithDType>(index: usize) -> T {
    T::from_f64(((index + 1) % 100) as f64)
}

/// Post-fill value fix-ups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sanitizer {
    /// NaN becomes 0, then every value is clamped into `[min, max]`.
    FiniteClamp { min: f64, max: f64 },
    /// Zero becomes 1.
    NonZero,
    /// `|v| % bound`, truncated. Non-finite values and a zero bound give 0.
    IndexRange { bound: usize },
}

impl Sanitizer {
    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            Sanitizer::FiniteClamp { min, max } => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                let value = if value.is_nan() { 0.0 } else { value };
                value.clamp(lo, hi)
            }
            Sanitizer::NonZero => {
                if value == 0.0 {
                    1.0
                } else {
                    value
                }
            }
            Sanitizer::IndexRange { bound } => {
                if bound == 0 || !value.is_finite() {
                    0.0
                } else {
                    (value.abs().trunc() as u64 % bound as u64) as f64
                }
            }
        }
    }
}

/// Materialized tensor in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor {
    shape: Shape,
    buffer: ElementBuffer,
}

impl HostTensor {
    /// Zero-initialised storage for `shape`.
    pub fn allocate(element_type: ElementType, shape: Shape) -> Result<Self, ShapeError> {
        Self::splat(element_type, shape, 0.0)
    }

    /// Storage for `shape` with every element set to `value`.
    pub fn splat(element_type: ElementType, shape: Shape, value: f64) -> Result<Self, ShapeError> {
        let len = shape
            .element_count()
            .ok_or_else(|| ShapeError::ElementCountOverflow { shape: shape.clone() })?;
        Ok(Self { shape, buffer: ElementBuffer::splat(element_type, len, value) })
    }

    pub fn element_type(&self) -> ElementType {
        self.buffer.element_type()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn buffer(&self) -> &ElementBuffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Write every element, from input bytes while they last.
    pub fn fill(&mut self, cursor: &mut ByteCursor<'_>) -> FillReport {
        map_buffer!(&mut self.buffer, |values| fill_values(values, cursor))
    }

    /// Apply `sanitizer` to every element. Returns the number of changed
    /// elements.
    pub fn sanitize(&mut self, sanitizer: Sanitizer) -> usize {
        map_buffer!(&mut self.buffer, |values| sanitize_values(values, sanitizer))
    }

    /// Copy the storage into a candle tensor on `device`.
    pub fn to_tensor(&self, device: &Device) -> candle_core::Result<Tensor> {
        let dims = self.shape.dims();
        map_buffer!(&self.buffer, |values| Tensor::from_slice(values.as_slice(), dims, device))
    }

    /// Every element widened to `f64`.
    pub fn values_f64(&self) -> Vec<f64> {
        map_buffer!(&self.buffer, |values| values.iter().map(|v| v.to_f64()).collect())
    }
}

fn fill_values<T: Pod + WithDType>(values: &mut [T], cursor: &mut ByteCursor<'_>) -> FillReport {
    let mut report = FillReport::default();
    for (index, slot) in values.iter_mut().enumerate() {
        match cursor.try_consume::<T>() {
            Some(value) => {
                *slot = value;
                report.from_input += 1;
            }
            None => {
                *slot = fallback_value(index);
                report.synthesized += 1;
            }
        }
    }
    report
}

fn sanitize_values<T: WithDType>(values: &mut [T], sanitizer: Sanitizer) -> usize {
    let mut changed = 0;
    for slot in values.iter_mut() {
        let before = slot.to_f64();
        let after = sanitizer.apply(before);
        // NaN != NaN, so NaN inputs are always rewritten.
        if after != before {
            *slot = T::from_f64(after);
            changed += 1;
        }
    }
    changed
}
