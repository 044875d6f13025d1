//! Element types the harnesses can materialize.

use candle_core::DType;
use opfuzz_decode::TypeTable;
use std::fmt;

/// Host element type of a materialized tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    F32,
    F64,
    F16,
    BF16,
    I64,
    U32,
    U8,
}

impl ElementType {
    /// Size of one element in bytes
    pub const fn size_in_bytes(self) -> usize {
        match self {
            ElementType::F64 | ElementType::I64 => 8,
            ElementType::F32 | ElementType::U32 => 4,
            ElementType::F16 | ElementType::BF16 => 2,
            ElementType::U8 => 1,
        }
    }

    pub const fn dtype(self) -> DType {
        match self {
            ElementType::F32 => DType::F32,
            ElementType::F64 => DType::F64,
            ElementType::F16 => DType::F16,
            ElementType::BF16 => DType::BF16,
            ElementType::I64 => DType::I64,
            ElementType::U32 => DType::U32,
            ElementType::U8 => DType::U8,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, ElementType::F32 | ElementType::F64 | ElementType::F16 | ElementType::BF16)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::F16 => "f16",
            ElementType::BF16 => "bf16",
            ElementType::I64 => "i64",
            ElementType::U32 => "u32",
            ElementType::U8 => "u8",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every element type, in selector order.
pub const ALL_TYPES: TypeTable<ElementType> = TypeTable::new(&[
    ElementType::F32,
    ElementType::F64,
    ElementType::F16,
    ElementType::BF16,
    ElementType::I64,
    ElementType::U32,
    ElementType::U8,
]);

pub const FLOAT_TYPES: TypeTable<ElementType> =
    TypeTable::new(&[ElementType::F32, ElementType::F64, ElementType::F16, ElementType::BF16]);

/// Types accepted for index tensors (`gather`, `index_select`).
pub const INDEX_TYPES: TypeTable<ElementType> =
    TypeTable::new(&[ElementType::U32, ElementType::I64, ElementType::U8]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_dtype() {
        for &ty in ALL_TYPES.as_slice() {
            assert_eq!(ty.size_in_bytes(), ty.dtype().size_in_bytes(), "{ty}");
        }
    }

    #[test]
    fn float_table_holds_every_float_type() {
        assert!(FLOAT_TYPES.as_slice().iter().all(|t| t.is_float()));
        let floats = ALL_TYPES.as_slice().iter().filter(|t| t.is_float()).count();
        assert_eq!(FLOAT_TYPES.len(), floats);
        assert!(INDEX_TYPES.as_slice().iter().all(|t| !t.is_float()));
    }
}
