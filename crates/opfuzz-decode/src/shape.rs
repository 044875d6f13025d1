//! Shape descriptors, rank/dimension bounds and element type tables.

use std::fmt;
use thiserror::Error;

use crate::cursor::{reduce_into_range, ByteCursor};

/// Shape decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("shape {shape} has {count} elements, budget is {limit}")]
    ElementBudgetExceeded { shape: Shape, count: usize, limit: usize },

    #[error("element count of shape {shape} overflows usize")]
    ElementCountOverflow { shape: Shape },
}

/// Ordered dimension sizes. Rank 0 is a scalar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self(dims)
    }

    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Product of the dimensions, `None` on overflow. A scalar has one element.
    pub fn element_count(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    pub fn into_dims(self) -> Vec<usize> {
        self.0
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Inclusive rank range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankBounds {
    pub min: usize,
    pub max: usize,
}

impl RankBounds {
    /// Bounds in the wrong order are swapped.
    pub const fn new(min: usize, max: usize) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A fixed rank.
    pub const fn exactly(rank: usize) -> Self {
        Self { min: rank, max: rank }
    }

    pub const fn contains(&self, rank: usize) -> bool {
        rank >= self.min && rank <= self.max
    }
}

/// Inclusive per-dimension size range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimBounds {
    pub min: usize,
    pub max: usize,
}

impl DimBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub const fn contains(&self, dim: usize) -> bool {
        dim >= self.min && dim <= self.max
    }

    /// Dimension used when the input runs out: `1`, moved into range.
    pub const fn fallback(&self) -> usize {
        if 1 < self.min {
            self.min
        } else if 1 > self.max {
            self.max
        } else {
            1
        }
    }
}

/// Limits applied to every decoded tensor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeLimits {
    pub rank: RankBounds,
    pub dims: DimBounds,
    pub max_elements: usize,
}

impl ShapeLimits {
    pub const DEFAULT: ShapeLimits = ShapeLimits {
        rank: RankBounds::new(0, 6),
        dims: DimBounds::new(1, 20),
        max_elements: 262_144,
    };

    pub const fn with_rank(self, rank: RankBounds) -> Self {
        Self { rank, ..self }
    }

    pub const fn with_dims(self, dims: DimBounds) -> Self {
        Self { dims, ..self }
    }

    pub const fn with_max_elements(self, max_elements: usize) -> Self {
        Self { max_elements, ..self }
    }
}

impl Default for ShapeLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// `byte % (max - min + 1) + min`.
pub fn decode_rank(byte: u8, bounds: RankBounds) -> usize {
    reduce_into_range(i64::from(byte), bounds.min as i64, bounds.max as i64) as usize
}

/// One `i64` per dimension reduced into `dims`. Dimensions past the end of
/// the input take [`DimBounds::fallback`].
pub fn decode_shape(cursor: &mut ByteCursor<'_>, rank: usize, dims: DimBounds) -> Shape {
    let values = (0..rank)
        .map(|_| match cursor.try_consume::<i64>() {
            Some(raw) => reduce_into_range(raw, dims.min as i64, dims.max as i64) as usize,
            None => dims.fallback(),
        })
        .collect();
    Shape(values)
}

/// Returns the element count of `shape` if it fits in `limit`.
pub fn check_element_budget(shape: &Shape, limit: usize) -> Result<usize, ShapeError> {
    let count = shape
        .element_count()
        .ok_or_else(|| ShapeError::ElementCountOverflow { shape: shape.clone() })?;
    if count > limit {
        return Err(ShapeError::ElementBudgetExceeded { shape: shape.clone(), count, limit });
    }
    Ok(count)
}

/// Fixed, ordered list of element types an operator family supports.
#[derive(Debug, Clone, Copy)]
pub struct TypeTable<T: 'static> {
    types: &'static [T],
}

impl<T: Copy + 'static> TypeTable<T> {
    /// Panics (at compile time, when used in a `const`) on an empty list.
    pub const fn new(types: &'static [T]) -> Self {
        assert!(!types.is_empty(), "type table must not be empty");
        Self { types }
    }

    pub const fn len(&self) -> usize {
        self.types.len()
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    pub const fn as_slice(&self) -> &'static [T] {
        self.types
    }

    pub fn first(&self) -> T {
        self.types[0]
    }
}

impl<T: Copy + PartialEq + 'static> TypeTable<T> {
    pub fn contains(&self, ty: T) -> bool {
        self.types.contains(&ty)
    }
}

/// `table[selector % table.len()]`.
pub fn decode_element_type<T: Copy>(selector: u8, table: &TypeTable<T>) -> T {
    table.types[usize::from(selector) % table.types.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: TypeTable<u8> = TypeTable::new(&[10, 20, 30]);

    #[test]
    fn element_type_wraps() {
        assert_eq!(decode_element_type(0, &SMALL), 10);
        assert_eq!(decode_element_type(4, &SMALL), 20);
        assert_eq!(decode_element_type(255, &SMALL), 10);
    }

    #[test]
    fn rank_uses_modulo_offset() {
        let bounds = RankBounds::new(2, 4);
        assert_eq!(decode_rank(0, bounds), 2);
        assert_eq!(decode_rank(4, bounds), 3);
        assert_eq!(decode_rank(255, bounds), 2);
        assert_eq!(decode_rank(9, RankBounds::exactly(4)), 4);
    }

    #[test]
    fn shape_falls_back_to_one() {
        let raw = 5i64.to_ne_bytes();
        let mut cursor = ByteCursor::new(&raw);
        let shape = decode_shape(&mut cursor, 3, DimBounds::new(1, 20));
        assert_eq!(shape.dims(), &[6, 1, 1]);
    }

    #[test]
    fn fallback_respects_min() {
        let mut cursor = ByteCursor::new(&[]);
        let shape = decode_shape(&mut cursor, 2, DimBounds::new(3, 8));
        assert_eq!(shape.dims(), &[3, 3]);
        assert_eq!(DimBounds::new(0, 0).fallback(), 0);
    }

    #[test]
    fn budget_check() {
        let shape = Shape::new(vec![20, 20, 20]);
        assert_eq!(check_element_budget(&shape, 8000), Ok(8000));
        assert!(matches!(
            check_element_budget(&shape, 7999),
            Err(ShapeError::ElementBudgetExceeded { count: 8000, limit: 7999, .. })
        ));
        let huge = Shape::new(vec![usize::MAX, 2]);
        assert!(matches!(
            check_element_budget(&huge, usize::MAX),
            Err(ShapeError::ElementCountOverflow { .. })
        ));
        assert_eq!(Shape::scalar().element_count(), Some(1));
    }
}
