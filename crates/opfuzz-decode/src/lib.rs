//! Deterministic decoding of fuzz inputs into operator parameters
//!
//! A [`ByteCursor`] hands out fixed-width values from the input and falls
//! back to defaults once it runs dry, so every byte sequence (the empty one
//! included) decodes to a complete parameter set. [`ParamDecoder`] layers
//! the operator-facing vocabulary on top: element types, ranks, shapes,
//! flags, enum selectors and sanitised numeric parameters.
//!
//! Nothing in this crate depends on the tensor framework.

pub mod cursor;
pub mod options;
pub mod params;
pub mod shape;

pub use cursor::{reduce_into_range, ByteCursor};
pub use options::{DataFormat, Padding, RoundingMode};
pub use params::{ParamDecoder, TensorSpec};
pub use shape::{
    check_element_budget, decode_element_type, decode_rank, decode_shape, DimBounds, RankBounds,
    Shape, ShapeError, ShapeLimits, TypeTable,
};
