//! Tensor materialization for opfuzz harnesses
//!
//! Turns decoded shapes and element types into filled host buffers, applies
//! operator-specific sanitizers, hands the storage to candle and inspects
//! what comes back.

pub mod element;
pub mod host;
pub mod inspect;
pub mod materializer;

pub use element::{ElementType, ALL_TYPES, FLOAT_TYPES, INDEX_TYPES};
pub use host::{fallback_value, ElementBuffer, FillReport, HostTensor, Sanitizer};
pub use inspect::{
    broadcast_shape, compare_tensors, matmul_shape, CheckPolicy, Comparison, OutputCheck,
    ShapeMismatch,
};
pub use materializer::{over_budget, TensorMaterializer};
