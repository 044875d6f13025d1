//! Budget-checked allocation of host tensors filled from the fuzz input.
//!
//! Every tensor goes through [`TensorMaterializer::materialize`]: the shape is
//! checked against the element budget before anything is allocated, then the
//! buffer is filled from the cursor with the fallback pattern covering any
//! shortfall. Over-budget shapes surface as expected failures.

use opfuzz_common::{ExpectedFailure, HarnessError, Result};
use opfuzz_decode::{
    check_element_budget, ByteCursor, ParamDecoder, Shape, ShapeError, ShapeLimits, TypeTable,
};
use tracing::trace;

use crate::element::ElementType;
use crate::host::{HostTensor, Sanitizer};

/// Allocates and fills host tensors within a shape budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TensorMaterializer {
    pub limits: ShapeLimits,
}

impl TensorMaterializer {
    pub const fn new(limits: ShapeLimits) -> Self {
        Self { limits }
    }

    /// Budget check, allocation and fill from `cursor`.
    pub fn materialize(
        &self,
        cursor: &mut ByteCursor<'_>,
        element_type: ElementType,
        shape: &Shape,
    ) -> Result<HostTensor> {
        check_element_budget(shape, self.limits.max_elements).map_err(over_budget)?;
        let mut tensor = HostTensor::allocate(element_type, shape.clone()).map_err(over_budget)?;
        let report = tensor.fill(cursor);
        trace!(
            %element_type,
            %shape,
            from_input = report.from_input,
            synthesized = report.synthesized,
            "materialized"
        );
        Ok(tensor)
    }

    /// [`materialize`](Self::materialize) followed by `sanitizer`.
    pub fn materialize_sanitized(
        &self,
        cursor: &mut ByteCursor<'_>,
        element_type: ElementType,
        shape: &Shape,
        sanitizer: Sanitizer,
    ) -> Result<HostTensor> {
        let mut tensor = self.materialize(cursor, element_type, shape)?;
        tensor.sanitize(sanitizer);
        Ok(tensor)
    }

    /// Decode a tensor spec from `decoder` and materialize it.
    pub fn decode_tensor(
        &self,
        decoder: &mut ParamDecoder<'_>,
        table: &TypeTable<ElementType>,
    ) -> Result<HostTensor> {
        let spec = decoder.tensor_spec(table, &self.limits);
        self.materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)
    }
}

/// Over-budget shapes are an expected outcome: the input is kept and the
/// operator is never invoked.
pub fn over_budget(err: ShapeError) -> HarnessError {
    let failure = match err {
        ShapeError::ElementBudgetExceeded { count, limit, .. } => {
            ExpectedFailure::ElementBudget { count, limit }
        }
        ShapeError::ElementCountOverflow { .. } => {
            ExpectedFailure::ElementBudget { count: usize::MAX, limit: usize::MAX }
        }
    };
    failure.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ALL_TYPES;
    use opfuzz_common::FailureKind;

    #[test]
    fn over_budget_is_expected() {
        let materializer = TensorMaterializer::new(ShapeLimits::DEFAULT.with_max_elements(10));
        let shape = Shape::new(vec![4, 4]);
        let err = materializer
            .materialize(&mut ByteCursor::new(&[]), ElementType::F32, &shape)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::ExpectedOperationFailure);
    }

    #[test]
    fn decode_tensor_consumes_spec_then_payload() {
        let mut data = vec![1u8, 1];
        data.extend_from_slice(&1i64.to_ne_bytes());
        data.extend_from_slice(&3.0f64.to_ne_bytes());
        let mut decoder = ParamDecoder::new(&data);
        let tensor = TensorMaterializer::default().decode_tensor(&mut decoder, &ALL_TYPES).unwrap();
        assert_eq!(tensor.element_type(), ElementType::F64);
        assert_eq!(tensor.shape().dims(), &[2]);
        assert_eq!(tensor.values_f64(), vec![3.0, 2.0]);
    }
}
