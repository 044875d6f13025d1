//! `gather`: pick slices of a source tensor along one axis by index.
//!
//! ```text
//! u8      element type of source (all types)
//! u8      rank, 1..=4
//! i64 xR  dims, 1..=8
//! i8      axis
//! u8      mode: even `index_select` (1-D indices), odd `gather` (indices
//!         shaped like source with the axis replaced)
//! u8      index type (u32, i64, u8)
//! u8      index count along the axis, 1..=10
//! ..      payload source, payload indices (reduced into the axis length)
//! ```

use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, Shape, ShapeLimits};
use opfuzz_tensor::{
    CheckPolicy, OutputCheck, Sanitizer, TensorMaterializer, ALL_TYPES, INDEX_TYPES,
};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(1, 4))
    .with_dims(DimBounds::new(1, 8));

#[derive(Debug, Clone, Copy)]
pub struct Gather;

impl OperatorHarness for Gather {
    fn name(&self) -> &'static str {
        "gather"
    }

    fn min_input_len(&self) -> usize {
        5
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let materializer = TensorMaterializer::new(LIMITS);
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let axis = decoder.axis(spec.shape.rank());
        let full_gather = decoder.flag();
        let index_type = decoder.element_type(&INDEX_TYPES);
        let count = decoder.size(1, 10);

        let source = materializer
            .materialize(decoder.cursor_mut(), spec.element_type, &spec.shape)?
            .to_tensor(&ctx.device)?;

        let mut expected = spec.shape.dims().to_vec();
        expected[axis] = count;
        let index_shape = if full_gather {
            Shape::new(expected.clone())
        } else {
            Shape::new(vec![count])
        };
        let bound = spec.shape.dims()[axis];
        let indices = materializer
            .materialize_sanitized(
                decoder.cursor_mut(),
                index_type,
                &index_shape,
                Sanitizer::IndexRange { bound },
            )?
            .to_tensor(&ctx.device)?;

        let out = if full_gather {
            source.gather(&indices, axis)?
        } else {
            source.index_select(&indices, axis)?
        };

        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, &expected)
            .finish()
    }
}
