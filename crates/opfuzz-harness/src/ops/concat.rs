//! `concat`: join N tensors along an existing axis.
//!
//! ```text
//! u8      element type (all types)
//! u8      rank, 1..=4
//! i64 xR  base dims, 1..=6
//! u8      tensor count, 2..=4
//! i8      axis
//! u8 xN   size of each input along the axis, 1..=6
//! u8      odd: the last input's element type is decoded from the next byte
//! ..      payloads in order
//! ```

use candle_core::Tensor;
use opfuzz_common::Result;
use opfuzz_decode::{DimBounds, ParamDecoder, RankBounds, Shape, ShapeLimits};
use opfuzz_tensor::{CheckPolicy, OutputCheck, TensorMaterializer, ALL_TYPES};

use crate::harness::{InvokeContext, OperatorHarness};

const LIMITS: ShapeLimits = ShapeLimits::DEFAULT
    .with_rank(RankBounds::new(1, 4))
    .with_dims(DimBounds::new(1, 6));

#[derive(Debug, Clone, Copy)]
pub struct Concat;

impl OperatorHarness for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn min_input_len(&self) -> usize {
        4
    }

    fn check_policy(&self) -> CheckPolicy {
        CheckPolicy::Report
    }

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
        let materializer = TensorMaterializer::new(LIMITS);
        let spec = decoder.tensor_spec(&ALL_TYPES, &LIMITS);
        let count = decoder.size(2, 4);
        let axis = decoder.axis(spec.shape.rank());

        let shapes: Vec<Shape> = (0..count)
            .map(|_| {
                let mut dims = spec.shape.dims().to_vec();
                dims[axis] = decoder.size(1, 6);
                Shape::new(dims)
            })
            .collect();
        let mut types = vec![spec.element_type; count];
        if decoder.flag() {
            types[count - 1] = decoder.element_type(&ALL_TYPES);
        }

        let mut tensors = Vec::with_capacity(count);
        for (shape, &ty) in shapes.iter().zip(&types) {
            let host = materializer.materialize(decoder.cursor_mut(), ty, shape)?;
            tensors.push(host.to_tensor(&ctx.device)?);
        }

        let out = Tensor::cat(&tensors, axis)?;

        let mut expected = spec.shape.dims().to_vec();
        expected[axis] = shapes.iter().map(|s| s.dims()[axis]).sum();
        OutputCheck::new(self.name(), self.check_policy())
            .dtype(&out, spec.element_type.dtype())
            .shape(&out, &expected)
            .finish()
    }
}
