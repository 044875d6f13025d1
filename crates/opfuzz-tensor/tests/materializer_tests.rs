//! Materialization scenarios and fill invariants.

use candle_core::Device;
use opfuzz_decode::{ByteCursor, ParamDecoder, Shape, ShapeLimits};
use opfuzz_tensor::{ElementType, HostTensor, Sanitizer, TensorMaterializer, ALL_TYPES};
use proptest::prelude::*;

/// Pre-fill value that is representable in `ty` and that neither a constant
/// 0x00/0xFF input nor the fallback pattern can produce.
fn sentinel(ty: ElementType) -> f64 {
    if ty.is_float() {
        -77.0
    } else {
        77.0
    }
}

#[test]
fn short_payload_tail_uses_pattern() {
    // selector 0 (f32), rank byte 2, dims [3, 4], then two and a half elements.
    let mut data = vec![0u8, 2];
    data.extend_from_slice(&2i64.to_ne_bytes());
    data.extend_from_slice(&3i64.to_ne_bytes());
    data.extend_from_slice(&10.0f32.to_ne_bytes());
    data.extend_from_slice(&20.0f32.to_ne_bytes());
    data.extend_from_slice(&[0xAB, 0xCD]);

    let mut decoder = ParamDecoder::new(&data);
    let tensor = TensorMaterializer::default().decode_tensor(&mut decoder, &ALL_TYPES).unwrap();
    assert_eq!(tensor.element_type(), ElementType::F32);
    assert_eq!(tensor.shape().dims(), &[3, 4]);

    let values = tensor.values_f64();
    assert_eq!(values.len(), 12);
    assert_eq!(&values[..2], &[10.0, 20.0]);
    for (index, &v) in values.iter().enumerate().skip(2) {
        assert_eq!(v, ((index + 1) % 100) as f64, "element {index}");
    }

    let t = tensor.to_tensor(&Device::Cpu).unwrap();
    assert_eq!(t.dims(), &[3, 4]);
}

#[test]
fn empty_input_materializes_a_scalar_of_the_first_type() {
    let mut decoder = ParamDecoder::new(&[]);
    let tensor = TensorMaterializer::default().decode_tensor(&mut decoder, &ALL_TYPES).unwrap();
    assert_eq!(tensor.element_type(), ALL_TYPES.first());
    assert!(tensor.shape().dims().is_empty());
    assert_eq!(tensor.values_f64(), vec![1.0]);
}

#[test]
fn every_short_length_fills_completely() {
    for len in 0..=64usize {
        for fill in [0x00u8, 0xff] {
            let data = vec![fill; len];
            for &ty in ALL_TYPES.as_slice() {
                let sentinel = sentinel(ty);
                let mut tensor = HostTensor::splat(ty, Shape::new(vec![3, 5]), sentinel).unwrap();
                assert!(tensor.values_f64().iter().all(|&v| v == sentinel), "{ty}");

                let mut cursor = ByteCursor::new(&data);
                let report = tensor.fill(&mut cursor);
                assert_eq!(report.total(), 15);
                assert!(cursor.offset() <= len);

                for (index, &v) in tensor.values_f64().iter().enumerate() {
                    assert_ne!(v, sentinel, "{ty} fill {fill:#04x} len {len} element {index}");
                    if index >= report.from_input {
                        let expected = ((index + 1) % 100) as f64;
                        assert_eq!(v, expected, "{ty} len {len} element {index}");
                    }
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn fill_report_partitions_elements(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        selector in 0usize..7,
        dims in proptest::collection::vec(1usize..6, 0..4),
    ) {
        let ty = ALL_TYPES.as_slice()[selector];
        let shape = Shape::new(dims);
        let count = shape.element_count().unwrap();
        let mut tensor = HostTensor::allocate(ty, shape).unwrap();
        let report = tensor.fill(&mut ByteCursor::new(&data));
        prop_assert_eq!(report.total(), count);
        prop_assert_eq!(report.from_input, (data.len() / ty.size_in_bytes()).min(count));
    }

    #[test]
    fn index_sanitizer_bounds_every_element(
        data in proptest::collection::vec(any::<u8>(), 0..128),
        bound in 1usize..32,
    ) {
        let mut tensor = HostTensor::allocate(ElementType::I64, Shape::new(vec![8])).unwrap();
        tensor.fill(&mut ByteCursor::new(&data));
        tensor.sanitize(Sanitizer::IndexRange { bound });
        for v in tensor.values_f64() {
            prop_assert!(v >= 0.0 && v < bound as f64);
        }
    }
}

#[test]
fn over_budget_shape_is_rejected_before_allocation() {
    let materializer = TensorMaterializer::new(ShapeLimits::DEFAULT.with_max_elements(100));
    let result = materializer.materialize(
        &mut ByteCursor::new(&[]),
        ElementType::F64,
        &Shape::new(vec![20, 20]),
    );
    assert!(result.is_err());
}
