use crate::harness::OperatorHarness;
use crate::ops::*;

static HARNESSES: &[&dyn OperatorHarness] = &[
    &BiasAdd,
    &Cumsum,
    &MaxPool2d,
    &AvgPool2d,
    &Add,
    &Stack,
    &Concat,
    &Matmul,
    &Softmax,
    &Reshape,
    &Slice,
    &Conv2d,
    &Div,
    &Clamp,
    &Gather,
    &LeakyRelu,
    &ReduceMin,
    &Permute,
];

/// Every registered harness, in a stable order.
pub fn all() -> &'static [&'static dyn OperatorHarness] {
    HARNESSES
}

/// Harness registered under `name`.
pub fn find(name: &str) -> Option<&'static dyn OperatorHarness> {
    HARNESSES.iter().copied().find(|h| h.name() == name)
}

/// Registered names, in registry order.
pub fn names() -> impl Iterator<Item = &'static str> {
    HARNESSES.iter().map(|h| h.name())
}
