//! One module per fuzzed operator. Each documents its input layout at the
//! top; fields are consumed in the listed order.

mod add;
mod bias_add;
mod clamp;
mod concat;
mod conv2d;
mod cumsum;
mod div;
mod gather;
mod leaky_relu;
mod matmul;
mod permute;
mod pooling;
mod reduce_min;
mod reshape;
mod slice;
mod softmax;
mod stack;

pub use add::Add;
pub use bias_add::BiasAdd;
pub use clamp::Clamp;
pub use concat::Concat;
pub use conv2d::Conv2d;
pub use cumsum::Cumsum;
pub use div::Div;
pub use gather::Gather;
pub use leaky_relu::LeakyRelu;
pub use matmul::Matmul;
pub use permute::Permute;
pub use pooling::{AvgPool2d, MaxPool2d};
pub use reduce_min::ReduceMin;
pub use reshape::Reshape;
pub use slice::Slice;
pub use softmax::Softmax;
pub use stack::Stack;
