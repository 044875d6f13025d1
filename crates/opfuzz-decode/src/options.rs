//! Enum selectors shared by several operator families.
//!
//! Each enum carries a fixed `ALL` table; a selector byte picks
//! `ALL[byte % ALL.len()]` through [`ParamDecoder::choice`](crate::ParamDecoder::choice).

use std::fmt;

/// Spatial padding mode of pooling and convolution ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Padding {
    Same,
    Valid,
    Explicit,
}

impl Padding {
    pub const ALL: [Padding; 3] = [Padding::Same, Padding::Valid, Padding::Explicit];

    pub const fn as_str(self) -> &'static str {
        match self {
            Padding::Same => "SAME",
            Padding::Valid => "VALID",
            Padding::Explicit => "EXPLICIT",
        }
    }
}

/// Memory layout of a rank-4 image tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    Nhwc,
    Nchw,
}

impl DataFormat {
    pub const ALL: [DataFormat; 2] = [DataFormat::Nhwc, DataFormat::Nchw];

    pub const fn as_str(self) -> &'static str {
        match self {
            DataFormat::Nhwc => "NHWC",
            DataFormat::Nchw => "NCHW",
        }
    }

    /// Index of the channel dimension in a tensor of `rank` (at least 2).
    /// Channels-last puts it on the final axis at any rank.
    pub const fn channel_axis(self, rank: usize) -> usize {
        match self {
            DataFormat::Nhwc => rank - 1,
            DataFormat::Nchw => 1,
        }
    }
}

/// Rounding applied to a division result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    None,
    Trunc,
    Floor,
}

impl RoundingMode {
    pub const ALL: [RoundingMode; 3] = [RoundingMode::None, RoundingMode::Trunc, RoundingMode::Floor];

    pub const fn as_str(self) -> &'static str {
        match self {
            RoundingMode::None => "none",
            RoundingMode::Trunc => "trunc",
            RoundingMode::Floor => "floor",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Padding, DataFormat, RoundingMode);
