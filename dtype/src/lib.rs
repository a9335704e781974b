//! Scalar element types for tensor buffers.
//!
//! Every buffer and scalar expression in the lowered IR carries a [`DType`].
//! The analysis layers only ever ask two questions of a type: how many bytes
//! one element occupies, and whether arithmetic on it is floating-point.


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::VariantArray, strum::FromRepr)]
pub enum DType {
    Bool = 0,

    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,

    UInt8 = 5,
    UInt16 = 6,
    UInt32 = 7,
    UInt64 = 8,

    Float16 = 9,
    BFloat16 = 10,
    Float32 = 11,
    Float64 = 12,

    /// Void type for metadata-only nodes (no data).
    Void = 13,
}

impl DType {
    /// Size of a single element in bytes.
    pub const fn bytes(&self) -> i64 {
        match self {
            Self::Bool => 1,
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 => 4,
            Self::Int64 => 8,
            Self::UInt8 => 1,
            Self::UInt16 => 2,
            Self::UInt32 => 4,
            Self::UInt64 => 8,
            Self::Float16 => 2,
            Self::BFloat16 => 2,
            Self::Float32 => 4,
            Self::Float64 => 8,
            Self::Void => 0,
        }
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub const fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64)
    }

    /// Inclusive value range representable by an integer type, if bounded.
    ///
    /// `UInt64` maxes out above `i64::MAX` and is reported saturated.
    pub const fn int_bounds(&self) -> Option<(i64, i64)> {
        match self {
            Self::Bool => Some((0, 1)),
            Self::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            Self::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::Int64 => Some((i64::MIN, i64::MAX)),
            Self::UInt8 => Some((0, u8::MAX as i64)),
            Self::UInt16 => Some((0, u16::MAX as i64)),
            Self::UInt32 => Some((0, u32::MAX as i64)),
            Self::UInt64 => Some((0, i64::MAX)),
            _ => None,
        }
    }
}
