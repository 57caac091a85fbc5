use std::str::FromStr;

use inf::cast;

use crate::Error;

/// Pixel data type of a raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ArrayDataType {
    Int8 = 0,
    Uint8 = 1,
    Int16 = 2,
    Uint16 = 3,
    Int32 = 4,
    Uint32 = 5,
    Int64 = 6,
    Uint64 = 7,
    Float32 = 8,
    Float64 = 9,
}

impl ArrayDataType {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// The value a pixel holds after storing `value` in a band of this type.
    /// Returns `None` if the value can not be represented (out of range, or NaN for integral types).
    pub fn cast_value(&self, value: f64) -> Option<f64> {
        match self {
            Self::Int8 => cast::store_as::<i8>(value),
            Self::Uint8 => cast::store_as::<u8>(value),
            Self::Int16 => cast::store_as::<i16>(value),
            Self::Uint16 => cast::store_as::<u16>(value),
            Self::Int32 => cast::store_as::<i32>(value),
            Self::Uint32 => cast::store_as::<u32>(value),
            Self::Int64 => cast::store_as::<i64>(value),
            Self::Uint64 => cast::store_as::<u64>(value),
            Self::Float32 => {
                if value.is_finite() && value.abs() > f32::MAX as f64 {
                    None
                } else {
                    Some(value as f32 as f64)
                }
            }
            Self::Float64 => Some(value),
        }
    }

    /// True if the value survives being stored in this type unchanged, which is required for nodata values.
    pub fn can_represent(&self, value: f64) -> bool {
        if value.is_nan() {
            return self.is_floating_point();
        }

        self.cast_value(value) == Some(value)
    }
}

impl std::fmt::Display for ArrayDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for ArrayDataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "int8" => Self::Int8,
            "uint8" | "byte" => Self::Uint8,
            "int16" => Self::Int16,
            "uint16" => Self::Uint16,
            "int32" => Self::Int32,
            "uint32" => Self::Uint32,
            "int64" => Self::Int64,
            "uint64" => Self::Uint64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            _ => return Err(Error::InvalidArgument(format!("Unsupported data type: '{s}'"))),
        })
    }
}
