use std::fmt::{self, Display};

use num_traits::AsPrimitive;
use static_assertions::const_assert;

use crate::error::{PropertyError, Result};

/// The floating-point type used for all `DataType::Float` properties. The width is a global build-time choice,
/// controlled by the `float32` feature of this crate.
#[cfg(not(feature = "float32"))]
pub type FloatType = f64;
/// The floating-point type used for all `DataType::Float` properties. The width is a global build-time choice,
/// controlled by the `float32` feature of this crate.
#[cfg(feature = "float32")]
pub type FloatType = f32;

const_assert!(
    std::mem::size_of::<FloatType>() == 4 || std::mem::size_of::<FloatType>() == 8
);

/// Primitive data types that a property storage can hold
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Int32,
    Int64,
    Float,
}

impl DataType {
    /// All supported data types
    pub const ALL: [DataType; 3] = [DataType::Int32, DataType::Int64, DataType::Float];

    /// Size of a single component of this data type in bytes
    /// ```
    /// # use propstore_core::layout::*;
    /// assert_eq!(DataType::Int32.size(), 4);
    /// assert_eq!(DataType::Int64.size(), 8);
    /// assert_eq!(DataType::Float.size(), std::mem::size_of::<FloatType>());
    /// ```
    pub fn size(&self) -> usize {
        match self {
            DataType::Int32 => std::mem::size_of::<i32>(),
            DataType::Int64 => std::mem::size_of::<i64>(),
            DataType::Float => std::mem::size_of::<FloatType>(),
        }
    }

    /// Canonical name of the Rust type backing this data type. This is the identifier that is written to
    /// persisted streams
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Int32 => std::any::type_name::<i32>(),
            DataType::Int64 => std::any::type_name::<i64>(),
            DataType::Float => std::any::type_name::<FloatType>(),
        }
    }

    /// Resolves a canonical type name (as returned by `type_name`) back to a `DataType`. Only the floating-point
    /// width of the running build is accepted for `DataType::Float`
    /// ```
    /// # use propstore_core::layout::*;
    /// assert_eq!(DataType::from_type_name("i64").unwrap(), DataType::Int64);
    /// assert!(DataType::from_type_name("u8").is_err());
    /// ```
    pub fn from_type_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|data_type| data_type.type_name() == name)
            .ok_or_else(|| PropertyError::DataTypeUnsupported(name.to_owned()))
    }

    pub fn is_float(&self) -> bool {
        *self == DataType::Float
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int32 => write!(f, "Int32"),
            DataType::Int64 => write!(f, "Int64"),
            DataType::Float => write!(f, "Float"),
        }
    }
}

/// Trait for the three primitive component types a storage can hold: `i32`, `i64` and `FloatType`
pub trait PrimitiveType:
    bytemuck::Pod
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + Send
    + Sync
    + AsPrimitive<f64>
    + 'static
{
    /// The `DataType` that values of this type are stored as
    const DATA_TYPE: DataType;
}

impl PrimitiveType for i32 {
    const DATA_TYPE: DataType = DataType::Int32;
}

impl PrimitiveType for i64 {
    const DATA_TYPE: DataType = DataType::Int64;
}

impl PrimitiveType for FloatType {
    const DATA_TYPE: DataType = DataType::Float;
}

/// Numeric types that can be read from a storage of any data type through a type-erased view. Implemented for
/// every type that all three primitive types convert into with `as`
pub trait FromStoredValue: Copy + 'static {
    fn from_i32(value: i32) -> Self;
    fn from_i64(value: i64) -> Self;
    fn from_float(value: FloatType) -> Self;
}

impl<U> FromStoredValue for U
where
    U: Copy + 'static,
    i32: AsPrimitive<U>,
    i64: AsPrimitive<U>,
    FloatType: AsPrimitive<U>,
{
    fn from_i32(value: i32) -> Self {
        value.as_()
    }

    fn from_i64(value: i64) -> Self {
        value.as_()
    }

    fn from_float(value: FloatType) -> Self {
        value.as_()
    }
}

/// Numeric types that can be written into a storage of any data type through a type-erased view
pub trait IntoStoredValue: Copy + 'static {
    fn to_i32(self) -> i32;
    fn to_i64(self) -> i64;
    fn to_float(self) -> FloatType;
}

impl<U> IntoStoredValue for U
where
    U: AsPrimitive<i32> + AsPrimitive<i64> + AsPrimitive<FloatType>,
{
    fn to_i32(self) -> i32 {
        <U as AsPrimitive<i32>>::as_(self)
    }

    fn to_i64(self) -> i64 {
        <U as AsPrimitive<i64>>::as_(self)
    }

    fn to_float(self) -> FloatType {
        <U as AsPrimitive<FloatType>>::as_(self)
    }
}
