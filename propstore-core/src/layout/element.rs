use nalgebra::{Matrix3, Point2, Point3, Scalar, Vector2, Vector3, Vector4};
use static_assertions::const_assert;

use super::{DataType, FloatType, PrimitiveType};

/// Trait for types that can be used as the element type of a flat property view. Each implementor maps to a fixed
/// primitive component type and a fixed number of components, so that e.g. a `Vector3<FloatType>` can view a
/// `Float` property with three components.
///
/// The size of an implementor must equal `COMPONENT_COUNT * size_of::<Self::Component>()`, as flat views require the
/// stride of the viewed storage to match the size of the element type exactly
pub trait PropertyElement: bytemuck::Pod {
    /// The primitive type of a single component
    type Component: PrimitiveType;
    /// The number of components that one element consists of
    const COMPONENT_COUNT: usize;

    fn data_type() -> DataType {
        Self::Component::DATA_TYPE
    }
}

macro_rules! impl_property_element_for_primitive {
    ($type:ty) => {
        impl PropertyElement for $type {
            type Component = $type;
            const COMPONENT_COUNT: usize = 1;
        }
    };
}

impl_property_element_for_primitive! {i32}
impl_property_element_for_primitive! {i64}
impl_property_element_for_primitive! {FloatType}

macro_rules! impl_property_element_for_array {
    ($($count:literal),*) => {
        $(
            impl<T: PrimitiveType> PropertyElement for [T; $count] {
                type Component = T;
                const COMPONENT_COUNT: usize = $count;
            }
        )*
    };
}

impl_property_element_for_array! {1, 2, 3, 4, 6, 9}

macro_rules! impl_property_element_for_matrix {
    ($type:ident, $count:literal) => {
        impl<T: PrimitiveType + Scalar> PropertyElement for $type<T>
        where
            $type<T>: bytemuck::Pod,
        {
            type Component = T;
            const COMPONENT_COUNT: usize = $count;
        }
    };
}

impl_property_element_for_matrix! {Vector2, 2}
impl_property_element_for_matrix! {Vector3, 3}
impl_property_element_for_matrix! {Vector4, 4}
impl_property_element_for_matrix! {Matrix3, 9}
impl_property_element_for_matrix! {Point2, 2}
impl_property_element_for_matrix! {Point3, 3}

// Flat views reinterpret the raw bytes as these types, so they must be tightly packed on the target machine
const_assert!(std::mem::size_of::<Vector3<FloatType>>() == 3 * std::mem::size_of::<FloatType>());
const_assert!(std::mem::size_of::<Vector4<FloatType>>() == 4 * std::mem::size_of::<FloatType>());
const_assert!(std::mem::size_of::<Vector3<i32>>() == 12);
const_assert!(std::mem::size_of::<Matrix3<FloatType>>() == 9 * std::mem::size_of::<FloatType>());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_shapes() {
        assert_eq!(<Vector3<FloatType>>::data_type(), DataType::Float);
        assert_eq!(<Vector3<FloatType>>::COMPONENT_COUNT, 3);
        assert_eq!(<Point3<i32>>::data_type(), DataType::Int32);
        assert_eq!(<Point2<FloatType>>::COMPONENT_COUNT, 2);
        assert_eq!(<[i64; 2]>::data_type(), DataType::Int64);
        assert_eq!(<Matrix3<FloatType>>::COMPONENT_COUNT, 9);
        assert_eq!(<i32>::COMPONENT_COUNT, 1);
    }
}
