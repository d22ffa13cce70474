use rand::Rng;

use crate::{
    containers::{PropertyStorage, TypedSliceMut},
    layout::{DataType, FloatType},
    math::BitMask,
};

/// Creates a storage where the `k`-th stored value (counting padding values between elements) equals `k`. For a
/// tightly packed storage, component `j` of element `i` thus holds `i * component_count + j`
pub(crate) fn sequential_storage(
    name: &str,
    count: usize,
    data_type: DataType,
    component_count: usize,
) -> PropertyStorage {
    sequential_storage_with_stride(name, count, data_type, component_count, 0)
}

pub(crate) fn sequential_storage_with_stride(
    name: &str,
    count: usize,
    data_type: DataType,
    component_count: usize,
    stride: usize,
) -> PropertyStorage {
    let mut storage = PropertyStorage::new(count, data_type, component_count, stride, name)
        .expect("Invalid test storage layout");
    match storage.as_typed_slice_mut() {
        TypedSliceMut::Int32(values) => values
            .iter_mut()
            .enumerate()
            .for_each(|(index, value)| *value = index as i32),
        TypedSliceMut::Int64(values) => values
            .iter_mut()
            .enumerate()
            .for_each(|(index, value)| *value = index as i64),
        TypedSliceMut::Float(values) => values
            .iter_mut()
            .enumerate()
            .for_each(|(index, value)| *value = index as FloatType),
    }
    storage
}

pub(crate) fn random_storage<R: Rng>(
    rng: &mut R,
    name: &str,
    count: usize,
    data_type: DataType,
    component_count: usize,
    stride: usize,
) -> PropertyStorage {
    let mut storage = PropertyStorage::new(count, data_type, component_count, stride, name)
        .expect("Invalid test storage layout");
    match storage.as_typed_slice_mut() {
        TypedSliceMut::Int32(values) => values
            .iter_mut()
            .for_each(|value| *value = rng.gen_range(-1000..1000)),
        TypedSliceMut::Int64(values) => values
            .iter_mut()
            .for_each(|value| *value = rng.gen_range(-1_000_000..1_000_000)),
        TypedSliceMut::Float(values) => values.iter_mut().for_each(|value| *value = rng.gen()),
    }
    storage
}

pub(crate) fn random_mask<R: Rng>(rng: &mut R, len: usize) -> BitMask {
    (0..len).map(|_| rng.gen_bool(0.4)).collect()
}
