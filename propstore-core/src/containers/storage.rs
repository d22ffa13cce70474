use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::error::{PropertyError, Result};
use crate::layout::{DataType, FloatType, FromStoredValue, PropertyElement, USER_PROPERTY_TYPE_ID};
use crate::math::BitMask;

use super::PropertyViewMut;

/// Shared, reference-counted handle to a `PropertyStorage`. Cloning the handle shares the storage, mutation goes
/// through `Arc::make_mut` and thus clones the storage on demand if it is shared
pub type PropertyPtr = Arc<PropertyStorage>;

/// Capacity below which `grow` at least doubles the requested size
const GROW_DOUBLING_LIMIT: usize = 1024;
/// Smallest capacity that `grow` ever allocates
const GROW_MIN_CAPACITY: usize = 256;
/// Largest number of vector components of one storage
pub const MAX_COMPONENT_COUNT: usize = u16::MAX as usize;

/// The values of a storage, reinterpreted as a slice of its primitive data type. Contains `size * stride /
/// data_type_size` values, i.e. padding values between elements are included when the stride is larger than the
/// size of one element
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TypedSlice<'a> {
    Int32(&'a [i32]),
    Int64(&'a [i64]),
    Float(&'a [FloatType]),
}

/// Mutable version of `TypedSlice`
#[derive(Debug, PartialEq)]
pub enum TypedSliceMut<'a> {
    Int32(&'a mut [i32]),
    Int64(&'a mut [i64]),
    Float(&'a mut [FloatType]),
}

/// A resizable, contiguous array of elements, where each element consists of `component_count` values of a
/// primitive `DataType`. Consecutive elements are `stride` bytes apart, which may be more than the size of the
/// components of one element.
///
/// Besides its data, a `PropertyStorage` carries a name, optional names for its vector components and a semantic
/// type id (`USER_PROPERTY_TYPE_ID` for user-defined properties), which identifies its role within a container.
///
/// The storage owns its memory exclusively. Sharing between several owners happens through `PropertyPtr`, which
/// clones the storage when a shared instance is about to be mutated.
pub struct PropertyStorage {
    // Backing memory, in words so that every primitive data type can be viewed without alignment issues
    data: Vec<u64>,
    size: usize,
    capacity: usize,
    data_type: DataType,
    stride: usize,
    component_count: usize,
    component_names: Vec<String>,
    type_id: i32,
    name: String,
}

fn word_count(byte_count: usize) -> usize {
    let word_size = std::mem::size_of::<u64>();
    byte_count / word_size + usize::from(byte_count % word_size != 0)
}

fn allocate(element_count: usize, stride: usize) -> Vec<u64> {
    vec![0; word_count(element_count * stride)]
}

impl PropertyStorage {
    /// Creates a new `PropertyStorage` with `element_count` zero-initialized elements. A `stride` of zero requests
    /// tight packing of the elements, i.e. a stride of `data_type.size() * component_count`. Multi-component
    /// storages get their components named `"1"`, `"2"`, ... which can be overridden with `with_component_names`.
    ///
    /// ```
    /// # use propstore_core::containers::*;
    /// # use propstore_core::layout::*;
    /// let storage = PropertyStorage::new(16, DataType::Int32, 3, 0, "Periodic Image").unwrap();
    /// assert_eq!(storage.size(), 16);
    /// assert_eq!(storage.stride(), 12);
    /// assert_eq!(storage.component_names(), &["1", "2", "3"]);
    /// ```
    ///
    /// Fails with `PropertyError::InvalidArgument` if `component_count` is zero or above `MAX_COMPONENT_COUNT`, if
    /// `stride` is too small for one element or not a multiple of the data type size, or if the element bytes would
    /// not fit into the address space
    pub fn new<S: Into<String>>(
        element_count: usize,
        data_type: DataType,
        component_count: usize,
        stride: usize,
        name: S,
    ) -> Result<Self> {
        let name = name.into();
        if component_count == 0 {
            return Err(PropertyError::InvalidArgument(format!(
                "Property '{}' must have at least one vector component",
                name
            )));
        }
        if component_count > MAX_COMPONENT_COUNT {
            return Err(PropertyError::InvalidArgument(format!(
                "Property '{}' has {} vector components, at most {} are supported",
                name, component_count, MAX_COMPONENT_COUNT
            )));
        }
        let data_type_size = data_type.size();
        let element_size = data_type_size.checked_mul(component_count).ok_or_else(|| {
            PropertyError::InvalidArgument(format!(
                "Property '{}' has too many vector components ({})",
                name, component_count
            ))
        })?;
        let stride = if stride == 0 { element_size } else { stride };
        if stride < element_size {
            return Err(PropertyError::InvalidArgument(format!(
                "Stride {} of property '{}' is too small for {} components of type {}",
                stride, name, component_count, data_type
            )));
        }
        if stride % data_type_size != 0 {
            return Err(PropertyError::InvalidArgument(format!(
                "Stride {} of property '{}' is not a multiple of the data type size {}",
                stride, name, data_type_size
            )));
        }

        let component_names = if component_count > 1 {
            (1..=component_count).map(|index| index.to_string()).collect()
        } else {
            vec![]
        };

        let byte_count = element_count.checked_mul(stride).ok_or_else(|| {
            PropertyError::InvalidArgument(format!(
                "Property '{}' with {} elements of {} bytes exceeds the address space",
                name, element_count, stride
            ))
        })?;

        Ok(Self {
            data: vec![0; word_count(byte_count)],
            size: element_count,
            capacity: element_count,
            data_type,
            stride,
            component_count,
            component_names,
            type_id: USER_PROPERTY_TYPE_ID,
            name,
        })
    }

    /// Sets the semantic type id of this storage
    pub fn with_type_id(mut self, type_id: i32) -> Self {
        self.type_id = type_id;
        self
    }

    /// Sets the names of the vector components. Surplus names are dropped, missing names of multi-component
    /// storages are filled with the 1-based component index
    pub fn with_component_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = names
            .into_iter()
            .take(self.component_count)
            .map(Into::into)
            .collect::<Vec<String>>();
        if self.component_count > 1 {
            for index in names.len()..self.component_count {
                names.push((index + 1).to_string());
            }
        }
        self.component_names = names;
        self
    }

    /// Creates an empty storage with the same metadata as `self` and `element_count` zero-initialized elements
    pub fn new_like(&self, element_count: usize) -> Self {
        Self {
            data: allocate(element_count, self.stride),
            size: element_count,
            capacity: element_count,
            data_type: self.data_type,
            stride: self.stride,
            component_count: self.component_count,
            component_names: self.component_names.clone(),
            type_id: self.type_id,
            name: self.name.clone(),
        }
    }

    /// Number of elements
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of elements that fit into the currently allocated memory
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Size of a single component in bytes
    pub fn data_type_size(&self) -> usize {
        self.data_type.size()
    }

    /// Distance between two consecutive elements in bytes
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Names of the vector components. Empty for most single-component storages
    pub fn component_names(&self) -> &[String] {
        &self.component_names
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// The semantic type id, `USER_PROPERTY_TYPE_ID` for user-defined properties
    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    pub fn set_type_id(&mut self, type_id: i32) {
        self.type_id = type_id;
    }

    /// The raw bytes of all `size()` elements
    pub fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.data)[..self.size * self.stride]
    }

    /// Mutable version of `bytes`
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let len = self.size * self.stride;
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.data)[..len]
    }

    /// The raw bytes of the element at `index`
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds
    pub fn element_bytes(&self, index: usize) -> &[u8] {
        assert!(index < self.size, "Element index {} out of bounds", index);
        &self.bytes()[index * self.stride..(index + 1) * self.stride]
    }

    /// Mutable version of `element_bytes`
    pub fn element_bytes_mut(&mut self, index: usize) -> &mut [u8] {
        assert!(index < self.size, "Element index {} out of bounds", index);
        let stride = self.stride;
        &mut self.bytes_mut()[index * stride..(index + 1) * stride]
    }

    /// All values of this storage as a slice of its primitive data type
    pub fn as_typed_slice(&self) -> TypedSlice<'_> {
        let bytes = self.bytes();
        match self.data_type {
            DataType::Int32 => TypedSlice::Int32(bytemuck::cast_slice(bytes)),
            DataType::Int64 => TypedSlice::Int64(bytemuck::cast_slice(bytes)),
            DataType::Float => TypedSlice::Float(bytemuck::cast_slice(bytes)),
        }
    }

    /// Mutable version of `as_typed_slice`
    pub fn as_typed_slice_mut(&mut self) -> TypedSliceMut<'_> {
        let data_type = self.data_type;
        let bytes = self.bytes_mut();
        match data_type {
            DataType::Int32 => TypedSliceMut::Int32(bytemuck::cast_slice_mut(bytes)),
            DataType::Int64 => TypedSliceMut::Int64(bytemuck::cast_slice_mut(bytes)),
            DataType::Float => TypedSliceMut::Float(bytemuck::cast_slice_mut(bytes)),
        }
    }

    /// Sets the number of elements to `new_size`. With `preserve_data`, the first `min(size, new_size)` elements
    /// keep their values and new elements are zero-filled. Without it, the content is unspecified afterwards.
    ///
    /// Memory is only reallocated if `new_size` exceeds the capacity or drops below 3/4 of it, so that repeated small
    /// resizes do not reallocate every time
    pub fn resize(&mut self, new_size: usize, preserve_data: bool) {
        if new_size > self.capacity || new_size < self.capacity * 3 / 4 || self.data.is_empty() {
            trace!(
                "Reallocating property '{}' from capacity {} to {}",
                self.name,
                self.capacity,
                new_size
            );
            let mut new_data = allocate(new_size, self.stride);
            if preserve_data {
                let preserved_bytes = self.size.min(new_size) * self.stride;
                bytemuck::cast_slice_mut::<u64, u8>(&mut new_data)[..preserved_bytes]
                    .copy_from_slice(&self.bytes()[..preserved_bytes]);
            }
            self.data = new_data;
            self.capacity = new_size;
        } else if preserve_data && new_size > self.size {
            let stride = self.stride;
            let old_end = self.size * stride;
            bytemuck::cast_slice_mut::<u64, u8>(&mut self.data)[old_end..new_size * stride]
                .fill(0);
        }
        self.size = new_size;
    }

    /// Appends `count` elements without initializing them. If the capacity does not suffice, the capacity grows to
    /// `max(2 * new_size, 256)` for small storages and to `1.5 * new_size` from 1024 elements on. Returns whether
    /// memory was reallocated
    pub fn grow(&mut self, count: usize) -> bool {
        let new_size = self.size + count;
        let needs_reallocation = new_size > self.capacity;
        if needs_reallocation {
            let new_capacity = if new_size < GROW_DOUBLING_LIMIT {
                (new_size * 2).max(GROW_MIN_CAPACITY)
            } else {
                new_size * 3 / 2
            };
            trace!(
                "Growing property '{}' from capacity {} to {}",
                self.name,
                self.capacity,
                new_capacity
            );
            let mut new_data = allocate(new_capacity, self.stride);
            let old_bytes = self.bytes();
            bytemuck::cast_slice_mut::<u64, u8>(&mut new_data)[..old_bytes.len()]
                .copy_from_slice(old_bytes);
            self.data = new_data;
            self.capacity = new_capacity;
        }
        self.size = new_size;
        needs_reallocation
    }

    /// Removes the last `count` elements without releasing memory
    ///
    /// # Panics
    ///
    /// If `count` is larger than `size()`
    pub fn truncate(&mut self, count: usize) {
        assert!(
            count <= self.size,
            "Cannot truncate {} elements from property '{}' with {} elements",
            count,
            self.name,
            self.size
        );
        self.size -= count;
    }

    /// Removes all elements whose bit in `mask` is set. Survivors keep their relative order. Fails with
    /// `PropertyError::PreconditionViolation` if the length of `mask` differs from `size()`
    pub fn filter_resize(&mut self, mask: &BitMask) -> Result<()> {
        self.check_mask(mask)?;
        if !mask.any() {
            return Ok(());
        }
        let stride = self.stride;
        let bytes = self.bytes_mut();
        let mut survivors = 0;
        for index in mask.iter_zeros() {
            if index != survivors {
                bytes.copy_within(index * stride..(index + 1) * stride, survivors * stride);
            }
            survivors += 1;
        }
        self.size = survivors;
        Ok(())
    }

    /// Like `filter_resize`, but returns the surviving elements in a new storage and leaves `self` untouched
    pub fn filter_copy(&self, mask: &BitMask) -> Result<Self> {
        self.check_mask(mask)?;
        let stride = self.stride;
        let mut filtered = self.new_like(mask.count_zeros());
        let source = self.bytes();
        for (target, index) in filtered
            .bytes_mut()
            .chunks_exact_mut(stride)
            .zip(mask.iter_zeros())
        {
            target.copy_from_slice(&source[index * stride..(index + 1) * stride]);
        }
        Ok(filtered)
    }

    fn check_mask(&self, mask: &BitMask) -> Result<()> {
        if mask.len() != self.size {
            return Err(PropertyError::mask_length(self.size, mask.len()));
        }
        Ok(())
    }

    fn assert_compatible(&self, other: &PropertyStorage) {
        assert_eq!(
            self.data_type, other.data_type,
            "Data type of property '{}' does not match '{}'",
            self.name, other.name
        );
        assert_eq!(
            self.stride, other.stride,
            "Stride of property '{}' does not match '{}'",
            self.name, other.name
        );
    }

    /// Scatters the elements of `source` into `self`: element `i` of `source` is written to index `mapping[i]`
    ///
    /// # Panics
    ///
    /// If data type or stride of `source` differ from `self`, if `mapping` has a different length than `source`, or if
    /// any target index is out of bounds
    pub fn mapped_copy_from(&mut self, source: &PropertyStorage, mapping: &[usize]) {
        self.assert_compatible(source);
        assert_eq!(
            mapping.len(),
            source.size(),
            "Index mapping must have one entry per source element"
        );
        let stride = self.stride;
        let target = self.bytes_mut();
        for (source_element, &target_index) in source.bytes().chunks_exact(stride).zip(mapping) {
            target[target_index * stride..(target_index + 1) * stride]
                .copy_from_slice(source_element);
        }
    }

    /// Gathers elements of `self` into `destination`: element `i` of `destination` receives element `mapping[i]`
    ///
    /// # Panics
    ///
    /// If data type or stride of `destination` differ from `self`, if `mapping` has a different length than
    /// `destination`, or if any source index is out of bounds
    pub fn mapped_copy_to(&self, destination: &mut PropertyStorage, mapping: &[usize]) {
        self.assert_compatible(destination);
        assert_eq!(
            mapping.len(),
            destination.size(),
            "Index mapping must have one entry per destination element"
        );
        let stride = self.stride;
        let source = self.bytes();
        for (target_element, &source_index) in destination
            .bytes_mut()
            .chunks_exact_mut(stride)
            .zip(mapping)
        {
            target_element
                .copy_from_slice(&source[source_index * stride..(source_index + 1) * stride]);
        }
    }

    /// Copies all elements of `source` into `self`
    ///
    /// # Panics
    ///
    /// If data type, stride or size of `source` differ from `self`
    pub fn copy_from(&mut self, source: &PropertyStorage) {
        self.assert_compatible(source);
        assert_eq!(
            self.size, source.size,
            "Cannot copy {} elements into property '{}' with {} elements",
            source.size, self.name, self.size
        );
        self.bytes_mut().copy_from_slice(source.bytes());
    }

    /// Copies `count` elements of `source`, starting at `source_index`, into `self` starting at `destination_index`
    ///
    /// # Panics
    ///
    /// If data type or stride of `source` differ from `self`, or if either range is out of bounds
    pub fn copy_range_from(
        &mut self,
        source: &PropertyStorage,
        source_index: usize,
        destination_index: usize,
        count: usize,
    ) {
        self.assert_compatible(source);
        assert!(source_index + count <= source.size, "Source range out of bounds");
        assert!(
            destination_index + count <= self.size,
            "Destination range out of bounds"
        );
        let stride = self.stride;
        self.bytes_mut()[destination_index * stride..(destination_index + count) * stride]
            .copy_from_slice(
                &source.bytes()[source_index * stride..(source_index + count) * stride],
            );
    }

    /// Extends this storage to `n` times its current size. With `replicate_values`, the current content is repeated
    /// `n` times, otherwise only the first copy holds the current values and the remaining elements are zero.
    /// Fails with `PropertyError::Overflow` if the new size exceeds `usize`
    ///
    /// # Panics
    ///
    /// If `n` is zero
    pub fn replicate(&mut self, n: usize, replicate_values: bool) -> Result<()> {
        assert!(n >= 1, "Replication factor must be at least one");
        let new_size = self.size.checked_mul(n).ok_or(PropertyError::Overflow {
            count: self.size,
            factor: n,
        })?;
        if n == 1 || self.size == 0 {
            return Ok(());
        }
        let stride = self.stride;
        let old_bytes = self.bytes();
        let mut new_data = allocate(new_size, stride);
        {
            let target = &mut bytemuck::cast_slice_mut::<u64, u8>(&mut new_data)[..new_size * stride];
            if replicate_values {
                for copy in target.chunks_exact_mut(old_bytes.len()) {
                    copy.copy_from_slice(old_bytes);
                }
            } else {
                target[..old_bytes.len()].copy_from_slice(old_bytes);
            }
        }
        self.data = new_data;
        self.size = new_size;
        self.capacity = new_size;
        Ok(())
    }

    /// Sets every element to `value`
    ///
    /// # Panics
    ///
    /// If `T` does not match the data type, component count and stride of this storage
    pub fn fill<T: PropertyElement>(&mut self, value: T) {
        PropertyViewMut::<T, _>::new(self).fill(value);
    }

    /// Sets all bytes of all elements to zero
    pub fn fill_zero(&mut self) {
        self.bytes_mut().fill(0);
    }

    /// Calls `f` with the index and value of the `component`-th component of every element, converted to `U`
    ///
    /// # Panics
    ///
    /// If `component` is out of bounds
    pub fn for_each_component<U: FromStoredValue, F: FnMut(usize, U)>(
        &self,
        component: usize,
        mut f: F,
    ) {
        assert!(
            component < self.component_count,
            "Component index {} out of bounds",
            component
        );
        let step = self.stride / self.data_type_size();
        match self.as_typed_slice() {
            TypedSlice::Int32(values) => values
                .iter()
                .skip(component)
                .step_by(step)
                .enumerate()
                .for_each(|(index, value)| f(index, U::from_i32(*value))),
            TypedSlice::Int64(values) => values
                .iter()
                .skip(component)
                .step_by(step)
                .enumerate()
                .for_each(|(index, value)| f(index, U::from_i64(*value))),
            TypedSlice::Float(values) => values
                .iter()
                .skip(component)
                .step_by(step)
                .enumerate()
                .for_each(|(index, value)| f(index, U::from_float(*value))),
        }
    }

    /// Collects the `component`-th component of every element, converted to `U`
    pub fn copy_component_to<U: FromStoredValue>(&self, component: usize) -> Vec<U> {
        let mut values = Vec::with_capacity(self.size);
        self.for_each_component(component, |_, value: U| values.push(value));
        values
    }
}

impl Clone for PropertyStorage {
    /// The clone only allocates memory for `size()` elements, regardless of the capacity of `self`
    fn clone(&self) -> Self {
        let mut clone = self.new_like(self.size);
        clone.bytes_mut().copy_from_slice(self.bytes());
        clone
    }
}

impl PartialEq for PropertyStorage {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.type_id == other.type_id
            && self.data_type == other.data_type
            && self.stride == other.stride
            && self.component_count == other.component_count
            && self.component_names == other.component_names
            && self.bytes() == other.bytes()
    }
}

impl fmt::Debug for PropertyStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyStorage")
            .field("name", &self.name)
            .field("type_id", &self.type_id)
            .field("data_type", &self.data_type)
            .field("component_count", &self.component_count)
            .field("component_names", &self.component_names)
            .field("stride", &self.stride)
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::thread_rng;

    fn int_values(storage: &PropertyStorage) -> Vec<i32> {
        storage.copy_component_to::<i32>(0)
    }

    #[test]
    fn test_new_validates_layout() {
        assert!(matches!(
            PropertyStorage::new(1, DataType::Float, 0, 0, "A"),
            Err(PropertyError::InvalidArgument(_))
        ));
        assert!(matches!(
            PropertyStorage::new(1, DataType::Int32, 3, 8, "A"),
            Err(PropertyError::InvalidArgument(_))
        ));
        assert!(matches!(
            PropertyStorage::new(1, DataType::Int64, 1, 12, "A"),
            Err(PropertyError::InvalidArgument(_))
        ));

        let padded = PropertyStorage::new(4, DataType::Int32, 3, 16, "A").unwrap();
        assert_eq!(padded.stride(), 16);
        assert_eq!(padded.bytes().len(), 64);
        assert!(padded.bytes().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn test_new_rejects_oversized_layouts() {
        assert!(matches!(
            PropertyStorage::new(0, DataType::Int32, usize::MAX / 2, 4, "A"),
            Err(PropertyError::InvalidArgument(_))
        ));
        assert!(matches!(
            PropertyStorage::new(0, DataType::Int64, MAX_COMPONENT_COUNT + 1, 0, "A"),
            Err(PropertyError::InvalidArgument(_))
        ));
        assert!(PropertyStorage::new(0, DataType::Int64, MAX_COMPONENT_COUNT, 0, "A").is_ok());
        assert!(matches!(
            PropertyStorage::new(usize::MAX / 2, DataType::Int64, 1, 0, "A"),
            Err(PropertyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_component_names() {
        let storage = PropertyStorage::new(0, DataType::Float, 3, 0, "Color")
            .unwrap()
            .with_component_names(vec!["R"]);
        assert_eq!(storage.component_names(), &["R", "2", "3"]);

        let scalar = PropertyStorage::new(0, DataType::Float, 1, 0, "Mass").unwrap();
        assert!(scalar.component_names().is_empty());
    }

    #[test]
    fn test_resize_preserves_data() {
        let count = 20;
        let mut storage = sequential_storage("A", count, DataType::Int32, 1);

        storage.resize(count + 5, true);
        let values = int_values(&storage);
        assert_eq!(&values[..count], &(0..count as i32).collect::<Vec<_>>()[..]);
        assert_eq!(&values[count..], &[0; 5]);

        storage.resize(count - 3, true);
        assert_eq!(storage.size(), count - 3);
        assert_eq!(
            int_values(&storage),
            (0..(count - 3) as i32).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_resize_zero_fills_within_capacity() {
        let mut storage = sequential_storage("A", 100, DataType::Int64, 2);
        // Shrinking to 80% of the capacity keeps the allocation, so stale values remain behind the end
        storage.resize(80, true);
        assert_eq!(storage.capacity(), 100);
        storage.resize(100, true);
        assert_eq!(storage.capacity(), 100);
        let values = storage.copy_component_to::<i64>(1);
        assert_eq!(values[79], 159);
        assert!(values[80..].iter().all(|value| *value == 0));
    }

    #[test]
    fn test_resize_hysteresis() {
        let mut storage = sequential_storage("A", 100, DataType::Float, 1);
        storage.resize(76, true);
        assert_eq!(storage.capacity(), 100);
        storage.resize(74, true);
        assert_eq!(storage.capacity(), 74);
        storage.resize(75, true);
        assert_eq!(storage.capacity(), 75);
    }

    #[test]
    fn test_grow_capacity_policy() {
        let mut storage = PropertyStorage::new(0, DataType::Int32, 1, 0, "A").unwrap();
        assert!(storage.grow(10));
        assert_eq!(storage.capacity(), 256);
        assert!(!storage.grow(200));
        assert_eq!(storage.size(), 210);
        assert!(storage.grow(100));
        assert_eq!(storage.capacity(), 620);
        assert!(storage.grow(1000));
        assert_eq!(storage.capacity(), 1965);
    }

    #[test]
    fn test_grow_keeps_values() {
        let mut storage = sequential_storage("A", 300, DataType::Int32, 1);
        storage.grow(1000);
        assert_eq!(storage.size(), 1300);
        assert_eq!(
            &int_values(&storage)[..300],
            &(0..300).collect::<Vec<_>>()[..]
        );
    }

    #[test]
    fn test_truncate() {
        let mut storage = sequential_storage("A", 10, DataType::Int32, 1);
        storage.truncate(4);
        assert_eq!(storage.size(), 6);
        assert_eq!(storage.capacity(), 10);
        assert_eq!(int_values(&storage), (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_filter_resize_random() {
        let mut rng = thread_rng();
        for data_type in DataType::ALL.iter() {
            for component_count in 1..=3 {
                let original = random_storage(&mut rng, "A", 517, *data_type, component_count, 0);
                let mask = random_mask(&mut rng, original.size());

                let mut filtered = original.clone();
                filtered.filter_resize(&mask).unwrap();

                assert_eq!(filtered.size(), original.size() - mask.count_ones());
                for (new_index, old_index) in mask.iter_zeros().enumerate() {
                    assert_eq!(
                        filtered.element_bytes(new_index),
                        original.element_bytes(old_index)
                    );
                }
            }
        }
    }

    #[test]
    fn test_filter_resize_edge_masks() {
        let mut storage = sequential_storage("A", 70, DataType::Int64, 1);
        let unchanged = storage.clone();
        storage.filter_resize(&BitMask::new(70)).unwrap();
        assert_eq!(storage, unchanged);

        storage.filter_resize(&BitMask::all_set(70)).unwrap();
        assert_eq!(storage.size(), 0);
    }

    #[test]
    fn test_filter_mask_length_mismatch() {
        let mut storage = sequential_storage("A", 5, DataType::Int32, 1);
        assert!(matches!(
            storage.filter_resize(&BitMask::new(4)),
            Err(PropertyError::PreconditionViolation(_))
        ));
        assert!(storage.filter_copy(&BitMask::new(6)).is_err());
        assert_eq!(storage.size(), 5);
    }

    #[test]
    fn test_filter_copy_leaves_source_untouched() {
        let storage = sequential_storage("A", 6, DataType::Int32, 1);
        let mask = [true, false, false, true, false, true]
            .iter()
            .copied()
            .collect::<BitMask>();
        let filtered = storage.filter_copy(&mask).unwrap();
        assert_eq!(int_values(&filtered), vec![1, 2, 4]);
        assert_eq!(filtered.capacity(), 3);
        assert_eq!(int_values(&storage), (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_filter_with_padding() {
        let mut storage = sequential_storage_with_stride("A", 4, DataType::Int32, 3, 16);
        let mask = [false, true, false, false]
            .iter()
            .copied()
            .collect::<BitMask>();
        storage.filter_resize(&mask).unwrap();
        assert_eq!(storage.copy_component_to::<i32>(2), vec![2, 10, 14]);
    }

    #[test]
    fn test_mapped_copies() {
        let source = sequential_storage("A", 4, DataType::Int32, 2);
        let mut target = source.new_like(4);
        target.mapped_copy_from(&source, &[3, 2, 1, 0]);
        assert_eq!(target.copy_component_to::<i32>(0), vec![6, 4, 2, 0]);
        assert_eq!(target.copy_component_to::<i32>(1), vec![7, 5, 3, 1]);

        let mut gathered = source.new_like(3);
        source.mapped_copy_to(&mut gathered, &[1, 1, 3]);
        assert_eq!(gathered.copy_component_to::<i32>(0), vec![2, 2, 6]);
    }

    #[test]
    #[should_panic]
    fn test_mapped_copy_rejects_type_mismatch() {
        let source = PropertyStorage::new(2, DataType::Int32, 2, 0, "A").unwrap();
        let mut target = PropertyStorage::new(2, DataType::Int64, 1, 0, "B").unwrap();
        target.mapped_copy_from(&source, &[0, 1]);
    }

    #[test]
    fn test_copy_range_from() {
        let source = sequential_storage("A", 10, DataType::Int32, 1);
        let mut target = source.new_like(5);
        target.copy_range_from(&source, 6, 1, 3);
        assert_eq!(int_values(&target), vec![0, 6, 7, 8, 0]);

        let mut full = source.new_like(10);
        full.copy_from(&source);
        assert_eq!(full, source);
    }

    #[test]
    fn test_replicate() {
        let mut storage = sequential_storage("A", 3, DataType::Int32, 1);
        storage.replicate(3, true).unwrap();
        assert_eq!(int_values(&storage), vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);

        let mut storage = sequential_storage("A", 2, DataType::Int32, 1);
        storage.replicate(2, false).unwrap();
        assert_eq!(storage.size(), 4);
        assert_eq!(&int_values(&storage)[..2], &[0, 1]);

        let mut storage = sequential_storage("A", 2, DataType::Int32, 1);
        assert!(matches!(
            storage.replicate(usize::MAX, true),
            Err(PropertyError::Overflow { count: 2, .. })
        ));
        assert_eq!(storage.size(), 2);
    }

    #[test]
    fn test_clone_trims_capacity() {
        let mut storage = sequential_storage("A", 10, DataType::Float, 3);
        storage.grow(5);
        let clone = storage.clone();
        assert_eq!(clone.size(), 15);
        assert_eq!(clone.capacity(), 15);
        assert_eq!(clone, storage);
    }

    #[test]
    fn test_fill_and_components() {
        let mut storage = PropertyStorage::new(4, DataType::Float, 3, 0, "Color").unwrap();
        storage.fill([0.5 as FloatType, 0.25, 1.0]);
        assert_eq!(
            storage.copy_component_to::<f64>(1),
            vec![0.25, 0.25, 0.25, 0.25]
        );
        let mut sum = 0.0;
        storage.for_each_component(2, |_, value: f64| sum += value);
        assert_approx_eq!(sum, 4.0);

        storage.fill_zero();
        assert!(storage.copy_component_to::<f64>(0).iter().all(|v| *v == 0.0));
    }
}
