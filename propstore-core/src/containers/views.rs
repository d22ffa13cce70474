use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, Index, IndexMut};

use crate::error::{PropertyError, Result};
use crate::layout::PropertyElement;

use super::PropertyStorage;

fn assert_flat_layout<T: PropertyElement>(storage: &PropertyStorage) {
    assert_eq!(
        storage.data_type(),
        T::data_type(),
        "Cannot view property '{}' of type {} as {}",
        storage.name(),
        storage.data_type(),
        std::any::type_name::<T>()
    );
    assert_eq!(
        storage.component_count(),
        T::COMPONENT_COUNT,
        "Cannot view property '{}' with {} components as {}",
        storage.name(),
        storage.component_count(),
        std::any::type_name::<T>()
    );
    assert_eq!(
        storage.stride(),
        std::mem::size_of::<T>(),
        "Stride of property '{}' does not match the size of {}",
        storage.name(),
        std::any::type_name::<T>()
    );
}

/// Strongly typed, read-only view over a `PropertyStorage`, treating each element as one value of type `T`.
///
/// The view is generic over the way it holds on to the storage: `&PropertyStorage` borrows it, while a
/// `PropertyPtr` keeps a shared reference so that the storage lives as long as the view does. Neither variant
/// ever clones the storage.
///
/// ```
/// # use propstore_core::containers::*;
/// # use propstore_core::layout::*;
/// # use propstore_core::nalgebra::Vector3;
/// let mut storage = PropertyStorage::new(2, DataType::Float, 3, 0, "Position").unwrap();
/// storage.fill(Vector3::<FloatType>::new(1.0, 2.0, 3.0));
///
/// let view = PropertyView::<Vector3<FloatType>, _>::new(&storage);
/// assert_eq!(view.len(), 2);
/// assert_eq!(view[1].y, 2.0);
/// ```
pub struct PropertyView<T, P> {
    storage: P,
    _phantom: PhantomData<T>,
}

impl<T: PropertyElement, P: Deref<Target = PropertyStorage>> PropertyView<T, P> {
    /// Creates a new view over `storage`
    ///
    /// # Panics
    ///
    /// If the data type, component count or stride of `storage` does not match `T`
    pub fn new(storage: P) -> Self {
        assert_flat_layout::<T>(&storage);
        Self {
            storage,
            _phantom: Default::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.size()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn component_count(&self) -> usize {
        T::COMPONENT_COUNT
    }

    /// Returns the element at `index`
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds
    pub fn get(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }

    /// All elements as a slice
    pub fn as_slice(&self) -> &[T] {
        bytemuck::cast_slice(self.storage.bytes())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// The viewed storage
    pub fn storage(&self) -> &PropertyStorage {
        &self.storage
    }

    /// Consumes the view and returns the inner storage handle
    pub fn into_inner(self) -> P {
        self.storage
    }
}

impl<T: PropertyElement, P: Deref<Target = PropertyStorage>> Index<usize> for PropertyView<T, P> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index)
    }
}

impl<'a, T: PropertyElement, P: Deref<Target = PropertyStorage>> IntoIterator
    for &'a PropertyView<T, P>
{
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Strongly typed, mutable view over a `PropertyStorage`. Like `PropertyView`, this is generic over the handle to
/// the storage: `&mut PropertyStorage` borrows the storage, `ExclusivePropertyPtr` owns a copy-on-write reference and
/// `ScopedStorage` notifies the owning `PropertyObject` when the view is dropped
pub struct PropertyViewMut<T, P> {
    storage: P,
    _phantom: PhantomData<T>,
}

impl<T: PropertyElement, P: DerefMut<Target = PropertyStorage>> PropertyViewMut<T, P> {
    /// Creates a new mutable view over `storage`
    ///
    /// # Panics
    ///
    /// If the data type, component count or stride of `storage` does not match `T`
    pub fn new(storage: P) -> Self {
        assert_flat_layout::<T>(&storage);
        Self {
            storage,
            _phantom: Default::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.size()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn component_count(&self) -> usize {
        T::COMPONENT_COUNT
    }

    pub fn get(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }

    /// Sets the element at `index` to `value`
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds
    pub fn set(&mut self, index: usize, value: T) {
        self.as_mut_slice()[index] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        bytemuck::cast_slice(self.storage.bytes())
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(self.storage.bytes_mut())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Sets every element to `value`
    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().fill(value);
    }

    /// Sets every element whose entry in `selection` is nonzero to `value`. Without a selection, every element is
    /// set. Fails with `PropertyError::PreconditionViolation` if `selection` has a different number of elements
    ///
    /// # Panics
    ///
    /// If `selection` is not a single-component `Int32` storage
    pub fn fill_selected(&mut self, value: T, selection: Option<&PropertyStorage>) -> Result<()> {
        let selection = match selection {
            Some(selection) => selection,
            None => {
                self.fill(value);
                return Ok(());
            }
        };
        if selection.size() != self.len() {
            return Err(PropertyError::PreconditionViolation(format!(
                "Selection has {} elements, but property '{}' has {}",
                selection.size(),
                self.storage.name(),
                self.len()
            )));
        }
        let selection = PropertyView::<i32, _>::new(selection);
        for (element, selected) in self.iter_mut().zip(selection.iter()) {
            if *selected != 0 {
                *element = value;
            }
        }
        Ok(())
    }

    /// Copies all elements of `source` into this view
    ///
    /// # Panics
    ///
    /// If `source` has a different number of elements
    pub fn copy_from<Q: Deref<Target = PropertyStorage>>(&mut self, source: &PropertyView<T, Q>) {
        self.as_mut_slice().copy_from_slice(source.as_slice());
    }

    pub fn storage(&self) -> &PropertyStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut PropertyStorage {
        &mut self.storage
    }

    /// Consumes the view and returns the inner storage handle
    pub fn into_inner(self) -> P {
        self.storage
    }
}

impl<T: PropertyElement, P: DerefMut<Target = PropertyStorage>> Index<usize>
    for PropertyViewMut<T, P>
{
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index)
    }
}

impl<T: PropertyElement, P: DerefMut<Target = PropertyStorage>> IndexMut<usize>
    for PropertyViewMut<T, P>
{
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use nalgebra::Vector3;

    use super::*;
    use crate::layout::{DataType, FloatType};
    use crate::test_utils::*;

    #[test]
    fn test_flat_view_reads() {
        let storage = sequential_storage("Position", 4, DataType::Float, 3);
        let view = PropertyView::<Vector3<FloatType>, _>::new(&storage);
        assert_eq!(view.len(), 4);
        assert_eq!(*view.get(2), Vector3::new(6.0, 7.0, 8.0));
        assert_eq!(
            view.iter().map(|v| v.x).collect::<Vec<_>>(),
            vec![0.0, 3.0, 6.0, 9.0]
        );
    }

    #[test]
    fn test_ref_view_keeps_storage_alive() {
        let view = {
            let storage = Arc::new(sequential_storage("A", 3, DataType::Int64, 1));
            PropertyView::<i64, _>::new(storage.clone())
        };
        assert_eq!(view.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_write_then_read() {
        let mut storage = PropertyStorage::new(3, DataType::Float, 3, 0, "Position").unwrap();
        {
            let mut view = PropertyViewMut::<Vector3<FloatType>, _>::new(&mut storage);
            view.set(0, Vector3::new(1.0, 0.0, 0.0));
            view.set(1, Vector3::new(0.0, 1.0, 0.0));
            view[2] = Vector3::new(0.0, 0.0, 1.0);
        }
        let view = PropertyView::<[FloatType; 3], _>::new(&storage);
        assert_eq!(
            view.as_slice(),
            &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
        );
    }

    #[test]
    fn test_fill_selected() {
        let mut storage = PropertyStorage::new(4, DataType::Int32, 1, 0, "Type").unwrap();
        let mut selection = PropertyStorage::new(4, DataType::Int32, 1, 0, "Selection").unwrap();
        PropertyViewMut::<i32, _>::new(&mut selection).set(1, 1);
        PropertyViewMut::<i32, _>::new(&mut selection).set(3, 1);

        let mut view = PropertyViewMut::<i32, _>::new(&mut storage);
        view.fill_selected(7, Some(&selection)).unwrap();
        assert_eq!(view.as_slice(), &[0, 7, 0, 7]);

        view.fill_selected(2, None).unwrap();
        assert_eq!(view.as_slice(), &[2, 2, 2, 2]);

        let short_selection = PropertyStorage::new(3, DataType::Int32, 1, 0, "Selection").unwrap();
        assert!(view.fill_selected(1, Some(&short_selection)).is_err());
    }

    #[test]
    fn test_copy_between_views() {
        let source = sequential_storage("A", 5, DataType::Int32, 2);
        let mut target = source.new_like(5);
        PropertyViewMut::<[i32; 2], _>::new(&mut target)
            .copy_from(&PropertyView::<[i32; 2], _>::new(&source));
        assert_eq!(target, source);
    }

    #[test]
    #[should_panic]
    fn test_flat_view_rejects_padded_stride() {
        let storage = PropertyStorage::new(1, DataType::Int32, 3, 16, "A").unwrap();
        PropertyView::<[i32; 3], _>::new(&storage);
    }

    #[test]
    #[should_panic]
    fn test_flat_view_rejects_wrong_type() {
        let storage = PropertyStorage::new(1, DataType::Int64, 1, 0, "A").unwrap();
        PropertyView::<i32, _>::new(&storage);
    }
}
