use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::layout::PrimitiveType;

use super::PropertyStorage;

fn assert_table_layout<T: PrimitiveType>(storage: &PropertyStorage) {
    assert_eq!(
        storage.data_type(),
        T::DATA_TYPE,
        "Cannot view property '{}' of type {} with components of type {}",
        storage.name(),
        storage.data_type(),
        std::any::type_name::<T>()
    );
}

/// Read-only view over a `PropertyStorage` that addresses every component of every element individually. In
/// contrast to `PropertyView`, the number of components is only known at runtime and the stride may be larger than
/// the components of one element.
///
/// ```
/// # use propstore_core::containers::*;
/// # use propstore_core::layout::*;
/// let storage = PropertyStorage::new(2, DataType::Int64, 2, 0, "Topology").unwrap();
/// let view = PropertyTableView::<i64, _>::new(&storage);
/// assert_eq!(view.get(1, 1), 0);
/// assert_eq!(view.component_range(0).count(), 2);
/// ```
pub struct PropertyTableView<T, P> {
    storage: P,
    _phantom: PhantomData<T>,
}

impl<T: PrimitiveType, P: Deref<Target = PropertyStorage>> PropertyTableView<T, P> {
    /// Creates a new table view over `storage`
    ///
    /// # Panics
    ///
    /// If the data type of `storage` does not match `T`
    pub fn new(storage: P) -> Self {
        assert_table_layout::<T>(&storage);
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
        self.storage.component_count()
    }

    /// Returns component `component` of the element at `index`
    ///
    /// # Panics
    ///
    /// If either index is out of bounds
    pub fn get(&self, index: usize, component: usize) -> T {
        assert!(
            component < self.component_count(),
            "Component index {} out of bounds",
            component
        );
        self.values()[index * self.values_per_element() + component]
    }

    /// The components of the element at `index`
    pub fn element(&self, index: usize) -> &[T] {
        let start = index * self.values_per_element();
        &self.values()[start..start + self.component_count()]
    }

    /// Iterator over component `component` of every element
    pub fn component_range(&self, component: usize) -> impl Iterator<Item = &T> + '_ {
        assert!(
            component < self.component_count(),
            "Component index {} out of bounds",
            component
        );
        self.values()
            .iter()
            .skip(component)
            .step_by(self.values_per_element())
    }

    pub fn storage(&self) -> &PropertyStorage {
        &self.storage
    }

    fn values(&self) -> &[T] {
        bytemuck::cast_slice(self.storage.bytes())
    }

    fn values_per_element(&self) -> usize {
        self.storage.stride() / self.storage.data_type_size()
    }
}

/// Mutable version of `PropertyTableView`
pub struct PropertyTableViewMut<T, P> {
    storage: P,
    _phantom: PhantomData<T>,
}

impl<T: PrimitiveType, P: DerefMut<Target = PropertyStorage>> PropertyTableViewMut<T, P> {
    /// Creates a new mutable table view over `storage`
    ///
    /// # Panics
    ///
    /// If the data type of `storage` does not match `T`
    pub fn new(storage: P) -> Self {
        assert_table_layout::<T>(&storage);
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
        self.storage.component_count()
    }

    pub fn get(&self, index: usize, component: usize) -> T {
        self.assert_component(component);
        self.values()[index * self.values_per_element() + component]
    }

    /// Sets component `component` of the element at `index` to `value`
    ///
    /// # Panics
    ///
    /// If either index is out of bounds
    pub fn set(&mut self, index: usize, component: usize, value: T) {
        self.assert_component(component);
        let offset = index * self.values_per_element() + component;
        self.values_mut()[offset] = value;
    }

    pub fn element(&self, index: usize) -> &[T] {
        let start = index * self.values_per_element();
        &self.values()[start..start + self.component_count()]
    }

    pub fn element_mut(&mut self, index: usize) -> &mut [T] {
        let start = index * self.values_per_element();
        let end = start + self.component_count();
        &mut self.values_mut()[start..end]
    }

    pub fn component_range(&self, component: usize) -> impl Iterator<Item = &T> + '_ {
        self.assert_component(component);
        self.values()
            .iter()
            .skip(component)
            .step_by(self.values_per_element())
    }

    /// Mutable iterator over component `component` of every element
    pub fn component_range_mut(&mut self, component: usize) -> impl Iterator<Item = &mut T> + '_ {
        self.assert_component(component);
        let step = self.values_per_element();
        self.values_mut().iter_mut().skip(component).step_by(step)
    }

    /// Sets component `component` of every element to `value`
    pub fn fill_component(&mut self, component: usize, value: T) {
        self.component_range_mut(component)
            .for_each(|target| *target = value);
    }

    pub fn storage(&self) -> &PropertyStorage {
        &self.storage
    }

    fn assert_component(&self, component: usize) {
        assert!(
            component < self.component_count(),
            "Component index {} out of bounds",
            component
        );
    }

    fn values(&self) -> &[T] {
        bytemuck::cast_slice(self.storage.bytes())
    }

    fn values_mut(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(self.storage.bytes_mut())
    }

    fn values_per_element(&self) -> usize {
        self.storage.stride() / self.storage.data_type_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DataType, FloatType};
    use crate::test_utils::*;

    #[test]
    fn test_table_access_with_padding() {
        let storage = sequential_storage_with_stride("A", 3, DataType::Int32, 3, 16);
        let view = PropertyTableView::<i32, _>::new(&storage);
        assert_eq!(view.component_count(), 3);
        assert_eq!(view.get(1, 2), 6);
        assert_eq!(view.element(2), &[8, 9, 10]);
        assert_eq!(
            view.component_range(1).copied().collect::<Vec<_>>(),
            vec![1, 5, 9]
        );
    }

    #[test]
    fn test_table_writes() {
        let mut storage = PropertyStorage::new(4, DataType::Float, 2, 0, "A").unwrap();
        {
            let mut view = PropertyTableViewMut::<FloatType, _>::new(&mut storage);
            view.set(3, 1, 2.5);
            view.fill_component(0, -1.0);
            view.element_mut(0)[1] = 4.0;
        }
        let view = PropertyTableView::<FloatType, _>::new(&storage);
        assert_eq!(
            view.component_range(0).copied().collect::<Vec<_>>(),
            vec![-1.0; 4]
        );
        assert_eq!(
            view.component_range(1).copied().collect::<Vec<_>>(),
            vec![4.0, 0.0, 0.0, 2.5]
        );
    }

    #[test]
    fn test_empty_component_range() {
        let storage = PropertyStorage::new(0, DataType::Int64, 2, 0, "A").unwrap();
        let view = PropertyTableView::<i64, _>::new(&storage);
        assert_eq!(view.component_range(1).count(), 0);
    }

    #[test]
    #[should_panic]
    fn test_component_out_of_bounds() {
        let storage = PropertyStorage::new(2, DataType::Int64, 2, 0, "A").unwrap();
        PropertyTableView::<i64, _>::new(&storage).get(0, 2);
    }
}
