use std::ops::{Deref, DerefMut};

use crate::layout::{FromStoredValue, IntoStoredValue};

use super::{PropertyStorage, TypedSlice, TypedSliceMut};

/// Type-erased table view over a `PropertyStorage` of any data type. Values are converted to and from a numeric
/// type `U` chosen by the caller, dispatching on the data type of the storage. This is the access path for code
/// that does not know the concrete type of a property at compile time.
///
/// Single-value accessors dispatch on every call, the bulk accessors (`for_each_in_component`, `copy_component`
/// etc.) dispatch only once.
///
/// ```
/// # use propstore_core::containers::*;
/// # use propstore_core::layout::*;
/// let mut storage = PropertyStorage::new(3, DataType::Int32, 1, 0, "Structure Type").unwrap();
/// RawPropertyViewMut::new(&mut storage).set(1, 0, 2.9f64);
///
/// let view = RawPropertyView::new(&storage);
/// assert_eq!(view.get::<f64>(1, 0), 2.0);
/// ```
pub struct RawPropertyView<P> {
    storage: P,
}

impl<P: Deref<Target = PropertyStorage>> RawPropertyView<P> {
    pub fn new(storage: P) -> Self {
        Self { storage }
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

    /// Returns component `component` of the element at `index`, converted to `U`
    ///
    /// # Panics
    ///
    /// If either index is out of bounds
    pub fn get<U: FromStoredValue>(&self, index: usize, component: usize) -> U {
        let offset = value_offset(&self.storage, index, component);
        match self.storage.as_typed_slice() {
            TypedSlice::Int32(values) => U::from_i32(values[offset]),
            TypedSlice::Int64(values) => U::from_i64(values[offset]),
            TypedSlice::Float(values) => U::from_float(values[offset]),
        }
    }

    /// Calls `f` with the index and the converted value of component `component` of every element
    pub fn for_each_in_component<U: FromStoredValue, F: FnMut(usize, U)>(
        &self,
        component: usize,
        f: F,
    ) {
        self.storage.for_each_component(component, f);
    }

    /// Collects component `component` of every element, converted to `U`
    pub fn copy_component<U: FromStoredValue>(&self, component: usize) -> Vec<U> {
        self.storage.copy_component_to(component)
    }

    pub fn storage(&self) -> &PropertyStorage {
        &self.storage
    }
}

/// Mutable version of `RawPropertyView`
pub struct RawPropertyViewMut<P> {
    storage: P,
}

impl<P: DerefMut<Target = PropertyStorage>> RawPropertyViewMut<P> {
    pub fn new(storage: P) -> Self {
        Self { storage }
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

    pub fn get<U: FromStoredValue>(&self, index: usize, component: usize) -> U {
        RawPropertyView::new(&*self.storage).get(index, component)
    }

    /// Converts `value` to the data type of the storage and writes it to component `component` of the element at
    /// `index`. Conversions follow the semantics of `as`, i.e. floats are truncated towards zero when written to
    /// integer storages
    ///
    /// # Panics
    ///
    /// If either index is out of bounds
    pub fn set<U: IntoStoredValue>(&mut self, index: usize, component: usize, value: U) {
        let offset = value_offset(&self.storage, index, component);
        match self.storage.as_typed_slice_mut() {
            TypedSliceMut::Int32(values) => values[offset] = value.to_i32(),
            TypedSliceMut::Int64(values) => values[offset] = value.to_i64(),
            TypedSliceMut::Float(values) => values[offset] = value.to_float(),
        }
    }

    /// Sets component `component` of every element to `value`
    pub fn fill_component<U: IntoStoredValue>(&mut self, component: usize, value: U) {
        let step = values_per_element(&self.storage);
        assert_component(&self.storage, component);
        match self.storage.as_typed_slice_mut() {
            TypedSliceMut::Int32(values) => fill_strided(values, component, step, value.to_i32()),
            TypedSliceMut::Int64(values) => fill_strided(values, component, step, value.to_i64()),
            TypedSliceMut::Float(values) => {
                fill_strided(values, component, step, value.to_float())
            }
        }
    }

    /// Writes `values[i]` to component `component` of element `i`
    ///
    /// # Panics
    ///
    /// If `values` does not have exactly one entry per element
    pub fn copy_component_from<U: IntoStoredValue>(&mut self, component: usize, values: &[U]) {
        assert_eq!(
            values.len(),
            self.len(),
            "Expected one value per element of property '{}'",
            self.storage.name()
        );
        let step = values_per_element(&self.storage);
        assert_component(&self.storage, component);
        match self.storage.as_typed_slice_mut() {
            TypedSliceMut::Int32(targets) => {
                copy_strided(targets, component, step, values, |v| v.to_i32())
            }
            TypedSliceMut::Int64(targets) => {
                copy_strided(targets, component, step, values, |v| v.to_i64())
            }
            TypedSliceMut::Float(targets) => {
                copy_strided(targets, component, step, values, |v| v.to_float())
            }
        }
    }

    pub fn storage(&self) -> &PropertyStorage {
        &self.storage
    }
}

fn values_per_element(storage: &PropertyStorage) -> usize {
    storage.stride() / storage.data_type_size()
}

fn assert_component(storage: &PropertyStorage, component: usize) {
    assert!(
        component < storage.component_count(),
        "Component index {} out of bounds for property '{}'",
        component,
        storage.name()
    );
}

fn value_offset(storage: &PropertyStorage, index: usize, component: usize) -> usize {
    assert_component(storage, component);
    assert!(
        index < storage.size(),
        "Element index {} out of bounds for property '{}'",
        index,
        storage.name()
    );
    index * values_per_element(storage) + component
}

fn fill_strided<T: Copy>(values: &mut [T], component: usize, step: usize, value: T) {
    values
        .iter_mut()
        .skip(component)
        .step_by(step)
        .for_each(|target| *target = value);
}

fn copy_strided<T, U: Copy, F: Fn(U) -> T>(
    targets: &mut [T],
    component: usize,
    step: usize,
    values: &[U],
    convert: F,
) {
    for (target, value) in targets.iter_mut().skip(component).step_by(step).zip(values) {
        *target = convert(*value);
    }
}
