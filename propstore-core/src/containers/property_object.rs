use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use itertools::Itertools;
use nalgebra::Vector3;

use crate::error::{PropertyError, Result};
use crate::layout::{DataType, FloatType, PrimitiveType, PropertyElement};

use super::{
    is_shared, make_mutable, ChangeNotifier, ElementType, Observer, PropertyPtr, PropertyStorage,
    PropertyTableView, PropertyTableViewMut, PropertyView, PropertyViewMut, RawPropertyView,
    RawPropertyViewMut,
};

/// A property as it lives inside a container: a shared `PropertyStorage` together with the list of element types
/// for typed properties, a display title and change notification.
///
/// Cloning a `PropertyObject` is cheap, the clone shares the storage with the original until either of them is
/// modified. Mutable access goes through `modify` (or the `*_mut` view constructors), which clones the storage first
/// if it is shared and notifies the observers of this object once the returned handle is dropped.
#[derive(Clone)]
pub struct PropertyObject {
    storage: PropertyPtr,
    element_types: Vec<ElementType>,
    title: Option<String>,
    notifier: ChangeNotifier,
}

/// Exclusive, mutable access to the storage of a `PropertyObject`. Notifies the observers of the object when
/// dropped, on every exit path of the scope that modified the storage
pub struct ScopedStorage<'a> {
    storage: &'a mut PropertyStorage,
    notifier: &'a mut ChangeNotifier,
}

impl<'a> Deref for ScopedStorage<'a> {
    type Target = PropertyStorage;

    fn deref(&self) -> &Self::Target {
        &*self.storage
    }
}

impl<'a> DerefMut for ScopedStorage<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.storage
    }
}

impl<'a> Drop for ScopedStorage<'a> {
    fn drop(&mut self) {
        self.notifier.notify(self.storage.name());
    }
}

impl PropertyObject {
    pub fn new(storage: PropertyStorage) -> Self {
        Self::from_shared(Arc::new(storage))
    }

    /// Creates a new `PropertyObject` that shares `storage` with its other owners
    pub fn from_shared(storage: PropertyPtr) -> Self {
        Self {
            storage,
            element_types: vec![],
            title: None,
            notifier: Default::default(),
        }
    }

    pub fn storage(&self) -> &PropertyStorage {
        &self.storage
    }

    /// The shared handle to the storage. Cloning it shares the storage
    pub fn shared_storage(&self) -> &PropertyPtr {
        &self.storage
    }

    /// Replaces the storage of this object and notifies observers
    pub fn set_storage(&mut self, storage: PropertyPtr) {
        self.storage = storage;
        self.notifier.notify(self.storage.name());
    }

    /// Is the storage of this object shared with other owners?
    pub fn is_shared(&self) -> bool {
        is_shared(&self.storage)
    }

    /// Mutable access to the storage, cloning it first if it is shared. In contrast to `modify`, this does not
    /// notify observers
    pub fn modifiable_storage(&mut self) -> &mut PropertyStorage {
        make_mutable(&mut self.storage)
    }

    /// Mutable access to the storage, cloning it first if it is shared. Observers are notified when the returned
    /// handle is dropped
    pub fn modify(&mut self) -> ScopedStorage<'_> {
        ScopedStorage {
            storage: make_mutable(&mut self.storage),
            notifier: &mut self.notifier,
        }
    }

    pub fn name(&self) -> &str {
        self.storage.name()
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.modify().set_name(name);
    }

    pub fn type_id(&self) -> i32 {
        self.storage.type_id()
    }

    pub fn size(&self) -> usize {
        self.storage.size()
    }

    pub fn data_type(&self) -> DataType {
        self.storage.data_type()
    }

    pub fn component_count(&self) -> usize {
        self.storage.component_count()
    }

    pub fn component_names(&self) -> &[String] {
        self.storage.component_names()
    }

    /// Returns the name of this property combined with the name of one of its vector components, e.g.
    /// `"Position.X"`. Unnamed components are referred to by their 1-based index, e.g. `"Stress.(2)"`. For
    /// single-component properties, this is just the property name.
    ///
    /// ```
    /// # use propstore_core::containers::*;
    /// # use propstore_core::layout::*;
    /// let storage = PropertyStorage::new(0, DataType::Float, 3, 0, "Position")
    ///     .unwrap()
    ///     .with_component_names(vec!["X", "Y", "Z"]);
    /// let property = PropertyObject::new(storage);
    /// assert_eq!(property.name_with_component(1), "Position.Y");
    /// ```
    pub fn name_with_component(&self, component: usize) -> String {
        if self.component_count() <= 1 {
            return self.name().to_owned();
        }
        match self.component_names().get(component) {
            Some(component_name) => format!("{}.{}", self.name(), component_name),
            None => format!("{}.({})", self.name(), component + 1),
        }
    }

    /// The display title of this property, falling back to its name
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_else(|| self.name())
    }

    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.title = Some(title.into());
    }

    /// Read-only flat view that borrows the storage
    pub fn view<T: PropertyElement>(&self) -> PropertyView<T, &PropertyStorage> {
        PropertyView::new(&*self.storage)
    }

    /// Read-only flat view that holds a shared reference to the storage and can thus outlive `self`
    pub fn shared_view<T: PropertyElement>(&self) -> PropertyView<T, PropertyPtr> {
        PropertyView::new(self.storage.clone())
    }

    /// Mutable flat view, notifies observers when dropped
    pub fn view_mut<T: PropertyElement>(&mut self) -> PropertyViewMut<T, ScopedStorage<'_>> {
        PropertyViewMut::new(self.modify())
    }

    pub fn table_view<T: PrimitiveType>(&self) -> PropertyTableView<T, &PropertyStorage> {
        PropertyTableView::new(&*self.storage)
    }

    pub fn table_view_mut<T: PrimitiveType>(
        &mut self,
    ) -> PropertyTableViewMut<T, ScopedStorage<'_>> {
        PropertyTableViewMut::new(self.modify())
    }

    pub fn raw_view(&self) -> RawPropertyView<&PropertyStorage> {
        RawPropertyView::new(&*self.storage)
    }

    pub fn raw_view_mut(&mut self) -> RawPropertyViewMut<ScopedStorage<'_>> {
        RawPropertyViewMut::new(self.modify())
    }

    /// Registers a callback that is invoked after every modification of this property
    pub fn add_observer(&mut self, observer: Observer) {
        self.notifier.add_observer(observer);
    }

    /// Number of modifications of this property so far
    pub fn revision(&self) -> u64 {
        self.notifier.revision()
    }

    pub(crate) fn notify_changed(&mut self) {
        let name = self.storage.name().to_owned();
        self.notifier.notify(&name);
    }

    pub fn element_types(&self) -> &[ElementType] {
        &self.element_types
    }

    pub fn add_element_type(&mut self, element_type: ElementType) {
        self.element_types.push(element_type);
    }

    /// Removes the element type with the given numeric id
    pub fn remove_element_type(&mut self, id: i32) -> Option<ElementType> {
        let index = self
            .element_types
            .iter()
            .position(|element_type| element_type.id() == id)?;
        Some(self.element_types.remove(index))
    }

    /// Returns the element type with the given numeric id
    pub fn element_type(&self, id: i32) -> Option<&ElementType> {
        self.element_types
            .iter()
            .find(|element_type| element_type.id() == id)
    }

    pub fn element_type_mut(&mut self, id: i32) -> Option<&mut ElementType> {
        self.element_types
            .iter_mut()
            .find(|element_type| element_type.id() == id)
    }

    /// Returns the element type with the given name
    pub fn element_type_by_name(&self, name: &str) -> Option<&ElementType> {
        self.element_types
            .iter()
            .find(|element_type| element_type.name() == name)
    }

    /// Returns a numeric id that no element type of this property uses yet. The id is one larger than the largest
    /// existing id, but at least `start_at`
    pub fn generate_unique_element_type_id(&self, start_at: i32) -> i32 {
        self.element_types
            .iter()
            .map(|element_type| element_type.id() + 1)
            .fold(start_at, i32::max)
    }

    /// Map from numeric type id to the color of each element type
    pub fn type_color_map(&self) -> BTreeMap<i32, Vector3<FloatType>> {
        self.element_types
            .iter()
            .map(|element_type| (element_type.id(), element_type.color()))
            .collect()
    }

    /// Computes a renumbering of the element types that maps their ids, in ascending order, to the contiguous range
    /// `base_id, base_id + 1, ...`. Returns the mapping from old to new ids and the property values with the
    /// mapping applied. Values without an element type are left unchanged. If the ids are contiguous already, the
    /// returned storage is the shared storage of `self`.
    ///
    /// Fails with `PropertyError::TypeMismatch` if this is not a single-component `Int32` property
    pub fn generate_contiguous_type_id_mapping(
        &self,
        base_id: i32,
    ) -> Result<(BTreeMap<i32, i32>, PropertyPtr)> {
        if self.data_type() != DataType::Int32 || self.component_count() != 1 {
            return Err(PropertyError::TypeMismatch(format!(
                "Property '{}' is not a typed property with integer type ids",
                self.name()
            )));
        }
        let mapping = self
            .element_types
            .iter()
            .map(|element_type| element_type.id())
            .sorted_unstable()
            .dedup()
            .zip(base_id..)
            .collect::<BTreeMap<_, _>>();

        if mapping.iter().all(|(old_id, new_id)| old_id == new_id) {
            return Ok((mapping, self.storage.clone()));
        }

        let mut remapped = (*self.storage).clone();
        for value in PropertyViewMut::<i32, _>::new(&mut remapped).iter_mut() {
            if let Some(new_id) = mapping.get(value) {
                *value = *new_id;
            }
        }
        Ok((mapping, Arc::new(remapped)))
    }
}

impl fmt::Debug for PropertyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyObject")
            .field("storage", &self.storage)
            .field("element_types", &self.element_types)
            .field("title", &self.title)
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl From<PropertyStorage> for PropertyObject {
    fn from(storage: PropertyStorage) -> Self {
        Self::new(storage)
    }
}

impl From<PropertyPtr> for PropertyObject {
    fn from(storage: PropertyPtr) -> Self {
        Self::from_shared(storage)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::containers::ChangeEvent;
    use crate::test_utils::*;

    #[test]
    fn test_scoped_view_notifies_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut property = PropertyObject::new(sequential_storage("Mass", 3, DataType::Float, 1));
        let observed_calls = calls.clone();
        property.add_observer(Arc::new(move |event: &ChangeEvent| {
            assert_eq!(event.source, "Mass");
            observed_calls.fetch_add(1, Ordering::SeqCst);
        }));

        {
            let mut view = property.view_mut::<FloatType>();
            view.set(1, 5.0);
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(property.revision(), 1);
        assert_eq!(property.view::<FloatType>().as_slice(), &[0.0, 5.0, 2.0]);
    }

    #[test]
    fn test_scoped_view_notifies_on_early_exit() {
        fn failing_edit(property: &mut PropertyObject) -> Result<()> {
            let mut view = property.raw_view_mut();
            view.set(0, 0, 1);
            Err(PropertyError::InvalidArgument("abort".into()))
        }

        let mut property = PropertyObject::new(sequential_storage("A", 2, DataType::Int32, 1));
        assert!(failing_edit(&mut property).is_err());
        assert_eq!(property.revision(), 1);
        assert_eq!(property.raw_view().get::<i32>(0, 0), 1);
    }

    #[test]
    fn test_clone_shares_until_modified() {
        let original = PropertyObject::new(sequential_storage("Mass", 3, DataType::Float, 1));
        let mut copy = original.clone();
        assert!(Arc::ptr_eq(original.shared_storage(), copy.shared_storage()));

        copy.view_mut::<FloatType>().set(1, 5.0);
        assert!(!Arc::ptr_eq(original.shared_storage(), copy.shared_storage()));
        assert_eq!(original.view::<FloatType>().as_slice(), &[0.0, 1.0, 2.0]);
        assert_eq!(copy.view::<FloatType>().as_slice(), &[0.0, 5.0, 2.0]);
    }

    #[test]
    fn test_shared_view_outlives_object() {
        let view = {
            let property = PropertyObject::new(sequential_storage("A", 2, DataType::Int64, 1));
            property.shared_view::<i64>()
        };
        assert_eq!(view.as_slice(), &[0, 1]);
    }

    #[test]
    fn test_name_with_component() {
        let storage = PropertyStorage::new(0, DataType::Float, 3, 0, "Stress")
            .unwrap()
            .with_component_names(vec!["XX"]);
        let property = PropertyObject::new(storage);
        assert_eq!(property.name_with_component(0), "Stress.XX");
        assert_eq!(property.name_with_component(1), "Stress.2");
        assert_eq!(property.name_with_component(5), "Stress.(6)");

        let scalar = PropertyObject::new(PropertyStorage::new(0, DataType::Int32, 1, 0, "Mass").unwrap());
        assert_eq!(scalar.name_with_component(0), "Mass");
        assert_eq!(scalar.title(), "Mass");
    }

    #[test]
    fn test_element_types() {
        let mut property =
            PropertyObject::new(PropertyStorage::new(4, DataType::Int32, 1, 0, "Particle Type").unwrap());
        property.add_element_type(ElementType::new(2, "Cu").with_color(Vector3::new(1.0, 0.5, 0.0)));
        property.add_element_type(ElementType::new(5, "Zr"));
        property.add_element_type(ElementType::new(7, ""));

        assert_eq!(property.element_type(5).map(|t| t.name()), Some("Zr"));
        assert_eq!(property.element_type_by_name("Cu").map(|t| t.id()), Some(2));
        assert_eq!(property.element_type(7).unwrap().name_or_id(), "Type 7");
        assert_eq!(property.generate_unique_element_type_id(1), 8);
        assert_eq!(property.generate_unique_element_type_id(20), 20);
        assert_eq!(property.type_color_map()[&2], Vector3::new(1.0, 0.5, 0.0));

        property.remove_element_type(7);
        assert_eq!(property.element_types().len(), 2);
    }

    #[test]
    fn test_contiguous_type_id_mapping() {
        let mut property =
            PropertyObject::new(PropertyStorage::new(4, DataType::Int32, 1, 0, "Particle Type").unwrap());
        property.view_mut::<i32>().as_mut_slice().copy_from_slice(&[5, 2, 9, 5]);
        property.add_element_type(ElementType::new(5, "B"));
        property.add_element_type(ElementType::new(2, "A"));

        let (mapping, remapped) = property.generate_contiguous_type_id_mapping(1).unwrap();
        assert_eq!(mapping.get(&2), Some(&1));
        assert_eq!(mapping.get(&5), Some(&2));
        assert_eq!(
            PropertyView::<i32, _>::new(remapped).as_slice(),
            &[2, 1, 9, 2]
        );
        // The property itself is left unchanged
        assert_eq!(property.view::<i32>().as_slice(), &[5, 2, 9, 5]);

        let mut contiguous =
            PropertyObject::new(PropertyStorage::new(2, DataType::Int32, 1, 0, "Bond Type").unwrap());
        contiguous.add_element_type(ElementType::new(1, "A"));
        contiguous.add_element_type(ElementType::new(2, "B"));
        let (_, storage) = contiguous.generate_contiguous_type_id_mapping(1).unwrap();
        assert!(Arc::ptr_eq(&storage, contiguous.shared_storage()));
    }

    #[test]
    fn test_contiguous_mapping_requires_int_property() {
        let property = PropertyObject::new(PropertyStorage::new(1, DataType::Float, 1, 0, "A").unwrap());
        assert!(matches!(
            property.generate_contiguous_type_id_mapping(0),
            Err(PropertyError::TypeMismatch(_))
        ));
    }
}
