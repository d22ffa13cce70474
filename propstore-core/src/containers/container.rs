use std::sync::Arc;

use log::debug;

use crate::error::{PropertyError, Result};
use crate::layout::{ContainerKind, DataType, PropertyKey, StandardProperty, USER_PROPERTY_TYPE_ID};
use crate::math::BitMask;

use super::{ChangeNotifier, Observer, PropertyObject, PropertyPtr, PropertyStorage};

fn matches_key(property: &PropertyObject, type_id: i32, name: &str) -> bool {
    if type_id == USER_PROPERTY_TYPE_ID {
        property.type_id() == USER_PROPERTY_TYPE_ID && property.name() == name
    } else {
        property.type_id() == type_id
    }
}

/// An ordered collection of properties that together describe one kind of elements, e.g. all per-particle
/// properties. Every property of a container has exactly `element_count()` elements.
///
/// Properties are identified either by a standard semantic role of the container kind `K` (at most one property
/// per role) or, for user-defined properties, by their name.
///
/// Cloning a container is cheap: the clone shares all property storages with the original. Every operation that
/// mutates a property clones its storage first if it is shared, so mutations through one container are never
/// observable through another.
///
/// ```
/// # use propstore_core::containers::*;
/// # use propstore_core::layout::*;
/// # use propstore_core::nalgebra::Vector3;
/// let mut particles = PropertyContainer::<Particles>::new();
/// particles.set_element_count(2);
/// particles
///     .create_property(ParticleProperty::Position, true)
///     .unwrap()
///     .view_mut::<Vector3<FloatType>>()
///     .set(1, Vector3::new(1.0, 2.0, 3.0));
///
/// let positions = particles.expect_property(ParticleProperty::Position).unwrap();
/// assert_eq!(positions.view::<Vector3<FloatType>>()[1].z, 3.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertyContainer<K: ContainerKind> {
    properties: Vec<PropertyObject>,
    element_count: usize,
    title: Option<String>,
    notifier: ChangeNotifier,
    kind: K,
}

impl<K: ContainerKind> PropertyContainer<K> {
    /// Creates an empty container with zero elements
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements, which equals the size of every property in this container
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// All properties, in insertion order
    pub fn properties(&self) -> &[PropertyObject] {
        &self.properties
    }

    /// The keys of all properties, in insertion order
    pub fn keys(&self) -> impl Iterator<Item = PropertyKey<K::Standard>> + '_ {
        self.properties
            .iter()
            .map(|property| PropertyKey::from_type_id_and_name(property.type_id(), property.name()))
    }

    /// The display title of this container, falling back to the display name of its kind
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(K::DISPLAY_NAME)
    }

    /// The title set with `set_title`, if any
    pub fn custom_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.title = Some(title.into());
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Number of structural changes (element count changes, added or removed properties) so far
    pub fn revision(&self) -> u64 {
        self.notifier.revision()
    }

    /// Registers a callback that is invoked after every structural change of this container and after every
    /// modification of one of its properties, including properties that are added later
    pub fn add_observer(&mut self, observer: Observer) {
        for property in &mut self.properties {
            property.add_observer(observer.clone());
        }
        self.notifier.add_observer(observer);
    }

    fn notify_changed(&mut self) {
        let title = self.title().to_owned();
        self.notifier.notify(&title);
    }

    fn position_of(&self, type_id: i32, name: &str) -> Option<usize> {
        self.properties
            .iter()
            .position(|property| matches_key(property, type_id, name))
    }

    fn position(&self, key: &PropertyKey<K::Standard>) -> Option<usize> {
        match key {
            PropertyKey::Standard(property) => self.position_of(property.type_id(), ""),
            PropertyKey::UserDefined(name) => self.position_of(USER_PROPERTY_TYPE_ID, name),
        }
    }

    /// Returns the property with the given standard role
    pub fn get_property(&self, property: K::Standard) -> Option<&PropertyObject> {
        self.get_property_by_key(&PropertyKey::Standard(property))
    }

    /// Returns the first property with the given name, standard or user-defined
    pub fn get_property_by_name(&self, name: &str) -> Option<&PropertyObject> {
        self.properties.iter().find(|property| property.name() == name)
    }

    pub fn get_property_by_key(&self, key: &PropertyKey<K::Standard>) -> Option<&PropertyObject> {
        self.position(key).map(|index| &self.properties[index])
    }

    /// Mutable access to the property with the given standard role. Modifying its storage through `modify` or a
    /// mutable view clones the storage first if it is shared
    pub fn get_mutable_property(&mut self, property: K::Standard) -> Option<&mut PropertyObject> {
        self.get_mutable_property_by_key(&PropertyKey::Standard(property))
    }

    pub fn get_mutable_property_by_key(
        &mut self,
        key: &PropertyKey<K::Standard>,
    ) -> Option<&mut PropertyObject> {
        let index = self.position(key)?;
        Some(&mut self.properties[index])
    }

    fn check_required(&self, property: &PropertyObject) -> Result<()> {
        if property.size() != self.element_count {
            return Err(PropertyError::wrong_length(property.name()));
        }
        Ok(())
    }

    /// Like `get_property`, but fails with `PropertyError::MissingRequiredProperty` if the property does not exist
    /// or its size does not match the element count of this container
    pub fn expect_property(&self, property: K::Standard) -> Result<&PropertyObject> {
        let found = self
            .get_property(property)
            .ok_or_else(|| PropertyError::missing(property.name()))?;
        self.check_required(found)?;
        Ok(found)
    }

    /// Mutable version of `expect_property`
    pub fn expect_mutable_property(&mut self, property: K::Standard) -> Result<&mut PropertyObject> {
        self.expect_property(property)?;
        let index = self
            .position(&PropertyKey::Standard(property))
            .ok_or_else(|| PropertyError::missing(property.name()))?;
        Ok(&mut self.properties[index])
    }

    /// Returns the property with the given name, requiring a specific data type and component count. A
    /// `component_count` of zero accepts any number of components. Fails with
    /// `PropertyError::MissingRequiredProperty` if the property does not exist or has the wrong size, and with
    /// `PropertyError::TypeMismatch` if its layout differs
    pub fn expect_property_by_name(
        &self,
        name: &str,
        data_type: DataType,
        component_count: usize,
    ) -> Result<&PropertyObject> {
        let found = self
            .get_property_by_name(name)
            .ok_or_else(|| PropertyError::missing(name))?;
        if found.data_type() != data_type {
            return Err(PropertyError::TypeMismatch(format!(
                "Property '{}' in the input dataset has the wrong data type.",
                name
            )));
        }
        if component_count != 0 && found.component_count() != component_count {
            return Err(PropertyError::TypeMismatch(format!(
                "Property '{}' in the input dataset has the wrong number of components.",
                name
            )));
        }
        self.check_required(found)?;
        Ok(found)
    }

    fn prepare_existing(&mut self, index: usize, initialize_memory: bool) -> &mut PropertyObject {
        let element_count = self.element_count;
        let property = &mut self.properties[index];
        if !initialize_memory && property.is_shared() {
            // The caller overwrites all values, so copying the shared values would be wasted effort
            let fresh = property.storage().new_like(element_count);
            property.set_storage(Arc::new(fresh));
        } else {
            property.modifiable_storage();
        }
        property
    }

    fn push_property(&mut self, mut property: PropertyObject) -> &mut PropertyObject {
        for observer in self.notifier.observers() {
            property.add_observer(observer.clone());
        }
        self.properties.push(property);
        self.notify_changed();
        let last = self.properties.len() - 1;
        &mut self.properties[last]
    }

    /// Returns the property with the given standard role, ready for modification. If it does not exist yet, a new
    /// zero-initialized storage with the standard layout and `element_count()` elements is added.
    ///
    /// An existing property whose storage is shared gets an exclusive copy. With `initialize_memory == false`, the
    /// caller promises to overwrite all values, so a shared storage is replaced by a fresh one instead of being
    /// copied
    pub fn create_property(
        &mut self,
        property: K::Standard,
        initialize_memory: bool,
    ) -> Result<&mut PropertyObject> {
        if let Some(index) = self.position(&PropertyKey::Standard(property)) {
            return Ok(self.prepare_existing(index, initialize_memory));
        }
        let storage = PropertyStorage::new(
            self.element_count,
            property.data_type(),
            property.component_count(),
            0,
            property.name(),
        )?
        .with_type_id(property.type_id())
        .with_component_names(property.component_names().iter().copied());
        Ok(self.push_property(PropertyObject::new(storage)))
    }

    /// Returns the user-defined property with the given name, ready for modification, or adds a new one with the
    /// given layout. Fails with `PropertyError::TypeMismatch` if the existing property has a different data type,
    /// component count, or (for a nonzero `stride`) a different stride
    pub fn create_user_property(
        &mut self,
        name: &str,
        data_type: DataType,
        component_count: usize,
        stride: usize,
        initialize_memory: bool,
        component_names: &[&str],
    ) -> Result<&mut PropertyObject> {
        if let Some(index) = self.position_of(USER_PROPERTY_TYPE_ID, name) {
            let existing = self.properties[index].storage();
            if existing.data_type() != data_type {
                return Err(PropertyError::TypeMismatch(format!(
                    "Existing property '{}' has a different data type.",
                    name
                )));
            }
            if existing.component_count() != component_count {
                return Err(PropertyError::TypeMismatch(format!(
                    "Existing property '{}' has a different number of components.",
                    name
                )));
            }
            if stride != 0 && existing.stride() != stride {
                return Err(PropertyError::TypeMismatch(format!(
                    "Existing property '{}' has a different stride.",
                    name
                )));
            }
            return Ok(self.prepare_existing(index, initialize_memory));
        }
        let storage = PropertyStorage::new(
            self.element_count,
            data_type,
            component_count,
            stride,
            name,
        )?
        .with_component_names(component_names.iter().copied());
        Ok(self.push_property(PropertyObject::new(storage)))
    }

    fn check_attachable(&self, storage: &PropertyStorage) -> Result<()> {
        if !self.properties.is_empty() && storage.size() != self.element_count {
            return Err(PropertyError::PreconditionViolation(format!(
                "Cannot add new {} property '{}': Array length is not consistent with the number of elements in the parent container.",
                K::ELEMENT_DESCRIPTION,
                storage.name()
            )));
        }
        Ok(())
    }

    /// Attaches an existing storage. If a property with the same key exists, its storage is replaced, otherwise a
    /// new property is added. Adding the first property to an empty container adopts its size as the element
    /// count. Fails with `PropertyError::PreconditionViolation` if the size of `storage` differs from the element
    /// count, and with `PropertyError::TypeMismatch` if a user-defined property of the same name has a different
    /// layout
    pub fn create_property_from_storage(
        &mut self,
        storage: PropertyPtr,
    ) -> Result<&mut PropertyObject> {
        self.check_attachable(&storage)?;
        if self.properties.is_empty() {
            self.element_count = storage.size();
        }
        if let Some(index) = self.position_of(storage.type_id(), storage.name()) {
            let existing = &mut self.properties[index];
            if storage.type_id() == USER_PROPERTY_TYPE_ID
                && (existing.data_type() != storage.data_type()
                    || existing.component_count() != storage.component_count())
            {
                return Err(PropertyError::TypeMismatch(format!(
                    "Existing property '{}' has a different data type or number of components.",
                    storage.name()
                )));
            }
            existing.set_storage(storage);
            return Ok(existing);
        }
        Ok(self.push_property(PropertyObject::from_shared(storage)))
    }

    /// Appends `property` to this container. Fails with `PropertyError::DuplicateProperty` if a property with the
    /// same key exists, and with `PropertyError::PreconditionViolation` if its size does not match
    pub fn add_property(&mut self, property: PropertyObject) -> Result<&mut PropertyObject> {
        let index = self.properties.len();
        self.insert_property(index, property)
    }

    /// Inserts `property` at position `index`. Fails like `add_property`
    ///
    /// # Panics
    ///
    /// If `index > self.properties().len()`
    pub fn insert_property(
        &mut self,
        index: usize,
        mut property: PropertyObject,
    ) -> Result<&mut PropertyObject> {
        assert!(
            index <= self.properties.len(),
            "Property index {} out of bounds",
            index
        );
        if self.position_of(property.type_id(), property.name()).is_some() {
            return Err(PropertyError::DuplicateProperty(property.name().to_owned()));
        }
        self.check_attachable(property.storage())?;
        if self.properties.is_empty() {
            self.element_count = property.size();
        }
        for observer in self.notifier.observers() {
            property.add_observer(observer.clone());
        }
        self.properties.insert(index, property);
        self.notify_changed();
        Ok(&mut self.properties[index])
    }

    /// Detaches the property with the given key and returns it
    pub fn remove_property(&mut self, key: &PropertyKey<K::Standard>) -> Option<PropertyObject> {
        let index = self.position(key)?;
        Some(self.remove_property_at(index))
    }

    /// Detaches the property at position `index` and returns it
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds
    pub fn remove_property_at(&mut self, index: usize) -> PropertyObject {
        let property = self.properties.remove(index);
        self.notify_changed();
        property
    }

    /// Resizes every property to `count` elements, preserving existing values and zero-filling new elements
    pub fn set_element_count(&mut self, count: usize) {
        if count == self.element_count {
            return;
        }
        for property in &mut self.properties {
            if property.is_shared() {
                let mut resized = property.storage().new_like(count);
                let preserved = count.min(property.size());
                resized.copy_range_from(property.storage(), 0, 0, preserved);
                property.set_storage(Arc::new(resized));
            } else {
                property.modify().resize(count, true);
            }
        }
        self.element_count = count;
        self.notify_changed();
    }

    /// Removes all elements whose bit in `mask` is set from every property and returns the number of removed
    /// elements. Fails with `PropertyError::PreconditionViolation` if the mask length differs from the element count
    pub fn delete_elements(&mut self, mask: &BitMask) -> Result<usize> {
        if mask.len() != self.element_count {
            return Err(PropertyError::mask_length(self.element_count, mask.len()));
        }
        let deleted = mask.count_ones();
        if deleted == 0 {
            return Ok(0);
        }
        self.verify_integrity()?;
        for property in &mut self.properties {
            if property.is_shared() {
                let filtered = property.storage().filter_copy(mask)?;
                property.set_storage(Arc::new(filtered));
            } else {
                property.modify().filter_resize(mask)?;
            }
        }
        self.element_count -= deleted;
        debug!(
            "Deleted {} of {} {}",
            deleted,
            self.element_count + deleted,
            K::ELEMENT_DESCRIPTION
        );
        self.notify_changed();
        Ok(deleted)
    }

    /// Extends every property to `n` times its length, see `PropertyStorage::replicate`. Fails with
    /// `PropertyError::Overflow` if the new element count exceeds `usize`
    pub fn replicate(&mut self, n: usize, replicate_values: bool) -> Result<()> {
        if n <= 1 {
            return Ok(());
        }
        let new_count = self
            .element_count
            .checked_mul(n)
            .ok_or(PropertyError::Overflow {
                count: self.element_count,
                factor: n,
            })?;
        self.make_properties_mutable();
        for property in &mut self.properties {
            property.modify().replicate(n, replicate_values)?;
        }
        self.element_count = new_count;
        self.notify_changed();
        Ok(())
    }

    /// Fails with `PropertyError::InconsistentContainer` if any property's size differs from the element count
    pub fn verify_integrity(&self) -> Result<()> {
        match self
            .properties
            .iter()
            .find(|property| property.size() != self.element_count)
        {
            Some(property) => Err(PropertyError::InconsistentContainer {
                name: property.name().to_owned(),
                expected: self.element_count,
                actual: property.size(),
            }),
            None => Ok(()),
        }
    }

    /// Replaces the whole content of this container. A property is kept only if one of `storages` has the same type
    /// id and name, in which case it gets that storage. All other properties are removed and the remaining storages
    /// are added. Fails with `PropertyError::PreconditionViolation` if any storage does not have `element_count`
    /// elements, in which case the container is left unchanged
    pub fn set_content(&mut self, element_count: usize, storages: Vec<PropertyPtr>) -> Result<()> {
        if let Some(storage) = storages.iter().find(|storage| storage.size() != element_count) {
            return Err(PropertyError::PreconditionViolation(format!(
                "Property array '{}' has wrong length. It does not match the number of elements in the new {} container.",
                storage.name(),
                K::ELEMENT_DESCRIPTION
            )));
        }
        self.properties.retain(|property| {
            storages.iter().any(|storage| {
                storage.type_id() == property.type_id() && storage.name() == property.name()
            })
        });
        self.element_count = element_count;
        for storage in storages {
            match self.position_of(storage.type_id(), storage.name()) {
                Some(index) => self.properties[index].set_storage(storage),
                None => {
                    self.push_property(PropertyObject::from_shared(storage));
                }
            }
        }
        self.notify_changed();
        Ok(())
    }

    /// Makes the storage of every property exclusive to this container, cloning all shared storages
    pub fn make_properties_mutable(&mut self) {
        for property in &mut self.properties {
            property.modifiable_storage();
        }
    }
}
