use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use log::debug;

use super::{PropertyPtr, PropertyStorage};

/// Returns mutable access to the storage behind `ptr`. If the storage is shared with other owners, it is cloned
/// first and `ptr` is redirected to the clone, so the other owners never observe the mutation. The reference
/// count check and the clone are a single atomic step of `Arc::make_mut`
pub fn make_mutable(ptr: &mut PropertyPtr) -> &mut PropertyStorage {
    if Arc::get_mut(ptr).is_none() {
        debug!("Cloning shared property '{}' before modification", ptr.name());
    }
    Arc::make_mut(ptr)
}

/// Returns whether the storage behind `ptr` has other owners
pub fn is_shared(ptr: &PropertyPtr) -> bool {
    Arc::strong_count(ptr) > 1 || Arc::weak_count(ptr) > 0
}

/// Handle that holds a `PropertyPtr` and grants mutable access to it. On construction, the storage is made
/// exclusive (cloned if it was shared), so that mutable views over an `ExclusivePropertyPtr` can outlive the scope
/// they were created in without affecting other owners of the original storage.
///
/// ```
/// # use std::sync::Arc;
/// # use propstore_core::containers::*;
/// # use propstore_core::layout::*;
/// let shared = Arc::new(PropertyStorage::new(3, DataType::Int32, 1, 0, "Cluster").unwrap());
/// let mut view = PropertyViewMut::<i32, _>::new(ExclusivePropertyPtr::new(shared.clone()));
/// view.set(0, 17);
///
/// assert_eq!(view.get(0), &17);
/// assert_eq!(PropertyView::<i32, _>::new(&*shared).get(0), &0);
/// ```
pub struct ExclusivePropertyPtr(PropertyPtr);

impl ExclusivePropertyPtr {
    pub fn new(mut ptr: PropertyPtr) -> Self {
        make_mutable(&mut ptr);
        Self(ptr)
    }

    /// Returns the (now unshared) storage as a `PropertyPtr`, e.g. to attach it to a container
    pub fn into_shared(self) -> PropertyPtr {
        self.0
    }
}

impl Deref for ExclusivePropertyPtr {
    type Target = PropertyStorage;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ExclusivePropertyPtr {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // The handle stays unique from construction on, so this never clones
        make_mutable(&mut self.0)
    }
}

impl From<PropertyStorage> for ExclusivePropertyPtr {
    fn from(storage: PropertyStorage) -> Self {
        Self(Arc::new(storage))
    }
}
