// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-object sparse property storage.
//!
//! [`PropertyStore`] keeps only the values that were explicitly set, in a
//! sorted vector searched by [`PropertyId`]. Typical elements set a handful of
//! properties, so a `SmallVec` avoids heap allocation in the common case and
//! keeps lookups cache friendly.
//!
//! A store is owned by one object and mutated from one thread; it does no
//! locking of its own.

use smallvec::SmallVec;

use crate::change::PropertyChanged;
use crate::id::{Property, PropertyId};
use crate::registry::PropertyRegistry;
use crate::value::ErasedValue;

/// Inline capacity before the entries spill to the heap.
const INLINE_CAPACITY: usize = 8;

/// Sparse value storage for one object.
///
/// Reads fall back to the registry default. Writes through
/// [`set_value`](Self::set_value) report whether anything changed.
///
/// ```rust
/// use understory_property::{PropertyMetadataBuilder, PropertyRegistry, PropertyStore};
///
/// let mut registry = PropertyRegistry::new();
/// let text = registry.register("Text", PropertyMetadataBuilder::new(String::new()).build());
///
/// let mut store = PropertyStore::<u32>::new(7);
/// assert!(store.get(text, &registry).is_empty());
///
/// let change = store.set_value(text, "hi".to_string(), &registry).unwrap();
/// assert_eq!(change.new_value::<String>().map(String::as_str), Some("hi"));
///
/// // Clearing restores the default and reports it.
/// let change = store.clear_value(text, &registry).unwrap();
/// assert_eq!(change.new_value::<String>().map(String::as_str), Some(""));
/// ```
#[derive(Clone, Debug)]
pub struct PropertyStore<K> {
    /// Explicit values, sorted by [`PropertyId`].
    entries: SmallVec<[(PropertyId, ErasedValue); INLINE_CAPACITY]>,
    owner: K,
}

impl<K: Copy + Eq> PropertyStore<K> {
    /// Creates an empty store for `owner`.
    #[must_use]
    pub fn new(owner: K) -> Self {
        Self {
            entries: SmallVec::new(),
            owner,
        }
    }

    /// Returns the owner key.
    #[must_use]
    #[inline]
    pub fn owner(&self) -> K {
        self.owner
    }

    /// Returns `true` if no value is set explicitly.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of explicitly set values.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the ids with explicit values, in ascending order.
    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    #[inline]
    fn find(&self, id: PropertyId) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&id, |(pid, _)| *pid)
    }

    /// Returns the explicitly set value, if any.
    #[must_use]
    #[inline]
    pub fn get_local<T: Clone + 'static>(&self, property: Property<T>) -> Option<&T> {
        self.find(property.id())
            .ok()
            .and_then(|idx| self.entries[idx].1.downcast_ref())
    }

    /// Returns `true` if the property is set explicitly.
    #[must_use]
    #[inline]
    pub fn has_local<T: Clone + 'static>(&self, property: Property<T>) -> bool {
        self.find(property.id()).is_ok()
    }

    /// Returns the effective value: the explicit value, or the registry default.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered with value type `T`.
    #[must_use]
    pub fn get<'a, T: Clone + 'static>(
        &'a self,
        property: Property<T>,
        registry: &'a PropertyRegistry,
    ) -> &'a T {
        if let Some(value) = self.get_local(property) {
            return value;
        }
        match registry.get_metadata(property) {
            Some(metadata) => metadata.default_value(),
            None => panic!("Property {:?} not found in registry", property.id()),
        }
    }

    /// Writes a value and reports the change.
    ///
    /// The value is coerced first, then compared against the current effective
    /// value with the descriptor's equality rule. Unchanged writes store
    /// nothing and return `None`. Otherwise the value is stored, the changed
    /// callback runs, and a [`PropertyChanged`] record is returned.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered with value type `T`.
    pub fn set_value<T: Clone + 'static>(
        &mut self,
        property: Property<T>,
        value: T,
        registry: &PropertyRegistry,
    ) -> Option<PropertyChanged> {
        let change = self.store_value(property, value, registry)?;
        registry.run_changed_callback(property, &change);
        Some(change)
    }

    /// Like [`set_value`](Self::set_value), but leaves the changed callback
    /// to the caller.
    ///
    /// Owners that must react to the change first (invalidating layout, for
    /// one) call [`PropertyRegistry::run_changed_callback`] afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered with value type `T`.
    pub fn store_value<T: Clone + 'static>(
        &mut self,
        property: Property<T>,
        value: T,
        registry: &PropertyRegistry,
    ) -> Option<PropertyChanged> {
        let id = property.id();
        let (Some(registration), Some(metadata)) =
            (registry.get(id), registry.get_metadata(property))
        else {
            panic!("Property {id:?} not found in registry");
        };

        let value = metadata.coerce(value);
        let slot = self.find(id);
        let old = match slot {
            Ok(idx) => self.entries[idx].1.downcast_ref::<T>(),
            Err(_) => None,
        }
        .unwrap_or(metadata.default_value());
        if metadata.same_value(old, &value) {
            return None;
        }
        let old = old.clone();

        let stored = ErasedValue::new(value.clone());
        match slot {
            Ok(idx) => self.entries[idx].1 = stored,
            Err(idx) => self.entries.insert(idx, (id, stored)),
        }

        Some(PropertyChanged::new(
            id,
            registration.name(),
            registration.invalidation(),
            ErasedValue::new(old),
            ErasedValue::new(value),
        ))
    }

    /// Removes the explicit value and reports the change, if the effective
    /// value moved. The changed callback runs for a reported change.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered with value type `T`.
    pub fn clear_value<T: Clone + 'static>(
        &mut self,
        property: Property<T>,
        registry: &PropertyRegistry,
    ) -> Option<PropertyChanged> {
        let change = self.remove_value(property, registry)?;
        registry.run_changed_callback(property, &change);
        Some(change)
    }

    /// Like [`clear_value`](Self::clear_value), but leaves the changed
    /// callback to the caller.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered with value type `T`.
    pub fn remove_value<T: Clone + 'static>(
        &mut self,
        property: Property<T>,
        registry: &PropertyRegistry,
    ) -> Option<PropertyChanged> {
        let id = property.id();
        let (Some(registration), Some(metadata)) =
            (registry.get(id), registry.get_metadata(property))
        else {
            panic!("Property {id:?} not found in registry");
        };

        let idx = self.find(id).ok()?;
        let (_, old) = self.entries.remove(idx);
        let old = old.into_inner::<T>().ok()?;
        let default = metadata.default_value();
        if metadata.same_value(&old, default) {
            return None;
        }

        Some(PropertyChanged::new(
            id,
            registration.name(),
            registration.invalidation(),
            ErasedValue::new(old),
            ErasedValue::new(default.clone()),
        ))
    }

    /// Drops every explicit value without notifications.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }
}
