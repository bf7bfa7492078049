// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Objects that own a property store.
//!
//! [`DependencyObject`] exposes an object's [`PropertyStore`] and its parent
//! key; [`DependencyObjectExt`] layers typed reads, notifying writes and
//! inherited lookup on top.

use crate::change::PropertyChanged;
use crate::id::Property;
use crate::registry::PropertyRegistry;
use crate::store::PropertyStore;

/// Resolves an object key to its store and its parent key.
///
/// Used by [`walk_inherited`]. Closures of the right shape implement it.
pub trait ParentLookup<'a, K: Copy + Eq + 'a> {
    /// Looks up the store and parent key for `key`.
    fn lookup(&self, key: K) -> Option<(&'a PropertyStore<K>, Option<K>)>;
}

impl<'a, K, F> ParentLookup<'a, K> for F
where
    K: Copy + Eq + 'a,
    F: Fn(K) -> Option<(&'a PropertyStore<K>, Option<K>)>,
{
    #[inline]
    fn lookup(&self, key: K) -> Option<(&'a PropertyStore<K>, Option<K>)> {
        self(key)
    }
}

/// Walks up from `current_key` and returns the first explicitly set value.
///
/// Ancestors without a local value are skipped. Returns `None` when the chain
/// ends (or a key cannot be resolved) without finding one.
pub fn walk_inherited<'a, K, T, F>(
    mut current_key: Option<K>,
    property: Property<T>,
    store_lookup: &F,
) -> Option<&'a T>
where
    K: Copy + Eq + 'a,
    T: Clone + 'static,
    F: ParentLookup<'a, K> + ?Sized,
{
    while let Some(key) = current_key {
        let (store, parent) = store_lookup.lookup(key)?;
        if let Some(value) = store.get_local(property) {
            return Some(value);
        }
        current_key = parent;
    }
    None
}

/// An object with a property store and an optional parent.
///
/// ```rust
/// use understory_property::{DependencyObject, PropertyStore};
///
/// struct Node {
///     key: u32,
///     parent: Option<u32>,
///     store: PropertyStore<u32>,
/// }
///
/// impl DependencyObject<u32> for Node {
///     fn property_store(&self) -> &PropertyStore<u32> {
///         &self.store
///     }
///
///     fn property_store_mut(&mut self) -> &mut PropertyStore<u32> {
///         &mut self.store
///     }
///
///     fn key(&self) -> u32 {
///         self.key
///     }
///
///     fn parent_key(&self) -> Option<u32> {
///         self.parent
///     }
/// }
/// ```
pub trait DependencyObject<K: Copy + Eq> {
    /// Returns the object's store.
    fn property_store(&self) -> &PropertyStore<K>;

    /// Returns the object's store mutably.
    fn property_store_mut(&mut self) -> &mut PropertyStore<K>;

    /// Returns the key identifying this object.
    fn key(&self) -> K;

    /// Returns the parent's key, used for inherited lookup.
    fn parent_key(&self) -> Option<K>;
}

/// Convenience methods for [`DependencyObject`].
pub trait DependencyObjectExt<K: Copy + Eq>: DependencyObject<K> {
    /// Returns the effective value (explicit value or default).
    fn get_value<'a, T: Clone + 'static>(
        &'a self,
        property: Property<T>,
        registry: &'a PropertyRegistry,
    ) -> &'a T
    where
        K: 'a,
    {
        self.property_store().get(property, registry)
    }

    /// Returns the effective value, consulting ancestors for inheriting
    /// properties.
    ///
    /// Resolution order: own explicit value, then (if the descriptor inherits)
    /// the nearest ancestor with an explicit value, then the default.
    ///
    /// ```rust
    /// use understory_property::{
    ///     DependencyObject, DependencyObjectExt, PropertyMetadataBuilder, PropertyRegistry,
    ///     PropertyStore,
    /// };
    ///
    /// let mut registry = PropertyRegistry::new();
    /// let theme = registry.register(
    ///     "Theme",
    ///     PropertyMetadataBuilder::new("light").inherits(true).build(),
    /// );
    ///
    /// struct Node { key: u32, parent: Option<u32>, store: PropertyStore<u32> }
    /// impl DependencyObject<u32> for Node {
    ///     fn property_store(&self) -> &PropertyStore<u32> { &self.store }
    ///     fn property_store_mut(&mut self) -> &mut PropertyStore<u32> { &mut self.store }
    ///     fn key(&self) -> u32 { self.key }
    ///     fn parent_key(&self) -> Option<u32> { self.parent }
    /// }
    ///
    /// let mut nodes = vec![
    ///     Node { key: 0, parent: None, store: PropertyStore::new(0) },
    ///     Node { key: 1, parent: Some(0), store: PropertyStore::new(1) },
    ///     Node { key: 2, parent: Some(1), store: PropertyStore::new(2) },
    /// ];
    /// nodes[0].set_value(theme, "dark", &registry);
    ///
    /// let lookup = |key: u32| {
    ///     nodes.get(key as usize).map(|n| (n.property_store(), n.parent_key()))
    /// };
    /// assert_eq!(*nodes[2].get_inherited(theme, &registry, &lookup), "dark");
    /// ```
    fn get_inherited<'a, T, F>(
        &'a self,
        property: Property<T>,
        registry: &'a PropertyRegistry,
        store_lookup: &F,
    ) -> &'a T
    where
        K: 'a,
        T: Clone + 'static,
        F: ParentLookup<'a, K> + ?Sized,
    {
        if let Some(value) = self.property_store().get_local(property) {
            return value;
        }
        if registry.inherits(property.id())
            && let Some(value) = walk_inherited(self.parent_key(), property, store_lookup)
        {
            return value;
        }
        self.property_store().get(property, registry)
    }

    /// Writes a value; see [`PropertyStore::set_value`].
    fn set_value<T: Clone + 'static>(
        &mut self,
        property: Property<T>,
        value: T,
        registry: &PropertyRegistry,
    ) -> Option<PropertyChanged> {
        self.property_store_mut()
            .set_value(property, value, registry)
    }

    /// Clears a value; see [`PropertyStore::clear_value`].
    fn clear_value<T: Clone + 'static>(
        &mut self,
        property: Property<T>,
        registry: &PropertyRegistry,
    ) -> Option<PropertyChanged> {
        self.property_store_mut().clear_value(property, registry)
    }

    /// Returns `true` if the property is set explicitly on this object.
    fn has_local<T: Clone + 'static>(&self, property: Property<T>) -> bool {
        self.property_store().has_local(property)
    }
}

impl<K: Copy + Eq, T: DependencyObject<K>> DependencyObjectExt<K> for T {}
