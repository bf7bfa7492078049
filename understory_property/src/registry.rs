// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Descriptor registry.
//!
//! [`PropertyRegistry`] is an arena of immutable descriptors indexed by
//! [`PropertyId`]. A descriptor is identified by its name together with the
//! type that owns it, so two element kinds may both declare a `"Text"`
//! property without clashing.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use hashbrown::HashMap;

use crate::change::PropertyChanged;
use crate::id::{Property, PropertyId};
use crate::invalidation::Invalidation;
use crate::metadata::PropertyMetadata;

/// Owner used by [`PropertyRegistry::register`] for properties that belong
/// to every object (size, margin, data context, ...).
enum Shared {}

/// One registered descriptor.
pub struct PropertyRegistration {
    name: &'static str,
    owner: TypeId,
    owner_name: &'static str,
    type_id: TypeId,
    metadata: Box<dyn ErasedMetadata>,
}

impl PropertyRegistration {
    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the [`TypeId`] of the owner type.
    #[must_use]
    #[inline]
    pub fn owner(&self) -> TypeId {
        self.owner
    }

    /// Returns the owner type name, for diagnostics.
    #[must_use]
    #[inline]
    pub fn owner_name(&self) -> &'static str {
        self.owner_name
    }

    /// Returns the [`TypeId`] of the value type.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the layout passes a change invalidates.
    #[must_use]
    #[inline]
    pub fn invalidation(&self) -> Invalidation {
        self.metadata.invalidation()
    }

    /// Returns whether the property inherits.
    #[must_use]
    #[inline]
    pub fn inherits(&self) -> bool {
        self.metadata.inherits()
    }
}

impl core::fmt::Debug for PropertyRegistration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyRegistration")
            .field("name", &self.name)
            .field("owner", &self.owner_name)
            .field("inherits", &self.inherits())
            .field("invalidation", &self.invalidation())
            .finish_non_exhaustive()
    }
}

/// Arena of descriptors.
///
/// Descriptors are registered once, at startup, and never change afterwards.
///
/// ```rust
/// use understory_property::{Invalidation, PropertyMetadataBuilder, PropertyRegistry};
///
/// struct TextBlock;
/// struct Button;
///
/// let mut registry = PropertyRegistry::new();
/// let text = registry.register_for::<TextBlock, String>(
///     "Text",
///     PropertyMetadataBuilder::new(String::new())
///         .invalidates(Invalidation::MEASURE)
///         .build(),
/// );
/// // Same name, different owner.
/// let label = registry.register_for::<Button, String>(
///     "Text",
///     PropertyMetadataBuilder::new(String::new()).build(),
/// );
///
/// assert_ne!(text.id(), label.id());
/// assert_eq!(registry.find::<TextBlock>("Text"), Some(text.id()));
/// assert_eq!(registry.name(label.id()), Some("Text"));
/// ```
#[derive(Default)]
pub struct PropertyRegistry {
    properties: Vec<PropertyRegistration>,
    by_key: HashMap<(TypeId, &'static str), PropertyId>,
}

impl PropertyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a property shared by all objects.
    ///
    /// # Panics
    ///
    /// Panics if a shared property with the same name exists, or if the
    /// registry is full.
    pub fn register<T: Clone + 'static>(
        &mut self,
        name: &'static str,
        metadata: PropertyMetadata<T>,
    ) -> Property<T> {
        self.register_for::<Shared, T>(name, metadata)
    }

    /// Registers a property owned by type `O`.
    ///
    /// # Panics
    ///
    /// Panics if `O` already owns a property with the same name, or if more
    /// than 65,535 properties are registered.
    pub fn register_for<O: ?Sized + 'static, T: Clone + 'static>(
        &mut self,
        name: &'static str,
        metadata: PropertyMetadata<T>,
    ) -> Property<T> {
        let owner = TypeId::of::<O>();
        assert!(
            !self.by_key.contains_key(&(owner, name)),
            "Property '{name}' is already registered for {}",
            core::any::type_name::<O>()
        );
        assert!(
            self.properties.len() < u16::MAX as usize,
            "Too many properties registered (max {})",
            u16::MAX
        );

        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = PropertyId::new(self.properties.len() as u16);

        self.properties.push(PropertyRegistration {
            name,
            owner,
            owner_name: core::any::type_name::<O>(),
            type_id: TypeId::of::<T>(),
            metadata: Box::new(metadata),
        });
        self.by_key.insert((owner, name), id);

        Property::from_id(id)
    }

    /// Returns the number of registered descriptors.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Looks up a property owned by `O`.
    #[must_use]
    pub fn find<O: ?Sized + 'static>(&self, name: &'static str) -> Option<PropertyId> {
        self.by_key.get(&(TypeId::of::<O>(), name)).copied()
    }

    /// Looks up a shared property by name.
    #[must_use]
    pub fn find_shared(&self, name: &'static str) -> Option<PropertyId> {
        self.find::<Shared>(name)
    }

    /// Returns the name of a property.
    #[must_use]
    pub fn name(&self, id: PropertyId) -> Option<&'static str> {
        self.properties.get(id.index() as usize).map(|r| r.name)
    }

    /// Returns the registration for a property.
    #[must_use]
    pub fn get(&self, id: PropertyId) -> Option<&PropertyRegistration> {
        self.properties.get(id.index() as usize)
    }

    /// Returns the layout passes a change of `id` invalidates.
    #[must_use]
    pub fn invalidation(&self, id: PropertyId) -> Invalidation {
        self.properties
            .get(id.index() as usize)
            .map(PropertyRegistration::invalidation)
            .unwrap_or_default()
    }

    /// Returns whether a property inherits.
    #[must_use]
    pub fn inherits(&self, id: PropertyId) -> bool {
        self.properties
            .get(id.index() as usize)
            .is_some_and(PropertyRegistration::inherits)
    }

    /// Returns the typed metadata of a property.
    ///
    /// Returns `None` if the id is unknown or was registered with another type.
    #[must_use]
    pub fn get_metadata<T: Clone + 'static>(
        &self,
        property: Property<T>,
    ) -> Option<&PropertyMetadata<T>> {
        self.properties
            .get(property.id().index() as usize)
            .and_then(|r| r.metadata.downcast_ref())
    }

    /// Runs the changed callback of `property` for a recorded change.
    ///
    /// Pairs with [`PropertyStore::store_value`](crate::PropertyStore::store_value)
    /// and [`PropertyStore::remove_value`](crate::PropertyStore::remove_value),
    /// which leave the callback to the caller. Does nothing if `change` is
    /// about another property.
    pub fn run_changed_callback<T: Clone + 'static>(
        &self,
        property: Property<T>,
        change: &PropertyChanged,
    ) {
        if !change.is(property) {
            return;
        }
        if let (Some(metadata), Some(old), Some(new)) = (
            self.get_metadata(property),
            change.old_value::<T>(),
            change.new_value::<T>(),
        ) {
            metadata.on_changed(old, new);
        }
    }

    /// Iterates over all descriptors in registration order.
    #[expect(clippy::cast_possible_truncation, reason = "index < len < u16::MAX")]
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &PropertyRegistration)> {
        self.properties
            .iter()
            .enumerate()
            .map(|(i, r)| (PropertyId::new(i as u16), r))
    }
}

impl core::fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("count", &self.properties.len())
            .field(
                "properties",
                &self.properties.iter().map(|r| r.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

trait ErasedMetadata: Any {
    fn as_any(&self) -> &dyn Any;
    fn invalidation(&self) -> Invalidation;
    fn inherits(&self) -> bool;
}

impl<T: Clone + 'static> ErasedMetadata for PropertyMetadata<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn invalidation(&self) -> Invalidation {
        Self::invalidation(self)
    }

    fn inherits(&self) -> bool {
        Self::inherits(self)
    }
}

impl dyn ErasedMetadata {
    fn downcast_ref<T: Clone + 'static>(&self) -> Option<&PropertyMetadata<T>> {
        self.as_any().downcast_ref()
    }
}
