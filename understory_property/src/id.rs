// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Descriptor handles.
//!
//! [`PropertyId`] is the untyped index of a descriptor in a
//! [`PropertyRegistry`](crate::PropertyRegistry); [`Property<T>`] pairs it with
//! the value type so reads and writes are checked at compile time.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// Index of a registered descriptor.
///
/// Ids are handed out densely in registration order, so a registry with `n`
/// descriptors uses ids `0..n`.
///
/// ```rust
/// use understory_property::PropertyId;
///
/// let id = PropertyId::new(3);
/// assert_eq!(id.index(), 3);
/// assert_eq!(id.to_string(), "#3");
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(u16);

impl PropertyId {
    /// Creates an id from a raw registry index.
    ///
    /// Normally only [`PropertyRegistry::register`](crate::PropertyRegistry::register)
    /// calls this.
    #[must_use]
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the registry index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyId").field(&self.0).finish()
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed descriptor handle.
///
/// The phantom parameter ties the handle to the value type it was registered
/// with, so a `Property<f64>` can only be read as `f64`:
///
/// ```rust
/// use understory_property::{Property, PropertyMetadataBuilder, PropertyRegistry, PropertyStore};
///
/// let mut registry = PropertyRegistry::new();
/// let opacity: Property<f64> =
///     registry.register("Opacity", PropertyMetadataBuilder::new(1.0_f64).build());
///
/// let store = PropertyStore::<u32>::new(0);
/// let value: &f64 = store.get(opacity, &registry);
/// assert_eq!(*value, 1.0);
/// ```
///
/// The handle is `Copy` and the same size as [`PropertyId`].
pub struct Property<T> {
    id: PropertyId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Property<T> {
    /// Wraps a raw id.
    ///
    /// The id must have been registered with value type `T`; a mismatch makes
    /// typed reads fall back to the registry default or panic.
    #[must_use]
    #[inline]
    pub const fn from_id(id: PropertyId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped id.
    #[must_use]
    #[inline]
    pub const fn id(self) -> PropertyId {
        self.id
    }
}

// Manual impls so that `T` needs no bounds.

impl<T> Copy for Property<T> {}

impl<T> Clone for Property<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Property<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Property<T> {}

impl<T> Hash for Property<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.id)
            .field("type", &core::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::String;

    #[test]
    fn ids_order_by_index() {
        assert!(PropertyId::new(1) < PropertyId::new(2));
        assert_eq!(PropertyId::new(7), PropertyId::new(7));
    }

    #[test]
    fn id_formatting() {
        let id = PropertyId::new(12);
        assert_eq!(format!("{id:?}"), "PropertyId(12)");
        assert_eq!(format!("{id}"), "#12");
    }

    #[test]
    fn typed_handle_keeps_id() {
        let width: Property<f64> = Property::from_id(PropertyId::new(4));
        let copy = width;
        assert_eq!(copy.id().index(), 4);
        assert_eq!(width, copy);
    }

    #[test]
    fn typed_handle_debug_names_type() {
        let text: Property<String> = Property::from_id(PropertyId::new(0));
        assert!(format!("{text:?}").contains("String"));
    }

    #[test]
    fn handles_stay_compact() {
        use core::mem::size_of;
        assert_eq!(size_of::<Property<String>>(), size_of::<PropertyId>());
        assert_eq!(size_of::<PropertyId>(), 2);
    }
}
