// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change records produced by notifying writes.

use crate::id::{Property, PropertyId};
use crate::invalidation::Invalidation;
use crate::value::ErasedValue;

/// Describes one effective change of a property value.
///
/// Produced by [`PropertyStore::set_value`](crate::PropertyStore::set_value)
/// and [`PropertyStore::clear_value`](crate::PropertyStore::clear_value); never
/// produced for writes that leave the value unchanged.
#[derive(Clone, Debug)]
pub struct PropertyChanged {
    id: PropertyId,
    name: &'static str,
    invalidation: Invalidation,
    old: ErasedValue,
    new: ErasedValue,
}

impl PropertyChanged {
    pub(crate) fn new(
        id: PropertyId,
        name: &'static str,
        invalidation: Invalidation,
        old: ErasedValue,
        new: ErasedValue,
    ) -> Self {
        Self {
            id,
            name,
            invalidation,
            old,
            new,
        }
    }

    /// The changed property.
    #[must_use]
    #[inline]
    pub fn id(&self) -> PropertyId {
        self.id
    }

    /// The registered name of the changed property.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The layout passes the owner must invalidate.
    #[must_use]
    #[inline]
    pub fn invalidation(&self) -> Invalidation {
        self.invalidation
    }

    /// Returns `true` if this record is about `property`.
    #[must_use]
    #[inline]
    pub fn is<T>(&self, property: Property<T>) -> bool {
        self.id == property.id()
    }

    /// The value before the change.
    #[must_use]
    pub fn old_value<T: 'static>(&self) -> Option<&T> {
        self.old.downcast_ref()
    }

    /// The value after the change.
    #[must_use]
    pub fn new_value<T: 'static>(&self) -> Option<&T> {
        self.new.downcast_ref()
    }

    /// The value after the change, type-erased.
    #[must_use]
    #[inline]
    pub fn new_erased(&self) -> &ErasedValue {
        &self.new
    }
}
