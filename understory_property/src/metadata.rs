// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Descriptor metadata.
//!
//! [`PropertyMetadata`] is the immutable configuration of one descriptor;
//! [`PropertyMetadataBuilder`] builds it.

use alloc::boxed::Box;

use crate::invalidation::Invalidation;

/// Callback invoked after a value changed, with the old and the new value.
pub type PropertyChangedCallback<T> = Box<dyn Fn(&T, &T)>;

/// Callback that rewrites a proposed value before it is compared and stored.
pub type CoerceValueCallback<T> = Box<dyn Fn(T) -> T>;

/// Equality rule deciding whether a write is a change.
pub type EqualityFn<T> = fn(&T, &T) -> bool;

/// Metadata for one descriptor.
///
/// # Example
///
/// ```rust
/// use understory_property::{Invalidation, PropertyMetadataBuilder};
///
/// let metadata = PropertyMetadataBuilder::new(0.0_f64)
///     .invalidates(Invalidation::ARRANGE)
///     .equality(|a, b| (a - b).abs() < 1e-9)
///     .build();
///
/// assert_eq!(metadata.default_value(), &0.0);
/// assert!(metadata.same_value(&1.0, &(1.0 + 1e-12)));
/// assert_eq!(metadata.invalidation(), Invalidation::ARRANGE);
/// ```
pub struct PropertyMetadata<T: Clone + 'static> {
    default_value: T,
    inherits: bool,
    invalidation: Invalidation,
    equality: EqualityFn<T>,
    changed_callback: Option<PropertyChangedCallback<T>>,
    coerce_callback: Option<CoerceValueCallback<T>>,
}

impl<T: Clone + 'static> PropertyMetadata<T> {
    /// Returns the default value.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Returns whether unset values are looked up on ancestors.
    #[must_use]
    #[inline]
    pub fn inherits(&self) -> bool {
        self.inherits
    }

    /// Returns the layout passes a change invalidates.
    #[must_use]
    #[inline]
    pub fn invalidation(&self) -> Invalidation {
        self.invalidation
    }

    /// Compares two values with the descriptor's equality rule.
    #[must_use]
    #[inline]
    pub fn same_value(&self, a: &T, b: &T) -> bool {
        (self.equality)(a, b)
    }

    /// Runs the changed callback, if any.
    #[inline]
    pub fn on_changed(&self, old_value: &T, new_value: &T) {
        if let Some(callback) = &self.changed_callback {
            callback(old_value, new_value);
        }
    }

    /// Runs the coerce callback, if any.
    #[inline]
    pub fn coerce(&self, value: T) -> T {
        match &self.coerce_callback {
            Some(callback) => callback(value),
            None => value,
        }
    }

    /// Returns whether a changed callback is set.
    #[must_use]
    #[inline]
    pub fn has_changed_callback(&self) -> bool {
        self.changed_callback.is_some()
    }
}

impl<T: Clone + core::fmt::Debug + 'static> core::fmt::Debug for PropertyMetadata<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyMetadata")
            .field("default_value", &self.default_value)
            .field("inherits", &self.inherits)
            .field("invalidation", &self.invalidation)
            .field("has_changed_callback", &self.changed_callback.is_some())
            .field("has_coerce_callback", &self.coerce_callback.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`PropertyMetadata`].
///
/// ```rust
/// use understory_property::{Invalidation, PropertyMetadataBuilder};
///
/// let metadata = PropertyMetadataBuilder::new(1_u32)
///     .invalidates(Invalidation::MEASURE)
///     .coerce(|v| v.max(1))
///     .build();
///
/// assert_eq!(metadata.coerce(0), 1);
/// ```
pub struct PropertyMetadataBuilder<T: Clone + 'static> {
    default_value: T,
    inherits: bool,
    invalidation: Invalidation,
    equality: EqualityFn<T>,
    changed_callback: Option<PropertyChangedCallback<T>>,
    coerce_callback: Option<CoerceValueCallback<T>>,
}

impl<T: Clone + PartialEq + 'static> PropertyMetadataBuilder<T> {
    /// Starts a builder whose equality rule is `PartialEq`.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        Self::with_equality(default_value, <T as PartialEq>::eq)
    }
}

impl<T: Clone + 'static> PropertyMetadataBuilder<T> {
    /// Starts a builder for a type without `PartialEq` (or with a custom rule).
    #[must_use]
    pub fn with_equality(default_value: T, equality: EqualityFn<T>) -> Self {
        Self {
            default_value,
            inherits: false,
            invalidation: Invalidation::empty(),
            equality,
            changed_callback: None,
            coerce_callback: None,
        }
    }

    /// Sets whether unset values are looked up on ancestors.
    #[must_use]
    pub fn inherits(mut self, inherits: bool) -> Self {
        self.inherits = inherits;
        self
    }

    /// Sets the layout passes a change invalidates.
    #[must_use]
    pub fn invalidates(mut self, invalidation: Invalidation) -> Self {
        self.invalidation = invalidation;
        self
    }

    /// Replaces the equality rule.
    #[must_use]
    pub fn equality(mut self, equality: EqualityFn<T>) -> Self {
        self.equality = equality;
        self
    }

    /// Sets a callback that runs after every change.
    #[must_use]
    pub fn on_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T, &T) + 'static,
    {
        self.changed_callback = Some(Box::new(callback));
        self
    }

    /// Sets a callback that rewrites values before they are compared and stored.
    #[must_use]
    pub fn coerce<F>(mut self, callback: F) -> Self
    where
        F: Fn(T) -> T + 'static,
    {
        self.coerce_callback = Some(Box::new(callback));
        self
    }

    /// Builds the [`PropertyMetadata`].
    #[must_use]
    pub fn build(self) -> PropertyMetadata<T> {
        PropertyMetadata {
            default_value: self.default_value,
            inherits: self.inherits,
            invalidation: self.invalidation,
            equality: self.equality,
            changed_callback: self.changed_callback,
            coerce_callback: self.coerce_callback,
        }
    }
}

impl<T: Clone + core::fmt::Debug + 'static> core::fmt::Debug for PropertyMetadataBuilder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyMetadataBuilder")
            .field("default_value", &self.default_value)
            .field("inherits", &self.inherits)
            .field("invalidation", &self.invalidation)
            .finish_non_exhaustive()
    }
}
