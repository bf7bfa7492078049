// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding failures.

/// Errors raised while resolving or updating a binding.
///
/// All of these are contract violations: the caller aborts the operation that
/// produced them. A missing data context is not an error; bindings simply stay
/// unattached until one appears.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// A value could not be converted to the type on the other side.
    #[error("cannot convert {from} value to {to}")]
    Conversion {
        /// Type name of the value.
        from: &'static str,
        /// Type name of the destination.
        to: &'static str,
    },
    /// The data context is not of the type the accessor reads.
    #[error("data context is not a {expected}")]
    SourceType {
        /// Type name the accessor expects.
        expected: &'static str,
    },
    /// A write was attempted through an accessor without a setter.
    #[error("property `{property}` has no setter")]
    ReadOnly {
        /// Name of the read-only property.
        property: &'static str,
    },
    /// The two halves of a two-way binding resolve differently.
    #[error("two-way binding halves use different resolution modes")]
    ModeMismatch,
    /// The binding was used after it was disposed.
    #[error("binding was disposed")]
    Disposed,
}

impl BindingError {
    pub(crate) fn conversion<V: ?Sized, T: ?Sized>() -> Self {
        Self::Conversion {
            from: core::any::type_name::<V>(),
            to: core::any::type_name::<T>(),
        }
    }
}
