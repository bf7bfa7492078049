// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased data contexts.

use alloc::rc::Rc;
use core::any::Any;
use core::fmt;

/// The ambient data object a subtree's deferred bindings resolve against.
///
/// A `DataContext` is a shared handle; clones refer to the same object and
/// compare equal. Equality is identity, not value equality, so re-assigning
/// the same object is not a change.
///
/// ```rust
/// use std::rc::Rc;
/// use understory_binding::DataContext;
///
/// struct Person {
///     name: String,
/// }
///
/// let person = Rc::new(Person { name: "Ada".into() });
/// let context = DataContext::new(person.clone());
///
/// assert_eq!(context.downcast::<Person>().map(|p| p.name.clone()).as_deref(), Some("Ada"));
/// assert!(context.downcast::<String>().is_none());
/// assert_eq!(context, DataContext::new(person));
/// ```
#[derive(Clone)]
pub struct DataContext {
    object: Rc<dyn Any>,
    type_name: &'static str,
}

impl DataContext {
    /// Wraps a shared object.
    #[must_use]
    pub fn new<T: 'static>(object: Rc<T>) -> Self {
        Self {
            object,
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Wraps an owned object.
    #[must_use]
    pub fn from_value<T: 'static>(object: T) -> Self {
        Self::new(Rc::new(object))
    }

    /// Returns the object if it is a `T`.
    #[must_use]
    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        self.object.clone().downcast::<T>().ok()
    }

    /// Returns `true` if the object is a `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.object.is::<T>()
    }

    /// Returns the object's type name, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.object, &other.object)
    }
}

impl PartialEq for DataContext {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for DataContext {}

impl fmt::Debug for DataContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataContext")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}
