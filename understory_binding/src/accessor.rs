// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed property accessors.

use core::fmt;

use crate::error::BindingError;

/// Reads (and optionally writes) one named property of a source type `S`.
///
/// The name is the one the source passes to
/// [`Notifier::notify`](crate::Notifier::notify), so a binding can filter
/// change notifications down to the property it reads.
///
/// Setters take `&S`: sources are shared (`Rc`) and use interior mutability.
///
/// ```rust
/// use std::cell::Cell;
/// use understory_binding::{Accessor, Notifier, Observable};
///
/// struct Counter {
///     count: Cell<u32>,
///     notifier: Notifier,
/// }
///
/// impl Observable for Counter {
///     fn notifier(&self) -> &Notifier {
///         &self.notifier
///     }
/// }
///
/// const COUNT: Accessor<Counter, u32> = Accessor::read_write(
///     "Count",
///     |c| c.count.get(),
///     |c, v| {
///         c.count.set(v);
///         c.notifier.notify("Count");
///     },
/// );
///
/// let counter = Counter { count: Cell::new(1), notifier: Notifier::new() };
/// COUNT.set(&counter, 5).unwrap();
/// assert_eq!(COUNT.get(&counter), 5);
/// ```
pub struct Accessor<S, V> {
    name: &'static str,
    get: fn(&S) -> V,
    set: Option<fn(&S, V)>,
}

impl<S, V> Accessor<S, V> {
    /// An accessor without a setter.
    #[must_use]
    pub const fn read_only(name: &'static str, get: fn(&S) -> V) -> Self {
        Self {
            name,
            get,
            set: None,
        }
    }

    /// An accessor with a getter and a setter.
    #[must_use]
    pub const fn read_write(name: &'static str, get: fn(&S) -> V, set: fn(&S, V)) -> Self {
        Self {
            name,
            get,
            set: Some(set),
        }
    }

    /// The property name used for change notifications.
    #[must_use]
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the accessor can write.
    #[must_use]
    #[inline]
    pub const fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    /// Reads the property.
    #[inline]
    pub fn get(&self, source: &S) -> V {
        (self.get)(source)
    }

    /// Writes the property.
    ///
    /// # Errors
    ///
    /// [`BindingError::ReadOnly`] if the accessor has no setter.
    pub fn set(&self, source: &S, value: V) -> Result<(), BindingError> {
        let set = self
            .set
            .ok_or(BindingError::ReadOnly { property: self.name })?;
        set(source, value);
        Ok(())
    }
}

impl<S, V> Clone for Accessor<S, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, V> Copy for Accessor<S, V> {}

impl<S, V> fmt::Debug for Accessor<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("name", &self.name)
            .field("writable", &self.is_writable())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct Model {
        value: Cell<i32>,
    }

    const VALUE: Accessor<Model, i32> =
        Accessor::read_write("Value", |m| m.value.get(), |m, v| m.value.set(v));
    const DOUBLED: Accessor<Model, i32> = Accessor::read_only("Doubled", |m| m.value.get() * 2);

    #[test]
    fn reads_and_writes() {
        let model = Model {
            value: Cell::new(2),
        };
        assert_eq!(VALUE.get(&model), 2);
        VALUE.set(&model, 7).unwrap();
        assert_eq!(DOUBLED.get(&model), 14);
        assert_eq!(VALUE.name(), "Value");
    }

    #[test]
    fn read_only_rejects_writes() {
        let model = Model {
            value: Cell::new(1),
        };
        assert!(!DOUBLED.is_writable());
        assert_eq!(
            DOUBLED.set(&model, 3),
            Err(BindingError::ReadOnly {
                property: "Doubled"
            })
        );
        assert_eq!(model.value.get(), 1);
    }
}
