// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding kinds and their resolution.
//!
//! A binding links one target property (owned by whoever holds the binding)
//! to one property of a source object, read and written through an
//! [`Accessor`]. The target side is abstract: values flowing to the target are
//! handed to a [`Sink`], and the owner reports target-side changes through
//! [`Binding::target_changed`].
//!
//! ## Resolution
//!
//! [`Binding::resolve`] is called by the owner whenever it is about to use the
//! bound value (in the layout crate: every measure of the target element).
//!
//! - [`ResolutionMode::Immediate`] bindings were given their source at
//!   construction. The first call attaches; later calls do nothing.
//! - [`ResolutionMode::Deferred`] bindings resolve against the data context
//!   passed in. No context detaches. The same context (by identity) is a
//!   no-op. A new context is downcast to the source type, the previous
//!   subscription is released and the binding attaches to the new source.
//!
//! Attaching a source-to-target binding pushes the current source value
//! through the sink, then subscribes to change notifications filtered by the
//! accessor's property name. Attaching a target-to-source binding captures
//! the source and pushes the target's current value into it.

use alloc::rc::Rc;
use core::fmt;
use core::marker::PhantomData;

use crate::accessor::Accessor;
use crate::coerce::CoerceFrom;
use crate::context::DataContext;
use crate::error::BindingError;
use crate::notify::{Observable, Subscription};

/// How a binding finds its source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionMode {
    /// The source was supplied at construction.
    Immediate,
    /// The source is the nearest inherited data context.
    Deferred,
}

/// Receives values flowing from a source to the target.
///
/// Conversion failures after attachment are delivered as `Err` since there is
/// no caller to return them to.
pub type Sink<T> = Rc<dyn Fn(Result<T, BindingError>)>;

/// A binding targeting a property of type `T`.
pub trait Binding<T> {
    /// The binding's resolution mode.
    fn mode(&self) -> ResolutionMode;

    /// Attaches to, re-attaches to or detaches from a source.
    ///
    /// `context` is the nearest data context (ignored by immediate bindings)
    /// and `current` is the target property's current value.
    ///
    /// # Errors
    ///
    /// - [`BindingError::SourceType`] if the context is not of the source type.
    /// - [`BindingError::Conversion`] if the initial value does not convert.
    /// - [`BindingError::ReadOnly`] if a target-to-source push has no setter.
    /// - [`BindingError::Disposed`] after [`dispose`](Self::dispose).
    fn resolve(
        &mut self,
        context: Option<&DataContext>,
        current: &T,
        sink: &Sink<T>,
    ) -> Result<(), BindingError>;

    /// Reports that the target property changed to `value`.
    ///
    /// # Errors
    ///
    /// Conversion and setter failures of the write back to the source, or
    /// [`BindingError::Disposed`].
    fn target_changed(&mut self, value: &T) -> Result<(), BindingError>;

    /// Releases the source subscription. Idempotent.
    fn dispose(&mut self);

    /// Returns `true` once disposed.
    fn is_disposed(&self) -> bool;
}

fn downcast_source<S: 'static>(context: &DataContext) -> Result<Rc<S>, BindingError> {
    context.downcast::<S>().ok_or(BindingError::SourceType {
        expected: core::any::type_name::<S>(),
    })
}

fn same_context(attached: Option<&DataContext>, context: &DataContext) -> bool {
    attached.is_some_and(|attached| attached.ptr_eq(context))
}

/// Source-to-target binding.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_binding::{Binding, BindingError, ObservableValue, OneWayBinding, Sink};
///
/// let source = Rc::new(ObservableValue::new(1_u8));
/// let mut binding: OneWayBinding<_, _, String> =
///     OneWayBinding::immediate(source.clone(), ObservableValue::accessor());
///
/// let received = Rc::new(RefCell::new(Vec::new()));
/// let log = received.clone();
/// let sink: Sink<String> = Rc::new(move |value: Result<String, BindingError>| {
///     log.borrow_mut().push(value.unwrap());
/// });
///
/// binding.resolve(None, &String::new(), &sink).unwrap();
/// source.set(2);
/// assert_eq!(*received.borrow(), ["1", "2"]);
/// ```
pub struct OneWayBinding<S, V, T> {
    accessor: Accessor<S, V>,
    mode: ResolutionMode,
    source: Option<Rc<S>>,
    context: Option<DataContext>,
    subscription: Option<Subscription>,
    disposed: bool,
    _target: PhantomData<fn() -> T>,
}

impl<S, V, T> OneWayBinding<S, V, T>
where
    S: Observable + 'static,
    V: 'static,
    T: CoerceFrom<V> + 'static,
{
    /// A binding to a known source.
    #[must_use]
    pub fn immediate(source: Rc<S>, accessor: Accessor<S, V>) -> Self {
        Self::with_mode(ResolutionMode::Immediate, Some(source), accessor)
    }

    /// A binding to the nearest data context.
    #[must_use]
    pub fn deferred(accessor: Accessor<S, V>) -> Self {
        Self::with_mode(ResolutionMode::Deferred, None, accessor)
    }

    fn with_mode(mode: ResolutionMode, source: Option<Rc<S>>, accessor: Accessor<S, V>) -> Self {
        Self {
            accessor,
            mode,
            source,
            context: None,
            subscription: None,
            disposed: false,
            _target: PhantomData,
        }
    }

    /// Returns `true` while subscribed to a source.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    fn attach(&mut self, source: &Rc<S>, sink: &Sink<T>) -> Result<(), BindingError> {
        let value = T::coerce_from(self.accessor.get(source))?;
        let accessor = self.accessor;
        let weak = Rc::downgrade(source);
        let forward = sink.clone();
        self.subscription = Some(source.notifier().subscribe_property(
            accessor.name(),
            move || {
                if let Some(source) = weak.upgrade() {
                    forward(T::coerce_from(accessor.get(&source)));
                }
            },
        ));
        sink(Ok(value));
        Ok(())
    }

    fn release(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }
}

impl<S, V, T> Binding<T> for OneWayBinding<S, V, T>
where
    S: Observable + 'static,
    V: 'static,
    T: CoerceFrom<V> + 'static,
{
    fn mode(&self) -> ResolutionMode {
        self.mode
    }

    fn resolve(
        &mut self,
        context: Option<&DataContext>,
        _current: &T,
        sink: &Sink<T>,
    ) -> Result<(), BindingError> {
        if self.disposed {
            return Err(BindingError::Disposed);
        }
        match self.mode {
            ResolutionMode::Immediate => {
                if self.is_attached() {
                    return Ok(());
                }
                let Some(source) = self.source.clone() else {
                    return Ok(());
                };
                self.attach(&source, sink)
            }
            ResolutionMode::Deferred => {
                let Some(context) = context else {
                    self.release();
                    self.context = None;
                    return Ok(());
                };
                if same_context(self.context.as_ref(), context) {
                    return Ok(());
                }
                let source = downcast_source::<S>(context)?;
                self.release();
                self.context = None;
                self.attach(&source, sink)?;
                self.context = Some(context.clone());
                Ok(())
            }
        }
    }

    fn target_changed(&mut self, _value: &T) -> Result<(), BindingError> {
        if self.disposed {
            return Err(BindingError::Disposed);
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.release();
        self.source = None;
        self.context = None;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<S, V, T> fmt::Debug for OneWayBinding<S, V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneWayBinding")
            .field("property", &self.accessor.name())
            .field("mode", &self.mode)
            .field("attached", &self.subscription.is_some())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

/// Target-to-source binding.
///
/// ```rust
/// use std::rc::Rc;
/// use understory_binding::{Binding, BindingError, ObservableValue, OneWayToSourceBinding, Sink};
///
/// let source = Rc::new(ObservableValue::new(0.0_f64));
/// let mut binding: OneWayToSourceBinding<_, u8, f64> =
///     OneWayToSourceBinding::immediate(source.clone(), ObservableValue::accessor());
/// let sink: Sink<u8> = Rc::new(|_: Result<u8, BindingError>| {});
///
/// // Attaching pushes the target's current value.
/// binding.resolve(None, &3, &sink).unwrap();
/// assert_eq!(source.get(), 3.0);
///
/// binding.target_changed(&7).unwrap();
/// assert_eq!(source.get(), 7.0);
/// ```
pub struct OneWayToSourceBinding<S, T, V> {
    accessor: Accessor<S, V>,
    mode: ResolutionMode,
    source: Option<Rc<S>>,
    context: Option<DataContext>,
    target: Option<Rc<S>>,
    disposed: bool,
    _target: PhantomData<fn(T)>,
}

impl<S, T, V> OneWayToSourceBinding<S, T, V>
where
    S: 'static,
    T: Clone + 'static,
    V: CoerceFrom<T> + 'static,
{
    /// A binding writing to a known source.
    #[must_use]
    pub fn immediate(source: Rc<S>, accessor: Accessor<S, V>) -> Self {
        Self::with_mode(ResolutionMode::Immediate, Some(source), accessor)
    }

    /// A binding writing to the nearest data context.
    #[must_use]
    pub fn deferred(accessor: Accessor<S, V>) -> Self {
        Self::with_mode(ResolutionMode::Deferred, None, accessor)
    }

    fn with_mode(mode: ResolutionMode, source: Option<Rc<S>>, accessor: Accessor<S, V>) -> Self {
        Self {
            accessor,
            mode,
            source,
            context: None,
            target: None,
            disposed: false,
            _target: PhantomData,
        }
    }

    /// Returns `true` while a source is captured.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.target.is_some()
    }

    /// Captures the source for `context`. Returns the source if it was newly
    /// captured.
    pub(crate) fn capture(
        &mut self,
        context: Option<&DataContext>,
    ) -> Result<Option<Rc<S>>, BindingError> {
        if self.disposed {
            return Err(BindingError::Disposed);
        }
        let source = match self.mode {
            ResolutionMode::Immediate => {
                if self.is_attached() {
                    return Ok(None);
                }
                let Some(source) = self.source.clone() else {
                    return Ok(None);
                };
                source
            }
            ResolutionMode::Deferred => {
                let Some(context) = context else {
                    self.target = None;
                    self.context = None;
                    return Ok(None);
                };
                if same_context(self.context.as_ref(), context) {
                    return Ok(None);
                }
                let source = downcast_source::<S>(context)?;
                self.context = Some(context.clone());
                source
            }
        };
        self.target = Some(source.clone());
        Ok(Some(source))
    }

    fn write(&self, source: &S, value: &T) -> Result<(), BindingError> {
        let value = V::coerce_from(value.clone())?;
        self.accessor.set(source, value)
    }
}

impl<S, T, V> Binding<T> for OneWayToSourceBinding<S, T, V>
where
    S: 'static,
    T: Clone + 'static,
    V: CoerceFrom<T> + 'static,
{
    fn mode(&self) -> ResolutionMode {
        self.mode
    }

    fn resolve(
        &mut self,
        context: Option<&DataContext>,
        current: &T,
        _sink: &Sink<T>,
    ) -> Result<(), BindingError> {
        match self.capture(context)? {
            Some(source) => self.write(&source, current),
            None => Ok(()),
        }
    }

    fn target_changed(&mut self, value: &T) -> Result<(), BindingError> {
        if self.disposed {
            return Err(BindingError::Disposed);
        }
        match &self.target {
            Some(source) => self.write(source, value),
            None => Ok(()),
        }
    }

    fn dispose(&mut self) {
        self.source = None;
        self.context = None;
        self.target = None;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<S, T, V> fmt::Debug for OneWayToSourceBinding<S, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneWayToSourceBinding")
            .field("property", &self.accessor.name())
            .field("mode", &self.mode)
            .field("attached", &self.target.is_some())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

/// A source-to-target and a target-to-source binding sharing one resolution
/// mode.
///
/// On attach the source value wins: it is pushed to the target, and the
/// target's current value is not written back.
pub struct TwoWayBinding<S, V, T> {
    to_target: OneWayBinding<S, V, T>,
    to_source: OneWayToSourceBinding<S, T, V>,
}

impl<S, V, T> TwoWayBinding<S, V, T>
where
    S: Observable + 'static,
    V: CoerceFrom<T> + 'static,
    T: CoerceFrom<V> + Clone + 'static,
{
    /// Composes two bindings.
    ///
    /// # Errors
    ///
    /// [`BindingError::ModeMismatch`] if the halves resolve differently.
    pub fn new(
        to_target: OneWayBinding<S, V, T>,
        to_source: OneWayToSourceBinding<S, T, V>,
    ) -> Result<Self, BindingError> {
        if to_target.mode() != to_source.mode() {
            return Err(BindingError::ModeMismatch);
        }
        Ok(Self {
            to_target,
            to_source,
        })
    }

    /// A two-way binding to a known source.
    #[must_use]
    pub fn immediate(source: Rc<S>, accessor: Accessor<S, V>) -> Self {
        Self {
            to_target: OneWayBinding::immediate(source.clone(), accessor),
            to_source: OneWayToSourceBinding::immediate(source, accessor),
        }
    }

    /// A two-way binding to the nearest data context.
    #[must_use]
    pub fn deferred(accessor: Accessor<S, V>) -> Self {
        Self {
            to_target: OneWayBinding::deferred(accessor),
            to_source: OneWayToSourceBinding::deferred(accessor),
        }
    }

    /// Returns `true` while attached to a source.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.to_target.is_attached()
    }
}

impl<S, V, T> Binding<T> for TwoWayBinding<S, V, T>
where
    S: Observable + 'static,
    V: CoerceFrom<T> + 'static,
    T: CoerceFrom<V> + Clone + 'static,
{
    fn mode(&self) -> ResolutionMode {
        self.to_target.mode()
    }

    fn resolve(
        &mut self,
        context: Option<&DataContext>,
        current: &T,
        sink: &Sink<T>,
    ) -> Result<(), BindingError> {
        self.to_target.resolve(context, current, sink)?;
        self.to_source.capture(context)?;
        Ok(())
    }

    fn target_changed(&mut self, value: &T) -> Result<(), BindingError> {
        self.to_source.target_changed(value)
    }

    fn dispose(&mut self) {
        self.to_target.dispose();
        self.to_source.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.to_target.is_disposed()
    }
}

impl<S, V, T> fmt::Debug for TwoWayBinding<S, V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoWayBinding")
            .field("to_target", &self.to_target)
            .field("to_source", &self.to_source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notifier;
    use crate::observable::ObservableValue;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    struct Person {
        age: Cell<u32>,
        notifier: Notifier,
    }

    impl Person {
        fn new(age: u32) -> Rc<Self> {
            Rc::new(Self {
                age: Cell::new(age),
                notifier: Notifier::new(),
            })
        }
    }

    impl Observable for Person {
        fn notifier(&self) -> &Notifier {
            &self.notifier
        }
    }

    const AGE: Accessor<Person, u32> = Accessor::read_write(
        "Age",
        |p| p.age.get(),
        |p, v| {
            p.age.set(v);
            p.notifier.notify("Age");
        },
    );

    fn recording_sink<T: 'static>() -> (Rc<RefCell<Vec<Result<T, BindingError>>>>, Sink<T>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = log.clone();
        let sink: Sink<T> =
            Rc::new(move |value: Result<T, BindingError>| inner.borrow_mut().push(value));
        (log, sink)
    }

    #[test]
    fn deferred_waits_for_a_context() {
        let mut binding: OneWayBinding<Person, u32, u32> = OneWayBinding::deferred(AGE);
        let (log, sink) = recording_sink();

        binding.resolve(None, &0, &sink).unwrap();
        assert!(!binding.is_attached());
        assert!(log.borrow().is_empty());

        let person = Person::new(30);
        let context = DataContext::new(person.clone());
        binding.resolve(Some(&context), &0, &sink).unwrap();
        assert_eq!(*log.borrow(), [Ok(30)]);
        assert_eq!(person.notifier.subscriber_count(), 1);
    }

    #[test]
    fn same_context_is_not_resolved_twice() {
        let mut binding: OneWayBinding<Person, u32, u32> = OneWayBinding::deferred(AGE);
        let (log, sink) = recording_sink();
        let person = Person::new(1);
        let context = DataContext::new(person.clone());

        binding.resolve(Some(&context), &0, &sink).unwrap();
        binding.resolve(Some(&context.clone()), &0, &sink).unwrap();
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(person.notifier.subscriber_count(), 1);
    }

    #[test]
    fn switching_context_moves_the_subscription() {
        let mut binding: OneWayBinding<Person, u32, u32> = OneWayBinding::deferred(AGE);
        let (log, sink) = recording_sink();
        let first = Person::new(1);
        let second = Person::new(2);

        binding
            .resolve(Some(&DataContext::new(first.clone())), &0, &sink)
            .unwrap();
        binding
            .resolve(Some(&DataContext::new(second.clone())), &0, &sink)
            .unwrap();
        assert_eq!(first.notifier.subscriber_count(), 0);
        assert_eq!(second.notifier.subscriber_count(), 1);

        AGE.set(&first, 10).unwrap();
        AGE.set(&second, 20).unwrap();
        assert_eq!(*log.borrow(), [Ok(1), Ok(2), Ok(20)]);

        binding.resolve(None, &0, &sink).unwrap();
        assert_eq!(second.notifier.subscriber_count(), 0);
    }

    #[test]
    fn wrong_context_type_is_an_error() {
        let mut binding: OneWayBinding<Person, u32, u32> = OneWayBinding::deferred(AGE);
        let (_, sink) = recording_sink();
        let context = DataContext::from_value(String::from("not a person"));

        let err = binding.resolve(Some(&context), &0, &sink).unwrap_err();
        assert!(matches!(err, BindingError::SourceType { .. }));
    }

    #[test]
    fn later_conversion_failures_go_to_the_sink() {
        let person = Person::new(100);
        let mut binding: OneWayBinding<Person, u32, u8> =
            OneWayBinding::immediate(person.clone(), AGE);
        let (log, sink) = recording_sink();

        binding.resolve(None, &0, &sink).unwrap();
        AGE.set(&person, 1000).unwrap();
        let log = log.borrow();
        assert_eq!(log[0], Ok(100));
        assert!(matches!(log[1], Err(BindingError::Conversion { .. })));
    }

    #[test]
    fn initial_conversion_failure_is_returned() {
        let person = Person::new(1000);
        let mut binding: OneWayBinding<Person, u32, u8> = OneWayBinding::immediate(person, AGE);
        let (log, sink) = recording_sink();

        assert!(binding.resolve(None, &0, &sink).is_err());
        assert!(log.borrow().is_empty());
        assert!(!binding.is_attached());
    }

    #[test]
    fn dispose_is_idempotent() {
        let person = Person::new(5);
        let mut binding: OneWayBinding<Person, u32, u32> =
            OneWayBinding::immediate(person.clone(), AGE);
        let (_, sink) = recording_sink();
        binding.resolve(None, &0, &sink).unwrap();
        assert_eq!(person.notifier.subscriber_count(), 1);

        binding.dispose();
        binding.dispose();
        assert!(binding.is_disposed());
        assert_eq!(person.notifier.subscriber_count(), 0);
        assert_eq!(
            binding.resolve(None, &0, &sink),
            Err(BindingError::Disposed)
        );
    }

    #[test]
    fn to_source_pushes_on_resolve_and_on_change() {
        let person = Person::new(0);
        let mut binding: OneWayToSourceBinding<Person, String, u32> =
            OneWayToSourceBinding::deferred(AGE);
        let (_, sink) = recording_sink();
        let context = DataContext::new(person.clone());

        binding
            .resolve(Some(&context), &String::from("41"), &sink)
            .unwrap();
        assert_eq!(person.age.get(), 41);

        binding.target_changed(&String::from("42")).unwrap();
        assert_eq!(person.age.get(), 42);

        assert!(matches!(
            binding.target_changed(&String::from("old")),
            Err(BindingError::Conversion { .. })
        ));
    }

    #[test]
    fn to_source_without_setter_is_read_only() {
        const DOUBLED: Accessor<Person, u32> = Accessor::read_only("Doubled", |p| p.age.get() * 2);
        let person = Person::new(1);
        let mut binding: OneWayToSourceBinding<Person, u32, u32> =
            OneWayToSourceBinding::immediate(person, DOUBLED);
        let (_, sink) = recording_sink();

        assert_eq!(
            binding.resolve(None, &3, &sink),
            Err(BindingError::ReadOnly {
                property: "Doubled"
            })
        );
    }

    #[test]
    fn two_way_source_wins_on_attach() {
        let person = Person::new(7);
        let mut binding: TwoWayBinding<Person, u32, f64> =
            TwoWayBinding::immediate(person.clone(), AGE);
        let (log, sink) = recording_sink();

        binding.resolve(None, &99.0, &sink).unwrap();
        assert_eq!(person.age.get(), 7);
        assert_eq!(*log.borrow(), [Ok(7.0)]);

        binding.target_changed(&12.0).unwrap();
        assert_eq!(person.age.get(), 12);
        // The source notifies and the new value flows back to the target.
        assert_eq!(*log.borrow(), [Ok(7.0), Ok(12.0)]);
    }

    #[test]
    fn two_way_rejects_mixed_modes() {
        let person = Person::new(0);
        let result: Result<TwoWayBinding<Person, u32, u32>, _> = TwoWayBinding::new(
            OneWayBinding::immediate(person, AGE),
            OneWayToSourceBinding::deferred(AGE),
        );
        assert_eq!(result.err(), Some(BindingError::ModeMismatch));
    }

    #[test]
    fn observable_value_binds_by_value_name() {
        let cell = Rc::new(ObservableValue::new(1_i32));
        let mut binding: OneWayBinding<_, _, i64> =
            OneWayBinding::immediate(cell.clone(), ObservableValue::accessor());
        let (log, sink) = recording_sink();

        binding.resolve(None, &0, &sink).unwrap();
        cell.set(2);
        cell.set(2);
        assert_eq!(*log.borrow(), [Ok(1), Ok(2)]);
    }
}
