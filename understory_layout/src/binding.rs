// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bindings attached to element properties.
//!
//! Sources notify at arbitrary times, usually while the tree is not borrowed.
//! Values are therefore never written straight into the tree: a binding's
//! sink queues a [`PendingWrites`] entry addressed to its element. Measuring
//! an element applies the writes addressed to it; [`RootElement::update`]
//! applies the whole queue before every pass.
//!
//! A measure never applies writes addressed to other elements. A sibling
//! that was already measured in the same pass would otherwise be invalidated
//! underneath a parent that marks itself valid when its measure returns.
//!
//! [`RootElement::update`]: crate::RootElement::update

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use understory_binding::{Binding, BindingError, DataContext, Sink};
use understory_property::{Property, PropertyChanged, PropertyId, PropertyRegistry, PropertyStore};

use crate::error::{LayoutError, Result};
use crate::id::ElementId;
use crate::tree::ElementTree;

type PendingWrite = Box<dyn FnOnce(&mut ElementTree) -> Result<()>>;

/// A shared queue of deferred tree writes.
///
/// Each write is optionally addressed to an element. Cloning yields another
/// handle to the same queue.
#[derive(Clone, Default)]
pub struct PendingWrites {
    queue: Rc<RefCell<VecDeque<(Option<ElementId>, PendingWrite)>>>,
}

impl PendingWrites {
    /// Queues a write. It runs at the next full flush, after earlier writes.
    pub fn push(&self, write: impl FnOnce(&mut ElementTree) -> Result<()> + 'static) {
        self.queue.borrow_mut().push_back((None, Box::new(write)));
    }

    /// Queues a write addressed to `target`.
    ///
    /// It runs at the next full flush or when `target` is next measured,
    /// whichever comes first.
    pub fn push_to(
        &self,
        target: ElementId,
        write: impl FnOnce(&mut ElementTree) -> Result<()> + 'static,
    ) {
        self.queue
            .borrow_mut()
            .push_back((Some(target), Box::new(write)));
    }

    /// Returns the number of writes addressed to `target`.
    #[must_use]
    pub fn len_for(&self, target: ElementId) -> usize {
        self.queue
            .borrow()
            .iter()
            .filter(|(addressed, _)| *addressed == Some(target))
            .count()
    }

    /// Returns the number of queued writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    fn pop(&self) -> Option<PendingWrite> {
        self.queue.borrow_mut().pop_front().map(|(_, write)| write)
    }

    fn pop_for(&self, target: ElementId) -> Option<PendingWrite> {
        let mut queue = self.queue.borrow_mut();
        let pos = queue
            .iter()
            .position(|(addressed, _)| *addressed == Some(target))?;
        queue.remove(pos).map(|(_, write)| write)
    }
}

impl fmt::Debug for PendingWrites {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWrites")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// A typed binding bound to one element property, with the type erased.
pub(crate) trait AttachedBinding {
    fn resolve(
        &mut self,
        store: &PropertyStore<ElementId>,
        registry: &PropertyRegistry,
        context: Option<&DataContext>,
    ) -> Result<(), BindingError>;

    fn target_changed(&mut self, change: &PropertyChanged) -> Result<(), BindingError>;

    fn dispose(&mut self);
}

struct BoundProperty<T> {
    property: Property<T>,
    binding: Box<dyn Binding<T>>,
    sink: Sink<T>,
}

impl<T: Clone + 'static> AttachedBinding for BoundProperty<T> {
    fn resolve(
        &mut self,
        store: &PropertyStore<ElementId>,
        registry: &PropertyRegistry,
        context: Option<&DataContext>,
    ) -> Result<(), BindingError> {
        let current = store.get(self.property, registry);
        self.binding.resolve(context, current, &self.sink)
    }

    fn target_changed(&mut self, change: &PropertyChanged) -> Result<(), BindingError> {
        match change.new_value::<T>() {
            Some(value) => self.binding.target_changed(value),
            None => Ok(()),
        }
    }

    fn dispose(&mut self) {
        self.binding.dispose();
    }
}

pub(crate) type BindingSlot = (PropertyId, Box<dyn AttachedBinding>);

impl ElementTree {
    /// Binds `property` of `id`.
    ///
    /// An existing binding on the same property is disposed and replaced.
    /// The binding attaches at the element's next measure, once the nearest
    /// data context is known; binding invalidates measure so that happens.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`] if `id` is not live.
    pub fn bind<T, B>(&mut self, id: ElementId, property: Property<T>, binding: B) -> Result<()>
    where
        T: Clone + 'static,
        B: Binding<T> + 'static,
    {
        let sink = self.sink_for(id, property);
        let bound: Box<dyn AttachedBinding> = Box::new(BoundProperty {
            property,
            binding: Box::new(binding),
            sink,
        });
        let data = self.data_mut(id)?;
        match data
            .bindings
            .iter_mut()
            .find(|(bound_id, _)| *bound_id == property.id())
        {
            Some((_, existing)) => {
                existing.dispose();
                *existing = bound;
            }
            None => data.bindings.push((property.id(), bound)),
        }
        tracing::trace!(element = ?id, property = ?property.id(), "bound property");
        self.invalidate_measure(id);
        Ok(())
    }

    /// Disposes and removes the binding on `property`, if any.
    ///
    /// Returns `true` if a binding was removed. The property keeps its last
    /// value.
    pub fn unbind<T>(&mut self, id: ElementId, property: Property<T>) -> bool {
        let Ok(data) = self.data_mut(id) else {
            return false;
        };
        let Some(pos) = data
            .bindings
            .iter()
            .position(|(bound_id, _)| *bound_id == property.id())
        else {
            return false;
        };
        let (_, mut binding) = data.bindings.remove(pos);
        binding.dispose();
        true
    }

    /// Returns the number of bindings on `id`.
    #[must_use]
    pub fn binding_count(&self, id: ElementId) -> usize {
        self.data(id).map_or(0, |data| data.bindings.len())
    }

    /// A handle to the queue of deferred writes.
    #[must_use]
    pub fn pending_writes(&self) -> PendingWrites {
        self.pending.clone()
    }

    /// Applies queued writes in order.
    ///
    /// Writes that target removed elements are dropped.
    ///
    /// # Errors
    ///
    /// Stops at the first failing write and returns its error. Later writes
    /// stay queued.
    pub fn flush_pending_writes(&mut self) -> Result<()> {
        let mut applied = 0_usize;
        while let Some(write) = self.pending.pop() {
            write(self)?;
            applied += 1;
        }
        if applied > 0 {
            tracing::trace!(applied, "applied pending writes");
        }
        Ok(())
    }

    /// Applies, in order, the queued writes addressed to `id`.
    ///
    /// Writes for other elements stay queued in their original order.
    pub(crate) fn flush_pending_writes_for(&mut self, id: ElementId) -> Result<()> {
        let mut applied = 0_usize;
        while let Some(write) = self.pending.pop_for(id) {
            write(self)?;
            applied += 1;
        }
        if applied > 0 {
            tracing::trace!(element = ?id, applied, "applied pending writes");
        }
        Ok(())
    }

    /// Attaches every binding of `id` to its source.
    pub(crate) fn resolve_bindings(&mut self, id: ElementId) -> Result<()> {
        let data = self.data_mut(id)?;
        if data.bindings.is_empty() {
            return Ok(());
        }
        let mut bindings = core::mem::take(&mut data.bindings);
        let context = self.data_context(id);
        let mut result = Ok(());
        if let Ok(data) = self.data(id) {
            for (property, binding) in &mut bindings {
                tracing::trace!(element = ?id, ?property, "resolving binding");
                if let Err(error) = binding.resolve(&data.store, &self.registry, context.as_ref()) {
                    result = Err(LayoutError::from(error));
                    break;
                }
            }
        }
        match self.data_mut(id) {
            Ok(data) => data.bindings = bindings,
            Err(_) => bindings.iter_mut().for_each(|(_, binding)| binding.dispose()),
        }
        result
    }

    /// Forwards a local property change to the binding on that property.
    pub(crate) fn notify_binding_target(
        &mut self,
        id: ElementId,
        change: &PropertyChanged,
    ) -> Result<()> {
        let Ok(data) = self.data_mut(id) else {
            return Ok(());
        };
        if let Some((_, binding)) = data
            .bindings
            .iter_mut()
            .find(|(bound_id, _)| *bound_id == change.id())
        {
            binding.target_changed(change)?;
        }
        Ok(())
    }

    fn sink_for<T: Clone + 'static>(&self, id: ElementId, property: Property<T>) -> Sink<T> {
        let pending = self.pending.clone();
        Rc::new(move |value: Result<T, BindingError>| match value {
            Ok(value) => pending.push_to(id, move |tree: &mut ElementTree| {
                tree.apply_bound_value(id, property, value)
            }),
            Err(error) => pending.push_to(id, move |_: &mut ElementTree| Err(error.into())),
        })
    }

    fn apply_bound_value<T: Clone + 'static>(
        &mut self,
        id: ElementId,
        property: Property<T>,
        value: T,
    ) -> Result<()> {
        if !self.contains(id) {
            return Ok(());
        }
        self.write_value(id, property, value, false).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use core::cell::Cell;

    use kurbo::Size;
    use understory_binding::{ObservableValue, OneWayBinding, TwoWayBinding};

    use super::*;
    use crate::tree::ElementTree;

    struct Leaf;

    impl crate::Element for Leaf {}

    #[test]
    fn writes_wait_for_a_flush() {
        let mut tree = ElementTree::new();
        let leaf = tree.insert(Leaf);
        let text = tree.properties().text_block.text;
        let source = Rc::new(ObservableValue::new(7_i32));
        let binding: OneWayBinding<_, _, String> =
            OneWayBinding::immediate(source.clone(), ObservableValue::accessor());
        tree.bind(leaf, text, binding).unwrap();

        tree.resolve_bindings(leaf).unwrap();
        assert_eq!(tree.get(leaf, text).unwrap(), "");
        assert_eq!(tree.pending_writes().len(), 1);

        tree.flush_pending_writes().unwrap();
        assert_eq!(tree.get(leaf, text).unwrap(), "7");

        source.set(8);
        tree.flush_pending_writes().unwrap();
        assert_eq!(tree.get(leaf, text).unwrap(), "8");
    }

    #[test]
    fn writes_to_removed_elements_are_dropped() {
        let mut tree = ElementTree::new();
        let leaf = tree.insert(Leaf);
        let width = tree.properties().layout.width;
        let source = Rc::new(ObservableValue::new(3.0_f64));
        let binding: OneWayBinding<_, _, f64> =
            OneWayBinding::immediate(source.clone(), ObservableValue::accessor());
        tree.bind(leaf, width, binding).unwrap();
        tree.resolve_bindings(leaf).unwrap();
        tree.remove(leaf).unwrap();
        tree.flush_pending_writes().unwrap();
        assert!(tree.pending_writes().is_empty());
    }

    #[test]
    fn rebinding_disposes_the_old_binding() {
        let mut tree = ElementTree::new();
        let leaf = tree.insert(Leaf);
        let width = tree.properties().layout.width;
        let first = Rc::new(ObservableValue::new(1.0_f64));
        let second = Rc::new(ObservableValue::new(2.0_f64));
        let binding: OneWayBinding<_, _, f64> =
            OneWayBinding::immediate(first.clone(), ObservableValue::accessor());
        tree.bind(leaf, width, binding).unwrap();
        tree.resolve_bindings(leaf).unwrap();
        let binding: OneWayBinding<_, _, f64> =
            OneWayBinding::immediate(second.clone(), ObservableValue::accessor());
        tree.bind(leaf, width, binding).unwrap();
        tree.resolve_bindings(leaf).unwrap();
        tree.flush_pending_writes().unwrap();
        assert_eq!(tree.binding_count(leaf), 1);

        first.set(10.0);
        tree.flush_pending_writes().unwrap();
        assert_eq!(*tree.get(leaf, width).unwrap(), 2.0);
    }

    #[test]
    fn local_writes_reach_two_way_sources() {
        let mut tree = ElementTree::new();
        let leaf = tree.insert(Leaf);
        let text = tree.properties().text_block.text;
        let source = Rc::new(ObservableValue::new(String::from("a")));
        let notified = Rc::new(Cell::new(0));
        let counter = notified.clone();
        let _subscription = source.subscribe(move || counter.set(counter.get() + 1));
        let binding: TwoWayBinding<_, _, String> =
            TwoWayBinding::immediate(source.clone(), ObservableValue::accessor());
        tree.bind(leaf, text, binding).unwrap();
        tree.resolve_bindings(leaf).unwrap();
        tree.flush_pending_writes().unwrap();
        assert_eq!(tree.get(leaf, text).unwrap(), "a");

        tree.set_value(leaf, text, String::from("b")).unwrap();
        assert_eq!(source.get(), "b");
        assert_eq!(notified.get(), 1);
        tree.flush_pending_writes().unwrap();
        assert_eq!(tree.get(leaf, text).unwrap(), "b");
    }

    #[test]
    fn measure_applies_only_its_own_writes() {
        let mut tree = ElementTree::new();
        let first = tree.insert(Leaf);
        let second = tree.insert(Leaf);
        let width = tree.properties().layout.width;
        let pending = tree.pending_writes();
        pending.push_to(second, move |tree| tree.set_value(second, width, 4.0).map(|_| ()));
        pending.push(|_| Ok(()));
        pending.push_to(first, move |tree| tree.set_value(first, width, 3.0).map(|_| ()));

        tree.measure(first, Size::new(10.0, 10.0)).unwrap();
        assert_eq!(*tree.get(first, width).unwrap(), 3.0);
        assert!(tree.get(second, width).unwrap().is_nan());
        assert_eq!(pending.len(), 2);
        assert_eq!(pending.len_for(second), 1);

        tree.flush_pending_writes().unwrap();
        assert_eq!(*tree.get(second, width).unwrap(), 4.0);
        assert!(pending.is_empty());
    }

    #[test]
    fn failed_writes_keep_the_rest_queued() {
        let mut tree = ElementTree::new();
        let pending = tree.pending_writes();
        pending.push(|_| Err(LayoutError::MissingTemplate));
        pending.push(|_| Ok(()));
        assert_eq!(tree.flush_pending_writes(), Err(LayoutError::MissingTemplate));
        assert_eq!(pending.len(), 1);
        tree.flush_pending_writes().unwrap();
        assert!(pending.is_empty());
    }
}
