// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ready-made observable sources.
//!
//! [`ObservableValue`] is a single notifying cell. [`ObservableVec`] is a list
//! that reports structural changes as [`CollectionChange`] events, for
//! projection onto element collections.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::accessor::Accessor;
use crate::notify::{ListenerList, Notifier, Observable, Subscription};

/// A notifying cell.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_binding::ObservableValue;
///
/// let value = ObservableValue::new(1);
/// let hits = Rc::new(Cell::new(0));
/// let counter = hits.clone();
/// let _subscription = value.subscribe(move || counter.set(counter.get() + 1));
///
/// assert!(value.set(2));
/// assert!(!value.set(2));
/// assert_eq!(hits.get(), 1);
/// ```
pub struct ObservableValue<T> {
    value: RefCell<T>,
    notifier: Notifier,
}

impl<T: Clone + PartialEq + 'static> ObservableValue<T> {
    /// Name reported on change.
    pub const VALUE: &'static str = "Value";

    /// Creates a cell holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            notifier: Notifier::new(),
        }
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Stores `value` and notifies, unless it equals the current value.
    ///
    /// Returns whether a notification was sent.
    pub fn set(&self, value: T) -> bool {
        {
            let mut slot = self.value.borrow_mut();
            if *slot == value {
                return false;
            }
            *slot = value;
        }
        self.notifier.notify(Self::VALUE);
        true
    }

    /// Computes a new value from the current one and stores it; see [`set`](Self::set).
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = f(&self.value.borrow());
        self.set(next)
    }

    /// Subscribes to changes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        self.notifier.subscribe_property(Self::VALUE, callback)
    }

    /// A read-write accessor for the value, for use in bindings.
    #[must_use]
    pub fn accessor() -> Accessor<Self, T> {
        Accessor::read_write(
            Self::VALUE,
            |cell| cell.get(),
            |cell, value| {
                cell.set(value);
            },
        )
    }
}

impl<T> Observable for ObservableValue<T> {
    fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("value", &self.value)
            .field("notifier", &self.notifier)
            .finish()
    }
}

/// A structural change of an [`ObservableVec`].
///
/// Indices refer to the list before the change for removals and to the list
/// after the change for additions.
#[derive(Clone, Debug, PartialEq)]
pub enum CollectionChange<T> {
    /// `items` were inserted starting at `index`.
    Add {
        /// First inserted position.
        index: usize,
        /// Inserted items.
        items: Vec<T>,
    },
    /// `items` were removed starting at `index`.
    Remove {
        /// First removed position.
        index: usize,
        /// Removed items.
        items: Vec<T>,
    },
    /// The items starting at `index` were replaced.
    Replace {
        /// First replaced position.
        index: usize,
        /// Items before the change.
        old_items: Vec<T>,
        /// Items after the change.
        new_items: Vec<T>,
    },
    /// `items` moved from `old_index` to `new_index`.
    Move {
        /// Position before the move.
        old_index: usize,
        /// Position after the move.
        new_index: usize,
        /// Moved items.
        items: Vec<T>,
    },
    /// The list changed wholesale; consumers rebuild from its contents.
    Reset,
}

/// A list that reports changes.
///
/// Every mutation emits exactly one [`CollectionChange`] to subscribers of
/// [`subscribe_changes`](Self::subscribe_changes), and notifies `"Count"` on
/// the [`Notifier`] when the length changed.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_binding::{CollectionChange, ObservableVec};
///
/// let list = ObservableVec::from_vec(vec!["a", "b"]);
/// let log = Rc::new(RefCell::new(Vec::new()));
/// let sink = log.clone();
/// let _subscription =
///     list.subscribe_changes(move |change| sink.borrow_mut().push(change.clone()));
///
/// list.push("c");
/// list.move_item(2, 0);
///
/// assert_eq!(list.to_vec(), ["c", "a", "b"]);
/// assert_eq!(
///     log.borrow()[1],
///     CollectionChange::Move { old_index: 2, new_index: 0, items: vec!["c"] }
/// );
/// ```
pub struct ObservableVec<T: 'static> {
    items: RefCell<Vec<T>>,
    notifier: Notifier,
    changes: ListenerList<CollectionChange<T>>,
}

impl<T: Clone + 'static> ObservableVec<T> {
    /// Name notified when the length changes.
    pub const COUNT: &'static str = "Count";

    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Creates a list with initial contents. No change is reported.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(items),
            notifier: Notifier::new(),
            changes: ListenerList::default(),
        }
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Returns a copy of the item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.borrow().get(index).cloned()
    }

    /// Returns a copy of the contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    /// Subscribes to structural changes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe_changes(
        &self,
        callback: impl Fn(&CollectionChange<T>) + 'static,
    ) -> Subscription {
        self.changes.add(Rc::new(callback))
    }

    /// Appends an item.
    pub fn push(&self, item: T) {
        let index = self.len();
        self.insert(index, item);
    }

    /// Inserts an item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, item: T) {
        self.items.borrow_mut().insert(index, item.clone());
        self.emit(
            CollectionChange::Add {
                index,
                items: alloc::vec![item],
            },
            true,
        );
    }

    /// Removes and returns the item at `index`, or `None` if out of range.
    pub fn remove(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        }?;
        self.emit(
            CollectionChange::Remove {
                index,
                items: alloc::vec![removed.clone()],
            },
            true,
        );
        Some(removed)
    }

    /// Replaces the item at `index` and returns the old one, or `None` if out
    /// of range.
    pub fn set(&self, index: usize, item: T) -> Option<T> {
        let old = {
            let mut items = self.items.borrow_mut();
            let slot = items.get_mut(index)?;
            core::mem::replace(slot, item.clone())
        };
        self.emit(
            CollectionChange::Replace {
                index,
                old_items: alloc::vec![old.clone()],
                new_items: alloc::vec![item],
            },
            false,
        );
        Some(old)
    }

    /// Moves the item at `old_index` to `new_index`.
    ///
    /// Returns `false` (and reports nothing) if either index is out of range.
    pub fn move_item(&self, old_index: usize, new_index: usize) -> bool {
        let moved = {
            let mut items = self.items.borrow_mut();
            if old_index >= items.len() || new_index >= items.len() {
                return false;
            }
            let item = items.remove(old_index);
            items.insert(new_index, item.clone());
            item
        };
        self.emit(
            CollectionChange::Move {
                old_index,
                new_index,
                items: alloc::vec![moved],
            },
            false,
        );
        true
    }

    /// Removes every item and reports a reset.
    pub fn clear(&self) {
        self.items.borrow_mut().clear();
        self.emit(CollectionChange::Reset, true);
    }

    /// Replaces the contents wholesale and reports a reset.
    pub fn reset(&self, items: Vec<T>) {
        *self.items.borrow_mut() = items;
        self.emit(CollectionChange::Reset, true);
    }

    fn emit(&self, change: CollectionChange<T>, count_changed: bool) {
        self.changes.emit(&change);
        if count_changed {
            self.notifier.notify(Self::COUNT);
        }
    }
}

impl<T: Clone + 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Observable for ObservableVec<T> {
    fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableVec")
            .field("items", &self.items)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;
    use core::cell::Cell;

    fn record<T: Clone + 'static>(
        list: &ObservableVec<T>,
    ) -> (Rc<RefCell<Vec<CollectionChange<T>>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let subscription =
            list.subscribe_changes(move |change| sink.borrow_mut().push(change.clone()));
        (log, subscription)
    }

    #[test]
    fn value_notifies_on_change_only() {
        let cell = ObservableValue::new(0_u32);
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let _subscription = cell.subscribe(move || counter.set(counter.get() + 1));

        assert!(!cell.set(0));
        assert!(cell.update(|v| v + 1));
        assert!(cell.set(5));
        assert_eq!(hits.get(), 2);
        assert_eq!(cell.get(), 5);
    }

    #[test]
    fn value_accessor_round_trips_through_the_cell() {
        let accessor = ObservableValue::<i32>::accessor();
        let cell = ObservableValue::new(3);
        assert_eq!(accessor.get(&cell), 3);
        accessor.set(&cell, 9).unwrap();
        assert_eq!(cell.get(), 9);
        assert_eq!(accessor.name(), "Value");
    }

    #[test]
    fn subscriber_may_read_during_notification() {
        let cell = Rc::new(ObservableValue::new(String::new()));
        let seen = Rc::new(RefCell::new(String::new()));
        let reader = Rc::downgrade(&cell);
        let sink = seen.clone();
        let _subscription = cell.subscribe(move || {
            if let Some(cell) = reader.upgrade() {
                *sink.borrow_mut() = cell.get();
            }
        });

        cell.set(String::from("hello"));
        assert_eq!(*seen.borrow(), "hello");
    }

    #[test]
    fn vec_reports_each_mutation() {
        let list = ObservableVec::from_vec(vec![10, 20, 30]);
        let (log, _subscription) = record(&list);

        list.insert(1, 15);
        assert_eq!(list.remove(0), Some(10));
        assert_eq!(list.set(0, 16), Some(15));
        assert!(list.move_item(0, 2));
        list.clear();

        assert_eq!(
            *log.borrow(),
            [
                CollectionChange::Add {
                    index: 1,
                    items: vec![15]
                },
                CollectionChange::Remove {
                    index: 0,
                    items: vec![10]
                },
                CollectionChange::Replace {
                    index: 0,
                    old_items: vec![15],
                    new_items: vec![16]
                },
                CollectionChange::Move {
                    old_index: 0,
                    new_index: 2,
                    items: vec![16]
                },
                CollectionChange::Reset,
            ]
        );
        assert!(list.is_empty());
    }

    #[test]
    fn out_of_range_is_reported_without_events() {
        let list = ObservableVec::from_vec(vec!['a']);
        let (log, _subscription) = record(&list);

        assert_eq!(list.remove(3), None);
        assert_eq!(list.set(1, 'b'), None);
        assert!(!list.move_item(0, 1));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn count_is_notified_for_length_changes() {
        let list = ObservableVec::<u8>::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let _subscription = list
            .notifier()
            .subscribe_property(ObservableVec::<u8>::COUNT, move || counter.set(counter.get() + 1));

        list.push(1);
        list.push(2);
        list.set(0, 3);
        list.move_item(0, 1);
        list.remove(0);
        assert_eq!(hits.get(), 3);
    }
}
