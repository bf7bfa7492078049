// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notification.
//!
//! A [`Notifier`] fans a property name out to its subscribers. Every
//! subscription is represented by a [`Subscription`] guard that removes the
//! subscriber when disposed or dropped.
//!
//! Notifiers are single-threaded (`Rc`/`RefCell`). Subscribers may subscribe,
//! dispose or notify again from inside a callback: the subscriber list is
//! snapshotted before callbacks run.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

/// Ordered list of callbacks receiving `&E`.
pub(crate) struct Listeners<E: ?Sized> {
    next_key: u64,
    entries: Vec<(u64, Rc<dyn Fn(&E)>)>,
}

impl<E: ?Sized> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next_key: 0,
            entries: Vec::new(),
        }
    }
}

/// Shared handle to a [`Listeners`] list.
pub(crate) struct ListenerList<E: ?Sized + 'static> {
    inner: Rc<RefCell<Listeners<E>>>,
}

impl<E: ?Sized + 'static> Clone for ListenerList<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: ?Sized + 'static> Default for ListenerList<E> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Listeners::default())),
        }
    }
}

impl<E: ?Sized + 'static> ListenerList<E> {
    pub(crate) fn add(&self, callback: Rc<dyn Fn(&E)>) -> Subscription {
        let key = {
            let mut listeners = self.inner.borrow_mut();
            let key = listeners.next_key;
            listeners.next_key += 1;
            listeners.entries.push((key, callback));
            key
        };
        let list: Weak<RefCell<Listeners<E>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(list) = list.upgrade() {
                list.borrow_mut().entries.retain(|(k, _)| *k != key);
            }
        })
    }

    pub(crate) fn emit(&self, event: &E) {
        let snapshot: Vec<Rc<dyn Fn(&E)>> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

/// Broadcasts property-changed notifications by name.
///
/// Cloning a `Notifier` yields another handle to the same subscriber list.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_binding::Notifier;
///
/// let notifier = Notifier::new();
/// let hits = Rc::new(Cell::new(0));
/// let counter = hits.clone();
/// let subscription = notifier.subscribe_property("Count", move || counter.set(counter.get() + 1));
///
/// notifier.notify("Count");
/// notifier.notify("Name");
/// assert_eq!(hits.get(), 1);
///
/// drop(subscription);
/// notifier.notify("Count");
/// assert_eq!(hits.get(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Notifier {
    listeners: ListenerList<str>,
}

impl Notifier {
    /// Creates a notifier without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to every notification; the callback receives the name.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&str) + 'static) -> Subscription {
        self.listeners.add(Rc::new(callback))
    }

    /// Subscribes to notifications for one property name.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe_property(
        &self,
        name: &'static str,
        callback: impl Fn() + 'static,
    ) -> Subscription {
        self.listeners.add(Rc::new(move |changed: &str| {
            if changed == name {
                callback();
            }
        }))
    }

    /// Notifies subscribers that `name` changed.
    pub fn notify(&self, name: &str) {
        self.listeners.emit(name);
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// An object that reports property changes through a [`Notifier`].
///
/// Implementations call [`Notifier::notify`] with the property name after a
/// value actually changed.
pub trait Observable {
    /// Returns the object's notifier.
    fn notifier(&self) -> &Notifier;
}

/// Guard for a registered callback.
///
/// Disposing releases the registration. Disposal is idempotent: the release
/// runs at most once no matter how often [`dispose`](Self::dispose) is called,
/// and dropping an already disposed guard does nothing.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_binding::Subscription;
///
/// let releases = Rc::new(Cell::new(0));
/// let counter = releases.clone();
/// let mut subscription = Subscription::new(move || counter.set(counter.get() + 1));
///
/// subscription.dispose();
/// subscription.dispose();
/// drop(subscription);
/// assert_eq!(releases.get(), 1);
/// ```
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wraps a release action.
    #[must_use]
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription that releases nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { release: None }
    }

    /// Returns `true` until the subscription is disposed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Releases the registration, once.
    pub fn dispose(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
