// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Binding: observable sources and typed bindings.
//!
//! This crate is the data side of element bindings. It knows nothing about
//! elements; a binding pushes values into a [`Sink`] and is told about target
//! changes, and the layout crate connects those ends to element properties.
//!
//! ## Core Concepts
//!
//! - [`Observable`] objects own a [`Notifier`] and call
//!   [`Notifier::notify`] with a property name after a change.
//! - An [`Accessor<S, V>`] reads (and optionally writes) one named property
//!   of a source type. It replaces runtime reflection: the property is chosen
//!   at compile time when the binding is built.
//! - [`CoerceFrom`] converts between the source and target value types.
//! - [`DataContext`] is a shared, type-erased object; deferred bindings
//!   downcast it to their source type.
//! - [`Binding`] is implemented by [`OneWayBinding`] (source to target),
//!   [`OneWayToSourceBinding`] (target to source) and [`TwoWayBinding`]
//!   (both, sharing one [`ResolutionMode`]).
//! - Every registration is a [`Subscription`] whose disposal is idempotent.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::{Cell, RefCell};
//! use std::rc::Rc;
//! use understory_binding::{
//!     Accessor, Binding, BindingError, DataContext, Notifier, Observable, OneWayBinding, Sink,
//! };
//!
//! struct Player {
//!     score: Cell<u32>,
//!     notifier: Notifier,
//! }
//!
//! impl Observable for Player {
//!     fn notifier(&self) -> &Notifier {
//!         &self.notifier
//!     }
//! }
//!
//! const SCORE: Accessor<Player, u32> = Accessor::read_write("Score", |p| p.score.get(), |p, v| {
//!     p.score.set(v);
//!     p.notifier.notify("Score");
//! });
//!
//! let label = Rc::new(RefCell::new(String::new()));
//! let target = label.clone();
//! let sink: Sink<String> = Rc::new(move |value: Result<String, BindingError>| {
//!     *target.borrow_mut() = value.unwrap();
//! });
//!
//! // Deferred: the source is whatever data context is in effect.
//! let mut binding = OneWayBinding::<Player, u32, String>::deferred(SCORE);
//! binding.resolve(None, &String::new(), &sink).unwrap();
//! assert_eq!(*label.borrow(), "");
//!
//! let player = Rc::new(Player { score: Cell::new(10), notifier: Notifier::new() });
//! binding.resolve(Some(&DataContext::new(player.clone())), &String::new(), &sink).unwrap();
//! assert_eq!(*label.borrow(), "10");
//!
//! SCORE.set(&player, 11).unwrap();
//! assert_eq!(*label.borrow(), "11");
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. Everything is single-threaded
//! (`Rc`/`RefCell`).

#![no_std]

extern crate alloc;

mod accessor;
mod binding;
mod coerce;
mod context;
mod error;
mod notify;
mod observable;

pub use accessor::Accessor;
pub use binding::{
    Binding, OneWayBinding, OneWayToSourceBinding, ResolutionMode, Sink, TwoWayBinding,
};
pub use coerce::CoerceFrom;
pub use context::DataContext;
pub use error::BindingError;
pub use notify::{Notifier, Observable, Subscription};
pub use observable::{CollectionChange, ObservableValue, ObservableVec};
