// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Property: a reactive property store for retained-mode UI.
//!
//! This crate is the bottom layer of the Understory layout stack. It knows
//! nothing about elements or layout; it stores values, decides whether a
//! write is a change, and reports what the change should invalidate.
//!
//! ## Core Concepts
//!
//! ### Descriptors
//!
//! A [`PropertyRegistry`] holds immutable descriptors, one per
//! (name, owner type) pair. Registering yields a typed [`Property<T>`] handle,
//! a `u16` index into the registry. Each descriptor carries
//! [`PropertyMetadata`]: default value, whether the value inherits down the
//! tree, an [`Invalidation`] tag, an equality rule and optional coerce /
//! changed callbacks.
//!
//! ### Per-object storage
//!
//! A [`PropertyStore`] is the sparse value map of one object. Reads fall back
//! to the descriptor default. [`PropertyStore::set_value`] is the notifying
//! write:
//!
//! 1. coerce the proposed value,
//! 2. compare it against the current effective value with the descriptor's
//!    equality rule (unchanged writes are no-ops),
//! 3. store it and run the changed callback,
//! 4. return a [`PropertyChanged`] record carrying the name, the old and new
//!    values and the invalidation tag.
//!
//! The owner of the store acts on the record: it invalidates measure or
//! arrange and forwards the notification to observers.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_property::{
//!     Invalidation, Property, PropertyMetadataBuilder, PropertyRegistry, PropertyStore,
//! };
//!
//! let mut registry = PropertyRegistry::new();
//! let width: Property<f64> = registry.register(
//!     "Width",
//!     PropertyMetadataBuilder::new(0.0_f64)
//!         .invalidates(Invalidation::MEASURE)
//!         .build(),
//! );
//!
//! let mut store = PropertyStore::<u32>::new(1);
//! assert_eq!(*store.get(width, &registry), 0.0);
//!
//! let change = store.set_value(width, 100.0, &registry).unwrap();
//! assert_eq!(change.name(), "Width");
//! assert_eq!(change.old_value::<f64>(), Some(&0.0));
//! assert!(change.invalidation().contains(Invalidation::MEASURE));
//!
//! // Writing the same value again is not a change.
//! assert!(store.set_value(width, 100.0, &registry).is_none());
//! ```
//!
//! ## Inheritance
//!
//! [`DependencyObjectExt::get_inherited`] resolves a value by walking the
//! parent chain through a [`ParentLookup`], skipping ancestors without a local
//! value. The layout crate uses it for data-context inheritance.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod change;
mod id;
mod invalidation;
mod metadata;
mod object;
mod registry;
mod store;
mod value;

pub use change::PropertyChanged;
pub use id::{Property, PropertyId};
pub use invalidation::Invalidation;
pub use metadata::{
    CoerceValueCallback, EqualityFn, PropertyChangedCallback, PropertyMetadata,
    PropertyMetadataBuilder,
};
pub use object::{DependencyObject, DependencyObjectExt, ParentLookup, walk_inherited};
pub use registry::{PropertyRegistration, PropertyRegistry};
pub use store::PropertyStore;
pub use value::ErasedValue;
