// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Layout: a retained-mode element tree with two-pass layout.
//!
//! This crate sits on top of [`understory_property`] and
//! [`understory_binding`]. It owns the elements, runs measure and arrange,
//! attaches bindings to element properties, records drawing and routes
//! pointer gestures. It does not draw pixels, shape text or read input
//! devices; those come from the host through [`DrawingSurface`],
//! [`TextMeasurer`] and [`GestureSource`].
//!
//! ## Core Concepts
//!
//! ### The tree
//!
//! An [`ElementTree`] is an arena of elements addressed by generational
//! [`ElementId`]s. Each node carries a property store, layout state, bindings
//! and the drawing recorded by its last arrange. Element behavior is an
//! [`Element`] implementation; children are referenced by id, and a child's
//! parent pointer is only used for invalidation and inheritance.
//!
//! ### Layout
//!
//! [`ElementTree::measure`] asks an element how large it wants to be within
//! an available size; [`ElementTree::arrange`] gives it a final rectangle.
//! Both are skipped when the element is still valid for the same input.
//! Invalidating an element's measure invalidates every ancestor, so the next
//! pass from the root reaches it.
//!
//! ### Bindings
//!
//! [`ElementTree::bind`] connects a property to a data source. Deferred
//! bindings wait for a data context, which inherits down the tree, and
//! resolve during measure. Source notifications are queued and applied when
//! the bound element is next measured, or at the next update.
//!
//! ### Frames
//!
//! A [`RootElement`] owns a tree and drives it: [`RootElement::update`]
//! runs layout passes until the tree settles and rebuilds the [`Renderer`]
//! draw list when something moved; [`RootElement::draw`] replays it.
//!
//! ## Quick Start
//!
//! ```rust
//! use kurbo::Rect;
//! use understory_layout::{
//!     ColumnDefinition, Grid, GridLength, RootElement, RootOptions, TextBlock,
//! };
//!
//! let mut root = RootElement::new(RootOptions::new(Rect::new(0.0, 0.0, 300.0, 100.0)));
//! let tree = root.tree_mut();
//! let grid = tree.insert(Grid::new().with_columns(vec![
//!     ColumnDefinition::new(GridLength::Star(1.0)),
//!     ColumnDefinition::new(GridLength::Star(2.0)),
//! ]));
//! let label = tree.insert(TextBlock::new());
//! let column = tree.properties().grid.column;
//! tree.set_value(label, column, 1).unwrap();
//! tree.add_child::<Grid>(grid, label).unwrap();
//!
//! root.set_content(Some(grid)).unwrap();
//! root.update().unwrap();
//!
//! let offset = root.tree().layout(label).unwrap().visual_offset();
//! assert!((offset.x - 100.0).abs() < 1e-9);
//! ```
//!
//! ## Logging
//!
//! The crate logs through [`tracing`] and installs no subscriber. Update
//! passes and draw-list rebuilds are `debug`; measure, arrange and binding
//! resolution are `trace`; an unsettled layout and a refused capture are
//! `warn`.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. Enable either the `std` feature
//! (the default) or `libm` for Kurbo's floating-point functions.

#![no_std]

extern crate alloc;

mod binding;
mod collection;
mod controls;
mod element;
mod error;
mod geometry;
mod grid;
mod id;
mod input;
mod layout;
mod properties;
mod render;
mod root;
mod text;
mod tree;

pub use binding::PendingWrites;
pub use collection::{
    Cursor, ElementCollection, ItemsHost, Panel, Template, VirtualizingCollection, template,
};
pub use controls::{
    Border, Button, Image, ImageSource, ItemsControl, Orientation, ScrollContentPresenter,
    ScrollViewer, StackPanel, Stretch, StretchDirection, TextBlock, TextWrapping,
    VirtualizingStackPanel, compute_scale_factor,
};
pub use element::{ChildList, Clipping, Element, ElementCx};
pub use error::{LayoutError, Result};
pub use geometry::{HorizontalAlignment, RectExt, SizeExt, Thickness, VerticalAlignment, close_to};
pub use grid::{
    ColumnDefinition, Grid, GridLength, LengthType, RowDefinition, Track,
    allocate_proportional_space, set_final_lengths,
};
pub use id::ElementId;
pub use input::{CaptureSlot, Gesture, GestureKind, GestureSource, InputCx};
pub use layout::LayoutState;
pub use properties::{
    BorderProperties, ButtonProperties, GridProperties, ImageProperties, LayoutProperties,
    Properties, StackPanelProperties, TextBlockProperties,
};
pub use render::{DrawCommand, DrawEntry, DrawingContext, DrawingSurface, Renderer};
pub use root::{RootElement, RootOptions};
pub use text::{Font, MonospaceMeasurer, TextMeasurer, wrap_text};
pub use tree::ElementTree;
