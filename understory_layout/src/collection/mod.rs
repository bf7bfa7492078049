// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child collections.
//!
//! An [`ElementCollection`] keeps a live element for every entry. A
//! [`VirtualizingCollection`] keeps item records and realizes elements only
//! for the window a [`Cursor`] walks over.
//!
//! Both accept templated items: a [`Template`] turns an item into a new
//! element, which gets the item as its data context. Items cannot be added
//! without a template. Both implement [`ItemsHost`], the interface
//! [`ItemsControl`](crate::ItemsControl) projects source changes through.

mod eager;
mod virtualizing;

use alloc::rc::Rc;

use understory_binding::DataContext;

pub use eager::ElementCollection;
pub use virtualizing::{Cursor, VirtualizingCollection};

use crate::element::{Element, ElementCx};
use crate::error::{LayoutError, Result};
use crate::id::ElementId;
use crate::tree::ElementTree;

/// Builds the element for one item.
pub type Template = Rc<dyn Fn(&mut ElementTree, &DataContext) -> Result<ElementId>>;

/// Wraps a closure as a [`Template`].
///
/// ```rust
/// use understory_layout::{ElementTree, TextBlock, template};
///
/// let row = template(|tree, _item| Ok(tree.insert(TextBlock::new())));
/// # let _ = row;
/// ```
pub fn template(
    build: impl Fn(&mut ElementTree, &DataContext) -> Result<ElementId> + 'static,
) -> Template {
    Rc::new(build)
}

/// An ordered, templated children collection.
///
/// Every method takes the context of the element owning the collection,
/// whose measure is invalidated by each change.
pub trait ItemsHost {
    /// Inserts an item at `index`, templating it when it is realized.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::MissingTemplate`] without a template.
    /// - [`LayoutError::IndexOutOfRange`] if `index > len`.
    fn insert_item(
        &mut self,
        cx: &mut ElementCx<'_>,
        index: usize,
        item: DataContext,
        template: Option<Template>,
    ) -> Result<()>;

    /// Removes the item at `index`, freeing its element.
    ///
    /// # Errors
    ///
    /// [`LayoutError::IndexOutOfRange`] if `index >= len`.
    fn remove_item(&mut self, cx: &mut ElementCx<'_>, index: usize) -> Result<()>;

    /// Moves an item. Equivalent to a removal followed by an insertion.
    ///
    /// # Errors
    ///
    /// [`LayoutError::IndexOutOfRange`] if either index is out of range.
    fn move_item(&mut self, cx: &mut ElementCx<'_>, old_index: usize, new_index: usize)
    -> Result<()>;

    /// Removes every item.
    ///
    /// # Errors
    ///
    /// Propagates failures to free templated elements.
    fn clear_items(&mut self, cx: &mut ElementCx<'_>) -> Result<()>;

    /// Number of items.
    fn item_count(&self) -> usize;
}

/// An element whose children live in an [`ElementCollection`].
pub trait Panel: Element {
    /// The children.
    fn children(&self) -> &ElementCollection;
    /// The children, mutably.
    fn children_mut(&mut self) -> &mut ElementCollection;
}

impl ElementTree {
    /// Appends `child` to the panel at `panel`.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::ElementType`] if `panel` is not a `P`.
    /// - [`LayoutError::StaleElement`] if either id is not live.
    pub fn add_child<P: Panel>(&mut self, panel: ElementId, child: ElementId) -> Result<()> {
        self.with_element::<P, _>(panel, |panel, cx| panel.children_mut().push(cx, child))?
    }

    /// Runs `f` with the [`ItemsHost`] of the element at `id`.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::NotAnItemsHost`] if the element has none.
    /// - Whatever `f` returns.
    pub fn with_items_host<R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut dyn ItemsHost, &mut ElementCx<'_>) -> Result<R>,
    ) -> Result<R> {
        self.with_detached(id, |element, mut cx| match element.items_host() {
            Some(host) => f(host, &mut cx),
            None => Err(LayoutError::NotAnItemsHost(id)),
        })?
    }
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(LayoutError::IndexOutOfRange { index, len })
    }
}

fn check_insert_index(index: usize, len: usize) -> Result<()> {
    if index <= len {
        Ok(())
    } else {
        Err(LayoutError::IndexOutOfRange { index, len })
    }
}
