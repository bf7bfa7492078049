// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use understory_binding::DataContext;

use super::{ItemsHost, Template, check_index, check_insert_index};
use crate::element::{ChildList, ElementCx};
use crate::error::{LayoutError, Result};
use crate::id::ElementId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Entry {
    element: ElementId,
    /// Created from an item; freed instead of detached on removal.
    templated: bool,
}

/// Children that all have a live element.
///
/// Adding an element makes the owner its parent; removing it detaches it.
/// Elements created from a template are freed on removal.
#[derive(Clone, Debug, Default)]
pub struct ElementCollection {
    entries: Vec<Entry>,
}

impl ElementCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The child at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ElementId> {
        self.entries.get(index).map(|entry| entry.element)
    }

    /// Returns `true` if `element` is a child.
    #[must_use]
    pub fn contains(&self, element: ElementId) -> bool {
        self.position(element).is_some()
    }

    /// The children, in order.
    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.entries.iter().map(|entry| entry.element)
    }

    /// The children as a [`ChildList`].
    #[must_use]
    pub fn ids(&self) -> ChildList {
        self.iter().collect()
    }

    fn position(&self, element: ElementId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.element == element)
    }

    /// Appends an existing element.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`] if `element` is not live.
    pub fn push(&mut self, cx: &mut ElementCx<'_>, element: ElementId) -> Result<()> {
        self.insert(cx, self.len(), element)
    }

    /// Inserts an existing element at `index`.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::IndexOutOfRange`] if `index > len`.
    /// - [`LayoutError::StaleElement`] if `element` is not live.
    pub fn insert(
        &mut self,
        cx: &mut ElementCx<'_>,
        index: usize,
        element: ElementId,
    ) -> Result<()> {
        check_insert_index(index, self.len())?;
        cx.adopt(element)?;
        self.entries.insert(
            index,
            Entry {
                element,
                templated: false,
            },
        );
        Ok(())
    }

    /// Appends an item built by `template`.
    ///
    /// # Errors
    ///
    /// See [`insert_templated`](Self::insert_templated).
    pub fn push_templated(
        &mut self,
        cx: &mut ElementCx<'_>,
        item: DataContext,
        template: Option<Template>,
    ) -> Result<ElementId> {
        self.insert_templated(cx, self.len(), item, template)
    }

    /// Builds an element for `item` and inserts it at `index`.
    ///
    /// The element's data context is set to `item`.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::MissingTemplate`] without a template.
    /// - [`LayoutError::IndexOutOfRange`] if `index > len`.
    /// - Whatever the template returns.
    pub fn insert_templated(
        &mut self,
        cx: &mut ElementCx<'_>,
        index: usize,
        item: DataContext,
        template: Option<Template>,
    ) -> Result<ElementId> {
        let template = template.ok_or(LayoutError::MissingTemplate)?;
        check_insert_index(index, self.len())?;
        let element = template(cx.tree_mut(), &item)?;
        cx.tree_mut().set_data_context(element, Some(item))?;
        cx.adopt(element)?;
        self.entries.insert(
            index,
            Entry {
                element,
                templated: true,
            },
        );
        Ok(element)
    }

    /// Replaces the child at `index` and returns the old one.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::IndexOutOfRange`] if `index >= len`.
    /// - [`LayoutError::StaleElement`] if `element` is not live.
    pub fn set(
        &mut self,
        cx: &mut ElementCx<'_>,
        index: usize,
        element: ElementId,
    ) -> Result<ElementId> {
        check_index(index, self.len())?;
        if self.entries[index].element == element {
            return Ok(element);
        }
        cx.adopt(element)?;
        let old = core::mem::replace(
            &mut self.entries[index],
            Entry {
                element,
                templated: false,
            },
        );
        release(cx, old)?;
        Ok(old.element)
    }

    /// Removes `element` if it is a child.
    ///
    /// # Errors
    ///
    /// Propagates failures to free a templated element.
    pub fn remove(&mut self, cx: &mut ElementCx<'_>, element: ElementId) -> Result<bool> {
        match self.position(element) {
            Some(index) => self.remove_at(cx, index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Removes the child at `index` and returns it.
    ///
    /// A templated child is freed, so the returned id is stale.
    ///
    /// # Errors
    ///
    /// [`LayoutError::IndexOutOfRange`] if `index >= len`.
    pub fn remove_at(&mut self, cx: &mut ElementCx<'_>, index: usize) -> Result<ElementId> {
        check_index(index, self.len())?;
        let entry = self.entries.remove(index);
        release(cx, entry)?;
        Ok(entry.element)
    }

    /// Moves the child at `old_index` to `new_index`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::IndexOutOfRange`] if either index is out of range.
    pub fn move_item(
        &mut self,
        cx: &mut ElementCx<'_>,
        old_index: usize,
        new_index: usize,
    ) -> Result<()> {
        check_index(old_index, self.len())?;
        check_index(new_index, self.len())?;
        let entry = self.entries.remove(old_index);
        self.entries.insert(new_index, entry);
        cx.invalidate_measure();
        Ok(())
    }

    /// Removes every child.
    ///
    /// # Errors
    ///
    /// Propagates failures to free templated elements.
    pub fn clear(&mut self, cx: &mut ElementCx<'_>) -> Result<()> {
        for entry in core::mem::take(&mut self.entries) {
            release(cx, entry)?;
        }
        cx.invalidate_measure();
        Ok(())
    }
}

fn release(cx: &mut ElementCx<'_>, entry: Entry) -> Result<()> {
    if entry.templated && cx.tree().contains(entry.element) {
        cx.tree_mut().remove(entry.element)?;
        cx.invalidate_measure();
    } else {
        cx.disown(entry.element)?;
    }
    Ok(())
}

impl ItemsHost for ElementCollection {
    fn insert_item(
        &mut self,
        cx: &mut ElementCx<'_>,
        index: usize,
        item: DataContext,
        template: Option<Template>,
    ) -> Result<()> {
        self.insert_templated(cx, index, item, template).map(|_| ())
    }

    fn remove_item(&mut self, cx: &mut ElementCx<'_>, index: usize) -> Result<()> {
        self.remove_at(cx, index).map(|_| ())
    }

    fn move_item(
        &mut self,
        cx: &mut ElementCx<'_>,
        old_index: usize,
        new_index: usize,
    ) -> Result<()> {
        Self::move_item(self, cx, old_index, new_index)
    }

    fn clear_items(&mut self, cx: &mut ElementCx<'_>) -> Result<()> {
        self.clear(cx)
    }

    fn item_count(&self) -> usize {
        self.len()
    }
}
