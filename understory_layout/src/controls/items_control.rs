// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use kurbo::{Rect, Size};
use understory_binding::{CollectionChange, DataContext, ObservableVec, Subscription};

use super::{StackPanel, replace_child};
use crate::collection::{ItemsHost, Template};
use crate::element::{ChildList, Element, ElementCx};
use crate::error::Result;
use crate::id::ElementId;

type ChangeQueue<T> = Rc<RefCell<Vec<CollectionChange<Rc<T>>>>>;

/// Shows an observable list through a templated panel.
///
/// Each source item becomes an element built by the item template, with the
/// item as its data context. Source changes are queued as they happen and
/// projected onto the panel, in order, at the start of the next measure. The
/// panel defaults to a [`StackPanel`]; any element with an
/// [`ItemsHost`](crate::ItemsHost) can be used.
///
/// ```rust
/// use std::rc::Rc;
/// use kurbo::Size;
/// use understory_binding::ObservableVec;
/// use understory_layout::{ElementTree, ItemsControl, TextBlock, template};
///
/// let mut tree = ElementTree::new();
/// let source = Rc::new(ObservableVec::from_vec(vec![Rc::new(1_u32), Rc::new(2)]));
/// let list = tree.insert(
///     ItemsControl::<u32>::new()
///         .with_template(template(|tree, _item| Ok(tree.insert(TextBlock::new())))),
/// );
/// tree.with_element::<ItemsControl<u32>, _>(list, |list, cx| {
///     list.set_items_source(cx, Some(source.clone()));
/// })
/// .unwrap();
///
/// source.push(Rc::new(3));
/// tree.measure(list, Size::new(100.0, 100.0)).unwrap();
/// let panel = tree.element::<ItemsControl<u32>>(list).unwrap().items_panel().unwrap();
/// assert_eq!(tree.children(panel).len(), 3);
/// ```
pub struct ItemsControl<T: 'static> {
    source: Option<Rc<ObservableVec<Rc<T>>>>,
    template: Option<Template>,
    panel: Option<ElementId>,
    owns_panel: bool,
    changes: ChangeQueue<T>,
    subscription: Option<Subscription>,
    source_is_new: bool,
}

impl<T: 'static> Default for ItemsControl<T> {
    fn default() -> Self {
        Self {
            source: None,
            template: None,
            panel: None,
            owns_panel: false,
            changes: Rc::default(),
            subscription: None,
            source_is_new: false,
        }
    }
}

impl<T: 'static> ItemsControl<T> {
    /// Creates a control with no source, template or panel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the item template.
    #[must_use]
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    /// The item template.
    #[must_use]
    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// Replaces the item template. Existing elements are kept.
    pub fn set_template(&mut self, template: Option<Template>) {
        self.template = template;
    }

    /// The source list.
    #[must_use]
    pub fn items_source(&self) -> Option<&Rc<ObservableVec<Rc<T>>>> {
        self.source.as_ref()
    }

    /// Replaces the source list.
    ///
    /// The panel is repopulated at the next measure. Changes to the new list
    /// invalidate this control's measure through the tree's pending writes.
    pub fn set_items_source(
        &mut self,
        cx: &mut ElementCx<'_>,
        source: Option<Rc<ObservableVec<Rc<T>>>>,
    ) {
        self.subscription = None;
        self.changes.borrow_mut().clear();
        if let Some(source) = &source {
            let changes = self.changes.clone();
            let pending = cx.tree().pending_writes();
            let id = cx.id();
            self.subscription = Some(source.subscribe_changes(move |change| {
                changes.borrow_mut().push(change.clone());
                pending.push_to(id, move |tree| {
                    tree.invalidate_measure(id);
                    Ok(())
                });
            }));
        }
        self.source = source;
        self.source_is_new = true;
        cx.invalidate_measure();
    }

    /// The panel hosting the item elements.
    #[must_use]
    pub fn items_panel(&self) -> Option<ElementId> {
        self.panel
    }

    /// Replaces the panel. It is repopulated at the next measure.
    ///
    /// The old panel loses its items. A panel created by this control is
    /// freed.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::NotAnItemsHost`](crate::LayoutError::NotAnItemsHost)
    ///   if `panel` has no items host.
    /// - [`LayoutError::StaleElement`](crate::LayoutError::StaleElement) if
    ///   `panel` is not live.
    pub fn set_items_panel(
        &mut self,
        cx: &mut ElementCx<'_>,
        panel: Option<ElementId>,
    ) -> Result<()> {
        if self.panel == panel {
            return Ok(());
        }
        if let Some(panel) = panel {
            cx.tree_mut().with_items_host(panel, |_, _| Ok(()))?;
        }
        let old = self.panel;
        replace_child(cx, &mut self.panel, panel)?;
        if let Some(old) = old {
            cx.tree_mut().with_items_host(old, |host, cx| host.clear_items(cx))?;
            if self.owns_panel {
                cx.tree_mut().remove(old)?;
            }
        }
        self.owns_panel = false;
        self.source_is_new = true;
        cx.invalidate_measure();
        Ok(())
    }

    fn project(
        &self,
        cx: &mut ElementCx<'_>,
        panel: ElementId,
        change: CollectionChange<Rc<T>>,
    ) -> Result<()> {
        let template = self.template.clone();
        cx.tree_mut().with_items_host(panel, |host, cx| match change {
            CollectionChange::Add { index, items } => {
                for (offset, item) in items.into_iter().enumerate() {
                    host.insert_item(cx, index + offset, DataContext::new(item), template.clone())?;
                }
                Ok(())
            }
            CollectionChange::Remove { index, items } => {
                for _ in &items {
                    host.remove_item(cx, index)?;
                }
                Ok(())
            }
            CollectionChange::Replace {
                index, new_items, ..
            } => {
                for (offset, item) in new_items.into_iter().enumerate() {
                    host.remove_item(cx, index + offset)?;
                    host.insert_item(cx, index + offset, DataContext::new(item), template.clone())?;
                }
                Ok(())
            }
            CollectionChange::Move {
                old_index,
                new_index,
                ..
            } => host.move_item(cx, old_index, new_index),
            CollectionChange::Reset => Ok(()),
        })
    }

    fn populate(&self, cx: &mut ElementCx<'_>, panel: ElementId) -> Result<()> {
        let items = self.source.as_ref().map(|source| source.to_vec()).unwrap_or_default();
        let template = self.template.clone();
        cx.tree_mut().with_items_host(panel, |host, cx| {
            host.clear_items(cx)?;
            for (index, item) in items.into_iter().enumerate() {
                host.insert_item(cx, index, DataContext::new(item), template.clone())?;
            }
            Ok(())
        })
    }
}

impl<T: 'static> fmt::Debug for ItemsControl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemsControl")
            .field("items", &self.source.as_ref().map(|source| source.len()))
            .field("has_template", &self.template.is_some())
            .field("panel", &self.panel)
            .field("owns_panel", &self.owns_panel)
            .field("queued_changes", &self.changes.borrow().len())
            .field("source_is_new", &self.source_is_new)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Element for ItemsControl<T> {
    fn on_apply_template(&mut self, cx: &mut ElementCx<'_>) -> Result<()> {
        let panel = match self.panel {
            Some(panel) => panel,
            None => {
                let panel = cx.tree_mut().insert(StackPanel::new());
                replace_child(cx, &mut self.panel, Some(panel))?;
                self.owns_panel = true;
                self.source_is_new = true;
                panel
            }
        };
        if self.source_is_new {
            self.changes.borrow_mut().clear();
            self.populate(cx, panel)?;
            self.source_is_new = false;
            return Ok(());
        }
        let changes = core::mem::take(&mut *self.changes.borrow_mut());
        for change in changes {
            if matches!(change, CollectionChange::Reset) {
                self.populate(cx, panel)?;
            } else {
                self.project(cx, panel, change)?;
            }
        }
        Ok(())
    }

    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        match self.panel {
            Some(panel) => cx.measure_child(panel, available),
            None => Ok(Size::ZERO),
        }
    }

    fn arrange_override(&mut self, cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        if let Some(panel) = self.panel {
            cx.arrange_child(panel, Rect::from_origin_size((0.0, 0.0), final_size))?;
        }
        Ok(final_size)
    }

    fn visual_children(&self) -> ChildList {
        self.panel.into_iter().collect()
    }
}
