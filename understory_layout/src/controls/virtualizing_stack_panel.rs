// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Rect, Size};

use crate::collection::{ItemsHost, VirtualizingCollection};
use crate::element::{ChildList, Element, ElementCx};
use crate::error::Result;
use crate::geometry::less_than;

/// A vertical stack that only realizes the items it can show.
///
/// Each measure walks the items from
/// [`first_visible_index`](Self::first_visible_index) until the available
/// height is filled. Items that scroll out are virtualized when the walk
/// ends; items still in view keep their elements. If items are removed from
/// under the first visible index, it falls back to the last item.
#[derive(Debug, Default)]
pub struct VirtualizingStackPanel {
    items: VirtualizingCollection,
    first_visible_index: usize,
}

impl VirtualizingStackPanel {
    /// Creates an empty panel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The item records.
    #[must_use]
    pub fn items(&self) -> &VirtualizingCollection {
        &self.items
    }

    /// The item records, mutably.
    pub fn items_mut(&mut self) -> &mut VirtualizingCollection {
        &mut self.items
    }

    /// Index of the first item shown.
    #[must_use]
    pub fn first_visible_index(&self) -> usize {
        self.first_visible_index
    }

    /// Scrolls so that `index` is the first item shown.
    pub fn set_first_visible_index(&mut self, cx: &mut ElementCx<'_>, index: usize) {
        let index = index.min(self.items.len().saturating_sub(1));
        if index != self.first_visible_index {
            self.first_visible_index = index;
            cx.invalidate_measure();
        }
    }
}

impl Element for VirtualizingStackPanel {
    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        let owner = cx.id();
        self.first_visible_index = self
            .first_visible_index
            .min(self.items.len().saturating_sub(1));
        let child_available = Size::new(available.width, f64::INFINITY);
        let mut desired = Size::ZERO;
        let mut cursor = self
            .items
            .cursor(cx.tree_mut(), owner, self.first_visible_index);
        while less_than(desired.height, available.height) {
            let Some(child) = cursor.next() else {
                break;
            };
            let size = cursor.tree().measure(child?, child_available)?;
            desired.width = desired.width.max(size.width);
            desired.height += size.height;
        }
        cursor.finish()?;
        Ok(desired)
    }

    fn arrange_override(&mut self, cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        let mut top = 0.0;
        for child in self.items.ids() {
            let desired = cx.desired_size_of(child);
            let rect = Rect::from_origin_size(
                (0.0, top),
                (final_size.width.max(desired.width), desired.height),
            );
            cx.arrange_child(child, rect)?;
            top += desired.height;
        }
        Ok(final_size)
    }

    fn visual_children(&self) -> ChildList {
        self.items.ids()
    }

    fn items_host(&mut self) -> Option<&mut dyn ItemsHost> {
        Some(&mut self.items)
    }
}
