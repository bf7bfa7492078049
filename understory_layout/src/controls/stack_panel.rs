// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Rect, Size};

use super::Orientation;
use crate::collection::{ElementCollection, ItemsHost, Panel};
use crate::element::{ChildList, Element, ElementCx};
use crate::error::Result;

/// Stacks children in one direction.
///
/// Children get unbounded space along the stacking axis and the panel's
/// extent across it.
#[derive(Debug, Default)]
pub struct StackPanel {
    children: ElementCollection,
}

impl StackPanel {
    /// Creates an empty panel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Element for StackPanel {
    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        let orientation = *cx.get(cx.properties().stack_panel.orientation);
        let child_available = match orientation {
            Orientation::Vertical => Size::new(available.width, f64::INFINITY),
            Orientation::Horizontal => Size::new(f64::INFINITY, available.height),
        };
        let mut desired = Size::ZERO;
        for child in self.children.iter() {
            let size = cx.measure_child(child, child_available)?;
            match orientation {
                Orientation::Vertical => {
                    desired.width = desired.width.max(size.width);
                    desired.height += size.height;
                }
                Orientation::Horizontal => {
                    desired.width += size.width;
                    desired.height = desired.height.max(size.height);
                }
            }
        }
        Ok(desired)
    }

    fn arrange_override(&mut self, cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        let orientation = *cx.get(cx.properties().stack_panel.orientation);
        let mut offset = 0.0;
        for child in self.children.iter() {
            let desired = cx.desired_size_of(child);
            let rect = match orientation {
                Orientation::Vertical => Rect::from_origin_size(
                    (0.0, offset),
                    (final_size.width.max(desired.width), desired.height),
                ),
                Orientation::Horizontal => Rect::from_origin_size(
                    (offset, 0.0),
                    (desired.width, final_size.height.max(desired.height)),
                ),
            };
            offset += match orientation {
                Orientation::Vertical => desired.height,
                Orientation::Horizontal => desired.width,
            };
            cx.arrange_child(child, rect)?;
        }
        Ok(final_size)
    }

    fn visual_children(&self) -> ChildList {
        self.children.ids()
    }

    fn items_host(&mut self) -> Option<&mut dyn ItemsHost> {
        Some(&mut self.children)
    }
}

impl Panel for StackPanel {
    fn children(&self) -> &ElementCollection {
        &self.children
    }

    fn children_mut(&mut self) -> &mut ElementCollection {
        &mut self.children
    }
}
