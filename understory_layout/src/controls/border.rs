// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Rect, Size};

use super::replace_child;
use crate::element::{ChildList, Element, ElementCx};
use crate::error::Result;
use crate::geometry::{RectExt, SizeExt, Thickness};
use crate::id::ElementId;
use crate::render::DrawingContext;

/// Draws edges and a background around a single child.
#[derive(Debug, Default)]
pub struct Border {
    child: Option<ElementId>,
}

impl Border {
    /// Creates an empty border.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The child, if any.
    #[must_use]
    pub fn child(&self) -> Option<ElementId> {
        self.child
    }

    /// Replaces the child.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`](crate::LayoutError::StaleElement) if
    /// `child` is not live.
    pub fn set_child(&mut self, cx: &mut ElementCx<'_>, child: Option<ElementId>) -> Result<()> {
        replace_child(cx, &mut self.child, child)
    }
}

fn edges(thickness: Thickness, size: Size) -> impl Iterator<Item = Rect> {
    let Thickness {
        left,
        top,
        right,
        bottom,
    } = thickness;
    let (width, height) = (size.width, size.height);
    [
        (left > 0.0).then(|| Rect::new(0.0, 0.0, left, height)),
        (top > 0.0).then(|| Rect::new(left, 0.0, width, top)),
        (right > 0.0).then(|| Rect::new(width - right, top, width, height)),
        (bottom > 0.0).then(|| Rect::new(left, height - bottom, width - right, height)),
    ]
    .into_iter()
    .flatten()
}

impl Element for Border {
    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        let props = cx.properties().border;
        let frame = *cx.get(props.border_thickness) + *cx.get(props.padding);
        match self.child {
            Some(child) => {
                let desired = cx.measure_child(child, available.deflate(frame))?;
                Ok(desired.inflate(frame))
            }
            None => Ok(frame.collapse()),
        }
    }

    fn arrange_override(&mut self, cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        if let Some(child) = self.child {
            let props = cx.properties().border;
            let rect = Rect::from_origin_size((0.0, 0.0), final_size)
                .deflate(*cx.get(props.border_thickness))
                .deflate(*cx.get(props.padding));
            cx.arrange_child(child, rect)?;
        }
        Ok(final_size)
    }

    fn render(&self, cx: &ElementCx<'_>, drawing: &mut DrawingContext) {
        let props = cx.properties().border;
        let thickness = *cx.get(props.border_thickness);
        let size = cx.render_size();
        if thickness != Thickness::ZERO
            && let Some(brush) = cx.get(props.border_brush)
        {
            for edge in edges(thickness, size) {
                drawing.draw_rectangle(edge, brush);
            }
        }
        if let Some(background) = cx.get(props.background) {
            let inner = Rect::from_origin_size((0.0, 0.0), size).deflate(thickness);
            drawing.draw_rectangle(inner, background);
        }
    }

    fn visual_children(&self) -> ChildList {
        self.child.into_iter().collect()
    }
}
