// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Rect, Size};

use super::replace_child;
use crate::element::{ChildList, Element, ElementCx};
use crate::error::Result;
use crate::id::ElementId;
use crate::input::{Gesture, GestureKind, InputCx};

type ClickHandler = Box<dyn FnMut(&mut ElementCx<'_>) -> Result<()>>;

/// A pressable element with a single content child.
///
/// A button-down captures the pointer and sets `IsPressed`. While captured,
/// moves keep `IsPressed` in step with whether the pointer is over the
/// button. Releasing while pressed clicks; a tap always clicks.
#[derive(Default)]
pub struct Button {
    content: Option<ElementId>,
    handlers: Vec<ClickHandler>,
    button_down: bool,
}

impl Button {
    /// Creates a button with no content.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a click handler.
    #[must_use]
    pub fn with_on_click(
        mut self,
        handler: impl FnMut(&mut ElementCx<'_>) -> Result<()> + 'static,
    ) -> Self {
        self.on_click(handler);
        self
    }

    /// Adds a click handler. Handlers run in the order added.
    pub fn on_click(&mut self, handler: impl FnMut(&mut ElementCx<'_>) -> Result<()> + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// The content element.
    #[must_use]
    pub fn content(&self) -> Option<ElementId> {
        self.content
    }

    /// Replaces the content.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`](crate::LayoutError::StaleElement) if
    /// `content` is not live.
    pub fn set_content(
        &mut self,
        cx: &mut ElementCx<'_>,
        content: Option<ElementId>,
    ) -> Result<()> {
        replace_child(cx, &mut self.content, content)
    }

    fn click(&mut self, cx: &mut ElementCx<'_>) -> Result<()> {
        tracing::trace!(element = ?cx.id(), "click");
        for handler in &mut self.handlers {
            handler(cx)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("content", &self.content)
            .field("handlers", &self.handlers.len())
            .field("button_down", &self.button_down)
            .finish()
    }
}

impl Element for Button {
    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        match self.content {
            Some(content) => cx.measure_child(content, available),
            None => Ok(Size::ZERO),
        }
    }

    fn arrange_override(&mut self, cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        if let Some(content) = self.content {
            cx.arrange_child(content, Rect::from_origin_size((0.0, 0.0), final_size))?;
        }
        Ok(final_size)
    }

    fn visual_children(&self) -> ChildList {
        self.content.into_iter().collect()
    }

    fn accepts_input(&self) -> bool {
        true
    }

    fn on_gesture(&mut self, cx: &mut InputCx<'_>, gesture: &Gesture) -> Result<()> {
        let is_pressed = cx.properties().button.is_pressed;
        match gesture.kind {
            GestureKind::ButtonDown => {
                self.button_down = true;
                if cx.capture_mouse()? {
                    cx.set(is_pressed, true)?;
                }
            }
            GestureKind::ButtonUp => {
                self.button_down = false;
                if *cx.get(is_pressed) {
                    self.click(cx)?;
                }
                cx.release_mouse_capture()?;
                cx.set(is_pressed, false)?;
            }
            GestureKind::Tap => self.click(cx)?,
            GestureKind::Move | GestureKind::Drag => {
                if self.button_down && cx.is_mouse_captured() {
                    let over = cx.hit_test(gesture.position);
                    cx.set(is_pressed, over)?;
                }
            }
        }
        Ok(())
    }
}
