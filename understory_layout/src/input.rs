// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer gestures and capture.

use alloc::collections::VecDeque;
use core::ops::{Deref, DerefMut};

use kurbo::{Point, Vec2};

use crate::element::ElementCx;
use crate::error::Result;
use crate::id::ElementId;

/// Kind of a pointer gesture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// The primary button went down.
    ButtonDown,
    /// The primary button went up.
    ButtonUp,
    /// The pointer moved.
    Move,
    /// The pointer moved with the button down; see [`Gesture::delta`].
    Drag,
    /// A completed press and release.
    Tap,
}

/// A pointer gesture in root coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Gesture {
    /// What happened.
    pub kind: GestureKind,
    /// Pointer position.
    pub position: Point,
    /// Movement since the previous gesture, for [`GestureKind::Drag`].
    pub delta: Vec2,
}

impl Gesture {
    /// A gesture with no movement.
    #[must_use]
    pub fn new(kind: GestureKind, position: Point) -> Self {
        Self {
            kind,
            position,
            delta: Vec2::ZERO,
        }
    }

    /// A drag that moved by `delta` and ended at `position`.
    #[must_use]
    pub fn drag(position: Point, delta: Vec2) -> Self {
        Self {
            kind: GestureKind::Drag,
            position,
            delta,
        }
    }
}

/// A queue of gestures read by [`RootElement::update_with_input`].
///
/// [`RootElement::update_with_input`]: crate::RootElement::update_with_input
pub trait GestureSource {
    /// Returns the next gesture, or `None` when drained.
    fn next_gesture(&mut self) -> Option<Gesture>;
}

impl GestureSource for VecDeque<Gesture> {
    fn next_gesture(&mut self) -> Option<Gesture> {
        self.pop_front()
    }
}

/// The element holding the pointer capture, if any.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureSlot {
    holder: Option<ElementId>,
}

impl CaptureSlot {
    /// The element holding the capture.
    #[must_use]
    pub fn holder(&self) -> Option<ElementId> {
        self.holder
    }

    /// Gives the capture to `id`.
    ///
    /// Fails if another element holds it. Asking again while already holding
    /// it succeeds.
    pub fn capture(&mut self, id: ElementId) -> bool {
        match self.holder {
            None => {
                self.holder = Some(id);
                true
            }
            Some(holder) if holder == id => true,
            Some(holder) => {
                tracing::warn!(requested = ?id, ?holder, "pointer capture already held");
                false
            }
        }
    }

    /// Releases the capture if `id` holds it.
    pub fn release(&mut self, id: ElementId) -> bool {
        if self.holder == Some(id) {
            self.holder = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn clear(&mut self) {
        self.holder = None;
    }
}

/// Context for [`Element::on_gesture`](crate::Element::on_gesture).
///
/// Dereferences to [`ElementCx`] and adds pointer capture.
pub struct InputCx<'a> {
    cx: ElementCx<'a>,
    capture: &'a mut CaptureSlot,
}

impl<'a> InputCx<'a> {
    pub(crate) fn new(cx: ElementCx<'a>, capture: &'a mut CaptureSlot) -> Self {
        Self { cx, capture }
    }

    /// Captures the pointer for this element.
    ///
    /// Returns `false` if another element holds the capture.
    ///
    /// # Errors
    ///
    /// Propagates a failed write of `IsMouseCaptured`.
    pub fn capture_mouse(&mut self) -> Result<bool> {
        let id = self.cx.id();
        if !self.capture.capture(id) {
            return Ok(false);
        }
        let captured = self.cx.properties().layout.is_mouse_captured;
        self.cx.set(captured, true)?;
        Ok(true)
    }

    /// Releases the pointer capture, if this element holds it.
    ///
    /// # Errors
    ///
    /// Propagates a failed write of `IsMouseCaptured`.
    pub fn release_mouse_capture(&mut self) -> Result<()> {
        if self.capture.release(self.cx.id()) {
            let captured = self.cx.properties().layout.is_mouse_captured;
            self.cx.set(captured, false)?;
        }
        Ok(())
    }

    /// Returns `true` if this element holds the capture.
    #[must_use]
    pub fn is_mouse_captured(&self) -> bool {
        self.capture.holder() == Some(self.cx.id())
    }
}

impl<'a> Deref for InputCx<'a> {
    type Target = ElementCx<'a>;

    fn deref(&self) -> &Self::Target {
        &self.cx
    }
}

impl DerefMut for InputCx<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cx
    }
}

impl core::fmt::Debug for InputCx<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InputCx")
            .field("id", &self.cx.id())
            .field("capture", &self.capture)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_is_exclusive() {
        let a = ElementId::new(0, 1);
        let b = ElementId::new(1, 1);
        let mut slot = CaptureSlot::default();
        assert!(slot.capture(a));
        assert!(slot.capture(a));
        assert!(!slot.capture(b));
        assert!(!slot.release(b));
        assert_eq!(slot.holder(), Some(a));
        assert!(slot.release(a));
        assert!(slot.capture(b));
    }

    #[test]
    fn queues_drain_in_order() {
        let mut queue = VecDeque::from([
            Gesture::new(GestureKind::ButtonDown, Point::ZERO),
            Gesture::drag(Point::new(0.0, 5.0), Vec2::new(0.0, 5.0)),
        ]);
        assert_eq!(queue.next_gesture().map(|g| g.kind), Some(GestureKind::ButtonDown));
        assert_eq!(queue.next_gesture().map(|g| g.delta), Some(Vec2::new(0.0, 5.0)));
        assert_eq!(queue.next_gesture(), None);
    }
}
