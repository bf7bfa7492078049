// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element trait and the context handed to element callbacks.

use alloc::rc::Rc;
use core::any::Any;
use core::fmt;

use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;
use understory_property::{Property, PropertyChanged};

use crate::collection::ItemsHost;
use crate::error::Result;
use crate::id::ElementId;
use crate::input::{Gesture, InputCx};
use crate::layout::LayoutState;
use crate::properties::Properties;
use crate::render::DrawingContext;
use crate::text::TextMeasurer;
use crate::tree::ElementTree;

/// Visual children of an element, in draw order.
pub type ChildList = SmallVec<[ElementId; 4]>;

/// How an element's clip is chosen after arrange.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Clipping {
    /// Use the layout clip: the parent's slot and the max size constraint.
    Computed,
    /// Never clip.
    None,
    /// Clip to this rectangle, in element coordinates.
    Rect(Rect),
}

/// Behavior of one kind of element.
///
/// Layout state, properties and bindings are kept by the
/// [`ElementTree`]; an `Element` only supplies the element-specific parts of
/// the protocol. Every method has a default, so a leaf that draws nothing and
/// wants no space is an empty `impl`.
///
/// While a callback runs, the element is detached from the tree. The
/// [`ElementCx`] can reach every other element, but re-entering the same
/// element reports [`LayoutError::ElementBusy`](crate::LayoutError::ElementBusy).
pub trait Element: Any {
    /// Returns the size this element wants within `available`.
    ///
    /// `available` already excludes the margin and honors the min/max
    /// constraints. Panels measure their children here. The result must not
    /// be NaN or positive infinity.
    fn measure_override(&mut self, _cx: &mut ElementCx<'_>, _available: Size) -> Result<Size> {
        Ok(Size::ZERO)
    }

    /// Positions children within `final_size` and returns the size used.
    fn arrange_override(&mut self, _cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        Ok(final_size)
    }

    /// Chooses the clip after arrange.
    fn clipping(&self, _render_size: Size) -> Clipping {
        Clipping::Computed
    }

    /// Records drawing commands in element coordinates.
    ///
    /// Called after every arrange that was not skipped.
    fn render(&self, _cx: &ElementCx<'_>, _drawing: &mut DrawingContext) {}

    /// Returns the visual children, in draw order.
    fn visual_children(&self) -> ChildList {
        ChildList::new()
    }

    /// Called at the start of every measure that is not skipped, after
    /// bindings resolved.
    fn on_apply_template(&mut self, _cx: &mut ElementCx<'_>) -> Result<()> {
        Ok(())
    }

    /// Returns `true` if gestures may be routed to this element.
    fn accepts_input(&self) -> bool {
        false
    }

    /// Handles a routed gesture.
    fn on_gesture(&mut self, _cx: &mut InputCx<'_>, _gesture: &Gesture) -> Result<()> {
        Ok(())
    }

    /// Returns the templated children collection, for
    /// [`ItemsControl`](crate::ItemsControl) panels.
    fn items_host(&mut self) -> Option<&mut dyn ItemsHost> {
        None
    }
}

/// Access to the tree from inside an element callback.
pub struct ElementCx<'a> {
    tree: &'a mut ElementTree,
    id: ElementId,
}

impl<'a> ElementCx<'a> {
    pub(crate) fn new(tree: &'a mut ElementTree, id: ElementId) -> Self {
        Self { tree, id }
    }

    /// The element being called.
    #[must_use]
    #[inline]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// The whole tree.
    #[must_use]
    #[inline]
    pub fn tree(&self) -> &ElementTree {
        self.tree
    }

    /// The whole tree, mutably.
    #[inline]
    pub fn tree_mut(&mut self) -> &mut ElementTree {
        self.tree
    }

    /// The built-in property handles.
    #[must_use]
    #[inline]
    pub fn properties(&self) -> Properties {
        self.tree.properties()
    }

    /// Reads one of this element's properties.
    #[must_use]
    pub fn get<T: Clone + 'static>(&self, property: Property<T>) -> &T {
        self.tree.value_or_default(self.id, property)
    }

    /// Writes one of this element's properties.
    ///
    /// # Errors
    ///
    /// Propagates failures of a two-way binding writing back to its source.
    pub fn set<T: Clone + 'static>(
        &mut self,
        property: Property<T>,
        value: T,
    ) -> Result<Option<PropertyChanged>> {
        self.tree.set_value(self.id, property, value)
    }

    /// Measures a child. See [`ElementTree::measure`].
    ///
    /// # Errors
    ///
    /// Propagates the child's layout errors.
    pub fn measure_child(&mut self, child: ElementId, available: Size) -> Result<Size> {
        self.tree.measure(child, available)
    }

    /// Arranges a child. See [`ElementTree::arrange`].
    ///
    /// # Errors
    ///
    /// Propagates the child's layout errors.
    pub fn arrange_child(&mut self, child: ElementId, rect: Rect) -> Result<()> {
        self.tree.arrange(child, rect)
    }

    /// The last desired size of `child`, or zero if it is stale.
    #[must_use]
    pub fn desired_size_of(&self, child: ElementId) -> Size {
        self.tree
            .layout(child)
            .map_or(Size::ZERO, LayoutState::desired_size)
    }

    /// This element's render size from the current (or last) arrange.
    #[must_use]
    pub fn render_size(&self) -> Size {
        self.layout().render_size()
    }

    /// Makes `child` a visual child of this element and invalidates measure.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`](crate::LayoutError::StaleElement) if
    /// `child` is not live.
    pub fn adopt(&mut self, child: ElementId) -> Result<()> {
        self.tree.set_parent(child, Some(self.id))?;
        self.tree.invalidate_measure(self.id);
        Ok(())
    }

    /// Detaches `child` if this element is its parent, and invalidates
    /// measure. Stale children are ignored.
    ///
    /// # Errors
    ///
    /// Propagates a failed detach.
    pub fn disown(&mut self, child: ElementId) -> Result<()> {
        if self.tree.parent(child) == Some(self.id) {
            self.tree.set_parent(child, None)?;
        }
        self.tree.invalidate_measure(self.id);
        Ok(())
    }

    /// Invalidates this element's measure.
    pub fn invalidate_measure(&mut self) {
        self.tree.invalidate_measure(self.id);
    }

    /// Invalidates this element's arrange.
    pub fn invalidate_arrange(&mut self) {
        self.tree.invalidate_arrange(self.id);
    }

    /// Tests a root-space point against this element's bounds.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> bool {
        self.tree.hit_test(self.id, point)
    }

    /// The tree's text measurer.
    #[must_use]
    pub fn text_measurer(&self) -> Rc<dyn TextMeasurer> {
        self.tree.text_measurer().clone()
    }

    pub(crate) fn layout(&self) -> &LayoutState {
        self.tree.layout_or_default(self.id)
    }

    pub(crate) fn layout_mut(&mut self) -> Option<&mut LayoutState> {
        self.tree.layout_mut(self.id)
    }

    pub(crate) fn set_drawing(&mut self, drawing: DrawingContext) {
        self.tree.set_drawing(self.id, drawing);
    }
}

impl fmt::Debug for ElementCx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementCx")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

pub(crate) fn as_any(element: &dyn Element) -> &dyn Any {
    element
}

pub(crate) fn as_any_mut(element: &mut dyn Element) -> &mut dyn Any {
    element
}
