// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Rect, Size, Vec2};

use super::replace_child;
use crate::element::{ChildList, Clipping, Element, ElementCx};
use crate::error::{LayoutError, Result};
use crate::geometry::{close_to, coerce, less_than};
use crate::id::ElementId;
use crate::input::{Gesture, GestureKind, InputCx};
use crate::tree::ElementTree;

/// Shows a window onto content larger than itself.
///
/// Content is measured with unbounded space on every scrollable axis and
/// arranged at the negated offset. The offset stays within
/// `[0, extent - viewport]`. Dragging scrolls while the presenter holds the
/// pointer capture.
#[derive(Debug)]
pub struct ScrollContentPresenter {
    content: Option<ElementId>,
    can_horizontally_scroll: bool,
    can_vertically_scroll: bool,
    offset: Vec2,
    extent: Size,
    viewport: Size,
    clipping_required: bool,
    handles_input: bool,
}

impl Default for ScrollContentPresenter {
    fn default() -> Self {
        Self {
            content: None,
            can_horizontally_scroll: true,
            can_vertically_scroll: true,
            offset: Vec2::ZERO,
            extent: Size::ZERO,
            viewport: Size::ZERO,
            clipping_required: false,
            handles_input: true,
        }
    }
}

impl ScrollContentPresenter {
    /// A presenter that scrolls both ways.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts scrolling to the given axes.
    #[must_use]
    pub fn with_scroll_axes(mut self, horizontal: bool, vertical: bool) -> Self {
        self.can_horizontally_scroll = horizontal;
        self.can_vertically_scroll = vertical;
        self
    }

    /// Returns `true` if content may scroll horizontally.
    #[must_use]
    pub fn can_horizontally_scroll(&self) -> bool {
        self.can_horizontally_scroll
    }

    /// Returns `true` if content may scroll vertically.
    #[must_use]
    pub fn can_vertically_scroll(&self) -> bool {
        self.can_vertically_scroll
    }

    /// Turns horizontal scrolling on or off. Turning it off resets the
    /// horizontal offset.
    pub fn set_can_horizontally_scroll(&mut self, cx: &mut ElementCx<'_>, value: bool) {
        if self.can_horizontally_scroll != value {
            self.can_horizontally_scroll = value;
            if !value {
                self.offset.x = 0.0;
            }
            cx.invalidate_measure();
        }
    }

    /// Turns vertical scrolling on or off. Turning it off resets the
    /// vertical offset.
    pub fn set_can_vertically_scroll(&mut self, cx: &mut ElementCx<'_>, value: bool) {
        if self.can_vertically_scroll != value {
            self.can_vertically_scroll = value;
            if !value {
                self.offset.y = 0.0;
            }
            cx.invalidate_measure();
        }
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
    /// [`LayoutError::StaleElement`] if `content` is not live.
    pub fn set_content(
        &mut self,
        cx: &mut ElementCx<'_>,
        content: Option<ElementId>,
    ) -> Result<()> {
        replace_child(cx, &mut self.content, content)
    }

    /// Current scroll offset.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Desired size of the content from the last layout.
    #[must_use]
    pub fn extent(&self) -> Size {
        self.extent
    }

    /// Visible size from the last layout.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Scrolls horizontally. Negative offsets become zero; the upper bound is
    /// applied at the next layout. Ignored if horizontal scrolling is off.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidScrollOffset`] if `offset` is NaN.
    pub fn set_horizontal_offset(&mut self, cx: &mut ElementCx<'_>, offset: f64) -> Result<()> {
        if !self.can_horizontally_scroll {
            return Ok(());
        }
        let offset = checked_offset(offset)?;
        if !close_to(self.offset.x, offset) {
            self.offset.x = offset;
            cx.invalidate_arrange();
        }
        Ok(())
    }

    /// Scrolls vertically. See [`set_horizontal_offset`](Self::set_horizontal_offset).
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidScrollOffset`] if `offset` is NaN.
    pub fn set_vertical_offset(&mut self, cx: &mut ElementCx<'_>, offset: f64) -> Result<()> {
        if !self.can_vertically_scroll {
            return Ok(());
        }
        let offset = checked_offset(offset)?;
        if !close_to(self.offset.y, offset) {
            self.offset.y = offset;
            cx.invalidate_arrange();
        }
        Ok(())
    }

    fn update_scroll_data(&mut self, viewport: Size, extent: Size) {
        self.viewport = viewport;
        self.extent = extent;
        self.offset = Vec2::new(
            coerce(self.offset.x, 0.0, extent.width - viewport.width),
            coerce(self.offset.y, 0.0, extent.height - viewport.height),
        );
    }
}

fn checked_offset(offset: f64) -> Result<f64> {
    if offset.is_nan() {
        Err(LayoutError::InvalidScrollOffset)
    } else {
        Ok(offset.max(0.0))
    }
}

impl Element for ScrollContentPresenter {
    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        let mut extent = Size::ZERO;
        if let Some(content) = self.content {
            let mut content_available = available;
            if self.can_horizontally_scroll {
                content_available.width = f64::INFINITY;
            }
            if self.can_vertically_scroll {
                content_available.height = f64::INFINITY;
            }
            extent = cx.measure_child(content, content_available)?;
        }
        self.update_scroll_data(available, extent);
        Ok(Size::new(
            available.width.min(extent.width),
            available.height.min(extent.height),
        ))
    }

    fn arrange_override(&mut self, cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        self.update_scroll_data(final_size, self.extent);
        if let Some(content) = self.content {
            let desired = cx.desired_size_of(content);
            self.clipping_required = less_than(final_size.width, desired.width)
                || less_than(final_size.height, desired.height);
            let rect = Rect::from_origin_size(
                (-self.offset.x, -self.offset.y),
                (
                    desired.width.max(final_size.width),
                    desired.height.max(final_size.height),
                ),
            );
            cx.arrange_child(content, rect)?;
        }
        Ok(final_size)
    }

    fn clipping(&self, render_size: Size) -> Clipping {
        if self.clipping_required {
            Clipping::Rect(Rect::from_origin_size((0.0, 0.0), render_size))
        } else {
            Clipping::None
        }
    }

    fn visual_children(&self) -> ChildList {
        self.content.into_iter().collect()
    }

    fn accepts_input(&self) -> bool {
        self.handles_input
    }

    fn on_gesture(&mut self, cx: &mut InputCx<'_>, gesture: &Gesture) -> Result<()> {
        match gesture.kind {
            GestureKind::Drag => {
                if cx.capture_mouse()? {
                    self.set_horizontal_offset(cx, self.offset.x - gesture.delta.x)?;
                    self.set_vertical_offset(cx, self.offset.y - gesture.delta.y)?;
                }
            }
            GestureKind::ButtonUp => cx.release_mouse_capture()?,
            GestureKind::ButtonDown | GestureKind::Move | GestureKind::Tap => {}
        }
        Ok(())
    }
}

/// A content control that scrolls its content.
///
/// Content is wrapped in a [`ScrollContentPresenter`] the viewer inserts
/// itself, unless the content already is one. The viewer forwards the
/// scrolling state to that presenter and takes over its input: a button
/// press captures the pointer, and drags while captured move the offset.
#[derive(Debug, Default)]
pub struct ScrollViewer {
    presenter: Option<ElementId>,
    inserted_presenter: bool,
}

impl ScrollViewer {
    /// Creates an empty viewer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The presenter doing the scrolling, once there is content.
    #[must_use]
    pub fn presenter(&self) -> Option<ElementId> {
        self.presenter
    }

    /// The scrolled element.
    #[must_use]
    pub fn content(&self, tree: &ElementTree) -> Option<ElementId> {
        let presenter = self.scroll_info(tree)?;
        if self.inserted_presenter {
            presenter.content()
        } else {
            self.presenter
        }
    }

    /// Replaces the content.
    ///
    /// A [`ScrollContentPresenter`] becomes the viewer's presenter directly.
    /// Anything else is placed inside a presenter the viewer owns; that
    /// presenter is created on first use and dropped again when a
    /// presenter replaces it.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`] if `content` is not live.
    pub fn set_content(
        &mut self,
        cx: &mut ElementCx<'_>,
        content: Option<ElementId>,
    ) -> Result<()> {
        if let Some(content) = content
            && cx.tree().element::<ScrollContentPresenter>(content).is_some()
        {
            return self.set_presenter(cx, content, false);
        }
        let presenter = match self.presenter.filter(|_| self.inserted_presenter) {
            Some(presenter) => presenter,
            None => {
                let presenter = cx.tree_mut().insert(ScrollContentPresenter::new());
                self.set_presenter(cx, presenter, true)?;
                presenter
            }
        };
        cx.tree_mut()
            .with_element::<ScrollContentPresenter, _>(presenter, |p, cx| {
                p.set_content(cx, content)
            })?
    }

    fn set_presenter(
        &mut self,
        cx: &mut ElementCx<'_>,
        presenter: ElementId,
        inserted: bool,
    ) -> Result<()> {
        if self.presenter == Some(presenter) {
            return Ok(());
        }
        if !cx.tree().contains(presenter) {
            return Err(LayoutError::StaleElement(presenter));
        }
        let old = self.presenter;
        let old_inserted = self.inserted_presenter;
        replace_child(cx, &mut self.presenter, Some(presenter))?;
        self.inserted_presenter = inserted;
        let tree = cx.tree_mut();
        tree.with_element::<ScrollContentPresenter, _>(presenter, |p, _| {
            p.handles_input = false;
        })?;
        if let Some(old) = old {
            if old_inserted {
                // The content survives its wrapper.
                tree.with_element::<ScrollContentPresenter, _>(old, |p, cx| {
                    p.set_content(cx, None)
                })??;
                tree.remove(old)?;
            } else {
                tree.with_element::<ScrollContentPresenter, _>(old, |p, _| {
                    p.handles_input = true;
                })?;
            }
        }
        Ok(())
    }

    fn scroll_info<'t>(&self, tree: &'t ElementTree) -> Option<&'t ScrollContentPresenter> {
        tree.element::<ScrollContentPresenter>(self.presenter?)
    }

    fn with_scroll_info(
        &self,
        cx: &mut ElementCx<'_>,
        f: impl FnOnce(&mut ScrollContentPresenter, &mut ElementCx<'_>) -> Result<()>,
    ) -> Result<()> {
        match self.presenter {
            Some(presenter) => cx
                .tree_mut()
                .with_element::<ScrollContentPresenter, _>(presenter, f)?,
            None => Ok(()),
        }
    }

    /// Returns `true` if the content may scroll horizontally. `false`
    /// without content.
    #[must_use]
    pub fn can_horizontally_scroll(&self, tree: &ElementTree) -> bool {
        self.scroll_info(tree)
            .is_some_and(ScrollContentPresenter::can_horizontally_scroll)
    }

    /// Returns `true` if the content may scroll vertically. `false` without
    /// content.
    #[must_use]
    pub fn can_vertically_scroll(&self, tree: &ElementTree) -> bool {
        self.scroll_info(tree)
            .is_some_and(ScrollContentPresenter::can_vertically_scroll)
    }

    /// Turns horizontal scrolling on or off. Ignored without content.
    ///
    /// # Errors
    ///
    /// [`LayoutError::ElementBusy`] if called from the presenter's own
    /// callback.
    pub fn set_can_horizontally_scroll(&self, cx: &mut ElementCx<'_>, value: bool) -> Result<()> {
        self.with_scroll_info(cx, |p, cx| {
            p.set_can_horizontally_scroll(cx, value);
            Ok(())
        })
    }

    /// Turns vertical scrolling on or off. Ignored without content.
    ///
    /// # Errors
    ///
    /// [`LayoutError::ElementBusy`] if called from the presenter's own
    /// callback.
    pub fn set_can_vertically_scroll(&self, cx: &mut ElementCx<'_>, value: bool) -> Result<()> {
        self.with_scroll_info(cx, |p, cx| {
            p.set_can_vertically_scroll(cx, value);
            Ok(())
        })
    }

    /// Desired size of the content. Zero without content.
    #[must_use]
    pub fn extent(&self, tree: &ElementTree) -> Size {
        self.scroll_info(tree)
            .map_or(Size::ZERO, ScrollContentPresenter::extent)
    }

    /// Visible size. Zero without content.
    #[must_use]
    pub fn viewport(&self, tree: &ElementTree) -> Size {
        self.scroll_info(tree)
            .map_or(Size::ZERO, ScrollContentPresenter::viewport)
    }

    /// Current scroll offset. Zero without content.
    #[must_use]
    pub fn offset(&self, tree: &ElementTree) -> Vec2 {
        self.scroll_info(tree)
            .map_or(Vec2::ZERO, ScrollContentPresenter::offset)
    }

    /// Scrolls horizontally. Ignored without content.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidScrollOffset`] if `offset` is NaN.
    pub fn set_horizontal_offset(&self, cx: &mut ElementCx<'_>, offset: f64) -> Result<()> {
        self.with_scroll_info(cx, |p, cx| p.set_horizontal_offset(cx, offset))
    }

    /// Scrolls vertically. Ignored without content.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidScrollOffset`] if `offset` is NaN.
    pub fn set_vertical_offset(&self, cx: &mut ElementCx<'_>, offset: f64) -> Result<()> {
        self.with_scroll_info(cx, |p, cx| p.set_vertical_offset(cx, offset))
    }
}

impl Element for ScrollViewer {
    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        match self.presenter {
            Some(presenter) => cx.measure_child(presenter, available),
            None => Ok(Size::ZERO),
        }
    }

    fn arrange_override(&mut self, cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        if let Some(presenter) = self.presenter {
            cx.arrange_child(presenter, Rect::from_origin_size((0.0, 0.0), final_size))?;
        }
        Ok(final_size)
    }

    fn visual_children(&self) -> ChildList {
        self.presenter.into_iter().collect()
    }

    fn accepts_input(&self) -> bool {
        true
    }

    fn on_gesture(&mut self, cx: &mut InputCx<'_>, gesture: &Gesture) -> Result<()> {
        match gesture.kind {
            GestureKind::ButtonDown => {
                cx.capture_mouse()?;
            }
            GestureKind::Drag => {
                if cx.is_mouse_captured() {
                    let delta = gesture.delta;
                    self.with_scroll_info(cx, |p, cx| {
                        p.set_horizontal_offset(cx, p.offset().x - delta.x)?;
                        p.set_vertical_offset(cx, p.offset().y - delta.y)
                    })?;
                }
            }
            GestureKind::ButtonUp => cx.release_mouse_capture()?,
            GestureKind::Move | GestureKind::Tap => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ElementTree;

    struct Fixed(Size);

    impl Element for Fixed {
        fn measure_override(&mut self, _cx: &mut ElementCx<'_>, _available: Size) -> Result<Size> {
            Ok(self.0)
        }
    }

    fn presenter(tree: &mut ElementTree) -> (ElementId, ElementId) {
        let presenter = tree.insert(ScrollContentPresenter::new());
        let content = tree.insert(Fixed(Size::new(100.0, 300.0)));
        tree.with_element::<ScrollContentPresenter, _>(presenter, |p, cx| {
            p.set_content(cx, Some(content))
        })
        .unwrap()
        .unwrap();
        (presenter, content)
    }

    fn layout(tree: &mut ElementTree, presenter: ElementId) {
        tree.measure(presenter, Size::new(100.0, 100.0)).unwrap();
        tree.arrange(presenter, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    }

    fn scroll_to(tree: &mut ElementTree, presenter: ElementId, y: f64) -> Result<()> {
        tree.with_element::<ScrollContentPresenter, _>(presenter, |p, cx| {
            p.set_vertical_offset(cx, y)
        })?
    }

    #[test]
    fn content_moves_against_the_offset() {
        let mut tree = ElementTree::new();
        let (presenter, content) = presenter(&mut tree);
        layout(&mut tree, presenter);
        let p = tree.element::<ScrollContentPresenter>(presenter).unwrap();
        assert_eq!(p.extent(), Size::new(100.0, 300.0));
        assert_eq!(p.viewport(), Size::new(100.0, 100.0));

        scroll_to(&mut tree, presenter, 50.0).unwrap();
        assert!(!tree.is_layout_valid(presenter));
        layout(&mut tree, presenter);
        assert_eq!(tree.layout(content).unwrap().visual_offset(), Vec2::new(0.0, -50.0));
        assert_eq!(
            tree.layout(presenter).unwrap().clip(),
            Some(Rect::new(0.0, 0.0, 100.0, 100.0))
        );
    }

    #[test]
    fn offset_is_clamped_to_the_extent() {
        let mut tree = ElementTree::new();
        let (presenter, content) = presenter(&mut tree);
        layout(&mut tree, presenter);
        scroll_to(&mut tree, presenter, 1000.0).unwrap();
        layout(&mut tree, presenter);
        let p = tree.element::<ScrollContentPresenter>(presenter).unwrap();
        assert_eq!(p.offset(), Vec2::new(0.0, 200.0));
        assert_eq!(tree.layout(content).unwrap().visual_offset().y, -200.0);

        scroll_to(&mut tree, presenter, -5.0).unwrap();
        let p = tree.element::<ScrollContentPresenter>(presenter).unwrap();
        assert_eq!(p.offset().y, 0.0);
    }

    #[test]
    fn nan_offsets_are_rejected() {
        let mut tree = ElementTree::new();
        let (presenter, _) = presenter(&mut tree);
        assert_eq!(
            scroll_to(&mut tree, presenter, f64::NAN),
            Err(LayoutError::InvalidScrollOffset)
        );
    }

    fn viewer(tree: &mut ElementTree, content: ElementId) -> ElementId {
        let viewer = tree.insert(ScrollViewer::new());
        tree.with_element::<ScrollViewer, _>(viewer, |v, cx| v.set_content(cx, Some(content)))
            .unwrap()
            .unwrap();
        viewer
    }

    #[test]
    fn viewer_wraps_content_in_a_presenter() {
        let mut tree = ElementTree::new();
        let content = tree.insert(Fixed(Size::new(100.0, 300.0)));
        let viewer = viewer(&mut tree, content);
        let presenter = tree.element::<ScrollViewer>(viewer).unwrap().presenter().unwrap();
        assert_eq!(tree.parent(presenter), Some(viewer));
        assert_eq!(tree.parent(content), Some(presenter));
        assert!(!tree.element::<ScrollContentPresenter>(presenter).unwrap().accepts_input());

        layout(&mut tree, viewer);
        let v = tree.element::<ScrollViewer>(viewer).unwrap();
        assert_eq!(v.content(&tree), Some(content));
        assert_eq!(v.extent(&tree), Size::new(100.0, 300.0));
        assert_eq!(v.viewport(&tree), Size::new(100.0, 100.0));
        assert!(v.can_horizontally_scroll(&tree));
        assert!(v.can_vertically_scroll(&tree));
    }

    #[test]
    fn viewer_without_content_reports_nothing() {
        let mut tree = ElementTree::new();
        let viewer = tree.insert(ScrollViewer::new());
        layout(&mut tree, viewer);
        let v = tree.element::<ScrollViewer>(viewer).unwrap();
        assert_eq!(v.presenter(), None);
        assert!(!v.can_vertically_scroll(&tree));
        assert_eq!(v.extent(&tree), Size::ZERO);
        assert_eq!(v.offset(&tree), Vec2::ZERO);
        assert_eq!(tree.layout(viewer).unwrap().desired_size(), Size::ZERO);
    }

    #[test]
    fn viewer_forwards_offsets_and_axes() {
        let mut tree = ElementTree::new();
        let content = tree.insert(Fixed(Size::new(100.0, 300.0)));
        let viewer = viewer(&mut tree, content);
        layout(&mut tree, viewer);
        tree.with_element::<ScrollViewer, _>(viewer, |v, cx| v.set_vertical_offset(cx, 50.0))
            .unwrap()
            .unwrap();
        layout(&mut tree, viewer);
        assert_eq!(
            tree.element::<ScrollViewer>(viewer).unwrap().offset(&tree),
            Vec2::new(0.0, 50.0)
        );
        assert_eq!(tree.layout(content).unwrap().visual_offset(), Vec2::new(0.0, -50.0));

        tree.with_element::<ScrollViewer, _>(viewer, |v, cx| {
            v.set_can_vertically_scroll(cx, false)
        })
        .unwrap()
        .unwrap();
        assert!(!tree.is_layout_valid(viewer));
        layout(&mut tree, viewer);
        let v = tree.element::<ScrollViewer>(viewer).unwrap();
        assert!(!v.can_vertically_scroll(&tree));
        assert_eq!(v.offset(&tree), Vec2::ZERO);
        assert_eq!(tree.layout(content).unwrap().visual_offset(), Vec2::ZERO);
    }

    #[test]
    fn a_presenter_as_content_replaces_the_wrapper() {
        let mut tree = ElementTree::new();
        let content = tree.insert(Fixed(Size::new(100.0, 300.0)));
        let viewer = viewer(&mut tree, content);
        let wrapper = tree.element::<ScrollViewer>(viewer).unwrap().presenter().unwrap();

        let (own, inner) = presenter(&mut tree);
        tree.with_element::<ScrollViewer, _>(viewer, |v, cx| v.set_content(cx, Some(own)))
            .unwrap()
            .unwrap();
        assert!(!tree.contains(wrapper));
        assert!(tree.contains(content));
        assert_eq!(tree.parent(content), None);
        assert_eq!(tree.parent(own), Some(viewer));
        let v = tree.element::<ScrollViewer>(viewer).unwrap();
        assert_eq!(v.presenter(), Some(own));
        assert_eq!(v.content(&tree), Some(own));
        assert_eq!(tree.parent(inner), Some(own));
    }

    #[test]
    fn small_content_is_not_clipped() {
        let mut tree = ElementTree::new();
        let presenter = tree.insert(ScrollContentPresenter::new());
        let content = tree.insert(Fixed(Size::new(10.0, 10.0)));
        tree.with_element::<ScrollContentPresenter, _>(presenter, |p, cx| {
            p.set_content(cx, Some(content))
        })
        .unwrap()
        .unwrap();
        layout(&mut tree, presenter);
        assert_eq!(tree.layout(presenter).unwrap().clip(), None);
        assert_eq!(tree.layout(content).unwrap().render_size(), Size::new(100.0, 100.0));
    }
}
