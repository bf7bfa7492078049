// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame driver: layout passes, draw list and gesture routing.

use alloc::rc::Rc;
use core::fmt;

use kurbo::{Point, Rect, Size};

use crate::controls::replace_child;
use crate::element::{ChildList, Element, ElementCx};
use crate::error::{LayoutError, Result};
use crate::id::ElementId;
use crate::input::{CaptureSlot, Gesture, GestureSource, InputCx};
use crate::render::{DrawingSurface, Renderer};
use crate::text::{MonospaceMeasurer, TextMeasurer};
use crate::tree::ElementTree;

/// Configuration for a [`RootElement`].
///
/// ```rust
/// use kurbo::Rect;
/// use understory_layout::RootOptions;
///
/// let options = RootOptions::new(Rect::new(0.0, 0.0, 800.0, 600.0)).with_max_layout_passes(2);
/// assert_eq!(options.max_layout_passes(), 2);
/// ```
#[derive(Clone)]
pub struct RootOptions {
    viewport: Rect,
    max_layout_passes: usize,
    text_measurer: Rc<dyn TextMeasurer>,
}

impl RootOptions {
    /// Default number of layout passes per update.
    pub const DEFAULT_MAX_LAYOUT_PASSES: usize = 4;

    /// Options for a root laid out into `viewport`.
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            max_layout_passes: Self::DEFAULT_MAX_LAYOUT_PASSES,
            text_measurer: Rc::new(MonospaceMeasurer::default()),
        }
    }

    /// Caps the layout passes run by one [`RootElement::update`]. At least one
    /// pass always runs.
    #[must_use]
    pub fn with_max_layout_passes(mut self, passes: usize) -> Self {
        self.max_layout_passes = passes.max(1);
        self
    }

    /// Measures text with `measurer` instead of [`MonospaceMeasurer`].
    #[must_use]
    pub fn with_text_measurer(mut self, measurer: Rc<dyn TextMeasurer>) -> Self {
        self.text_measurer = measurer;
        self
    }

    /// The viewport rectangle.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// The layout pass limit.
    #[must_use]
    pub fn max_layout_passes(&self) -> usize {
        self.max_layout_passes
    }

    /// The text measurer.
    #[must_use]
    pub fn text_measurer(&self) -> &Rc<dyn TextMeasurer> {
        &self.text_measurer
    }
}

impl fmt::Debug for RootOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootOptions")
            .field("viewport", &self.viewport)
            .field("max_layout_passes", &self.max_layout_passes)
            .finish_non_exhaustive()
    }
}

/// The tree's root node: hosts one content element filling the viewport.
#[derive(Debug, Default)]
struct RootHost {
    content: Option<ElementId>,
}

impl Element for RootHost {
    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        if let Some(content) = self.live_content(cx) {
            cx.measure_child(content, available)?;
        }
        Ok(available)
    }

    fn arrange_override(&mut self, cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        if let Some(content) = self.live_content(cx) {
            cx.arrange_child(content, Rect::from_origin_size((0.0, 0.0), final_size))?;
        }
        Ok(final_size)
    }

    fn visual_children(&self) -> ChildList {
        self.content.into_iter().collect()
    }
}

impl RootHost {
    /// Forgets content removed from the tree behind the root's back.
    fn live_content(&mut self, cx: &ElementCx<'_>) -> Option<ElementId> {
        self.content = self.content.filter(|content| cx.tree().contains(*content));
        self.content
    }
}

/// Owns an element tree and drives it once per host frame.
///
/// The host calls [`update`](Self::update) (or
/// [`update_with_input`](Self::update_with_input)) and then
/// [`draw`](Self::draw), once each per frame.
///
/// ```rust
/// use kurbo::Rect;
/// use understory_layout::{RootElement, RootOptions, TextBlock};
///
/// let mut root = RootElement::new(RootOptions::new(Rect::new(0.0, 0.0, 200.0, 100.0)));
/// let label = root.tree_mut().insert(TextBlock::new());
/// root.set_content(Some(label)).unwrap();
/// root.update().unwrap();
/// assert_eq!(root.tree().layout(label).unwrap().render_size().width, 200.0);
/// ```
pub struct RootElement {
    tree: ElementTree,
    root: ElementId,
    renderer: Renderer,
    capture: CaptureSlot,
    options: RootOptions,
}

impl RootElement {
    /// Creates a root with an empty tree.
    #[must_use]
    pub fn new(options: RootOptions) -> Self {
        let mut tree = ElementTree::with_text_measurer(options.text_measurer.clone());
        let root = tree.insert(RootHost::default());
        Self {
            tree,
            root,
            renderer: Renderer::new(),
            capture: CaptureSlot::default(),
            options,
        }
    }

    /// The element tree.
    #[must_use]
    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// The element tree, mutably.
    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    /// Id of the root node.
    #[must_use]
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// The options this root was created with.
    #[must_use]
    pub fn options(&self) -> &RootOptions {
        &self.options
    }

    /// The content element.
    #[must_use]
    pub fn content(&self) -> Option<ElementId> {
        self.tree
            .element::<RootHost>(self.root)
            .and_then(|host| host.content)
    }

    /// Replaces the content element. The old content is detached, not freed.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`](crate::LayoutError::StaleElement) if
    /// `content` is not live.
    pub fn set_content(&mut self, content: Option<ElementId>) -> Result<()> {
        self.tree
            .with_element::<RootHost, _>(self.root, |host, cx| {
                replace_child(cx, &mut host.content, content)
            })?
    }

    /// The viewport rectangle.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.options.viewport
    }

    /// Moves or resizes the viewport; the next update lays out again.
    pub fn set_viewport(&mut self, viewport: Rect) {
        if self.options.viewport != viewport {
            self.options.viewport = viewport;
            self.tree.invalidate_measure(self.root);
        }
    }

    /// The draw list built by the last update.
    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Brings layout up to date.
    ///
    /// Applies queued binding writes, then measures and arranges the root
    /// into the viewport. Writes queued during a pass are applied before the
    /// next one; passes repeat until the tree is valid with nothing queued,
    /// or the pass limit is hit. The draw list is rebuilt if anything was
    /// arranged.
    ///
    /// # Errors
    ///
    /// The first layout or binding error aborts the update.
    pub fn update(&mut self) -> Result<()> {
        let viewport = self.options.viewport;
        let mut passes = 0;
        loop {
            self.tree.flush_pending_writes()?;
            if self.tree.is_layout_valid(self.root) {
                break;
            }
            if passes == self.options.max_layout_passes {
                tracing::warn!(passes, "layout did not settle");
                break;
            }
            passes += 1;
            tracing::debug!(pass = passes, "layout pass");
            self.tree.measure(self.root, viewport.size())?;
            self.tree.arrange(self.root, viewport)?;
        }
        if self.tree.take_arranged() {
            self.renderer.rebuild(&self.tree, self.root);
        }
        self.drop_stale_capture();
        Ok(())
    }

    /// Updates, then routes every gesture `input` yields.
    ///
    /// # Errors
    ///
    /// Layout errors and the first error returned by a gesture handler.
    pub fn update_with_input(&mut self, input: &mut dyn GestureSource) -> Result<()> {
        self.update()?;
        while let Some(gesture) = input.next_gesture() {
            self.route_gesture(&gesture)?;
        }
        Ok(())
    }

    /// Delivers `gesture` to its target and returns the target.
    ///
    /// The capture holder gets every gesture. Otherwise children are searched
    /// in reverse draw order, descendants before their parent, for the first
    /// element that accepts input and contains the position.
    ///
    /// # Errors
    ///
    /// Whatever the target's handler returns.
    pub fn route_gesture(&mut self, gesture: &Gesture) -> Result<Option<ElementId>> {
        self.drop_stale_capture();
        let target = match self.capture.holder() {
            Some(holder) => Some(holder),
            None => self.find_target(self.root, gesture.position),
        };
        let Some(target) = target else {
            return Ok(None);
        };
        tracing::trace!(element = ?target, kind = ?gesture.kind, "route gesture");
        let capture = &mut self.capture;
        self.tree.with_detached(target, |element, cx| {
            element.on_gesture(&mut InputCx::new(cx, capture), gesture)
        })??;
        Ok(Some(target))
    }

    fn find_target(&self, id: ElementId, point: Point) -> Option<ElementId> {
        for child in self.tree.children(id).into_iter().rev() {
            if self.tree.parent(child) != Some(id) {
                continue;
            }
            if let Some(found) = self.find_target(child, point) {
                return Some(found);
            }
        }
        (self.tree.accepts_input(id) && self.tree.hit_test(id, point)).then_some(id)
    }

    /// Replays the draw list onto `surface`.
    pub fn draw(&self, surface: &mut dyn DrawingSurface) {
        self.renderer.draw(&self.tree, surface);
    }

    /// Captures the pointer for `id`. Returns `false` if another element
    /// holds it.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`](crate::LayoutError::StaleElement) if `id`
    /// is not live.
    pub fn capture_mouse(&mut self, id: ElementId) -> Result<bool> {
        if !self.tree.contains(id) {
            return Err(LayoutError::StaleElement(id));
        }
        if !self.capture.capture(id) {
            return Ok(false);
        }
        let captured = self.tree.properties().layout.is_mouse_captured;
        self.tree.set_value(id, captured, true)?;
        Ok(true)
    }

    /// Releases the capture if `id` holds it.
    ///
    /// # Errors
    ///
    /// Propagates a failed write of `IsMouseCaptured`.
    pub fn release_mouse_capture(&mut self, id: ElementId) -> Result<()> {
        if self.capture.release(id) && self.tree.contains(id) {
            let captured = self.tree.properties().layout.is_mouse_captured;
            self.tree.set_value(id, captured, false)?;
        }
        Ok(())
    }

    /// The element holding the pointer capture.
    #[must_use]
    pub fn captured(&self) -> Option<ElementId> {
        self.capture.holder()
    }

    fn drop_stale_capture(&mut self) {
        if let Some(holder) = self.capture.holder()
            && !self.tree.contains(holder)
        {
            self.capture.clear();
        }
    }
}

impl fmt::Debug for RootElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootElement")
            .field("tree", &self.tree)
            .field("root", &self.root)
            .field("renderer", &self.renderer)
            .field("capture", &self.capture)
            .field("options", &self.options)
            .finish()
    }
}
