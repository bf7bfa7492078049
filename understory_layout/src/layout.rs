// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two-pass layout protocol.
//!
//! [`ElementTree::measure`] asks an element how big it wants to be;
//! [`ElementTree::arrange`] gives it a final rectangle. Both apply the shared
//! layout properties (size, min/max, margin, alignment) around the element's
//! own [`Element::measure_override`] and [`Element::arrange_override`], and
//! both skip work when the element is valid and the input is unchanged.

use bitflags::bitflags;
use kurbo::{Rect, Size, Vec2};

use crate::element::{Clipping, Element, ElementCx};
use crate::error::{LayoutError, Result};
use crate::geometry::{
    HorizontalAlignment, RectExt, SizeExt, Thickness, VerticalAlignment, coerce, less_than,
};
use crate::id::ElementId;
use crate::properties::LayoutProperties;
use crate::render::DrawingContext;
use crate::tree::ElementTree;

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    struct LayoutFlags: u8 {
        const MEASURE_VALID = 1 << 0;
        const ARRANGE_VALID = 1 << 1;
        /// Layout clipped the element on the last measure or arrange.
        const CLIPPING = 1 << 2;
    }
}

/// Per-element results of the last measure and arrange.
#[derive(Clone, Debug, Default)]
pub struct LayoutState {
    flags: LayoutFlags,
    previous_available: Option<Size>,
    previous_final: Option<Rect>,
    desired_size: Size,
    unclipped_desired: Option<Size>,
    render_size: Size,
    visual_offset: Vec2,
    clip: Option<Rect>,
}

impl LayoutState {
    /// Size requested by the last measure, margin included.
    #[must_use]
    pub fn desired_size(&self) -> Size {
        self.desired_size
    }

    /// Size returned by the last arrange override.
    #[must_use]
    pub fn render_size(&self) -> Size {
        self.render_size
    }

    /// Offset from the parent's origin.
    #[must_use]
    pub fn visual_offset(&self) -> Vec2 {
        self.visual_offset
    }

    /// Clip in element coordinates, if any.
    #[must_use]
    pub fn clip(&self) -> Option<Rect> {
        self.clip
    }

    /// Available size of the last measure that ran.
    #[must_use]
    pub fn previous_available_size(&self) -> Option<Size> {
        self.previous_available
    }

    /// Rectangle of the last arrange that ran.
    #[must_use]
    pub fn previous_final_rect(&self) -> Option<Rect> {
        self.previous_final
    }

    /// `true` until something invalidates the last measure.
    #[must_use]
    pub fn is_measure_valid(&self) -> bool {
        self.flags.contains(LayoutFlags::MEASURE_VALID)
    }

    /// `true` until something invalidates the last arrange.
    #[must_use]
    pub fn is_arrange_valid(&self) -> bool {
        self.flags.contains(LayoutFlags::ARRANGE_VALID)
    }

    /// `true` if layout had to clip the element.
    #[must_use]
    pub fn needs_clip(&self) -> bool {
        self.flags.contains(LayoutFlags::CLIPPING)
    }

    pub(crate) fn invalidate_measure(&mut self) {
        self.flags
            .remove(LayoutFlags::MEASURE_VALID | LayoutFlags::ARRANGE_VALID);
    }

    pub(crate) fn invalidate_arrange(&mut self) {
        self.flags.remove(LayoutFlags::ARRANGE_VALID);
    }
}

/// Effective size bounds, folding the explicit size into min/max.
#[derive(Copy, Clone, Debug, PartialEq)]
struct MinMax {
    min_width: f64,
    max_width: f64,
    min_height: f64,
    max_height: f64,
}

impl MinMax {
    fn of(cx: &ElementCx<'_>, props: LayoutProperties) -> Self {
        let (min_width, max_width) = Self::axis(
            *cx.get(props.width),
            *cx.get(props.min_width),
            *cx.get(props.max_width),
        );
        let (min_height, max_height) = Self::axis(
            *cx.get(props.height),
            *cx.get(props.min_height),
            *cx.get(props.max_height),
        );
        Self {
            min_width,
            max_width,
            min_height,
            max_height,
        }
    }

    /// An explicit length pins both bounds, but never below `min` nor above
    /// `max`; `min` wins over `max`.
    fn axis(length: f64, min: f64, max: f64) -> (f64, f64) {
        let upper = if length.is_nan() { f64::INFINITY } else { length };
        let upper = upper.min(max).max(min);
        let lower = if length.is_nan() { 0.0 } else { length };
        let lower = upper.min(lower).max(min);
        (lower, upper)
    }
}

fn is_valid_result(size: Size) -> bool {
    !size.width.is_nan()
        && !size.height.is_nan()
        && size.width != f64::INFINITY
        && size.height != f64::INFINITY
}

fn alignment_offset(
    client: Size,
    ink: Size,
    horizontal: HorizontalAlignment,
    vertical: VerticalAlignment,
) -> Vec2 {
    let horizontal = match horizontal {
        HorizontalAlignment::Stretch if ink.width > client.width => HorizontalAlignment::Left,
        other => other,
    };
    let vertical = match vertical {
        VerticalAlignment::Stretch if ink.height > client.height => VerticalAlignment::Top,
        other => other,
    };
    let x = match horizontal {
        HorizontalAlignment::Center | HorizontalAlignment::Stretch => {
            (client.width - ink.width) / 2.0
        }
        HorizontalAlignment::Right => client.width - ink.width,
        HorizontalAlignment::Left => 0.0,
    };
    let y = match vertical {
        VerticalAlignment::Center | VerticalAlignment::Stretch => {
            (client.height - ink.height) / 2.0
        }
        VerticalAlignment::Bottom => client.height - ink.height,
        VerticalAlignment::Top => 0.0,
    };
    Vec2::new(x, y)
}

impl ElementTree {
    /// Measures `id` within `available` and returns its desired size.
    ///
    /// Infinite dimensions mean "as much as you like". A valid element
    /// measured again with a close-enough size returns its previous result
    /// without calling into the element. Otherwise its bindings are resolved,
    /// queued writes addressed to it are applied, the template hook runs, and
    /// the measure override runs inside the element's min/max and margin.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::InvalidAvailableSize`] if `available` has a NaN.
    /// - [`LayoutError::InvalidDesiredSize`] if the override returned NaN or
    ///   positive infinity.
    /// - [`LayoutError::StaleElement`] and [`LayoutError::ElementBusy`] for
    ///   unusable ids.
    /// - Binding and template errors raised while preparing the element.
    pub fn measure(&mut self, id: ElementId, available: Size) -> Result<Size> {
        if available.width.is_nan() || available.height.is_nan() {
            return Err(LayoutError::InvalidAvailableSize {
                element: id,
                size: available,
            });
        }
        let state = &self.data(id)?.layout;
        if state.is_measure_valid()
            && state
                .previous_available
                .is_some_and(|previous| previous.is_close_to(&available))
        {
            return Ok(state.desired_size);
        }
        tracing::trace!(element = ?id, ?available, "measure");

        self.resolve_bindings(id)?;
        self.flush_pending_writes_for(id)?;
        let desired = self.with_detached(id, |element, mut cx| {
            element.on_apply_template(&mut cx)?;
            measure_core(element, &mut cx, available)
        })??;

        // Invalidations raised by the element's own measure are absorbed here.
        let state = &mut self.data_mut(id)?.layout;
        state.previous_available = Some(available);
        state.flags.insert(LayoutFlags::MEASURE_VALID);
        Ok(desired)
    }

    /// Arranges `id` into `final_rect`, given in parent coordinates.
    ///
    /// A valid element arranged again into a close-enough rectangle is
    /// skipped. Otherwise the arrange override runs, the visual offset and
    /// clip are computed, and the element re-records its drawing.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::InvalidFinalRect`] if `final_rect` has a NaN or
    ///   infinite coordinate.
    /// - [`LayoutError::InvalidRenderSize`] if the override returned NaN or
    ///   positive infinity.
    /// - [`LayoutError::StaleElement`] and [`LayoutError::ElementBusy`] for
    ///   unusable ids.
    pub fn arrange(&mut self, id: ElementId, final_rect: Rect) -> Result<()> {
        let finite = [final_rect.x0, final_rect.y0, final_rect.x1, final_rect.y1]
            .iter()
            .all(|value| value.is_finite());
        if !finite {
            return Err(LayoutError::InvalidFinalRect {
                element: id,
                rect: final_rect,
            });
        }
        let state = &self.data(id)?.layout;
        if state.is_arrange_valid()
            && state
                .previous_final
                .is_some_and(|previous| previous.is_close_to(&final_rect))
        {
            return Ok(());
        }
        tracing::trace!(element = ?id, rect = ?final_rect, "arrange");

        // Invalidations raised while arranging stay pending for the next pass.
        self.data_mut(id)?.layout.flags.insert(LayoutFlags::ARRANGE_VALID);
        let arranged = self
            .with_detached(id, |element, mut cx| {
                arrange_core(element, &mut cx, final_rect)
            })
            .and_then(|result| result);
        let state = &mut self.data_mut(id)?.layout;
        if let Err(err) = arranged {
            state.invalidate_arrange();
            return Err(err);
        }
        state.previous_final = Some(final_rect);
        self.mark_arranged();
        Ok(())
    }

    /// Returns `true` if `id` is measured and arranged with no pending
    /// invalidation.
    #[must_use]
    pub fn is_layout_valid(&self, id: ElementId) -> bool {
        self.layout(id)
            .is_some_and(|state| state.is_measure_valid() && state.is_arrange_valid())
    }
}

fn measure_core(
    element: &mut dyn Element,
    cx: &mut ElementCx<'_>,
    available: Size,
) -> Result<Size> {
    let props = cx.properties().layout;
    let margin = *cx.get(props.margin);
    let limits = MinMax::of(cx, props);

    let frame = available.deflate(margin);
    let constrained = Size::new(
        coerce(frame.width, limits.min_width, limits.max_width),
        coerce(frame.height, limits.min_height, limits.max_height),
    );
    let size = element.measure_override(cx, constrained)?;
    if !is_valid_result(size) {
        return Err(LayoutError::InvalidDesiredSize {
            element: cx.id(),
            size,
        });
    }

    let mut size = Size::new(
        size.width.max(limits.min_width),
        size.height.max(limits.min_height),
    );
    let unclipped = size;
    let mut clipping = false;
    if size.width > limits.max_width {
        size.width = limits.max_width;
        clipping = true;
    }
    if size.height > limits.max_height {
        size.height = limits.max_height;
        clipping = true;
    }

    let mut desired = size.inflate(margin);
    if desired.width > available.width {
        desired.width = available.width;
        clipping = true;
    }
    if desired.height > available.height {
        desired.height = available.height;
        clipping = true;
    }

    if let Some(state) = cx.layout_mut() {
        state.desired_size = desired;
        state.unclipped_desired = clipping.then_some(unclipped);
    }
    Ok(desired)
}

fn arrange_core(element: &mut dyn Element, cx: &mut ElementCx<'_>, final_rect: Rect) -> Result<()> {
    let props = cx.properties().layout;
    let margin = *cx.get(props.margin);
    let horizontal = *cx.get(props.horizontal_alignment);
    let vertical = *cx.get(props.vertical_alignment);
    let limits = MinMax::of(cx, props);
    let (desired, unclipped_desired) = {
        let state = cx.layout();
        (state.desired_size, state.unclipped_desired)
    };

    let mut clipping = false;
    let mut arrange_size = final_rect.size().deflate(margin);
    let unclipped = unclipped_desired.unwrap_or_else(|| desired.deflate(margin));

    if less_than(arrange_size.width, unclipped.width) {
        clipping = true;
        arrange_size.width = unclipped.width;
    }
    if less_than(arrange_size.height, unclipped.height) {
        clipping = true;
        arrange_size.height = unclipped.height;
    }
    if horizontal != HorizontalAlignment::Stretch {
        arrange_size.width = unclipped.width;
    }
    if vertical != VerticalAlignment::Stretch {
        arrange_size.height = unclipped.height;
    }
    let largest_width = unclipped.width.max(limits.max_width);
    if largest_width < arrange_size.width {
        arrange_size.width = largest_width;
    }
    let largest_height = unclipped.height.max(limits.max_height);
    if largest_height < arrange_size.height {
        arrange_size.height = largest_height;
    }

    let render_size = element.arrange_override(cx, arrange_size)?;
    if !is_valid_result(render_size) {
        return Err(LayoutError::InvalidRenderSize {
            element: cx.id(),
            size: render_size,
        });
    }

    let ink = Size::new(
        render_size.width.min(limits.max_width),
        render_size.height.min(limits.max_height),
    );
    clipping |=
        less_than(ink.width, render_size.width) || less_than(ink.height, render_size.height);
    let client = final_rect.size().deflate(margin);
    clipping |= less_than(client.width, ink.width) || less_than(client.height, ink.height);

    let offset = alignment_offset(client, ink, horizontal, vertical)
        + Vec2::new(final_rect.x0 + margin.left, final_rect.y0 + margin.top);
    let clip = match element.clipping(render_size) {
        Clipping::Computed => layout_clip(
            final_rect.size(),
            render_size,
            margin,
            limits,
            horizontal,
            vertical,
        ),
        Clipping::None => None,
        Clipping::Rect(rect) => Some(rect),
    };

    if let Some(state) = cx.layout_mut() {
        state.render_size = render_size;
        state.visual_offset = offset;
        state.clip = clip;
        state.flags.set(LayoutFlags::CLIPPING, clipping);
    }

    let mut drawing = DrawingContext::new();
    element.render(cx, &mut drawing);
    cx.set_drawing(drawing);
    Ok(())
}

/// Clip rectangle for an element that overflows its slot or its max size.
fn layout_clip(
    slot: Size,
    render_size: Size,
    margin: Thickness,
    limits: MinMax,
    horizontal: HorizontalAlignment,
    vertical: VerticalAlignment,
) -> Option<Rect> {
    let max_width = if limits.max_width.is_infinite() {
        render_size.width
    } else {
        limits.max_width
    };
    let max_height = if limits.max_height.is_infinite() {
        render_size.height
    } else {
        limits.max_height
    };
    let clipped_by_max =
        less_than(max_width, render_size.width) || less_than(max_height, render_size.height);
    let ink = Size::new(render_size.width.min(max_width), render_size.height.min(max_height));
    let client = slot.deflate(margin);
    let clipped_by_slot =
        less_than(client.width, ink.width) || less_than(client.height, ink.height);

    let max_rect = Rect::new(0.0, 0.0, max_width, max_height);
    if !clipped_by_slot {
        return clipped_by_max.then_some(max_rect);
    }
    let offset = alignment_offset(client, ink, horizontal, vertical);
    let clip = Rect::from_origin_size((-offset.x, -offset.y), client);
    Some(if clipped_by_max {
        clip.intersect(max_rect)
    } else {
        clip
    })
}
