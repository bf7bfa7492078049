// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Rect, Size, Vec2};

use crate::element::{Element, ElementCx};
use crate::error::Result;
use crate::render::DrawingContext;

/// A host image: an opaque id and its natural size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImageSource {
    /// Backend handle.
    pub id: u64,
    /// Natural size.
    pub size: Size,
}

impl ImageSource {
    /// Creates a source.
    #[must_use]
    pub fn new(id: u64, size: Size) -> Self {
        Self { id, size }
    }
}

/// How content is resized to fill its space.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stretch {
    /// Natural size.
    None,
    /// Fill both axes, ignoring the aspect ratio.
    Fill,
    /// Fit inside, keeping the aspect ratio.
    #[default]
    Uniform,
    /// Cover, keeping the aspect ratio.
    UniformToFill,
}

/// Which scalings [`Stretch`] may apply.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum StretchDirection {
    /// Only enlarge.
    UpOnly,
    /// Only shrink.
    DownOnly,
    /// Either.
    #[default]
    Both,
}

/// Scale factors fitting `content` into `available`.
///
/// An unbounded axis follows the other one; with both unbounded, or with
/// [`Stretch::None`], the content keeps its natural size.
///
/// ```rust
/// use kurbo::{Size, Vec2};
/// use understory_layout::{Stretch, StretchDirection, compute_scale_factor};
///
/// let scale = compute_scale_factor(
///     Size::new(100.0, 100.0),
///     Size::new(50.0, 25.0),
///     Stretch::Uniform,
///     StretchDirection::Both,
/// );
/// assert_eq!(scale, Vec2::new(2.0, 2.0));
/// ```
#[must_use]
pub fn compute_scale_factor(
    available: Size,
    content: Size,
    stretch: Stretch,
    direction: StretchDirection,
) -> Vec2 {
    let bounded_width = available.width.is_finite();
    let bounded_height = available.height.is_finite();
    if stretch == Stretch::None || (!bounded_width && !bounded_height) {
        return Vec2::new(1.0, 1.0);
    }

    let ratio = |available: f64, content: f64| {
        if content == 0.0 { 0.0 } else { available / content }
    };
    let mut x = ratio(available.width, content.width);
    let mut y = ratio(available.height, content.height);
    if !bounded_width {
        x = y;
    } else if !bounded_height {
        y = x;
    } else {
        match stretch {
            Stretch::Uniform => {
                x = x.min(y);
                y = x;
            }
            Stretch::UniformToFill => {
                x = x.max(y);
                y = x;
            }
            Stretch::Fill | Stretch::None => {}
        }
    }

    match direction {
        StretchDirection::UpOnly => Vec2::new(x.max(1.0), y.max(1.0)),
        StretchDirection::DownOnly => Vec2::new(x.min(1.0), y.min(1.0)),
        StretchDirection::Both => Vec2::new(x, y),
    }
}

/// Draws an [`ImageSource`] scaled by its stretch settings.
#[derive(Debug, Default)]
pub struct Image;

impl Image {
    /// Creates an image element; set its source through the `Source`
    /// property.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn scaled_size(cx: &ElementCx<'_>, given: Size) -> Size {
        let props = cx.properties().image;
        let Some(source) = cx.get(props.source) else {
            return Size::ZERO;
        };
        let scale = compute_scale_factor(
            given,
            source.size,
            *cx.get(props.stretch),
            *cx.get(props.stretch_direction),
        );
        Size::new(source.size.width * scale.x, source.size.height * scale.y)
    }
}

impl Element for Image {
    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        Ok(Self::scaled_size(cx, available))
    }

    fn arrange_override(&mut self, cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        Ok(Self::scaled_size(cx, final_size))
    }

    fn render(&self, cx: &ElementCx<'_>, drawing: &mut DrawingContext) {
        if let Some(source) = cx.get(cx.properties().image.source) {
            drawing.draw_image(source, Rect::from_origin_size((0.0, 0.0), cx.render_size()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawCommand;
    use crate::tree::ElementTree;

    const WIDE: Size = Size::new(40.0, 20.0);

    #[test]
    fn uniform_fits_and_fill_stretches() {
        let available = Size::new(80.0, 80.0);
        let uniform =
            compute_scale_factor(available, WIDE, Stretch::Uniform, StretchDirection::Both);
        assert_eq!(uniform, Vec2::new(2.0, 2.0));
        let cover =
            compute_scale_factor(available, WIDE, Stretch::UniformToFill, StretchDirection::Both);
        assert_eq!(cover, Vec2::new(4.0, 4.0));
        let fill = compute_scale_factor(available, WIDE, Stretch::Fill, StretchDirection::Both);
        assert_eq!(fill, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn directions_limit_scaling() {
        let small = Size::new(20.0, 20.0);
        let down = compute_scale_factor(small, WIDE, Stretch::Uniform, StretchDirection::UpOnly);
        assert_eq!(down, Vec2::new(1.0, 1.0));
        let big = Size::new(400.0, 400.0);
        let up = compute_scale_factor(big, WIDE, Stretch::Uniform, StretchDirection::DownOnly);
        assert_eq!(up, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn unbounded_axis_follows_the_other() {
        let scale = compute_scale_factor(
            Size::new(f64::INFINITY, 10.0),
            WIDE,
            Stretch::Fill,
            StretchDirection::Both,
        );
        assert_eq!(scale, Vec2::new(0.5, 0.5));
        let natural = compute_scale_factor(
            Size::new(f64::INFINITY, f64::INFINITY),
            WIDE,
            Stretch::Uniform,
            StretchDirection::Both,
        );
        assert_eq!(natural, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn image_draws_over_its_render_size() {
        let mut tree = ElementTree::new();
        let source = ImageSource::new(7, WIDE);
        let image = tree.insert(Image::new());
        let props = tree.properties().image;
        tree.set_value(image, props.source, Some(source)).unwrap();
        let desired = tree.measure(image, Size::new(20.0, 100.0)).unwrap();
        assert_eq!(desired, Size::new(20.0, 10.0));
        tree.arrange(image, Rect::new(0.0, 0.0, 20.0, 10.0)).unwrap();
        assert_eq!(
            tree.drawing(image).unwrap().commands(),
            &[DrawCommand::Image {
                source,
                rect: Rect::new(0.0, 0.0, 20.0, 10.0),
            }]
        );
    }

    #[test]
    fn no_source_wants_nothing() {
        let mut tree = ElementTree::new();
        let image = tree.insert(Image::new());
        assert_eq!(tree.measure(image, Size::new(50.0, 50.0)).unwrap(), Size::ZERO);
    }
}
