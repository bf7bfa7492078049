// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;

use kurbo::{Point, Rect, Size};

use crate::element::{Element, ElementCx};
use crate::error::Result;
use crate::geometry::SizeExt;
use crate::render::DrawingContext;
use crate::text::wrap_text;

/// Line breaking of a [`TextBlock`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextWrapping {
    /// Keep each line as written.
    #[default]
    NoWrap,
    /// Break between words to fit the available width.
    Wrap,
}

/// Displays a string.
///
/// The text is measured with the tree's
/// [`TextMeasurer`](crate::TextMeasurer). With [`TextWrapping::Wrap`], text
/// wider than the available width is broken between words.
#[derive(Debug, Default)]
pub struct TextBlock {
    /// Text as laid out by the last measure, lines joined with `'\n'`.
    formatted: String,
}

impl TextBlock {
    /// Creates an empty text block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The text as laid out by the last measure.
    #[must_use]
    pub fn formatted_text(&self) -> &str {
        &self.formatted
    }
}

impl Element for TextBlock {
    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        let props = cx.properties().text_block;
        let padding = *cx.get(props.padding);
        let font = cx.get(props.font).clone();
        let measurer = cx.text_measurer();

        self.formatted.clone_from(cx.get(props.text));
        let mut size = measurer.measure_string(&font, &self.formatted);
        let room = available.deflate(padding).width;
        if *cx.get(props.wrapping) == TextWrapping::Wrap && size.width > room {
            self.formatted = wrap_text(&*measurer, &font, &self.formatted, room);
            size = measurer.measure_string(&font, &self.formatted);
        }
        Ok(size.inflate(padding))
    }

    fn render(&self, cx: &ElementCx<'_>, drawing: &mut DrawingContext) {
        let props = cx.properties().text_block;
        if let Some(background) = cx.get(props.background) {
            let bounds = Rect::from_origin_size((0.0, 0.0), cx.render_size());
            drawing.draw_rectangle(bounds, background);
        }
        let padding = cx.get(props.padding);
        drawing.draw_text(
            cx.get(props.font),
            &self.formatted,
            Point::new(padding.left, padding.top),
            cx.get(props.foreground),
        );
    }
}
