// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text measurement.
//!
//! The tree never shapes text itself. Text-bearing elements ask a
//! [`TextMeasurer`] supplied by the host for the size of a string and break
//! lines on whitespace with [`wrap_text`].

use alloc::rc::Rc;
use alloc::string::String;

use kurbo::Size;

/// A font handle passed through to the text backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    /// Family or asset name, interpreted by the backend.
    pub name: Rc<str>,
    /// Em size in layout units.
    pub size: f64,
}

impl Font {
    /// Creates a font handle.
    #[must_use]
    pub fn new(name: &str, size: f64) -> Self {
        Self {
            name: Rc::from(name),
            size,
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("sans-serif", 16.0)
    }
}

/// Measures strings for layout.
pub trait TextMeasurer {
    /// Returns the extent of `text` drawn with `font`.
    ///
    /// Lines are separated by `'\n'`.
    fn measure_string(&self, font: &Font, text: &str) -> Size;
}

/// A deterministic measurer for fixed-advance fonts.
///
/// Every character advances by `font.size * advance` and every line is
/// `font.size * line_height` tall. An empty string still occupies one line.
///
/// ```rust
/// use understory_layout::{Font, MonospaceMeasurer, TextMeasurer};
///
/// let measurer = MonospaceMeasurer::default();
/// let size = measurer.measure_string(&Font::new("mono", 10.0), "ab\nabcd");
/// assert_eq!(size.width, 20.0);
/// assert_eq!(size.height, 24.0);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MonospaceMeasurer {
    /// Horizontal advance per character, as a fraction of the em size.
    pub advance: f64,
    /// Line height, as a fraction of the em size.
    pub line_height: f64,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self {
            advance: 0.5,
            line_height: 1.2,
        }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure_string(&self, font: &Font, text: &str) -> Size {
        let mut lines = 0_usize;
        let mut widest = 0_usize;
        for line in text.split('\n') {
            lines += 1;
            widest = widest.max(line.chars().count());
        }
        Size::new(
            widest as f64 * font.size * self.advance,
            lines as f64 * font.size * self.line_height,
        )
    }
}

/// Breaks `text` into lines no wider than `max_width`.
///
/// Words are separated by runs of whitespace and rejoined with single
/// spaces. A word that does not fit on the current line starts a new one;
/// wrapped lines are joined with `'\n'`. A single word wider than
/// `max_width` gets a line of its own.
///
/// ```rust
/// use understory_layout::{Font, MonospaceMeasurer, wrap_text};
///
/// let font = Font::new("mono", 2.0); // one unit per character
/// let wrapped = wrap_text(&MonospaceMeasurer::default(), &font, "the quick  brown fox", 10.0);
/// assert_eq!(wrapped, "the quick\nbrown fox");
/// ```
#[must_use]
pub fn wrap_text(measurer: &dyn TextMeasurer, font: &Font, text: &str, max_width: f64) -> String {
    let space = measurer.measure_string(font, " ").width;
    let mut wrapped = String::with_capacity(text.len());
    let mut line_width = 0.0;
    for word in text.split_whitespace() {
        let width = measurer.measure_string(font, word).width;
        if wrapped.is_empty() {
            wrapped.push_str(word);
            line_width = width;
        } else if line_width + space + width <= max_width {
            wrapped.push(' ');
            wrapped.push_str(word);
            line_width += space + width;
        } else {
            wrapped.push('\n');
            wrapped.push_str(word);
            line_width = width;
        }
    }
    wrapped
}
