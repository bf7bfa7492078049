// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry helpers: thickness, tolerant comparisons and alignment.
//!
//! Sizes, points, vectors and rectangles are Kurbo types. Layout compares
//! them with [`close_to`], a relative epsilon around [`f64::EPSILON`], so
//! values that differ only by accumulated rounding count as equal.

use core::ops::Add;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _; // for `abs`
use kurbo::{Rect, Size};

/// Returns `true` if `a` and `b` are equal within a relative epsilon.
///
/// Equal infinities are close; NaN is never close to anything.
///
/// ```rust
/// use understory_layout::close_to;
///
/// assert!(close_to(0.1 + 0.2, 0.3));
/// assert!(close_to(f64::INFINITY, f64::INFINITY));
/// assert!(!close_to(1.0, 1.001));
/// assert!(!close_to(f64::NAN, f64::NAN));
/// ```
#[must_use]
pub fn close_to(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let eps = (a.abs() + b.abs() + 10.0) * f64::EPSILON;
    let delta = a - b;
    -eps < delta && eps > delta
}

/// `a < b` and not [`close_to`].
#[inline]
pub(crate) fn less_than(a: f64, b: f64) -> bool {
    a < b && !close_to(a, b)
}

/// `a > b` and not [`close_to`].
#[inline]
pub(crate) fn greater_than(a: f64, b: f64) -> bool {
    a > b && !close_to(a, b)
}

/// Clamps `value` to `[min, max]`, letting `min` win when the range is empty.
#[inline]
pub(crate) fn coerce(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Edge widths around a rectangle (margin, padding, border).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Thickness {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl Thickness {
    /// No thickness.
    pub const ZERO: Self = Self::uniform(0.0);

    /// Creates a thickness from four edges.
    #[must_use]
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The same width on every edge.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// `horizontal` on left and right, `vertical` on top and bottom.
    #[must_use]
    pub const fn symmetric(horizontal: f64, vertical: f64) -> Self {
        Self::new(horizontal, vertical, horizontal, vertical)
    }

    /// Left plus right.
    #[must_use]
    #[inline]
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    /// Top plus bottom.
    #[must_use]
    #[inline]
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    /// The space the edges take up, as a size.
    #[must_use]
    pub fn collapse(&self) -> Size {
        Size::new(self.horizontal(), self.vertical())
    }

    /// Edge-wise [`close_to`].
    #[must_use]
    pub fn is_close_to(&self, other: &Self) -> bool {
        close_to(self.left, other.left)
            && close_to(self.top, other.top)
            && close_to(self.right, other.right)
            && close_to(self.bottom, other.bottom)
    }
}

impl Add for Thickness {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.left + rhs.left,
            self.top + rhs.top,
            self.right + rhs.right,
            self.bottom + rhs.bottom,
        )
    }
}

/// Layout operations on [`Size`].
pub trait SizeExt {
    /// Shrinks by `thickness`, never below zero.
    #[must_use]
    fn deflate(self, thickness: Thickness) -> Self;
    /// Grows by `thickness`, never below zero.
    #[must_use]
    fn inflate(self, thickness: Thickness) -> Self;
    /// Axis-wise [`close_to`].
    fn is_close_to(&self, other: &Self) -> bool;
}

impl SizeExt for Size {
    fn deflate(self, thickness: Thickness) -> Self {
        Self::new(
            (self.width - thickness.horizontal()).max(0.0),
            (self.height - thickness.vertical()).max(0.0),
        )
    }

    fn inflate(self, thickness: Thickness) -> Self {
        Self::new(
            (self.width + thickness.horizontal()).max(0.0),
            (self.height + thickness.vertical()).max(0.0),
        )
    }

    fn is_close_to(&self, other: &Self) -> bool {
        close_to(self.width, other.width) && close_to(self.height, other.height)
    }
}

/// Layout operations on [`Rect`].
pub trait RectExt {
    /// Moves the edges inwards by `thickness`, never producing a negative size.
    #[must_use]
    fn deflate(self, thickness: Thickness) -> Self;
    /// Coordinate-wise [`close_to`].
    fn is_close_to(&self, other: &Self) -> bool;
}

impl RectExt for Rect {
    fn deflate(self, thickness: Thickness) -> Self {
        let size = self.size().deflate(thickness);
        Self::from_origin_size(
            (self.x0 + thickness.left, self.y0 + thickness.top),
            size,
        )
    }

    fn is_close_to(&self, other: &Self) -> bool {
        close_to(self.x0, other.x0)
            && close_to(self.y0, other.y0)
            && close_to(self.x1, other.x1)
            && close_to(self.y1, other.y1)
    }
}

/// Horizontal placement within an allotted slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    /// Align to the left edge.
    Left,
    /// Center in the slot.
    Center,
    /// Align to the right edge.
    Right,
    /// Fill the slot.
    #[default]
    Stretch,
}

/// Vertical placement within an allotted slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    /// Align to the top edge.
    Top,
    /// Center in the slot.
    Center,
    /// Align to the bottom edge.
    Bottom,
    /// Fill the slot.
    #[default]
    Stretch,
}
