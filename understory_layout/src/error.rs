// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout errors.

use kurbo::{Rect, Size};
use understory_binding::BindingError;

use crate::id::ElementId;

/// Result alias used throughout the crate.
pub type Result<T, E = LayoutError> = core::result::Result<T, E>;

/// Contract violations raised by the element tree.
///
/// These abort the operation that raised them. A layout pass that fails stops
/// where it is; nothing is clamped or patched up.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// The id does not refer to a live element.
    #[error("element {0:?} is not in the tree")]
    StaleElement(ElementId),
    /// The element is already borrowed by an enclosing layout or input call.
    #[error("element {0:?} is already in use")]
    ElementBusy(ElementId),
    /// The element is not of the requested type.
    #[error("element {element:?} is not a {expected}")]
    ElementType {
        /// The element.
        element: ElementId,
        /// The requested type.
        expected: &'static str,
    },
    /// `measure` was called with a NaN dimension.
    #[error("cannot measure {element:?} with available size {size:?}")]
    InvalidAvailableSize {
        /// The element being measured.
        element: ElementId,
        /// The offending size.
        size: Size,
    },
    /// A measure override returned NaN or positive infinity.
    #[error("measure override of {element:?} returned {size:?}")]
    InvalidDesiredSize {
        /// The element being measured.
        element: ElementId,
        /// The offending size.
        size: Size,
    },
    /// `arrange` was called with a NaN or infinite rectangle.
    #[error("cannot arrange {element:?} into {rect:?}")]
    InvalidFinalRect {
        /// The element being arranged.
        element: ElementId,
        /// The offending rectangle.
        rect: Rect,
    },
    /// An arrange override returned NaN or positive infinity.
    #[error("arrange override of {element:?} returned {size:?}")]
    InvalidRenderSize {
        /// The element being arranged.
        element: ElementId,
        /// The offending size.
        size: Size,
    },
    /// A templated item was added without a template.
    #[error("a template for this item has not been supplied")]
    MissingTemplate,
    /// A collection index is out of bounds.
    #[error("index {index} is out of range for a collection of {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The collection length.
        len: usize,
    },
    /// The element has no templated children collection.
    #[error("element {0:?} does not host items")]
    NotAnItemsHost(ElementId),
    /// A scroll offset was NaN.
    #[error("scroll offset must not be NaN")]
    InvalidScrollOffset,
    /// A binding failed to resolve or convert.
    #[error(transparent)]
    Binding(#[from] BindingError),
}
