// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded drawing and its replay onto a host surface.
//!
//! Each element records [`DrawCommand`]s in its own coordinates when it is
//! arranged. A [`Renderer`] flattens the tree into a draw list of elements
//! with their absolute offsets and cumulative clips, and replays the
//! commands onto a [`DrawingSurface`] supplied by the host.

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};
use peniko::Brush;

use crate::controls::ImageSource;
use crate::id::ElementId;
use crate::text::Font;
use crate::tree::ElementTree;

/// One recorded drawing operation, in element coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Fill a rectangle.
    Rectangle {
        /// Area to fill.
        rect: Rect,
        /// Fill brush.
        brush: Brush,
    },
    /// Draw an image scaled into a rectangle.
    Image {
        /// Image to draw.
        source: ImageSource,
        /// Destination.
        rect: Rect,
    },
    /// Draw text with its top-left corner at `origin`.
    Text {
        /// Font to draw with.
        font: Font,
        /// Text, lines separated by `'\n'`.
        text: String,
        /// Top-left corner.
        origin: Point,
        /// Text brush.
        brush: Brush,
    },
}

impl DrawCommand {
    /// Replays this command translated by `offset`.
    pub fn replay(&self, offset: Vec2, surface: &mut dyn DrawingSurface) {
        match self {
            Self::Rectangle { rect, brush } => surface.draw_rectangle(*rect + offset, brush),
            Self::Image { source, rect } => surface.draw_image(source, *rect + offset),
            Self::Text {
                font,
                text,
                origin,
                brush,
            } => surface.draw_text(font, text, *origin + offset, brush),
        }
    }
}

/// Commands recorded by one element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawingContext {
    commands: Vec<DrawCommand>,
}

impl DrawingContext {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a filled rectangle.
    pub fn draw_rectangle(&mut self, rect: Rect, brush: &Brush) {
        self.commands.push(DrawCommand::Rectangle {
            rect,
            brush: brush.clone(),
        });
    }

    /// Records an image.
    pub fn draw_image(&mut self, source: &ImageSource, rect: Rect) {
        self.commands.push(DrawCommand::Image {
            source: source.clone(),
            rect,
        });
    }

    /// Records text.
    pub fn draw_text(&mut self, font: &Font, text: &str, origin: Point, brush: &Brush) {
        self.commands.push(DrawCommand::Text {
            font: font.clone(),
            text: text.to_owned(),
            origin,
            brush: brush.clone(),
        });
    }

    /// The recorded commands, in order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// A host drawing backend.
///
/// Coordinates are absolute. The clip stays in effect until the next
/// [`set_clip`](Self::set_clip).
pub trait DrawingSurface {
    /// Restricts drawing to `clip`, or lifts the restriction with `None`.
    fn set_clip(&mut self, clip: Option<Rect>);
    /// Fills a rectangle.
    fn draw_rectangle(&mut self, rect: Rect, brush: &Brush);
    /// Draws an image scaled into `rect`.
    fn draw_image(&mut self, source: &ImageSource, rect: Rect);
    /// Draws text with its top-left corner at `origin`.
    fn draw_text(&mut self, font: &Font, text: &str, origin: Point, brush: &Brush);
}

/// One element in the draw list.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawEntry {
    /// The element.
    pub element: ElementId,
    /// Absolute offset of the element's origin.
    pub offset: Vec2,
    /// Absolute clip, combined with every ancestor's.
    pub clip: Option<Rect>,
}

/// Flattened draw list for one tree.
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    entries: Vec<DrawEntry>,
}

impl Renderer {
    /// Creates an empty draw list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the draw list from `root` in pre-order.
    ///
    /// Elements that were never arranged are skipped together with their
    /// subtrees. An element's clip is intersected with its ancestors'; if the
    /// intersection is empty, the ancestors' clip is used on its own.
    pub fn rebuild(&mut self, tree: &ElementTree, root: ElementId) {
        self.entries.clear();
        self.visit(tree, root, Vec2::ZERO, None);
        tracing::debug!(entries = self.entries.len(), "rebuilt draw list");
    }

    fn visit(
        &mut self,
        tree: &ElementTree,
        id: ElementId,
        parent_offset: Vec2,
        parent_clip: Option<Rect>,
    ) {
        let Some(state) = tree.layout(id) else {
            return;
        };
        if state.previous_final_rect().is_none() {
            return;
        }
        let offset = parent_offset + state.visual_offset();
        let clip = match (state.clip().map(|clip| clip + offset), parent_clip) {
            (None, parent) => parent,
            (Some(own), None) => Some(own),
            (Some(own), Some(parent)) => {
                let both = own.intersect(parent);
                Some(if both.is_zero_area() { parent } else { both })
            }
        };
        self.entries.push(DrawEntry {
            element: id,
            offset,
            clip,
        });
        for child in tree.children(id) {
            if tree.parent(child) == Some(id) {
                self.visit(tree, child, offset, clip);
            }
        }
    }

    /// The draw list, in paint order.
    #[must_use]
    pub fn entries(&self) -> &[DrawEntry] {
        &self.entries
    }

    /// Replays every recorded command onto `surface`.
    pub fn draw(&self, tree: &ElementTree, surface: &mut dyn DrawingSurface) {
        for entry in &self.entries {
            let Some(drawing) = tree.drawing(entry.element) else {
                continue;
            };
            if drawing.is_empty() {
                continue;
            }
            surface.set_clip(entry.clip);
            for command in drawing.commands() {
                command.replay(entry.offset, surface);
            }
        }
    }
}
