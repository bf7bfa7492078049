// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in property descriptors.
//!
//! Every [`ElementTree`](crate::ElementTree) registers these once, at
//! construction, and hands out the handles as a [`Properties`] value. The
//! handles are plain indices and are only meaningful for the tree that
//! issued them.

use alloc::string::String;

use peniko::{Brush, Color};
use understory_binding::DataContext;
use understory_property::{Invalidation, Property, PropertyMetadataBuilder, PropertyRegistry};

use crate::controls::{
    Border, Button, Image, ImageSource, Orientation, StackPanel, Stretch, StretchDirection,
    TextBlock, TextWrapping,
};
use crate::geometry::{HorizontalAlignment, Thickness, VerticalAlignment, close_to};
use crate::grid::Grid;
use crate::text::Font;

fn same_length(a: &f64, b: &f64) -> bool {
    close_to(*a, *b) || (a.is_nan() && b.is_nan())
}

fn same_thickness(a: &Thickness, b: &Thickness) -> bool {
    a.is_close_to(b)
}

fn length(default: f64) -> PropertyMetadataBuilder<f64> {
    PropertyMetadataBuilder::with_equality(default, same_length).invalidates(Invalidation::MEASURE)
}

fn thickness() -> PropertyMetadataBuilder<Thickness> {
    PropertyMetadataBuilder::with_equality(Thickness::ZERO, same_thickness)
        .invalidates(Invalidation::MEASURE)
}

/// Properties every element has.
#[derive(Copy, Clone, Debug)]
pub struct LayoutProperties {
    /// Explicit width; NaN (the default) means unset.
    pub width: Property<f64>,
    /// Explicit height; NaN (the default) means unset.
    pub height: Property<f64>,
    /// Lower width bound, default `0`.
    pub min_width: Property<f64>,
    /// Lower height bound, default `0`.
    pub min_height: Property<f64>,
    /// Upper width bound, default `+inf`.
    pub max_width: Property<f64>,
    /// Upper height bound, default `+inf`.
    pub max_height: Property<f64>,
    /// Space reserved around the element.
    pub margin: Property<Thickness>,
    /// Horizontal placement in the allotted slot.
    pub horizontal_alignment: Property<HorizontalAlignment>,
    /// Vertical placement in the allotted slot.
    pub vertical_alignment: Property<VerticalAlignment>,
    /// Inherited binding context.
    pub data_context: Property<Option<DataContext>>,
    /// Set while the element holds the pointer capture.
    pub is_mouse_captured: Property<bool>,
}

impl LayoutProperties {
    fn register(registry: &mut PropertyRegistry) -> Self {
        Self {
            width: registry.register("Width", length(f64::NAN).build()),
            height: registry.register("Height", length(f64::NAN).build()),
            min_width: registry.register("MinWidth", length(0.0).build()),
            min_height: registry.register("MinHeight", length(0.0).build()),
            max_width: registry.register("MaxWidth", length(f64::INFINITY).build()),
            max_height: registry.register("MaxHeight", length(f64::INFINITY).build()),
            margin: registry.register("Margin", thickness().build()),
            horizontal_alignment: registry.register(
                "HorizontalAlignment",
                PropertyMetadataBuilder::new(HorizontalAlignment::Stretch)
                    .invalidates(Invalidation::ARRANGE)
                    .build(),
            ),
            vertical_alignment: registry.register(
                "VerticalAlignment",
                PropertyMetadataBuilder::new(VerticalAlignment::Stretch)
                    .invalidates(Invalidation::ARRANGE)
                    .build(),
            ),
            data_context: registry.register(
                "DataContext",
                PropertyMetadataBuilder::new(None).inherits(true).build(),
            ),
            is_mouse_captured: registry.register(
                "IsMouseCaptured",
                PropertyMetadataBuilder::new(false).build(),
            ),
        }
    }
}

/// Attached grid placement.
#[derive(Copy, Clone, Debug)]
pub struct GridProperties {
    /// Column index; clamps to the last column.
    pub column: Property<usize>,
    /// Row index; clamps to the last row.
    pub row: Property<usize>,
}

/// [`StackPanel`] properties.
#[derive(Copy, Clone, Debug)]
pub struct StackPanelProperties {
    /// Stacking direction.
    pub orientation: Property<Orientation>,
}

/// [`TextBlock`] properties.
#[derive(Copy, Clone, Debug)]
pub struct TextBlockProperties {
    /// The displayed text.
    pub text: Property<String>,
    /// Space between the bounds and the text.
    pub padding: Property<Thickness>,
    /// Line breaking.
    pub wrapping: Property<TextWrapping>,
    /// Text brush, default black.
    pub foreground: Property<Brush>,
    /// Optional fill behind the text.
    pub background: Property<Option<Brush>>,
    /// Font passed to the measurer and the drawing surface.
    pub font: Property<Font>,
}

/// [`Border`] properties.
#[derive(Copy, Clone, Debug)]
pub struct BorderProperties {
    /// Edge widths.
    pub border_thickness: Property<Thickness>,
    /// Space between the border and the child.
    pub padding: Property<Thickness>,
    /// Fill inside the border.
    pub background: Property<Option<Brush>>,
    /// Edge brush; no edges are drawn without one.
    pub border_brush: Property<Option<Brush>>,
}

/// [`Image`] properties.
#[derive(Copy, Clone, Debug)]
pub struct ImageProperties {
    /// The image to draw.
    pub source: Property<Option<ImageSource>>,
    /// How the image fills its slot, default [`Stretch::Uniform`].
    pub stretch: Property<Stretch>,
    /// Which scalings are allowed, default [`StretchDirection::Both`].
    pub stretch_direction: Property<StretchDirection>,
}

/// [`Button`] properties.
#[derive(Copy, Clone, Debug)]
pub struct ButtonProperties {
    /// Set while the pointer is pressed over the captured button.
    pub is_pressed: Property<bool>,
}

/// Handles for every built-in property.
#[derive(Copy, Clone, Debug)]
pub struct Properties {
    /// Shared layout properties.
    pub layout: LayoutProperties,
    /// Grid attached properties.
    pub grid: GridProperties,
    /// Stack panel properties.
    pub stack_panel: StackPanelProperties,
    /// Text block properties.
    pub text_block: TextBlockProperties,
    /// Border properties.
    pub border: BorderProperties,
    /// Image properties.
    pub image: ImageProperties,
    /// Button properties.
    pub button: ButtonProperties,
}

impl Properties {
    /// Registers every built-in property.
    ///
    /// # Panics
    ///
    /// Panics if `registry` already holds the built-in properties.
    pub fn register(registry: &mut PropertyRegistry) -> Self {
        let layout = LayoutProperties::register(registry);
        let grid = GridProperties {
            column: registry.register_for::<Grid, usize>(
                "Column",
                PropertyMetadataBuilder::new(0).invalidates(Invalidation::MEASURE).build(),
            ),
            row: registry.register_for::<Grid, usize>(
                "Row",
                PropertyMetadataBuilder::new(0).invalidates(Invalidation::MEASURE).build(),
            ),
        };
        let stack_panel = StackPanelProperties {
            orientation: registry.register_for::<StackPanel, Orientation>(
                "Orientation",
                PropertyMetadataBuilder::new(Orientation::Vertical)
                    .invalidates(Invalidation::MEASURE)
                    .build(),
            ),
        };
        let text_block = TextBlockProperties {
            text: registry.register_for::<TextBlock, String>(
                "Text",
                PropertyMetadataBuilder::new(String::new())
                    .invalidates(Invalidation::MEASURE)
                    .build(),
            ),
            padding: registry.register_for::<TextBlock, Thickness>("Padding", thickness().build()),
            wrapping: registry.register_for::<TextBlock, TextWrapping>(
                "Wrapping",
                PropertyMetadataBuilder::new(TextWrapping::NoWrap)
                    .invalidates(Invalidation::MEASURE)
                    .build(),
            ),
            foreground: registry.register_for::<TextBlock, Brush>(
                "Foreground",
                PropertyMetadataBuilder::new(Brush::Solid(Color::BLACK))
                    .invalidates(Invalidation::ARRANGE)
                    .build(),
            ),
            background: registry.register_for::<TextBlock, Option<Brush>>(
                "Background",
                PropertyMetadataBuilder::new(None)
                    .invalidates(Invalidation::ARRANGE)
                    .build(),
            ),
            font: registry.register_for::<TextBlock, Font>(
                "Font",
                PropertyMetadataBuilder::new(Font::default())
                    .invalidates(Invalidation::MEASURE)
                    .build(),
            ),
        };
        let border = BorderProperties {
            border_thickness: registry
                .register_for::<Border, Thickness>("BorderThickness", thickness().build()),
            padding: registry.register_for::<Border, Thickness>("Padding", thickness().build()),
            background: registry.register_for::<Border, Option<Brush>>(
                "Background",
                PropertyMetadataBuilder::new(None)
                    .invalidates(Invalidation::ARRANGE)
                    .build(),
            ),
            border_brush: registry.register_for::<Border, Option<Brush>>(
                "BorderBrush",
                PropertyMetadataBuilder::new(None)
                    .invalidates(Invalidation::ARRANGE)
                    .build(),
            ),
        };
        let image = ImageProperties {
            source: registry.register_for::<Image, Option<ImageSource>>(
                "Source",
                PropertyMetadataBuilder::new(None)
                    .invalidates(Invalidation::MEASURE)
                    .build(),
            ),
            stretch: registry.register_for::<Image, Stretch>(
                "Stretch",
                PropertyMetadataBuilder::new(Stretch::Uniform)
                    .invalidates(Invalidation::MEASURE)
                    .build(),
            ),
            stretch_direction: registry.register_for::<Image, StretchDirection>(
                "StretchDirection",
                PropertyMetadataBuilder::new(StretchDirection::Both)
                    .invalidates(Invalidation::MEASURE)
                    .build(),
            ),
        };
        let button = ButtonProperties {
            is_pressed: registry.register_for::<Button, bool>(
                "IsPressed",
                PropertyMetadataBuilder::new(false)
                    .invalidates(Invalidation::ARRANGE)
                    .build(),
            ),
        };
        Self {
            layout,
            grid,
            stack_panel,
            text_block,
            border,
            image,
            button,
        }
    }
}
