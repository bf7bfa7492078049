// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid layout.
//!
//! Children are placed in cells with the attached `Grid.Column` and
//! `Grid.Row` properties. Tracks are sized as [`GridLength::Auto`] (to
//! content), [`GridLength::Pixel`] (fixed) or [`GridLength::Star`] (a
//! weighted share of what is left). See [`set_final_lengths`] for the
//! proportional algorithm.
//!
//! Cells are measured in an order that lets auto tracks settle before star
//! tracks on the other axis are allotted space: cells with no star track
//! first, then the star-by-auto cells of whichever axis has no auto tracks,
//! and cells that are star on both axes last.

mod star;

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Rect, Size};

pub use star::{LengthType, Track, allocate_proportional_space, set_final_lengths};

use crate::collection::{ElementCollection, Panel};
use crate::element::{ChildList, Element, ElementCx};
use crate::error::Result;
use crate::id::ElementId;

/// Length of a grid track.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GridLength {
    /// Sized to the largest child in the track.
    Auto,
    /// A fixed length.
    Pixel(f64),
    /// A weighted share of the space left by the other tracks.
    Star(f64),
}

impl Default for GridLength {
    fn default() -> Self {
        Self::Star(1.0)
    }
}

/// A grid column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColumnDefinition {
    /// Column width, default `1*`.
    pub width: GridLength,
    /// Lower bound.
    pub min_width: f64,
    /// Upper bound.
    pub max_width: f64,
}

impl ColumnDefinition {
    /// A column of the given width with no bounds.
    #[must_use]
    pub fn new(width: GridLength) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }
}

impl Default for ColumnDefinition {
    fn default() -> Self {
        Self {
            width: GridLength::default(),
            min_width: 0.0,
            max_width: f64::INFINITY,
        }
    }
}

/// A grid row.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RowDefinition {
    /// Row height, default `1*`.
    pub height: GridLength,
    /// Lower bound.
    pub min_height: f64,
    /// Upper bound.
    pub max_height: f64,
}

impl RowDefinition {
    /// A row of the given height with no bounds.
    #[must_use]
    pub fn new(height: GridLength) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }
}

impl Default for RowDefinition {
    fn default() -> Self {
        Self {
            height: GridLength::default(),
            min_height: 0.0,
            max_height: f64::INFINITY,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Cell {
    child: ElementId,
    column: usize,
    row: usize,
    width_type: LengthType,
    height_type: LengthType,
}

/// Which track minimums a measuring round may raise.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum MinUpdate {
    SkipHeights,
    SkipWidths,
    Both,
}

/// Cells grouped by which axes are star sized.
#[derive(Debug, Default)]
struct Buckets {
    no_stars: Vec<Cell>,
    star_height_only: Vec<Cell>,
    star_width_only: Vec<Cell>,
    all_stars: Vec<Cell>,
}

/// A panel of rows and columns.
///
/// ```rust
/// use kurbo::{Rect, Size};
/// use understory_layout::{ColumnDefinition, ElementTree, Grid, GridLength, TextBlock};
///
/// let mut tree = ElementTree::new();
/// let grid = tree.insert(Grid::new().with_columns([
///     ColumnDefinition::new(GridLength::Pixel(40.0)),
///     ColumnDefinition::new(GridLength::Star(1.0)),
/// ]));
/// let label = tree.insert(TextBlock::new());
/// let column = tree.properties().grid.column;
/// tree.set_value(label, column, 1).unwrap();
/// tree.add_child::<Grid>(grid, label).unwrap();
///
/// tree.measure(grid, Size::new(100.0, 20.0)).unwrap();
/// tree.arrange(grid, Rect::new(0.0, 0.0, 100.0, 20.0)).unwrap();
/// assert_eq!(tree.layout(label).unwrap().visual_offset().x, 40.0);
/// ```
#[derive(Debug, Default)]
pub struct Grid {
    children: ElementCollection,
    column_definitions: Vec<ColumnDefinition>,
    row_definitions: Vec<RowDefinition>,
    columns: Vec<Track>,
    rows: Vec<Track>,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid with one implicit `1*` row and column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the column definitions.
    #[must_use]
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnDefinition>) -> Self {
        self.column_definitions = columns.into_iter().collect();
        self
    }

    /// Sets the row definitions.
    #[must_use]
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = RowDefinition>) -> Self {
        self.row_definitions = rows.into_iter().collect();
        self
    }

    /// The configured columns.
    #[must_use]
    pub fn column_definitions(&self) -> &[ColumnDefinition] {
        &self.column_definitions
    }

    /// The configured rows.
    #[must_use]
    pub fn row_definitions(&self) -> &[RowDefinition] {
        &self.row_definitions
    }

    /// Replaces the columns and invalidates measure.
    pub fn set_columns(
        &mut self,
        cx: &mut ElementCx<'_>,
        columns: impl IntoIterator<Item = ColumnDefinition>,
    ) {
        self.column_definitions = columns.into_iter().collect();
        cx.invalidate_measure();
    }

    /// Replaces the rows and invalidates measure.
    pub fn set_rows(
        &mut self,
        cx: &mut ElementCx<'_>,
        rows: impl IntoIterator<Item = RowDefinition>,
    ) {
        self.row_definitions = rows.into_iter().collect();
        cx.invalidate_measure();
    }

    /// Column tracks from the last layout pass.
    #[must_use]
    pub fn columns(&self) -> &[Track] {
        &self.columns
    }

    /// Row tracks from the last layout pass.
    #[must_use]
    pub fn rows(&self) -> &[Track] {
        &self.rows
    }

    fn create_tracks(&mut self) {
        self.columns = if self.column_definitions.is_empty() {
            vec![Track::new(GridLength::default(), 0.0, f64::INFINITY)]
        } else {
            self.column_definitions
                .iter()
                .map(|c| Track::new(c.width, c.min_width, c.max_width))
                .collect()
        };
        self.rows = if self.row_definitions.is_empty() {
            vec![Track::new(GridLength::default(), 0.0, f64::INFINITY)]
        } else {
            self.row_definitions
                .iter()
                .map(|r| Track::new(r.height, r.min_height, r.max_height))
                .collect()
        };
    }

    fn create_cells(&mut self, cx: &ElementCx<'_>) -> Buckets {
        let grid = cx.properties().grid;
        let mut buckets = Buckets::default();
        self.cells.clear();
        for child in self.children.iter() {
            let tree = cx.tree();
            let column = (*tree.value_or_default(child, grid.column)).min(self.columns.len() - 1);
            let row = (*tree.value_or_default(child, grid.row)).min(self.rows.len() - 1);
            let cell = Cell {
                child,
                column,
                row,
                width_type: self.columns[column].length_type,
                height_type: self.rows[row].length_type,
            };
            let bucket = match (
                cell.width_type == LengthType::Star,
                cell.height_type == LengthType::Star,
            ) {
                (false, false) => &mut buckets.no_stars,
                (false, true) => &mut buckets.star_height_only,
                (true, false) => &mut buckets.star_width_only,
                (true, true) => &mut buckets.all_stars,
            };
            bucket.push(cell);
            self.cells.push(cell);
        }
        buckets
    }

    fn measure_cells(
        &mut self,
        cx: &mut ElementCx<'_>,
        cells: &[Cell],
        update: MinUpdate,
    ) -> Result<()> {
        for cell in cells {
            let width = if cell.width_type == LengthType::Auto {
                f64::INFINITY
            } else {
                self.columns[cell.column].available_length
            };
            let height = if cell.height_type == LengthType::Auto || update == MinUpdate::SkipHeights
            {
                f64::INFINITY
            } else {
                self.rows[cell.row].available_length
            };
            let desired = cx.measure_child(cell.child, Size::new(width, height))?;

            if update != MinUpdate::SkipWidths {
                let column = &mut self.columns[cell.column];
                column.update_min_length(desired.width.min(column.user_max));
            }
            if update != MinUpdate::SkipHeights {
                let row = &mut self.rows[cell.row];
                row.update_min_length(desired.height.min(row.user_max));
            }
        }
        Ok(())
    }
}

/// Per-axis flags for the current measure pass.
#[derive(Copy, Clone, Debug, Default)]
struct AxisKinds {
    has_auto: bool,
    has_star: bool,
}

fn begin_measure(tracks: &mut [Track], treat_star_as_auto: bool) -> AxisKinds {
    let mut kinds = AxisKinds::default();
    for track in tracks {
        track.begin_measure(treat_star_as_auto);
        match track.user_length {
            GridLength::Auto => kinds.has_auto = true,
            GridLength::Star(_) => kinds.has_star = true,
            GridLength::Pixel(_) => {}
        }
    }
    kinds
}

impl Element for Grid {
    fn measure_override(&mut self, cx: &mut ElementCx<'_>, available: Size) -> Result<Size> {
        self.create_tracks();
        let width = begin_measure(&mut self.columns, available.width == f64::INFINITY);
        let height = begin_measure(&mut self.rows, available.height == f64::INFINITY);
        let buckets = self.create_cells(cx);

        self.measure_cells(cx, &buckets.no_stars, MinUpdate::Both)?;
        if !height.has_auto {
            if height.has_star {
                allocate_proportional_space(&mut self.rows, available.height);
            }
            self.measure_cells(cx, &buckets.star_height_only, MinUpdate::Both)?;
            if width.has_star {
                allocate_proportional_space(&mut self.columns, available.width);
            }
            self.measure_cells(cx, &buckets.star_width_only, MinUpdate::Both)?;
        } else if !width.has_auto {
            if width.has_star {
                allocate_proportional_space(&mut self.columns, available.width);
            }
            self.measure_cells(cx, &buckets.star_width_only, MinUpdate::Both)?;
            if height.has_star {
                allocate_proportional_space(&mut self.rows, available.height);
            }
            self.measure_cells(cx, &buckets.star_height_only, MinUpdate::Both)?;
        } else {
            self.measure_cells(cx, &buckets.star_height_only, MinUpdate::SkipHeights)?;
            if width.has_star {
                allocate_proportional_space(&mut self.columns, available.width);
            }
            self.measure_cells(cx, &buckets.star_width_only, MinUpdate::Both)?;
            if height.has_star {
                allocate_proportional_space(&mut self.rows, available.height);
            }
            self.measure_cells(cx, &buckets.star_height_only, MinUpdate::SkipWidths)?;
        }
        self.measure_cells(cx, &buckets.all_stars, MinUpdate::Both)?;

        Ok(Size::new(
            self.columns.iter().map(|c| c.min_length).sum(),
            self.rows.iter().map(|r| r.min_length).sum(),
        ))
    }

    fn arrange_override(&mut self, cx: &mut ElementCx<'_>, final_size: Size) -> Result<Size> {
        set_final_lengths(&mut self.columns, final_size.width);
        set_final_lengths(&mut self.rows, final_size.height);
        for cell in &self.cells {
            let column = &self.columns[cell.column];
            let row = &self.rows[cell.row];
            let rect = Rect::from_origin_size(
                (column.final_offset, row.final_offset),
                (column.final_length, row.final_length),
            );
            cx.arrange_child(cell.child, rect)?;
        }
        Ok(final_size)
    }

    fn visual_children(&self) -> ChildList {
        self.children.ids()
    }
}

impl Panel for Grid {
    fn children(&self) -> &ElementCollection {
        &self.children
    }

    fn children_mut(&mut self) -> &mut ElementCollection {
        &mut self.children
    }
}
