// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Track sizing: proportional (star) allocation and final lengths.

use alloc::vec::Vec;

use crate::geometry::{close_to, coerce, greater_than};

use super::GridLength;

/// A grid row or column during one layout pass.
///
/// Created from a [`ColumnDefinition`](super::ColumnDefinition) or
/// [`RowDefinition`](super::RowDefinition) with [`Track::new`]; every other
/// field is computed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Track {
    /// Length as configured.
    pub user_length: GridLength,
    /// Lower bound as configured.
    pub user_min: f64,
    /// Upper bound as configured.
    pub user_max: f64,
    /// Length kind used during measure; star tracks measure as auto when the
    /// grid has infinite space on that axis.
    pub length_type: LengthType,
    /// Largest content or configured minimum seen this pass.
    pub min_length: f64,
    /// Space offered to children during measure.
    pub available_length: f64,
    /// Length after arrange.
    pub final_length: f64,
    /// Offset after arrange.
    pub final_offset: f64,
    numerator: f64,
    denominator: f64,
    allocation_order: f64,
}

/// The three ways a track can be sized.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LengthType {
    /// Sized to content.
    Auto,
    /// Fixed length.
    Pixel,
    /// Proportional share of leftover space.
    Star,
}

impl GridLength {
    /// The kind of this length.
    #[must_use]
    pub fn length_type(self) -> LengthType {
        match self {
            Self::Auto => LengthType::Auto,
            Self::Pixel(_) => LengthType::Pixel,
            Self::Star(_) => LengthType::Star,
        }
    }
}

impl Track {
    /// Creates a track with everything computed reset.
    #[must_use]
    pub fn new(user_length: GridLength, user_min: f64, user_max: f64) -> Self {
        Self {
            user_length,
            user_min,
            user_max,
            length_type: user_length.length_type(),
            min_length: 0.0,
            available_length: 0.0,
            final_length: 0.0,
            final_offset: 0.0,
            numerator: 0.0,
            denominator: 0.0,
            allocation_order: 0.0,
        }
    }

    /// Raises the minimum length to `length` if larger.
    pub fn update_min_length(&mut self, length: f64) {
        self.min_length = self.min_length.max(length);
    }

    /// Resets the computed fields for a measure pass.
    ///
    /// Returns the length kind used for the pass.
    pub(crate) fn begin_measure(&mut self, treat_star_as_auto: bool) -> LengthType {
        self.min_length = 0.0;
        let mut user_min = self.user_min;
        let available = match self.user_length {
            GridLength::Auto => {
                self.length_type = LengthType::Auto;
                f64::INFINITY
            }
            GridLength::Pixel(length) => {
                self.length_type = LengthType::Pixel;
                user_min = coerce(length, self.user_min, self.user_max);
                length
            }
            GridLength::Star(_) => {
                self.length_type = if treat_star_as_auto {
                    LengthType::Auto
                } else {
                    LengthType::Star
                };
                f64::INFINITY
            }
        };
        self.update_min_length(user_min);
        self.available_length = coerce(available, user_min, self.user_max);
        self.length_type
    }

    fn weight(&self) -> f64 {
        match self.user_length {
            GridLength::Star(weight) => weight,
            _ => 0.0,
        }
    }

    /// Prepares the star bookkeeping; zero weights get no share.
    fn prepare_star(&mut self) {
        let weight = self.weight();
        if close_to(weight, 0.0) {
            self.numerator = 0.0;
            self.allocation_order = 0.0;
        } else {
            self.numerator = weight;
            self.allocation_order = self.min_length.max(self.user_max) / weight;
        }
    }
}

/// Shares `length - occupied` among `stars`, tightest constraint first.
///
/// Each share is clamped to the track's `[min_length, user_max]` and added to
/// `occupied` before the next track is considered.
fn share_among_stars(
    tracks: &mut [Track],
    stars: &[usize],
    length: f64,
    occupied: &mut f64,
    assign: fn(&mut Track, f64),
) {
    let mut sorted = stars.to_vec();
    sorted.sort_by(|&a, &b| {
        tracks[a]
            .allocation_order
            .total_cmp(&tracks[b].allocation_order)
    });

    let mut denominator = 0.0;
    for &idx in sorted.iter().rev() {
        denominator += tracks[idx].numerator;
        tracks[idx].denominator = denominator;
    }

    for &idx in &sorted {
        let track = &mut tracks[idx];
        let share = if close_to(track.numerator, 0.0) {
            track.min_length
        } else {
            let remaining = (length - *occupied).max(0.0);
            coerce(
                remaining * (track.numerator / track.denominator),
                track.min_length,
                track.user_max,
            )
        };
        *occupied += share;
        assign(track, share);
    }
}

/// Gives star tracks their measure-time share of `available_length`.
///
/// Auto tracks occupy their current minimum and pixel tracks their available
/// length. Classification uses [`Track::length_type`], so stars measured as
/// auto are left alone.
pub fn allocate_proportional_space(tracks: &mut [Track], available_length: f64) {
    let mut occupied = 0.0;
    let mut stars = Vec::new();
    for (idx, track) in tracks.iter_mut().enumerate() {
        match track.length_type {
            LengthType::Auto => occupied += track.min_length,
            LengthType::Pixel => occupied += track.available_length,
            LengthType::Star => {
                track.prepare_star();
                stars.push(idx);
            }
        }
    }
    if !stars.is_empty() {
        share_among_stars(tracks, &stars, available_length, &mut occupied, |track, share| {
            track.available_length = share;
        });
    }
}

/// Computes every track's final length and offset within `final_length`.
///
/// Auto tracks keep their minimum, pixel tracks their configured length
/// clamped to `[min_length, user_max]`, and star tracks share the rest. If
/// the tracks still overflow, the excess is taken back from the tracks with
/// the least slack first, never below a track's minimum.
///
/// ```rust
/// use understory_layout::{GridLength, Track, set_final_lengths};
///
/// let mut tracks = [
///     Track::new(GridLength::Star(1.0), 0.0, f64::INFINITY),
///     Track::new(GridLength::Star(3.0), 0.0, f64::INFINITY),
/// ];
/// set_final_lengths(&mut tracks, 100.0);
/// assert_eq!(tracks[0].final_length, 25.0);
/// assert_eq!(tracks[1].final_offset, 25.0);
/// assert_eq!(tracks[1].final_length, 75.0);
/// ```
pub fn set_final_lengths(tracks: &mut [Track], final_length: f64) {
    let mut occupied = 0.0;
    let mut stars = Vec::new();
    let mut fixed = Vec::new();
    for (idx, track) in tracks.iter_mut().enumerate() {
        match track.user_length {
            GridLength::Auto => {
                track.final_length = coerce(track.min_length, track.min_length, track.user_max);
                occupied += track.final_length;
                fixed.push(idx);
            }
            GridLength::Pixel(length) => {
                track.final_length = coerce(length, track.min_length, track.user_max);
                occupied += track.final_length;
                fixed.push(idx);
            }
            GridLength::Star(_) => {
                track.prepare_star();
                stars.push(idx);
            }
        }
    }
    if !stars.is_empty() {
        share_among_stars(tracks, &stars, final_length, &mut occupied, |track, share| {
            track.final_length = share;
        });
    }

    if greater_than(occupied, final_length) {
        // Fixed tracks are considered last to first.
        let mut order: Vec<usize> = stars.iter().chain(fixed.iter().rev()).copied().collect();
        order.sort_by(|&a, &b| {
            let slack = |track: &Track| track.final_length - track.min_length;
            slack(&tracks[a]).total_cmp(&slack(&tracks[b]))
        });
        let count = tracks.len();
        let mut excess = occupied - final_length;
        for (i, &idx) in order.iter().enumerate() {
            let track = &mut tracks[idx];
            let shrunk = coerce(
                track.final_length - excess / (count - i) as f64,
                track.min_length,
                track.final_length,
            );
            excess -= track.final_length - shrunk;
            track.final_length = shrunk;
        }
    }

    let mut offset = 0.0;
    for track in tracks.iter_mut() {
        track.final_offset = offset;
        offset += track.final_length;
    }
}
