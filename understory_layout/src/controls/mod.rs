// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in elements.

mod border;
mod button;
mod image;
mod items_control;
mod scroll;
mod stack_panel;
mod text_block;
mod virtualizing_stack_panel;

pub use border::Border;
pub use button::Button;
pub use image::{Image, ImageSource, Stretch, StretchDirection, compute_scale_factor};
pub use items_control::ItemsControl;
pub use scroll::{ScrollContentPresenter, ScrollViewer};
pub use stack_panel::StackPanel;
pub use text_block::{TextBlock, TextWrapping};
pub use virtualizing_stack_panel::VirtualizingStackPanel;

use crate::element::ElementCx;
use crate::error::Result;
use crate::id::ElementId;

/// Stacking direction of a panel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Top to bottom.
    #[default]
    Vertical,
    /// Left to right.
    Horizontal,
}

/// Swaps a single-child slot, detaching the old child and adopting the new.
pub(crate) fn replace_child(
    cx: &mut ElementCx<'_>,
    slot: &mut Option<ElementId>,
    child: Option<ElementId>,
) -> Result<()> {
    if *slot == child {
        return Ok(());
    }
    if let Some(child) = child {
        cx.adopt(child)?;
    }
    if let Some(old) = slot.take() {
        cx.disown(old)?;
    }
    *slot = child;
    Ok(())
}
