// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element identifiers.

use core::fmt;

/// Identifier for an element in an [`ElementTree`](crate::ElementTree).
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `ElementId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new,
///   distinct `ElementId`.
///
/// ### Liveness
///
/// Use [`ElementTree::contains`](crate::ElementTree::contains) to check whether an `ElementId`
/// still refers to a live element. Stale ids never alias a different element because the
/// generation must match; operations given a stale id report
/// [`LayoutError::StaleElement`](crate::LayoutError::StaleElement).
///
/// Parent links are stored as ids, so a child never keeps its parent alive.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ElementId(u32, u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn slot(self) -> u32 {
        self.0
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({}v{})", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn generation_distinguishes_reused_slots() {
        let first = ElementId::new(3, 1);
        let reused = ElementId::new(3, 2);
        assert_ne!(first, reused);
        assert_eq!(first.idx(), reused.idx());
        assert_eq!(format!("{reused:?}"), "ElementId(3v2)");
    }
}
