// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout invalidation tags carried by descriptors.

bitflags::bitflags! {
    /// Which layout passes a property change invalidates on its owner.
    ///
    /// An empty set means the change is only reported to observers.
    ///
    /// ```rust
    /// use understory_property::Invalidation;
    ///
    /// let tags = Invalidation::MEASURE | Invalidation::ARRANGE;
    /// assert!(tags.affects_layout());
    /// assert!(!Invalidation::empty().affects_layout());
    /// ```
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Invalidation: u8 {
        /// The owner must be measured again (which implies a new arrange).
        const MEASURE = 1 << 0;
        /// The owner must be arranged again.
        const ARRANGE = 1 << 1;
    }
}

impl Invalidation {
    /// Returns `true` if either layout pass is affected.
    #[must_use]
    #[inline]
    pub const fn affects_layout(self) -> bool {
        !self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert_eq!(Invalidation::default(), Invalidation::empty());
    }

    #[test]
    fn measure_and_arrange_are_distinct() {
        let both = Invalidation::MEASURE | Invalidation::ARRANGE;
        assert!(both.contains(Invalidation::MEASURE));
        assert!(both.contains(Invalidation::ARRANGE));
        assert!(!Invalidation::ARRANGE.contains(Invalidation::MEASURE));
    }
}
