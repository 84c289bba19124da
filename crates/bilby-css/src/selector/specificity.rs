//! Selector specificity.
//!
//! A specificity is an ordered list of four counters. The origin slot is the
//! most significant: it is filled in from the owning stylesheet's origin so
//! that a view-stylesheet rule always outranks an application rule, which
//! always outranks a library default, before id/class/element counts are even
//! considered.

use core::fmt;

use serde::Serialize;

/// The four specificity slots, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificityType {
    /// Weight of the owning stylesheet's origin tier.
    Origin,
    /// Number of id selectors.
    Id,
    /// Number of class selectors, attribute expressions and non-functional
    /// pseudo-classes.
    ClassOrAttribute,
    /// Number of type selectors and pseudo-elements.
    Element,
}

/// An ordered specificity value used to rank matching rule sets.
///
/// Comparison is component-by-component, left to right, which makes the
/// ordering a strict total order once the origin slot is fixed. Increments
/// saturate so a pathological selector cannot wrap a slot around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct Specificity([u32; 4]);

impl Specificity {
    /// Create a zero specificity.
    #[must_use]
    pub const fn new() -> Self {
        Self([0; 4])
    }

    /// Create a specificity with explicit slot values
    /// (origin, id, class/attribute, element).
    #[must_use]
    pub const fn with_values(origin: u32, id: u32, class: u32, element: u32) -> Self {
        Self([origin, id, class, element])
    }

    /// Increment the counter for the given slot, saturating.
    pub fn increment(&mut self, slot: SpecificityType) {
        let index = Self::index(slot);
        self.0[index] = self.0[index].saturating_add(1);
    }

    /// Set the counter for the given slot.
    pub fn set(&mut self, slot: SpecificityType, value: u32) {
        self.0[Self::index(slot)] = value;
    }

    /// Read the counter for the given slot.
    #[must_use]
    pub const fn get(&self, slot: SpecificityType) -> u32 {
        self.0[Self::index(slot)]
    }

    const fn index(slot: SpecificityType) -> usize {
        match slot {
            SpecificityType::Origin => 0,
            SpecificityType::Id => 1,
            SpecificityType::ClassOrAttribute => 2,
            SpecificityType::Element => 3,
        }
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_left_to_right() {
        // One id outweighs any number of classes and elements.
        let id = Specificity::with_values(1, 1, 0, 0);
        let classes = Specificity::with_values(1, 0, 5, 5);
        assert!(id > classes);
    }

    #[test]
    fn origin_dominates() {
        let view = Specificity::with_values(2, 0, 0, 0);
        let app = Specificity::with_values(1, 9, 9, 9);
        assert!(view > app);
    }

    #[test]
    fn increment_saturates() {
        let mut spec = Specificity::with_values(0, u32::MAX, 0, 0);
        spec.increment(SpecificityType::Id);
        assert_eq!(spec.get(SpecificityType::Id), u32::MAX);
    }
}
