//! Marker-to-slot assignment
//!
//! Each participant (or team) owns one printed marker. The registry is the
//! fixed whitelist of the four marker identities in play, in slot order.
//! Markers outside the whitelist are still detected and drawn for the
//! operator but never take part in answering.

use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{constants::slots::SLOT_COUNT, marker::MarkerId};

/// Position of a participant slot, always in `0..SLOT_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Slot(usize);

impl Slot {
    /// Returns the slot at `index`, or `None` if it is out of range
    pub fn new(index: usize) -> Option<Self> {
        (index < SLOT_COUNT).then_some(Self(index))
    }

    /// Returns the slot index
    pub fn index(self) -> usize {
        self.0
    }

    /// Iterates over every slot in order
    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOT_COUNT).map(Slot)
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

impl From<Slot> for usize {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

impl TryFrom<usize> for Slot {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Slot::new(index).ok_or(Error::SlotOutOfRange(index))
    }
}

/// Errors that can occur when building a registry
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The same marker identity was assigned to more than one slot
    #[error("marker {0} is assigned to more than one slot")]
    Duplicate(MarkerId),
    /// A slot index outside `0..SLOT_COUNT` was requested
    #[error("slot index {0} is out of range")]
    SlotOutOfRange(usize),
}

/// The whitelist of marker identities, one per slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotRegistry {
    markers: [MarkerId; SLOT_COUNT],
}

impl SlotRegistry {
    /// Creates a registry where `markers[i]` owns slot `i`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Duplicate`] if an identity appears twice, since it
    /// could not resolve to a single slot.
    pub fn new(markers: [MarkerId; SLOT_COUNT]) -> Result<Self, Error> {
        if let Some(duplicate) = markers.iter().duplicates().next() {
            return Err(Error::Duplicate(*duplicate));
        }

        Ok(Self { markers })
    }

    /// Resolves a marker identity to the slot it owns
    pub fn resolve(&self, id: MarkerId) -> Option<Slot> {
        self.markers.iter().position(|m| *m == id).map(Slot)
    }

    /// Returns the marker identity owning `slot`
    pub fn marker(&self, slot: Slot) -> MarkerId {
        self.markers[slot.0]
    }

    /// Iterates over the slots and the marker owning each
    pub fn iter(&self) -> impl Iterator<Item = (Slot, MarkerId)> + '_ {
        Slot::all().zip(self.markers.iter().copied())
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self {
            markers: crate::constants::slots::DEFAULT_MARKERS.map(MarkerId::new),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn registry() -> SlotRegistry {
        SlotRegistry::new([10, 20, 30, 40].map(MarkerId::new)).unwrap()
    }

    #[test]
    fn test_resolve_whitelisted() {
        let registry = registry();
        assert_eq!(registry.resolve(MarkerId::new(10)), Slot::new(0));
        assert_eq!(registry.resolve(MarkerId::new(40)), Slot::new(3));
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        let registry = registry();
        assert_eq!(registry.resolve(MarkerId::new(11)), None);
        assert_eq!(registry.resolve(MarkerId::new(0)), None);
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = SlotRegistry::new([1, 2, 2, 3].map(MarkerId::new));
        assert_eq!(result, Err(Error::Duplicate(MarkerId::new(2))));
    }

    #[test]
    fn test_iter_in_slot_order() {
        let pairs: Vec<_> = registry()
            .iter()
            .map(|(slot, id)| (slot.index(), id.get()))
            .collect();
        assert_eq!(pairs, vec![(0, 10), (1, 20), (2, 30), (3, 40)]);
    }

    #[test]
    fn test_marker_for_slot() {
        let registry = registry();
        let slot = Slot::new(2).unwrap();
        assert_eq!(registry.marker(slot), MarkerId::new(30));
        assert_eq!(registry.resolve(registry.marker(slot)), Some(slot));
    }

    #[test]
    fn test_default_registry() {
        let registry = SlotRegistry::default();
        assert_eq!(registry.resolve(MarkerId::new(1)), Slot::new(0));
        assert_eq!(registry.resolve(MarkerId::new(4)), Slot::new(3));
    }

    #[test]
    fn test_slot_bounds() {
        assert!(Slot::new(3).is_some());
        assert!(Slot::new(4).is_none());
        assert_eq!(Slot::try_from(9), Err(Error::SlotOutOfRange(9)));
        assert_eq!(Slot::new(0).unwrap().to_string(), "1");
        assert_eq!(Slot::all().count(), SLOT_COUNT);
    }

    #[test]
    fn test_slot_serde() {
        let slot = Slot::new(1).unwrap();
        assert_eq!(serde_json::to_string(&slot).unwrap(), "1");
        assert!(serde_json::from_str::<Slot>("7").is_err());
    }
}
