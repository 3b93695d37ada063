//! The live per-slot answer snapshot

use std::fmt::Display;

use enum_map::EnumMap;
use itertools::Itertools;
use serde::{Serialize, Serializer};

use crate::{constants::slots::SLOT_COUNT, orientation::Symbol, registry::Slot};

/// The answer currently shown by each slot's marker
///
/// `None` (rendered `-`) means the slot had no valid detection in the last
/// processed frame. Compared by value to decide whether a frame changed
/// anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AnswerVector([Option<Symbol>; SLOT_COUNT]);

impl AnswerVector {
    /// Creates a vector with every slot empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the answer of a slot
    pub fn get(&self, slot: Slot) -> Option<Symbol> {
        self.0[slot.index()]
    }

    /// Sets (or clears) the answer of a slot
    pub fn set(&mut self, slot: Slot, symbol: Option<Symbol>) {
        self.0[slot.index()] = symbol;
    }

    /// Returns `true` if no slot holds an answer
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Iterates over the slots and their answers
    pub fn iter(&self) -> impl Iterator<Item = (Slot, Option<Symbol>)> + '_ {
        Slot::all().zip(self.0.iter().copied())
    }

    /// Counts how many slots currently show each symbol
    pub fn tally(&self) -> EnumMap<Symbol, usize> {
        let mut tally = EnumMap::default();
        for symbol in self.0.iter().flatten() {
            tally[*symbol] += 1;
        }
        tally
    }

    fn label(symbol: Option<Symbol>) -> &'static str {
        symbol.map_or("-", Symbol::as_str)
    }
}

impl From<[Option<Symbol>; SLOT_COUNT]> for AnswerVector {
    fn from(value: [Option<Symbol>; SLOT_COUNT]) -> Self {
        Self(value)
    }
}

impl Display for AnswerVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|s| Self::label(*s)).join(" "))
    }
}

impl Serialize for AnswerVector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter().map(|s| Self::label(*s)))
    }
}
