//! Contact resolution: decides what happens when two cells touch.
//!
//! The resolver never mutates cells. It reports an [`Outcome`] and the
//! population applies it after the whole pair scan.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::cell::{Cell, CellId};

/// Two cells reported touching in the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactPair {
    pub a: CellId,
    pub b: CellId,
}

impl ContactPair {
    pub fn new(a: CellId, b: CellId) -> Self {
        ContactPair { a, b }
    }

    /// Same pair with the lower id first.
    pub fn canonical(self) -> Self {
        if self.a <= self.b {
            self
        } else {
            ContactPair { a: self.b, b: self.a }
        }
    }
}

/// How an exact strength tie in combat is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Each side wins its own attack, so both die.
    #[default]
    MutualKill,
    /// Nobody dies on a tie.
    BothSurvive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    None,
    CombatLoss(CellId),
    MutualKill(CellId, CellId),
    /// `initiator` is the parent whose traits the offspring clones.
    Mating { initiator: CellId, mate: CellId },
}

impl Outcome {
    pub fn casualties(&self) -> Vec<CellId> {
        match *self {
            Outcome::CombatLoss(loser) => vec![loser],
            Outcome::MutualKill(a, b) => vec![a, b],
            Outcome::None | Outcome::Mating { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResolver {
    pub tie_break: TieBreak,
    pub require_opposite_gender: bool,
}

impl Default for ContactResolver {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::MutualKill,
            require_opposite_gender: true,
        }
    }
}

impl ContactResolver {
    pub fn new(tie_break: TieBreak, require_opposite_gender: bool) -> Self {
        Self {
            tie_break,
            require_opposite_gender,
        }
    }

    pub fn resolve(&self, a: &Cell, b: &Cell, current_tick: u64) -> Outcome {
        let outcome = if a.species() != b.species() {
            self.combat(a, b)
        } else {
            self.mating(a, b)
        };
        log::trace!("tick {}: {} vs {} -> {:?}", current_tick, a.id(), b.id(), outcome);
        outcome
    }

    // An attacker wins when its strength is at least the defender's, and
    // the rule runs in both directions, so a tie means two winners.
    fn combat(&self, a: &Cell, b: &Cell) -> Outcome {
        match a.traits().strength.cmp(&b.traits().strength) {
            Ordering::Greater => Outcome::CombatLoss(b.id()),
            Ordering::Less => Outcome::CombatLoss(a.id()),
            Ordering::Equal => match self.tie_break {
                TieBreak::MutualKill => Outcome::MutualKill(a.id(), b.id()),
                TieBreak::BothSurvive => Outcome::None,
            },
        }
    }

    fn mating(&self, a: &Cell, b: &Cell) -> Outcome {
        if !a.can_mate() || !b.can_mate() {
            return Outcome::None;
        }
        if self.require_opposite_gender && a.traits().gender == b.traits().gender {
            return Outcome::None;
        }
        Outcome::Mating {
            initiator: a.id(),
            mate: b.id(),
        }
    }
}
