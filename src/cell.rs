use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cooldown::MatingCooldown;
use crate::genetics::{Species, Traits};
use crate::random::random_velocity;
use crate::vector::{Bounds, Vector};

/// Energy a newly created cell starts with. Carried, not consumed.
pub const INITIAL_ENERGY: f64 = 100.0;

/// Unique, monotonically assigned identity of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    id: CellId,
    traits: Traits,
    pub position: Vector,
    pub velocity: Vector,
    pub energy: f64,
    alive: bool,
    cooldown: MatingCooldown,
    generation: u32,
    born_at: u64,
}

impl Cell {
    pub fn new(id: CellId, traits: Traits, position: Vector, born_at: u64) -> Self {
        Cell {
            id,
            traits,
            position,
            velocity: Vector::ZERO,
            energy: INITIAL_ENERGY,
            alive: true,
            cooldown: MatingCooldown::new(),
            generation: 0,
            born_at,
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn traits(&self) -> &Traits {
        &self.traits
    }

    pub fn species(&self) -> Species {
        self.traits.species
    }

    pub fn size(&self) -> f64 {
        self.traits.size
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn born_at(&self) -> u64 {
        self.born_at
    }

    /// Eligible to mate. True exactly when no cooldown is pending.
    pub fn can_mate(&self) -> bool {
        !self.cooldown.is_pending()
    }

    /// Tick at which the pending cooldown runs out, if any.
    pub fn cooldown_until(&self) -> Option<u64> {
        self.cooldown.until()
    }

    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }

    /// Block mating until `current_tick + interval`.
    pub fn schedule_cooldown(&mut self, current_tick: u64, interval: u64) {
        self.cooldown.schedule(current_tick, interval);
    }

    /// Advance local state. Only the cooldown may restore eligibility.
    pub fn tick(&mut self, current_tick: u64) {
        if self.cooldown.expire(current_tick) {
            log::trace!("{} may mate again at tick {}", self.id, current_tick);
        }
    }

    /// Drift until slow, then re-accelerate: a fresh random impulse bounded
    /// by `max_velocity` once speed drops under `rest_speed`, otherwise none.
    pub fn intended_motion<R: Rng + ?Sized>(&self, rng: &mut R, rest_speed: f64) -> Vector {
        if self.velocity.length() < rest_speed {
            random_velocity(rng, self.traits.max_velocity)
        } else {
            Vector::ZERO
        }
    }

    /// Apply an impulse, damp, move by one time step and bounce off the world edge.
    pub fn integrate(&mut self, impulse: Vector, damping: f64, time_step: f64, bounds: Bounds) {
        self.velocity += impulse;
        self.velocity = self.velocity * (1.0 - damping);
        self.position += self.velocity * time_step;
        bounds.reflect(&mut self.position, &mut self.velocity, self.traits.size);
    }

    /// Spawn a child next to `self`, cloning this cell's traits.
    ///
    /// All three cells go on cooldown for their own mating interval.
    pub fn offspring(&mut self, mate: &mut Cell, id: CellId, current_tick: u64) -> Cell {
        let offset = Vector::new(self.traits.size, self.traits.size);
        let mut child = Cell::new(id, self.traits.clone(), self.position + offset, current_tick);
        child.generation = self.generation.max(mate.generation) + 1;

        self.schedule_cooldown(current_tick, self.traits.mating_interval);
        mate.schedule_cooldown(current_tick, mate.traits.mating_interval);
        child.schedule_cooldown(current_tick, child.traits.mating_interval);

        child
    }
}
