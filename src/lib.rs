//! Cellule: a population of cells that drift around a bounded world, fight
//! cells of other species on contact and mate with their own kind.
//!
//! The crate is the simulation core. Rendering and input live in the host
//! (see the `cellule` binary); they talk to the core through
//! [`Population`] and [`PopulationObserver`].

pub mod cell;
pub mod config;
pub mod contact;
pub mod cooldown;
pub mod error;
pub mod genetics;
pub mod observer;
pub mod population;
pub mod random;
pub mod simulation_stats;
pub mod spatial;
pub mod vector;

pub use cell::{Cell, CellId};
pub use config::Config;
pub use contact::{ContactPair, ContactResolver, Outcome, TieBreak};
pub use cooldown::MatingCooldown;
pub use error::{Result, SimError};
pub use genetics::{Gender, Movement, Species, TraitGenerator, TraitRange, TraitRanges, Traits};
pub use observer::PopulationObserver;
pub use population::{Population, TickReport};
pub use simulation_stats::SimulationStats;
pub use spatial::{SpatialIndex, UniformGrid};
pub use vector::{Bounds, Vector};
