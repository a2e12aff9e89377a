//! Error taxonomy for the simulation core.

use thiserror::Error;

/// Errors raised by the simulation.
///
/// Every variant describes a misconfigured simulation or a broken input
/// contract. Removing a cell twice is deliberately absent: it is a no-op.
#[derive(Debug, Error)]
pub enum SimError {
    /// An inclusive random range was requested with `upper < lower`.
    #[error("invalid range: upper bound {upper} is below lower bound {lower}")]
    InvalidRange { lower: i64, upper: i64 },

    /// A species index outside the fixed enumeration.
    #[error("unknown species index {0}")]
    UnknownSpecies(usize),

    /// A position outside the world rectangle.
    #[error("position ({x}, {y}) lies outside the world")]
    OutOfBounds { x: f64, y: f64 },

    /// A cell whose id is already registered.
    #[error("{0} is already registered")]
    DuplicateCell(crate::cell::CellId),

    /// A removed (dead) cell handed back to the registry.
    #[error("{0} is dead and cannot be registered")]
    DeadCell(crate::cell::CellId),

    /// No id is left above this one; `u64::MAX` is never a valid id.
    #[error("cell id space exhausted at {0}")]
    IdSpaceExhausted(crate::cell::CellId),

    /// Configuration values that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
