//! Configuration for a simulation run.
//!
//! Loaded from YAML; every section has defaults. Mating intervals are given
//! in seconds here and converted to ticks before they reach the core.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::contact::{ContactResolver, TieBreak};
use crate::error::{Result, SimError};
use crate::genetics::{TraitRange, TraitRanges};
use crate::vector::Bounds;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub traits: TraitConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// RNG seed; drawn at random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    /// Distance from the edge kept free when placing seeded cells
    pub margin: f64,
    pub initial_population: usize,
    /// Offspring beyond this many live cells are not born
    pub max_population: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitConfig {
    pub strength: TraitRange,
    pub max_velocity: TraitRange,
    pub sight: TraitRange,
    pub mating_interval_secs: TraitRange,
    pub size_min: f64,
    pub size_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub ticks_per_second: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Speed below which a cell picks a new impulse
    pub rest_speed: f64,
    /// Fraction of velocity lost per tick
    pub damping: f64,
    /// Seconds of motion integrated per tick
    pub time_step: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    pub tie_break: TieBreak,
    pub require_opposite_gender: bool,
    /// Bucket edge length of the broad-phase grid
    pub grid_cell_size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Ticks between stats lines
    pub stats_interval: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
            margin: 10.0,
            initial_population: 200,
            max_population: 5000,
        }
    }
}

impl Default for TraitConfig {
    fn default() -> Self {
        let ranges = TraitRanges::default();
        Self {
            strength: ranges.strength,
            max_velocity: ranges.max_velocity,
            sight: ranges.sight,
            mating_interval_secs: TraitRange::new(3, 30),
            size_min: ranges.size_min,
            size_max: ranges.size_max,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { ticks_per_second: 60 }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            rest_speed: 50.0,
            damping: 0.1,
            time_step: 1.0 / 60.0,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::MutualKill,
            require_opposite_gender: true,
            grid_cell_size: 16.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval: 60,
        }
    }
}

impl TimingConfig {
    pub fn seconds_to_ticks(&self, seconds: u32) -> u32 {
        seconds.saturating_mul(self.ticks_per_second)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.world.width, self.world.height)
    }

    /// Generator ranges with mating intervals converted to ticks.
    pub fn trait_ranges(&self) -> TraitRanges {
        let secs = self.traits.mating_interval_secs;
        TraitRanges {
            strength: self.traits.strength,
            max_velocity: self.traits.max_velocity,
            sight: self.traits.sight,
            mating_interval: TraitRange::new(
                self.timing.seconds_to_ticks(secs.min),
                self.timing.seconds_to_ticks(secs.max),
            ),
            size_min: self.traits.size_min,
            size_max: self.traits.size_max,
        }
    }

    pub fn resolver(&self) -> ContactResolver {
        ContactResolver::new(self.contact.tie_break, self.contact.require_opposite_gender)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if !(world.width > 0.0 && world.height > 0.0) {
            return Err(invalid("world width and height must be positive"));
        }
        if world.margin < 0.0 || 2.0 * world.margin >= world.width.min(world.height) {
            return Err(invalid("margin leaves no room inside the world"));
        }
        if 2.0 * self.traits.size_max >= world.width.min(world.height) {
            return Err(invalid("world is too small for the largest cell"));
        }
        if world.initial_population == 0 {
            return Err(invalid("initial_population must be > 0"));
        }
        if world.initial_population > world.max_population {
            return Err(invalid("initial_population cannot exceed max_population"));
        }
        if self.timing.ticks_per_second == 0 {
            return Err(invalid("ticks_per_second must be > 0"));
        }
        self.traits.mating_interval_secs.validate()?;
        self.trait_ranges().validate()?;
        if !(self.motion.time_step > 0.0) {
            return Err(invalid("time_step must be positive"));
        }
        if !(0.0..1.0).contains(&self.motion.damping) {
            return Err(invalid("damping must lie in [0, 1)"));
        }
        if self.motion.rest_speed < 0.0 {
            return Err(invalid("rest_speed must not be negative"));
        }
        if !(self.contact.grid_cell_size > 0.0) {
            return Err(invalid("grid_cell_size must be positive"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> SimError {
    SimError::InvalidConfig(message.to_string())
}
