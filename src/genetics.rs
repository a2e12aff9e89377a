use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::random::range_inclusive;

/// Fixed species enumeration. Doubles as the contact category key:
/// different species fight, equal species may mate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Red,
    Blue,
    Green,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Red, Species::Blue, Species::Green];

    pub fn from_index(index: usize) -> Result<Species> {
        Species::ALL
            .get(index)
            .copied()
            .ok_or(SimError::UnknownSpecies(index))
    }

    pub fn index(self) -> usize {
        match self {
            Species::Red => 0,
            Species::Blue => 1,
            Species::Green => 2,
        }
    }

    /// Collision category bit, one per species.
    pub fn category_bit(self) -> u32 {
        1 << self.index()
    }

    /// RGBA colour for renderers.
    pub fn color(self) -> [f32; 4] {
        match self {
            Species::Red => [1.0, 0.39, 0.28, 1.0],
            Species::Blue => [0.32, 0.69, 0.93, 1.0],
            Species::Green => [0.29, 0.94, 0.62, 1.0],
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Species {
        Species::ALL[rng.random_range(0..Species::ALL.len())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Gender {
        if rng.random_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

/// Easing profile a renderer may use when animating a cell. The core only
/// copies it from parent to offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Movement {
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    QuarticIn,
    QuarticOut,
    QuarticInOut,
    QuinticIn,
    QuinticOut,
    QuinticInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    ExponentialIn,
    ExponentialOut,
    ExponentialInOut,
    CircularIn,
    CircularOut,
    CircularInOut,
    BackOut,
}

impl Movement {
    pub const ALL: [Movement; 20] = [
        Movement::Linear,
        Movement::QuadraticIn,
        Movement::QuadraticOut,
        Movement::QuadraticInOut,
        Movement::QuarticIn,
        Movement::QuarticOut,
        Movement::QuarticInOut,
        Movement::QuinticIn,
        Movement::QuinticOut,
        Movement::QuinticInOut,
        Movement::CubicIn,
        Movement::CubicOut,
        Movement::CubicInOut,
        Movement::ExponentialIn,
        Movement::ExponentialOut,
        Movement::ExponentialInOut,
        Movement::CircularIn,
        Movement::CircularOut,
        Movement::CircularInOut,
        Movement::BackOut,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Movement {
        Movement::ALL[rng.random_range(0..Movement::ALL.len())]
    }
}

/// Immutable trait bundle of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    pub species: Species,
    /// Combat comparator.
    pub strength: u32,
    /// Cap on the magnitude of a re-acceleration impulse.
    pub max_velocity: u32,
    /// Radius, derived from strength.
    pub size: f64,
    /// Perception radius.
    pub sight: u32,
    pub movement: Movement,
    pub gender: Gender,
    /// Cooldown length in ticks after mating.
    pub mating_interval: u64,
}

/// Inclusive integer range for a numeric trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitRange {
    pub min: u32,
    pub max: u32,
}

impl TraitRange {
    pub const fn new(min: u32, max: u32) -> Self {
        TraitRange { min, max }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max < self.min {
            return Err(SimError::InvalidRange {
                lower: i64::from(self.min),
                upper: i64::from(self.max),
            });
        }
        Ok(())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<u32> {
        let value = range_inclusive(rng, i64::from(self.min), i64::from(self.max))?;
        // within [min, max], so it fits
        Ok(value as u32)
    }
}

/// Ranges the generator draws from. Mating intervals are in ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitRanges {
    pub strength: TraitRange,
    pub max_velocity: TraitRange,
    pub sight: TraitRange,
    pub mating_interval: TraitRange,
    pub size_min: f64,
    pub size_max: f64,
}

impl Default for TraitRanges {
    fn default() -> Self {
        Self {
            strength: TraitRange::new(10, 50),
            max_velocity: TraitRange::new(1, 200),
            sight: TraitRange::new(1, 100),
            mating_interval: TraitRange::new(3, 30),
            size_min: 2.0,
            size_max: 5.0,
        }
    }
}

impl TraitRanges {
    pub fn validate(&self) -> Result<()> {
        self.strength.validate()?;
        self.max_velocity.validate()?;
        self.sight.validate()?;
        self.mating_interval.validate()?;
        if !(self.size_min > 0.0 && self.size_min <= self.size_max) {
            return Err(SimError::InvalidConfig(format!(
                "size range [{}, {}] is empty or non-positive",
                self.size_min, self.size_max
            )));
        }
        Ok(())
    }

    pub fn size_for(&self, strength: u32) -> f64 {
        (f64::from(strength) / 10.0).clamp(self.size_min, self.size_max)
    }
}

/// Produces randomized trait bundles within validated ranges.
#[derive(Debug, Clone)]
pub struct TraitGenerator {
    ranges: TraitRanges,
}

impl TraitGenerator {
    pub fn new(ranges: TraitRanges) -> Result<Self> {
        ranges.validate()?;
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &TraitRanges {
        &self.ranges
    }

    /// Draw a new bundle. Without a species hint the species is uniform.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        species: Option<Species>,
    ) -> Result<Traits> {
        let species = species.unwrap_or_else(|| Species::random(rng));
        let strength = self.ranges.strength.sample(rng)?;
        let max_velocity = self.ranges.max_velocity.sample(rng)?;
        let sight = self.ranges.sight.sample(rng)?;
        let mating_interval = u64::from(self.ranges.mating_interval.sample(rng)?);

        Ok(Traits {
            species,
            strength,
            max_velocity,
            size: self.ranges.size_for(strength),
            sight,
            movement: Movement::random(rng),
            gender: Gender::random(rng),
            mating_interval,
        })
    }
}
