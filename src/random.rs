//! Random helpers shared by trait generation and motion.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, SimError};
use crate::vector::Vector;

/// Random source owned by the population. Seeded for reproducibility.
pub type SimRng = ChaCha8Rng;

pub fn seeded(seed: u64) -> SimRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Uniform integer in `[lower, upper]`, both ends included.
///
/// An inverted range is a contract violation and fails instead of wrapping.
pub fn range_inclusive<R: Rng + ?Sized>(rng: &mut R, lower: i64, upper: i64) -> Result<i64> {
    if upper < lower {
        return Err(SimError::InvalidRange { lower, upper });
    }
    Ok(rng.random_range(lower..=upper))
}

/// Impulse with each component drawn from `[-magnitude, magnitude]`.
pub fn random_velocity<R: Rng + ?Sized>(rng: &mut R, magnitude: u32) -> Vector {
    let r = i64::from(magnitude);
    // -r..=r can never be inverted
    let x = rng.random_range(-r..=r);
    let y = rng.random_range(-r..=r);
    Vector::new(x as f64, y as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_stays_within_bounds() {
        let mut rng = seeded(7);
        for _ in 0..10_000 {
            let value = range_inclusive(&mut rng, 10, 50).unwrap();
            assert!((10..=50).contains(&value));
        }
    }

    #[test]
    fn test_range_hits_both_ends() {
        let mut rng = seeded(11);
        let draws: Vec<i64> = (0..2_000)
            .map(|_| range_inclusive(&mut rng, 0, 3).unwrap())
            .collect();
        assert!(draws.contains(&0));
        assert!(draws.contains(&3));
    }

    #[test]
    fn test_single_point_range() {
        let mut rng = seeded(3);
        assert_eq!(range_inclusive(&mut rng, 5, 5).unwrap(), 5);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let mut rng = seeded(3);
        let err = range_inclusive(&mut rng, 30, 3).unwrap_err();
        assert!(matches!(err, SimError::InvalidRange { lower: 30, upper: 3 }));
    }

    #[test]
    fn test_random_velocity_bounded() {
        let mut rng = seeded(19);
        for _ in 0..1_000 {
            let v = random_velocity(&mut rng, 200);
            assert!(v.x.abs() <= 200.0 && v.y.abs() <= 200.0);
        }
        assert_eq!(random_velocity(&mut rng, 0), Vector::ZERO);
    }
}
