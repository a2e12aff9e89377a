//! Broad-phase contact detection.
//!
//! The population keeps the index in sync with its registry and asks it for
//! the touching pairs of the current tick.

use rayon::prelude::*;
use std::collections::HashMap;

use crate::cell::CellId;
use crate::contact::ContactPair;
use crate::error::{Result, SimError};
use crate::vector::Vector;

/// Common behaviour of contact indices.
pub trait SpatialIndex {
    /// Insert or replace the disc tracked for `id`.
    fn insert(&mut self, id: CellId, position: Vector, radius: f64);

    /// Move an already tracked disc. Unknown ids are ignored.
    fn update(&mut self, id: CellId, position: Vector);

    /// Stop tracking `id`. Returns false when it was not tracked.
    fn remove(&mut self, id: CellId) -> bool;

    fn contains(&self, id: CellId) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every pair whose discs touch, lower id first, sorted.
    fn contact_pairs(&self) -> Vec<ContactPair>;
}

type Bucket = (i64, i64);

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: CellId,
    position: Vector,
    radius: f64,
}

/// Uniform bucket grid. Discs touch when their centre distance is at most
/// the sum of their radii.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    cell_size: f64,
    entries: HashMap<CellId, Entry>,
}

impl UniformGrid {
    pub fn new(cell_size: f64) -> Result<Self> {
        if !(cell_size > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "grid cell_size must be positive, got {cell_size}"
            )));
        }
        Ok(Self {
            cell_size,
            entries: HashMap::new(),
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn bucket(&self, position: Vector) -> Bucket {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
        )
    }

    fn pairs_for(
        &self,
        entry: &Entry,
        buckets: &HashMap<Bucket, Vec<Entry>>,
        reach: i64,
    ) -> Vec<ContactPair> {
        let (bx, by) = self.bucket(entry.position);
        let mut pairs = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                let Some(neighbours) = buckets.get(&(bx + dx, by + dy)) else {
                    continue;
                };
                for other in neighbours {
                    if other.id <= entry.id {
                        continue;
                    }
                    let limit = entry.radius + other.radius;
                    if entry.position.distance_to(other.position) <= limit {
                        pairs.push(ContactPair::new(entry.id, other.id));
                    }
                }
            }
        }
        pairs
    }
}

impl SpatialIndex for UniformGrid {
    fn insert(&mut self, id: CellId, position: Vector, radius: f64) {
        self.entries.insert(id, Entry { id, position, radius });
    }

    fn update(&mut self, id: CellId, position: Vector) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.position = position;
        }
    }

    fn remove(&mut self, id: CellId) -> bool {
        self.entries.remove(&id).is_some()
    }

    fn contains(&self, id: CellId) -> bool {
        self.entries.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contact_pairs(&self) -> Vec<ContactPair> {
        let mut buckets: HashMap<Bucket, Vec<Entry>> = HashMap::new();
        let mut max_radius: f64 = 0.0;
        for entry in self.entries.values() {
            buckets.entry(self.bucket(entry.position)).or_default().push(*entry);
            max_radius = max_radius.max(entry.radius);
        }
        // neighbouring buckets needed to cover the widest possible contact
        let reach = ((2.0 * max_radius) / self.cell_size).ceil().max(1.0) as i64;

        let entries: Vec<&Entry> = self.entries.values().collect();
        let mut pairs: Vec<ContactPair> = entries
            .par_iter()
            .flat_map(|entry| self.pairs_for(entry, &buckets, reach))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}
