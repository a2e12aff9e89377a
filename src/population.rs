//! The population registry and its tick loop.
//!
//! A tick runs in fixed phases:
//! 1. every cell ticks its cooldown and moves,
//! 2. each contact pair is resolved against that snapshot,
//! 3. combat losses are removed,
//! 4. surviving matings produce offspring,
//! 5. the tick counter advances.
//!
//! Phases 3 and 4 only start once the pair scan is done, so the registry is
//! never changed while pairs are still being read.

use rand::Rng;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::cell::{Cell, CellId};
use crate::config::{Config, MotionConfig};
use crate::contact::{ContactPair, ContactResolver, Outcome};
use crate::error::{Result, SimError};
use crate::genetics::{Species, TraitGenerator};
use crate::observer::PopulationObserver;
use crate::random::{self, SimRng};
use crate::simulation_stats::SimulationStats;
use crate::spatial::{SpatialIndex, UniformGrid};
use crate::vector::{Bounds, Vector};

/// What a single tick changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub contacts: usize,
    pub births: Vec<CellId>,
    pub deaths: Vec<CellId>,
    /// Matings dropped at apply time: a parent died, was already used this
    /// tick, or the population cap was reached.
    pub matings_skipped: usize,
}

pub struct Population<S: SpatialIndex = UniformGrid> {
    cells: BTreeMap<CellId, Cell>,
    index: S,
    tick: u64,
    next_id: u64,
    rng: SimRng,
    seed: u64,
    generator: TraitGenerator,
    resolver: ContactResolver,
    bounds: Bounds,
    margin: f64,
    max_population: usize,
    motion: MotionConfig,
    stats_interval: u64,
    stats: SimulationStats,
    observers: Vec<Box<dyn PopulationObserver>>,
}

impl Population<UniformGrid> {
    /// Empty population using the uniform grid broad phase.
    pub fn new(config: &Config) -> Result<Self> {
        let index = UniformGrid::new(config.contact.grid_cell_size)?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::with_index(config, index, seed)
    }

    /// Build and seed `config.world.initial_population` cells.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut population = Self::new(config)?;
        population.seed(config.world.initial_population)?;
        Ok(population)
    }
}

impl<S: SpatialIndex> Population<S> {
    pub fn with_index(config: &Config, index: S, seed: u64) -> Result<Self> {
        config.validate()?;
        if !index.is_empty() {
            return Err(SimError::InvalidConfig(
                "spatial index must start empty".to_string(),
            ));
        }
        log::debug!("population created with seed {}", seed);
        Ok(Self {
            cells: BTreeMap::new(),
            index,
            tick: 0,
            next_id: 0,
            rng: random::seeded(seed),
            seed,
            generator: TraitGenerator::new(config.trait_ranges())?,
            resolver: config.resolver(),
            bounds: config.bounds(),
            margin: config.world.margin,
            max_population: config.world.max_population,
            motion: config.motion.clone(),
            stats_interval: config.logging.stats_interval,
            stats: SimulationStats::new(),
            observers: Vec::new(),
        })
    }

    pub fn add_observer(&mut self, observer: Box<dyn PopulationObserver>) {
        self.observers.push(observer);
    }

    /// Create `n` cells of random species at uniformly sampled positions,
    /// each coordinate within `[margin, dimension - margin]`.
    pub fn seed(&mut self, n: usize) -> Result<Vec<CellId>> {
        let (margin, bounds) = (self.margin, self.bounds);
        self.seed_with(n, |rng| {
            Vector::new(
                rng.random_range(margin..=bounds.width - margin),
                rng.random_range(margin..=bounds.height - margin),
            )
        })
    }

    /// Like [`Population::seed`] with a caller supplied position sampler.
    pub fn seed_with<F>(&mut self, n: usize, mut sampler: F) -> Result<Vec<CellId>>
    where
        F: FnMut(&mut SimRng) -> Vector,
    {
        let mut ids = Vec::with_capacity(n);
        for _ in 0..n {
            let position = sampler(&mut self.rng);
            ids.push(self.spawn_at(position, None)?);
        }
        log::debug!("seeded {} cells", n);
        Ok(ids)
    }

    /// Create one cell at `position`, e.g. in response to an input event.
    pub fn spawn_at(&mut self, position: Vector, species: Option<Species>) -> Result<CellId> {
        if !self.bounds.contains(position, 0.0) {
            return Err(SimError::OutOfBounds {
                x: position.x,
                y: position.y,
            });
        }
        let traits = self.generator.generate(&mut self.rng, species)?;
        let id = self.allocate_id()?;
        self.add(Cell::new(id, traits, position, self.tick))
    }

    /// Register a live cell in the registry and the spatial index.
    ///
    /// Nothing is touched when the cell is dead, its id is taken, or its id
    /// leaves no room for the next one.
    pub fn add(&mut self, cell: Cell) -> Result<CellId> {
        let id = cell.id();
        if !cell.is_alive() {
            return Err(SimError::DeadCell(id));
        }
        let next = id.0.checked_add(1).ok_or(SimError::IdSpaceExhausted(id))?;
        let Entry::Vacant(slot) = self.cells.entry(id) else {
            return Err(SimError::DuplicateCell(id));
        };
        self.next_id = self.next_id.max(next);
        self.index.insert(id, cell.position, cell.size());
        log::debug!("{} added ({:?}) at tick {}", id, cell.species(), self.tick);

        let cell = slot.insert(cell);
        for observer in &mut self.observers {
            observer.on_cell_added(cell);
        }
        self.stats.record_peak(self.cells.len());
        Ok(id)
    }

    /// Drop a cell from the registry and the spatial index.
    ///
    /// Removing a cell that is already gone is a no-op returning `None`.
    pub fn remove(&mut self, id: CellId) -> Option<Cell> {
        let Some(mut cell) = self.cells.remove(&id) else {
            log::debug!("{} already removed", id);
            return None;
        };
        self.index.remove(id);
        cell.kill();
        for observer in &mut self.observers {
            observer.on_cell_removed(&cell);
        }
        log::debug!("{} removed at tick {}", id, self.tick);
        Some(cell)
    }

    /// Advance one tick using contact pairs reported by an external index.
    pub fn tick(&mut self, pairs: &[ContactPair]) -> TickReport {
        self.advance();
        let outcomes = self.resolve(pairs);
        let report = self.apply(pairs.len(), outcomes);
        self.finish(report)
    }

    /// Advance one tick, querying the owned index for contacts after motion.
    pub fn step(&mut self) -> TickReport {
        self.advance();
        let pairs = self.index.contact_pairs();
        let outcomes = self.resolve(&pairs);
        let report = self.apply(pairs.len(), outcomes);
        self.finish(report)
    }

    /// Run `ticks` self-contained steps.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    fn allocate_id(&mut self) -> Result<CellId> {
        let id = CellId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(SimError::IdSpaceExhausted(id))?;
        Ok(id)
    }

    fn advance(&mut self) {
        let current = self.tick;
        let MotionConfig {
            rest_speed,
            damping,
            time_step,
        } = self.motion;
        for cell in self.cells.values_mut() {
            cell.tick(current);
            let impulse = cell.intended_motion(&mut self.rng, rest_speed);
            cell.integrate(impulse, damping, time_step, self.bounds);
            self.index.update(cell.id(), cell.position);
        }
    }

    fn resolve(&self, pairs: &[ContactPair]) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        for pair in pairs {
            if pair.a == pair.b {
                continue;
            }
            let (Some(a), Some(b)) = (self.cells.get(&pair.a), self.cells.get(&pair.b)) else {
                log::warn!(
                    "tick {}: contact {} / {} references an unknown cell",
                    self.tick,
                    pair.a,
                    pair.b
                );
                continue;
            };
            match self.resolver.resolve(a, b, self.tick) {
                Outcome::None => {}
                outcome => outcomes.push(outcome),
            }
        }
        outcomes
    }

    fn apply(&mut self, contacts: usize, outcomes: Vec<Outcome>) -> TickReport {
        let mut report = TickReport {
            tick: self.tick,
            contacts,
            ..TickReport::default()
        };

        for outcome in &outcomes {
            for id in outcome.casualties() {
                if self.remove(id).is_some() {
                    report.deaths.push(id);
                    if matches!(outcome, Outcome::MutualKill(..)) {
                        self.stats.mutual_kills += 1;
                    }
                }
            }
        }

        for outcome in &outcomes {
            if let Outcome::Mating { initiator, mate } = *outcome {
                match self.mate(initiator, mate) {
                    Some(child) => report.births.push(child),
                    None => report.matings_skipped += 1,
                }
            }
        }

        self.stats.total_deaths += report.deaths.len();
        self.stats.total_births += report.births.len();
        self.stats.matings_skipped += report.matings_skipped;
        report
    }

    // Eligibility is checked again here: a parent may have died or mated
    // earlier in the same apply pass.
    fn mate(&mut self, initiator: CellId, mate: CellId) -> Option<CellId> {
        if self.cells.len() >= self.max_population {
            log::debug!("population cap {} reached, no offspring", self.max_population);
            return None;
        }
        // both parents leave the map while the child is made; ineligible
        // ones go straight back
        let pair = (self.cells.remove(&initiator), self.cells.remove(&mate));
        let (mut parent, mut partner) = match pair {
            (Some(parent), Some(partner)) if parent.can_mate() && partner.can_mate() => {
                (parent, partner)
            }
            (parent, partner) => {
                for cell in [parent, partner].into_iter().flatten() {
                    self.cells.insert(cell.id(), cell);
                }
                return None;
            }
        };

        let tick = self.tick;
        let child = self
            .allocate_id()
            .ok()
            .map(|id| parent.offspring(&mut partner, id, tick));
        self.cells.insert(initiator, parent);
        self.cells.insert(mate, partner);
        let Some(mut child) = child else {
            log::warn!("no id left for offspring of {} and {}", initiator, mate);
            return None;
        };
        log::debug!("{} born to {} and {}", child.id(), initiator, mate);

        // the placement offset can push the child past the edge
        let radius = child.size();
        self.bounds.reflect(&mut child.position, &mut child.velocity, radius);

        self.add(child).ok()
    }

    fn finish(&mut self, report: TickReport) -> TickReport {
        self.stats.record_population(self.cells.len());
        if self.stats_interval > 0 && self.tick % self.stats_interval == 0 {
            let census = self.census();
            log::info!(
                "tick {}: population {} (R:{} B:{} G:{}) births {} deaths {}",
                self.tick,
                self.cells.len(),
                census[Species::Red.index()],
                census[Species::Blue.index()],
                census[Species::Green.index()],
                self.stats.total_births,
                self.stats.total_deaths,
            );
        }
        self.tick += 1;
        report
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Ticks completed so far.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn seed_value(&self) -> u64 {
        self.seed
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn index(&self) -> &S {
        &self.index
    }

    /// Live cells per species, indexed by [`Species::index`].
    pub fn census(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for cell in self.cells.values() {
            counts[cell.species().index()] += 1;
        }
        counts
    }

    /// Registry and spatial index hold exactly the same cells.
    pub fn is_consistent(&self) -> bool {
        self.index.len() == self.cells.len()
            && self.cells.keys().all(|id| self.index.contains(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::tests::{cell, traits};
    use crate::genetics::Gender;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config() -> Config {
        let mut config = Config::default();
        config.seed = Some(1234);
        config.world.initial_population = 10;
        config.logging.stats_interval = 0;
        config
    }

    fn population() -> Population {
        Population::new(&config()).unwrap()
    }

    fn place(
        pop: &mut Population,
        species: Species,
        strength: u32,
        gender: Gender,
        x: f64,
    ) -> CellId {
        let id = pop.allocate_id().unwrap();
        let mut cell = Cell::new(id, traits(species, strength, gender), Vector::new(x, 300.0), 0);
        cell.velocity = Vector::new(500.0, 0.0);
        pop.add(cell).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        added: Vec<CellId>,
        removed: Vec<CellId>,
    }

    impl PopulationObserver for Recorder {
        fn on_cell_added(&mut self, cell: &Cell) {
            self.added.push(cell.id());
        }

        fn on_cell_removed(&mut self, cell: &Cell) {
            self.removed.push(cell.id());
        }
    }

    #[test]
    fn test_seed_200_within_bounds() {
        let mut pop = population();
        let ids = pop.seed(200).unwrap();
        assert_eq!(ids.len(), 200);
        assert_eq!(pop.len(), 200);
        for cell in pop.cells() {
            assert!(cell.position.x >= 10.0 && cell.position.x <= 1024.0 - 10.0);
            assert!(cell.position.y >= 10.0 && cell.position.y <= 768.0 - 10.0);
        }
        assert!(pop.is_consistent());
        assert_eq!(pop.stats().max_population, 200);
    }

    #[test]
    fn test_spawn_at_position_and_species() {
        let mut pop = population();
        let id = pop.spawn_at(Vector::new(40.0, 50.0), Some(Species::Blue)).unwrap();
        let cell = pop.get(id).unwrap();
        assert_eq!(cell.position, Vector::new(40.0, 50.0));
        assert_eq!(cell.species(), Species::Blue);
    }

    #[test]
    fn test_spawn_outside_world_fails() {
        let mut pop = population();
        let err = pop.spawn_at(Vector::new(-1.0, 50.0), None).unwrap_err();
        assert!(matches!(err, SimError::OutOfBounds { .. }));
        assert!(pop.is_empty());
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let mut pop = population();
        let id = place(&mut pop, Species::Red, 20, Gender::Male, 100.0);
        let copy = pop.get(id).unwrap().clone();
        assert!(matches!(pop.add(copy), Err(SimError::DuplicateCell(_))));
        assert_eq!(pop.len(), 1);
    }

    #[test]
    fn test_removed_cell_cannot_be_added_back() {
        let mut pop = population();
        let id = place(&mut pop, Species::Red, 20, Gender::Male, 100.0);
        let removed = pop.remove(id).unwrap();

        assert!(matches!(pop.add(removed), Err(SimError::DeadCell(dead)) if dead == id));
        assert!(pop.is_empty());
        assert!(!pop.contains(id));
        assert!(pop.is_consistent());
    }

    #[test]
    fn test_last_id_rejected() {
        let mut pop = population();
        let last = cell(u64::MAX, Species::Green, 20, Gender::Female);
        assert!(matches!(pop.add(last), Err(SimError::IdSpaceExhausted(_))));
        assert!(pop.is_empty());
        assert!(pop.index().is_empty());

        let id = pop.add(cell(u64::MAX - 1, Species::Green, 20, Gender::Male)).unwrap();
        assert_eq!(id, CellId(u64::MAX - 1));
        let spawned = pop.spawn_at(Vector::new(50.0, 50.0), None);
        assert!(matches!(spawned, Err(SimError::IdSpaceExhausted(_))));
        assert_eq!(pop.len(), 1);
        assert!(pop.is_consistent());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut pop = population();
        pop.seed(5).unwrap();
        let id = pop.cells().next().unwrap().id();

        let removed = pop.remove(id).unwrap();
        assert!(!removed.is_alive());
        let len = pop.len();
        assert!(pop.remove(id).is_none());
        assert_eq!(pop.len(), len);
        assert_eq!(len, 4);
        assert!(pop.is_consistent());
    }

    #[test]
    fn test_combat_removes_weaker() {
        let mut pop = population();
        let red = place(&mut pop, Species::Red, 40, Gender::Male, 100.0);
        let blue = place(&mut pop, Species::Blue, 10, Gender::Male, 103.0);

        let report = pop.tick(&[ContactPair::new(red, blue)]);
        assert_eq!(report.deaths, vec![blue]);
        assert!(pop.contains(red));
        assert!(!pop.contains(blue));
        assert!(!pop.index().contains(blue));
    }

    #[test]
    fn test_equal_strength_mutual_kill() {
        let mut pop = population();
        let red = place(&mut pop, Species::Red, 30, Gender::Male, 100.0);
        let green = place(&mut pop, Species::Green, 30, Gender::Male, 103.0);

        let report = pop.tick(&[ContactPair::new(red, green)]);
        assert_eq!(report.deaths.len(), 2);
        assert!(pop.is_empty());
        assert_eq!(pop.stats().mutual_kills, 2);
    }

    #[test]
    fn test_loser_of_two_fights_removed_once() {
        let mut pop = population();
        let weak = place(&mut pop, Species::Blue, 10, Gender::Male, 100.0);
        let red = place(&mut pop, Species::Red, 40, Gender::Male, 103.0);
        let green = place(&mut pop, Species::Green, 45, Gender::Male, 97.0);

        let report = pop.tick(&[ContactPair::new(weak, red), ContactPair::new(green, weak)]);
        assert_eq!(report.deaths, vec![weak]);
        assert_eq!(pop.len(), 2);
        assert_eq!(pop.stats().total_deaths, 1);
    }

    #[test]
    fn test_mating_adds_exactly_one() {
        let mut pop = population();
        let a = place(&mut pop, Species::Green, 30, Gender::Male, 100.0);
        let b = place(&mut pop, Species::Green, 20, Gender::Female, 103.0);

        let report = pop.tick(&[ContactPair::new(a, b)]);
        assert_eq!(report.births.len(), 1);
        assert_eq!(pop.len(), 3);
        assert!(!pop.get(a).unwrap().can_mate());
        assert!(!pop.get(b).unwrap().can_mate());

        let child = pop.get(report.births[0]).unwrap();
        assert!(!child.can_mate());
        assert_eq!(child.traits(), pop.get(a).unwrap().traits());
        assert!(pop.is_consistent());
    }

    #[test]
    fn test_cooldown_expires_after_interval() {
        let mut pop = population();
        let a = place(&mut pop, Species::Green, 30, Gender::Male, 100.0);
        let b = place(&mut pop, Species::Green, 20, Gender::Female, 103.0);

        // mating at tick 0, interval 10
        pop.tick(&[ContactPair::new(a, b)]);
        for _ in 1..10 {
            let report = pop.tick(&[ContactPair::new(a, b)]);
            assert!(report.births.is_empty());
            assert!(!pop.get(a).unwrap().can_mate());
        }
        assert_eq!(pop.current_tick(), 10);

        let report = pop.tick(&[ContactPair::new(a, b)]);
        assert_eq!(report.births.len(), 1);
        assert_eq!(pop.len(), 4);
    }

    #[test]
    fn test_cell_mates_once_per_tick() {
        let mut pop = population();
        let male = place(&mut pop, Species::Red, 30, Gender::Male, 100.0);
        let f1 = place(&mut pop, Species::Red, 30, Gender::Female, 103.0);
        let f2 = place(&mut pop, Species::Red, 30, Gender::Female, 97.0);

        let report = pop.tick(&[ContactPair::new(male, f1), ContactPair::new(male, f2)]);
        assert_eq!(report.births.len(), 1);
        assert_eq!(report.matings_skipped, 1);
        assert!(pop.get(f2).unwrap().can_mate());

        // the skipped mating used no id
        assert_eq!(report.births, vec![CellId(3)]);
        let next = pop.spawn_at(Vector::new(500.0, 500.0), None).unwrap();
        assert_eq!(next, CellId(4));
    }

    #[test]
    fn test_dead_cell_does_not_mate() {
        let mut pop = population();
        let male = place(&mut pop, Species::Red, 10, Gender::Male, 100.0);
        let female = place(&mut pop, Species::Red, 30, Gender::Female, 103.0);
        let blue = place(&mut pop, Species::Blue, 40, Gender::Male, 97.0);

        let report = pop.tick(&[ContactPair::new(male, female), ContactPair::new(blue, male)]);
        assert_eq!(report.deaths, vec![male]);
        assert!(report.births.is_empty());
        assert!(pop.get(female).unwrap().can_mate());
    }

    #[test]
    fn test_unknown_pair_ignored() {
        let mut pop = population();
        let a = place(&mut pop, Species::Red, 10, Gender::Male, 100.0);
        let report = pop.tick(&[ContactPair::new(a, CellId(999)), ContactPair::new(a, a)]);
        assert!(report.deaths.is_empty());
        assert_eq!(pop.len(), 1);
        assert_eq!(pop.current_tick(), 1);
    }

    #[test]
    fn test_observer_sees_adds_and_removals() {
        let mut pop = population();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        pop.add_observer(Box::new(Rc::clone(&recorder)));

        let red = place(&mut pop, Species::Red, 40, Gender::Male, 100.0);
        let blue = place(&mut pop, Species::Blue, 10, Gender::Male, 103.0);
        pop.tick(&[ContactPair::new(red, blue)]);

        assert_eq!(recorder.borrow().added, vec![red, blue]);
        assert_eq!(recorder.borrow().removed, vec![blue]);
    }

    #[test]
    fn test_rejected_add_not_observed() {
        let mut pop = population();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        pop.add_observer(Box::new(Rc::clone(&recorder)));

        let red = place(&mut pop, Species::Red, 40, Gender::Male, 100.0);
        let copy = pop.get(red).unwrap().clone();
        assert!(pop.add(copy).is_err());
        let removed = pop.remove(red).unwrap();
        assert!(pop.add(removed).is_err());
        assert!(pop.add(cell(u64::MAX, Species::Blue, 10, Gender::Male)).is_err());

        assert_eq!(recorder.borrow().added, vec![red]);
        assert_eq!(recorder.borrow().removed, vec![red]);
        assert_eq!(pop.stats().max_population, 1);
    }

    #[test]
    fn test_step_moves_cells_within_bounds() {
        let mut pop = Population::from_config(&config()).unwrap();
        let before: BTreeMap<CellId, Vector> = pop.cells().map(|c| (c.id(), c.position)).collect();
        pop.run(30);
        assert_eq!(pop.current_tick(), 30);
        assert!(pop.is_consistent());
        let bounds = pop.bounds();
        for cell in pop.cells() {
            assert!(bounds.contains(cell.position, cell.size()));
        }
        assert!(
            pop.cells()
                .any(|c| before.get(&c.id()).is_some_and(|p| *p != c.position))
        );
    }

    #[test]
    fn test_population_cap_blocks_offspring() {
        let mut config = config();
        config.world.initial_population = 2;
        config.world.max_population = 2;
        let mut pop = Population::new(&config).unwrap();
        let a = place(&mut pop, Species::Green, 30, Gender::Male, 100.0);
        let b = place(&mut pop, Species::Green, 20, Gender::Female, 103.0);

        let report = pop.tick(&[ContactPair::new(a, b)]);
        assert!(report.births.is_empty());
        assert_eq!(report.matings_skipped, 1);
        assert!(pop.get(a).unwrap().can_mate());
    }
}
