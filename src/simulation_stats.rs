use serde::Serialize;
use std::collections::VecDeque;

/// Ticks of population history kept around.
pub const HISTORY_LEN: usize = 1000;

#[derive(Debug, Default, Clone, Serialize)]
pub struct SimulationStats {
    pub total_births: usize,
    pub total_deaths: usize,
    /// Cells lost to equal-strength encounters, counted in `total_deaths` too.
    pub mutual_kills: usize,
    pub matings_skipped: usize,
    pub max_population: usize,
    pub population_history: VecDeque<usize>,
}

impl SimulationStats {
    pub fn new() -> Self {
        Self {
            population_history: VecDeque::with_capacity(HISTORY_LEN),
            ..Default::default()
        }
    }

    /// Raise the peak without touching the per-tick history.
    pub fn record_peak(&mut self, population: usize) {
        self.max_population = self.max_population.max(population);
    }

    pub fn record_population(&mut self, population: usize) {
        self.record_peak(population);
        self.population_history.push_back(population);
        if self.population_history.len() > HISTORY_LEN {
            self.population_history.pop_front();
        }
    }
}
