//! Single-species cell population.

use crate::cell::{Cell, CycleOutcome};
use radio_core::{CellParams, Species};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Ordered collection of cells of one species with a live counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    species: Species,
    cells: Vec<Cell>,
    live: usize,
}

impl Population {
    pub fn new(species: Species) -> Self {
        Self {
            species,
            cells: Vec::new(),
            live: 0,
        }
    }

    /// Create a population of `count` fresh cells
    pub fn seeded(species: Species, count: usize) -> Self {
        let mut population = Self::new(species);
        population.cells.reserve(count);
        for _ in 0..count {
            population.add(Cell::new(species));
        }
        population
    }

    pub fn species(&self) -> Species {
        self.species
    }

    /// Append a cell at the end of the sequence
    pub fn add(&mut self, cell: Cell) {
        debug_assert_eq!(cell.species, self.species);
        if cell.is_alive() {
            self.live += 1;
        }
        self.cells.push(cell);
    }

    /// Cells still alive, including dead entries not yet pruned out
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Stored entries, dead or alive
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.live = 0;
    }

    /// Cycle the cell at `index` for one hour
    pub fn cycle_at(
        &mut self,
        index: usize,
        glucose: f64,
        oxygen: f64,
        crowding: u32,
        params: &CellParams,
    ) -> CycleOutcome {
        let cell = &mut self.cells[index];
        let was_alive = cell.is_alive();
        let outcome = cell.cycle(glucose, oxygen, crowding, params);
        if was_alive && !cell.is_alive() {
            self.live -= 1;
        }
        outcome
    }

    /// Irradiate every cell. Returns the number of cells killed.
    pub fn radiate_all<R: Rng + ?Sized>(&mut self, dose: f64, params: &CellParams, rng: &mut R) -> usize {
        let mut killed = 0;
        for cell in &mut self.cells {
            if cell.radiate(dose, params, rng) {
                killed += 1;
            }
        }
        self.live -= killed;
        killed
    }

    /// Drop dead cells and stable-sort the survivors by cycle phase
    pub fn compact_and_prune(&mut self) {
        self.cells.retain(Cell::is_alive);
        self.cells.sort_by_key(|cell| cell.phase);
        self.live = self.cells.len();
    }

    /// Iterator over all stored cells
    pub fn iter(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radio_core::CyclePhase;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_population_creation() {
        let population = Population::seeded(Species::Healthy, 10);
        assert_eq!(population.species(), Species::Healthy);
        assert_eq!(population.len(), 10);
        assert_eq!(population.live_count(), 10);
        assert!(population.iter().all(|cell| cell.phase == CyclePhase::G1));
    }

    #[test]
    fn test_live_count_tracks_deaths_before_pruning() {
        let params = CellParams::cancer();
        let mut population = Population::seeded(Species::Cancer, 3);

        // Starve the middle cell
        population.cycle_at(1, 0.0, 0.0, 0, &params);
        assert_eq!(population.live_count(), 2);
        assert_eq!(population.len(), 3);

        population.compact_and_prune();
        assert_eq!(population.len(), 2);
        assert_eq!(population.live_count(), 2);
        assert!(population.iter().all(Cell::is_alive));
    }

    #[test]
    fn test_prune_sorts_by_phase() {
        let params = CellParams::healthy();
        let mut population = Population::new(Species::Healthy);
        let mut quiescent = Cell::new(Species::Healthy);
        quiescent.phase = CyclePhase::G0;
        let mut mitotic = Cell::new(Species::Healthy);
        mitotic.phase = CyclePhase::M;
        population.add(quiescent);
        population.add(mitotic);
        population.add(Cell::new(Species::Healthy));

        population.cycle_at(2, 0.0, 0.0, 0, &params);
        population.compact_and_prune();

        let phases: Vec<_> = population.iter().map(|cell| cell.phase).collect();
        assert_eq!(phases, vec![CyclePhase::M, CyclePhase::G0]);
    }

    #[test]
    fn test_radiate_all_counts_kills() {
        let params = CellParams::cancer();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = Population::seeded(Species::Cancer, 50);

        let killed = population.radiate_all(100.0, &params, &mut rng);
        assert_eq!(killed, 50);
        assert_eq!(population.live_count(), 0);

        population.compact_and_prune();
        assert!(population.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut population = Population::seeded(Species::Healthy, 5);
        population.clear();
        assert!(population.is_empty());
        assert_eq!(population.live_count(), 0);
    }
}
