//! Cell state and the per-hour cell cycle.

use radio_core::{CellParams, CyclePhase, Species};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What one hour of cycling cost the pools, and whether a cell was born
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub glucose: f64,
    pub oxygen: f64,
    pub offspring: Option<Species>,
}

impl CycleOutcome {
    fn consuming(glucose: f64, oxygen: f64) -> Self {
        Self {
            glucose,
            oxygen,
            offspring: None,
        }
    }
}

/// A single cell of either species
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub species: Species,
    pub phase: CyclePhase,
    /// Hours spent in the current phase
    pub age: u32,
    /// Hours of cycle arrest left from radiation damage
    pub repair_hours: u32,
    alive: bool,
}

impl Cell {
    /// A freshly divided cell at the start of G1
    pub fn new(species: Species) -> Self {
        Self {
            species,
            phase: CyclePhase::G1,
            age: 0,
            repair_hours: 0,
            alive: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Advance the cell by one hour given the pools and the crowding factor.
    ///
    /// A cell whose demand cannot be met by the pools starves and consumes
    /// nothing.
    pub fn cycle(
        &mut self,
        glucose: f64,
        oxygen: f64,
        crowding: u32,
        params: &CellParams,
    ) -> CycleOutcome {
        if !self.alive {
            return CycleOutcome::default();
        }

        let demand_glucose = params.glucose_consumption;
        let demand_oxygen = params.oxygen_consumption;
        if glucose < demand_glucose || oxygen < demand_oxygen {
            self.kill();
            return CycleOutcome::default();
        }

        if self.repair_hours > 0 {
            self.repair_hours -= 1;
            return CycleOutcome::consuming(demand_glucose, demand_oxygen);
        }

        let can_proliferate = glucose >= params.quiescent_glucose_level
            && oxygen >= params.quiescent_oxygen_level
            && params.critical_crowding.map_or(true, |limit| crowding <= limit);
        let resting = CycleOutcome::consuming(
            demand_glucose * params.quiescent_consumption_factor,
            demand_oxygen * params.quiescent_consumption_factor,
        );

        match self.phase {
            CyclePhase::G0 => {
                if can_proliferate {
                    self.enter(CyclePhase::G1);
                }
                resting
            }
            CyclePhase::G1 => {
                if !can_proliferate {
                    self.enter(CyclePhase::G0);
                    return resting;
                }
                self.advance(params.g1_hours, CyclePhase::S);
                CycleOutcome::consuming(demand_glucose, demand_oxygen)
            }
            CyclePhase::S => {
                self.advance(params.s_hours, CyclePhase::G2);
                CycleOutcome::consuming(demand_glucose, demand_oxygen)
            }
            CyclePhase::G2 => {
                self.advance(params.g2_hours, CyclePhase::M);
                CycleOutcome::consuming(demand_glucose, demand_oxygen)
            }
            CyclePhase::M => {
                let divided = self.advance(params.m_hours, CyclePhase::G1);
                CycleOutcome {
                    glucose: demand_glucose,
                    oxygen: demand_oxygen,
                    offspring: divided.then_some(self.species),
                }
            }
        }
    }

    /// Deliver `dose` grays. Returns `true` if the cell was killed.
    ///
    /// Survival follows the linear-quadratic model; survivors are arrested
    /// for `repair_hours_per_gray * dose` hours.
    pub fn radiate<R: Rng + ?Sized>(&mut self, dose: f64, params: &CellParams, rng: &mut R) -> bool {
        if !self.alive || dose <= 0.0 {
            return false;
        }

        let factor = if self.phase == CyclePhase::G0 {
            params.quiescent_radioresistance
        } else {
            1.0
        };
        let survival = (-factor * (params.alpha * dose + params.beta * dose * dose)).exp();

        if rng.gen::<f64>() >= survival {
            self.kill();
            true
        } else {
            self.repair_hours += (params.repair_hours_per_gray * dose).round() as u32;
            false
        }
    }

    fn enter(&mut self, phase: CyclePhase) {
        self.phase = phase;
        self.age = 0;
    }

    /// Count one hour in the current phase; returns `true` on moving on.
    fn advance(&mut self, duration: u32, next: CyclePhase) -> bool {
        self.age += 1;
        if self.age >= duration {
            self.enter(next);
            true
        } else {
            false
        }
    }
}
