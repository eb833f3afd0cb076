//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::{DiscretizationMode, RewardMode};
use serde::{Deserialize, Serialize};

/// Per-species cell cycle and radiosensitivity parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellParams {
    /// Glucose drawn from the pool per hour
    pub glucose_consumption: f64,
    /// Oxygen drawn from the pool per hour
    pub oxygen_consumption: f64,
    /// Share of the hourly demand drawn while quiescent
    pub quiescent_consumption_factor: f64,
    /// Glucose pool level under which G1 cells go quiescent
    pub quiescent_glucose_level: f64,
    /// Oxygen pool level under which G1 cells go quiescent
    pub quiescent_oxygen_level: f64,
    /// Crowding factor above which G1 cells go quiescent (contact inhibition)
    pub critical_crowding: Option<u32>,
    pub g1_hours: u32,
    pub s_hours: u32,
    pub g2_hours: u32,
    pub m_hours: u32,
    /// Linear term of the linear-quadratic survival model (1/Gy)
    pub alpha: f64,
    /// Quadratic term of the linear-quadratic survival model (1/Gy^2)
    pub beta: f64,
    /// Multiplier on the lethal exponent for quiescent cells
    pub quiescent_radioresistance: f64,
    /// Cycle delay added to a surviving cell per gray received
    pub repair_hours_per_gray: f64,
}

impl CellParams {
    pub fn healthy() -> Self {
        Self {
            glucose_consumption: 0.36,
            oxygen_consumption: 20.0,
            quiescent_consumption_factor: 0.75,
            quiescent_glucose_level: 8_000.0,
            quiescent_oxygen_level: 200_000.0,
            critical_crowding: Some(9),
            g1_hours: 11,
            s_hours: 8,
            g2_hours: 4,
            m_hours: 1,
            alpha: 0.15,
            beta: 0.03,
            quiescent_radioresistance: 0.5,
            repair_hours_per_gray: 3.0,
        }
    }

    pub fn cancer() -> Self {
        Self {
            glucose_consumption: 0.54,
            oxygen_consumption: 20.0,
            quiescent_consumption_factor: 0.75,
            quiescent_glucose_level: 2_000.0,
            quiescent_oxygen_level: 40_000.0,
            critical_crowding: None,
            g1_hours: 11,
            s_hours: 8,
            g2_hours: 4,
            m_hours: 1,
            alpha: 0.35,
            beta: 0.035,
            quiescent_radioresistance: 0.5,
            repair_hours_per_gray: 3.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.g1_hours == 0 || self.s_hours == 0 || self.g2_hours == 0 || self.m_hours == 0 {
            return Err(Error::InvalidConfig(
                "cell cycle phases must last at least one hour".to_string(),
            ));
        }
        if self.glucose_consumption < 0.0 || self.oxygen_consumption < 0.0 {
            return Err(Error::InvalidConfig(
                "cell consumption must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pixel model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    pub reward_mode: RewardMode,
    pub initial_glucose: f64,
    pub initial_oxygen: f64,
    /// Glucose added every hour
    pub glucose_supply: f64,
    /// Oxygen added every hour
    pub oxygen_supply: f64,
    pub initial_healthy_cells: usize,
    pub initial_cancer_cells: usize,
    /// Hours simulated by `reset` before treatment may start
    pub warmup_hours: u32,
    /// Hours between two fractions
    pub hours_per_fraction: u32,
    /// Live cells per unit of crowding factor
    pub carrying_capacity: usize,
    /// Healthy count under which the episode is lost
    pub loss_threshold: usize,
    /// Elapsed hours after which the episode times out
    pub max_hours: u32,
    pub healthy: CellParams,
    pub cancer: CellParams,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            reward_mode: RewardMode::default(),
            initial_glucose: 250_000.0,
            initial_oxygen: 2_500_000.0,
            glucose_supply: 13_000.0,
            oxygen_supply: 450_000.0,
            initial_healthy_cells: 1000,
            initial_cancer_cells: 1,
            warmup_hours: 350,
            hours_per_fraction: 24,
            carrying_capacity: 278,
            loss_threshold: 10,
            max_hours: 1550,
            healthy: CellParams::healthy(),
            cancer: CellParams::cancer(),
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.carrying_capacity == 0 {
            return Err(Error::InvalidConfig(
                "carrying capacity must be positive".to_string(),
            ));
        }
        if self.initial_cancer_cells == 0 {
            return Err(Error::InvalidConfig(
                "at least one initial cancer cell is required".to_string(),
            ));
        }
        if self.initial_healthy_cells < self.loss_threshold {
            return Err(Error::InvalidConfig(format!(
                "{} initial healthy cells is below the loss threshold of {}",
                self.initial_healthy_cells, self.loss_threshold
            )));
        }
        self.healthy.validate()?;
        self.cancer.validate()
    }
}

/// Tabular agent dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub cancer_stages: usize,
    pub healthy_stages: usize,
    /// Number of doses on offer; action `a` delivers `a + 1` grays
    pub actions: usize,
    pub discretization: DiscretizationMode,
    /// Seed of the exploration RNG
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cancer_stages: 50,
            healthy_stages: 5,
            actions: 5,
            discretization: DiscretizationMode::default(),
            seed: 0,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        // Stage helpers divide by `stages - 2`.
        if self.cancer_stages < 3 || self.healthy_stages < 3 {
            return Err(Error::InvalidConfig(format!(
                "stage counts must be at least 3 (got {} cancer, {} healthy)",
                self.cancer_stages, self.healthy_stages
            )));
        }
        if self.actions == 0 {
            return Err(Error::InvalidConfig("at least one action is required".to_string()));
        }
        Ok(())
    }

    pub fn num_states(&self) -> usize {
        self.cancer_stages * self.healthy_stages
    }
}

/// Epoch-based training schedule with linear annealing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSchedule {
    pub epochs: usize,
    /// Decision steps per epoch
    pub train_steps: usize,
    /// Greedy episodes run after each epoch
    pub test_episodes: usize,
    pub alpha_start: f64,
    pub alpha_end: f64,
    pub epsilon_start: f64,
    pub epsilon_end: f64,
    pub discount: f64,
}

impl Default for TrainingSchedule {
    fn default() -> Self {
        Self {
            epochs: 0,
            train_steps: 5000,
            test_episodes: 10,
            alpha_start: 0.8,
            alpha_end: 0.05,
            epsilon_start: 0.8,
            epsilon_end: 0.01,
            discount: 0.99,
        }
    }
}

/// Final evaluation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub episodes: usize,
    /// Episodes used for the per-fraction dose variability report
    pub variability_episodes: usize,
    pub discount: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            variability_episodes: 1000,
            discount: 0.99,
        }
    }
}

/// Everything a training/evaluation run needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    pub model: ModelConfig,
    pub agent: AgentConfig,
    pub schedule: TrainingSchedule,
    pub evaluation: EvaluationConfig,
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.agent.validate()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
