//! Binning of raw population counts into Q-table states.

use radio_core::{AgentConfig, DiscretizationMode};

/// Healthy count mapped to the top non-saturated stage
pub const HEALTHY_CEILING: f64 = 3500.0;
/// Cancer count mapped to the top non-saturated stage
pub const CANCER_CEILING: f64 = 40000.0;

/// Maps (cancer, healthy) counts to a row of the Q-table
#[derive(Debug, Clone)]
pub struct Discretizer {
    mode: DiscretizationMode,
    cancer_stages: usize,
    healthy_stages: usize,
    /// Growth factor (logarithmic) or stage width (linear)
    cancer_helper: f64,
    healthy_helper: f64,
}

impl Discretizer {
    /// Stage counts must be at least 3; see [`AgentConfig::validate`].
    pub fn new(mode: DiscretizationMode, cancer_stages: usize, healthy_stages: usize) -> Self {
        let cancer_span = cancer_stages as f64 - 2.0;
        let healthy_span = healthy_stages as f64 - 2.0;
        let (cancer_helper, healthy_helper) = match mode {
            DiscretizationMode::Logarithmic => (
                (CANCER_CEILING.ln() / cancer_span).exp(),
                (HEALTHY_CEILING.ln() / healthy_span).exp(),
            ),
            DiscretizationMode::Linear => {
                (CANCER_CEILING / cancer_span, HEALTHY_CEILING / healthy_span)
            }
        };

        Self {
            mode,
            cancer_stages,
            healthy_stages,
            cancer_helper,
            healthy_helper,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            config.discretization,
            config.cancer_stages,
            config.healthy_stages,
        )
    }

    pub fn num_states(&self) -> usize {
        self.cancer_stages * self.healthy_stages
    }

    pub fn cancer_stage(&self, cancer: usize) -> usize {
        let raw = match self.mode {
            DiscretizationMode::Logarithmic => {
                ((cancer as f64 + 1.0).ln() / self.cancer_helper.ln()).ceil()
            }
            DiscretizationMode::Linear => (cancer as f64 / self.cancer_helper).ceil(),
        };
        clamp_stage(raw, self.cancer_stages)
    }

    /// The few cells just above the loss threshold share stage 0.
    pub fn healthy_stage(&self, healthy: usize) -> usize {
        let raw = match self.mode {
            DiscretizationMode::Logarithmic => {
                let shifted = healthy.saturating_sub(8).max(1) as f64;
                (shifted.ln() / self.healthy_helper.ln()).ceil()
            }
            DiscretizationMode::Linear => {
                (healthy.saturating_sub(9) as f64 / self.healthy_helper).ceil()
            }
        };
        clamp_stage(raw, self.healthy_stages)
    }

    /// Row index `cancer_stage * healthy_stages + healthy_stage`
    pub fn state(&self, cancer: usize, healthy: usize) -> usize {
        self.cancer_stage(cancer) * self.healthy_stages + self.healthy_stage(healthy)
    }
}

fn clamp_stage(raw: f64, stages: usize) -> usize {
    // `raw` is a non-negative ceiling; the float to int cast saturates.
    (raw.max(0.0) as usize).min(stages - 1)
}
