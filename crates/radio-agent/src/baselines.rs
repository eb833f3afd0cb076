//! Fixed dosing schedules to compare learned policies against.

use crate::report::{EpisodeRecord, EvaluationAccumulator, EvaluationReport};
use radio_world::{ModelSnapshot, ScalarModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument};

/// Hour at which the untreated growth curve stops
pub const NO_TREATMENT_HORIZON: u32 = 2000;
/// Hours between two samples of the untreated growth curve
pub const SAMPLE_INTERVAL: u32 = 50;
/// Episodes averaged per schedule by [`test_suite`]
pub const SUITE_EPISODES: usize = 25;

/// A dose plan that ignores the state of the tumor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixedSchedule {
    /// 1 Gy every fraction
    Low,
    /// 2 Gy every fraction
    Baseline,
    /// 5 Gy every fraction
    High,
    /// 4 Gy for the first four fractions, 2 Gy afterwards
    HighLow,
}

impl FixedSchedule {
    pub const ALL: [FixedSchedule; 4] = [
        FixedSchedule::Low,
        FixedSchedule::Baseline,
        FixedSchedule::High,
        FixedSchedule::HighLow,
    ];

    /// Action taken at the given zero-based fraction
    pub fn action(&self, fraction: usize) -> usize {
        match self {
            FixedSchedule::Low => 0,
            FixedSchedule::Baseline => 1,
            FixedSchedule::High => 4,
            FixedSchedule::HighLow if fraction <= 3 => 3,
            FixedSchedule::HighLow => 1,
        }
    }
}

impl fmt::Display for FixedSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixedSchedule::Low => write!(f, "Low treatment"),
            FixedSchedule::Baseline => write!(f, "Baseline treatment"),
            FixedSchedule::High => write!(f, "High treatment"),
            FixedSchedule::HighLow => write!(f, "High low treatment"),
        }
    }
}

/// Let the tumor grow untreated after warm-up, sampling every
/// [`SAMPLE_INTERVAL`] hours until `until`
#[instrument(skip(env))]
pub fn no_treatment(env: &mut ScalarModel, until: u32) -> Vec<ModelSnapshot> {
    env.reset();
    let mut samples = Vec::new();

    while env.elapsed_hours() < until {
        let sample = env.snapshot();
        info!(
            hour = sample.hour,
            healthy = sample.healthy,
            cancer = sample.cancer,
            "Time: {} Healthy cells: {} Cancer cells: {}",
            sample.hour,
            sample.healthy,
            sample.cancer
        );
        samples.push(sample);
        env.go(SAMPLE_INTERVAL);
    }

    samples
}

/// Mean undiscounted return of `schedule` over `episodes` episodes
#[instrument(skip(env))]
pub fn average_reward(env: &mut ScalarModel, schedule: FixedSchedule, episodes: usize) -> f64 {
    let mut sum_scores = 0.0;
    for _ in 0..episodes {
        env.reset();
        let mut fraction = 0;
        while !env.in_terminal_state() {
            sum_scores += env.act(schedule.action(fraction));
            fraction += 1;
        }
    }

    let average = sum_scores / episodes as f64;
    info!(%schedule, average, "Average reward {}", average);
    average
}

/// Clinical outcome statistics of `schedule`, reported like a greedy
/// evaluation without TD error
#[instrument(skip(env))]
pub fn evaluate_schedule(
    env: &mut ScalarModel,
    schedule: FixedSchedule,
    episodes: usize,
) -> EvaluationReport {
    let mut acc = EvaluationAccumulator::new(true);

    for _ in 0..episodes {
        env.reset();
        let initial_healthy = env.healthy_count();
        let mut total_reward = 0.0;
        let mut fractions = 0u32;
        let mut dose = 0u32;

        while !env.in_terminal_state() {
            let action = schedule.action(fractions as usize);
            total_reward += env.act(action);
            fractions += 1;
            dose += action as u32 + 1;
        }

        acc.record(&EpisodeRecord {
            total_reward,
            td_error: None,
            fractions,
            dose,
            duration: fractions * env.config().hours_per_fraction,
            survival: env.healthy_count() as f64 / initial_healthy as f64,
            outcome: env.termination(),
        });
    }

    acc.finish()
}

/// Average reward of every fixed schedule over [`SUITE_EPISODES`] episodes
pub fn test_suite(env: &mut ScalarModel) -> Vec<(FixedSchedule, f64)> {
    FixedSchedule::ALL
        .iter()
        .map(|&schedule| (schedule, average_reward(env, schedule, SUITE_EPISODES)))
        .collect()
}
