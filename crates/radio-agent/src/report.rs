//! Evaluation and treatment-variability reports.

use radio_core::{RunningMoments, Summary, TerminationReason};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One fraction of a logged episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepLog {
    pub dose: u32,
    pub reward: f64,
}

/// Per-fraction trace of one episode, kept for verbose evaluations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeLog {
    pub steps: Vec<StepLog>,
    pub outcome: TerminationReason,
}

/// What one finished episode contributes to a report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeRecord {
    pub total_reward: f64,
    /// Mean squared TD error over the episode, if tracked
    pub td_error: Option<f64>,
    pub fractions: u32,
    /// Cumulative grays delivered
    pub dose: u32,
    /// Hours of treatment
    pub duration: u32,
    /// Final healthy count over the healthy count after warm-up
    pub survival: f64,
    pub outcome: TerminationReason,
}

/// Clinical outcome statistics over all evaluated episodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStats {
    /// Tumor control probability, in percent
    pub tcp: f64,
    pub fractions: Summary,
    pub dose: Summary,
    pub duration: Summary,
    pub survival: Summary,
}

/// Aggregate of a batch of greedy (or fixed-schedule) episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub episodes: usize,
    pub average_score: f64,
    pub mse: Option<f64>,
    pub outcome: Option<OutcomeStats>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub logs: Vec<EpisodeLog>,
}

/// Running sums behind an [`EvaluationReport`]
#[derive(Debug, Default)]
pub struct EvaluationAccumulator {
    episodes: usize,
    sum_scores: f64,
    sum_error: f64,
    tracks_error: bool,
    track_outcome: bool,
    wins: usize,
    fractions: RunningMoments,
    dose: RunningMoments,
    duration: RunningMoments,
    survival: RunningMoments,
    logs: Vec<EpisodeLog>,
}

impl EvaluationAccumulator {
    pub fn new(track_outcome: bool) -> Self {
        Self {
            track_outcome,
            ..Default::default()
        }
    }

    pub fn record(&mut self, episode: &EpisodeRecord) {
        self.episodes += 1;
        self.sum_scores += episode.total_reward;
        if let Some(error) = episode.td_error {
            self.tracks_error = true;
            self.sum_error += error;
        }
        if episode.outcome == TerminationReason::Win {
            self.wins += 1;
        }

        if self.track_outcome {
            self.fractions.push(episode.fractions as f64);
            self.dose.push(episode.dose as f64);
            self.duration.push(episode.duration as f64);
            self.survival.push(episode.survival);
        }
    }

    pub fn record_log(&mut self, log: EpisodeLog) {
        self.logs.push(log);
    }

    pub fn finish(self) -> EvaluationReport {
        let episodes = self.episodes as f64;
        let outcome = self.track_outcome.then(|| OutcomeStats {
            tcp: 100.0 * self.wins as f64 / episodes,
            fractions: Summary::from(&self.fractions),
            dose: Summary::from(&self.dose),
            duration: Summary::from(&self.duration),
            survival: Summary::from(&self.survival),
        });

        EvaluationReport {
            episodes: self.episodes,
            average_score: self.sum_scores / episodes,
            mse: self.tracks_error.then(|| self.sum_error / episodes),
            outcome,
            logs: self.logs,
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for log in &self.logs {
            for step in &log.steps {
                writeln!(f, "{} grays, reward = {}", step.dose, step.reward)?;
            }
            writeln!(f, "{}", log.outcome)?;
        }

        match self.mse {
            Some(mse) => writeln!(f, "Average score: {} MSE: {}", self.average_score, mse)?,
            None => writeln!(f, "Average score: {}", self.average_score)?,
        }

        if let Some(outcome) = &self.outcome {
            writeln!(f, "TCP: {}", outcome.tcp)?;
            writeln!(
                f,
                "Average num of fractions: {} std dev: {}",
                outcome.fractions.mean, outcome.fractions.std_dev
            )?;
            writeln!(
                f,
                "Average radiation dose: {} std dev: {}",
                outcome.dose.mean, outcome.dose.std_dev
            )?;
            writeln!(
                f,
                "Average duration: {} std dev: {}",
                outcome.duration.mean, outcome.duration.std_dev
            )?;
            writeln!(
                f,
                "Average survival: {} std dev: {}",
                outcome.survival.mean, outcome.survival.std_dev
            )?;
        }
        Ok(())
    }
}

/// Dose statistics at one decision index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseSlot {
    /// Episodes still under treatment at this fraction
    pub active: usize,
    pub mean: f64,
    pub std_dev: f64,
}

/// Per-fraction dose spread of the greedy policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentVariability {
    pub episodes: usize,
    pub slots: Vec<DoseSlot>,
}

impl TreatmentVariability {
    /// Summarize recorded doses, one row per episode with 0 marking an
    /// inactive slot.
    ///
    /// Mean and deviation divide by the total episode count even where
    /// fewer episodes were still active, inactive ones counting as 0 Gy.
    pub fn from_doses(doses: &[Vec<u32>], slots: usize) -> Self {
        let episodes = doses.len();
        let mut summary = Vec::new();

        for slot in 0..slots {
            let column = doses.iter().map(|row| row.get(slot).copied().unwrap_or(0));
            let active = column.clone().filter(|&dose| dose > 0).count();
            if active == 0 {
                break;
            }

            let mean = column.clone().map(f64::from).sum::<f64>() / episodes as f64;
            let squares: f64 = column.map(|dose| (f64::from(dose) - mean).powi(2)).sum();
            summary.push(DoseSlot {
                active,
                mean,
                std_dev: (squares / episodes as f64).sqrt(),
            });
        }

        Self {
            episodes,
            slots: summary,
        }
    }
}

impl fmt::Display for TreatmentVariability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "count, mean, std_error")?;
        for slot in &self.slots {
            writeln!(f, "{}, {}, {}", slot.active, slot.mean, slot.std_dev)?;
        }
        Ok(())
    }
}
