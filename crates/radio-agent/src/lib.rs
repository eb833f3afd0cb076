//! Tabular Q-learning controller for the radiotherapy model.
//!
//! Counts of healthy and cancer cells are binned into a discrete state,
//! a Q-table maps states to dose values, and reports summarize greedy
//! and fixed-schedule treatments.

pub mod discretize;
pub mod q_table;
pub mod report;
pub mod agent;
pub mod baselines;

pub use agent::{TabularAgent, MAX_FRACTIONS};
pub use baselines::FixedSchedule;
pub use discretize::Discretizer;
pub use q_table::QTable;
pub use report::{EvaluationReport, TreatmentVariability};
