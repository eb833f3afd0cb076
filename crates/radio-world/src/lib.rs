//! Pixel simulation engine.
//!
//! Healthy and cancer cells compete for the glucose and oxygen of a single
//! pixel; the engine advances them hour by hour and applies radiation
//! fractions chosen by a controller.

pub mod cell;
pub mod population;
pub mod reward;
pub mod model;

pub use cell::{Cell, CycleOutcome};
pub use population::Population;
pub use model::{ModelSnapshot, ScalarModel};
pub use reward::shape_reward;
