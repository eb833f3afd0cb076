//! Reward shaping for a single fraction.

use radio_core::{RewardMode, TerminationReason};

/// Flat penalty for losing the patient or running out of time
pub const TERMINAL_PENALTY: f64 = -1.0;
/// Base bonus for eradicating the tumor
pub const WIN_BONUS: f64 = 0.5;
/// Healthy cells worth one unit of win bonus
pub const HEALTHY_BONUS_SCALE: f64 = 4000.0;
/// Grays worth one unit of dose penalty
pub const DOSE_PENALTY_SCALE: f64 = 200.0;
/// Cells worth one unit of kill reward
pub const KILL_SCALE: f64 = 100_000.0;
/// Weight of a healthy loss under dose-penalized shaping
pub const DOSE_MODE_HEALTHY_WEIGHT: f64 = 5.0;

/// Reward for a fraction that delivered `dose` grays.
///
/// `termination` is the outcome of the terminal check run after the
/// fraction; `healthy_count` is the healthy population at that point.
pub fn shape_reward(
    mode: RewardMode,
    termination: TerminationReason,
    dose: u32,
    cancer_killed: i64,
    healthy_lost: i64,
    healthy_count: usize,
) -> f64 {
    let dose = dose as f64;
    let killed = cancer_killed as f64;
    let lost = healthy_lost as f64;

    if termination.is_terminal() && mode != RewardMode::NoTerminalBonus {
        return match termination {
            TerminationReason::Win if mode.penalizes_dose() => {
                -dose / DOSE_PENALTY_SCALE + WIN_BONUS + healthy_count as f64 / HEALTHY_BONUS_SCALE
            }
            TerminationReason::Win => WIN_BONUS + healthy_count as f64 / HEALTHY_BONUS_SCALE,
            _ => TERMINAL_PENALTY,
        };
    }

    let healthy_weight = match mode {
        RewardMode::KillWeighted(k) => k as f64,
        _ => DOSE_MODE_HEALTHY_WEIGHT,
    };
    let kills = (killed - healthy_weight * lost) / KILL_SCALE;
    if mode.penalizes_dose() {
        -dose / DOSE_PENALTY_SCALE + kills
    } else {
        kills
    }
}
