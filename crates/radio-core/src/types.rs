//! Core type definitions for the simulation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cell species living in the pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Healthy,
    Cancer,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Healthy => write!(f, "healthy"),
            Species::Cancer => write!(f, "cancer"),
        }
    }
}

/// Stage of the cell cycle.
///
/// Declaration order is the order cells are sorted in after pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CyclePhase {
    G1,
    S,
    G2,
    M,
    /// Quiescent
    G0,
}

/// Reward shaping applied by the model after each fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardMode {
    /// Penalize every gray delivered, bonus on a win (`d`)
    DosePenalized,
    /// Dose-penalized shaping with no terminal bonus or penalty (`n`)
    NoTerminalBonus,
    /// Cancer kills minus `k` times healthy losses (`0`..=`9`)
    KillWeighted(u8),
}

impl RewardMode {
    pub fn from_char(tag: char) -> Result<Self> {
        match tag {
            'd' => Ok(RewardMode::DosePenalized),
            'n' => Ok(RewardMode::NoTerminalBonus),
            c if c.is_ascii_digit() => Ok(RewardMode::KillWeighted(c as u8 - b'0')),
            other => Err(Error::InvalidConfig(format!(
                "unknown reward mode '{}' (expected d, n or a digit)",
                other
            ))),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            RewardMode::DosePenalized => 'd',
            RewardMode::NoTerminalBonus => 'n',
            RewardMode::KillWeighted(k) => (b'0' + k) as char,
        }
    }

    /// Whether every fraction is charged `dose / 200`
    pub fn penalizes_dose(&self) -> bool {
        matches!(self, RewardMode::DosePenalized | RewardMode::NoTerminalBonus)
    }
}

impl Default for RewardMode {
    fn default() -> Self {
        RewardMode::DosePenalized
    }
}

/// How raw population counts are binned into stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscretizationMode {
    /// `o`
    Logarithmic,
    /// `i`
    Linear,
}

impl DiscretizationMode {
    pub fn from_char(tag: char) -> Result<Self> {
        match tag {
            'o' => Ok(DiscretizationMode::Logarithmic),
            'i' => Ok(DiscretizationMode::Linear),
            other => Err(Error::InvalidConfig(format!(
                "unknown discretization mode '{}' (expected o or i)",
                other
            ))),
        }
    }
}

impl Default for DiscretizationMode {
    fn default() -> Self {
        DiscretizationMode::Linear
    }
}

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    None,
    /// Tumor eradicated
    Win,
    /// Healthy tissue collapsed
    Loss,
    /// Treatment window exhausted
    Timeout,
}

impl TerminationReason {
    pub fn as_char(&self) -> char {
        match self {
            TerminationReason::None => '-',
            TerminationReason::Win => 'W',
            TerminationReason::Loss => 'L',
            TerminationReason::Timeout => 'T',
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TerminationReason::None)
    }
}

impl Default for TerminationReason {
    fn default() -> Self {
        TerminationReason::None
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_mode_tags() {
        assert_eq!(RewardMode::from_char('d').unwrap(), RewardMode::DosePenalized);
        assert_eq!(RewardMode::from_char('n').unwrap(), RewardMode::NoTerminalBonus);
        assert_eq!(RewardMode::from_char('5').unwrap(), RewardMode::KillWeighted(5));
        assert!(RewardMode::from_char('x').is_err());

        for tag in ['d', 'n', '0', '7'] {
            assert_eq!(RewardMode::from_char(tag).unwrap().as_char(), tag);
        }
    }

    #[test]
    fn test_dose_penalty_modes() {
        assert!(RewardMode::DosePenalized.penalizes_dose());
        assert!(RewardMode::NoTerminalBonus.penalizes_dose());
        assert!(!RewardMode::KillWeighted(5).penalizes_dose());
    }

    #[test]
    fn test_discretization_tags() {
        assert_eq!(
            DiscretizationMode::from_char('o').unwrap(),
            DiscretizationMode::Logarithmic
        );
        assert_eq!(
            DiscretizationMode::from_char('i').unwrap(),
            DiscretizationMode::Linear
        );
        assert!(DiscretizationMode::from_char('q').is_err());
    }

    #[test]
    fn test_phase_ordering() {
        let mut phases = vec![CyclePhase::G0, CyclePhase::M, CyclePhase::G1, CyclePhase::S];
        phases.sort();
        assert_eq!(
            phases,
            vec![CyclePhase::G1, CyclePhase::S, CyclePhase::M, CyclePhase::G0]
        );
    }

    #[test]
    fn test_termination_display() {
        assert_eq!(TerminationReason::Win.to_string(), "W");
        assert_eq!(TerminationReason::Timeout.to_string(), "T");
        assert!(!TerminationReason::None.is_terminal());
        assert!(TerminationReason::Loss.is_terminal());
    }
}
