//! # Penalty System
//!
//! Coin sinks for negative events. Penalties sting but never push a balance
//! below zero: the floor absorbs whatever the balance cannot cover.
//!
//! | Penalty | Default | Trigger |
//! |---------|---------|---------|
//! | `miss_habit` | -5 | Missed a scheduled habit |
//! | `break_streak` | -10 | Streak was broken |
//! | `snooze_task` | -2 | Postponed a task |
//! | `fail_deep_work` | -5 | Abandoned a focus session |

use crate::config::EconomyConfig;
use crate::error::EconomyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Penalty event types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyType {
    /// Missed a scheduled habit
    MissHabit,
    /// Streak was broken
    BreakStreak,
    /// Postponed a task
    SnoozeTask,
    /// Didn't complete a focused work session
    FailDeepWork,
}

impl PenaltyType {
    pub const ALL: [PenaltyType; 4] = [
        Self::MissHabit,
        Self::BreakStreak,
        Self::SnoozeTask,
        Self::FailDeepWork,
    ];

    /// Snake-case label used in logs and requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissHabit => "miss_habit",
            Self::BreakStreak => "break_streak",
            Self::SnoozeTask => "snooze_task",
            Self::FailDeepWork => "fail_deep_work",
        }
    }

    /// Case-insensitive lookup
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for PenaltyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PenaltyType {
    type Err = EconomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| EconomyError::UnknownPenaltyType(s.to_string()))
    }
}

/// Result of applying a penalty to a balance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyOutcome {
    /// Coins actually deducted (may be less than nominal at the zero floor)
    pub penalty: u64,

    /// Balance after deduction
    pub new_balance: u64,

    /// False for unknown types, which leave the balance untouched
    pub applied: bool,

    /// Resolved penalty type when applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_type: Option<PenaltyType>,
}

impl PenaltyOutcome {
    fn not_applied(balance: u64) -> Self {
        Self {
            penalty: 0,
            new_balance: balance,
            applied: false,
            penalty_type: None,
        }
    }

    /// Balance before the deduction
    pub fn balance_before(&self) -> u64 {
        self.new_balance + self.penalty
    }
}

/// Apply a known penalty type to a balance
pub fn apply_penalty(
    config: &EconomyConfig,
    penalty_type: PenaltyType,
    balance: u64,
) -> PenaltyOutcome {
    let amount = config.penalties.amount(penalty_type);
    if amount == 0 {
        // A zero-cost penalty is indistinguishable from an unknown one
        return PenaltyOutcome::not_applied(balance);
    }

    let deduction = amount.unsigned_abs();
    let new_balance = balance.saturating_sub(deduction);

    PenaltyOutcome {
        penalty: balance - new_balance,
        new_balance,
        applied: true,
        penalty_type: Some(penalty_type),
    }
}

/// Apply a penalty by label. Unknown labels are a no-op, not an error.
pub fn calculate_penalty(config: &EconomyConfig, label: &str, balance: u64) -> PenaltyOutcome {
    match PenaltyType::parse(label) {
        Some(penalty_type) => apply_penalty(config, penalty_type, balance),
        None => {
            tracing::debug!(label, "Unknown penalty type, ignoring");
            PenaltyOutcome::not_applied(balance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_penalty_floor_absorbs_remainder() {
        let config = EconomyConfig::default();
        let outcome = calculate_penalty(&config, "miss_habit", 3);

        assert_eq!(outcome.penalty, 3);
        assert_eq!(outcome.new_balance, 0);
        assert!(outcome.applied);
        assert_eq!(outcome.penalty_type, Some(PenaltyType::MissHabit));
        assert_eq!(outcome.balance_before(), 3);
    }

    #[test]
    fn test_full_penalty() {
        let config = EconomyConfig::default();
        let outcome = calculate_penalty(&config, "break_streak", 100);

        assert_eq!(outcome.penalty, 10);
        assert_eq!(outcome.new_balance, 90);
    }

    #[test]
    fn test_unknown_penalty_is_noop() {
        let config = EconomyConfig::default();
        let outcome = calculate_penalty(&config, "unknown", 100);

        assert!(!outcome.applied);
        assert_eq!(outcome.penalty, 0);
        assert_eq!(outcome.new_balance, 100);
        assert_eq!(outcome.penalty_type, None);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let config = EconomyConfig::default();
        let outcome = calculate_penalty(&config, "SNOOZE_TASK", 10);
        assert!(outcome.applied);
        assert_eq!(outcome.penalty, 2);
        assert_eq!(PenaltyType::parse("Fail_Deep_Work"), Some(PenaltyType::FailDeepWork));
    }

    #[test]
    fn test_zero_configured_penalty_not_applied() {
        let mut config = EconomyConfig::default();
        config.penalties.snooze_task = 0;
        let outcome = apply_penalty(&config, PenaltyType::SnoozeTask, 10);
        assert!(!outcome.applied);
        assert_eq!(outcome.new_balance, 10);
    }

    #[test]
    fn test_strict_parse() {
        assert_eq!("break_streak".parse::<PenaltyType>().unwrap(), PenaltyType::BreakStreak);
        assert!(matches!(
            "overslept".parse::<PenaltyType>(),
            Err(EconomyError::UnknownPenaltyType(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_balance_never_negative(balance in 0u64..1_000, idx in 0usize..4) {
            let config = EconomyConfig::default();
            let penalty_type = PenaltyType::ALL[idx];
            let outcome = apply_penalty(&config, penalty_type, balance);
            prop_assert!(outcome.new_balance <= balance);
            prop_assert_eq!(outcome.new_balance + outcome.penalty, balance);
            prop_assert!(outcome.penalty <= config.penalties.amount(penalty_type).unsigned_abs());
        }
    }
}
