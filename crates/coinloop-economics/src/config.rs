//! # Economy Configuration
//!
//! Immutable policy constants, loaded once at process start. Every field
//! defaults to the values in [`crate::constants`], so a partial TOML table
//! overrides only what it names.
//!
//! ```toml
//! [economy]
//! base = 5.0
//! daily_coin_cap = 60
//! weekly_coin_cap = 350
//!
//! [economy.penalties]
//! break_streak = -12
//! ```

use crate::constants::*;
use crate::error::{EconomyError, Result};
use crate::multipliers::Difficulty;
use crate::penalty::PenaltyType;
use serde::{Deserialize, Serialize};

/// Multiplier per difficulty level
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyMultipliers {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
    pub extreme: f64,
}

impl Default for DifficultyMultipliers {
    fn default() -> Self {
        Self {
            easy: 1.0,
            medium: 1.5,
            hard: 2.0,
            extreme: 3.0,
        }
    }
}

impl DifficultyMultipliers {
    /// Multiplier for a difficulty level
    pub fn get(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Extreme => self.extreme,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (Difficulty, f64)> + '_ {
        Difficulty::ALL.iter().map(move |d| (*d, self.get(*d)))
    }
}

/// Fixed coin deduction per penalty type (stored as non-positive numbers)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltySchedule {
    pub miss_habit: i64,
    pub break_streak: i64,
    pub snooze_task: i64,
    pub fail_deep_work: i64,
}

impl Default for PenaltySchedule {
    fn default() -> Self {
        Self {
            miss_habit: -5,
            break_streak: -10,
            snooze_task: -2,
            fail_deep_work: -5,
        }
    }
}

impl PenaltySchedule {
    /// Configured (negative) amount for a penalty type
    pub fn amount(&self, penalty: PenaltyType) -> i64 {
        match penalty {
            PenaltyType::MissHabit => self.miss_habit,
            PenaltyType::BreakStreak => self.break_streak,
            PenaltyType::SnoozeTask => self.snooze_task,
            PenaltyType::FailDeepWork => self.fail_deep_work,
        }
    }
}

/// Coin economy policy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Default per-completion reward before multipliers
    pub base: f64,

    /// Hard ceiling on coins earned per day
    pub daily_coin_cap: u64,

    /// Hard ceiling on coins earned per week
    pub weekly_coin_cap: u64,

    /// Completions per day at which scarcity reaches its floor
    pub daily_action_cap: u32,

    /// Calibration's steady-state goal for average daily output
    pub target_daily_coins: f64,

    /// Difficulty multipliers
    pub difficulty_multipliers: DifficultyMultipliers,

    /// Difficulty used when a label is missing or invalid
    pub default_difficulty: Difficulty,

    /// Consistency curve: 1 + log2(streak + 1) * growth
    pub streak_growth_factor: f64,

    /// Consistency curve ceiling
    pub max_streak_multiplier: f64,

    /// Scarcity curve floor
    pub min_scarcity_multiplier: f64,

    /// Penalty amounts
    pub penalties: PenaltySchedule,

    /// Calibration step (fraction of BASE)
    pub calibration_factor: f64,

    /// Lower bound for calibrated BASE
    pub min_base: f64,

    /// Upper bound for calibrated BASE
    pub max_base: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base: BASE,
            daily_coin_cap: DAILY_COIN_CAP,
            weekly_coin_cap: WEEKLY_COIN_CAP,
            daily_action_cap: DAILY_ACTION_CAP,
            target_daily_coins: TARGET_DAILY_COINS,
            difficulty_multipliers: DifficultyMultipliers::default(),
            default_difficulty: Difficulty::Medium,
            streak_growth_factor: STREAK_GROWTH_FACTOR,
            max_streak_multiplier: MAX_STREAK_MULTIPLIER,
            min_scarcity_multiplier: MIN_SCARCITY_MULTIPLIER,
            penalties: PenaltySchedule::default(),
            calibration_factor: CALIBRATION_FACTOR,
            min_base: MIN_BASE,
            max_base: MAX_BASE,
        }
    }
}

impl EconomyConfig {
    /// Check the policy is internally consistent
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: impl Into<String>) -> Result<()> {
            Err(EconomyError::InvalidConfig(msg.into()))
        }

        if !(self.min_base.is_finite() && self.max_base.is_finite()) || self.min_base <= 0.0 {
            return invalid("min_base and max_base must be finite and positive");
        }
        if self.min_base > self.max_base {
            return invalid(format!(
                "min_base ({}) exceeds max_base ({})",
                self.min_base, self.max_base
            ));
        }
        if !self.base.is_finite() || self.base < self.min_base || self.base > self.max_base {
            return invalid(format!(
                "base ({}) must lie within [{}, {}]",
                self.base, self.min_base, self.max_base
            ));
        }
        if self.daily_coin_cap == 0 || self.weekly_coin_cap == 0 {
            return invalid("coin caps must be positive");
        }
        if self.daily_action_cap == 0 {
            return invalid("daily_action_cap must be positive");
        }
        if !self.target_daily_coins.is_finite() || self.target_daily_coins < 0.0 {
            return invalid("target_daily_coins must be finite and non-negative");
        }
        for (difficulty, multiplier) in self.difficulty_multipliers.iter() {
            if !multiplier.is_finite() || multiplier <= 0.0 {
                return invalid(format!(
                    "multiplier for {} must be finite and positive",
                    difficulty
                ));
            }
        }
        if !self.streak_growth_factor.is_finite() || self.streak_growth_factor < 0.0 {
            return invalid("streak_growth_factor must be finite and non-negative");
        }
        if !self.max_streak_multiplier.is_finite() || self.max_streak_multiplier < 1.0 {
            return invalid("max_streak_multiplier must be at least 1.0");
        }
        if !(self.min_scarcity_multiplier > 0.0 && self.min_scarcity_multiplier <= 1.0) {
            return invalid("min_scarcity_multiplier must lie within (0, 1]");
        }
        for penalty in PenaltyType::ALL {
            if self.penalties.amount(penalty) > 0 {
                return invalid(format!("penalty {} must not be positive", penalty));
            }
        }
        if !(self.calibration_factor >= 0.0 && self.calibration_factor < 1.0) {
            return invalid("calibration_factor must lie within [0, 1)");
        }
        Ok(())
    }
}
