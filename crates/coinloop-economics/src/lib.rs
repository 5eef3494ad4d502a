//! # Coinloop Economics - Habit Coin Economy
//!
//! Deterministic coin economy for a habit tracker. Completing habits and
//! tasks mints coins, negative events burn them, and a weekly controller
//! nudges BASE so average daily output converges on a target.
//!
//! ## Key Features
//!
//! - **Multiplicative rewards**: BASE × Difficulty × Consistency × Scarcity
//! - **Hard caps**: daily and weekly ceilings, never exceeded
//! - **Zero-floor penalties**: balances never go negative
//! - **Auto-calibration**: ±5% BASE adjustment outside a ±10% dead zone
//!
//! ## Reward Formula
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Difficulty   easy 1.0 · medium 1.5 · hard 2.0 · extreme 3.0      │
//! │  Consistency  min(2.0, 1 + log2(streak + 1) × 0.2)                │
//! │  Scarcity     max(0.5, 1 - completed_today / 10)                  │
//! │  Coins        max(1, round(BASE × D × C × S)) → daily → weekly    │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Default Policy
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | BASE | 5 (calibrated within 2..=10) |
//! | Daily cap | 60 coins |
//! | Weekly cap | 350 coins |
//! | Target daily output | 50 coins |
//!
//! Every function here is pure over its inputs except for
//! [`EconomyState`], which callers load, mutate and persist themselves.

pub mod calendar;
pub mod calibration;
pub mod config;
pub mod error;
pub mod multipliers;
pub mod penalty;
pub mod rewards;
pub mod state;

// Re-exports
pub use calendar::{Calendar, CalendarConfig, Clock, ManualClock, SystemClock};
pub use calibration::{
    average_daily_coins, calculate_calibration, CalibrationReason, CalibrationResult,
};
pub use config::{DifficultyMultipliers, EconomyConfig, PenaltySchedule};
pub use error::{EconomyError, Result};
pub use multipliers::{
    consistency_multiplier, difficulty_multiplier, scarcity_multiplier, Difficulty,
    DifficultyMultiplier,
};
pub use penalty::{apply_penalty, calculate_penalty, PenaltyOutcome, PenaltyType};
pub use rewards::{
    CapReason, RewardBreakdown, RewardCalculator, RewardOutcome, RewardRequest, UsagePattern,
};
pub use state::{
    AdvanceReport, CalibrationRecord, DailyRecord, EconomyState, EconomyStatus, PenaltyRecord,
};

/// Default economy policy
pub mod constants {
    /// Per-completion reward before multipliers
    pub const BASE: f64 = 5.0;

    /// Hard ceiling on coins earned per day
    pub const DAILY_COIN_CAP: u64 = 60;

    /// Hard ceiling on coins earned per week
    pub const WEEKLY_COIN_CAP: u64 = 350;

    /// Completions per day at which scarcity bottoms out
    pub const DAILY_ACTION_CAP: u32 = 10;

    /// Calibration target for average daily output
    pub const TARGET_DAILY_COINS: f64 = 50.0;

    pub const STREAK_GROWTH_FACTOR: f64 = 0.2;
    pub const MAX_STREAK_MULTIPLIER: f64 = 2.0;
    pub const MIN_SCARCITY_MULTIPLIER: f64 = 0.5;

    /// Weekly BASE step (5%)
    pub const CALIBRATION_FACTOR: f64 = 0.05;

    pub const MIN_BASE: f64 = 2.0;
    pub const MAX_BASE: f64 = 10.0;

    /// Archived days kept for calibration
    pub const DAILY_HISTORY_LIMIT: usize = 7;

    /// One year of weekly calibrations
    pub const CALIBRATION_HISTORY_LIMIT: usize = 52;

    pub const PENALTY_LOG_LIMIT: usize = 100;
}

pub use constants::*;
