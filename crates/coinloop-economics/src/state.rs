//! # Economy State
//!
//! The persisted aggregate behind the coin economy: today's and this week's
//! totals, the calibrated BASE, and three bounded history logs.
//!
//! | Log | Capacity | Fed by |
//! |-----|----------|--------|
//! | `daily_coin_history` | 7 days | daily reset |
//! | `calibration_history` | 52 entries | weekly reset (changes only) |
//! | `penalty_log` | 100 entries | applied penalties |
//!
//! Time only moves when an event observes it: [`EconomyState::advance`]
//! runs the daily reset, then the weekly reset, whenever a boundary has
//! passed since the last one. Running it twice at the same instant is a no-op.

use crate::calendar::Calendar;
use crate::calibration::{
    average_daily_coins, calculate_calibration, CalibrationReason, CalibrationResult,
};
use crate::config::EconomyConfig;
use crate::constants::*;
use crate::penalty::PenaltyType;
use crate::rewards::RewardRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One archived day
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// When the archived day started (its daily reset)
    pub date: DateTime<Utc>,
    pub coins: u64,
    pub completions: u64,
}

/// One BASE change
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub date: DateTime<Utc>,
    pub previous_base: f64,
    pub new_base: f64,
    pub avg_daily_coins: f64,
    pub reason: CalibrationReason,
}

/// One applied penalty
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub date: DateTime<Utc>,
    pub penalty_type: PenaltyType,
    pub amount: u64,
    pub balance_before: u64,
    pub balance_after: u64,
}

/// What [`EconomyState::advance`] did
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvanceReport {
    pub daily_reset: bool,
    /// Present when a weekly reset ran
    pub calibration: Option<CalibrationResult>,
}

impl AdvanceReport {
    pub fn is_noop(&self) -> bool {
        !self.daily_reset && self.calibration.is_none()
    }
}

/// Read-only snapshot for display
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomyStatus {
    pub current_base: f64,
    pub coins_today: u64,
    pub completions_today: u64,
    pub coins_this_week: u64,
    pub completions_this_week: u64,
    pub daily_coin_cap: u64,
    pub weekly_coin_cap: u64,
    pub remaining_today: u64,
    pub remaining_this_week: u64,
    pub last_calibration: Option<CalibrationRecord>,
}

/// Economy state aggregate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomyState {
    /// Calibrated BASE, always within `[min_base, max_base]`
    pub current_base: f64,

    pub coins_today: u64,
    pub completions_today: u64,

    pub coins_this_week: u64,
    pub completions_this_week: u64,

    pub last_daily_reset: Option<DateTime<Utc>>,
    pub last_weekly_reset: Option<DateTime<Utc>>,

    #[serde(default)]
    pub calibration_history: Vec<CalibrationRecord>,

    #[serde(default)]
    pub penalty_log: Vec<PenaltyRecord>,

    #[serde(default)]
    pub daily_coin_history: Vec<DailyRecord>,
}

impl EconomyState {
    /// Fresh state whose day and week both start at `now`
    pub fn new(config: &EconomyConfig, now: DateTime<Utc>) -> Self {
        Self {
            current_base: config.base,
            coins_today: 0,
            completions_today: 0,
            coins_this_week: 0,
            completions_this_week: 0,
            last_daily_reset: Some(now),
            last_weekly_reset: Some(now),
            calibration_history: Vec::new(),
            penalty_log: Vec::new(),
            daily_coin_history: Vec::new(),
        }
    }

    /// Run whichever resets are due, daily first
    pub fn advance(
        &mut self,
        config: &EconomyConfig,
        calendar: &Calendar,
        now: DateTime<Utc>,
    ) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        self.clamp_base(config);

        if calendar.needs_daily_reset(self.last_daily_reset, now) {
            self.perform_daily_reset(now);
            report.daily_reset = true;
        }
        if calendar.needs_weekly_reset(self.last_weekly_reset, now) {
            report.calibration = Some(self.perform_weekly_reset(config, now));
        }

        report
    }

    /// Pull `current_base` back within the configured bounds.
    ///
    /// The bounds may have been narrowed since the base was calibrated.
    /// Returns true if the base moved.
    pub fn clamp_base(&mut self, config: &EconomyConfig) -> bool {
        let clamped = if self.current_base.is_finite() {
            self.current_base.clamp(config.min_base, config.max_base)
        } else {
            config.base
        };
        if clamped == self.current_base {
            return false;
        }

        tracing::warn!(
            stored_base = self.current_base,
            base = clamped,
            min_base = config.min_base,
            max_base = config.max_base,
            "Stored BASE outside configured bounds, clamping"
        );
        self.current_base = clamped;
        true
    }

    /// Archive the current day and zero the daily counters.
    ///
    /// A state that never had a daily reset has no day to attribute the
    /// counters to, so nothing is archived.
    pub fn perform_daily_reset(&mut self, now: DateTime<Utc>) {
        if let Some(started) = self.last_daily_reset {
            push_bounded(
                &mut self.daily_coin_history,
                DailyRecord {
                    date: started,
                    coins: self.coins_today,
                    completions: self.completions_today,
                },
                DAILY_HISTORY_LIMIT,
            );
        }

        tracing::info!(
            coins = self.coins_today,
            completions = self.completions_today,
            "Daily reset"
        );

        self.coins_today = 0;
        self.completions_today = 0;
        self.last_daily_reset = Some(now);
    }

    /// Calibrate BASE from the archived days and zero the weekly counters
    pub fn perform_weekly_reset(
        &mut self,
        config: &EconomyConfig,
        now: DateTime<Utc>,
    ) -> CalibrationResult {
        let avg = average_daily_coins(&self.daily_coin_history);
        let calibration = calculate_calibration(config, avg, self.current_base);

        if calibration.is_change() {
            push_bounded(
                &mut self.calibration_history,
                CalibrationRecord {
                    date: now,
                    previous_base: calibration.previous_base,
                    new_base: calibration.new_base,
                    avg_daily_coins: calibration.avg_daily_coins,
                    reason: calibration.reason,
                },
                CALIBRATION_HISTORY_LIMIT,
            );
            self.current_base = calibration.new_base;
        }

        tracing::info!(
            reason = %calibration.reason,
            previous_base = calibration.previous_base,
            new_base = self.current_base,
            avg_daily_coins = avg,
            "Weekly reset"
        );

        self.coins_this_week = 0;
        self.completions_this_week = 0;
        self.last_weekly_reset = Some(now);

        calibration
    }

    /// Count an awarded completion
    pub fn record_completion(&mut self, coins: u64) {
        self.coins_today = self.coins_today.saturating_add(coins);
        self.completions_today += 1;
        self.coins_this_week = self.coins_this_week.saturating_add(coins);
        self.completions_this_week += 1;
    }

    /// Log an applied penalty
    pub fn record_penalty(
        &mut self,
        penalty_type: PenaltyType,
        amount: u64,
        balance_before: u64,
        balance_after: u64,
        now: DateTime<Utc>,
    ) {
        push_bounded(
            &mut self.penalty_log,
            PenaltyRecord {
                date: now,
                penalty_type,
                amount,
                balance_before,
                balance_after,
            },
            PENALTY_LOG_LIMIT,
        );
    }

    /// Reward inputs drawn from the current counters and calibrated BASE
    pub fn reward_request(&self, difficulty: Option<String>, streak: i64) -> RewardRequest {
        RewardRequest {
            difficulty,
            streak,
            completed_today: i64::try_from(self.completions_today).unwrap_or(i64::MAX),
            coins_today: self.coins_today,
            coins_this_week: self.coins_this_week,
            base_override: Some(self.current_base),
        }
    }

    /// Snapshot for display
    pub fn economy_status(&self, config: &EconomyConfig) -> EconomyStatus {
        EconomyStatus {
            current_base: self.current_base,
            coins_today: self.coins_today,
            completions_today: self.completions_today,
            coins_this_week: self.coins_this_week,
            completions_this_week: self.completions_this_week,
            daily_coin_cap: config.daily_coin_cap,
            weekly_coin_cap: config.weekly_coin_cap,
            remaining_today: config.daily_coin_cap.saturating_sub(self.coins_today),
            remaining_this_week: config.weekly_coin_cap.saturating_sub(self.coins_this_week),
            last_calibration: self.calibration_history.last().cloned(),
        }
    }
}

/// Append, evicting the oldest entries beyond `limit`
fn push_bounded<T>(log: &mut Vec<T>, entry: T, limit: usize) {
    log.push(entry);
    if log.len() > limit {
        let excess = log.len() - limit;
        log.drain(..excess);
    }
}
