//! # Auto-Calibration
//!
//! Weekly proportional-band controller on BASE.
//!
//! ```text
//!   avg > target × 1.1  →  BASE × (1 - factor)   above_target
//!   avg < target × 0.9  →  BASE × (1 + factor)   below_target
//!   otherwise           →  BASE unchanged        no_change
//! ```
//!
//! The result is clamped to `[min_base, max_base]` and rounded to 2 decimals.

use crate::config::EconomyConfig;
use crate::rewards::round2;
use crate::state::DailyRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper edge of the dead zone, as a fraction of target
pub const UPPER_BAND: f64 = 1.1;

/// Lower edge of the dead zone, as a fraction of target
pub const LOWER_BAND: f64 = 0.9;

/// Why calibration moved (or didn't move) BASE
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationReason {
    AboveTarget,
    BelowTarget,
    NoChange,
}

impl fmt::Display for CalibrationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AboveTarget => "above_target",
            Self::BelowTarget => "below_target",
            Self::NoChange => "no_change",
        })
    }
}

/// Proposed BASE adjustment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub previous_base: f64,
    pub new_base: f64,
    /// Signed adjustment in percent (e.g. -5.0)
    pub adjustment: f64,
    pub reason: CalibrationReason,
    pub avg_daily_coins: f64,
    pub target: f64,
}

impl CalibrationResult {
    /// Whether BASE should be replaced
    pub fn is_change(&self) -> bool {
        self.reason != CalibrationReason::NoChange
    }
}

/// Propose a new BASE from the average daily output
pub fn calculate_calibration(
    config: &EconomyConfig,
    avg_daily_coins: f64,
    current_base: f64,
) -> CalibrationResult {
    let target = config.target_daily_coins;

    let (adjustment, reason) = if avg_daily_coins > target * UPPER_BAND {
        (-config.calibration_factor, CalibrationReason::AboveTarget)
    } else if avg_daily_coins < target * LOWER_BAND {
        (config.calibration_factor, CalibrationReason::BelowTarget)
    } else {
        (0.0, CalibrationReason::NoChange)
    };

    let proposed = current_base * (1.0 + adjustment);
    let new_base = round2(proposed.clamp(config.min_base, config.max_base));

    CalibrationResult {
        previous_base: current_base,
        new_base,
        adjustment: (adjustment * 1000.0).round() / 10.0,
        reason,
        avg_daily_coins,
        target,
    }
}

/// Mean coins per archived day (0 for an empty window)
pub fn average_daily_coins(history: &[DailyRecord]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let total: u64 = history.iter().map(|day| day.coins).sum();
    total as f64 / history.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn config() -> EconomyConfig {
        EconomyConfig::default()
    }

    fn week_of(coins: &[u64]) -> Vec<DailyRecord> {
        coins
            .iter()
            .enumerate()
            .map(|(i, &coins)| DailyRecord {
                date: Utc.with_ymd_and_hms(2026, 3, 2 + i as u32, 9, 0, 0).unwrap(),
                coins,
                completions: 3,
            })
            .collect()
    }

    #[test]
    fn test_dead_zone() {
        let result = calculate_calibration(&config(), 50.0, 5.0);
        assert_eq!(result.reason, CalibrationReason::NoChange);
        assert_eq!(result.new_base, 5.0);
        assert_eq!(result.adjustment, 0.0);
        assert!(!result.is_change());

        // band edges are inclusive of no_change
        assert_eq!(calculate_calibration(&config(), 55.0, 5.0).reason, CalibrationReason::NoChange);
        assert_eq!(calculate_calibration(&config(), 45.0, 5.0).reason, CalibrationReason::NoChange);
    }

    #[test]
    fn test_above_target() {
        let result = calculate_calibration(&config(), 100.0, 5.0);
        assert_eq!(result.reason, CalibrationReason::AboveTarget);
        assert_eq!(result.new_base, 4.75);
        assert_eq!(result.adjustment, -5.0);
        assert!(result.new_base >= config().min_base);
    }

    #[test]
    fn test_below_target_from_history() {
        let history = week_of(&[20, 30, 25, 25, 25, 20, 30]);
        let avg = average_daily_coins(&history);
        assert_eq!(avg, 25.0);

        let result = calculate_calibration(&config(), avg, 5.0);
        assert_eq!(result.reason, CalibrationReason::BelowTarget);
        assert_eq!(result.new_base, 5.25);
        assert_eq!(result.adjustment, 5.0);
        assert_eq!(result.target, 50.0);
        assert_eq!(result.previous_base, 5.0);
    }

    #[test]
    fn test_bounds_clamp() {
        let result = calculate_calibration(&config(), 0.0, 9.9);
        assert_eq!(result.new_base, 10.0);

        let result = calculate_calibration(&config(), 500.0, 2.05);
        assert_eq!(result.new_base, 2.0);
    }

    #[test]
    fn test_empty_history_average() {
        assert_eq!(average_daily_coins(&[]), 0.0);
    }

    #[test]
    fn test_reason_serializes_snake_case() {
        let json = serde_json::to_string(&CalibrationReason::BelowTarget).unwrap();
        assert_eq!(json, "\"below_target\"");
        assert_eq!(CalibrationReason::NoChange.to_string(), "no_change");
    }
}
