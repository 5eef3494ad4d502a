//! # Reward Calculation
//!
//! Converts one completion event into a coin award.
//!
//! ```text
//! coins = round(BASE × Difficulty × Consistency × Scarcity)   (at least 1)
//!       → clamped to the remaining daily allowance
//!       → clamped to the remaining weekly allowance
//! ```
//!
//! This is the only source of coin generation. The calculator is pure: the
//! caller supplies the current counters and persists the result.

use crate::config::EconomyConfig;
use crate::multipliers::{
    consistency_multiplier, difficulty_multiplier, scarcity_multiplier, Difficulty,
};
use serde::{Deserialize, Serialize};

/// Which ceiling reduced an award
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapReason {
    Daily,
    Weekly,
}

/// Inputs for one completion
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardRequest {
    /// Difficulty label; missing or invalid labels fall back to the default
    pub difficulty: Option<String>,

    /// Current streak (negative counts as 0)
    pub streak: i64,

    /// Completions so far today (negative counts as 0)
    pub completed_today: i64,

    /// Coins earned so far today
    pub coins_today: u64,

    /// Coins earned so far this week
    pub coins_this_week: u64,

    /// BASE to use instead of the configured one (the calibrated value)
    pub base_override: Option<f64>,
}

impl RewardRequest {
    /// Request for a difficulty label with all counters at zero
    pub fn new(difficulty: impl Into<String>) -> Self {
        Self {
            difficulty: Some(difficulty.into()),
            ..Default::default()
        }
    }
}

/// Audit trail of a reward calculation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub base: f64,
    pub difficulty: Difficulty,
    pub used_default_difficulty: bool,
    pub difficulty_multiplier: f64,
    /// Rounded to 2 decimals
    pub consistency_multiplier: f64,
    /// Rounded to 2 decimals
    pub scarcity_multiplier: f64,
    pub streak: i64,
    pub completed_today: i64,
}

/// Coins awarded for a completion
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardOutcome {
    /// Final award after caps
    pub coins: u64,

    /// Award before caps (at least 1)
    pub raw_coins: u64,

    /// Whether a cap reduced the award
    pub capped: bool,

    /// The last cap that applied; weekly overrides daily
    pub capped_reason: Option<CapReason>,

    pub breakdown: RewardBreakdown,
}

/// Usage pattern for [`RewardCalculator::estimate_daily_coins`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsagePattern {
    pub easy_count: u32,
    pub medium_count: u32,
    pub hard_count: u32,
    pub extreme_count: u32,
    pub average_streak: i64,
}

/// Reward calculator
#[derive(Clone, Debug)]
pub struct RewardCalculator {
    config: EconomyConfig,
}

impl RewardCalculator {
    /// Create a calculator over a policy
    pub fn new(config: EconomyConfig) -> Self {
        Self { config }
    }

    /// Active policy
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Calculate the coin award for one completion
    pub fn calculate(&self, request: &RewardRequest) -> RewardOutcome {
        let base = self.resolve_base(request.base_override);

        let difficulty = difficulty_multiplier(&self.config, request.difficulty.as_deref());
        let consistency = consistency_multiplier(&self.config, request.streak);
        let scarcity = scarcity_multiplier(&self.config, request.completed_today);

        let raw = (base * difficulty.multiplier * consistency * scarcity).round();
        let raw_coins = (raw as u64).max(1);

        let mut coins = raw_coins;
        let mut capped_reason = None;

        if request.coins_today.saturating_add(raw_coins) > self.config.daily_coin_cap {
            coins = self.config.daily_coin_cap.saturating_sub(request.coins_today);
            capped_reason = Some(CapReason::Daily);
        }

        if request.coins_this_week.saturating_add(coins) > self.config.weekly_coin_cap {
            coins = self.config.weekly_coin_cap.saturating_sub(request.coins_this_week);
            capped_reason = Some(CapReason::Weekly);
        }

        tracing::debug!(
            difficulty = %difficulty.difficulty,
            raw_coins,
            coins,
            capped = ?capped_reason,
            "Reward calculated"
        );

        RewardOutcome {
            coins,
            raw_coins,
            capped: capped_reason.is_some(),
            capped_reason,
            breakdown: RewardBreakdown {
                base,
                difficulty: difficulty.difficulty,
                used_default_difficulty: difficulty.used_default,
                difficulty_multiplier: difficulty.multiplier,
                consistency_multiplier: round2(consistency),
                scarcity_multiplier: round2(scarcity),
                streak: request.streak,
                completed_today: request.completed_today,
            },
        }
    }

    /// Expected coins for a day of completions.
    ///
    /// Completions run easy, then medium, hard and extreme. Scarcity and the
    /// daily cap accumulate across them; the weekly counter starts at zero.
    pub fn estimate_daily_coins(&self, pattern: &UsagePattern) -> u64 {
        let plan = [
            (Difficulty::Easy, pattern.easy_count),
            (Difficulty::Medium, pattern.medium_count),
            (Difficulty::Hard, pattern.hard_count),
            (Difficulty::Extreme, pattern.extreme_count),
        ];

        let mut total = 0u64;
        let mut completed = 0i64;
        for (difficulty, count) in plan {
            for _ in 0..count {
                let outcome = self.calculate(&RewardRequest {
                    difficulty: Some(difficulty.as_str().to_string()),
                    streak: pattern.average_streak,
                    completed_today: completed,
                    coins_today: total,
                    coins_this_week: 0,
                    base_override: None,
                });
                total += outcome.coins;
                completed += 1;
            }
        }
        total
    }

    fn resolve_base(&self, base_override: Option<f64>) -> f64 {
        match base_override {
            Some(base) if base.is_finite() => base.max(0.0),
            Some(base) => {
                tracing::warn!(base, "Non-finite BASE override, using configured BASE");
                self.config.base
            }
            None => self.config.base,
        }
    }
}

/// Round to 2 decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn calculator() -> RewardCalculator {
        RewardCalculator::new(EconomyConfig::default())
    }

    #[test]
    fn test_medium_fresh_day() {
        let outcome = calculator().calculate(&RewardRequest::new("medium"));

        assert_eq!(outcome.raw_coins, 8); // round(5 * 1.5) = round(7.5)
        assert_eq!(outcome.coins, 8);
        assert!(!outcome.capped);
        assert_eq!(outcome.capped_reason, None);
        assert_eq!(outcome.breakdown.difficulty_multiplier, 1.5);
        assert_eq!(outcome.breakdown.consistency_multiplier, 1.0);
        assert_eq!(outcome.breakdown.scarcity_multiplier, 1.0);
    }

    #[test]
    fn test_daily_cap() {
        let outcome = calculator().calculate(&RewardRequest {
            difficulty: Some("extreme".into()),
            streak: 30,
            coins_today: 55,
            ..Default::default()
        });

        assert!(outcome.raw_coins > 5);
        assert_eq!(outcome.coins, 5);
        assert!(outcome.capped);
        assert_eq!(outcome.capped_reason, Some(CapReason::Daily));
    }

    #[test]
    fn test_weekly_cap_overrides_daily_reason() {
        let outcome = calculator().calculate(&RewardRequest {
            difficulty: Some("extreme".into()),
            streak: 30,
            coins_today: 55,
            coins_this_week: 348,
            ..Default::default()
        });

        assert_eq!(outcome.coins, 2);
        assert_eq!(outcome.capped_reason, Some(CapReason::Weekly));
    }

    #[test]
    fn test_exhausted_cap_awards_zero() {
        let outcome = calculator().calculate(&RewardRequest {
            difficulty: Some("easy".into()),
            coins_today: 60,
            coins_this_week: 60,
            ..Default::default()
        });

        assert_eq!(outcome.coins, 0);
        assert_eq!(outcome.raw_coins, 5);
        assert!(outcome.capped);
    }

    #[test]
    fn test_minimum_one_coin() {
        let outcome = calculator().calculate(&RewardRequest {
            difficulty: Some("easy".into()),
            completed_today: 20,
            base_override: Some(0.5),
            ..Default::default()
        });

        assert_eq!(outcome.raw_coins, 1);
        assert_eq!(outcome.coins, 1);
    }

    #[test]
    fn test_base_override() {
        let outcome = calculator().calculate(&RewardRequest {
            difficulty: Some("hard".into()),
            base_override: Some(5.25),
            ..Default::default()
        });

        assert_eq!(outcome.breakdown.base, 5.25);
        assert_eq!(outcome.raw_coins, 11); // round(10.5)
    }

    #[test]
    fn test_non_finite_override_uses_config() {
        let outcome = calculator().calculate(&RewardRequest {
            difficulty: Some("easy".into()),
            base_override: Some(f64::NAN),
            ..Default::default()
        });

        assert_eq!(outcome.breakdown.base, 5.0);
        assert_eq!(outcome.coins, 5);
    }

    #[test]
    fn test_negative_override_floors_to_one_coin() {
        let outcome = calculator().calculate(&RewardRequest {
            difficulty: Some("easy".into()),
            base_override: Some(-3.0),
            ..Default::default()
        });

        assert_eq!(outcome.breakdown.base, 0.0);
        assert_eq!(outcome.raw_coins, 1);
        assert_eq!(outcome.coins, 1);
        assert!(!outcome.capped);
    }

    #[test]
    fn test_invalid_difficulty_flagged_in_breakdown() {
        let outcome = calculator().calculate(&RewardRequest::new("mythic"));

        assert!(outcome.breakdown.used_default_difficulty);
        assert_eq!(outcome.breakdown.difficulty, Difficulty::Medium);
        assert_eq!(outcome.coins, 8);
    }

    #[test]
    fn test_breakdown_rounds_multipliers() {
        let outcome = calculator().calculate(&RewardRequest {
            difficulty: Some("medium".into()),
            streak: 30,
            completed_today: 3,
            ..Default::default()
        });

        assert_eq!(outcome.breakdown.consistency_multiplier, 1.99);
        assert_eq!(outcome.breakdown.scarcity_multiplier, 0.7);
    }

    #[test]
    fn test_estimate_daily_coins() {
        let calc = calculator();

        assert_eq!(calc.estimate_daily_coins(&UsagePattern::default()), 0);

        // easy then medium on a fresh streak: 5 + round(7.5 * 0.9) = 5 + 7
        let pattern = UsagePattern {
            easy_count: 1,
            medium_count: 1,
            ..Default::default()
        };
        assert_eq!(calc.estimate_daily_coins(&pattern), 12);

        // a heavy day saturates at the daily cap
        let pattern = UsagePattern {
            extreme_count: 20,
            average_streak: 60,
            ..Default::default()
        };
        assert_eq!(calc.estimate_daily_coins(&pattern), 60);
    }

    #[test]
    fn test_outcome_serializes_cap_reason_lowercase() {
        let outcome = calculator().calculate(&RewardRequest {
            difficulty: Some("extreme".into()),
            coins_today: 59,
            ..Default::default()
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["capped_reason"], "daily");
    }

    proptest! {
        #[test]
        fn prop_caps_hold(
            idx in 0usize..4,
            streak in -5i64..400,
            completed in -5i64..40,
            coins_today in 0u64..=60,
            coins_this_week in 0u64..=350,
        ) {
            let calc = calculator();
            let request = RewardRequest {
                difficulty: Some(Difficulty::ALL[idx].as_str().to_string()),
                streak,
                completed_today: completed,
                coins_today,
                coins_this_week,
                base_override: None,
            };
            let outcome = calc.calculate(&request);

            prop_assert!(outcome.raw_coins >= 1);
            prop_assert!(outcome.coins <= outcome.raw_coins);
            prop_assert!(coins_today + outcome.coins <= calc.config().daily_coin_cap);
            prop_assert!(coins_this_week + outcome.coins <= calc.config().weekly_coin_cap);
            prop_assert_eq!(outcome.capped, outcome.coins < outcome.raw_coins);

            // deterministic
            prop_assert_eq!(calc.calculate(&request), outcome);
        }
    }
}
