//! # Reward Multipliers
//!
//! Pure functions feeding the reward formula.
//!
//! | Multiplier | Input | Curve | Range |
//! |------------|-------|-------|-------|
//! | Difficulty | difficulty label | fixed table | 1.0 - 3.0 |
//! | Consistency | current streak | 1 + log2(streak + 1) * 0.2 | 1.0 - 2.0 |
//! | Scarcity | completions today | 1 - completed / 10 | 0.5 - 1.0 |
//!
//! ## Consistency examples
//!
//! - Streak 0: 1.0
//! - Streak 1: 1.2
//! - Streak 7: 1.6
//! - Streak 30: 1.99
//! - Streak 100: 2.0 (capped)

use crate::config::EconomyConfig;
use crate::error::EconomyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty levels. Closed enum: custom values are never accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Simple habits like drinking water
    Easy,
    /// Moderate effort like 30 minutes of exercise
    Medium,
    /// Challenging tasks requiring focus
    Hard,
    /// Major accomplishments
    Extreme,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Extreme];

    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Extreme => "extreme",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = EconomyError;

    /// Strict parse. Labels are matched exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| EconomyError::InvalidDifficulty(s.to_string()))
    }
}

/// Resolved difficulty multiplier
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyMultiplier {
    /// Difficulty actually used
    pub difficulty: Difficulty,
    /// Multiplier value
    pub multiplier: f64,
    /// True when the label was missing or invalid and the default was substituted
    pub used_default: bool,
}

/// Difficulty multiplier for a label.
///
/// Never fails: a missing or unknown label falls back to the configured
/// default difficulty, flags `used_default` and logs a warning.
pub fn difficulty_multiplier(config: &EconomyConfig, label: Option<&str>) -> DifficultyMultiplier {
    match label.map(Difficulty::from_str) {
        Some(Ok(difficulty)) => DifficultyMultiplier {
            difficulty,
            multiplier: config.difficulty_multipliers.get(difficulty),
            used_default: false,
        },
        other => {
            let fallback = config.default_difficulty;
            match other {
                Some(_) => tracing::warn!(
                    label = label.unwrap_or_default(),
                    fallback = %fallback,
                    "Invalid difficulty, using default"
                ),
                None => tracing::warn!(fallback = %fallback, "Missing difficulty, using default"),
            }
            DifficultyMultiplier {
                difficulty: fallback,
                multiplier: config.difficulty_multipliers.get(fallback),
                used_default: true,
            }
        }
    }
}

/// Consistency (streak) multiplier.
///
/// `min(max_streak_multiplier, 1 + log2(streak + 1) * streak_growth_factor)`.
/// Negative streaks count as 0.
pub fn consistency_multiplier(config: &EconomyConfig, streak: i64) -> f64 {
    let streak = streak.max(0) as f64;
    let multiplier = 1.0 + (streak + 1.0).log2() * config.streak_growth_factor;
    multiplier.min(config.max_streak_multiplier)
}

/// Scarcity (diminishing returns) multiplier.
///
/// `max(min_scarcity_multiplier, 1 - completed_today / daily_action_cap)`.
/// Negative counts are treated as 0.
pub fn scarcity_multiplier(config: &EconomyConfig, completed_today: i64) -> f64 {
    if config.daily_action_cap == 0 {
        return config.min_scarcity_multiplier;
    }
    let completed = completed_today.max(0) as f64;
    let multiplier = 1.0 - completed / config.daily_action_cap as f64;
    multiplier.max(config.min_scarcity_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> EconomyConfig {
        EconomyConfig::default()
    }

    #[test]
    fn test_difficulty_table() {
        let config = config();
        assert_eq!(difficulty_multiplier(&config, Some("easy")).multiplier, 1.0);
        assert_eq!(difficulty_multiplier(&config, Some("medium")).multiplier, 1.5);
        assert_eq!(difficulty_multiplier(&config, Some("hard")).multiplier, 2.0);
        assert_eq!(difficulty_multiplier(&config, Some("extreme")).multiplier, 3.0);
        assert!(!difficulty_multiplier(&config, Some("hard")).used_default);
    }

    #[test]
    fn test_invalid_difficulty_falls_back() {
        let config = config();
        for label in [Some("legendary"), Some(""), Some("EASY"), None] {
            let resolved = difficulty_multiplier(&config, label);
            assert_eq!(resolved.difficulty, Difficulty::Medium);
            assert_eq!(resolved.multiplier, 1.5);
            assert!(resolved.used_default);
        }
    }

    #[test]
    fn test_strict_parse() {
        assert_eq!("extreme".parse::<Difficulty>().unwrap(), Difficulty::Extreme);
        assert!(matches!(
            "nightmare".parse::<Difficulty>(),
            Err(EconomyError::InvalidDifficulty(_))
        ));
    }

    #[test]
    fn test_difficulty_serde_lowercase() {
        let json = serde_json::to_string(&Difficulty::Hard).unwrap();
        assert_eq!(json, "\"hard\"");
    }

    #[test]
    fn test_consistency_examples() {
        let config = config();
        assert!((consistency_multiplier(&config, 0) - 1.0).abs() < 1e-9);
        assert!((consistency_multiplier(&config, 1) - 1.2).abs() < 1e-9);
        assert!((consistency_multiplier(&config, 7) - 1.6).abs() < 1e-9);
        assert!((consistency_multiplier(&config, 30) - 1.99).abs() < 0.01);
        assert_eq!(consistency_multiplier(&config, 100), 2.0);
    }

    #[test]
    fn test_negative_inputs_clamped() {
        let config = config();
        assert_eq!(consistency_multiplier(&config, -4), consistency_multiplier(&config, 0));
        assert_eq!(scarcity_multiplier(&config, -3), 1.0);
    }

    #[test]
    fn test_scarcity_examples() {
        let config = config();
        assert_eq!(scarcity_multiplier(&config, 0), 1.0);
        assert!((scarcity_multiplier(&config, 3) - 0.7).abs() < 1e-9);
        assert_eq!(scarcity_multiplier(&config, 5), 0.5);
        assert_eq!(scarcity_multiplier(&config, 10), 0.5);
        assert_eq!(scarcity_multiplier(&config, 50), 0.5);
    }

    proptest! {
        #[test]
        fn prop_consistency_bounded_and_monotonic(streak in 0i64..100_000) {
            let config = config();
            let here = consistency_multiplier(&config, streak);
            let next = consistency_multiplier(&config, streak + 1);
            prop_assert!(here >= 1.0);
            prop_assert!(here <= config.max_streak_multiplier);
            prop_assert!(next >= here);
        }

        #[test]
        fn prop_scarcity_bounded_and_non_increasing(completed in 0i64..10_000) {
            let config = config();
            let here = scarcity_multiplier(&config, completed);
            let next = scarcity_multiplier(&config, completed + 1);
            prop_assert!(here <= 1.0);
            prop_assert!(here >= config.min_scarcity_multiplier);
            prop_assert!(next <= here);
            if completed >= config.daily_action_cap as i64 {
                prop_assert_eq!(here, config.min_scarcity_multiplier);
            }
        }
    }
}
