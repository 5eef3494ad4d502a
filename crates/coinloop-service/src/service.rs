//! Coinloop economy service
//!
//! Every operation is one optimistic transaction over the stored state:
//! load (or create), advance to the clock's `now`, compute, record, commit.
//! When the commit loses a race the whole transaction runs again against
//! the fresh state, so a failed attempt never leaves a partial write and
//! concurrent callers crossing a week boundary calibrate exactly once.

use crate::config::{CoinloopConfig, ServiceConfig};
use crate::error::{Result, ServiceError};

use chrono::{DateTime, Utc};
use coinloop_economics::{
    calculate_penalty, AdvanceReport, Calendar, CalibrationResult, Clock, Difficulty,
    EconomyConfig, EconomyState, EconomyStatus, PenaltyOutcome, RewardCalculator,
    RewardOutcome, SystemClock, UsagePattern,
};
use coinloop_storage::StateStore;
use serde::{Deserialize, Serialize};

/// A habit or task was completed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Difficulty label; missing uses the configured default
    pub difficulty: Option<String>,

    /// Streak after this completion
    #[serde(default)]
    pub streak: i64,
}

impl CompletionEvent {
    pub fn new(difficulty: impl Into<String>, streak: i64) -> Self {
        Self {
            difficulty: Some(difficulty.into()),
            streak,
        }
    }
}

/// What a completion earned, and the state it left behind
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionReceipt {
    pub reward: RewardOutcome,
    pub advance: AdvanceReport,
    pub status: EconomyStatus,
}

/// Transactional economy service
pub struct EconomyService<S, C = SystemClock> {
    calculator: RewardCalculator,
    calendar: Calendar,
    settings: ServiceConfig,
    store: S,
    clock: C,
}

impl<S: StateStore, C: Clock> EconomyService<S, C> {
    /// Create a service over a store; the configuration is validated first
    pub fn new(config: &CoinloopConfig, store: S, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            calculator: RewardCalculator::new(config.economy.clone()),
            calendar: Calendar::from_config(&config.calendar),
            settings: config.service.clone(),
            store,
            clock,
        })
    }

    /// Active economy policy
    pub fn config(&self) -> &EconomyConfig {
        self.calculator.config()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Award coins for a completion
    pub fn complete(&self, event: &CompletionEvent) -> Result<CompletionReceipt> {
        if self.settings.strict_difficulty {
            if let Some(label) = event.difficulty.as_deref() {
                label.parse::<Difficulty>()?;
            }
        }

        let ((reward, advance), state) = self.transact(|state, _now, advance| {
            let request = state.reward_request(event.difficulty.clone(), event.streak);
            let reward = self.calculator.calculate(&request);
            state.record_completion(reward.coins);
            Ok((reward, advance.clone()))
        })?;

        tracing::info!(
            coins = reward.coins,
            coins_today = state.coins_today,
            coins_this_week = state.coins_this_week,
            "Completion rewarded"
        );

        Ok(CompletionReceipt {
            reward,
            advance,
            status: state.economy_status(self.config()),
        })
    }

    /// Deduct a penalty from `balance`; only applied penalties are logged
    pub fn apply_penalty(&self, penalty_type: &str, balance: u64) -> Result<PenaltyOutcome> {
        let (outcome, _) = self.transact(|state, now, _| {
            let outcome = calculate_penalty(self.config(), penalty_type, balance);
            if let Some(kind) = outcome.penalty_type.filter(|_| outcome.applied) {
                state.record_penalty(
                    kind,
                    outcome.penalty,
                    outcome.balance_before(),
                    outcome.new_balance,
                    now,
                );
            }
            Ok(outcome)
        })?;

        if outcome.applied {
            tracing::info!(
                penalty_type,
                penalty = outcome.penalty,
                new_balance = outcome.new_balance,
                "Penalty applied"
            );
        }
        Ok(outcome)
    }

    /// Current status, after any due resets are persisted
    pub fn status(&self) -> Result<EconomyStatus> {
        let (_, state) = self.transact(|_, _, _| Ok(()))?;
        Ok(state.economy_status(self.config()))
    }

    /// Run a weekly reset now, regardless of the calendar
    pub fn force_calibration(&self) -> Result<CalibrationResult> {
        let (result, _) = self.transact(|state, now, _| {
            Ok(state.perform_weekly_reset(self.config(), now))
        })?;
        Ok(result)
    }

    /// Expected daily coins for a usage pattern at the configured BASE
    pub fn estimate_daily_coins(&self, pattern: &UsagePattern) -> u64 {
        self.calculator.estimate_daily_coins(pattern)
    }

    /// Run `op` inside a load/advance/commit cycle, retrying on conflicts
    fn transact<T>(
        &self,
        mut op: impl FnMut(&mut EconomyState, DateTime<Utc>, &AdvanceReport) -> Result<T>,
    ) -> Result<(T, EconomyState)> {
        let attempts = self.settings.max_commit_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let now = self.clock.now();
            let (expected_version, mut state) = match self.store.load()? {
                Some(stored) => (Some(stored.version), stored.state),
                None => (None, EconomyState::new(self.config(), now)),
            };

            let advance = state.advance(self.config(), &self.calendar, now);
            let value = op(&mut state, now, &advance)?;

            match self.store.commit(expected_version, &state) {
                Ok(version) => {
                    tracing::debug!(version, attempt, "Transaction committed");
                    return Ok((value, state));
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(attempt, error = %e, "Commit conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::CommitRetriesExhausted { attempts })
    }
}
