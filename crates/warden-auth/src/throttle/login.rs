//! Escalating lockout after repeated failed logins.
//!
//! State lives on the user row as [`LoginAttemptState`]; this type only
//! computes transitions. Concurrent failures on one account are
//! last-write-wins.

use chrono::{DateTime, Duration, Utc};

use warden_core::config::ThrottleConfig;
use warden_core::error::AppError;
use warden_entity::user::LoginAttemptState;

/// Decides whether a login may proceed and how a failure updates the state.
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    config: ThrottleConfig,
}

impl LoginThrottle {
    /// Creates a throttle from configuration.
    pub fn new(config: ThrottleConfig) -> Self {
        Self { config }
    }

    /// Reject the attempt while a lockout is in force.
    pub fn check(&self, state: &LoginAttemptState, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.config.enabled && state.is_locked(now) {
            return Err(AppError::attempts_exceeded(
                "Too many failed login attempts. Try again later.",
            ));
        }
        Ok(())
    }

    /// State after one more failed attempt at `now`.
    ///
    /// Failures during an active lockout leave the state untouched. A quiet
    /// gap longer than `reset_after_seconds` starts a fresh count.
    pub fn record_failure(
        &self,
        state: &LoginAttemptState,
        now: DateTime<Utc>,
    ) -> LoginAttemptState {
        if state.is_locked(now) {
            return *state;
        }

        let reset_after = Duration::seconds(to_seconds(self.config.reset_after_seconds));
        let window_open = state
            .last_attempt
            .is_some_and(|last| now - last <= reset_after);

        let failure_count = if window_open {
            state.failure_count.saturating_add(1)
        } else {
            1
        };

        LoginAttemptState {
            failure_count,
            last_attempt: Some(now),
            locked_until: self
                .lockout_for(failure_count)
                .and_then(|d| now.checked_add_signed(d)),
        }
    }

    /// Lockout length after `failure_count` consecutive failures.
    ///
    /// `None` below the threshold. From the threshold on, one step per
    /// failure past it, capped at `max_lockout_seconds`.
    pub fn lockout_for(&self, failure_count: u32) -> Option<Duration> {
        let threshold = self.config.max_attempts.max(1);
        if failure_count < threshold {
            return None;
        }

        let steps = u64::from(failure_count - threshold + 1);
        let seconds = self
            .config
            .lockout_step_seconds
            .saturating_mul(steps)
            .min(self.config.max_lockout_seconds);
        Some(Duration::seconds(to_seconds(seconds)))
    }
}

fn to_seconds(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX / 1_000)
}
