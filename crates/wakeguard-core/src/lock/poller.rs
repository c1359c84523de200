//! Activation-gated retry.
//!
//! Some hosts refuse a screen lock until the user has interacted with the
//! page. When the automatic request made at load is refused that way, the
//! poller checks the activation flag on every poll tick and asks for exactly
//! one more attempt the first time the flag is set.
//!
//! ```text
//! Waiting --activation seen--> Retried --retry failed--> Done
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LockError, PlatformError};
use crate::platform::ActivationSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollerState {
    Waiting,
    Retried,
    Done,
}

/// What the caller should do after a poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Keep waiting; nothing to do this tick.
    Wait,
    /// Issue the single retry now.
    Retry,
    /// Polling is over.
    Finished,
}

#[derive(Debug, Clone)]
pub struct ActivationPoller {
    state: PollerState,
    /// Clock ticks between activation checks.
    interval_ticks: u32,
    ticks_since_check: u32,
    checks: u32,
}

impl ActivationPoller {
    /// Start in `Waiting`, checking every `interval_ticks` clock ticks.
    pub fn start(interval_ticks: u32) -> Self {
        info!(interval_ticks, "waiting for user activation before retrying");
        Self {
            state: PollerState::Waiting,
            interval_ticks: interval_ticks.max(1),
            ticks_since_check: 0,
            checks: 0,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn is_waiting(&self) -> bool {
        self.state == PollerState::Waiting
    }

    /// Number of activation checks performed so far.
    pub fn checks(&self) -> u32 {
        self.checks
    }

    pub fn tick(&mut self, activation: &dyn ActivationSource) -> PollDecision {
        if self.state != PollerState::Waiting {
            return PollDecision::Finished;
        }

        self.ticks_since_check += 1;
        if self.ticks_since_check < self.interval_ticks {
            return PollDecision::Wait;
        }
        self.ticks_since_check = 0;
        self.checks += 1;

        if activation.has_been_active() {
            debug!(checks = self.checks, "user activation observed");
            self.state = PollerState::Retried;
            PollDecision::Retry
        } else {
            PollDecision::Wait
        }
    }

    /// The retry failed: no more automatic attempts.
    pub fn retry_failed(&mut self, cause: PlatformError) -> LockError {
        self.state = PollerState::Done;
        LockError::PollingExhausted(cause)
    }
}
