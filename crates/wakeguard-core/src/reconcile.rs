//! Visibility reconciliation policy.
//!
//! This is the one place where visibility, user intent and lock state are
//! examined together. It decides; the session acts.

use serde::{Deserialize, Serialize};

use crate::lock::{LockState, PollerState};
use crate::timer::ElapsedTimer;
use crate::visibility::VisibilityState;

/// How a session decides it wants the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquireMode {
    /// The user turns the lock on and off with a toggle.
    #[default]
    Explicit,
    /// The lock is requested as soon as the page loads; intent is always on.
    Immediate,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    mode: AcquireMode,
    intent: bool,
}

impl Reconciler {
    pub fn new(mode: AcquireMode) -> Self {
        Self {
            mode,
            intent: mode == AcquireMode::Immediate,
        }
    }

    pub fn mode(&self) -> AcquireMode {
        self.mode
    }

    pub fn intent(&self) -> bool {
        self.intent
    }

    /// Record an explicit user choice. Returns whether the intent changed.
    /// In immediate mode the intent is fixed and this is a no-op.
    pub fn set_intent(&mut self, intent: bool) -> bool {
        if self.mode == AcquireMode::Immediate || self.intent == intent {
            return false;
        }
        self.intent = intent;
        true
    }

    /// Whether a foreground page should request the lock again.
    ///
    /// While the activation fallback is waiting, or after it gave up, no
    /// automatic attempt is made.
    pub fn should_acquire(
        &self,
        visibility: VisibilityState,
        lock: LockState,
        poller: Option<PollerState>,
    ) -> bool {
        let fallback_blocks = matches!(poller, Some(PollerState::Waiting | PollerState::Done));
        self.intent && lock == LockState::Idle && visibility.is_foreground() && !fallback_blocks
    }

    /// Background policy: stop every timer, keeping elapsed values.
    pub fn on_background<'a>(&self, timers: impl IntoIterator<Item = &'a mut ElapsedTimer>) {
        for timer in timers {
            timer.stop();
        }
    }
}
