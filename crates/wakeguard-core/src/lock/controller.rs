//! Screen lock controller.
//!
//! Owns the single platform lock handle and the lifecycle around it.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --acquire ok--> Held --release ok--> Idle
//!                       |  \--release err--> Held
//!                       \----external release----> Idle
//! ```
//!
//! The handle lives inside the `Held` variant, so "held iff a handle exists"
//! holds by construction. Every acquisition registers its own release
//! observer tagged with a fresh generation; notices for older generations
//! (for instance the one fired by an explicit release) are ignored.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::LockError;
use crate::platform::{LockCapability, LockHandle, LockKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    Idle,
    Held,
    Releasing,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockState::Idle => "idle",
            LockState::Held => "held",
            LockState::Releasing => "releasing",
        })
    }
}

/// Sent by a handle's release observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseNotice {
    pub generation: u64,
}

enum Slot {
    Idle,
    Held {
        handle: Box<dyn LockHandle>,
        generation: u64,
    },
    Releasing {
        generation: u64,
    },
}

pub struct LockController {
    capability: Arc<dyn LockCapability>,
    slot: Slot,
    generation: u64,
    notices: mpsc::UnboundedSender<ReleaseNotice>,
}

impl LockController {
    /// Create an idle controller and the channel its release notices arrive on.
    pub fn new(
        capability: Arc<dyn LockCapability>,
    ) -> (Self, mpsc::UnboundedReceiver<ReleaseNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            capability,
            slot: Slot::Idle,
            generation: 0,
            notices: tx,
        };
        (controller, rx)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> LockState {
        match self.slot {
            Slot::Idle => LockState::Idle,
            Slot::Held { .. } => LockState::Held,
            Slot::Releasing { .. } => LockState::Releasing,
        }
    }

    pub fn is_held(&self) -> bool {
        matches!(self.slot, Slot::Held { .. })
    }

    pub fn has_handle(&self) -> bool {
        self.is_held()
    }

    pub fn is_supported(&self) -> bool {
        self.capability.is_supported()
    }

    /// Generation of the most recent successful acquisition (0 before any).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Request the screen lock.
    ///
    /// Rejected with [`LockError::InvalidState`] unless idle; never queued.
    pub async fn acquire(&mut self) -> Result<(), LockError> {
        if !matches!(self.slot, Slot::Idle) {
            return Err(LockError::InvalidState {
                op: "acquire",
                state: self.state(),
            });
        }
        if !self.capability.is_supported() {
            return Err(LockError::NotSupported);
        }

        let mut handle = match self.capability.request_lock(LockKind::Screen).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(%err, "screen lock request refused");
                return Err(LockError::Denied(err));
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let notices = self.notices.clone();
        handle.on_release(Box::new(move || {
            // Receiver gone means the session is shutting down.
            let _ = notices.send(ReleaseNotice { generation });
        }));
        self.slot = Slot::Held { handle, generation };
        info!(generation, "screen lock acquired");
        Ok(())
    }

    /// Release the held lock. On failure the lock stays held and the call
    /// may be retried.
    pub async fn release(&mut self) -> Result<(), LockError> {
        let (mut handle, generation) =
            match std::mem::replace(&mut self.slot, Slot::Idle) {
                Slot::Held { handle, generation } => (handle, generation),
                other => {
                    self.slot = other;
                    return Err(LockError::InvalidState {
                        op: "release",
                        state: self.state(),
                    });
                }
            };

        self.slot = Slot::Releasing { generation };
        match handle.release().await {
            Ok(()) => {
                self.slot = Slot::Idle;
                info!(generation, "screen lock released");
                Ok(())
            }
            Err(err) => {
                warn!(%err, generation, "screen lock release failed");
                self.slot = Slot::Held { handle, generation };
                Err(LockError::ReleaseFailed(err))
            }
        }
    }

    /// Apply a release notice. Returns `true` when it was an external
    /// release of the currently held lock.
    pub fn handle_notice(&mut self, notice: ReleaseNotice) -> bool {
        match self.slot {
            Slot::Held { generation, .. } if generation == notice.generation => {
                self.slot = Slot::Idle;
                info!(generation, "screen lock released externally");
                true
            }
            _ => {
                debug!(
                    generation = notice.generation,
                    state = %self.state(),
                    "stale release notice ignored"
                );
                false
            }
        }
    }
}
