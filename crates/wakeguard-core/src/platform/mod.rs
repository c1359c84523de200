//! Capability interfaces the core is written against.
//!
//! Every platform singleton (lock capability, visibility source, activation
//! flag, display surfaces) is reached through one of these traits so the
//! lock state machine can run against the in-memory [`sim`] platform as
//! easily as against a real host.

pub mod sim;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{ErrorKind, PlatformError};
use crate::events::Event;
use crate::visibility::VisibilityState;

/// Kind of lock requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockKind {
    Screen,
}

/// Fire-once observer attached to a single lock handle.
pub type ReleaseObserver = Box<dyn FnOnce() + Send>;

#[async_trait]
pub trait LockCapability: Send + Sync {
    /// Whether the platform offers a screen lock at all.
    fn is_supported(&self) -> bool;

    /// Ask the platform for a lock. Suspends until the platform answers.
    async fn request_lock(&self, kind: LockKind) -> Result<Box<dyn LockHandle>, PlatformError>;
}

/// A granted lock.
///
/// The handle emits exactly one release notification, either when
/// [`release`](LockHandle::release) resolves or when the platform reclaims
/// the lock. The notification carries no reason.
#[async_trait]
pub trait LockHandle: Send {
    async fn release(&mut self) -> Result<(), PlatformError>;

    fn on_release(&mut self, observer: ReleaseObserver);
}

pub trait VisibilitySource: Send + Sync {
    fn current(&self) -> VisibilityState;

    /// Change notifications. The receiver starts at the current value.
    fn subscribe(&self) -> watch::Receiver<VisibilityState>;
}

pub trait ActivationSource: Send + Sync {
    /// Whether the user has interacted with the page since load.
    fn has_been_active(&self) -> bool;
}

/// Presentational sink for status, timer, support and control events.
pub trait StatusDisplay: Send + Sync {
    fn render(&self, event: &Event);
}

/// Presentational sink for user-visible errors.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, kind: ErrorKind, message: &str);
}
