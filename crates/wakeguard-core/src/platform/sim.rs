//! In-memory platform.
//!
//! Implements every capability trait over shared state so tests and the CLI
//! demo can drive visibility, user activation and external reclaim by hand.
//! Like a browser, hiding the page reclaims any held lock and refuses new
//! requests until the page is visible again.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;

use super::{
    ActivationSource, ErrorReporter, LockCapability, LockHandle, LockKind, ReleaseObserver,
    StatusDisplay, VisibilitySource,
};
use crate::error::{ErrorKind, PlatformError};
use crate::events::{Event, LockStatus};
use crate::visibility::VisibilityState;

#[derive(Default)]
struct SimState {
    unsupported: bool,
    require_activation: bool,
    activated: bool,
    /// Number of upcoming requests to refuse regardless of other conditions.
    deny_requests: u32,
    /// Number of upcoming release calls to fail.
    fail_releases: u32,
    requests: u32,
    releases: u32,
    next_handle: u64,
    /// Live handles and their registered observer, if any.
    live: BTreeMap<u64, Option<ReleaseObserver>>,
}

/// Shared, cloneable simulated host.
#[derive(Clone)]
pub struct SimulatedPlatform {
    state: Arc<Mutex<SimState>>,
    visibility: Arc<watch::Sender<VisibilityState>>,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlatform {
    /// A visible page on a platform that grants every request.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(VisibilityState::Foreground);
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
            visibility: Arc::new(tx),
        }
    }

    /// A platform without any screen lock capability.
    pub fn unsupported() -> Self {
        let platform = Self::new();
        platform.state().unsupported = true;
        platform
    }

    /// Refuse lock requests until the user has interacted.
    pub fn with_activation_required(self) -> Self {
        self.state().require_activation = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Controls ─────────────────────────────────────────────────────

    /// Change visibility. Going to the background reclaims held locks.
    pub fn set_visibility(&self, next: VisibilityState) {
        if next == VisibilityState::Background {
            self.reclaim();
        }
        self.visibility.send_replace(next);
    }

    /// Record a genuine user interaction. Never resets.
    pub fn interact(&self) {
        self.state().activated = true;
    }

    pub fn deny_next_requests(&self, count: u32) {
        self.state().deny_requests = count;
    }

    pub fn fail_next_releases(&self, count: u32) {
        self.state().fail_releases = count;
    }

    /// Release every live lock from the platform side and notify observers.
    /// Returns how many locks were reclaimed.
    pub fn reclaim(&self) -> usize {
        let observers: Vec<Option<ReleaseObserver>> = {
            let mut state = self.state();
            std::mem::take(&mut state.live).into_values().collect()
        };
        let count = observers.len();
        for observer in observers.into_iter().flatten() {
            observer();
        }
        count
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn request_count(&self) -> u32 {
        self.state().requests
    }

    pub fn release_count(&self) -> u32 {
        self.state().releases
    }

    pub fn live_handles(&self) -> usize {
        self.state().live.len()
    }
}

#[async_trait]
impl LockCapability for SimulatedPlatform {
    fn is_supported(&self) -> bool {
        !self.state().unsupported
    }

    async fn request_lock(&self, kind: LockKind) -> Result<Box<dyn LockHandle>, PlatformError> {
        let hidden = !self.visibility.borrow().is_foreground();
        let mut state = self.state();
        state.requests += 1;

        if state.unsupported {
            return Err(PlatformError::new("NotSupportedError", "screen lock unavailable"));
        }
        if hidden {
            return Err(PlatformError::not_allowed("the page is not visible"));
        }
        if state.require_activation && !state.activated {
            return Err(PlatformError::not_allowed(
                "a user gesture is required before requesting a lock",
            ));
        }
        if state.deny_requests > 0 {
            state.deny_requests -= 1;
            return Err(PlatformError::not_allowed("permission denied"));
        }

        state.next_handle += 1;
        let id = state.next_handle;
        state.live.insert(id, None);
        tracing::debug!(id, ?kind, "simulated lock granted");
        Ok(Box::new(SimHandle {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

impl VisibilitySource for SimulatedPlatform {
    fn current(&self) -> VisibilityState {
        *self.visibility.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<VisibilityState> {
        self.visibility.subscribe()
    }
}

impl ActivationSource for SimulatedPlatform {
    fn has_been_active(&self) -> bool {
        self.state().activated
    }
}

struct SimHandle {
    id: u64,
    state: Arc<Mutex<SimState>>,
}

impl SimHandle {
    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LockHandle for SimHandle {
    async fn release(&mut self) -> Result<(), PlatformError> {
        let observer = {
            let mut state = self.state();
            if state.fail_releases > 0 {
                state.fail_releases -= 1;
                return Err(PlatformError::new("InvalidStateError", "release rejected"));
            }
            state.releases += 1;
            // Already reclaimed: releasing again is a no-op, as on a real host.
            state.live.remove(&self.id).flatten()
        };
        if let Some(observer) = observer {
            observer();
        }
        Ok(())
    }

    fn on_release(&mut self, observer: ReleaseObserver) {
        let mut state = self.state();
        match state.live.get_mut(&self.id) {
            Some(slot) => *slot = Some(observer),
            None => {
                drop(state);
                observer();
            }
        }
    }
}

/// Display and error sink that keeps everything it was shown.
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn events_mut(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events_mut().clone()
    }

    pub fn statuses(&self) -> Vec<LockStatus> {
        self.events_mut()
            .iter()
            .filter_map(|event| match event {
                Event::StatusChanged { status, .. } => Some(*status),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<LockStatus> {
        self.statuses().last().copied()
    }

    pub fn errors(&self) -> Vec<ErrorKind> {
        self.events_mut()
            .iter()
            .filter_map(|event| match event {
                Event::ErrorRaised { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }
}

impl StatusDisplay for RecordingDisplay {
    fn render(&self, event: &Event) {
        self.events_mut().push(event.clone());
    }
}

impl ErrorReporter for RecordingDisplay {
    fn report(&self, kind: ErrorKind, message: &str) {
        self.events_mut().push(Event::ErrorRaised {
            kind,
            message: message.to_string(),
            at: chrono::Utc::now(),
        });
    }
}
