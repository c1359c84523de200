//! Page visibility observation.
//!
//! [`VisibilityMonitor`] is a passive wrapper around a [`VisibilitySource`]:
//! it reads the current state and turns the source's change notifications
//! into transitions. It holds no timers or locks; what a transition means is
//! decided by the session and its reconciler.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::platform::VisibilitySource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityState {
    Foreground,
    Background,
}

impl VisibilityState {
    pub fn is_foreground(self) -> bool {
        self == VisibilityState::Foreground
    }
}

pub struct VisibilityMonitor {
    source: Arc<dyn VisibilitySource>,
    rx: watch::Receiver<VisibilityState>,
    last: VisibilityState,
}

impl VisibilityMonitor {
    pub fn new(source: Arc<dyn VisibilitySource>) -> Self {
        let mut rx = source.subscribe();
        let last = *rx.borrow_and_update();
        Self { source, rx, last }
    }

    /// Synchronous read of the platform state.
    pub fn current(&self) -> VisibilityState {
        self.source.current()
    }

    pub fn last_observed(&self) -> VisibilityState {
        self.last
    }

    /// Wait for the next transition.
    ///
    /// Notifications that repeat the last observed value are swallowed.
    /// Returns `None` once the source has gone away.
    pub async fn changed(&mut self) -> Option<VisibilityState> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let next = *self.rx.borrow_and_update();
            if next != self.last {
                self.last = next;
                return Some(next);
            }
        }
    }

    /// Drop the current subscription and start observing from the present state.
    pub fn resubscribe(&mut self) {
        self.rx = self.source.subscribe();
        self.last = *self.rx.borrow_and_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::sim::SimulatedPlatform;

    #[tokio::test]
    async fn reports_transitions_only() {
        let platform = SimulatedPlatform::new();
        let mut monitor = VisibilityMonitor::new(Arc::new(platform.clone()));
        assert_eq!(monitor.last_observed(), VisibilityState::Foreground);

        // Same value twice, then a real transition.
        platform.set_visibility(VisibilityState::Foreground);
        platform.set_visibility(VisibilityState::Background);
        assert_eq!(monitor.changed().await, Some(VisibilityState::Background));
        assert_eq!(monitor.current(), VisibilityState::Background);

        platform.set_visibility(VisibilityState::Foreground);
        assert_eq!(monitor.changed().await, Some(VisibilityState::Foreground));
    }

    #[tokio::test]
    async fn resubscribe_starts_from_present_state() {
        let platform = SimulatedPlatform::new();
        let mut monitor = VisibilityMonitor::new(Arc::new(platform.clone()));
        platform.set_visibility(VisibilityState::Background);
        monitor.resubscribe();
        assert_eq!(monitor.last_observed(), VisibilityState::Background);

        platform.set_visibility(VisibilityState::Foreground);
        assert_eq!(monitor.changed().await, Some(VisibilityState::Foreground));
    }
}
