//! Page-level wiring of the lock lifecycle.
//!
//! A [`WakeSession`] owns the lock controller, the reconciler, the optional
//! activation poller and the two timers, and forwards every observable change
//! to the display collaborators. All handlers take `&mut self`, so two lock
//! requests can never be in flight at once.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::error::LockError;
use crate::events::{Event, LockStatus};
use crate::lock::{
    ActivationPoller, LockController, LockState, PollDecision, PollerState, ReleaseNotice,
};
use crate::platform::sim::{RecordingDisplay, SimulatedPlatform};
use crate::platform::{
    ActivationSource, ErrorReporter, LockCapability, StatusDisplay, VisibilitySource,
};
use crate::reconcile::{AcquireMode, Reconciler};
use crate::storage::Config;
use crate::timer::{ElapsedTimer, TimerKind};
use crate::visibility::VisibilityState;

/// Platform capabilities a session runs against.
#[derive(Clone)]
pub struct Platform {
    pub lock: Arc<dyn LockCapability>,
    pub visibility: Arc<dyn VisibilitySource>,
    pub activation: Arc<dyn ActivationSource>,
}

impl Platform {
    pub fn simulated(sim: &SimulatedPlatform) -> Self {
        Self {
            lock: Arc::new(sim.clone()),
            visibility: Arc::new(sim.clone()),
            activation: Arc::new(sim.clone()),
        }
    }
}

/// Presentational collaborators.
#[derive(Clone)]
pub struct Presenter {
    pub display: Arc<dyn StatusDisplay>,
    pub errors: Arc<dyn ErrorReporter>,
}

impl Presenter {
    pub fn recording(recorder: &RecordingDisplay) -> Self {
        Self {
            display: Arc::new(recorder.clone()),
            errors: Arc::new(recorder.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    pub mode: AcquireMode,
    /// Fall back to activation polling when the load-time request is refused.
    pub activation_fallback: bool,
    /// Clock ticks between activation checks.
    pub poll_interval_ticks: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: AcquireMode::Explicit,
            activation_fallback: true,
            poll_interval_ticks: 1,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.lock.mode,
            activation_fallback: config.lock.activation_fallback,
            poll_interval_ticks: config.clock.poll_interval_ticks,
        }
    }
}

/// Who asked for the lock. Decides what a failure means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquireOrigin {
    /// The automatic request made at load in immediate mode.
    Initial,
    /// The user switched the toggle on.
    User,
    /// The page came back to the foreground, or the lock was reclaimed.
    Reconcile,
    /// The poller saw user activation.
    ActivationRetry,
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: AcquireMode,
    pub lock: LockState,
    pub intent: bool,
    pub visibility: VisibilityState,
    pub poller: Option<PollerState>,
    pub control_enabled: bool,
    pub page_uptime: String,
    pub lock_duration: String,
}

pub struct WakeSession {
    options: SessionOptions,
    controller: LockController,
    reconciler: Reconciler,
    poller: Option<ActivationPoller>,
    page_timer: ElapsedTimer,
    lock_timer: ElapsedTimer,
    visibility: Arc<dyn VisibilitySource>,
    activation: Arc<dyn ActivationSource>,
    presenter: Presenter,
    control_enabled: bool,
}

impl WakeSession {
    /// Build a session and the channel its lock release notices arrive on.
    pub fn new(
        platform: Platform,
        presenter: Presenter,
        options: SessionOptions,
    ) -> (Self, mpsc::UnboundedReceiver<ReleaseNotice>) {
        let (controller, notices) = LockController::new(platform.lock);
        let session = Self {
            reconciler: Reconciler::new(options.mode),
            options,
            controller,
            poller: None,
            page_timer: ElapsedTimer::new(TimerKind::PageUptime),
            lock_timer: ElapsedTimer::new(TimerKind::LockDuration),
            visibility: platform.visibility,
            activation: platform.activation,
            presenter,
            control_enabled: true,
        };
        (session, notices)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn lock_state(&self) -> LockState {
        self.controller.state()
    }

    pub fn intent(&self) -> bool {
        self.reconciler.intent()
    }

    pub fn poller_state(&self) -> Option<PollerState> {
        self.poller.as_ref().map(ActivationPoller::state)
    }

    pub fn control_enabled(&self) -> bool {
        self.control_enabled
    }

    pub fn timer(&self, kind: TimerKind) -> &ElapsedTimer {
        match kind {
            TimerKind::PageUptime => &self.page_timer,
            TimerKind::LockDuration => &self.lock_timer,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.reconciler.mode(),
            lock: self.controller.state(),
            intent: self.reconciler.intent(),
            visibility: self.visibility.current(),
            poller: self.poller_state(),
            control_enabled: self.control_enabled,
            page_uptime: self.page_timer.display(),
            lock_duration: self.lock_timer.display(),
        }
    }

    // ── Handlers ─────────────────────────────────────────────────────

    /// Page load: report support, start the uptime timer and, in immediate
    /// mode, make the automatic request.
    pub async fn start(&mut self) {
        let supported = self.controller.is_supported();
        self.render(Event::SupportDetected {
            supported,
            at: Utc::now(),
        });
        self.show_status(LockStatus::Idle);

        if self.visibility.current().is_foreground() {
            self.page_timer.start();
        }
        if self.reconciler.mode() == AcquireMode::Immediate {
            self.request(AcquireOrigin::Initial).await;
        }
    }

    /// The user switched the lock toggle.
    pub async fn set_intent(&mut self, intent: bool) {
        if self.reconciler.mode() == AcquireMode::Immediate {
            debug!(intent, "immediate mode has no toggle; ignoring");
            return;
        }
        if intent && !self.control_enabled {
            debug!("lock control is disabled; ignoring");
            return;
        }
        self.reconciler.set_intent(intent);
        if intent {
            self.request(AcquireOrigin::User).await;
        } else {
            self.release().await;
        }
    }

    pub async fn on_visibility(&mut self, state: VisibilityState) {
        match state {
            VisibilityState::Background => {
                self.reconciler
                    .on_background([&mut self.page_timer, &mut self.lock_timer]);
            }
            VisibilityState::Foreground => {
                self.page_timer.start();
                if self.controller.is_held() {
                    self.lock_timer.start();
                }
                self.reconcile().await;
            }
        }
    }

    pub async fn on_release_notice(&mut self, notice: ReleaseNotice) {
        if !self.controller.handle_notice(notice) {
            return;
        }
        // Not a user action: the toggle and the lock timer's total stay.
        self.show_status(LockStatus::ExternallyReleased);
        self.lock_timer.stop();
        self.reconcile().await;
    }

    /// One clock tick: advance timers, then let the poller look for
    /// activation. A hidden page is not polled.
    pub async fn on_tick(&mut self) {
        for event in [self.page_timer.tick(), self.lock_timer.tick()]
            .into_iter()
            .flatten()
        {
            self.render(event);
        }

        let foreground = self.visibility.current().is_foreground();
        let decision = match self.poller.as_mut() {
            Some(poller) if foreground => poller.tick(self.activation.as_ref()),
            _ => PollDecision::Finished,
        };
        if decision == PollDecision::Retry {
            self.request(AcquireOrigin::ActivationRetry).await;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn reconcile(&mut self) {
        let wanted = self.reconciler.should_acquire(
            self.visibility.current(),
            self.controller.state(),
            self.poller_state(),
        );
        if wanted {
            self.request(AcquireOrigin::Reconcile).await;
        }
    }

    async fn request(&mut self, origin: AcquireOrigin) {
        if self.controller.state() != LockState::Idle {
            debug!(?origin, state = %self.controller.state(), "lock not idle; request skipped");
            return;
        }
        match self.controller.acquire().await {
            Ok(()) => {
                self.show_status(LockStatus::Held);
                self.lock_timer.start();
            }
            Err(err) => self.acquire_failed(origin, err),
        }
    }

    fn acquire_failed(&mut self, origin: AcquireOrigin, err: LockError) {
        match err {
            LockError::NotSupported => {
                self.raise(&err);
                self.show_status(LockStatus::NotSupported);
                self.control_enabled = false;
                self.render(Event::ControlAvailability {
                    enabled: false,
                    at: Utc::now(),
                });
                self.uncheck_toggle();
            }
            LockError::Denied(cause) if origin == AcquireOrigin::ActivationRetry => {
                let exhausted = match self.poller.as_mut() {
                    Some(poller) => poller.retry_failed(cause),
                    None => LockError::PollingExhausted(cause),
                };
                self.raise(&exhausted);
                self.show_status(LockStatus::PollingExhausted);
            }
            LockError::Denied(_) => {
                self.raise(&err);
                self.show_status(LockStatus::Denied);
                self.uncheck_toggle();

                // A hidden page is refused whatever the gesture state, so the
                // fallback waits for the first refusal on a visible page.
                let automatic =
                    matches!(origin, AcquireOrigin::Initial | AcquireOrigin::Reconcile);
                let gated = automatic
                    && self.reconciler.mode() == AcquireMode::Immediate
                    && self.visibility.current().is_foreground()
                    && self.options.activation_fallback
                    && self.poller.is_none()
                    && !self.activation.has_been_active();
                if gated {
                    self.poller = Some(ActivationPoller::start(self.options.poll_interval_ticks));
                    self.show_status(LockStatus::AwaitingActivation);
                }
            }
            LockError::InvalidState { .. } => {
                debug!(%err, "acquire rejected");
            }
            other => self.raise(&other),
        }
    }

    async fn release(&mut self) {
        if !self.controller.is_held() {
            debug!(state = %self.controller.state(), "nothing to release");
            return;
        }
        match self.controller.release().await {
            Ok(()) => {
                self.show_status(LockStatus::Idle);
                let zeroed = self.lock_timer.reset();
                self.render(zeroed);
            }
            Err(err) => {
                self.raise(&err);
                self.show_status(LockStatus::ReleaseFailed);
            }
        }
    }

    /// A failed request turns the toggle back off so the user can retry.
    fn uncheck_toggle(&mut self) {
        if self.reconciler.set_intent(false) {
            self.render(Event::IntentChanged {
                intent: false,
                at: Utc::now(),
            });
        }
    }

    fn show_status(&self, status: LockStatus) {
        self.render(Event::status(status));
    }

    fn raise(&self, err: &LockError) {
        if err.is_terminal() {
            error!(%err, "screen lock unavailable for this session");
        } else {
            warn!(%err, "surfacing lock error");
        }
        self.presenter.errors.report(err.kind(), &err.to_string());
    }

    fn render(&self, event: Event) {
        self.presenter.display.render(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(
        sim: &SimulatedPlatform,
        recorder: &RecordingDisplay,
        mode: AcquireMode,
    ) -> (WakeSession, mpsc::UnboundedReceiver<ReleaseNotice>) {
        let options = SessionOptions {
            mode,
            ..SessionOptions::default()
        };
        WakeSession::new(Platform::simulated(sim), Presenter::recording(recorder), options)
    }

    #[tokio::test]
    async fn start_reports_support_and_idle() {
        let sim = SimulatedPlatform::new();
        let recorder = RecordingDisplay::new();
        let (mut session, _notices) = session(&sim, &recorder, AcquireMode::Explicit);
        session.start().await;

        assert!(matches!(
            recorder.events().first(),
            Some(Event::SupportDetected { supported: true, .. })
        ));
        assert_eq!(recorder.last_status(), Some(LockStatus::Idle));
        assert!(session.timer(TimerKind::PageUptime).is_running());
        assert_eq!(sim.request_count(), 0);
    }

    #[tokio::test]
    async fn toggle_off_resets_lock_timer() {
        let sim = SimulatedPlatform::new();
        let recorder = RecordingDisplay::new();
        let (mut session, _notices) = session(&sim, &recorder, AcquireMode::Explicit);
        session.start().await;
        session.set_intent(true).await;
        for _ in 0..3 {
            session.on_tick().await;
        }
        assert_eq!(session.timer(TimerKind::LockDuration).elapsed_seconds(), 3);

        session.set_intent(false).await;
        assert_eq!(session.lock_state(), LockState::Idle);
        assert_eq!(recorder.last_status(), Some(LockStatus::Idle));
        assert_eq!(session.timer(TimerKind::LockDuration).elapsed_seconds(), 0);
        assert_eq!(session.timer(TimerKind::PageUptime).elapsed_seconds(), 3);
    }

    #[tokio::test]
    async fn release_failure_keeps_lock_and_reports() {
        let sim = SimulatedPlatform::new();
        let recorder = RecordingDisplay::new();
        let (mut session, _notices) = session(&sim, &recorder, AcquireMode::Explicit);
        session.start().await;
        session.set_intent(true).await;
        sim.fail_next_releases(1);

        session.set_intent(false).await;
        assert_eq!(session.lock_state(), LockState::Held);
        assert_eq!(recorder.last_status(), Some(LockStatus::ReleaseFailed));
        assert_eq!(recorder.errors(), vec![crate::error::ErrorKind::ReleaseFailed]);
    }

    #[tokio::test]
    async fn denied_toggle_turns_itself_off() {
        let sim = SimulatedPlatform::new();
        sim.deny_next_requests(1);
        let recorder = RecordingDisplay::new();
        let (mut session, _notices) = session(&sim, &recorder, AcquireMode::Explicit);
        session.start().await;

        session.set_intent(true).await;
        assert!(!session.intent());
        assert_eq!(recorder.last_status(), Some(LockStatus::Denied));
        assert!(recorder
            .events()
            .iter()
            .any(|e| matches!(e, Event::IntentChanged { intent: false, .. })));
        // Denied in explicit mode never starts the fallback.
        assert_eq!(session.poller_state(), None);
    }

    #[tokio::test]
    async fn immediate_mode_acquires_at_start_and_ignores_toggle() {
        let sim = SimulatedPlatform::new();
        let recorder = RecordingDisplay::new();
        let (mut session, _notices) = session(&sim, &recorder, AcquireMode::Immediate);
        session.start().await;
        assert_eq!(session.lock_state(), LockState::Held);

        session.set_intent(false).await;
        assert_eq!(session.lock_state(), LockState::Held);
        assert_eq!(sim.release_count(), 0);
    }

    #[tokio::test]
    async fn snapshot_reflects_session() {
        let sim = SimulatedPlatform::new();
        let recorder = RecordingDisplay::new();
        let (mut session, _notices) = session(&sim, &recorder, AcquireMode::Explicit);
        session.start().await;
        session.set_intent(true).await;
        session.on_tick().await;

        let snap = session.snapshot();
        assert_eq!(snap.mode, AcquireMode::Explicit);
        assert_eq!(snap.lock, LockState::Held);
        assert!(snap.intent);
        assert_eq!(snap.visibility, VisibilityState::Foreground);
        assert_eq!(snap.page_uptime, "00:00:01");
        assert_eq!(snap.lock_duration, "00:00:01");
    }
}
