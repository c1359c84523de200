//! Single-threaded session loop.
//!
//! Serializes the one-second clock, lock release notices, visibility
//! transitions and user commands into a [`WakeSession`]. Only one handler
//! runs at a time; each runs to completion, including any lock request it
//! awaits, before the next event is taken.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::lock::ReleaseNotice;
use crate::session::{SessionSnapshot, WakeSession};
use crate::visibility::VisibilityMonitor;

/// User-side input to a running session.
#[derive(Debug)]
pub enum Command {
    /// Switch the lock toggle on.
    Enable,
    /// Switch the lock toggle off.
    Disable,
    /// Reply with a snapshot of the session.
    Status(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Run `session` until a `Shutdown` command arrives or every command sender
/// is dropped. Returns the session for inspection.
pub async fn run(
    mut session: WakeSession,
    mut monitor: VisibilityMonitor,
    mut notices: mpsc::UnboundedReceiver<ReleaseNotice>,
    mut commands: mpsc::Receiver<Command>,
    tick: Duration,
) -> WakeSession {
    let mut clock = interval_at(Instant::now() + tick, tick);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

    session.start().await;
    info!(?tick, "session running");

    loop {
        tokio::select! {
            _ = clock.tick() => session.on_tick().await,
            Some(notice) = notices.recv() => session.on_release_notice(notice).await,
            Some(state) = monitor.changed() => {
                debug!(?state, "visibility changed");
                session.on_visibility(state).await;
            }
            command = commands.recv() => match command {
                Some(Command::Enable) => session.set_intent(true).await,
                Some(Command::Disable) => session.set_intent(false).await,
                Some(Command::Status(reply)) => {
                    // Requester may have given up waiting.
                    let _ = reply.send(session.snapshot());
                }
                Some(Command::Shutdown) | None => break,
            },
        }
    }

    info!("session stopped");
    session
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::LockStatus;
    use crate::lock::LockState;
    use crate::platform::sim::{RecordingDisplay, SimulatedPlatform};
    use crate::reconcile::AcquireMode;
    use crate::session::{Platform, Presenter, SessionOptions};
    use crate::visibility::VisibilityState;

    async fn status(tx: &mpsc::Sender<Command>) -> SessionSnapshot {
        let (reply, rx) = oneshot::channel();
        tx.send(Command::Status(reply)).await.unwrap();
        rx.await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn loop_drives_timers_and_reacquires_after_hide() {
        let sim = SimulatedPlatform::new();
        let recorder = RecordingDisplay::new();
        let (session, notices) = WakeSession::new(
            Platform::simulated(&sim),
            Presenter::recording(&recorder),
            SessionOptions {
                mode: AcquireMode::Explicit,
                ..SessionOptions::default()
            },
        );
        let monitor = VisibilityMonitor::new(Arc::new(sim.clone()));
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(run(session, monitor, notices, rx, Duration::from_secs(1)));

        tx.send(Command::Enable).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        let snap = status(&tx).await;
        assert_eq!(snap.lock, LockState::Held);
        assert_eq!(snap.lock_duration, "00:00:03");

        sim.set_visibility(VisibilityState::Background);
        tokio::time::sleep(Duration::from_secs(5)).await;
        let snap = status(&tx).await;
        assert_eq!(snap.lock, LockState::Idle);
        assert_eq!(snap.page_uptime, "00:00:03");
        assert!(snap.intent);

        sim.set_visibility(VisibilityState::Foreground);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let snap = status(&tx).await;
        assert_eq!(snap.lock, LockState::Held);
        assert_eq!(sim.request_count(), 2);

        tx.send(Command::Shutdown).await.unwrap();
        let session = task.await.unwrap();
        assert_eq!(session.lock_state(), LockState::Held);
        assert!(recorder.statuses().contains(&LockStatus::ExternallyReleased));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_commands_stops_loop() {
        let sim = SimulatedPlatform::new();
        let recorder = RecordingDisplay::new();
        let (session, notices) = WakeSession::new(
            Platform::simulated(&sim),
            Presenter::recording(&recorder),
            SessionOptions::default(),
        );
        let monitor = VisibilityMonitor::new(Arc::new(sim.clone()));
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        let session = run(session, monitor, notices, rx, Duration::from_secs(1)).await;
        assert_eq!(session.lock_state(), LockState::Idle);
    }
}
