//! Elapsed-seconds timer.
//!
//! The timer has no thread or interval of its own. The session owns a single
//! one-second clock and calls [`ElapsedTimer::tick`] on every timer it holds;
//! only running timers advance.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped --start--> Running --stop--> Stopped
//!    ^                  |
//!    +------reset-------+   (reset also zeroes the count)
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::format::format_hms;
use crate::events::Event;

/// Which of the two session timers this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Time the page has spent in the foreground since load. Never reset.
    PageUptime,
    /// Time the screen lock has been held. Reset only by an explicit release.
    LockDuration,
}

impl TimerKind {
    pub fn label(self) -> &'static str {
        match self {
            TimerKind::PageUptime => "page uptime",
            TimerKind::LockDuration => "lock duration",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElapsedTimer {
    kind: TimerKind,
    elapsed_seconds: u64,
    running: bool,
}

impl ElapsedTimer {
    pub fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            elapsed_seconds: 0,
            running: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn display(&self) -> String {
        format_hms(self.elapsed_seconds)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Returns `false` when the timer was already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Returns `false` when the timer was already stopped.
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    /// Stop and zero the count. Always reports the zero value.
    pub fn reset(&mut self) -> Event {
        self.running = false;
        self.elapsed_seconds = 0;
        self.ticked_event()
    }

    /// Advance by one second if running.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        Some(self.ticked_event())
    }

    fn ticked_event(&self) -> Event {
        Event::TimerTicked {
            timer: self.kind,
            elapsed_seconds: self.elapsed_seconds,
            display: self.display(),
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks(timer: &mut ElapsedTimer, n: u64) {
        for _ in 0..n {
            timer.tick();
        }
    }

    #[test]
    fn stopped_timer_does_not_advance() {
        let mut timer = ElapsedTimer::new(TimerKind::PageUptime);
        assert!(timer.tick().is_none());
        assert_eq!(timer.elapsed_seconds(), 0);
    }

    #[test]
    fn start_is_idempotent() {
        let mut timer = ElapsedTimer::new(TimerKind::PageUptime);
        assert!(timer.start());
        assert!(!timer.start());
        ticks(&mut timer, 3);
        assert_eq!(timer.elapsed_seconds(), 3);
    }

    #[test]
    fn stop_keeps_elapsed_and_restart_continues() {
        let mut timer = ElapsedTimer::new(TimerKind::LockDuration);
        timer.start();
        ticks(&mut timer, 5);
        assert!(timer.stop());
        assert!(!timer.stop());
        ticks(&mut timer, 5);
        assert_eq!(timer.elapsed_seconds(), 5);

        timer.start();
        ticks(&mut timer, 2);
        assert_eq!(timer.elapsed_seconds(), 7);
    }

    #[test]
    fn reset_zeroes_and_reports_zero() {
        let mut timer = ElapsedTimer::new(TimerKind::LockDuration);
        timer.start();
        ticks(&mut timer, 42);
        match timer.reset() {
            Event::TimerTicked {
                timer: kind,
                elapsed_seconds,
                display,
                ..
            } => {
                assert_eq!(kind, TimerKind::LockDuration);
                assert_eq!(elapsed_seconds, 0);
                assert_eq!(display, "00:00:00");
            }
            other => panic!("Expected TimerTicked, got {other:?}"),
        }
        assert!(!timer.is_running());
    }

    #[test]
    fn tick_reports_formatted_value() {
        let mut timer = ElapsedTimer::new(TimerKind::PageUptime);
        timer.start();
        ticks(&mut timer, 3660);
        match timer.tick() {
            Some(Event::TimerTicked { display, .. }) => assert_eq!(display, "01:01:01"),
            other => panic!("Expected TimerTicked, got {other:?}"),
        }
    }
}
