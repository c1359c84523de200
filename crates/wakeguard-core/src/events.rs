use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::timer::TimerKind;

/// Semantic status codes shown next to the lock control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStatus {
    Idle,
    Held,
    /// The platform reclaimed the lock without the user asking.
    ExternallyReleased,
    NotSupported,
    Denied,
    ReleaseFailed,
    /// Initial request was refused; waiting for the user to interact.
    AwaitingActivation,
    PollingExhausted,
}

impl LockStatus {
    pub fn label(self) -> &'static str {
        match self {
            LockStatus::Idle => "inactive",
            LockStatus::Held => "active",
            LockStatus::ExternallyReleased => "inactive (released externally)",
            LockStatus::NotSupported => "not supported",
            LockStatus::Denied => "denied",
            LockStatus::ReleaseFailed => "release failed",
            LockStatus::AwaitingActivation => "waiting for user interaction",
            LockStatus::PollingExhausted => "gave up after retry",
        }
    }
}

/// Every observable change in a session produces an Event.
/// Display collaborators render them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Whether the platform offers a screen lock at all.
    SupportDetected {
        supported: bool,
        at: DateTime<Utc>,
    },
    StatusChanged {
        status: LockStatus,
        at: DateTime<Utc>,
    },
    TimerTicked {
        timer: TimerKind,
        elapsed_seconds: u64,
        display: String,
        at: DateTime<Utc>,
    },
    ErrorRaised {
        kind: ErrorKind,
        message: String,
        at: DateTime<Utc>,
    },
    /// The lock toggle was enabled or disabled as a control.
    ControlAvailability {
        enabled: bool,
        at: DateTime<Utc>,
    },
    /// The lock toggle's checked state changed without the user touching it.
    IntentChanged {
        intent: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn status(status: LockStatus) -> Self {
        Event::StatusChanged {
            status,
            at: Utc::now(),
        }
    }
}
