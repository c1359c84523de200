//! # wakeguard Core Library
//!
//! Keeps a page awake by holding a platform screen lock, reconciles the lock
//! against page visibility, and falls back to waiting for user activation
//! when the platform refuses an unsolicited request.
//!
//! ## Architecture
//!
//! - **Lock Controller**: owns the single lock handle; `acquire`, `release`
//!   and external-release handling
//! - **Reconciler**: decides on foreground transitions whether to request
//!   the lock again
//! - **Activation Poller**: one gesture-gated retry after a refused
//!   load-time request
//! - **Timers**: page-uptime and lock-duration counters, formatted `hh:mm:ss`
//! - **Platform**: capability traits, plus an in-memory simulated host
//!
//! ## Key Components
//!
//! - [`WakeSession`]: page-level wiring of all of the above
//! - [`runner::run`]: single-threaded event loop around a session
//! - [`LockController`]: lock lifecycle state machine
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod lock;
pub mod platform;
pub mod reconcile;
pub mod runner;
pub mod session;
pub mod storage;
pub mod timer;
pub mod visibility;

pub use error::{ConfigError, CoreError, ErrorKind, LockError, PlatformError, Result};
pub use events::{Event, LockStatus};
pub use lock::{ActivationPoller, LockController, LockState, PollerState, ReleaseNotice};
pub use reconcile::{AcquireMode, Reconciler};
pub use runner::Command;
pub use session::{Platform, Presenter, SessionOptions, SessionSnapshot, WakeSession};
pub use storage::Config;
pub use timer::{format_hms, ElapsedTimer, TimerKind};
pub use visibility::{VisibilityMonitor, VisibilityState};
