mod controller;
mod poller;

pub use controller::{LockController, LockState, ReleaseNotice};
pub use poller::{ActivationPoller, PollDecision, PollerState};
