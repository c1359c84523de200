mod elapsed;
mod format;

pub use elapsed::{ElapsedTimer, TimerKind};
pub use format::format_hms;
