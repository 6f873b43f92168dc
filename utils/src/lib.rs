//! Shared utilities: logging setup, duration formatting, operation counters.

pub mod logging;
pub mod stats;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use stats::OperationStats;
pub use time::format_duration;
