//! Shared utilities for the Tide staking core.

pub mod logging;
pub mod stats;
pub mod time;

pub use logging::{init_logging, init_tracing, LogFormat};
pub use stats::OperationStats;
pub use time::{format_duration, format_ether};
