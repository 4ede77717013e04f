//! Logging macros switched by a module-level `ENABLE_LOGS` flag.
//!
//! Hot loops (the sampler runs ten times a second) can be silenced at
//! compile time without touching the global `RUST_LOG` filter:
//! ```ignore
//! const ENABLE_LOGS: bool = false;
//!
//! use crate::{log_info, log_warn};
//!
//! log_warn!("landmark sample failed: {err}");
//! ```
//! The macros are exported at the crate root and read `ENABLE_LOGS` from the
//! module that invokes them, so that module must define it.

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}
