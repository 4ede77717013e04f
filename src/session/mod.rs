pub mod config;
pub mod controller;
mod loop_worker;
pub mod observer;
mod sampler;
pub mod state;

pub use config::SessionConfig;
pub use controller::SessionDriver;
pub use observer::{LoggingObserver, SessionObserver};
pub use state::{SessionSnapshot, SessionState, SessionStatus, SessionSummary};
