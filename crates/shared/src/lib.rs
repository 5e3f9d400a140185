//! Shared library for the AniList client workspace.
//!
//! This crate provides the plumbing used by the client crate and its CLI:
//! - Configuration management
//! - Scoped SQLite connections
//! - Logging infrastructure
//! - Wall-clock abstraction for time-dependent code

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use db::Database;
pub use logging::LogConfig;
