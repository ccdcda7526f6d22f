//! Logging setup for Pawl
//!
//! Library crates only emit `tracing` events. Applications and tests call
//! one of the initialisers here once to install a subscriber.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing};
