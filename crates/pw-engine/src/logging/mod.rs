//! Logging setup.
//!
//! Everything logs through the `log` facade; binaries call `init_logging` once.

mod init;

pub use init::{init_logging, LoggingConfig};
