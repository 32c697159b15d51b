//! Command-line interface for farsound.
//!
//! This module provides the daemon entry point (`run`) and one-shot
//! commands for scanning, searching, and mount management.

mod commands;

pub use commands::{Cli, Commands, run_command};
