//! Command line interface for kodegen_bundler_deb.
//!
//! Parses arguments, runs the `build` or `preview` command, and reports
//! results through the colored [`OutputManager`].

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args)
}
