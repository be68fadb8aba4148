//! The `stropt` command-line driver.
//!
//! Parses the command line, builds the type catalog, runs the C front-end
//! over the given source, and prints the layout of the requested type,
//! optionally followed by a reordered layout with less padding.

mod commands;
mod logging;
mod options;
mod render;

pub use commands::{report, run, CliError};
pub use logging::{init_tracing, LOG_ENV};
pub use options::{parse_args, Command, Input, Options, OptionsError, Override, HELP, USAGE};
