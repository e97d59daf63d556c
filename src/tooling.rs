//! Tooling & Integration Layer
//!
//! Command-line entry points over the crawler and task layers.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
