//! # warden-cli
//!
//! Operator commands for Warden. The root binary parses [`Cli`], loads the
//! configuration it points at, and calls [`Cli::execute`].

pub mod commands;
pub mod output;

pub use commands::Cli;
