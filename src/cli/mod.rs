//! CLI module for pr-reviewer - command-line interface.
//!
//! One invocation reviews one pull request, as triggered by a PR comment.

pub mod commands;

pub use commands::Cli;
