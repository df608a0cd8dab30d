//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod check;
pub mod run;
pub mod store;
