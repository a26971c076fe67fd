//! # CLI Module
//!
//! Command-line tools for inspecting route tables (see [`crate::table`]).
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print every reachable route with mount prefixes applied:
//!
//! ```bash
//! mountrouter routes --table routes.yaml
//! mountrouter routes --table routes.yaml --json
//! ```
//!
//! ### `resolve`
//!
//! Dispatch one request against the table and print the outcome:
//!
//! ```bash
//! mountrouter resolve --table routes.yaml --method GET /api/users/42
//! mountrouter resolve --table routes.yaml --method DELETE /api/users/42 --run
//! ```
//!
//! With `--run` the full middleware pipeline and echo handler execute and the
//! response is printed instead of the match.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use mountrouter::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use self::commands::{resolve, run_cli, Cli, Commands};
