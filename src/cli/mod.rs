//! # CLI Module
//!
//! Command-line surface of the test generator.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Generate an integration test file from an OpenAPI specification:
//!
//! ```bash
//! apitestgen generate --spec openapi.yaml --output tests/api.rs
//! ```
//!
//! Options:
//! - `--spec <FILE>` - Path to OpenAPI specification (required)
//! - `--output <FILE>` - Output path for the generated test file (required)
//! - `--model <ID>` / `--base-url <URL>` - Generation service overrides
//! - `--workers <N>` / `--retries <N>` / `--backoff-ms <MS>` /
//!   `--timeout-ms <MS>` - Execution overrides
//! - `--no-fallback` - Abort on retry exhaustion instead of falling back
//! - `--offline` - Deterministic run from fallback templates only
//!
//! ### `schedule`
//!
//! Print the dispatch order without calling the generation service:
//!
//! ```bash
//! apitestgen schedule --spec openapi.yaml
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use apitestgen::cli::run_cli;
//!
//! run_cli()?;
//! ```

mod commands;

pub use commands::{run_cli, Cli, Commands};
