//! Result report command-line support library.
//!
//! Everything the `rr-core` binary needs beyond the report pipeline itself,
//! which lives in `rr-report`: manifests, demo inputs, exit codes, output
//! formats and logging setup.

pub mod demo;
pub mod exit_codes;
pub mod logging;
pub mod manifest;
pub mod output;

pub use output::OutputFormat;
