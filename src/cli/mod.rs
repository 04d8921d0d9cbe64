//! Command Line Interface (CLI) layer for stylepro.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for the stylize, combine and
//! benchmark flows. It wires user-provided options to the library's
//! `StyleContext`.
//!
//! If you are embedding stylepro into another application, prefer using
//! `stylepro::api` directly instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
