//! Command line interface module
//!
//! Argument parsing with configuration layering, and the runner that wires
//! the registry client, sync engine and image service together.

pub mod args;
pub mod runner;

pub use args::{Args, Command, OutputFormat};
pub use runner::Runner;
