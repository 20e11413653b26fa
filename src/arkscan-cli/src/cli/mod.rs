//! CLI argument definitions for arkscan
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;
mod parse;

pub use core::{Cli, Commands, OutputFormat};
