//! Command handlers for the arkscan CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod cluster;
pub mod configure;
pub mod output;
pub mod server;
pub mod tribe;
