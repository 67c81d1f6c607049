//! filez command line interface
//!
//! Commands, configuration loading and output formatting live here so the
//! binary stays a thin dispatcher and integration tests can reach them.

pub mod commands;
pub mod config;
pub mod error;
pub mod file_discovery;
pub mod output;
pub mod paths;
pub mod terminal;
