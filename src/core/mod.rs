//! Core infrastructure: errors, config, runner, context, version control

pub mod config;
pub mod context;
pub mod error;
pub mod runner;
pub mod vcs;
