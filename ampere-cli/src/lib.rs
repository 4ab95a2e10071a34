//! The `ampere` command-line front end: config, logging and one handler per
//! subcommand.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
