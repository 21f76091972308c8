//! Cli/daemon for tracking which applications hold window focus throughout the day.
//! Records land in an embedded SQLite store, get categorized automatically, and can be
//! inspected straight from a terminal.
//!

pub mod categorize;
pub mod cli;
pub mod daemon;
pub mod storage;
pub mod utils;
pub mod window_api;
