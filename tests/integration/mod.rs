//! Integration tests for the status bar context engine

mod config_integration;
mod scenarios;
mod status_bar_flow;

pub use test_utils::{record_batches, with_config_env};
