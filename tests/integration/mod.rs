//! Integration tests for provider orchestration, batch runs and configuration

mod batch_runs;
mod cli_binary;
mod config_integration;
mod orchestrator_flow;
mod test_utils;

pub use test_utils::*;
