//! Scenario suite
//!
//! Scenarios are declared as data (YAML tables) and executed by one
//! generic runner. Assertions are made against parsed JSON bodies rather
//! than raw text.

pub mod catalog;
mod config;
pub mod matcher;
pub mod report;
mod runner;
pub mod template;

pub use config::*;
pub use runner::{
    build_request, Failure, FailureKind, ScenarioOutcome, ScenarioRunner, StepRecord,
};
