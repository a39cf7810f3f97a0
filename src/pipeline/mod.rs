//! Migration pipeline: the step runner and the built-in steps.

pub mod runner;
pub mod steps;

pub use runner::{MigrationContext, Step, TaskRunner};
