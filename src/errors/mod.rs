//! Failure types and aggregation for migration runs.

pub mod group;
pub mod import;

pub use group::ErrorGroup;
pub use import::{Failure, ImportError};
