//! Aggregation of failures across a migration run.
//!
//! Steps add failures to an [`ErrorGroup`] as they go and never stop each
//! other. At the end of the run the group decides, once, whether the run
//! failed: any fatal or unclassified failure makes the whole group fatal.

use super::import::Failure;
use std::fmt;

/// Maximum number of failures printed before the rest are summarised.
pub const MAX_PRINTED_ERRORS: usize = 15;

/// Ordered collection of the failures produced during one run.
#[derive(Debug, Default)]
pub struct ErrorGroup {
    errors: Vec<Failure>,
}

impl ErrorGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure. Never fails.
    pub fn add(&mut self, failure: impl Into<Failure>) {
        self.errors.push(failure.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Failures in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Failure> {
        self.errors.iter()
    }

    /// True if any failure is fatal or of an unclassified kind.
    pub fn is_fatal(&self) -> bool {
        self.errors.iter().any(Failure::is_fatal)
    }

    /// Decide the outcome of the run.
    ///
    /// Returns the group itself as the error when it is non-empty and fatal.
    /// Otherwise hands it back unchanged so the caller can report warnings.
    pub fn into_result(self) -> Result<Self, Self> {
        if !self.is_empty() && self.is_fatal() {
            Err(self)
        } else {
            Ok(self)
        }
    }

    /// Human-readable summary, identical to the `Display` output.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ErrorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.errors.as_slice() {
            return write!(f, "{}", only);
        }

        let banner = if self.is_fatal() {
            "Multiple errors:"
        } else {
            "Multiple warnings:"
        };
        writeln!(f, "{}", banner)?;

        let printed = self
            .errors
            .iter()
            .take(MAX_PRINTED_ERRORS)
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n\n");
        write!(f, "{}", printed)?;

        if self.errors.len() > MAX_PRINTED_ERRORS {
            write!(f, "\n\nand {} more", self.errors.len() - MAX_PRINTED_ERRORS)?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorGroup {}

impl<'a> IntoIterator for &'a ErrorGroup {
    type Item = &'a Failure;
    type IntoIter = std::slice::Iter<'a, Failure>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
