//! Classified migration failures.
//!
//! An [`ImportError`] is a failure a pipeline step understands well enough to
//! say whether the run can continue. Anything else ends up as
//! [`Failure::Unclassified`] and is treated as fatal.

use std::fmt;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure raised by a migration step, flagged as fatal or as a warning.
#[derive(Debug, Error)]
#[error("{message}{}", context_suffix(.context))]
pub struct ImportError {
    /// Human-readable description.
    pub message: String,
    /// The item the failure is about (a path, an option, a post id).
    pub context: Option<String>,
    /// Whether this failure must abort the run.
    pub fatal: bool,
    /// Underlying cause, if any.
    #[source]
    pub source: Option<BoxError>,
}

impl ImportError {
    /// A failure that aborts the run.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            fatal: true,
            source: None,
        }
    }

    /// A failure that is reported but lets the run succeed.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            fatal: false,
            ..Self::fatal(message)
        }
    }

    /// Attach the item this failure refers to.
    pub fn with_context(mut self, context: impl fmt::Display) -> Self {
        self.context = Some(context.to_string());
        self
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

fn context_suffix(context: &Option<String>) -> String {
    context
        .as_ref()
        .map(|c| format!(" ({})", c))
        .unwrap_or_default()
}

/// Any failure a step can produce.
#[derive(Debug)]
pub enum Failure {
    /// A failure with a known severity.
    Import(ImportError),
    /// Anything else. Always fatal so unexpected errors are never swallowed.
    Unclassified(anyhow::Error),
}

impl Failure {
    /// Whether this failure must abort the run.
    pub fn is_fatal(&self) -> bool {
        match self {
            Failure::Import(e) => e.is_fatal(),
            Failure::Unclassified(_) => true,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Import(e) => write!(f, "{}", e),
            Failure::Unclassified(e) => write!(f, "{:#}", e),
        }
    }
}

impl From<ImportError> for Failure {
    fn from(error: ImportError) -> Self {
        Failure::Import(error)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        Failure::Unclassified(error)
    }
}

impl From<std::io::Error> for Failure {
    fn from(error: std::io::Error) -> Self {
        Failure::Unclassified(error.into())
    }
}

impl From<walkdir::Error> for Failure {
    fn from(error: walkdir::Error) -> Self {
        Failure::Unclassified(error.into())
    }
}
