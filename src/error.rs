//! Error type shared by the loader and the lookups.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LookupError>;

#[derive(Debug, Error)]
pub enum LookupError {
    /// The key is absent from the loaded table.
    #[error("{what} {key} not found")]
    NotFound { what: &'static str, key: String },

    /// A malformed header, row, or code.
    #[error("{}", describe_format(.line, .message))]
    Format { line: Option<u64>, message: String },

    /// The table file is missing or unreadable.
    #[error("cannot read {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The CSV reader failed below the row level (e.g. invalid UTF-8).
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl LookupError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            line: None,
            message: message.into(),
        }
    }

    pub(crate) fn format_at(line: Option<u64>, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    /// Attach a line number to a `Format` error that does not carry one yet.
    pub(crate) fn at_line(self, at: Option<u64>) -> Self {
        match self {
            Self::Format { line: None, message } => Self::Format { line: at, message },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for errors caused by bad input data rather than the environment.
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::Csv(_))
    }
}

fn describe_format(line: &Option<u64>, message: &str) -> String {
    match line {
        Some(line) => format!("line {}: {}", line, message),
        None => message.to_string(),
    }
}
