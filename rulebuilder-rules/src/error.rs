use std::io;
use std::path::{Path, PathBuf};

use rulebuilder_core::CoreError;
use thiserror::Error;

/// Failures while loading rule documents or field catalogs from disk.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("no such document: {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a valid {what}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        what: &'static str,
        message: String,
    },
    #[error("field `{name}` is listed more than once")]
    DuplicateField { name: String },
}

impl RuleError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        RuleError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed(path: &Path, what: &'static str, message: impl Into<String>) -> Self {
        RuleError::Malformed {
            path: path.to_path_buf(),
            what,
            message: message.into(),
        }
    }
}

impl From<RuleError> for CoreError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::Read { source, .. } => CoreError::Io(source),
            other => CoreError::InvalidDocument(other.to_string()),
        }
    }
}
