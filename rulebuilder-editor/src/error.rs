use thiserror::Error;

/// Errors surfaced by host-facing parsing helpers. Editing itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("unknown block kind: {0}")]
    UnknownBlockKind(String),
}
