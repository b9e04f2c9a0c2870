//! Symbol-table error types.

use crate::records::RecordId;

/// A referenced record is missing or malformed.
///
/// These are fatal for a generation run: unlike an unresolvable type
/// reference (which only rejects the member that uses it), a record that
/// is present but broken means the symbol table itself cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    /// No record exists for the id.
    #[error("no symbol record with id '{id}'")]
    MissingRecord { id: RecordId },

    /// The record exists but lacks an attribute its kind requires.
    #[error("symbol record '{id}' has no '{attribute}' attribute")]
    MissingAttribute { id: RecordId, attribute: String },

    /// The record exists but has the wrong kind or inconsistent contents.
    #[error("malformed symbol record '{id}': {detail}")]
    MalformedRecord { id: RecordId, detail: String },
}

/// Errors raised while loading or assembling a symbol table.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Two records share one id.
    #[error("duplicate symbol record id '{id}'")]
    DuplicateRecord { id: RecordId },

    /// A record lookup failed.
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    /// The symbol index document could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for symbol-table operations.
pub type Result<T> = std::result::Result<T, CoreError>;
