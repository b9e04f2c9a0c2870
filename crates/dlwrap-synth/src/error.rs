//! Synthesis error types.

use dlwrap_core::{CoreError, SymbolError};

use crate::lifetime::{DelegateHandle, InterfaceHandle};

/// Errors that abort a generation run.
///
/// Rejected classes and members are not errors: they are recorded as
/// notices and generation continues without them.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// The configuration is unusable.
    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    /// A `load-functions` entry could not be parsed.
    #[error("invalid function selector '{selector}': {detail}")]
    InvalidSelector { selector: String, detail: String },

    /// A class reached code generation without a registered name.
    #[error("class '{class}' has no generated names")]
    Unregistered { class: String },

    /// The symbol table holds a malformed or incomplete record.
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    /// The symbol table could not be loaded.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for synthesis operations.
pub type Result<T> = std::result::Result<T, SynthError>;

/// Misuse of a linked Interface/Delegate pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("no interface object {0}")]
    UnknownInterface(InterfaceHandle),

    #[error("no delegate object {0}")]
    UnknownDelegate(DelegateHandle),

    /// Destroying or using an interface object that was already freed.
    #[error("interface object {0} was already destroyed")]
    InterfaceDestroyed(InterfaceHandle),

    #[error("delegate object {0} was already destroyed")]
    DelegateDestroyed(DelegateHandle),

    /// The delegate has no interface object behind it.
    #[error("delegate object {0} is not linked")]
    NotLinked(DelegateHandle),

    /// The interface object already has a companion delegate.
    #[error("interface object {0} already has a companion")]
    AlreadyLinked(InterfaceHandle),
}
