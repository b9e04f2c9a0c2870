//! Symbol-table model for dlwrap.
//!
//! Holds the read-only view of a parsed C++ library that class wrapping
//! works from, plus the naming rules for the generated types.
//!
//! ## Modules
//!
//! - [`records`]: class, member, function and type records
//! - [`types`]: type references with cv/pointer/reference/array decorations
//! - [`symbols`]: the `SymbolTable` lookup trait and the JSON-backed `SymbolIndex`
//! - [`builder`]: programmatic table construction
//! - [`names`]: Interface/Delegate name derivation and the name table
//! - [`operators`]: identifier names for operator symbols
//! - [`overload`]: default-argument arity expansion

pub mod builder;
pub mod error;
pub mod names;
pub mod operators;
pub mod overload;
pub mod records;
pub mod symbols;
pub mod types;

pub use builder::TableBuilder;
pub use error::{CoreError, SymbolError};
pub use names::{GeneratedNames, NameAffixes, NameTable, QualifiedName};
pub use records::{
    Access, ArgRecord, ClassRecord, FunctionRecord, MemberKind, MemberRecord, Record, RecordId,
};
pub use symbols::{SymbolIndex, SymbolTable};
pub use types::TypeRef;
