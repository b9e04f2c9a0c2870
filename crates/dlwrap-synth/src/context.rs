//! Shared state for one generation run.
//!
//! [`GenContext`] is the read-only half: the symbol table, the configuration
//! and the name table, which is complete before any code is emitted.
//! [`Session`] is the mutable half: notices, the factory symbol counter and
//! the ledger of finished classes and functions.

use serde::Serialize;

use dlwrap_core::names::{GeneratedNames, NameAffixes, NameTable, QualifiedName};
use dlwrap_core::records::Record;
use dlwrap_core::{SymbolError, SymbolTable, TypeRef};

use crate::config::WrapConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;

const FUNDAMENTAL_TYPES: &[&str] = &[
    "void",
    "bool",
    "char",
    "signed char",
    "unsigned char",
    "wchar_t",
    "char16_t",
    "char32_t",
    "short",
    "short int",
    "unsigned short",
    "short unsigned int",
    "int",
    "unsigned",
    "unsigned int",
    "long",
    "long int",
    "unsigned long",
    "long unsigned int",
    "long long",
    "long long int",
    "unsigned long long",
    "long long unsigned int",
    "float",
    "double",
    "long double",
    "size_t",
];

/// How a type relates to the load set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Fundamental,
    Enumeration,
    /// A class in the load set.
    Loaded,
    /// A class listed under `known-classes`.
    Known,
    /// A standard-library class.
    Std,
    /// A class that is neither loaded, known nor standard.
    Unknown,
    /// The type points at a record the symbol table does not have.
    Unresolved,
}

impl TypeClass {
    /// Usable in a wrapped signature.
    pub fn is_accepted(self) -> bool {
        !matches!(self, TypeClass::Unknown | TypeClass::Unresolved)
    }
}

/// Where emitted code lives, which decides how generated names are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Inside the generated namespace: generated names are written relative.
    Generated,
    /// Inside the library's own classes and namespaces: generated names are
    /// written fully qualified from the global scope.
    Library,
}

/// Read-only inputs of a generation run.
pub struct GenContext<'a> {
    pub table: &'a dyn SymbolTable,
    pub config: &'a WrapConfig,
    pub names: NameTable,
}

impl<'a> GenContext<'a> {
    pub fn new(table: &'a dyn SymbolTable, config: &'a WrapConfig) -> Self {
        Self {
            table,
            config,
            names: NameTable::new(config.affixes(), &config.output.backend_namespace),
        }
    }

    pub fn affixes(&self) -> &NameAffixes {
        self.names.affixes()
    }

    pub fn indent(&self) -> usize {
        self.config.output.indent
    }

    /// Qualified name of the type's base, resolved through its record when
    /// it has one.
    fn base_name(&self, ty: &TypeRef) -> String {
        if let Some(id) = &ty.element {
            if let Some(record) = self.table.lookup(id) {
                if let Some(name) = record.qualified_name() {
                    return name;
                }
            }
        }
        ty.qualified_name()
    }

    /// Classify a class by qualified name.
    pub fn classify_name(&self, qualified: &str) -> TypeClass {
        let qualified = qualified.trim_start_matches("::");
        if self.names.is_loaded(qualified) {
            TypeClass::Loaded
        } else if self.config.is_known_class(qualified) {
            TypeClass::Known
        } else if qualified.starts_with("std::") {
            TypeClass::Std
        } else {
            TypeClass::Unknown
        }
    }

    /// Classify the base of a type reference.
    pub fn classify(&self, ty: &TypeRef) -> Result<TypeClass> {
        let Some(id) = &ty.element else {
            let name = ty.qualified_name();
            if FUNDAMENTAL_TYPES.contains(&name.as_str()) {
                return Ok(TypeClass::Fundamental);
            }
            return Ok(self.classify_name(&name));
        };
        match self.table.lookup(id) {
            None => Ok(TypeClass::Unresolved),
            Some(Record::Fundamental(_)) => Ok(TypeClass::Fundamental),
            Some(Record::Enumeration(_)) => Ok(TypeClass::Enumeration),
            Some(Record::Class(class)) => Ok(self.classify_name(&class.qualified_name())),
            Some(other) => Err(SymbolError::MalformedRecord {
                id: id.clone(),
                detail: format!("type '{ty}' refers to a {}", other.kind_name()),
            }
            .into()),
        }
    }

    /// Generated names of the type's base, if it is a loaded class.
    pub fn loaded(&self, ty: &TypeRef) -> Option<&GeneratedNames> {
        self.names.get(&self.base_name(ty))
    }

    /// Whether any of `types` is a loaded class.
    pub fn uses_loaded<'t>(&self, mut types: impl Iterator<Item = &'t TypeRef>) -> bool {
        types.any(|ty| self.loaded(ty).is_some())
    }

    /// Spelling of the type's base as the library declares it. Class and
    /// enumeration names are written from the global scope so they resolve
    /// from inside the generated namespace.
    pub fn original_base(&self, ty: &TypeRef) -> String {
        let name = self.base_name(ty);
        if ty.element.is_none() && FUNDAMENTAL_TYPES.contains(&name.as_str()) {
            return name;
        }
        match ty.element.as_ref().and_then(|id| self.table.lookup(id)) {
            Some(Record::Fundamental(_)) => name,
            _ => format!("::{name}"),
        }
    }

    fn spell(&self, name: &QualifiedName, side: Side) -> String {
        match side {
            Side::Generated => name.long(),
            Side::Library => self.names.absolute(name),
        }
    }

    pub fn interface_name(&self, names: &GeneratedNames, side: Side) -> String {
        self.spell(&names.interface, side)
    }

    pub fn delegate_name(&self, names: &GeneratedNames, side: Side) -> String {
        self.spell(&names.delegate, side)
    }

    pub fn is_ditched(&self, qualified: &str) -> bool {
        self.config.is_ditched(qualified)
    }
}

/// Classes and functions already generated, so nothing is emitted twice.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ledger {
    pub classes_done: Vec<String>,
    pub functions_done: Vec<String>,
}

impl Ledger {
    pub fn has_class(&self, qualified: &str) -> bool {
        self.classes_done.iter().any(|c| c == qualified)
    }

    pub fn has_function(&self, signature: &str) -> bool {
        self.functions_done.iter().any(|f| f == signature)
    }
}

/// Mutable state of a generation run.
#[derive(Debug, Default)]
pub struct Session {
    pub diagnostics: Diagnostics,
    pub ledger: Ledger,
    symbol_counter: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next value of the run-wide factory symbol counter.
    pub fn next_symbol_index(&mut self) -> usize {
        let index = self.symbol_counter;
        self.symbol_counter += 1;
        index
    }
}
