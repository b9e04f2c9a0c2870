//! Symbol-table records.
//!
//! Records are produced by an external C++ declaration parser and consumed
//! read-only by the generator. Every record has a stable id; classes refer to
//! their members and parents by id, and type references point at their base
//! record by id.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SymbolError;
use crate::names::{join_scope, split_template};
use crate::types::TypeRef;

/// Stable identifier of a record within one symbol table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Member access level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Public => write!(f, "public"),
            Access::Protected => write!(f, "protected"),
            Access::Private => write!(f, "private"),
        }
    }
}

/// Where a declaration sits in the library's sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One argument of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgRecord {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub has_default: bool,
}

impl ArgRecord {
    pub fn new(ty: TypeRef, name: &str) -> Self {
        Self {
            ty,
            name: if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            },
            has_default: false,
        }
    }

    /// Mark the argument as carrying a default value.
    pub fn defaulted(mut self) -> Self {
        self.has_default = true;
        self
    }
}

/// A direct parent of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRecord {
    pub id: RecordId,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub is_virtual: bool,
}

/// A class or struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: RecordId,
    /// Short name, including template arguments for specializations.
    pub name: String,
    #[serde(default)]
    pub namespace: Vec<String>,
    #[serde(default)]
    pub is_struct: bool,
    /// Only forward-declared in the parsed sources.
    #[serde(default)]
    pub is_incomplete: bool,
    /// A class template itself rather than one of its specializations.
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub members: Vec<RecordId>,
    #[serde(default)]
    pub bases: Vec<ParentRecord>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

impl ClassRecord {
    /// `ns::Name<args>`.
    pub fn qualified_name(&self) -> String {
        join_scope(&self.namespace, &self.name)
    }

    /// Name without its template bracket.
    pub fn short_name(&self) -> &str {
        split_template(&self.name).0
    }

    pub fn template_args(&self) -> Vec<String> {
        split_template(&self.name).1
    }

    pub fn is_template_specialization(&self) -> bool {
        self.name.contains('<')
    }
}

/// What a class member is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Constructor,
    Destructor,
    Method,
    /// Operator method; the record's `name` is the operator symbol (`+`, `[]`).
    Operator,
    Field,
}

/// A member of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: RecordId,
    pub name: String,
    pub kind: MemberKind,
    /// Owning class.
    pub context: RecordId,
    #[serde(default)]
    pub access: Access,
    /// Return type of a method or operator; declared type of a field.
    #[serde(default, rename = "type")]
    pub value_type: Option<TypeRef>,
    #[serde(default)]
    pub args: Vec<ArgRecord>,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_pure_virtual: bool,
    /// Implicitly declared by the compiler.
    #[serde(default)]
    pub is_artificial: bool,
}

impl MemberRecord {
    pub fn is_callable(&self) -> bool {
        matches!(
            self.kind,
            MemberKind::Constructor | MemberKind::Method | MemberKind::Operator
        )
    }

    /// The return type of a method or operator.
    pub fn return_type(&self) -> Result<&TypeRef, SymbolError> {
        self.value_type
            .as_ref()
            .ok_or_else(|| SymbolError::MissingAttribute {
                id: self.id.clone(),
                attribute: "type".to_string(),
            })
    }

    /// Number of trailing arguments carrying default values.
    pub fn default_count(&self) -> usize {
        trailing_defaults(&self.args)
    }
}

/// A free function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub namespace: Vec<String>,
    #[serde(default, rename = "type")]
    pub returns: Option<TypeRef>,
    #[serde(default)]
    pub args: Vec<ArgRecord>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

impl FunctionRecord {
    pub fn qualified_name(&self) -> String {
        join_scope(&self.namespace, &self.name)
    }

    pub fn return_type(&self) -> Result<&TypeRef, SymbolError> {
        self.returns
            .as_ref()
            .ok_or_else(|| SymbolError::MissingAttribute {
                id: self.id.clone(),
                attribute: "type".to_string(),
            })
    }
}

/// A built-in type such as `int` or `double`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundamentalRecord {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub namespace: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub namespace: Vec<String>,
}

/// Any symbol-table record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum Record {
    Class(ClassRecord),
    Member(MemberRecord),
    Function(FunctionRecord),
    Fundamental(FundamentalRecord),
    Enumeration(EnumerationRecord),
    Namespace(NamespaceRecord),
}

impl Record {
    pub fn id(&self) -> &RecordId {
        match self {
            Record::Class(r) => &r.id,
            Record::Member(r) => &r.id,
            Record::Function(r) => &r.id,
            Record::Fundamental(r) => &r.id,
            Record::Enumeration(r) => &r.id,
            Record::Namespace(r) => &r.id,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Record::Class(_) => "class",
            Record::Member(_) => "member",
            Record::Function(_) => "function",
            Record::Fundamental(_) => "fundamental",
            Record::Enumeration(_) => "enumeration",
            Record::Namespace(_) => "namespace",
        }
    }

    /// Name used for by-name lookup. Members are only reachable through
    /// their class and have none.
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            Record::Class(r) => Some(r.qualified_name()),
            Record::Function(r) => Some(r.qualified_name()),
            Record::Fundamental(r) => Some(r.name.clone()),
            Record::Enumeration(r) => Some(join_scope(&r.namespace, &r.name)),
            Record::Namespace(r) => Some(join_scope(&r.namespace, &r.name)),
            Record::Member(_) => None,
        }
    }
}

/// Number of trailing arguments with default values.
pub fn trailing_defaults(args: &[ArgRecord]) -> usize {
    args.iter().rev().take_while(|a| a.has_default).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_json_is_kind_tagged() {
        let json = r#"{
            "record": "class",
            "id": "_4",
            "name": "Pair<int, double>",
            "namespace": ["ns"]
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        let Record::Class(class) = record else {
            panic!("expected a class record");
        };
        assert_eq!(class.qualified_name(), "ns::Pair<int, double>");
        assert_eq!(class.short_name(), "Pair");
        assert_eq!(class.template_args(), vec!["int", "double"]);
    }

    #[test]
    fn trailing_defaults_stop_at_first_required() {
        let int = TypeRef::named("int");
        let args = vec![
            ArgRecord::new(int.clone(), "a").defaulted(),
            ArgRecord::new(int.clone(), "b"),
            ArgRecord::new(int, "c").defaulted(),
        ];
        assert_eq!(trailing_defaults(&args), 1);
    }

    #[test]
    fn missing_return_type_is_reported() {
        let member = MemberRecord {
            id: RecordId::new("_9"),
            name: "get".to_string(),
            kind: MemberKind::Method,
            context: RecordId::new("_1"),
            access: Access::Public,
            value_type: None,
            args: Vec::new(),
            is_const: false,
            is_static: false,
            is_virtual: false,
            is_pure_virtual: false,
            is_artificial: false,
        };
        assert_eq!(
            member.return_type().unwrap_err(),
            SymbolError::MissingAttribute {
                id: RecordId::new("_9"),
                attribute: "type".to_string(),
            }
        );
    }
}
