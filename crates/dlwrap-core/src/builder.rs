//! Programmatic symbol-table construction.
//!
//! `TableBuilder` assembles a [`SymbolIndex`] without going through a C++
//! parser. Ids are allocated sequentially (`_1`, `_2`, ...), classes record
//! their members as they are added, and fundamentals are interned by name.
//!
//! # Example
//!
//! ```rust
//! use dlwrap_core::builder::TableBuilder;
//! use dlwrap_core::records::ArgRecord;
//! use dlwrap_core::symbols::SymbolTable;
//!
//! let mut builder = TableBuilder::new();
//! let double = builder.fundamental("double");
//! let foo = builder.add_class("ns::Foo");
//! builder.add_constructor(&foo, vec![ArgRecord::new(double.clone(), "x")]);
//! builder.add_method(&foo, "get", double, vec![]);
//!
//! let table = builder.build().unwrap();
//! let class = table.class_by_name("ns::Foo").unwrap();
//! assert_eq!(class.members.len(), 2);
//! ```

use std::collections::HashMap;

use crate::error::Result;
use crate::names::QualifiedName;
use crate::records::{
    Access, ArgRecord, ClassRecord, EnumerationRecord, FunctionRecord, FundamentalRecord,
    MemberKind, MemberRecord, ParentRecord, Record, RecordId, SourceLocation,
};
use crate::symbols::SymbolIndex;
use crate::types::TypeRef;

/// Builder for symbol tables.
#[derive(Debug, Default)]
pub struct TableBuilder {
    records: Vec<Record>,
    slots: HashMap<RecordId, usize>,
    fundamentals: HashMap<String, RecordId>,
    next_id: usize,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId::new(format!("_{}", self.next_id))
    }

    fn push(&mut self, record: Record) -> RecordId {
        let id = record.id().clone();
        self.slots.insert(id.clone(), self.records.len());
        self.records.push(record);
        id
    }

    fn class_mut(&mut self, id: &RecordId) -> Option<&mut ClassRecord> {
        let slot = *self.slots.get(id)?;
        match &mut self.records[slot] {
            Record::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Type of the built-in `name`, interning its record on first use.
    pub fn fundamental(&mut self, name: &str) -> TypeRef {
        let id = match self.fundamentals.get(name) {
            Some(id) => id.clone(),
            None => {
                let id = self.fresh_id();
                self.push(Record::Fundamental(FundamentalRecord {
                    id: id.clone(),
                    name: name.to_string(),
                }));
                self.fundamentals.insert(name.to_string(), id.clone());
                id
            }
        };
        TypeRef::of(id, &[], name)
    }

    pub fn add_enumeration(&mut self, qualified: &str) -> TypeRef {
        let name = QualifiedName::parse(qualified);
        let id = self.fresh_id();
        self.push(Record::Enumeration(EnumerationRecord {
            id: id.clone(),
            name: name.name.clone(),
            namespace: name.scope.clone(),
        }));
        TypeRef::of(id, &name.scope, &name.name)
    }

    /// Add an empty class named `ns::Name`.
    pub fn add_class(&mut self, qualified: &str) -> RecordId {
        let name = QualifiedName::parse(qualified);
        let id = self.fresh_id();
        self.push(Record::Class(ClassRecord {
            id,
            name: name.name,
            namespace: name.scope,
            is_struct: false,
            is_incomplete: false,
            is_template: false,
            members: Vec::new(),
            bases: Vec::new(),
            location: None,
        }))
    }

    /// Plain by-value type of class `id`.
    pub fn class_type(&self, id: &RecordId) -> TypeRef {
        match self.slots.get(id).map(|&slot| &self.records[slot]) {
            Some(Record::Class(class)) => TypeRef::of(id.clone(), &class.namespace, &class.name),
            _ => TypeRef::named(id.as_str()),
        }
    }

    pub fn set_location(&mut self, class: &RecordId, file: &str, line: u32) {
        if let Some(class) = self.class_mut(class) {
            class.location = Some(SourceLocation {
                file: file.to_string(),
                line,
            });
        }
    }

    pub fn mark_incomplete(&mut self, class: &RecordId) {
        if let Some(class) = self.class_mut(class) {
            class.is_incomplete = true;
        }
    }

    pub fn mark_template(&mut self, class: &RecordId) {
        if let Some(class) = self.class_mut(class) {
            class.is_template = true;
        }
    }

    pub fn add_parent(&mut self, class: &RecordId, parent: &RecordId, access: Access, is_virtual: bool) {
        if let Some(class) = self.class_mut(class) {
            class.bases.push(ParentRecord {
                id: parent.clone(),
                access,
                is_virtual,
            });
        }
    }

    fn add_member(
        &mut self,
        class: &RecordId,
        kind: MemberKind,
        name: &str,
        value_type: Option<TypeRef>,
        args: Vec<ArgRecord>,
    ) -> RecordId {
        let id = self.fresh_id();
        self.push(Record::Member(MemberRecord {
            id: id.clone(),
            name: name.to_string(),
            kind,
            context: class.clone(),
            access: Access::Public,
            value_type,
            args,
            is_const: false,
            is_static: false,
            is_virtual: false,
            is_pure_virtual: false,
            is_artificial: false,
        }));
        if let Some(class) = self.class_mut(class) {
            class.members.push(id.clone());
        }
        id
    }

    pub fn add_method(
        &mut self,
        class: &RecordId,
        name: &str,
        returns: TypeRef,
        args: Vec<ArgRecord>,
    ) -> RecordId {
        self.add_member(class, MemberKind::Method, name, Some(returns), args)
    }

    /// Add an operator method; `symbol` is the bare operator (`+`, `[]`).
    pub fn add_operator(
        &mut self,
        class: &RecordId,
        symbol: &str,
        returns: TypeRef,
        args: Vec<ArgRecord>,
    ) -> RecordId {
        self.add_member(class, MemberKind::Operator, symbol, Some(returns), args)
    }

    pub fn add_constructor(&mut self, class: &RecordId, args: Vec<ArgRecord>) -> RecordId {
        let name = match self.slots.get(class).map(|&slot| &self.records[slot]) {
            Some(Record::Class(record)) => record.short_name().to_string(),
            _ => String::new(),
        };
        self.add_member(class, MemberKind::Constructor, &name, None, args)
    }

    pub fn add_field(&mut self, class: &RecordId, name: &str, ty: TypeRef) -> RecordId {
        self.add_member(class, MemberKind::Field, name, Some(ty), Vec::new())
    }

    /// Add the members a compiler declares implicitly: default and copy
    /// constructors, copy assignment and destructor.
    pub fn add_implicit_members(&mut self, class: &RecordId) {
        let this = self.class_type(class);
        let short = this.name.clone();
        let copy_arg = ArgRecord::new(this.clone().constant().reference(), "");
        let ids = [
            self.add_constructor(class, Vec::new()),
            self.add_constructor(class, vec![copy_arg.clone()]),
            self.add_operator(class, "=", this.reference(), vec![copy_arg]),
            self.add_member(class, MemberKind::Destructor, &format!("~{short}"), None, Vec::new()),
        ];
        for id in ids {
            if let Some(member) = self.member_mut(&id) {
                member.is_artificial = true;
            }
        }
    }

    /// Adjust a member after adding it (access, const, pure-virtual, ...).
    pub fn member_mut(&mut self, id: &RecordId) -> Option<&mut MemberRecord> {
        let slot = *self.slots.get(id)?;
        match &mut self.records[slot] {
            Record::Member(member) => Some(member),
            _ => None,
        }
    }

    pub fn add_function(&mut self, qualified: &str, returns: TypeRef, args: Vec<ArgRecord>) -> RecordId {
        let name = QualifiedName::parse(qualified);
        let id = self.fresh_id();
        self.push(Record::Function(FunctionRecord {
            id,
            name: name.name,
            namespace: name.scope,
            returns: Some(returns),
            args,
            location: None,
        }))
    }

    /// Finish construction.
    pub fn build(self) -> Result<SymbolIndex> {
        SymbolIndex::from_records(self.records)
    }
}
