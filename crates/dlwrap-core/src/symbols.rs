//! Read-only symbol table access.
//!
//! The generator only ever sees the symbol table through [`SymbolTable`], so
//! any parser front end can feed it. [`SymbolIndex`] is the in-memory
//! implementation, loaded from a JSON document or assembled with
//! [`TableBuilder`](crate::builder::TableBuilder).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, SymbolError};
use crate::names::name_key;
use crate::records::{ClassRecord, FunctionRecord, MemberRecord, Record, RecordId};

/// Lookup interface over parsed declarations.
pub trait SymbolTable {
    /// Record with the given id.
    fn lookup(&self, id: &RecordId) -> Option<&Record>;

    /// Class, function, enumeration or fundamental record by qualified name.
    /// Overloaded functions resolve to the first one declared.
    fn lookup_by_name(&self, qualified: &str) -> Option<&Record>;

    /// Every record, in declaration order.
    fn records(&self) -> Vec<&Record>;

    /// The class record `id`, failing if it is absent or not a class.
    fn class(&self, id: &RecordId) -> std::result::Result<&ClassRecord, SymbolError> {
        match self.lookup(id) {
            Some(Record::Class(class)) => Ok(class),
            Some(other) => Err(SymbolError::MalformedRecord {
                id: id.clone(),
                detail: format!("expected a class, found a {}", other.kind_name()),
            }),
            None => Err(SymbolError::MissingRecord { id: id.clone() }),
        }
    }

    /// The member record `id`, failing if it is absent or not a member.
    fn member(&self, id: &RecordId) -> std::result::Result<&MemberRecord, SymbolError> {
        match self.lookup(id) {
            Some(Record::Member(member)) => Ok(member),
            Some(other) => Err(SymbolError::MalformedRecord {
                id: id.clone(),
                detail: format!("expected a member, found a {}", other.kind_name()),
            }),
            None => Err(SymbolError::MissingRecord { id: id.clone() }),
        }
    }

    fn class_by_name(&self, qualified: &str) -> Option<&ClassRecord> {
        match self.lookup_by_name(qualified) {
            Some(Record::Class(class)) => Some(class),
            _ => None,
        }
    }

    /// All free functions, in declaration order.
    fn functions(&self) -> Vec<&FunctionRecord> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                Record::Function(function) => Some(function),
                _ => None,
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize)]
struct IndexDocument {
    records: Vec<Record>,
}

/// In-memory symbol table.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    records: Vec<Record>,
    by_id: HashMap<RecordId, usize>,
    by_name: HashMap<String, usize>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. Ids must be unique.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        let id = record.id().clone();
        if self.by_id.contains_key(&id) {
            return Err(CoreError::DuplicateRecord { id });
        }
        let slot = self.records.len();
        if let Some(name) = record.qualified_name() {
            self.by_name.entry(name_key(&name)).or_insert(slot);
        }
        self.by_id.insert(id, slot);
        self.records.push(record);
        Ok(())
    }

    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Result<Self> {
        let mut index = Self::new();
        for record in records {
            index.insert(record)?;
        }
        Ok(index)
    }

    /// Parse a `{ "records": [...] }` document. Each record is tagged with
    /// `"record": "class" | "member" | ...`.
    pub fn from_json(input: &str) -> Result<Self> {
        let document: IndexDocument = serde_json::from_str(input)?;
        Self::from_records(document.records)
    }

    pub fn to_json(&self) -> Result<String> {
        let document = IndexDocument {
            records: self.records.clone(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SymbolTable for SymbolIndex {
    fn lookup(&self, id: &RecordId) -> Option<&Record> {
        self.by_id.get(id).map(|&slot| &self.records[slot])
    }

    fn lookup_by_name(&self, qualified: &str) -> Option<&Record> {
        self.by_name
            .get(&name_key(qualified))
            .map(|&slot| &self.records[slot])
    }

    fn records(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::FundamentalRecord;

    #[test]
    fn duplicate_ids_are_rejected() {
        let record = || {
            Record::Fundamental(FundamentalRecord {
                id: RecordId::new("_1"),
                name: "int".to_string(),
            })
        };
        let err = SymbolIndex::from_records([record(), record()]).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateRecord { .. }));
    }

    #[test]
    fn lookup_by_name_ignores_leading_scope() {
        let index = SymbolIndex::from_records([Record::Fundamental(FundamentalRecord {
            id: RecordId::new("_1"),
            name: "double".to_string(),
        })])
        .unwrap();
        assert!(index.lookup_by_name("double").is_some());
        assert!(index.lookup_by_name("::double").is_some());
        assert!(index.lookup_by_name("float").is_none());
    }

    #[test]
    fn class_accessor_reports_wrong_kind() {
        let index = SymbolIndex::from_records([Record::Fundamental(FundamentalRecord {
            id: RecordId::new("_1"),
            name: "double".to_string(),
        })])
        .unwrap();
        let err = index.class(&RecordId::new("_1")).unwrap_err();
        assert!(matches!(err, SymbolError::MalformedRecord { .. }));
        let err = index.class(&RecordId::new("_99")).unwrap_err();
        assert!(matches!(err, SymbolError::MissingRecord { .. }));
    }

    #[test]
    fn member_records_carry_their_own_kind() {
        let json = r#"{
            "records": [
                { "record": "fundamental", "id": "_1", "name": "double" },
                {
                    "record": "member", "id": "_3", "name": "get", "kind": "method",
                    "context": "_2", "type": { "name": "double", "element": "_1" }
                }
            ]
        }"#;
        let index = SymbolIndex::from_json(json).unwrap();
        let member = index.member(&RecordId::new("_3")).unwrap();
        assert_eq!(member.kind, crate::records::MemberKind::Method);
        assert_eq!(member.return_type().unwrap().name, "double");
        assert!(index.lookup_by_name("get").is_none());
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let json = r#"{
            "records": [
                { "record": "fundamental", "id": "_1", "name": "double" },
                { "record": "class", "id": "_2", "name": "Foo", "namespace": ["ns"] }
            ]
        }"#;
        let index = SymbolIndex::from_json(json).unwrap();
        assert_eq!(index.len(), 2);
        let class = index.class_by_name("ns::Foo").unwrap();
        assert_eq!(class.id, RecordId::new("_2"));
        let reparsed = SymbolIndex::from_json(&index.to_json().unwrap()).unwrap();
        let ids: Vec<&str> = reparsed.records().iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["_1", "_2"]);
    }
}
