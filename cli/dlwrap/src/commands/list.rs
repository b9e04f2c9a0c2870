//! `dlwrap list`: enumerate the classes and functions of a symbol table.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use dlwrap_core::{Record, SymbolTable};
use dlwrap_synth::signature::describe_call;

#[derive(Debug, Serialize)]
struct Entry {
    kind: &'static str,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

fn entries(table: &dyn SymbolTable) -> Vec<Entry> {
    table
        .records()
        .into_iter()
        .filter_map(|record| match record {
            Record::Class(class) => Some(Entry {
                kind: if class.is_struct { "struct" } else { "class" },
                name: class.qualified_name(),
                location: class.location.as_ref().map(ToString::to_string),
            }),
            Record::Function(function) => Some(Entry {
                kind: "function",
                name: describe_call(&function.qualified_name(), &function.args),
                location: function.location.as_ref().map(ToString::to_string),
            }),
            _ => None,
        })
        .collect()
}

pub fn run(symbols: &Path, json: bool) -> Result<()> {
    let table = super::load_symbols(symbols)?;
    let entries = entries(&table);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        match &entry.location {
            Some(location) => println!("{:<9} {}  ({location})", entry.kind, entry.name),
            None => println!("{:<9} {}", entry.kind, entry.name),
        }
    }
    println!();
    println!("{} entries", entries.len());
    Ok(())
}
