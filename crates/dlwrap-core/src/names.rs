//! Generated-name derivation.
//!
//! Every loaded class gets two generated companions: an Interface named with
//! the interface prefix and a Delegate named with the delegate prefix. Only the
//! short name is prefixed; namespace and template arguments are carried over
//! unchanged. Names are registered for the whole load set before any code is
//! emitted, so cross-references between loaded classes always resolve.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Split `a::b<c::d>::e` at top-level `::` separators.
pub fn split_scope(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    let mut chars = name.trim().chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ':' if depth == 0 && chars.peek() == Some(&':') => {
                chars.next();
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Split `Name<a, b<c>>` into `Name` and its top-level template arguments.
pub fn split_template(name: &str) -> (&str, Vec<String>) {
    let Some(open) = name.find('<') else {
        return (name, Vec::new());
    };
    let short = name[..open].trim_end();
    let inner = name[open + 1..].trim_end();
    let inner = inner.strip_suffix('>').unwrap_or(inner);

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => args.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }
    (short, args)
}

/// `scope::name`, or just `name` at global scope.
pub fn join_scope(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope.join("::"), name)
    }
}

/// Whitespace-insensitive lookup key for a qualified name.
pub(crate) fn name_key(name: &str) -> String {
    let name = name.trim().trim_start_matches("::");
    name.split_whitespace().collect()
}

/// A namespace-qualified, possibly templated, name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub scope: Vec<String>,
    /// Short name including any template bracket.
    pub name: String,
}

impl QualifiedName {
    pub fn new(scope: &[String], name: &str) -> Self {
        Self {
            scope: scope.to_vec(),
            name: name.to_string(),
        }
    }

    pub fn parse(qualified: &str) -> Self {
        let mut parts = split_scope(qualified.trim_start_matches("::"));
        let name = parts.pop().unwrap_or_default();
        Self { scope: parts, name }
    }

    /// `ns::Name<args>`.
    pub fn long(&self) -> String {
        join_scope(&self.scope, &self.name)
    }

    /// Short name without the template bracket.
    pub fn short(&self) -> &str {
        split_template(&self.name).0
    }

    pub fn template_args(&self) -> Vec<String> {
        split_template(&self.name).1
    }

    /// The same name with `prefix` prepended to the short name only.
    pub fn prefixed(&self, prefix: &str) -> Self {
        let (short, _) = split_template(&self.name);
        let bracket = &self.name[short.len()..];
        Self {
            scope: self.scope.clone(),
            name: format!("{prefix}{short}{bracket}"),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.long())
    }
}

/// The configurable prefixes and suffix that generated names are built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAffixes {
    pub interface_prefix: String,
    pub delegate_prefix: String,
    /// Appended to every identifier the generator synthesizes in library
    /// code, so generated members never collide with user members.
    pub code_suffix: String,
}

impl NameAffixes {
    /// Name of the common Interface root class.
    pub fn interface_root(&self) -> String {
        format!("{}Base", self.interface_prefix.trim_end_matches('_'))
    }

    /// Name of the common Delegate root class.
    pub fn delegate_root(&self) -> String {
        format!("{}Base", self.delegate_prefix.trim_end_matches('_'))
    }

    pub fn suffixed(&self, name: &str) -> String {
        format!("{name}{}", self.code_suffix)
    }
}

impl Default for NameAffixes {
    fn default() -> Self {
        Self {
            interface_prefix: "Abstract_".to_string(),
            delegate_prefix: "Wrapper_".to_string(),
            code_suffix: "_BE".to_string(),
        }
    }
}

/// Original, Interface and Delegate names of one loaded class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedNames {
    pub original: QualifiedName,
    pub interface: QualifiedName,
    pub delegate: QualifiedName,
}

impl GeneratedNames {
    pub fn derive(affixes: &NameAffixes, original: QualifiedName) -> Self {
        Self {
            interface: original.prefixed(&affixes.interface_prefix),
            delegate: original.prefixed(&affixes.delegate_prefix),
            original,
        }
    }
}

/// Append-only table of generated names for the load set.
#[derive(Debug, Clone)]
pub struct NameTable {
    affixes: NameAffixes,
    /// Namespace that all generated code is emitted into.
    outer: Vec<String>,
    entries: Vec<GeneratedNames>,
    index: HashMap<String, usize>,
}

impl NameTable {
    pub fn new(affixes: NameAffixes, outer_namespace: &str) -> Self {
        Self {
            affixes,
            outer: split_scope(outer_namespace),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn affixes(&self) -> &NameAffixes {
        &self.affixes
    }

    /// Namespace wrapping all generated code, outermost first.
    pub fn outer_namespace(&self) -> &[String] {
        &self.outer
    }

    /// Register a loaded class. Registering twice returns the first entry.
    pub fn register(&mut self, original: QualifiedName) -> &GeneratedNames {
        let key = name_key(&original.long());
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.entries
                    .push(GeneratedNames::derive(&self.affixes, original));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &self.entries[slot]
    }

    pub fn get(&self, qualified: &str) -> Option<&GeneratedNames> {
        self.index
            .get(&name_key(qualified))
            .map(|&slot| &self.entries[slot])
    }

    pub fn is_loaded(&self, qualified: &str) -> bool {
        self.index.contains_key(&name_key(qualified))
    }

    /// All registered classes, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &GeneratedNames> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fully qualified `::outer::ns::Name`, usable from library code that
    /// lives outside the generated namespace.
    pub fn absolute(&self, name: &QualifiedName) -> String {
        let mut scope = self.outer.clone();
        scope.extend(name.scope.iter().cloned());
        format!("::{}", join_scope(&scope, &name.name))
    }
}
