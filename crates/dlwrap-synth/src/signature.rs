//! Function selector parsing.
//!
//! `load.functions` entries pick free functions out of the symbol table by
//! qualified name, optionally narrowed to one overload by its argument types:
//!
//! - `"ns::area"` selects every overload of `ns::area`
//! - `"ns::area(double, double)"` selects exactly that overload
//! - `"ns::reset()"` or `"ns::reset(void)"` selects the nullary overload
//!
//! Argument types are compared with all whitespace removed, so spacing in
//! the selector does not matter.

use std::fmt;

use dlwrap_core::names::split_template;
use dlwrap_core::records::ArgRecord;
use dlwrap_core::FunctionRecord;

use crate::error::{Result, SynthError};

/// A parsed `load.functions` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSelector {
    /// Qualified function name.
    pub name: String,
    /// Argument types, when the selector names a single overload.
    pub args: Option<Vec<String>>,
}

fn compact(text: &str) -> String {
    text.trim().trim_start_matches("::").split_whitespace().collect()
}

/// Split an argument list at top-level commas.
fn split_args(list: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '<' | '(' => {
                depth += 1;
                current.push(c);
            }
            '>' | ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => args.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    args.push(current);
    args
}

impl FunctionSelector {
    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |detail: &str| SynthError::InvalidSelector {
            selector: input.to_string(),
            detail: detail.to_string(),
        };

        let text = input.trim();
        if text.is_empty() {
            return Err(invalid("empty selector"));
        }

        let (name, args) = match text.find('(') {
            None => (text, None),
            Some(open) => {
                if !text.ends_with(')') {
                    return Err(invalid("missing ')'"));
                }
                let inner = text[open + 1..text.len() - 1].trim();
                let args = if inner.is_empty() || inner == "void" {
                    Vec::new()
                } else {
                    let args: Vec<String> = split_args(inner).iter().map(|a| compact(a)).collect();
                    if args.iter().any(|a| a.is_empty()) {
                        return Err(invalid("empty argument type"));
                    }
                    args
                };
                (text[..open].trim(), Some(args))
            }
        };

        if name.is_empty() {
            return Err(invalid("missing function name"));
        }
        // Template brackets may contain spaces; the name itself may not.
        let (base, _) = split_template(name);
        if base.split_whitespace().count() != 1 {
            return Err(invalid("function name contains whitespace"));
        }

        Ok(Self {
            name: compact(name),
            args,
        })
    }

    /// Whether `function` is selected.
    pub fn matches(&self, function: &FunctionRecord) -> bool {
        if compact(&function.qualified_name()) != self.name {
            return false;
        }
        match &self.args {
            None => true,
            Some(args) => {
                args.len() == function.args.len()
                    && args
                        .iter()
                        .zip(&function.args)
                        .all(|(wanted, actual)| *wanted == compact(&actual.ty.to_string()))
            }
        }
    }
}

impl fmt::Display for FunctionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(args) = &self.args {
            write!(f, "({})", args.join(", "))?;
        }
        Ok(())
    }
}

/// `name(type1, type2)` for logs and notices.
pub fn describe_call(name: &str, args: &[ArgRecord]) -> String {
    let types: Vec<String> = args.iter().map(|a| a.ty.to_string()).collect();
    format!("{name}({})", types.join(", "))
}
