//! Default-argument overload expansion.
//!
//! A callable whose trailing `k` arguments carry defaults is exposed as
//! `k + 1` overloads: the full argument list, then one fewer argument at a
//! time down to the first defaulted position. A pure-virtual interface cannot
//! carry default arguments, so each arity becomes its own entry point.

use crate::records::{trailing_defaults, ArgRecord};

/// One arity of a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArityVariant<'a> {
    /// Arguments kept in this variant.
    pub args: &'a [ArgRecord],
    /// Number of trailing defaulted arguments dropped.
    pub removed: usize,
}

impl<'a> ArityVariant<'a> {
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Produced by dropping at least one defaulted argument.
    pub fn is_truncated(&self) -> bool {
        self.removed > 0
    }
}

/// Every arity a callable can be invoked with, longest first.
pub fn arity_variants(args: &[ArgRecord]) -> Vec<ArityVariant<'_>> {
    let defaults = trailing_defaults(args);
    (0..=defaults)
        .map(|removed| ArityVariant {
            args: &args[..args.len() - removed],
            removed,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRef;

    fn arg(name: &str, defaulted: bool) -> ArgRecord {
        let arg = ArgRecord::new(TypeRef::named("int"), name);
        if defaulted {
            arg.defaulted()
        } else {
            arg
        }
    }

    #[test]
    fn no_defaults_gives_single_variant() {
        let args = vec![arg("a", false), arg("b", false)];
        let variants = arity_variants(&args);
        assert_eq!(variants.len(), 1);
        assert!(!variants[0].is_truncated());
        assert_eq!(variants[0].arity(), 2);
    }

    #[test]
    fn two_defaults_give_three_decreasing_arities() {
        let args = vec![arg("a", false), arg("b", true), arg("c", true)];
        let arities: Vec<usize> = arity_variants(&args).iter().map(|v| v.arity()).collect();
        assert_eq!(arities, vec![3, 2, 1]);
    }

    #[test]
    fn all_defaulted_reaches_zero_arity() {
        let args = vec![arg("a", true)];
        let variants = arity_variants(&args);
        assert_eq!(variants.last().map(|v| v.arity()), Some(0));
        assert_eq!(variants.last().map(|v| v.removed), Some(1));
    }
}
