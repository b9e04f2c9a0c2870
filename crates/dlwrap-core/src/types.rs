//! Type references as they appear in member and function signatures.
//!
//! A [`TypeRef`] names a base type (a fundamental, a class, an enumeration)
//! plus the declarator decorations wrapped around it: cv-qualifiers, pointer
//! depth, a trailing reference and fixed array extents. Generation never edits
//! a `TypeRef` in place; the synthesizers render it with a substituted base
//! name instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::records::RecordId;

/// Qualifiers applied to the base type (`const T*` rather than `T* const`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CvQualifiers {
    #[serde(default, rename = "const")]
    pub is_const: bool,
    #[serde(default, rename = "volatile")]
    pub is_volatile: bool,
}

impl CvQualifiers {
    fn prefix(&self) -> &'static str {
        match (self.is_const, self.is_volatile) {
            (true, true) => "const volatile ",
            (true, false) => "const ",
            (false, true) => "volatile ",
            (false, false) => "",
        }
    }
}

/// A use of a type: base name, scope, and declarator decorations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Short base name, including any template argument bracket
    /// (`vector<double>`).
    pub name: String,
    /// Enclosing namespaces and classes, outermost first.
    #[serde(default)]
    pub namespace: Vec<String>,
    #[serde(default)]
    pub pointer_depth: u8,
    #[serde(default)]
    pub is_reference: bool,
    #[serde(default)]
    pub array_extents: Vec<usize>,
    #[serde(default)]
    pub cv: CvQualifiers,
    /// Record of the base type, when the symbol table has one.
    #[serde(default)]
    pub element: Option<RecordId>,
}

impl TypeRef {
    /// A type with no backing record, such as `void`.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: Vec::new(),
            pointer_depth: 0,
            is_reference: false,
            array_extents: Vec::new(),
            cv: CvQualifiers::default(),
            element: None,
        }
    }

    /// A plain use of the record `id`, declared as `namespace::name`.
    pub fn of(id: RecordId, namespace: &[String], name: &str) -> Self {
        Self {
            namespace: namespace.to_vec(),
            element: Some(id),
            ..Self::named(name)
        }
    }

    /// Add one level of pointer indirection.
    pub fn pointer(mut self) -> Self {
        self.pointer_depth += 1;
        self
    }

    /// Make this an lvalue reference.
    pub fn reference(mut self) -> Self {
        self.is_reference = true;
        self
    }

    /// Const-qualify the base type.
    pub fn constant(mut self) -> Self {
        self.cv.is_const = true;
        self
    }

    /// Append a fixed array extent.
    pub fn array(mut self, extent: usize) -> Self {
        self.array_extents.push(extent);
        self
    }

    /// `ns::name` without decorations.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace.join("::"), self.name)
        }
    }

    pub fn is_void(&self) -> bool {
        self.name == "void" && self.pointer_depth == 0 && !self.is_reference
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    pub fn is_array(&self) -> bool {
        !self.array_extents.is_empty()
    }

    /// Passed or returned by value: neither pointer nor reference.
    pub fn is_by_value(&self) -> bool {
        self.pointer_depth == 0 && !self.is_reference
    }

    /// The `*...&` suffix that follows the base name.
    pub fn indirection(&self) -> String {
        let mut out = "*".repeat(self.pointer_depth as usize);
        if self.is_reference {
            out.push('&');
        }
        out
    }

    /// Render with `base` standing in for the base name, keeping all
    /// qualifiers and indirection. Array extents are not included.
    pub fn render_with(&self, base: &str) -> String {
        format!("{}{}{}", self.cv.prefix(), base, self.indirection())
    }

    /// Render a declaration of `declarator` with this type, using `base` as
    /// the base name. Arrays come out as `T name[N]`, or `T (&name)[N]` when
    /// the type is a reference to an array.
    pub fn declare(&self, base: &str, declarator: &str) -> String {
        if self.array_extents.is_empty() {
            return format!("{} {declarator}", self.render_with(base));
        }
        let extents: String = self.array_extents.iter().map(|n| format!("[{n}]")).collect();
        let stars = "*".repeat(self.pointer_depth as usize);
        let head = format!("{}{}{}", self.cv.prefix(), base, stars);
        if self.is_reference {
            format!("{head} (&{declarator}){extents}")
        } else {
            format!("{head} {declarator}{extents}")
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_with(&self.qualified_name()))?;
        for extent in &self.array_extents {
            write!(f, "[{extent}]")?;
        }
        Ok(())
    }
}
