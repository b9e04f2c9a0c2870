//! Wrapping configuration (`dlwrap.toml`) parsing.
//!
//! The configuration names the classes and functions to load, the ones to
//! skip, and the affixes used for generated names.
//!
//! ```toml
//! [load]
//! classes = ["ns::Foo", "ns::Bar"]
//! functions = ["ns::make_bar(double)"]
//! ditch = ["ns::Foo::debug_dump"]
//! parent-classes = true
//!
//! [naming]
//! interface-prefix = "Abstract_"
//!
//! [known-classes]
//! "ns::Helper" = "helper.h"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dlwrap_core::names::NameAffixes;

use crate::error::{Result, SynthError};
use crate::signature::FunctionSelector;

/// A complete wrapping configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WrapConfig {
    #[serde(default)]
    pub load: LoadSection,
    #[serde(default)]
    pub naming: NamingSection,
    #[serde(default)]
    pub output: OutputSection,
    /// Classes that are not loaded but may appear in signatures, mapped to
    /// the header that declares them.
    #[serde(default, alias = "known_classes", rename = "known-classes")]
    pub known_classes: BTreeMap<String, String>,
}

/// What to load from the library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadSection {
    /// Qualified class names.
    #[serde(default)]
    pub classes: Vec<String>,
    /// Function selectors such as `ns::f(int, double)`, or a bare name to
    /// take every overload.
    #[serde(default)]
    pub functions: Vec<String>,
    /// Qualified names of classes, functions or members to skip.
    #[serde(default)]
    pub ditch: Vec<String>,
    /// Also load the parents of every listed class.
    #[serde(default, alias = "parent_classes", rename = "parent-classes")]
    pub parent_classes: bool,
    /// Forward public members of parents that are not loaded themselves.
    #[serde(default, alias = "inherited_members", rename = "inherited-members")]
    pub inherited_members: bool,
}

/// Affixes for generated identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingSection {
    #[serde(default = "default_interface_prefix", alias = "interface_prefix", rename = "interface-prefix")]
    pub interface_prefix: String,
    #[serde(default = "default_delegate_prefix", alias = "delegate_prefix", rename = "delegate-prefix")]
    pub delegate_prefix: String,
    #[serde(default = "default_code_suffix", alias = "code_suffix", rename = "code-suffix")]
    pub code_suffix: String,
    #[serde(default = "default_factory_prefix", alias = "factory_prefix", rename = "factory-prefix")]
    pub factory_prefix: String,
}

fn default_interface_prefix() -> String {
    "Abstract_".to_string()
}

fn default_delegate_prefix() -> String {
    "Wrapper_".to_string()
}

fn default_code_suffix() -> String {
    "_BE".to_string()
}

fn default_factory_prefix() -> String {
    "Factory_".to_string()
}

impl Default for NamingSection {
    fn default() -> Self {
        Self {
            interface_prefix: default_interface_prefix(),
            delegate_prefix: default_delegate_prefix(),
            code_suffix: default_code_suffix(),
            factory_prefix: default_factory_prefix(),
        }
    }
}

/// Layout of the emitted code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_indent")]
    pub indent: usize,
    #[serde(default = "default_header_extension", alias = "header_extension", rename = "header-extension")]
    pub header_extension: String,
    #[serde(default = "default_source_extension", alias = "source_extension", rename = "source-extension")]
    pub source_extension: String,
    /// Namespace wrapping all generated code. Empty for none.
    #[serde(default, alias = "backend_namespace", rename = "backend-namespace")]
    pub backend_namespace: String,
    /// Also emit factories that return an already-linked Delegate.
    #[serde(default, alias = "wrapper_return_factories", rename = "wrapper-return-factories")]
    pub wrapper_return_factories: bool,
}

fn default_indent() -> usize {
    4
}

fn default_header_extension() -> String {
    ".hpp".to_string()
}

fn default_source_extension() -> String {
    ".cpp".to_string()
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            header_extension: default_header_extension(),
            source_extension: default_source_extension(),
            backend_namespace: String::new(),
            wrapper_return_factories: false,
        }
    }
}

/// Whitespace-free form used to compare qualified names.
fn compact(name: &str) -> String {
    name.trim().trim_start_matches("::").split_whitespace().collect()
}

impl WrapConfig {
    /// Parse and validate a configuration from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let config: WrapConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Check the settings that would make generated names collide or the
    /// output unreadable.
    pub fn validate(&self) -> Result<()> {
        let naming = &self.naming;
        if naming.interface_prefix.is_empty() && naming.delegate_prefix.is_empty() {
            return Err(SynthError::InvalidConfig {
                detail: "interface-prefix and delegate-prefix cannot both be empty".to_string(),
            });
        }
        if naming.interface_prefix == naming.delegate_prefix {
            return Err(SynthError::InvalidConfig {
                detail: format!(
                    "interface-prefix and delegate-prefix are both '{}'",
                    naming.interface_prefix
                ),
            });
        }
        let affixes = self.affixes();
        if affixes.interface_root() == affixes.delegate_root() {
            return Err(SynthError::InvalidConfig {
                detail: format!(
                    "interface-prefix and delegate-prefix both give the root class '{}'",
                    affixes.interface_root()
                ),
            });
        }
        if naming.factory_prefix.is_empty() {
            return Err(SynthError::InvalidConfig {
                detail: "factory-prefix cannot be empty".to_string(),
            });
        }
        if self.output.indent == 0 {
            return Err(SynthError::InvalidConfig {
                detail: "indent must be at least 1".to_string(),
            });
        }
        self.selectors()?;
        Ok(())
    }

    pub fn affixes(&self) -> NameAffixes {
        NameAffixes {
            interface_prefix: self.naming.interface_prefix.clone(),
            delegate_prefix: self.naming.delegate_prefix.clone(),
            code_suffix: self.naming.code_suffix.clone(),
        }
    }

    /// Parsed `load.functions` entries.
    pub fn selectors(&self) -> Result<Vec<FunctionSelector>> {
        self.load
            .functions
            .iter()
            .map(|s| FunctionSelector::parse(s))
            .collect()
    }

    /// Whether `qualified` is on the ditch list.
    pub fn is_ditched(&self, qualified: &str) -> bool {
        let name = compact(qualified);
        self.load.ditch.iter().any(|d| compact(d) == name)
    }

    pub fn is_known_class(&self, qualified: &str) -> bool {
        let name = compact(qualified);
        self.known_classes.keys().any(|k| compact(k) == name)
    }

    /// Requested classes in order, without duplicates.
    pub fn requested_classes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for class in &self.load.classes {
            if !seen.iter().any(|s: &&str| compact(s) == compact(class)) {
                seen.push(class.as_str());
            }
        }
        seen
    }
}
