//! CLI command implementations.

pub mod check;
pub mod generate;
pub mod list;

use std::path::Path;

use anyhow::{Context, Result};

use dlwrap_core::SymbolIndex;
use dlwrap_synth::WrapConfig;

/// Read a JSON symbol table.
pub fn load_symbols(path: &Path) -> Result<SymbolIndex> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    SymbolIndex::from_json(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Read and validate a wrapping configuration.
pub fn load_config(path: &Path) -> Result<WrapConfig> {
    WrapConfig::load(path).with_context(|| format!("loading {}", path.display()))
}
