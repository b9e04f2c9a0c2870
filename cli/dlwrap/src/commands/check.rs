//! `dlwrap check`: dry run reporting what would be loaded and what is
//! skipped.

use std::path::Path;

use anyhow::{Context, Result};

pub fn run(symbols: &Path, config: &Path) -> Result<()> {
    let config = super::load_config(config)?;
    let table = super::load_symbols(symbols)?;
    let output = dlwrap_synth::generate(&table, &config).context("generating wrappers")?;

    println!("Loadable classes:");
    for class in &output.loaded_types {
        println!(
            "  {}  ->  {} / {}  ({} factories)",
            class.class,
            class.interface,
            class.delegate,
            class.factories.len()
        );
    }
    if !output.ledger.functions_done.is_empty() {
        println!("Loadable functions:");
        for function in &output.ledger.functions_done {
            println!("  {function}");
        }
    }
    if !output.notices.is_empty() {
        println!("Skipped:");
        for notice in &output.notices {
            println!("  {notice}");
        }
    }
    if output.is_empty() {
        println!("Nothing to generate.");
    }
    Ok(())
}
