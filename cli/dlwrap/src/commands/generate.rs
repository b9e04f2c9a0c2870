//! `dlwrap generate`: write generated headers, sources and tables.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use dlwrap_synth::{ClassOutput, GenerationOutput};

/// File-name form of a qualified class name: `ns::Vec<int>` becomes
/// `ns__Vec_int_`.
fn file_stem(qualified: &str) -> String {
    qualified
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serializing {}", path.display()))?;
    write(path, &json)
}

/// Additions for one library class as a commented header fragment.
fn augmentation_fragment(class: &ClassOutput) -> String {
    let aug = &class.augmentation;
    let mut out = String::new();
    match &aug.location {
        Some(location) => out.push_str(&format!("// {location}\n")),
        None => out.push_str("// declaration location unknown\n"),
    }
    out.push_str(&format!("// Add to the base list of {}:\n", aug.class));
    out.push_str(&format!("//     {}\n", aug.inheritance));
    out.push_str("// Add to the class body:\n\n");
    out.push_str(&aug.body);
    out
}

fn write_output(output: &GenerationOutput, out_dir: &Path, header_ext: &str, source_ext: &str) -> Result<usize> {
    let augment_dir = out_dir.join("augment");
    fs::create_dir_all(&augment_dir)
        .with_context(|| format!("creating {}", augment_dir.display()))?;

    let library_header = format!("dlwrap_library{header_ext}");
    let mut written = vec![
        (out_dir.join(&library_header), output.library_header()),
        (out_dir.join(format!("dlwrap_host{header_ext}")), output.host_header()),
        (
            out_dir.join(format!("dlwrap_library{source_ext}")),
            output.library_source(&library_header),
        ),
    ];
    for class in &output.classes {
        written.push((
            augment_dir.join(format!("{}{header_ext}", file_stem(&class.class))),
            augmentation_fragment(class),
        ));
    }
    for (path, contents) in &written {
        write(path, contents)?;
    }

    let factories: Vec<_> = output.factories().collect();
    write_json(&out_dir.join("factories.json"), &factories)?;
    write_json(&out_dir.join("loaded_types.json"), &output.loaded_types)?;
    write_json(&out_dir.join("ledger.json"), &output.ledger)?;
    write_json(&out_dir.join("notices.json"), &output.notices)?;
    Ok(written.len() + 4)
}

pub fn run(symbols: &Path, config_path: &Path, out_dir: &Path) -> Result<()> {
    let config = super::load_config(config_path)?;
    let table = super::load_symbols(symbols)?;
    let output = dlwrap_synth::generate(&table, &config).context("generating wrappers")?;

    if output.is_empty() {
        println!(
            "Nothing loadable in {} ({} notices); no files written.",
            config_path.display(),
            output.notices.len()
        );
        return Ok(());
    }

    let files = write_output(
        &output,
        out_dir,
        &config.output.header_extension,
        &config.output.source_extension,
    )?;
    tracing::info!(dir = %out_dir.display(), files, "Wrote output");

    println!(
        "Generated {} classes, {} functions, {} factories -> {}",
        output.ledger.classes_done.len(),
        output.ledger.functions_done.len(),
        output.factories().count(),
        out_dir.display()
    );
    if !output.notices.is_empty() {
        println!("{} items skipped; see notices.json", output.notices.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stems_are_path_safe() {
        assert_eq!(file_stem("geo::Circle"), "geo__Circle");
        assert_eq!(file_stem("ns::Vec<int>"), "ns__Vec_int_");
        assert_eq!(file_stem("Top"), "Top");
    }
}
