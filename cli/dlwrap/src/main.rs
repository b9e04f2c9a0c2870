//! dlwrap CLI: generate dynamic-load wrappers for C++ classes.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dlwrap", version, about = "Wrap C++ classes for use across a dynamic-load boundary")]
struct Cli {
    /// Log per-class detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Interface, Delegate and factory code
    Generate {
        /// Symbol table of the library (JSON)
        #[arg(long)]
        symbols: PathBuf,
        /// Wrapping configuration (default: dlwrap.toml)
        #[arg(long, default_value = "dlwrap.toml")]
        config: PathBuf,
        /// Output directory
        #[arg(long, short, default_value = "dlwrap-out")]
        out: PathBuf,
    },
    /// List the classes and functions in a symbol table
    List {
        /// Symbol table of the library (JSON)
        #[arg(long)]
        symbols: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report what a configuration would load, without writing anything
    Check {
        /// Symbol table of the library (JSON)
        #[arg(long)]
        symbols: PathBuf,
        /// Wrapping configuration (default: dlwrap.toml)
        #[arg(long, default_value = "dlwrap.toml")]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            symbols,
            config,
            out,
        } => commands::generate::run(&symbols, &config, &out),
        Commands::List { symbols, json } => commands::list::run(&symbols, json),
        Commands::Check { symbols, config } => commands::check::run(&symbols, &config),
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::path::Path;

    use dlwrap_core::{Access, ArgRecord, TableBuilder, TypeRef};

    /// `geo::Shape` with a subclass `geo::Circle`, and a factory function.
    fn write_symbols(dir: &Path) -> PathBuf {
        let mut b = TableBuilder::new();
        let double = b.fundamental("double");
        let shape = b.add_class("geo::Shape");
        b.set_location(&shape, "geo/shape.hpp", 5);
        b.add_implicit_members(&shape);
        b.add_method(&shape, "area", double.clone(), vec![]);
        let circle = b.add_class("geo::Circle");
        b.set_location(&circle, "geo/circle.hpp", 7);
        b.add_implicit_members(&circle);
        b.add_parent(&circle, &shape, Access::Public, false);
        b.add_constructor(
            &circle,
            vec![
                ArgRecord::new(double.clone(), "r"),
                ArgRecord::new(double.clone(), "x").defaulted(),
            ],
        );
        b.add_method(&circle, "scale", TypeRef::named("void"), vec![ArgRecord::new(double, "f")]);
        let circle_ty = b.class_type(&circle);
        b.add_function("geo::unit_circle", circle_ty, vec![]);
        let table = b.build().unwrap();

        let path = dir.join("symbols.json");
        std::fs::write(&path, table.to_json().unwrap()).unwrap();
        path
    }

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("dlwrap.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    /// Full workflow: list, check, then generate into a fresh directory.
    #[test]
    fn list_check_generate_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let symbols = write_symbols(dir.path());
        let config = write_config(
            dir.path(),
            "[load]\nclasses = [\"geo::Circle\"]\nfunctions = [\"geo::unit_circle\"]\nparent-classes = true\n",
        );

        commands::list::run(&symbols, false).unwrap();
        commands::check::run(&symbols, &config).unwrap();

        let out = dir.path().join("gen");
        commands::generate::run(&symbols, &config, &out).unwrap();

        for file in [
            "dlwrap_library.hpp",
            "dlwrap_host.hpp",
            "dlwrap_library.cpp",
            "augment/geo__Shape.hpp",
            "augment/geo__Circle.hpp",
            "factories.json",
            "loaded_types.json",
            "ledger.json",
            "notices.json",
        ] {
            assert!(out.join(file).is_file(), "missing {file}");
        }

        let host = std::fs::read_to_string(out.join("dlwrap_host.hpp")).unwrap();
        assert!(host.contains("class Abstract_Circle : public virtual geo::Abstract_Shape"));
        assert!(host.contains("inline void bind_symbols_BE(Lookup lookup)"));

        let augment = std::fs::read_to_string(out.join("augment/geo__Circle.hpp")).unwrap();
        assert!(augment.contains("// geo/circle.hpp:7"));
        assert!(augment.contains("public virtual ::geo::Abstract_Circle"));

        let ledger: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("ledger.json")).unwrap()).unwrap();
        assert_eq!(ledger["classes_done"], serde_json::json!(["geo::Shape", "geo::Circle"]));
        assert_eq!(ledger["functions_done"], serde_json::json!(["geo::unit_circle()"]));

        let factories: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("factories.json")).unwrap()).unwrap();
        let circle_factories: Vec<&serde_json::Value> = factories
            .as_array()
            .unwrap()
            .iter()
            .filter(|f| f["class"] == "geo::Circle")
            .collect();
        // Implicit default constructor, then (r, x) and (r).
        assert_eq!(circle_factories.len(), 3);
    }

    #[test]
    fn nothing_loadable_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let symbols = write_symbols(dir.path());
        let config = write_config(dir.path(), "[load]\nclasses = [\"geo::Missing\"]\n");
        let out = dir.path().join("gen");
        commands::generate::run(&symbols, &config, &out).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn invalid_config_is_reported_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let symbols = write_symbols(dir.path());
        let config = write_config(dir.path(), "[naming]\ninterface-prefix = \"X_\"\ndelegate-prefix = \"X_\"\n");
        let err = commands::check::run(&symbols, &config).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("dlwrap.toml"));
        assert!(message.contains("both 'X_'"));
    }

    #[test]
    fn missing_symbol_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = commands::list::run(&dir.path().join("absent.json"), true).unwrap_err();
        assert!(format!("{err:#}").contains("absent.json"));
    }
}
