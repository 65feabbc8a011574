//! # pcms CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pcms_cli::components::{run_components, run_schema, SchemaArgs};
use pcms_cli::content::{run_lint, run_normalize, LintArgs, NormalizeArgs};
use pcms_cli::load_registry;

/// Page-section CMS tooling.
///
/// Inspects component schemas and normalizes or lints content records
/// offline, using the same registry as the API service.
#[derive(Parser, Debug)]
#[command(name = "pcms", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory of YAML component definitions layered over the built-ins.
    #[arg(long, global = true, env = "PCMS_COMPONENT_DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered components and their top-level fields.
    Components,

    /// Print one component's definition, or its JSON Schema.
    Schema(SchemaArgs),

    /// Fill schema defaults into a content file and print it as JSON.
    Normalize(NormalizeArgs),

    /// Report where a content file disagrees with its component schema.
    Lint(LintArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = load_registry(cli.dir.as_deref()).and_then(|registry| match &cli.command {
        Commands::Components => run_components(&registry),
        Commands::Schema(args) => run_schema(&registry, args),
        Commands::Normalize(args) => run_normalize(&registry, args),
        Commands::Lint(args) => run_lint(&registry, args),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_components() {
        let cli = Cli::try_parse_from(["pcms", "components"]).unwrap();
        assert!(matches!(cli.command, Commands::Components));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn cli_parse_schema_json() {
        let cli = Cli::try_parse_from(["pcms", "schema", "PromoCard", "--json-schema"]).unwrap();
        if let Commands::Schema(args) = cli.command {
            assert_eq!(args.component, "PromoCard");
            assert!(args.json_schema);
        } else {
            panic!("expected schema");
        }
    }

    #[test]
    fn cli_parse_normalize_with_flag() {
        let cli = Cli::try_parse_from([
            "pcms",
            "normalize",
            "Gallery",
            "gallery.yaml",
            "--normalize-list-items",
        ])
        .unwrap();
        if let Commands::Normalize(args) = cli.command {
            assert_eq!(args.component, "Gallery");
            assert_eq!(args.file, PathBuf::from("gallery.yaml"));
            assert!(args.normalize_list_items);
        } else {
            panic!("expected normalize");
        }
    }

    #[test]
    fn cli_parse_global_dir_after_subcommand() {
        let cli =
            Cli::try_parse_from(["pcms", "lint", "PromoCard", "p.json", "--dir", "defs", "-vv"])
                .unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("defs")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Lint(_)));
    }

    #[test]
    fn cli_lint_requires_file() {
        assert!(Cli::try_parse_from(["pcms", "lint", "PromoCard"]).is_err());
    }
}
