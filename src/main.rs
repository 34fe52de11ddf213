//! sbom-graph: dependency graph conversion tool
//!
//! Converts between SPDX, CycloneDX, the internal scan document, and
//! build-tool dependency tree dumps.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sbom_graph::{cli, parsers::ScanFormat, IndentTreeParser};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with format support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nSupported formats:",
        "\n  ts:        internal JSON scan document",
        "\n  SPDX:      2.x (JSON, YAML, tag-value, XML)",
        "\n  CycloneDX: 1.x (JSON, XML)",
        "\n  tree:      Maven/Gradle dependency tree dumps"
    )
}

#[derive(Parser)]
#[command(name = "sbom-graph")]
#[command(author = "Binarly.io")]
#[command(version, long_version = build_long_version())]
#[command(about = "Dependency graph conversion between SBOM formats", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Convert a CycloneDX BOM to SPDX tag-value
    sbom-graph convert bom.cdx.json -t spdx-tag -O bom.spdx

    # Re-shape an SPDX document into the internal scan format
    sbom-graph convert bom.spdx.json -t ts

    # Turn a Maven dependency:tree dump into CycloneDX
    sbom-graph tree deps.tree -t cyclonedx-json")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments for the `convert` subcommand
#[derive(Parser)]
struct ConvertArgs {
    /// Path to the input document
    input: PathBuf,

    /// Input format (auto-detected from content if not given)
    #[arg(short, long)]
    from: Option<ScanFormat>,

    /// Output format
    #[arg(short = 't', long, default_value = "ts")]
    to: ScanFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output: Option<PathBuf>,
}

/// Arguments for the `tree` subcommand
#[derive(Parser)]
struct TreeArgs {
    /// Path to the dependency tree dump
    input: PathBuf,

    /// Indent width in characters per tree level (3 for Maven, 5 for Gradle)
    #[arg(long, default_value_t = IndentTreeParser::MAVEN_INDENT)]
    indent_width: usize,

    /// Use Gradle glyph widths (same as --indent-width 5)
    #[arg(long, conflicts_with = "indent_width")]
    gradle: bool,

    /// Output format
    #[arg(short = 't', long, default_value = "ts")]
    to: ScanFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an SBOM document between formats
    Convert(ConvertArgs),

    /// Parse a build-tool dependency tree dump
    Tree(TreeArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    match cli.command {
        Commands::Convert(args) => {
            cli::run_convert(&args.input, args.from, args.to, args.output.as_deref())?;
            Ok(())
        }

        Commands::Tree(args) => {
            let indent_width = if args.gradle {
                IndentTreeParser::GRADLE_INDENT
            } else {
                args.indent_width
            };
            cli::run_tree(&args.input, indent_width, args.to, args.output.as_deref())?;
            Ok(())
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sbom-graph", &mut io::stdout());
            Ok(())
        }
    }
}
