//! kconftool CLI - merge, split and assemble Kconfig fragments.

use std::{num::NonZeroUsize, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use kconftool::{
    cmd::{
        Stats,
        assemble::{AssembleRequest, assemble},
        split::{DEFAULT_PREFIX, read_categories},
    },
    ctx::{AppContext, STDOUT},
    partition::PartitionMode,
    profile::ProfileSet,
};
use ktree::TreeSnapshot;
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "kconftool")]
#[command(version)]
#[command(about = "Merge, minimize and split Kconfig configuration fragments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct KernelArgs {
    /// Root of the kernel source tree
    #[arg(short, long, default_value = ".")]
    kernel_source: PathBuf,

    /// Fail when a fragment assigns a symbol the tree does not declare
    #[arg(long)]
    fail_on_unknown: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge fragments into one configuration
    Merge {
        #[command(flatten)]
        kernel: KernelArgs,

        /// Target architecture
        #[arg(short, long)]
        arch: String,

        /// Write a minimal configuration instead of a full one
        #[arg(short, long)]
        minimal: bool,

        /// Output file, `-` for stdout
        #[arg(short, long, default_value = STDOUT)]
        output: PathBuf,

        /// Fragments, applied in order
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },

    /// Split a configuration into per-section fragments
    #[command(group(
        clap::ArgGroup::new("mode")
            .required(true)
            .args(["categories", "section", "max_symbols"]),
    ))]
    Split {
        #[command(flatten)]
        kernel: KernelArgs,

        /// Target architecture
        #[arg(short, long)]
        arch: String,

        /// File listing one section path per line
        #[arg(short, long)]
        categories: Option<PathBuf>,

        /// Section path to split out; may be repeated
        #[arg(short, long)]
        section: Vec<String>,

        /// Maximum number of symbols per fragment
        #[arg(long)]
        max_symbols: Option<NonZeroUsize>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        destdir: PathBuf,

        /// Output file prefix
        #[arg(short, long, default_value = DEFAULT_PREFIX)]
        prefix: String,

        /// Configuration to split
        source: PathBuf,
    },

    /// Build the configuration of a profile
    Assemble {
        #[command(flatten)]
        kernel: KernelArgs,

        /// Directory holding profiles.toml and the fragments
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Extra include group; may be repeated
        #[arg(short, long)]
        include: Vec<String>,

        /// Write a minimal configuration instead of a full one
        #[arg(short, long)]
        minimal: bool,

        /// Output file, `-` for stdout
        #[arg(short, long, default_value = STDOUT)]
        output: PathBuf,

        /// Profile name
        profile: String,
    },

    /// Print the JSON schema of a file format
    Schema {
        /// File format
        #[arg(value_enum)]
        format: SchemaFormat,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum SchemaFormat {
    /// Tree snapshot (`.kconfig-tree/<arch>.json`)
    Tree,
    /// Profiles file (`profiles.toml`)
    Profiles,
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn summary(stats: &Stats, what: &str) {
    let mut line = format!(">>> Written {} symbols{what}", stats.nb_symbols);
    if !stats.files.is_empty() {
        let files: Vec<_> = stats.files.iter().map(|f| f.display().to_string()).collect();
        line.push_str(&format!(" to {}", files.join(", ")));
    }
    eprintln!("{}", format!("{line}.").green());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Merge {
            kernel,
            arch,
            minimal,
            output,
            sources,
        } => {
            let ctx = AppContext::new(kernel.kernel_source, arch)
                .fail_on_unknown(kernel.fail_on_unknown);
            let stats = ctx.merge(&sources, minimal, &output).await?;
            summary(&stats, "");
        }

        Commands::Split {
            kernel,
            arch,
            categories,
            section,
            max_symbols,
            destdir,
            prefix,
            source,
        } => {
            let mode = match (categories, max_symbols) {
                (Some(path), _) => PartitionMode::Sections(read_categories(&path).await?),
                (None, Some(bound)) => PartitionMode::MaxSymbols(bound),
                (None, None) => PartitionMode::Sections(section),
            };
            let ctx = AppContext::new(kernel.kernel_source, arch)
                .fail_on_unknown(kernel.fail_on_unknown);
            let stats = ctx.split(&source, &mode, &destdir, &prefix).await?;
            summary(&stats, "");
        }

        Commands::Assemble {
            kernel,
            root,
            include,
            minimal,
            output,
            profile,
        } => {
            let request = AssembleRequest {
                root,
                profile,
                includes: include,
                minimal,
                output,
            };
            let stats = assemble(&kernel.kernel_source, kernel.fail_on_unknown, &request)
                .await
                .with_context(|| format!("cannot assemble profile {}", request.profile))?;
            summary(&stats, &format!(" for {}", request.profile));
        }

        Commands::Schema { format } => {
            let schema = match format {
                SchemaFormat::Tree => schemars::schema_for!(TreeSnapshot),
                SchemaFormat::Profiles => schemars::schema_for!(ProfileSet),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}
