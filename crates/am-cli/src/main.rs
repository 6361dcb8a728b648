#![forbid(unsafe_code)]

//! archimodel CLI - export ArchiMate models from Markdown architecture vaults.
//!
//! # Commands
//!
//! - `export`: Write the exchange-format model and the draw.io migration diagrams
//! - `extract`: Output the extracted model as JSON for tooling/debugging
//! - `summary`: Show element, relationship and migration counts
//! - `validate`: Check the extracted model's structural invariants

mod config;
mod vault;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use am_core::{ArchiModel, Document};
use am_extract::{Extractor, ModelSummary, classify, render_markdown, summarize};
use am_render_xml::{render_drawio, serialize_exchange};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

use crate::config::ExportConfig;

const FALLBACK_MODEL_NAME: &str = "Architecture Model";

/// archimodel CLI - export ArchiMate models from Markdown architecture vaults.
#[derive(Debug, Parser)]
#[command(
    name = "archimodel",
    version,
    about = "archimodel - export ArchiMate models from Markdown architecture vaults",
    long_about = "Extracts an ArchiMate model from TOGAF-style Markdown documents.\n\n\
        Writes the Open Group exchange format and draw.io As-Is, Target and\n\
        Migration diagrams."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Args)]
struct VaultArgs {
    /// Vault directory holding the Markdown documents
    vault: PathBuf,

    /// Config file (defaults to archimodel.toml in the vault root)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model name (defaults to the config value, then the vault directory name)
    #[arg(short, long)]
    name: Option<String>,

    /// Skip the name-matching relationships between layers
    #[arg(long)]
    no_cross_layer: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the exchange-format model and the draw.io diagrams.
    Export {
        #[command(flatten)]
        vault: VaultArgs,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Print the summary as JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },

    /// Output the extracted model as JSON.
    Extract {
        #[command(flatten)]
        vault: VaultArgs,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Show model statistics.
    Summary {
        #[command(flatten)]
        vault: VaultArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the extracted model's structural invariants.
    Validate {
        #[command(flatten)]
        vault: VaultArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Export {
            vault,
            output,
            json,
        } => cmd_export(&vault, &output, json),

        Command::Extract { vault, pretty } => cmd_extract(&vault, pretty),

        Command::Summary { vault, json } => cmd_summary(&vault, json),

        Command::Validate { vault, json } => cmd_validate(&vault, json),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .try_init();
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).context(format!("Failed to write to: {}", path.display()))?;
    info!("Wrote output to: {}", path.display());
    Ok(())
}

fn print_stdout(content: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(content.as_bytes())
        .and_then(|()| {
            if content.ends_with('\n') {
                Ok(())
            } else {
                stdout.write_all(b"\n")
            }
        })
        .context("Failed to write to stdout")
}

// =============================================================================
// Pipeline
// =============================================================================

/// A loaded vault with its resolved configuration.
struct Pipeline {
    documents: Vec<Document>,
    config: ExportConfig,
    model_name: String,
}

impl Pipeline {
    fn prepare(args: &VaultArgs) -> Result<Self> {
        let mut config = ExportConfig::discover(args.config.as_deref(), &args.vault)
            .context(format!("Failed to load config for vault: {}", args.vault.display()))?;
        if args.no_cross_layer {
            config.extract.cross_layer_inference = false;
        }
        let documents = vault::load_vault(&args.vault)?;
        if documents.is_empty() {
            warn!("No Markdown documents found under: {}", args.vault.display());
        }
        let model_name = args
            .name
            .clone()
            .or_else(|| config.model_name.clone())
            .or_else(|| vault_dir_name(&args.vault))
            .unwrap_or_else(|| FALLBACK_MODEL_NAME.to_string());
        debug!(documents = documents.len(), model = %model_name, "pipeline prepared");
        Ok(Self {
            documents,
            config,
            model_name,
        })
    }

    fn extract(&self, exported_at: Option<String>) -> ArchiModel {
        let mut options = self.config.extract.clone();
        options.exported_at = exported_at;
        Extractor::new(options).extract(&self.documents, &self.model_name)
    }

    fn summary(&self, model: &ArchiModel) -> ModelSummary {
        summarize(model, &classify(model, &self.documents))
    }
}

fn vault_dir_name(vault: &Path) -> Option<String> {
    let resolved = vault.canonicalize().ok()?;
    resolved
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .filter(|name| !name.trim().is_empty())
}

fn print_summary(model_name: &str, summary: &ModelSummary, json: bool) -> Result<()> {
    if json {
        let output = serde_json::to_string_pretty(summary)?;
        print_stdout(&output)
    } else {
        print_stdout(&render_markdown(model_name, summary))
    }
}

// =============================================================================
// Command: export
// =============================================================================

fn cmd_export(args: &VaultArgs, output_dir: &Path, json: bool) -> Result<()> {
    let pipeline = Pipeline::prepare(args)?;
    let exported_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("Failed to format export timestamp")?;
    let model = pipeline.extract(Some(exported_at));
    let classified = classify(&model, &pipeline.documents);
    let grid = &pipeline.config.layout;

    let exchange = serialize_exchange(&model, grid);
    let drawio = render_drawio(&classified, grid);

    std::fs::create_dir_all(output_dir)
        .context(format!("Failed to create output directory: {}", output_dir.display()))?;
    let stem = pipeline.config.output.file_stem();
    let files = [
        (format!("{stem}.xml"), exchange),
        (format!("{stem}-as-is.drawio"), drawio.as_is),
        (format!("{stem}-target.drawio"), drawio.target),
        (format!("{stem}-migration.drawio"), drawio.migration),
        (format!("{stem}-combined.drawio"), drawio.combined),
    ];
    for (file_name, content) in &files {
        write_output(&output_dir.join(file_name), content)?;
    }
    info!(
        elements = model.elements.len(),
        relationships = model.relationships.len(),
        views = model.views.len(),
        "Exported {} files to: {}",
        files.len(),
        output_dir.display()
    );

    print_summary(&pipeline.model_name, &summarize(&model, &classified), json)
}

// =============================================================================
// Command: extract
// =============================================================================

fn cmd_extract(args: &VaultArgs, pretty: bool) -> Result<()> {
    let pipeline = Pipeline::prepare(args)?;
    let model = pipeline.extract(None);

    let output = if pretty {
        serde_json::to_string_pretty(&model)?
    } else {
        serde_json::to_string(&model)?
    };
    print_stdout(&output)
}

// =============================================================================
// Command: summary
// =============================================================================

fn cmd_summary(args: &VaultArgs, json: bool) -> Result<()> {
    let pipeline = Pipeline::prepare(args)?;
    let model = pipeline.extract(None);
    print_summary(&pipeline.model_name, &pipeline.summary(&model), json)
}

// =============================================================================
// Command: validate
// =============================================================================

#[derive(Debug, Serialize)]
struct ValidateResult {
    valid: bool,
    documents: usize,
    elements: usize,
    relationships: usize,
    views: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn cmd_validate(args: &VaultArgs, json_output: bool) -> Result<()> {
    let pipeline = Pipeline::prepare(args)?;
    let model = pipeline.extract(None);
    let error = model.validate().err().map(|error| error.to_string());

    let result = ValidateResult {
        valid: error.is_none(),
        documents: pipeline.documents.len(),
        elements: model.elements.len(),
        relationships: model.relationships.len(),
        views: model.views.len(),
        error,
    };

    if json_output {
        let output = serde_json::to_string_pretty(&result)?;
        println!("{output}");
    } else {
        if result.valid {
            println!("✓ Valid model from {} documents", result.documents);
        } else {
            println!("✗ Invalid model");
        }

        println!("  Elements: {}", result.elements);
        println!("  Relationships: {}", result.relationships);
        println!("  Views: {}", result.views);

        if let Some(error) = &result.error {
            println!("\nError:\n  {error}");
        }
    }

    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}
