//! bindr CLI - bind config documents against schema records

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use bindr::{
    normalize, source, BindError, BindOptions, BoundRecord, FixSuggestion, SchemaRegistry,
    DEFAULT_MAX_DEPTH,
};

#[derive(Parser)]
#[command(name = "bindr")]
#[command(about = "bindr - bind JSON/YAML config documents into typed records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind a config document and print a summary
    Check(BindArgs),

    /// Bind a config document and print the bound record as JSON
    Bind(BindArgs),

    /// Print the normalized form of each key
    Normalize {
        /// Keys as they appear in a config document
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[derive(Args)]
struct BindArgs {
    /// Config document (.json, .yaml or .yml)
    config: PathBuf,

    /// Schema document declaring the records
    #[arg(short, long)]
    schema: PathBuf,

    /// Record to bind (defaults to the schema's root)
    #[arg(short, long)]
    record: Option<String>,

    /// Skip unknown keys instead of failing
    #[arg(long)]
    lenient: bool,

    /// Maximum nesting of records and containers
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check(args) => check(&args),
        Commands::Bind(args) => bind(&args),
        Commands::Normalize { keys } => {
            for key in keys {
                println!("{}", normalize(&key));
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.downcast_ref::<BindError>().and_then(|e| e.fix_suggestion()) {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn check(args: &BindArgs) -> Result<()> {
    let (name, record) = bind_config(args)?;

    println!(
        "{} '{}' binds to {}",
        "✓".green(),
        args.config.display(),
        name.cyan().bold()
    );
    println!("  Fields: {}", record.len());
    for (field, value) in record.fields() {
        println!("  {}: {}", field, value.kind());
    }
    Ok(())
}

fn bind(args: &BindArgs) -> Result<()> {
    let (_, record) = bind_config(args)?;
    let json = serde_json::to_string_pretty(&record.to_json())?;
    println!("{json}");
    Ok(())
}

fn bind_config(args: &BindArgs) -> Result<(String, BoundRecord)> {
    let schema = load_schema(&args.schema)?;

    let name = match (&args.record, schema.root()) {
        (Some(name), _) => name.clone(),
        (None, Some(root)) => root.to_string(),
        (None, None) => bail!(
            "no --record given and schema '{}' declares no root",
            args.schema.display()
        ),
    };

    let config = source::load_document(&args.config)
        .with_context(|| format!("failed to read config '{}'", args.config.display()))?;

    let options = BindOptions::default()
        .with_strict(!args.lenient)
        .with_max_depth(args.max_depth);

    let record = schema
        .bind(&name, &config, &options)
        .with_context(|| format!("config '{}' does not bind to {name}", args.config.display()))?;
    Ok((name, record))
}

fn load_schema(path: &Path) -> Result<SchemaRegistry> {
    let document = source::load_document(path)
        .with_context(|| format!("failed to read schema '{}'", path.display()))?;
    SchemaRegistry::from_value(&document)
        .with_context(|| format!("invalid schema '{}'", path.display()))
}
