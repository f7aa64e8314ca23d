use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{run_build, run_eval, run_query, BuildArgs, EvalArgs, QueryArgs};
use config::Settings;
use docqa_vector_store::EmbeddingProvider;
use std::path::PathBuf;
use std::str::FromStr;

mod commands;
mod config;
mod progress;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Retrieval over a crawled documentation corpus", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (overrides DOCQA_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Index directory (overrides DOCQA_INDEX_DIR)
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Embeddings provider: local|hosted|hash
    #[arg(long, global = true, value_parser = EmbeddingProvider::from_str)]
    provider: Option<EmbeddingProvider>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, embed and publish an index from extracted documents
    Build(BuildArgs),

    /// Retrieve the top passages for a question
    Query(QueryArgs),

    /// Score retrieval against a labeled query set
    Eval(EvalArgs),
}

impl Commands {
    fn wants_json(&self) -> bool {
        match self {
            Self::Build(_) => false,
            Self::Query(args) => args.json,
            Self::Eval(args) => args.json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // stdout is reserved for the JSON document
    let quiet = cli.quiet || cli.command.wants_json();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    if !cli.verbose {
        builder.filter_module("ort", log::LevelFilter::Off);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = cli.index_dir {
        settings.index_dir = dir;
    }
    if let Some(provider) = cli.provider {
        settings.embeddings.provider = provider;
    }
    log::debug!("Effective settings: {settings:?}");

    match cli.command {
        Commands::Build(args) => run_build(settings, args, quiet).await?,
        Commands::Query(args) => run_query(settings, args).await?,
        Commands::Eval(args) => run_eval(settings, args).await?,
    }
    Ok(())
}
