//! Cluster Annotator CLI: enrich entity clusters with Wikidata relations.
//!
//! Usage:
//!   cluster-annotator --clusters <file> --linkings <file> --output <dir>
//!                     [--threads 8] [--config path] [--cache path] [--no-cache] [--verbose]

use clap::Parser;
use cluster_annotator::{
    clusters_from_file, linkings_from_file, write_reports, EnrichConfig, EnrichmentEngine,
    SparqlFetcher,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser)]
#[command(
    name = "cluster-annotator",
    version,
    about = "Enrich clusters with further information by utilizing external sources"
)]
struct Cli {
    /// File containing clustered entities (cluster_id,embedding_tag)
    #[arg(long)]
    clusters: PathBuf,
    /// File mapping embedding tags to Wikidata ids (embedding_tag,knowledgebase_id)
    #[arg(long)]
    linkings: PathBuf,
    /// Directory the enriched cluster reports are written to
    #[arg(long)]
    output: PathBuf,
    /// Number of concurrent workers
    #[arg(long, default_value_t = 8)]
    threads: usize,
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Relation cache file (overrides the configured path)
    #[arg(long, conflicts_with = "no_cache")]
    cache: Option<PathBuf>,
    /// Neither read nor write the relation cache
    #[arg(long)]
    no_cache: bool,
    /// Log batch level detail
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .init();
}

fn check_file(path: &Path, what: &str) -> Result<(), String> {
    if path.is_file() {
        Ok(())
    } else {
        Err(format!("{} '{}' is not a readable file", what, path.display()))
    }
}

fn load_config(cli: &Cli) -> Result<EnrichConfig, String> {
    let mut config = match &cli.config {
        Some(path) => EnrichConfig::from_file(path)
            .map_err(|e| format!("Failed to load config '{}': {}", path.display(), e))?,
        None => EnrichConfig::default(),
    };
    if let Some(path) = &cli.cache {
        config.cache.path = Some(path.clone());
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), String> {
    check_file(&cli.clusters, "Clusters file")?;
    check_file(&cli.linkings, "Linkings file")?;
    if !cli.output.is_dir() {
        return Err(format!("Output '{}' is not a directory", cli.output.display()));
    }
    let config = load_config(&cli)?;

    let started = Instant::now();
    let clusters = clusters_from_file(&cli.clusters)
        .map_err(|e| format!("Failed to read clusters: {}", e))?;
    let linkings = linkings_from_file(&cli.linkings)
        .map_err(|e| format!("Failed to read linkings: {}", e))?;
    info!(
        clusters = clusters.len(),
        linkings = linkings.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Loaded input"
    );

    let fetcher = SparqlFetcher::new(&config.endpoint)
        .map_err(|e| format!("Failed to create SPARQL client: {}", e))?;
    let engine = EnrichmentEngine::from_config(&config, linkings, Arc::new(fetcher));
    let metrics = engine
        .run(clusters, cli.threads)
        .await
        .map_err(|e| format!("Enrichment failed: {}", e))?;

    let report = write_reports(&cli.output, &metrics, &config.report)
        .map_err(|e| format!("Failed to write reports: {}", e))?;
    println!("Enriched {} clusters into {}", metrics.len(), report.display());
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(code);
}
