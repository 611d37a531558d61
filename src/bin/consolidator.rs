//! Consolidator CLI: convergence analysis and enrichment over JSON documents.
//!
//! Usage:
//!   consolidator enrich --input docs.json [--output enriched.json]
//!   consolidator analyze --input docs.json
//!   consolidator index --input enriched.json [--db path] [--collection name]
//!   consolidator search (--like <id> | --vector 0.1,0.2,...) [--limit n]
//!   consolidator report [--json]

use clap::{Parser, Subcommand};
use consolidator::enrichment::ProgressEvent;
use consolidator::{
    index_documents, load_config, CollectionReport, ConvergenceAnalysisService, Document,
    DocumentId, IntelligenceEnrichmentPipeline, OpenStore, PipelineConfig, SqliteVectorStore,
    VectorStore,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "consolidator",
    version,
    about = "Convergence analysis and intelligence enrichment for embedded documents"
)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich documents with convergence and intelligence metadata
    Enrich {
        /// JSON array of documents
        #[arg(long)]
        input: PathBuf,
        /// Where to write enriched documents (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the similarity threshold
        #[arg(long)]
        threshold: Option<f32>,
        /// Override the batch size
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Detect convergence chains and print the analysis as JSON
    Analyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Write enriched documents into the vector store
    Index {
        #[arg(long)]
        input: PathBuf,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        collection: Option<String>,
    },
    /// Find stored documents similar to a vector or to a stored document
    Search {
        /// Use the stored vector of this document as the query
        #[arg(long, conflicts_with = "vector")]
        like: Option<String>,
        /// Comma-separated query vector
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        vector: Option<Vec<f32>>,
        #[arg(long)]
        limit: Option<usize>,
        /// Minimum cosine similarity
        #[arg(long, allow_hyphen_values = true)]
        score_threshold: Option<f32>,
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        collection: Option<String>,
    },
    /// Statistics over a stored collection
    Report {
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        collection: Option<String>,
        /// Print JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_documents(path: &Path) -> Result<Vec<Document>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid documents in '{}': {}", path.display(), e))
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<&Path>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    match output {
        Some(path) => std::fs::write(path, json)
            .map_err(|e| format!("cannot write '{}': {}", path.display(), e)),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

fn open_store(config: &PipelineConfig, db: Option<PathBuf>) -> Result<SqliteVectorStore, String> {
    let path = db.unwrap_or_else(|| config.store_path());
    SqliteVectorStore::open(&path).map_err(|e| format!("Failed to open database: {}", e))
}

fn report_progress(event: ProgressEvent) {
    match event {
        ProgressEvent::BatchScored {
            batch,
            batches,
            processed,
            total,
        } => tracing::info!(batch, batches, processed, total, "progress"),
        ProgressEvent::ChainsDetected { chains, skipped } => {
            tracing::info!(chains, skipped, "chains detected")
        }
        _ => {}
    }
}

async fn cmd_enrich(
    config: &PipelineConfig,
    input: &Path,
    output: Option<&Path>,
    threshold: Option<f32>,
    batch_size: Option<usize>,
) -> i32 {
    let documents = match read_documents(input) {
        Ok(docs) => docs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut options = config.enrichment.clone();
    if let Some(t) = threshold {
        options.threshold = t;
    }
    if let Some(size) = batch_size {
        options.batch_size = size;
    }

    let pipeline = IntelligenceEnrichmentPipeline::new();
    let outcome = match pipeline
        .enrich_with_progress(documents, &options, &report_progress)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if let Err(e) = write_json(&outcome.documents, output) {
        eprintln!("Error: {}", e);
        return 1;
    }
    let s = &outcome.summary;
    eprintln!(
        "Enriched {} of {} documents ({} degraded), {} chains, {} breakthroughs",
        s.enriched, s.total_documents, s.degraded, s.chains, s.breakthroughs
    );
    0
}

fn cmd_analyze(config: &PipelineConfig, input: &Path, threshold: Option<f32>) -> i32 {
    let documents = match read_documents(input) {
        Ok(docs) => docs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut convergence = config.enrichment.convergence_config();
    if let Some(t) = threshold {
        convergence.threshold = t;
    }
    let service = match ConvergenceAnalysisService::new(convergence) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let analysis = service.analyze_convergence(&documents);
    match write_json(&analysis, None) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_index(store: &dyn VectorStore, collection: &str, input: &Path) -> i32 {
    let documents = match read_documents(input) {
        Ok(docs) => docs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match index_documents(store, collection, &documents).await {
        Ok(report) => {
            println!(
                "Indexed {} documents into '{}' ({} without embeddings skipped)",
                report.indexed, collection, report.skipped
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// One extra hit when the query document itself will be dropped
fn fetch_size(limit: usize, excludes_query: bool) -> usize {
    limit.saturating_add(usize::from(excludes_query))
}

async fn cmd_search(
    store: &dyn VectorStore,
    collection: &str,
    like: Option<String>,
    vector: Option<Vec<f32>>,
    limit: usize,
    score_threshold: Option<f32>,
) -> i32 {
    let (query, exclude) = match (like, vector) {
        (Some(id), _) => {
            let id = DocumentId::new(id);
            match store.get(collection, &id).await {
                Ok(Some(point)) => (point.vector, Some(id)),
                Ok(None) => {
                    eprintln!("Error: document '{}' not found in '{}'", id, collection);
                    return 1;
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            }
        }
        (None, Some(vector)) => (vector, None),
        (None, None) => {
            eprintln!("Error: either --like or --vector is required");
            return 2;
        }
    };

    let fetch = fetch_size(limit, exclude.is_some());
    let hits = match store.search(collection, &query, fetch, score_threshold).await {
        Ok(hits) => hits,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let hits: Vec<_> = hits
        .into_iter()
        .filter(|hit| Some(&hit.id) != exclude.as_ref())
        .take(limit)
        .collect();

    if hits.is_empty() {
        println!("No matches.");
        return 0;
    }
    println!("{:>6}  {:<40}  {:<20}  {}", "SCORE", "ID", "TYPE", "SOURCE");
    println!("{}", "-".repeat(90));
    for hit in hits {
        println!(
            "{:>6.3}  {:<40}  {:<20}  {}",
            hit.score,
            hit.id,
            hit.payload
                .intelligence_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".into()),
            hit.payload.source_file.as_deref().unwrap_or("-")
        );
    }
    0
}

async fn cmd_report(store: &dyn VectorStore, collection: &str, json: bool) -> i32 {
    let points = match store.points(collection).await {
        Ok(points) => points,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let report = CollectionReport::from_points(&points);
    if json {
        match write_json(&report, None) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        }
    } else {
        print!("{}", report);
        0
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Enrich {
            input,
            output,
            threshold,
            batch_size,
        } => cmd_enrich(&config, &input, output.as_deref(), threshold, batch_size).await,
        Commands::Analyze { input, threshold } => cmd_analyze(&config, &input, threshold),
        Commands::Index {
            input,
            db,
            collection,
        } => match open_store(&config, db) {
            Ok(store) => {
                let collection = collection.unwrap_or_else(|| config.collection.clone());
                cmd_index(&store, &collection, &input).await
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Search {
            like,
            vector,
            limit,
            score_threshold,
            db,
            collection,
        } => match open_store(&config, db) {
            Ok(store) => {
                let collection = collection.unwrap_or_else(|| config.collection.clone());
                let limit = limit.unwrap_or(config.search_limit);
                let threshold = score_threshold.or(config.score_threshold);
                cmd_search(&store, &collection, like, vector, limit, threshold).await
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Report {
            db,
            collection,
            json,
        } => match open_store(&config, db) {
            Ok(store) => {
                let collection = collection.unwrap_or_else(|| config.collection.clone());
                cmd_report(&store, &collection, json).await
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    };
    std::process::exit(code);
}
