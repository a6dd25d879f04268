//! CLI entry point for the vector index.
//!
//! Loads documents from JSON lines, builds an in-memory engine and runs
//! searches, batches, similarity checks, quantization and benchmarks
//! against it. Nothing is persisted between runs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow, bail};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use vecscan::display::{
    create_batch_table, create_benchmark_table, create_quantize_table, create_results_table,
    create_stats_table,
};
use vecscan::vector::{kernel, normalize};
use vecscan::{
    DocumentId, SearchParams, SearchResult, Settings, VectorDimension, VectorError,
    VectorSearchEngine, logging,
};

/// One line of a documents file.
#[derive(Debug, Deserialize)]
struct DocumentRecord {
    id: DocumentId,
    vector: Vec<f32>,
}

// JSON output structures
#[derive(Debug, Serialize)]
struct BatchEntry {
    query: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<Vec<SearchResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<BatchError>,
}

#[derive(Debug, Serialize)]
struct BatchError {
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct SimilarityOutput {
    similarity: f32,
}

#[derive(Debug, Serialize)]
struct BenchOutput {
    documents: usize,
    dimension: usize,
    queries: usize,
    worker_threads: usize,
    average_query_micros: u128,
}

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Exact in-memory vector search
#[derive(Parser)]
#[command(
    name = "vecscan",
    version = env!("CARGO_PKG_VERSION"),
    about = "Exact in-memory vector search",
    long_about = "Exhaustive cosine-similarity search over vectors loaded from JSON lines.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Vector dimension (overrides config)
    #[arg(short, long, global = true)]
    dimension: Option<usize>,

    /// Number of worker threads (overrides config)
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .vecscan directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Rank documents against one query
    #[command(
        after_help = "Examples:\n  vecscan search --docs docs.jsonl --query '[0.1, 0.9, 0.0]'\n  vecscan search --docs docs.jsonl --query '[1, 0, 0]' --top-k 3 --min-similarity 0.5 --json"
    )]
    Search {
        /// JSON lines file of {"id": .., "vector": [..]}
        #[arg(long)]
        docs: PathBuf,

        /// Query vector as a JSON array
        #[arg(short, long)]
        query: String,

        /// Maximum number of results (overrides config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Inclusive similarity floor (overrides config)
        #[arg(short, long, allow_negative_numbers = true)]
        min_similarity: Option<f32>,
    },

    /// Rank documents against every query in a file
    Batch {
        /// JSON lines file of {"id": .., "vector": [..]}
        #[arg(long)]
        docs: PathBuf,

        /// JSON lines file with one query array per line
        #[arg(long)]
        queries: PathBuf,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        #[arg(short, long, allow_negative_numbers = true)]
        min_similarity: Option<f32>,
    },

    /// Cosine similarity of two vectors
    Similarity {
        /// First vector as a JSON array
        a: String,
        /// Second vector as a JSON array
        b: String,
    },

    /// Quantize a vector to signed 8-bit codes
    Quantize {
        /// Vector as a JSON array
        vector: String,
    },

    /// Load documents and report index statistics
    Stats {
        #[arg(long)]
        docs: PathBuf,
    },

    /// Benchmark search over random unit vectors
    #[command(about = "Benchmark search throughput")]
    Bench {
        /// Number of indexed vectors
        #[arg(short = 'n', long, default_value = "10000")]
        count: usize,

        /// Number of timed queries
        #[arg(short, long, default_value = "20")]
        queries: usize,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .vecscan/settings.toml")]
    Config,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Settings::load_from(path).map_err(|e| {
            anyhow!("Configuration error loading from {}: {e}", path.display())
        })?,
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };

    // Override config with CLI args
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(dimension) = cli.dimension {
        config.engine.dimension = VectorDimension::new(dimension)?;
    }
    if let Some(threads) = cli.threads {
        config.engine.parallel_threads = threads;
    }

    logging::init(&config.logging)?;

    match cli.command {
        Commands::Init { force } => {
            let dir = std::env::current_dir()?;
            let path = Settings::init_config_file(&dir, force).map_err(|e| anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration:");
                println!("{}", "=".repeat(50));
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }

        Commands::Search {
            docs,
            query,
            top_k,
            min_similarity,
        } => {
            let engine = load_engine(&config, &docs)?;
            let query = parse_vector(&query).context("Invalid --query")?;
            let params = search_params(&config, top_k, min_similarity);

            let results = engine.search_with(&query, params)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("{}", create_results_table(&results));
            }
        }

        Commands::Batch {
            docs,
            queries,
            top_k,
            min_similarity,
        } => {
            let engine = load_engine(&config, &docs)?;
            let queries = read_queries(&queries)?;
            let params = search_params(&config, top_k, min_similarity);

            let results = engine.search_batch(&queries, params);
            if cli.json {
                let entries: Vec<BatchEntry> = results
                    .into_iter()
                    .enumerate()
                    .map(|(query, result)| match result {
                        Ok(results) => BatchEntry {
                            query,
                            results: Some(results),
                            error: None,
                        },
                        Err(e) => BatchEntry {
                            query,
                            results: None,
                            error: Some(BatchError {
                                code: e.status_code(),
                                message: e.to_string(),
                            }),
                        },
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("{}", create_batch_table(&results));
            }
        }

        Commands::Similarity { a, b } => {
            let a = parse_vector(&a).context("Invalid first vector")?;
            let b = parse_vector(&b).context("Invalid second vector")?;
            let dimension = VectorDimension::new(a.len())?;

            let similarity = kernel::similarity(dimension, &a, &b)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&SimilarityOutput { similarity })?
                );
            } else {
                println!("{similarity:.6}");
            }
        }

        Commands::Quantize { vector } => {
            let vector = parse_vector(&vector).context("Invalid vector")?;
            let quantized = vecscan::vector::quantize(&vector)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&quantized)?);
            } else {
                println!("{}", create_quantize_table(&vector, &quantized));
            }
        }

        Commands::Stats { docs } => {
            let engine = load_engine(&config, &docs)?;
            let stats = engine.stats();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{}", create_stats_table(&stats));
            }
        }

        Commands::Bench {
            count,
            queries,
            seed,
        } => run_benchmark(&config, count, queries, seed, cli.json)?,
    }

    Ok(())
}

fn search_params(
    config: &Settings,
    top_k: Option<usize>,
    min_similarity: Option<f32>,
) -> SearchParams {
    let mut params = config.search.params();
    if let Some(k) = top_k {
        params = params.with_top_k(k);
    }
    if let Some(floor) = min_similarity {
        params = params.with_min_similarity(floor);
    }
    params
}

fn parse_vector(text: &str) -> anyhow::Result<Vec<f32>> {
    serde_json::from_str(text).with_context(|| format!("expected a JSON array of numbers: {text}"))
}

/// Builds an engine from config and fills it from a documents file.
fn load_engine(config: &Settings, path: &Path) -> anyhow::Result<VectorSearchEngine> {
    let records = read_documents(path)?;
    let mut engine = VectorSearchEngine::from_config(&config.engine)?;

    let started = Instant::now();
    engine
        .add_documents(
            records
                .iter()
                .map(|record| (record.id, record.vector.as_slice())),
        )
        .map_err(|e| match e {
            VectorError::DimensionMismatch { .. } => anyhow!(e).context(format!(
                "{} does not match the configured dimension",
                path.display()
            )),
            other => anyhow!(other),
        })?;

    info!(
        "Loaded {} documents from {} in {:?}",
        engine.document_count(),
        path.display(),
        started.elapsed()
    );

    Ok(engine)
}

fn read_documents(path: &Path) -> anyhow::Result<Vec<DocumentRecord>> {
    read_json_lines(path)
}

fn read_queries(path: &Path) -> anyhow::Result<Vec<Vec<f32>>> {
    read_json_lines(path)
}

/// Parses one JSON value per non-blank line.
fn read_json_lines<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut items = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid JSON line", path.display(), index + 1))?;
        items.push(item);
    }

    Ok(items)
}

/// Times `queries` searches over `count` random unit vectors.
fn run_benchmark(
    config: &Settings,
    count: usize,
    queries: usize,
    seed: u64,
    json: bool,
) -> anyhow::Result<()> {
    if queries == 0 {
        bail!("--queries must be at least 1");
    }

    let dim = config.engine.dimension.get();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut random_unit = || {
        let mut v: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect();
        normalize(&mut v);
        v
    };

    let documents: Vec<Vec<f32>> = (0..count).map(|_| random_unit()).collect();
    let probes: Vec<Vec<f32>> = (0..queries).map(|_| random_unit()).collect();

    let mut engine = VectorSearchEngine::from_config(&config.engine)?;
    engine.add_documents(
        documents
            .iter()
            .enumerate()
            .map(|(i, v)| (DocumentId::new(i as i64), v.as_slice())),
    )?;

    let params = config.search.params();
    // Warm up the pool and caches
    let _ = engine.search_with(&probes[0], params)?;

    let started = Instant::now();
    for probe in &probes {
        let _ = engine.search_with(probe, params)?;
    }
    let total = started.elapsed();
    let avg = total / u32::try_from(queries).unwrap_or(u32::MAX);
    let avg = if avg.is_zero() { Duration::from_nanos(1) } else { avg };

    if json {
        let output = BenchOutput {
            documents: count,
            dimension: dim,
            queries,
            worker_threads: engine.worker_threads(),
            average_query_micros: avg.as_micros(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{}",
            create_benchmark_table(count, dim, queries, avg, engine.worker_threads())
        );
    }

    Ok(())
}
