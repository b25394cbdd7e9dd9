//! Shelfgraph CLI
//!
//! Offline driver and thin serving shim for the recommendation engine:
//! - `build`: raw book records (JSON Lines) → persisted knowledge graph
//! - `mine`: raw comment records (JSON Lines) → cached keyword index
//! - `recommend`: one recommendation request against the loaded artifacts
//! - `stats`: corpus statistics for a built graph
//!
//! Enum validation happens here, at the boundary; the core only ever sees
//! typed, legal values.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::de::DeserializeOwned;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use ahash::AHashMap;
use shelfgraph_kg::{
    build_graph, load_entities, load_relations, save_entities, save_relations, EntityId,
    EntityKind, KnowledgeGraph, RawBookRecord,
};
use shelfgraph_mining::{load_cache, mine_or_load, MiningConfig, RawCommentRecord, Stopwords};
use shelfgraph_recommend::{RecommendRequest, Recommender, RelationKind, Strategy};

const ENTITIES_BLOB: &str = "entities.bin";
const RELATIONS_BLOB: &str = "relations.bin";
const KEYWORDS_BLOB: &str = "keywords.bin";

#[derive(Parser)]
#[command(name = "shelfgraph")]
#[command(
    author,
    version,
    about = "Explainable book recommendations over a knowledge graph and mined comment keywords"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the knowledge graph from raw book records (JSON Lines) and
    /// persist its two blobs.
    Build {
        /// Input book records, one JSON object per line
        #[arg(long)]
        books: PathBuf,
        /// Output directory for the graph blobs
        #[arg(long, default_value = "data")]
        out: PathBuf,
    },

    /// Mine comment keywords into the cached index (skips mining when the
    /// cache loads).
    Mine {
        /// Input comment records, one JSON object per line
        #[arg(long)]
        comments: PathBuf,
        /// Directory holding the graph blobs; the cache lands here too
        #[arg(long, default_value = "data")]
        data: PathBuf,
        /// Extra stopwords, one word per line
        #[arg(long)]
        stopwords: Option<PathBuf>,
        /// Delete the cache first and re-mine from scratch
        #[arg(long)]
        force: bool,
        /// Worker threads (default: available parallelism - 1)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Recommend books for a comma-separated list of favorite titles.
    Recommend {
        #[arg(long, default_value = "data")]
        data: PathBuf,
        /// Favorite book names, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        favorites: Vec<String>,
        #[arg(long, default_value_t = 20)]
        top_k: usize,
        #[arg(long, value_enum, default_value_t = StrategyArg::Mixed)]
        strategy: StrategyArg,
        /// Relation kinds to use (default: all four)
        #[arg(long, value_delimiter = ',')]
        relations: Option<Vec<RelationArg>>,
        /// Restrict matching to these keywords
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,
        /// Emit the result list as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print corpus statistics for a built graph.
    Stats {
        #[arg(long, default_value = "data")]
        data: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Mixed,
    KgOnly,
    KeywordOnly,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Mixed => Strategy::Mixed,
            StrategyArg::KgOnly => Strategy::KgOnly,
            StrategyArg::KeywordOnly => Strategy::KeywordOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RelationArg {
    Series,
    Author,
    Translator,
    Publisher,
}

impl From<RelationArg> for RelationKind {
    fn from(arg: RelationArg) -> Self {
        match arg {
            RelationArg::Series => RelationKind::Series,
            RelationArg::Author => RelationKind::Author,
            RelationArg::Translator => RelationKind::Translator,
            RelationArg::Publisher => RelationKind::Publisher,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Build { books, out } => cmd_build(&books, &out),
        Commands::Mine {
            comments,
            data,
            stopwords,
            force,
            workers,
        } => cmd_mine(&comments, &data, stopwords.as_deref(), force, workers),
        Commands::Recommend {
            data,
            favorites,
            top_k,
            strategy,
            relations,
            keywords,
            json,
        } => cmd_recommend(&data, favorites, top_k, strategy, relations, keywords, json),
        Commands::Stats { data } => cmd_stats(&data),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

/// Read JSON Lines records; a malformed line is skipped with a warning,
/// never fatal.
fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open input file {}", path.display()))?;
    let mut records = Vec::new();
    for (lineno, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read error in {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(err) => warn!(
                line = lineno + 1,
                error = %err,
                "skipping malformed record"
            ),
        }
    }
    Ok(records)
}

fn load_graph(data: &Path) -> Result<KnowledgeGraph> {
    let entities = load_entities(&data.join(ENTITIES_BLOB)).with_context(|| {
        format!(
            "cannot load graph entities from {}; run `shelfgraph build` to (re)create it",
            data.join(ENTITIES_BLOB).display()
        )
    })?;
    let relations = load_relations(&data.join(RELATIONS_BLOB)).with_context(|| {
        format!(
            "cannot load graph relations from {}; run `shelfgraph build` to (re)create it",
            data.join(RELATIONS_BLOB).display()
        )
    })?;
    Ok(KnowledgeGraph {
        entities,
        relations,
    })
}

fn cmd_build(books: &Path, out: &Path) -> Result<()> {
    let records: Vec<RawBookRecord> = read_jsonl(books)?;
    println!("{} {} book records", "loaded".green(), records.len());

    let graph = build_graph(&records);
    save_entities(&graph.entities, &out.join(ENTITIES_BLOB))?;
    save_relations(&graph.relations, &out.join(RELATIONS_BLOB))?;

    print_stats(&graph);
    println!("{} graph blobs written to {}", "ok".green().bold(), out.display());
    Ok(())
}

fn cmd_mine(
    comments: &Path,
    data: &Path,
    extra_stopwords: Option<&Path>,
    force: bool,
    workers: Option<usize>,
) -> Result<()> {
    let graph = load_graph(data)?;

    let url_to_book: AHashMap<String, EntityId> = graph
        .entities
        .iter()
        .filter(|e| e.kind == EntityKind::Book)
        .filter_map(|e| e.url.clone().map(|url| (url, e.id)))
        .collect();

    let mut stopwords = Stopwords::default();
    if let Some(path) = extra_stopwords {
        stopwords
            .extend_from_file(path)
            .with_context(|| format!("cannot read stopword file {}", path.display()))?;
    }

    let cache_path = data.join(KEYWORDS_BLOB);
    if force {
        match std::fs::remove_file(&cache_path) {
            Ok(()) => println!("{} stale cache removed", "ok".green()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("cannot remove cache {}", cache_path.display()))
            }
        }
    }

    let records: Vec<RawCommentRecord> = read_jsonl(comments)?;
    println!("{} {} comment records", "loaded".green(), records.len());

    let config = MiningConfig {
        workers,
        ..Default::default()
    };
    let index = mine_or_load(&cache_path, &records, &url_to_book, &stopwords, &config)?;

    println!(
        "{} {} books with keywords, {} distinct keywords",
        "ok".green().bold(),
        index.len(),
        index.all_keywords.len()
    );
    Ok(())
}

fn cmd_recommend(
    data: &Path,
    favorites: Vec<String>,
    top_k: usize,
    strategy: StrategyArg,
    relations: Option<Vec<RelationArg>>,
    keywords: Option<Vec<String>>,
    json: bool,
) -> Result<()> {
    let graph = load_graph(data)?;
    let index = load_cache(&data.join(KEYWORDS_BLOB)).with_context(|| {
        format!(
            "cannot load keyword index from {}; run `shelfgraph mine` to (re)create it",
            data.join(KEYWORDS_BLOB).display()
        )
    })?;

    let recommender = Recommender::new(Arc::new(graph), Arc::new(index));
    let request = RecommendRequest {
        favorites,
        top_k,
        strategy: strategy.into(),
        relations: relations.map(|rs| rs.into_iter().map(RelationKind::from).collect()),
        selected_keywords: keywords,
    };

    let results = recommender.recommend(&request);
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!(
            "{}",
            "no recommendations: none of the favorites matched a known book".yellow()
        );
        return Ok(());
    }

    for (i, rec) in results.iter().enumerate() {
        let rating = rec
            .rating
            .map(|r| format!("{r:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "\n{} {} {}",
            format!("{:>2}.", i + 1).bold(),
            rec.name.bold(),
            format!("(score {:.3}, rating {rating})", rec.score).dimmed()
        );
        if !rec.keywords.is_empty() {
            println!("    {} {}", "keywords:".dimmed(), rec.keywords.join(", "));
        }
        if !rec.matched_keywords.is_empty() {
            println!(
                "    {} {}",
                "matched:".dimmed(),
                rec.matched_keywords.join(", ")
            );
        }
        for reason in &rec.reasons {
            println!("    {} {}", "•".cyan(), reason);
        }
    }
    println!();
    Ok(())
}

fn cmd_stats(data: &Path) -> Result<()> {
    let graph = load_graph(data)?;
    print_stats(&graph);

    match load_cache(&data.join(KEYWORDS_BLOB)) {
        Ok(index) => println!(
            "  keywords:    {} books indexed, {} distinct terms",
            index.len(),
            index.all_keywords.len()
        ),
        Err(_) => println!("  keywords:    {}", "not mined yet".yellow()),
    }
    Ok(())
}

fn print_stats(graph: &KnowledgeGraph) {
    let stats = graph.stats();
    println!("{}", "corpus".bold());
    println!("  books:       {}", stats.books);
    println!("  authors:     {}", stats.authors);
    println!("  publishers:  {}", stats.publishers);
    println!("  translators: {}", stats.translators);
    println!("  series:      {}", stats.series);
    println!("  relations:   {}", stats.relations);
}
