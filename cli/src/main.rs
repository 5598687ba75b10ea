use anyhow::{Context, Result};
use boolsearch_core::{BestCandidate, Collection, Correction, CorrectionSelector, QueryOutcome, SearchConfig};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

const EXIT_COMMANDS: [&str; 6] = ["#quit", "#q", "#exit", "#e", "#close", "#c"];

#[derive(Parser)]
#[command(name = "boolsearch")]
#[command(about = "Boolean retrieval with phrase, proximity and spelling correction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Collection file or directory in SMART format (.I / .T / .W / .X)
    #[arg(long)]
    collection: PathBuf,
    /// JSON file with search settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Gram length for spelling correction
    #[arg(long = "k-gram")]
    k_gram: Option<usize>,
    /// Minimum Jaccard similarity for correction candidates
    #[arg(long)]
    jaccard: Option<f64>,
    /// Number of corrections offered per term
    #[arg(long)]
    suggestions: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the collection and print index statistics
    Stats {
        #[command(flatten)]
        source: Source,
    },
    /// Evaluate one query, auto-correcting misspelled terms
    Query {
        #[command(flatten)]
        source: Source,
        /// Boolean query, e.g. `information AND NOT "library of congress"`
        query: String,
        /// Print the outcome as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Interactive query loop with correction prompts
    Repl {
        #[command(flatten)]
        source: Source,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { source } => stats(&load(&source)?),
        Commands::Query { source, query, json } => run_query(&load(&source)?, &query, json),
        Commands::Repl { source } => repl(&load(&source)?),
    }
}

fn search_config(source: &Source) -> Result<SearchConfig> {
    let mut config = match &source.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            SearchConfig::from_json(&json)?
        }
        None => SearchConfig::default(),
    };
    if let Some(k) = source.k_gram {
        config.k_gram_length = k;
    }
    if let Some(j) = source.jaccard {
        config.jaccard_threshold = j;
    }
    if let Some(n) = source.suggestions {
        config.max_suggestions = n;
    }
    Ok(config)
}

fn load(source: &Source) -> Result<Collection> {
    let config = search_config(source)?;
    let start = Instant::now();
    let collection = Collection::read(&source.collection, config)?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    tracing::info!(elapsed_ms, documents = collection.document_count(), "index built");
    eprintln!("index built in {elapsed_ms:.2} ms ({} documents)", collection.document_count());
    Ok(collection)
}

fn stats(collection: &Collection) -> Result<()> {
    println!("\nfirst documents:\n");
    for doc in collection.documents().take(3) {
        println!("id: {}", doc.id);
        println!("abstract: {}", doc.text);
        println!("-----------------------");
    }

    println!("\nfirst index terms:\n");
    let mut terms: Vec<&str> = collection.index().terms().map(|(t, _)| t).collect();
    terms.sort_unstable();
    for term in terms.into_iter().take(3) {
        println!("term: {term}");
        println!("documents: {:?}", collection.index().get_document_list(term));
        println!("-----------------------");
    }

    println!("\nmost frequent terms:\n");
    for (term, count) in collection.top_terms(5) {
        println!("{term}: {count}");
    }
    Ok(())
}

fn run_query(collection: &Collection, query: &str, json: bool) -> Result<()> {
    let start = Instant::now();
    let outcome = collection.process_query_with(query, &mut BestCandidate)?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome, elapsed_ms);
    }
    Ok(())
}

fn print_outcome(outcome: &QueryOutcome, elapsed_ms: f64) {
    for c in &outcome.corrections {
        println!("corrected '{}' to '{}'", c.from, c.to);
    }
    if !outcome.corrections.is_empty() {
        println!("query: {}", outcome.query);
    }
    println!("{} documents: {:?}", outcome.doc_ids.len(), outcome.doc_ids);
    println!("evaluated in {elapsed_ms:.2} ms");
}

/// Lets the user pick a correction by its 1-based number.
struct PromptSelector;

impl CorrectionSelector for PromptSelector {
    fn select(&mut self, corrections: &[Correction]) -> Option<usize> {
        let first = corrections.first()?;
        for (i, c) in corrections.iter().enumerate() {
            println!("{}. {c}", i + 1);
        }
        print!("choose 1-{} (enter keeps '{}'): ", corrections.len(), first.original);
        io::stdout().flush().ok()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line).ok()?;
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=corrections.len()).contains(&n) => Some(n - 1),
            _ => None,
        }
    }
}

fn repl(collection: &Collection) -> Result<()> {
    let stdin = io::stdin();
    loop {
        print!("\nquery> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&query) {
            return Ok(());
        }

        let start = Instant::now();
        match collection.process_query_with(query, &mut PromptSelector) {
            Ok(outcome) => print_outcome(&outcome, start.elapsed().as_secs_f64() * 1e3),
            Err(err) => eprintln!("invalid query: {err}"),
        }
    }
}
