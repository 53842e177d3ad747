use std::env;
use std::path::PathBuf;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use recall_core::config::{expand_path, Config};
use recall_core::data_processor::DataProcessor;
use recall_embed::get_default_embedder;
use recall_hybrid::{compose_answer, RetrievalEngine};

const USAGE: &str = "Usage: recall [--data <path>] <query <text> [top_k] | ask <text> | list>";

struct Args {
    data: Option<PathBuf>,
    cmd: String,
    rest: Vec<String>,
}

fn parse_args() -> Args {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut data = None;
    if args.first().map(String::as_str) == Some("--data") {
        if args.len() < 2 { eprintln!("{USAGE}"); std::process::exit(1); }
        data = Some(expand_path(args.remove(1)));
        args.remove(0);
    }
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    Args { data, cmd, rest: args }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args = parse_args();

    let data_path = match args.data {
        Some(p) => p,
        None => config.data()?.knowledge_file(&env::current_dir()?),
    };
    let docs = DataProcessor::new()
        .load(&data_path)
        .with_context(|| format!("loading knowledge base from {}", data_path.display()))?;

    let embedder = get_default_embedder(&config.embedding()?)?;
    let engine = RetrievalEngine::new(embedder, config.retrieval()?)?;
    let added = engine.upsert_many(docs).await?;
    info!(documents = added, "knowledge base indexed");

    match args.cmd.as_str() {
        "query" => {
            let query = args.rest.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: recall query \"<text>\" [top_k]"); std::process::exit(1)
            });
            let top_k = match args.rest.get(1) {
                Some(k) => k.parse::<usize>().with_context(|| format!("top_k must be a number, got {k:?}"))?,
                None => engine.config().default_top_k,
            };
            let results = engine.retrieve(&query, top_k).await;
            if results.is_empty() { println!("No results."); }
            for (rank, r) in results.iter().enumerate() {
                let tags = if r.tags.is_empty() { String::new() } else { format!(" [{}]", r.tags.join(", ")) };
                println!("{:>2}. {} ({:.3}){}\n    {}", rank + 1, r.id, r.score.value(), tags, r.text);
            }
        }
        "ask" => {
            let query = args.rest.join(" ");
            if query.trim().is_empty() { eprintln!("Usage: recall ask \"<question>\""); std::process::exit(1); }
            let results = engine.retrieve_default(&query).await;
            println!("{}", compose_answer(&results));
        }
        "list" => {
            for doc in engine.documents() {
                println!("{}\t{}", doc.id, doc.text);
            }
        }
        other => { eprintln!("Unknown command: {}\n{}", other, USAGE); std::process::exit(1); }
    }
    Ok(())
}
