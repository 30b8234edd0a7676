//! VecRAG CLI - Command-line interface
//!
//! Usage:
//!   vecrag ingest <text>... [--file <path>]
//!   vecrag seed
//!   vecrag query <question> [--limit N] [--min-score S]
//!   vecrag ask <question> [--limit N] [--min-score S]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use vecrag_core::{AppConfig, Document, LoggingConfig};
use vecrag_rag::{
    corpus, create_chat_client, OrchestratorConfig, RagPipeline, RetrievalOrchestrator,
};
use vecrag_vector::{
    create_embedding_provider, InMemoryVectorStore, ModelRegistry, QdrantStore, VectorStore,
};

#[derive(Parser)]
#[command(name = "vecrag")]
#[command(about = "Vector storage and retrieval for RAG")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(long, global = true, env = "VECRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Use a process-local store seeded with the demo corpus instead of Qdrant
    #[arg(long, global = true)]
    in_memory: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest texts into the collection
    Ingest {
        /// Texts to ingest, one document each
        texts: Vec<String>,

        /// File with one document per non-empty line
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Ingest the demo cloud service corpus
    Seed,
    /// Search the collection
    Query {
        /// Query text
        question: String,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        min_score: Option<f32>,
    },
    /// Answer a question from retrieved context
    Ask {
        /// Question to ask
        question: String,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        min_score: Option<f32>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let level = &logging.level;
    let default_filter = format!(
        "vecrag={level},vecrag_core={level},vecrag_vector={level},vecrag_rag={level}"
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_documents(texts: Vec<String>, file: Option<&PathBuf>) -> anyhow::Result<Vec<Document>> {
    let mut lines = texts;
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        lines.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }

    Ok(lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| Document::new(format!("cli-{i}"), text))
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging);

    let registry = Arc::new(ModelRegistry::new());
    let embedder = create_embedding_provider(&config.embedding, registry, None)?;

    let store: Arc<dyn VectorStore> = if cli.in_memory {
        Arc::new(InMemoryVectorStore::new().with_auxiliary_field(&config.store.auxiliary_field))
    } else {
        Arc::new(QdrantStore::new(&config.store)?)
    };
    tracing::info!(
        embedder = embedder.name(),
        store = store.name(),
        collection = %config.store.collection,
        "VecRAG starting"
    );

    let orchestrator = Arc::new(RetrievalOrchestrator::new(
        embedder,
        store,
        OrchestratorConfig::from_app_config(&config),
    ));

    if cli.in_memory && !matches!(cli.command, Commands::Seed) {
        orchestrator.ingest_batch(&corpus::documents()).await?;
    }

    let top_k = config.retrieval.top_k;
    let default_min = config.retrieval.min_score;

    match cli.command {
        Commands::Ingest { texts, file } => {
            let documents = read_documents(texts, file.as_ref())?;
            if documents.is_empty() {
                anyhow::bail!("Nothing to ingest; pass texts or --file");
            }
            let ids = orchestrator.ingest_batch(&documents).await?;
            for (doc, id) in documents.iter().zip(&ids) {
                println!("{id}\t{}", doc.text);
            }
        }
        Commands::Seed => {
            let documents = corpus::documents();
            let ids = orchestrator.ingest_batch(&documents).await?;
            println!("Seeded {} documents", ids.len());
        }
        Commands::Query {
            question,
            limit,
            min_score,
        } => {
            let results = orchestrator
                .query(&question, limit.unwrap_or(top_k), min_score.or(default_min))
                .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No results");
            } else {
                for (i, r) in results.iter().enumerate() {
                    println!(
                        "[#{}] {} {:.4} ({}) {}",
                        i + 1,
                        r.id,
                        r.score,
                        r.auxiliary,
                        r.text
                    );
                }
            }
        }
        Commands::Ask {
            question,
            limit,
            min_score,
        } => {
            let chat = create_chat_client(&config.chat)?;
            let pipeline = RagPipeline::new(orchestrator, chat);
            let answer = pipeline
                .ask(&question, limit.unwrap_or(top_k), min_score.or(default_min))
                .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", answer.content);
                for c in &answer.citations {
                    println!("  [#{}] {} {:.4}", c.rank, c.id, c.score);
                }
            }
        }
    }

    Ok(())
}
