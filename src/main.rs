// src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use dedupe_lib::consolidation::RecordMerger;
use dedupe_lib::models::core::{CounterpartyRecord, RecordId};
use dedupe_lib::models::similarity::SimilarityWeights;
use dedupe_lib::similarity::SimilarityService;
use dedupe_lib::store::{InMemoryRecordStore, PgRecordStore, RecordStore};
use dedupe_lib::utils::config::ResolutionConfig;
use dedupe_lib::utils::db_connect::{connect, get_pool_status};
use dedupe_lib::utils::env::load_env;

#[derive(Parser)]
#[command(author, version, about = "Counterparty duplicate detection and merging", long_about = None)]
struct Cli {
    /// Run against records loaded from a JSON array instead of PostgreSQL.
    /// Changes are not persisted.
    #[arg(long, global = true)]
    records: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hybrid similarity of two names, with the per-metric breakdown
    Score {
        first: String,
        second: String,
        /// jaro_winkler,lcs,phonetic,ngram,jaccard
        #[arg(long)]
        weights: Option<String>,
    },
    /// List the TaxID/BIN duplicate groups of a project
    Duplicates {
        #[arg(long)]
        project: i64,
    },
    /// Merge a duplicate group into its highest-quality record
    Resolve {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        key: String,
    },
    /// Merge records into a master record
    Merge {
        #[arg(long)]
        master: RecordId,
        #[arg(long, value_delimiter = ',', required = true)]
        absorb: Vec<RecordId>,
    },
    /// Delete every record of a duplicate group
    DeleteGroup {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        key: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}

fn load_records(path: &Path) -> Result<InMemoryRecordStore> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    let records: Vec<CounterpartyRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse records in {}", path.display()))?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(InMemoryRecordStore::with_records(records))
}

fn run_score(
    config: &ResolutionConfig,
    first: &str,
    second: &str,
    weights: Option<&str>,
) -> Result<()> {
    let service = SimilarityService::from_config(config)?;
    let weights = weights.map(SimilarityWeights::parse_list).transpose()?;
    let result = service.score(first, second, weights.as_ref())?;
    print_json(&result)
}

async fn run_store_command<S: RecordStore>(
    store: &S,
    config: &ResolutionConfig,
    command: Command,
) -> Result<()> {
    let merger = RecordMerger::from_config(store, config);
    match command {
        Command::Duplicates { project } => {
            let groups = merger.find_duplicate_groups(project).await?;
            info!("Project {} has {} duplicate groups", project, groups.len());
            print_json(&groups)
        }
        Command::Resolve { project, key } => {
            let outcome = merger.resolve_group(project, &key).await?;
            print_json(&outcome)
        }
        Command::Merge { master, absorb } => {
            let outcome = merger.merge(master, &absorb).await?;
            print_json(&outcome)
        }
        Command::DeleteGroup { project, key } => {
            let outcome = merger.delete_duplicate_group(project, &key).await?;
            print_json(&outcome)
        }
        Command::Score {
            first,
            second,
            weights,
        } => run_score(config, &first, &second, weights.as_deref()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let start_time = Instant::now();

    let cli = Cli::parse();
    let config = ResolutionConfig::from_env();
    config.log_config();

    match cli.command {
        Command::Score {
            first,
            second,
            weights,
        } => run_score(&config, &first, &second, weights.as_deref())?,
        command => match &cli.records {
            Some(path) => {
                let store = load_records(path)?;
                run_store_command(&store, &config, command).await?;
            }
            None => {
                let pool = connect().await.context("Failed to connect to database")?;
                let store = PgRecordStore::new(pool.clone());
                run_store_command(&store, &config, command).await?;
                let (connections, idle) = get_pool_status(&pool);
                info!("Pool status: {} connections, {} idle", connections, idle);
            }
        },
    }

    info!("Finished in {:.2?}", start_time.elapsed());
    Ok(())
}
