use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use docfeed::{
    Client, DocumentType, IngestOptions, TaskInfo, config::Config, documents::DocumentError,
    logging,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "docfeed",
    about = "Push JSON, NDJSON, and CSV documents into a search engine index"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a file or every matching file of a directory.
    Ingest {
        /// File or directory to ingest.
        path: PathBuf,
        #[arg(long)]
        index: String,
        /// Upsert instead of add.
        #[arg(long)]
        update: bool,
        /// Split documents into batches of this size. Defaults to `DOCFEED_BATCH_SIZE`.
        #[arg(long)]
        batch_size: Option<usize>,
        /// Send each file or collection in a single request.
        #[arg(long, conflicts_with = "batch_size")]
        no_batch: bool,
        #[arg(long)]
        primary_key: Option<String>,
        #[arg(long, value_parser = parse_document_type)]
        document_type: Option<DocumentType>,
        #[arg(long)]
        csv_delimiter: Option<String>,
        /// Stream the file undecoded and let the engine parse it.
        #[arg(long, conflicts_with_all = ["batch_size", "no_batch"])]
        raw: bool,
        /// Submit each file of a directory on its own instead of merging them.
        #[arg(long)]
        separate_files: bool,
        /// Wait for every task to finish before exiting.
        #[arg(long)]
        wait: bool,
    },
    /// Print index statistics.
    Stats {
        #[arg(long)]
        index: String,
    },
    /// Wait for tasks to finish and print their final state.
    Wait {
        #[arg(required = true)]
        task_uids: Vec<u64>,
    },
}

fn parse_document_type(value: &str) -> Result<DocumentType, String> {
    value.parse().map_err(|err: DocumentError| err.to_string())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing();
    let config = Config::load().context("failed to load configuration")?;
    let client = Client::new(&config).context("failed to build search engine client")?;

    match cli.command {
        Command::Ingest {
            path,
            index,
            update,
            batch_size,
            no_batch,
            primary_key,
            document_type,
            csv_delimiter,
            raw,
            separate_files,
            wait,
        } => {
            check_flags(path.is_dir(), raw, separate_files)?;
            let default_size = client.default_batch_size();
            let batch_size = effective_batch_size(batch_size, no_batch, default_size);
            let options = IngestOptions {
                primary_key,
                document_type,
                csv_delimiter,
                combine_documents: !separate_files,
            };
            let tasks = ingest(&client, &index, &path, update, batch_size, raw, &options).await?;
            for task in &tasks {
                println!("{}", serde_json::to_string(task)?);
            }
            if wait {
                for task in client.wait_for_tasks(&tasks).await? {
                    println!("{}", serde_json::to_string(&task)?);
                }
            }
        }
        Command::Stats { index } => {
            let stats = client
                .index(index.as_str())
                .get_stats()
                .await
                .with_context(|| format!("failed to fetch stats for index {index}"))?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Wait { task_uids } => {
            for task_uid in task_uids {
                let task = client
                    .wait_for_task(task_uid)
                    .await
                    .with_context(|| format!("failed waiting for task {task_uid}"))?;
                println!("{}", serde_json::to_string(&task)?);
            }
        }
    }

    tracing::debug!(metrics = ?client.metrics(), "Ingestion counters");
    Ok(())
}

/// Reject flags that have no meaning for the kind of path being ingested.
fn check_flags(is_dir: bool, raw: bool, separate_files: bool) -> Result<()> {
    if is_dir && raw {
        bail!("--raw streams a single file and cannot be used with a directory");
    }
    if !is_dir && separate_files {
        bail!("--separate-files only applies when ingesting a directory");
    }
    Ok(())
}

/// Batch with the explicit size, else the configured default, unless batching is switched off.
fn effective_batch_size(requested: Option<usize>, no_batch: bool, default: usize) -> Option<usize> {
    if no_batch {
        None
    } else {
        Some(requested.unwrap_or(default))
    }
}

async fn ingest(
    client: &Client,
    index: &str,
    path: &Path,
    update: bool,
    batch_size: Option<usize>,
    raw: bool,
    options: &IngestOptions,
) -> Result<Vec<TaskInfo>> {
    let index = client.index(index);
    let tasks = if path.is_dir() {
        match (update, batch_size) {
            (false, None) => index.add_documents_from_directory(path, options).await?,
            (false, Some(size)) => {
                index
                    .add_documents_from_directory_in_batches(path, size, options)
                    .await?
            }
            (true, None) => index.update_documents_from_directory(path, options).await?,
            (true, Some(size)) => {
                index
                    .update_documents_from_directory_in_batches(path, size, options)
                    .await?
            }
        }
    } else if raw {
        let task = if update {
            index.update_documents_from_raw_file(path, options).await?
        } else {
            index.add_documents_from_raw_file(path, options).await?
        };
        vec![task]
    } else {
        match (update, batch_size) {
            (false, None) => vec![index.add_documents_from_file(path, options).await?],
            (false, Some(size)) => {
                index
                    .add_documents_from_file_in_batches(path, size, options)
                    .await?
            }
            (true, None) => vec![index.update_documents_from_file(path, options).await?],
            (true, Some(size)) => {
                index
                    .update_documents_from_file_in_batches(path, size, options)
                    .await?
            }
        }
    };
    Ok(tasks)
}
