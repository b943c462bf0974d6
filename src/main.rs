use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docflow::{
    batch::{BatchConfig, BatchCoordinator, JobStatus},
    chunking::Chunker,
    config::{self, Config},
    embedding::get_embedding_client,
    logging,
    pipeline::IndexingPipeline,
    processor::{DocumentInput, get_document_processor},
};
use serde::Serialize;
use uuid::Uuid;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "docflow",
    about = "Chunk documents and process them in concurrent batches"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the chunks of one text file as JSON.
    Chunk {
        file: PathBuf,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        overlap: Option<usize>,
        /// Treat the whole document as one section.
        #[arg(long)]
        no_headings: bool,
        /// Do not append chunk boundary markers.
        #[arg(long)]
        no_markers: bool,
    },
    /// Process files and directories as one batch job and print a report.
    Batch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long)]
        max_workers: Option<usize>,
        #[arg(long)]
        fail_fast: bool,
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Chunk, de-duplicate, and embed every successful file.
        #[arg(long)]
        index: bool,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded.
async fn run() -> Result<bool> {
    let cli = Cli::parse();
    let config = config::init_config()?;
    logging::init_tracing().context("failed to initialize logging")?;

    match cli.command {
        Command::Chunk {
            file,
            chunk_size,
            overlap,
            no_headings,
            no_markers,
        } => {
            let mut options = config.chunking.clone();
            if let Some(size) = chunk_size {
                options.chunk_size = size;
            }
            if let Some(overlap) = overlap {
                options.chunk_overlap = overlap;
            }
            options.respect_headings &= !no_headings;
            options.add_chunk_markers &= !no_markers;

            let chunker = Chunker::new(options)?;
            let text = get_document_processor()
                .process(&DocumentInput::path(file))
                .await?;
            print_json(&chunker.chunk_document(&text))?;
            Ok(true)
        }
        Command::Batch {
            paths,
            max_workers,
            fail_fast,
            timeout_secs,
            index,
        } => {
            let mut options = config.batch.clone();
            if let Some(workers) = max_workers {
                anyhow::ensure!(workers > 0, "--max-workers must be at least 1");
                options.max_workers = workers;
            }
            options.fail_fast |= fail_fast;
            if let Some(secs) = timeout_secs {
                options.timeout_per_file = Duration::from_secs(secs);
            }
            run_batch(config, options, expand_paths(&paths)?, index).await
        }
    }
}

async fn run_batch(
    config: &Config,
    options: BatchConfig,
    inputs: Vec<DocumentInput>,
    index: bool,
) -> Result<bool> {
    let coordinator = BatchCoordinator::new(Arc::from(get_document_processor()), options);
    let job_id = coordinator.submit(inputs);
    let outcome = coordinator.get_result(job_id, true).await;
    let job = coordinator.get_status(job_id)?;

    let documents = match outcome {
        Ok(results) if index => {
            let pipeline = IndexingPipeline::new(
                config.chunking.clone(),
                get_embedding_client(config.embedding_dimension),
            )?;
            pipeline.prepare_outcomes(&results).await?
        }
        _ => Vec::new(),
    };

    let mut prepared = documents.iter();
    let files = job
        .results
        .iter()
        .flatten()
        .map(|outcome| {
            let document = if index { prepared.next() } else { None };
            FileReport {
                file: &outcome.file,
                characters: outcome.content.chars().count(),
                chunks: document.map(|d| d.chunks.len()),
                skipped_duplicates: document.map(|d| d.skipped_duplicates),
            }
        })
        .collect();

    print_json(&BatchReport {
        job_id: job.job_id,
        status: job.status,
        total_files: job.total_files,
        processed_files: job.processed_files,
        failed_files: job.failed_files,
        errors: &job.errors,
        files,
    })?;
    Ok(job.status == JobStatus::Completed)
}

/// Expand directories recursively; files inside a directory are taken in name order.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<DocumentInput>> {
    let mut inputs = Vec::new();
    for path in paths {
        if !path.is_dir() {
            inputs.push(DocumentInput::path(path.clone()));
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
            if entry.file_type().is_file() {
                inputs.push(DocumentInput::path(entry.into_path()));
            }
        }
    }
    Ok(inputs)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

#[derive(Serialize)]
struct BatchReport<'a> {
    job_id: Uuid,
    status: JobStatus,
    total_files: usize,
    processed_files: usize,
    failed_files: usize,
    errors: &'a BTreeMap<String, String>,
    files: Vec<FileReport<'a>>,
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a str,
    characters: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped_duplicates: Option<usize>,
}
