//! Batch recognition command for multiple images.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::{stream, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use platewatch_core::{PlateRecognizer, RecognitionResult};

use super::recognize::{format_result, OutputFormat};
use super::{load_config, load_engine, open_registry};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of images recognized concurrently
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Registry snapshot file
    #[arg(long)]
    registry: Option<PathBuf>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<RecognitionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(
                ext.to_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "webp" | "tiff" | "tif" | "bmp"
            )
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching images found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} images to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let registry = Arc::new(open_registry(&config, args.registry.as_deref())?);
    let engine = load_engine(&config, args.model_dir.as_deref())?;
    let recognizer = PlateRecognizer::from_config(engine, registry, &config);

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images")?
            .progress_chars("=>-"),
    );

    let mut pending = stream::iter(files)
        .map(|path| {
            let recognizer = &recognizer;
            async move {
                let file_start = Instant::now();
                let outcome = match fs::read(&path) {
                    Ok(bytes) => recognizer.recognize(&bytes).await.map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                (path, outcome, file_start.elapsed().as_millis() as u64)
            }
        })
        .buffer_unordered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some((path, outcome, processing_time_ms)) = pending.next().await {
        overall_pb.inc(1);

        match outcome {
            Ok(result) => results.push(ProcessResult {
                path,
                result: Some(result),
                error: None,
                processing_time_ms,
            }),
            Err(error_msg) if args.continue_on_error => {
                warn!("Failed to process {}: {}", path.display(), error_msg);
                results.push(ProcessResult {
                    path,
                    result: None,
                    error: Some(error_msg),
                    processing_time_ms,
                });
            }
            Err(error_msg) => {
                error!("Failed to process {}: {}", path.display(), error_msg);
                overall_pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
            }
        }
    }

    overall_pb.finish_with_message("Complete");
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let successful: Vec<_> = results.iter().filter(|r| r.result.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for entry in &successful {
            if let Some(result) = &entry.result {
                let output_name = entry
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("image");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_result(result, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} images in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} recognized ({} registered), {} failed",
        style(successful.len()).green(),
        successful
            .iter()
            .filter(|r| r.result.as_ref().is_some_and(|res| res.matched.is_some()))
            .count(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed images:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "plate",
        "score",
        "degraded",
        "registered",
        "owner",
        "owner_status",
        "processing_time_ms",
        "error",
    ])?;

    for entry in results {
        let filename = entry
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time_ms = entry.processing_time_ms.to_string();

        if let Some(result) = &entry.result {
            let score = format!("{:.3}", result.candidate.score);
            let (registered, owner, owner_status) = match &result.matched {
                Some(m) => ("yes", m.owner.name.clone(), m.owner.status.to_string()),
                None => ("no", String::new(), String::new()),
            };

            wtr.write_record([
                filename,
                "success",
                result.plate(),
                score.as_str(),
                if result.is_degraded() { "yes" } else { "no" },
                registered,
                owner.as_str(),
                owner_status.as_str(),
                time_ms.as_str(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                time_ms.as_str(),
                entry.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
