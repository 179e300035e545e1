//! Recognize command - identify the plate and owner in a single image.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use platewatch_core::{PlateRecognizer, RecognitionResult};

use super::{load_config, load_engine, open_registry};

/// Arguments for the recognize command.
#[derive(Args)]
pub struct RecognizeArgs {
    /// Input image
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Registry snapshot file
    #[arg(long)]
    registry: Option<PathBuf>,

    /// OCR timeout in milliseconds (default from config)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: RecognizeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Recognizing plate in {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Loading registry...");
    let registry = Arc::new(open_registry(&config, args.registry.as_deref())?);

    pb.set_message("Loading OCR models...");
    let engine = load_engine(&config, args.model_dir.as_deref())?;
    let recognizer = PlateRecognizer::from_config(engine, registry, &config);

    pb.set_message("Running OCR...");
    let bytes = fs::read(&args.input)?;
    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.ocr.timeout());
    let result = recognizer.recognize_with_timeout(&bytes, timeout).await;

    pb.finish_and_clear();
    let result = result?;

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if result.is_degraded() {
        eprintln!(
            "{} No plate-shaped text found; {:?} is a low-confidence guess.",
            style("⚠").yellow(),
            result.candidate.raw_text
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_result(result: &RecognitionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &RecognitionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "plate",
        "raw_text",
        "score",
        "degraded",
        "registered",
        "owner",
        "status",
        "make",
        "model",
        "color",
    ])?;

    let (registered, owner, status, make, model, color) = match &result.matched {
        Some(m) => (
            "yes",
            m.owner.name.as_str(),
            m.owner.status.to_string(),
            m.vehicle.make.as_str(),
            m.vehicle.model.as_str(),
            m.vehicle.color.as_str(),
        ),
        None => ("no", "", String::new(), "", "", ""),
    };

    let score = format!("{:.3}", result.candidate.score);
    wtr.write_record([
        result.plate(),
        result.candidate.raw_text.as_str(),
        score.as_str(),
        if result.is_degraded() { "yes" } else { "no" },
        registered,
        owner,
        status.as_str(),
        make,
        model,
        color,
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &RecognitionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Plate: {} (read as {:?}, score {:.1}%)\n",
        result.plate(),
        result.candidate.raw_text,
        result.candidate.score * 100.0
    ));
    if result.is_degraded() {
        output.push_str("Confidence: LOW (no plate-shaped text found)\n");
    }
    output.push('\n');

    match &result.matched {
        Some(m) => {
            output.push_str("Vehicle:\n");
            output.push_str(&format!(
                "  {} {} ({})\n",
                m.vehicle.make, m.vehicle.model, m.vehicle.color
            ));
            output.push_str("\nOwner:\n");
            output.push_str(&format!("  {}\n", m.owner.name));
            output.push_str(&format!("  Control number: {}\n", m.owner.control_number));
            output.push_str(&format!(
                "  Status: {} ({} incident(s))\n",
                m.owner.status, m.owner.incident_count
            ));
        }
        None => output.push_str("Not registered\n"),
    }

    output
}
