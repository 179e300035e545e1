//! CLI application for license plate recognition and incident tracking.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, incident, recognize, registry};

/// Plate watch - identify vehicles from plate photos and track incidents
#[derive(Parser)]
#[command(name = "platewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize the plate in a single image
    Recognize(recognize::RecognizeArgs),

    /// Recognize plates in multiple images
    Batch(batch::BatchArgs),

    /// Manage people and vehicles
    Registry(registry::RegistryArgs),

    /// Report, record and review incidents
    Incident(incident::IncidentArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Recognize(args) => recognize::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Registry(args) => registry::run(args, config_path),
        Commands::Incident(args) => incident::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
