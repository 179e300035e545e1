//! Subcommands and the setup they share.

pub mod batch;
pub mod config;
pub mod incident;
pub mod recognize;
pub mod registry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use platewatch_core::{
    LogNotifier, Notifier, OutboxNotifier, PlatewatchConfig, PureOcrEngine, Registry,
    TextExtractor,
};

/// Default location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("platewatch")
        .join("config.json")
}

/// Load configuration from `--config`, else the user config file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PlatewatchConfig> {
    if let Some(path) = config_path {
        return Ok(PlatewatchConfig::from_file(Path::new(path))?);
    }

    let user_config = default_config_path();
    if user_config.exists() {
        debug!("Using config {}", user_config.display());
        Ok(PlatewatchConfig::from_file(&user_config)?)
    } else {
        Ok(PlatewatchConfig::default())
    }
}

/// Open the registry snapshot, preferring an explicit path over the configured one.
pub fn open_registry(
    config: &PlatewatchConfig,
    registry_path: Option<&Path>,
) -> anyhow::Result<Registry> {
    let path = registry_path.unwrap_or(&config.registry.path);
    debug!("Opening registry {}", path.display());
    Ok(Registry::open(path)?)
}

/// Load the OCR engine, preferring an explicit model directory over the configured one.
pub fn load_engine(
    config: &PlatewatchConfig,
    model_dir: Option<&Path>,
) -> anyhow::Result<Arc<dyn TextExtractor>> {
    let mut ocr = config.ocr.clone();
    if let Some(dir) = model_dir {
        ocr.model_dir = dir.to_path_buf();
    }

    let engine = PureOcrEngine::from_config(&ocr).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load OCR models from {}: {}\n\n\
             Place {}, {} and {} there or pass --model-dir.",
            ocr.model_dir.display(),
            e,
            ocr.detection_model,
            ocr.recognition_model,
            ocr.dictionary
        )
    })?;

    Ok(Arc::new(engine))
}

/// The notifier selected by configuration.
pub fn notifier(config: &PlatewatchConfig) -> Box<dyn Notifier> {
    match &config.notify.outbox {
        Some(path) => Box::new(OutboxNotifier::new(path.clone())),
        None => Box::new(LogNotifier),
    }
}
