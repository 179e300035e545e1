//! Configuration structures for the platewatch pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for platewatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatewatchConfig {
    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Plate candidate rules.
    pub plate: PlateConfig,

    /// Incident escalation policy.
    pub escalation: EscalationConfig,

    /// Registry storage.
    pub registry: RegistryConfig,

    /// Notification delivery.
    pub notify: NotifyConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Upper bound for a single OCR call, in milliseconds.
    pub timeout_ms: u64,

    /// Keep `[UNK]` markers emitted by the recognizer instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            timeout_ms: 10_000,
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Shape rules for plate-shaped candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateConfig {
    /// Minimum normalized length (inclusive).
    pub min_len: usize,

    /// Maximum normalized length (inclusive).
    pub max_len: usize,
}

impl Default for PlateConfig {
    fn default() -> Self {
        Self {
            min_len: 5,
            max_len: 10,
        }
    }
}

/// Incident escalation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Approved incidents after which a person is blocked.
    pub block_threshold: u32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self { block_threshold: 3 }
    }
}

/// Registry storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// JSON snapshot file.
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("registry.json"),
        }
    }
}

/// Notification delivery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Append rendered notifications to this JSON-lines file. Logged only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbox: Option<PathBuf>,
}

impl PlatewatchConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.ocr.model_dir.join(model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PlatewatchConfig =
            serde_json::from_str(r#"{"escalation": {"block_threshold": 5}}"#).unwrap();
        assert_eq!(config.escalation.block_threshold, 5);
        assert_eq!(config.plate.min_len, 5);
        assert_eq!(config.plate.max_len, 10);
        assert_eq!(config.ocr.timeout(), Duration::from_secs(10));
        assert!(config.notify.outbox.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = PlatewatchConfig::default();
        config.ocr.timeout_ms = 250;
        config.save(&path).unwrap();

        let loaded = PlatewatchConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.timeout_ms, 250);
        assert_eq!(loaded.model_path("det.onnx"), PathBuf::from("models/det.onnx"));
    }
}
