use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ANALYTIQ_CONFIG";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "analytiq.json";

/// Startup settings. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
    /// Rows shown in the data preview.
    pub preview_rows: usize,
    /// Uploads above this many bytes are refused before parsing.
    pub max_file_size: usize,
    pub table_row_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_size: [1200.0, 800.0],
            min_window_size: [600.0, 400.0],
            preview_rows: 5,
            max_file_size: 50 * 1024 * 1024, // 50 MiB
            table_row_height: 18.0,
        }
    }
}

impl AppConfig {
    /// Resolve the config file (`$ANALYTIQ_CONFIG`, then `./analytiq.json`)
    /// and load it; no file means defaults.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.is_file().then_some(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "preview_rows": 12, "max_file_size": 1024 }}"#).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.preview_rows, 12);
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.window_size, AppConfig::default().window_size);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "preview_rows = 3").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("parsing config file"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::from_file(&dir.path().join("nope.json")).is_err());
    }
}
