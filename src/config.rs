//! Viewer settings, loaded from a JSON file. Missing fields fall back to
//! their defaults.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{cine::DEFAULT_PERIOD, enums::SortBy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Cine frame period in milliseconds. Defaults to the viewer's fixed
    /// 100 ms frame rate; other values only exist for headless runs and tests.
    pub cine_period_ms: u64,
    /// Fraction by which one scroll step shrinks or grows the view.
    pub zoom_step: f64,
    /// Directory for exports that come without an explicit path.
    pub export_dir: PathBuf,
    pub export_extension: String,
    /// Slice ordering for DICOM series.
    pub sort_by: SortBy,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cine_period_ms: DEFAULT_PERIOD.as_millis() as u64,
            zoom_step: 0.1,
            export_dir: PathBuf::from("."),
            export_extension: "png".to_owned(),
            sort_by: SortBy::default(),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cine_period_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "cine_period_ms",
                message: "must be positive".to_owned(),
            });
        }
        if !(self.zoom_step > 0.0 && self.zoom_step < 1.0) {
            return Err(ConfigError::Invalid {
                field: "zoom_step",
                message: format!("{} is outside (0, 1)", self.zoom_step),
            });
        }
        if self.export_extension.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "export_extension",
                message: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }

    pub fn cine_period(&self) -> Duration {
        Duration::from_millis(self.cine_period_ms)
    }

    /// Default export location for a slice titled `title`.
    pub fn export_path(&self, title: &str) -> PathBuf {
        self.export_dir
            .join(format!("{title}.{}", self.export_extension.trim_start_matches('.')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = ViewerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.cine_period(), DEFAULT_PERIOD);
        assert_eq!(config.cine_period(), Duration::from_millis(100));
        assert_eq!(config.zoom_step, 0.1);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("viewer.json");
        fs::write(&path, r#"{ "cine_period_ms": 40, "sort_by": "instance_number" }"#).unwrap();

        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config.cine_period_ms, 40);
        assert_eq!(config.sort_by, SortBy::InstanceNumber);
        assert_eq!(config.zoom_step, 0.1);
        assert_eq!(config.export_extension, "png");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("viewer.json");
        fs::write(&path, r#"{ "zoom_step": 1.5 }"#).unwrap();
        let err = ViewerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "zoom_step", .. }));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ViewerConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn export_path_joins_title_and_extension() {
        let config = ViewerConfig {
            export_dir: PathBuf::from("out"),
            export_extension: ".jpg".to_owned(),
            ..ViewerConfig::default()
        };
        assert_eq!(config.export_path("Coronal_Slice_3"), PathBuf::from("out/Coronal_Slice_3.jpg"));
    }
}
