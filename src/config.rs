use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::{Result, ViewerError};
/// Public bucket of the SpikeInterface template database.
pub const DEFAULT_BASE_URL: &str =
    "https://spikeinterface-template-database.s3.us-east-2.amazonaws.com/test_templates";
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub base_url: String,
    /// Name of the 3D (template x sample x channel) array in the root group.
    pub templates_array: String,
    pub probe_group: String,
    pub probe_x: String,
    pub probe_y: String,
    /// Channels whose peak-to-peak reaches this fraction of the best channel are active.
    pub threshold_ratio: f64,
    pub fetch_timeout_secs: f64,
    pub max_concurrent_fetches: usize,
}
impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            templates_array: "templates_array".to_string(),
            probe_group: "probe".to_string(),
            probe_x: "x".to_string(),
            probe_y: "y".to_string(),
            threshold_ratio: 0.10,
            fetch_timeout_secs: 30.0,
            max_concurrent_fetches: 16,
        }
    }
}
impl ViewerConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ViewerError::InvalidInput(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: ViewerConfig = serde_json::from_str(&text)
            .map_err(|e| ViewerError::InvalidInput(format!("bad config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<()> {
        if !self.threshold_ratio.is_finite() || self.threshold_ratio < 0.0 {
            return Err(ViewerError::InvalidInput(format!(
                "threshold_ratio must be a non-negative number, got {}",
                self.threshold_ratio
            )));
        }
        if !(self.fetch_timeout_secs > 0.0) || !self.fetch_timeout_secs.is_finite() {
            return Err(ViewerError::InvalidInput(
                "fetch_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(ViewerError::InvalidInput(
                "max_concurrent_fetches must be at least 1".into(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(ViewerError::InvalidInput("base_url is empty".into()));
        }
        Ok(())
    }
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.fetch_timeout_secs)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn defaults_match_the_public_database() {
        let config = ViewerConfig::default();
        assert_eq!(config.threshold_ratio, 0.10);
        assert_eq!(config.templates_array, "templates_array");
        assert!(config.validate().is_ok());
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
    }
    #[test]
    fn partial_json_keeps_defaults() {
        let config: ViewerConfig = serde_json::from_str(r#"{"threshold_ratio": 0.5}"#).unwrap();
        assert_eq!(config.threshold_ratio, 0.5);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
    #[test]
    fn rejects_bad_values() {
        let mut config = ViewerConfig {
            threshold_ratio: f64::NAN,
            ..ViewerConfig::default()
        };
        assert!(config.validate().is_err());
        config.threshold_ratio = 0.1;
        config.fetch_timeout_secs = 0.0;
        assert!(config.validate().is_err());
        config.fetch_timeout_secs = 1.0;
        config.max_concurrent_fetches = 0;
        assert!(config.validate().is_err());
    }
}
