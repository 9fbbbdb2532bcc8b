use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::errors::HunterError;

pub const DEFAULT_PLACEHOLDER: &str = "xss<>";

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".svg", ".json", ".css", ".js", ".webp", ".woff",
    ".woff2", ".eot", ".ttf", ".otf", ".mp4", ".txt",
];

pub const CDX_TEXT_ENDPOINT: &str =
    "https://web.archive.org/cdx/search/cdx?url={domain}/*&output=txt&collapse=urlkey&fl=original&page=/";
pub const CDX_JSON_ENDPOINT: &str =
    "https://web.archive.org/cdx/search/cdx?url={domain}/*&output=json&fl=original&collapse=urlkey";

/// Run configuration. Every field has a default so a config file may set any subset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HunterConfig {
    pub threads: usize,
    pub placeholder: String,
    pub timeout_secs: u64,
    pub output: String,
    pub proxy: Option<String>,
    pub extensions: Vec<String>,
    pub progress_interval_ms: u64,
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// URL templates; `{domain}` is replaced with the target domain.
    pub endpoints: Vec<String>,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            threads: 10,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            timeout_secs: 20,
            output: "xss".to_string(),
            proxy: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            progress_interval_ms: 1000,
            archive: ArchiveConfig::default(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![CDX_TEXT_ENDPOINT.to_string(), CDX_JSON_ENDPOINT.to_string()],
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl HunterConfig {
    pub fn from_file(path: &Path) -> Result<Self, HunterError> {
        let raw = std::fs::read_to_string(path).map_err(|e| HunterError::Config {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        let cfg: Self = serde_yaml::from_str(&raw).map_err(|e| HunterError::Config {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        cfg.validate(path)?;
        Ok(cfg)
    }

    /// The placeholder doubles as the reflection marker, so it must have visible content.
    pub fn validate(&self, origin: &Path) -> Result<(), HunterError> {
        if self.placeholder.trim().is_empty() {
            return Err(HunterError::Config {
                path: origin.to_path_buf(),
                source: "placeholder must not be empty".into(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(50))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: HunterConfig = serde_yaml::from_str("threads: 4\narchive:\n  max_attempts: 5\n").unwrap();
        assert_eq!(cfg.threads, 4);
        assert_eq!(cfg.placeholder, "xss<>");
        assert_eq!(cfg.archive.max_attempts, 5);
        assert_eq!(cfg.archive.endpoints.len(), 2);
        assert_eq!(cfg.timeout(), Duration::from_secs(20));
    }

    #[test]
    fn blank_placeholder_is_rejected() {
        for placeholder in ["", "   "] {
            let cfg = HunterConfig { placeholder: placeholder.to_string(), ..HunterConfig::default() };
            let err = cfg.validate(Path::new("--placeholder")).unwrap_err();
            assert!(matches!(err, HunterError::Config { .. }));
            assert!(err.to_string().contains("placeholder must not be empty"));
        }
        assert!(HunterConfig::default().validate(Path::new("defaults")).is_ok());
    }

    #[test]
    fn blank_placeholder_in_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hunter.yaml");
        std::fs::write(&path, "placeholder: \"\"\n").unwrap();
        let err = HunterConfig::from_file(&path).unwrap_err();
        match err {
            HunterError::Config { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = HunterConfig::from_file(Path::new("/nonexistent/hunter.yaml")).unwrap_err();
        assert!(matches!(err, HunterError::Config { .. }));
    }
}
