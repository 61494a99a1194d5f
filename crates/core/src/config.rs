use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::paths::Paths;
use crate::types::WcagLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Base URLs tried in order during endpoint discovery.
    #[serde(default = "default_candidate_urls")]
    pub candidate_urls: Vec<String>,
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
    #[serde(default = "default_analyze_timeout_secs")]
    pub analyze_timeout_secs: u64,
    #[serde(default = "default_mobile_base_url")]
    pub mobile_base_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_candidate_urls() -> Vec<String> {
    vec![
        "http://localhost:5000".to_string(),
        "http://127.0.0.1:5000".to_string(),
        "http://[::1]:5000".to_string(),
    ]
}

fn default_health_timeout_secs() -> u64 {
    5
}

fn default_analyze_timeout_secs() -> u64 {
    60
}

fn default_mobile_base_url() -> String {
    "https://reports.finaccai.ai".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            candidate_urls: default_candidate_urls(),
            health_timeout_secs: default_health_timeout_secs(),
            analyze_timeout_secs: default_analyze_timeout_secs(),
            mobile_base_url: default_mobile_base_url(),
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotMode {
    Off,
    #[default]
    Viewport,
    Multi,
}

impl std::str::FromStr for ScreenshotMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "viewport" | "single" => Ok(Self::Viewport),
            "multi" | "full" => Ok(Self::Multi),
            other => Err(crate::error::Error::Validation(format!(
                "unknown screenshot mode '{}', expected off|viewport|multi",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    #[serde(default)]
    pub level: WcagLevel,
    #[serde(default)]
    pub screenshot: ScreenshotMode,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_max_captures")]
    pub max_captures: usize,
}

fn default_settle_delay_ms() -> u64 {
    400
}

fn default_max_captures() -> usize {
    3
}

impl ScanConfig {
    pub const MIN_SETTLE_MS: u64 = 300;
    pub const MAX_SETTLE_MS: u64 = 500;

    /// Settle delay clamped into the window re-layout needs after a scroll.
    pub fn settle_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(
            self.settle_delay_ms
                .clamp(Self::MIN_SETTLE_MS, Self::MAX_SETTLE_MS),
        )
    }

    pub fn capture_limit(&self) -> usize {
        self.max_captures.clamp(1, 3)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            level: WcagLevel::default(),
            screenshot: ScreenshotMode::default(),
            settle_delay_ms: default_settle_delay_ms(),
            max_captures: default_max_captures(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    #[serde(default)]
    pub headed: bool,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    /// Explicit Chrome/Chromium/Edge executable; auto-detected when unset.
    #[serde(default)]
    pub binary: Option<String>,
    #[serde(default)]
    pub keep_open: bool,
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    720
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headed: false,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            binary: None,
            keep_open: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    20
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.backend.candidate_urls.len(), 3);
        assert_eq!(config.backend.health_timeout_secs, 5);
        assert_eq!(config.backend.analyze_timeout_secs, 60);
        assert_eq!(config.scan.level, WcagLevel::Aaa);
        assert_eq!(config.scan.screenshot, ScreenshotMode::Viewport);
        assert_eq!(config.history.limit, 20);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"scan": {"level": "AA", "settleDelayMs": 900}}"#).unwrap();
        assert_eq!(config.scan.level, WcagLevel::Aa);
        assert_eq!(config.scan.max_captures, 3);
        assert_eq!(config.scan.settle_delay().as_millis(), 500);
    }

    #[test]
    fn test_settle_delay_lower_clamp() {
        let scan = ScanConfig {
            settle_delay_ms: 10,
            ..ScanConfig::default()
        };
        assert_eq!(scan.settle_delay().as_millis(), 300);
    }

    #[test]
    fn test_screenshot_mode_parse() {
        assert_eq!("multi".parse::<ScreenshotMode>().unwrap(), ScreenshotMode::Multi);
        assert_eq!("OFF".parse::<ScreenshotMode>().unwrap(), ScreenshotMode::Off);
        assert!("tiles".parse::<ScreenshotMode>().is_err());
    }

    #[test]
    fn test_save_and_load_or_default() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::with_base(dir.path().to_path_buf());
        assert!(Config::load_or_default(&paths).unwrap().backend.auth_token.is_none());

        let mut config = Config::default();
        config.backend.auth_token = Some("tok".into());
        config.browser.headed = true;
        config.save(&paths.config_file()).unwrap();

        let loaded = Config::load_or_default(&paths).unwrap();
        assert_eq!(loaded.backend.auth_token.as_deref(), Some("tok"));
        assert!(loaded.browser.headed);
    }
}
