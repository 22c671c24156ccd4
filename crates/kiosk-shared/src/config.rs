use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use tracing::warn;

use super::platform;
use crate::schedule::DriftPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kiosk: KioskConfig,
    #[serde(default)]
    pub idle: IdleConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub mpv: MpvConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KioskConfig {
    /// Bundled content description.  Defaults to `content.json` in the
    /// bundled content directory.
    #[serde(default = "default_content_file")]
    pub content_file: PathBuf,
    /// Root for relative media/image paths.  Empty means "directory of the
    /// content file".
    #[serde(default)]
    pub assets_dir: PathBuf,
    /// Show the operator overlay from start-up.
    #[serde(default)]
    pub debug_overlay: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleConfig {
    #[serde(default = "default_idle_timeout")]
    pub timeout_secs: u64,
    /// Input kinds that count as activity: tap, release, drag, scroll, move, key.
    #[serde(default = "default_reset_events")]
    pub reset_events: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold_secs: f64,
    #[serde(default = "default_rate_delta")]
    pub rate_delta: f64,
    #[serde(default = "default_max_correction_window")]
    pub max_correction_window_secs: f64,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_load_watchdog")]
    pub load_watchdog_secs: u64,
    #[serde(default = "default_max_load_retries")]
    pub max_load_retries: u32,
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpvConfig {
    #[serde(default = "default_true")]
    pub fullscreen: bool,
    #[serde(default)]
    pub border: bool,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationConfig {
    /// Horizontal travel (terminal cells) a drag needs to count as a swipe.
    #[serde(default = "default_swipe_min_distance")]
    pub swipe_min_distance: u16,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            content_file: default_content_file(),
            assets_dir: PathBuf::new(),
            debug_overlay: false,
        }
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_idle_timeout(),
            reset_events: default_reset_events(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sync_interval(),
            drift_threshold_secs: default_drift_threshold(),
            rate_delta: default_rate_delta(),
            max_correction_window_secs: default_max_correction_window(),
            retry_delay_secs: default_retry_delay(),
            load_watchdog_secs: default_load_watchdog(),
            max_load_retries: default_max_load_retries(),
            heartbeat_secs: default_heartbeat(),
        }
    }
}

impl Default for MpvConfig {
    fn default() -> Self {
        Self {
            fullscreen: true,
            border: false,
            extra_args: Vec::new(),
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            swipe_min_distance: default_swipe_min_distance(),
        }
    }
}

fn default_content_file() -> PathBuf {
    platform::bundled_content_dir().join("content.json")
}

fn default_idle_timeout() -> u64 {
    90
}

fn default_reset_events() -> Vec<String> {
    vec!["tap".to_string()]
}

fn default_sync_interval() -> u64 {
    10
}

fn default_drift_threshold() -> f64 {
    0.2
}

fn default_rate_delta() -> f64 {
    0.05
}

fn default_max_correction_window() -> f64 {
    10.0
}

fn default_retry_delay() -> u64 {
    2
}

fn default_load_watchdog() -> u64 {
    10
}

fn default_max_load_retries() -> u32 {
    5
}

fn default_heartbeat() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_swipe_min_distance() -> u16 {
    5
}

impl SyncConfig {
    /// Falls back to the default policy when the configured values are unusable.
    pub fn drift_policy(&self) -> DriftPolicy {
        let policy = self.configured_drift_policy();
        if policy.is_valid() {
            policy
        } else {
            warn!("[sync] drift settings {:?} are invalid, using defaults", policy);
            DriftPolicy::default()
        }
    }

    fn configured_drift_policy(&self) -> DriftPolicy {
        DriftPolicy {
            threshold_secs: self.drift_threshold_secs,
            rate_delta: self.rate_delta,
            max_window_secs: self.max_correction_window_secs,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.configured_drift_policy().is_valid() {
            anyhow::bail!(
                "[sync] needs drift_threshold_secs >= 0, 0 < rate_delta < 1 and \
                 max_correction_window_secs > 0 (got {}, {}, {})",
                self.drift_threshold_secs,
                self.rate_delta,
                self.max_correction_window_secs
            );
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn load_watchdog(&self) -> Duration {
        Duration::from_secs(self.load_watchdog_secs.max(1))
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }
}

impl IdleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl KioskConfig {
    /// Directory relative asset paths resolve against.
    pub fn resolved_assets_dir(&self) -> PathBuf {
        if !self.assets_dir.as_os_str().is_empty() {
            return self.assets_dir.clone();
        }
        self.content_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load an explicit config file; unlike [`Config::load`] a missing file is an error.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config
            .sync
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.idle.timeout_secs, 90);
        assert_eq!(config.idle.reset_events, vec!["tap".to_string()]);
        assert_eq!(config.sync.interval_secs, 10);
        assert_eq!(config.sync.retry_delay_secs, 2);
        assert_eq!(config.sync.load_watchdog_secs, 10);
        assert!(config.mpv.fullscreen);
        assert!(!config.mpv.border);
        assert!(config.kiosk.content_file.ends_with("content.json"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [idle]
            timeout_secs = 30

            [sync]
            drift_threshold_secs = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.idle.timeout_secs, 30);
        assert_eq!(config.idle.reset_events, vec!["tap".to_string()]);
        assert_eq!(config.sync.drift_threshold_secs, 0.5);
        assert_eq!(config.sync.rate_delta, 0.05);
        assert_eq!(config.presentation.swipe_min_distance, 5);
    }

    #[test]
    fn test_drift_policy_from_sync_section() {
        let policy = SyncConfig::default().drift_policy();
        assert_eq!(policy, DriftPolicy::default());
    }

    #[test]
    fn test_bad_drift_settings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync]\nrate_delta = -0.05\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        std::fs::write(&path, "[sync]\nmax_correction_window_secs = 0.0\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        std::fs::write(&path, "[sync]\nrate_delta = 0.1\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().sync.drift_policy().rate_delta, 0.1);
    }

    #[test]
    fn test_invalid_drift_policy_uses_defaults() {
        let sync = SyncConfig {
            rate_delta: 0.0,
            ..SyncConfig::default()
        };
        assert_eq!(sync.drift_policy(), DriftPolicy::default());
    }

    #[test]
    fn test_assets_dir_defaults_to_content_parent() {
        let kiosk = KioskConfig {
            content_file: PathBuf::from("/srv/kiosk/content.json"),
            assets_dir: PathBuf::new(),
            debug_overlay: false,
        };
        assert_eq!(kiosk.resolved_assets_dir(), PathBuf::from("/srv/kiosk"));
    }
}
