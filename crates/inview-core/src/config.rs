use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::geometry::{RootMargin, Thresholds};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub visibility: VisibilityConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub activation: ActivationConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Data directory (log files for the terminal demo)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

/// Defaults for visibility observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityConfig {
    /// Intersection ratio(s) that count as visible
    #[serde(default = "default_visibility_threshold")]
    pub threshold: Thresholds,
    /// Margin around the viewport, CSS shorthand
    #[serde(default)]
    pub root_margin: RootMargin,
    /// Stop observing after the first visible notification
    #[serde(default = "default_true")]
    pub trigger_once: bool,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            threshold: default_visibility_threshold(),
            root_margin: RootMargin::ZERO,
            trigger_once: default_true(),
        }
    }
}

/// Defaults for scroll trackers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Offset beyond which `past_threshold` is set
    #[serde(default = "default_scroll_threshold")]
    pub threshold: f64,
    /// Minimum interval between handled scroll notifications
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            threshold: default_scroll_threshold(),
            throttle_ms: default_throttle_ms(),
        }
    }
}

/// Easing curve applied to animation progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EasingType {
    Linear,
    EaseOutQuad,
    EaseOutCubic,
    EaseOutQuint,
    #[default]
    EaseOutExpo,
    EaseInOutCubic,
}

/// Count-up animation defaults and the easing table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_duration_ms")]
    pub duration_ms: f64,
    #[serde(default)]
    pub delay_ms: f64,
    /// Used when no easing is named, and when a name does not resolve
    #[serde(default)]
    pub easing: EasingType,
    /// Step used by the simulated host between frames
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: f64,
    /// Extra easing names, e.g. `stat = "ease-out-quint"`
    #[serde(default)]
    pub aliases: BTreeMap<String, EasingType>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            delay_ms: 0.0,
            easing: EasingType::default(),
            frame_interval_ms: default_frame_interval_ms(),
            aliases: BTreeMap::new(),
        }
    }
}

/// Defaults for deferred (activation-gated) regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationConfig {
    #[serde(default = "default_activation_margin")]
    pub root_margin: RootMargin,
    #[serde(default = "default_visibility_threshold")]
    pub threshold: Thresholds,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            root_margin: default_activation_margin(),
            threshold: default_visibility_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Emit section timing marks
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Event poll interval in milliseconds
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    /// Duration of the entrance reveal of a section
    #[serde(default = "default_reveal_duration")]
    pub reveal_duration_ms: f64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            reveal_duration_ms: default_reveal_duration(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("inview")
}

fn default_true() -> bool {
    true
}

fn default_visibility_threshold() -> Thresholds {
    Thresholds::single(0.1)
}

fn default_activation_margin() -> RootMargin {
    // 50px on every side
    RootMargin {
        top: crate::geometry::MarginLength::Px(50.0),
        right: crate::geometry::MarginLength::Px(50.0),
        bottom: crate::geometry::MarginLength::Px(50.0),
        left: crate::geometry::MarginLength::Px(50.0),
    }
}

fn default_scroll_threshold() -> f64 {
    100.0
}

fn default_throttle_ms() -> f64 {
    16.0 // one frame at ~60fps
}

fn default_duration_ms() -> f64 {
    2000.0
}

fn default_frame_interval_ms() -> f64 {
    16.0
}

fn default_tick_rate() -> u64 {
    16
}

fn default_reveal_duration() -> f64 {
    600.0
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default path or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to the default path
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;

        Ok(())
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/inview/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("inview")
            .join("config.toml")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Get the log file used by the terminal demo
    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("inview.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MarginLength;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scroll.threshold, 100.0);
        assert_eq!(config.scroll.throttle_ms, 16.0);
        assert_eq!(config.animation.duration_ms, 2000.0);
        assert_eq!(config.animation.delay_ms, 0.0);
        assert_eq!(config.animation.easing, EasingType::EaseOutExpo);
        assert!(config.visibility.trigger_once);
        assert_eq!(config.visibility.threshold.values(), &[0.1]);
        assert_eq!(config.activation.root_margin.top, MarginLength::Px(50.0));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [scroll]
            threshold = 200

            [animation]
            easing = "ease-out-cubic"

            [animation.aliases]
            stat = "ease-out-quint"

            [visibility]
            root_margin = "0px 0px -50px 0px"
            threshold = [0.0, 0.5]
            "#,
        )
        .unwrap();
        assert_eq!(config.scroll.threshold, 200.0);
        assert_eq!(config.scroll.throttle_ms, 16.0);
        assert_eq!(config.animation.easing, EasingType::EaseOutCubic);
        assert_eq!(config.animation.aliases["stat"], EasingType::EaseOutQuint);
        assert_eq!(config.visibility.root_margin.bottom, MarginLength::Px(-50.0));
        assert_eq!(config.visibility.threshold.values(), &[0.0, 0.5]);
        assert!(config.performance.enabled);
    }

    #[test]
    fn test_invalid_margin_is_config_error() {
        let err = AppConfig::from_toml("[activation]\nroot_margin = \"wide\"").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_toml_round_trip_keeps_margin() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        let back = AppConfig::from_toml(&text).unwrap();
        assert_eq!(back.activation, config.activation);
    }
}
