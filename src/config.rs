use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::AnalysisConfig;
use crate::logging::LogConfig;
use crate::models::Goal;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Detection thresholds, range band and macro rules
    pub engine: AnalysisConfig,

    /// Values used when an input file leaves them out
    pub defaults: UserDefaults,

    /// Logging setup
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-user fallbacks for batch imports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDefaults {
    pub bodyweight_kg: Decimal,
    pub goal: Goal,
}

impl Default for UserDefaults {
    fn default() -> Self {
        UserDefaults {
            bodyweight_kg: dec!(75),
            goal: Goal::Maintain,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            metadata: ConfigMetadata::default(),
            engine: AnalysisConfig::default(),
            defaults: UserDefaults::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        config
            .engine
            .validate()
            .with_context(|| format!("Invalid engine settings in {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nutrirs")
            .join("config.toml")
    }

    /// Load from the default path; a missing file yields defaults, a broken one is an error
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<PathBuf> {
        let config_path = Self::default_config_path();
        self.save_to_file(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NutriRsError;
    use crate::explainer::ExplanationStyle;
    use crate::logging::LogLevel;
    use crate::nutrition::GoalPolicy;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [engine]
            goal_policy = "legacy"
            explanation_style = "brief"

            [engine.thresholds]
            spike_threshold = 40

            [defaults]
            goal = "cut"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.goal_policy, GoalPolicy::Legacy);
        assert_eq!(config.engine.explanation_style, ExplanationStyle::Brief);
        assert_eq!(config.engine.thresholds.spike_threshold, 40);
        assert_eq!(config.engine.thresholds.low_threshold, 70);
        assert_eq!(config.engine.range.high, 140);
        assert_eq!(config.defaults.goal, Goal::Cut);
        assert_eq!(config.defaults.bodyweight_kg, dec!(75));
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original_config = AppConfig::default();
        original_config.defaults.bodyweight_kg = dec!(82.5);

        original_config.save_to_file(&config_path).unwrap();
        let loaded_config = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded_config.defaults.bodyweight_kg, dec!(82.5));
        assert_eq!(loaded_config.engine, original_config.engine);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[engine\n").unwrap();

        let err = AppConfig::load_from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }

    #[test]
    fn test_unusable_engine_settings_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[engine.range]
low = 180
high = 70
").unwrap();

        let err = AppConfig::load_from_file(&config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid engine settings"));
        assert!(matches!(
            err.downcast_ref::<NutriRsError>(),
            Some(NutriRsError::Configuration(message)) if message.contains("range low 180")
        ));
    }
}
