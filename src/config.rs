use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::adherence::AdherenceConfig;
use crate::chart::ChartConfig;
use crate::error::NutriRsError;
use crate::logging::LogConfig;
use crate::models::Goals;
use crate::progress::ProgressConfig;
use crate::scoring::ScoringThresholds;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Daily nutrition targets
    pub goals: Goals,

    /// Goal progress banding
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Nutrition quality score thresholds
    #[serde(default)]
    pub scoring: ScoringThresholds,

    /// Chart canvas and layout
    #[serde(default)]
    pub chart: ChartConfig,

    /// Adherence weights and targets
    #[serde(default)]
    pub adherence: AdherenceConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metadata: ConfigMetadata::default(),
            goals: Goals::default(),
            progress: ProgressConfig::default(),
            scoring: ScoringThresholds::default(),
            chart: ChartConfig::default(),
            adherence: AdherenceConfig::default(),
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

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

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

    /// Load the default configuration file, or defaults when none exists.
    ///
    /// A file that exists but cannot be read or parsed is an error, so a typo
    /// never silently swaps the user's goals for the defaults.
    pub fn load_or_default() -> crate::error::Result<Self> {
        Self::load_from_path_or_default(&Self::default_config_path())
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_from_path_or_default(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from_file(path).map_err(|e| {
            NutriRsError::Configuration(format!("{}: {:#}", path.display(), e))
        })
    }

    /// Save configuration to default location
    pub fn save(&mut self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_file(path)
    }

    /// All settings as flattened `section.key = value` pairs
    pub fn list_values(&self) -> Result<Vec<(String, String)>> {
        let root = toml::Value::try_from(self).context("Failed to serialize configuration")?;
        let mut entries = Vec::new();
        flatten("", &root, &mut entries);
        Ok(entries)
    }

    /// Look up a dotted key such as `goals.protein`
    pub fn get_value(&self, key: &str) -> Result<String> {
        let root = toml::Value::try_from(self).context("Failed to serialize configuration")?;
        let mut current = &root;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow!("Unknown configuration key: {}", key))?;
        }
        Ok(display_value(current))
    }

    /// Set a dotted key from its string form, validating the result
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut root = toml::Value::try_from(&*self).context("Failed to serialize configuration")?;

        let mut current = &mut root;
        for part in key.split('.') {
            current = current
                .get_mut(part)
                .ok_or_else(|| anyhow!("Unknown configuration key: {}", key))?;
        }

        let replacement = match &*current {
            toml::Value::Table(_) | toml::Value::Array(_) => {
                bail!("Configuration key {} is a section, not a value", key)
            }
            toml::Value::Integer(_) => toml::Value::Integer(
                raw.parse()
                    .with_context(|| format!("{} expects an integer, got {}", key, raw))?,
            ),
            toml::Value::Float(_) => toml::Value::Float(
                raw.parse()
                    .with_context(|| format!("{} expects a number, got {}", key, raw))?,
            ),
            toml::Value::Boolean(_) => toml::Value::Boolean(
                raw.parse()
                    .with_context(|| format!("{} expects true or false, got {}", key, raw))?,
            ),
            _ => toml::Value::String(raw.to_string()),
        };
        *current = replacement;

        *self = root
            .try_into()
            .with_context(|| format!("Invalid value for {}: {}", key, raw))?;
        Ok(())
    }
}

fn flatten(prefix: &str, value: &toml::Value, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, out);
            }
        }
        other => out.push((prefix.to_string(), display_value(other))),
    }
}

fn display_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
