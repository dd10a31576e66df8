use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for repowatch
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Where the favorites and clone registry files live
    #[serde(default)]
    pub storage: StorageConfig,

    /// External git invocation settings
    #[serde(default)]
    pub git: GitConfig,

    /// Background update polling
    #[serde(default)]
    pub poller: PollerConfig,

    /// Clone behavior
    #[serde(default)]
    pub clone: CloneConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Store file locations
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Directory holding both store files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Favorites file name (JSON array)
    #[serde(default = "default_favorites_file")]
    pub favorites_file: String,

    /// Clone registry file name (JSON object)
    #[serde(default = "default_registry_file")]
    pub registry_file: String,
}

/// How a favorite's update status is decided
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CheckMode {
    /// The remote answers `ls-remote` => "Updated"
    #[default]
    Reachability,
    /// Local HEAD matches the remote branch head => "Updated"
    CompareHeads,
}

/// Git configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitConfig {
    /// Timeout for each git invocation in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Update check strategy
    #[serde(default)]
    pub check_mode: CheckMode,
}

/// Update poller configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PollerConfig {
    /// Pause between two full passes over the favorites
    #[serde(default = "default_interval")]
    pub interval: String, // "60s"

    /// Reload favorites from disk before every pass
    #[serde(default = "default_true")]
    pub refresh_each_cycle: bool,
}

/// Clone configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CloneConfig {
    /// Destination root used when none is given on the command line
    #[serde(default)]
    pub default_destination: Option<String>,

    /// Add every cloned repository to the favorites
    #[serde(default = "default_true")]
    pub auto_favorite: bool,

    /// Remove the branch directory again when the clone fails
    #[serde(default = "default_true")]
    pub cleanup_on_error: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

// Default value functions
fn default_data_dir() -> String {
    ".".to_string()
}
fn default_favorites_file() -> String {
    "repos_favoritos.json".to_string()
}
fn default_registry_file() -> String {
    "repos_clonados.json".to_string()
}
fn default_true() -> bool {
    true
}
fn default_timeout() -> u64 {
    300
}
fn default_interval() -> String {
    "60s".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            favorites_file: default_favorites_file(),
            registry_file: default_registry_file(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            check_mode: CheckMode::default(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            refresh_each_cycle: default_true(),
        }
    }
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            default_destination: None,
            auto_favorite: default_true(),
            cleanup_on_error: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            color: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let config = Self::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;

            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repowatch").join("config.yml"))
    }

    /// Expand environment variables and `~` in configured paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.storage.data_dir = shellexpand::full(&self.storage.data_dir)
            .context("Failed to expand data_dir path")?
            .into_owned();

        if let Some(dest) = &self.clone.default_destination {
            let expanded = shellexpand::full(dest)
                .context("Failed to expand default_destination path")?
                .into_owned();
            self.clone.default_destination = Some(expanded);
        }

        Ok(())
    }

    pub fn favorites_path(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join(&self.storage.favorites_file)
    }

    pub fn registry_path(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join(&self.storage.registry_file)
    }

    /// Timeout applied to every git subprocess
    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git.timeout)
    }

    /// Parsed poller interval
    pub fn poll_interval(&self) -> Result<Duration> {
        let secs = parse_duration(&self.poller.interval)
            .with_context(|| format!("Invalid poller interval: {}", self.poller.interval))?;
        if secs == 0 {
            anyhow::bail!("Poller interval must be at least one second");
        }
        Ok(Duration::from_secs(secs))
    }
}

/// Parse duration strings like "30s", "5m", "1h", "2d" (or raw seconds) into seconds
pub fn parse_duration(duration_str: &str) -> Result<u64> {
    let duration_str = duration_str.trim().to_lowercase();

    if let Some(value) = duration_str.strip_suffix('s') {
        value.parse::<u64>().context("Invalid seconds value")
    } else if let Some(value) = duration_str.strip_suffix('m') {
        value.parse::<u64>().map(|v| v * 60).context("Invalid minutes value")
    } else if let Some(value) = duration_str.strip_suffix('h') {
        value.parse::<u64>().map(|v| v * 3600).context("Invalid hours value")
    } else if let Some(value) = duration_str.strip_suffix('d') {
        value.parse::<u64>().map(|v| v * 86400).context("Invalid days value")
    } else {
        duration_str
            .parse::<u64>()
            .context("Invalid duration format. Use format like '60s', '5m', '1h'")
    }
}
