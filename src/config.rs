use anyhow::{bail, Context, Result};
use dirs::config_dir;
use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable that takes precedence over `aur_directory`
pub const AUR_DIRECTORY_ENV: &str = "AURCHECK_DIR";

/// Main configuration structure for aurcheck
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one cloned AUR repository per package
    #[serde(default)]
    pub aur_directory: Option<String>,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Rebuild detection settings
    #[serde(default)]
    pub rebuild: RebuildConfig,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Maximum parallel synchronizations
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Fast-forward only pulls
    #[serde(default = "default_true")]
    pub fast_forward_only: bool,
}

/// Rebuild detection configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RebuildConfig {
    /// Run checkrebuild before synchronizing
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}
fn default_max_parallel() -> usize {
    10
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            fast_forward_only: default_true(),
        }
    }
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create(&config_path)
    }

    /// Load configuration from `path`, writing a default file there when missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        config.save(path)?;

        tracing::info!("Created default configuration at: {:?}", path);
        Ok(config)
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

        Ok(config_dir.join("aurcheck").join("config.yml"))
    }

    /// Expand environment variables and `~` in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        if let Some(dir) = &self.aur_directory {
            self.aur_directory = Some(expand(dir).context("Failed to expand aur_directory path")?);
        }

        Ok(())
    }

    /// Resolve the AUR directory: `AURCHECK_DIR` first, then `aur_directory`
    ///
    /// Returns `None` when neither is set or the chosen path is not an
    /// existing directory.
    pub fn aur_directory(&self) -> Option<PathBuf> {
        let from_env = std::env::var(AUR_DIRECTORY_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());

        let candidate = match from_env {
            Some(value) => match expand(&value) {
                Ok(expanded) => expanded,
                Err(e) => {
                    warn!("Ignoring {}: {}", AUR_DIRECTORY_ENV, e);
                    return None;
                }
            },
            None => self.aur_directory.clone()?,
        };

        let path = PathBuf::from(candidate);
        if path.is_dir() {
            debug!("Using AUR directory {}", path.display());
            Some(path)
        } else {
            warn!("AUR directory {} is not a directory", path.display());
            None
        }
    }

    /// Store `path` as the AUR directory
    ///
    /// The path must be absolute and point at an existing directory.
    pub fn set_aur_directory(&mut self, path: &Path) -> Result<PathBuf> {
        if !path.is_absolute() {
            bail!("{} is not an absolute path", path.display());
        }
        let path = path.to_path_buf().clean();
        if !path.is_dir() {
            bail!("{} is not a directory", path.display());
        }

        self.aur_directory = Some(path.to_string_lossy().into_owned());
        Ok(path)
    }
}

fn expand(value: &str) -> Result<String> {
    Ok(shellexpand::full(value)?.into_owned())
}
