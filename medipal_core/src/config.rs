//! Configuration file support for MediPal.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/medipal/config.toml`.

use crate::tips::CommandGenerator;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub mascot: MascotConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// External text generator used for tips and snack plans
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct GeneratorConfig {
    /// Command and arguments; the prompt is written to its stdin
    #[serde(default)]
    pub command: Vec<String>,
}

impl GeneratorConfig {
    pub fn build(&self) -> Option<CommandGenerator> {
        CommandGenerator::from_argv(&self.command)
    }
}

/// Mascot display configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MascotConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MascotConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("medipal")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("medipal").join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if let Some(program) = self.generator.command.first() {
            if program.trim().is_empty() {
                return Err(Error::Config("generator command is empty".into()));
            }
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.generator.command.is_empty());
        assert!(config.generator.build().is_none());
        assert!(config.mascot.enabled);
        assert!(config.data.data_dir.ends_with("medipal"));
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[generator]
command = ["llm", "-m", "mini"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.generator.command.len(), 3);
        assert!(config.generator.build().is_some());
        assert!(config.mascot.enabled); // default
    }

    #[test]
    fn test_save_and_load_from() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("medipal").join("config.toml");

        let mut config = Config::default();
        config.data.data_dir = temp_dir.path().join("data");
        config.mascot.enabled = false;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.data.data_dir, config.data.data_dir);
        assert!(!loaded.mascot.enabled);
    }

    #[test]
    fn test_empty_generator_program_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[generator]\ncommand = [\" \"]\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
