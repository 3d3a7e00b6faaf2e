//! Application configuration for pfcontent.
//!
//! User config lives at `~/.pfcontent/pfcontent.toml`.
//! CLI flags override config file values, which override defaults.
//!
//! The `[[algorithms]]` array lists the top-level algorithms run on every
//! event, in order. Each entry carries its own free-form `settings` table,
//! read by the algorithm itself, and may nest `daughters` for parent
//! algorithms.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PfContentError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pfcontent.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pfcontent";

// ---------------------------------------------------------------------------
// Config structs (matching pfcontent.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Event loop settings.
    #[serde(default)]
    pub run: RunConfig,

    /// Top-level algorithm sequence.
    #[serde(default)]
    pub algorithms: Vec<AlgorithmConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut clustering = toml::Table::new();
        clustering.insert(
            "OutputClusterListName".into(),
            toml::Value::String("SeededClusters".into()),
        );
        clustering.insert("ReplaceCurrentClusterList".into(), toml::Value::Boolean(true));

        let mut daughter = toml::Table::new();
        daughter.insert("NClustersToMake".into(), toml::Value::Integer(1));

        Self {
            run: RunConfig::default(),
            algorithms: vec![
                AlgorithmConfig {
                    algorithm_type: "CreateClusters".into(),
                    description: None,
                    settings: clustering,
                    daughters: vec![AlgorithmConfig {
                        algorithm_type: "CreateClustersDaughter".into(),
                        description: Some("ClusterFormation".into()),
                        settings: daughter,
                        daughters: Vec::new(),
                    }],
                },
                AlgorithmConfig::of_type("AccessLists"),
            ],
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Abort the whole run at the first failed event.
    #[serde(default)]
    pub stop_on_error: bool,

    /// Process at most this many events per input file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_events: Option<usize>,
}

/// `[[algorithms]]` entry, also used for nested `daughters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    /// Registered algorithm type name, e.g. `"AccessLists"`.
    #[serde(rename = "type")]
    pub algorithm_type: String,

    /// Role of a daughter within its parent, e.g. `"ClusterFormation"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Algorithm-specific key/value settings.
    #[serde(default)]
    pub settings: toml::Table,

    /// Daughter algorithms run by this (parent) algorithm.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub daughters: Vec<AlgorithmConfig>,
}

impl AlgorithmConfig {
    /// An entry with no settings and no daughters.
    pub fn of_type(algorithm_type: impl Into<String>) -> Self {
        Self {
            algorithm_type: algorithm_type.into(),
            description: None,
            settings: toml::Table::new(),
            daughters: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pfcontent/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PfContentError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pfcontent/pfcontent.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PfContentError::io(path, e))?;
    parse_config(&content)
        .map_err(|e| PfContentError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| PfContentError::config(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PfContentError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PfContentError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PfContentError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the algorithm sequence is non-empty and every entry names a type.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.algorithms.is_empty() {
        return Err(PfContentError::config(
            "no algorithms configured, add at least one [[algorithms]] entry",
        ));
    }

    fn check(entry: &AlgorithmConfig) -> Result<()> {
        if entry.algorithm_type.trim().is_empty() {
            return Err(PfContentError::config("algorithm entry with empty type"));
        }
        entry.daughters.iter().try_for_each(check)
    }

    config.algorithms.iter().try_for_each(check)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("CreateClustersDaughter"));
        assert!(toml_str.contains("NClustersToMake"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed = parse_config(&toml_str).expect("deserialize");
        assert_eq!(parsed.algorithms.len(), 2);
        assert_eq!(parsed.algorithms[0].daughters.len(), 1);
        assert_eq!(
            parsed.algorithms[0].daughters[0].settings["NClustersToMake"].as_integer(),
            Some(1)
        );
        assert!(!parsed.run.stop_on_error);
    }

    #[test]
    fn config_with_settings() {
        let toml_str = r#"
[run]
stop_on_error = true

[[algorithms]]
type = "AccessLists"

[algorithms.settings]
RequestedCaloHitListName = "EcalBarrel"
"#;
        let config = parse_config(toml_str).expect("parse");
        assert!(config.run.stop_on_error);
        assert_eq!(config.algorithms.len(), 1);
        assert_eq!(config.algorithms[0].algorithm_type, "AccessLists");
        assert_eq!(
            config.algorithms[0].settings["RequestedCaloHitListName"].as_str(),
            Some("EcalBarrel")
        );
    }

    #[test]
    fn empty_sequence_rejected() {
        let result = parse_config("[run]\nstop_on_error = false\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no algorithms"));
    }

    #[test]
    fn blank_daughter_type_rejected() {
        let toml_str = r#"
[[algorithms]]
type = "CreateClusters"

[[algorithms.daughters]]
type = " "
"#;
        assert!(parse_config(toml_str).is_err());
    }

    #[test]
    fn config_fixture_validates() {
        let path = Path::new("../../../fixtures/toml/pfcontent.fixture.toml");
        let config = load_config_from(path).expect("load fixture");
        assert_eq!(config.algorithms.len(), 2);
        assert_eq!(config.algorithms[0].algorithm_type, "CreateClusters");
        assert_eq!(config.algorithms[1].algorithm_type, "AccessLists");
    }
}
