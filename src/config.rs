use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{OntoscanError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "ontoscan.toml";
pub const ENV_PREFIX: &str = "ONTOSCAN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OntoscanConfig {
    pub scan: ScanSettings,
    pub extraction: ExtractionSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Root holding Python sources, relative to the repository root.
    pub source_root: PathBuf,
    /// Root holding YAML configuration, relative to the repository root.
    pub config_root: PathBuf,
    pub source_extensions: Vec<String>,
    pub config_extensions: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub follow_symlinks: bool,
    pub max_depth: Option<usize>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("src"),
            config_root: PathBuf::from("conf"),
            source_extensions: vec!["py".to_string()],
            config_extensions: vec!["yaml".to_string(), "yml".to_string()],
            exclude_patterns: vec!["**/__pycache__/**".to_string()],
            follow_symlinks: false,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub max_doc_chars: usize,
    pub max_params: usize,
    pub include_module_docs: bool,
    pub yaml: YamlSettings,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_doc_chars: 200,
            max_params: 5,
            include_module_docs: true,
            yaml: YamlSettings::default(),
        }
    }
}

/// Tunable policy deciding which configuration keys become records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YamlSettings {
    /// Nodes deeper than this are never visited.
    pub max_depth: usize,
    /// Children are only descended into while depth is below this.
    pub recurse_depth: usize,
    /// Scalar keys at or above this depth are always emitted.
    pub shallow_depth: usize,
    /// Generic keys deeper than this are skipped.
    pub generic_depth: usize,
    pub generic_keys: Vec<String>,
    /// Number of mappings sampled from a list of mappings.
    pub list_sample: usize,
    pub key_preview: usize,
    pub value_preview: usize,
}

impl Default for YamlSettings {
    fn default() -> Self {
        Self {
            max_depth: 4,
            recurse_depth: 3,
            shallow_depth: 2,
            generic_depth: 2,
            generic_keys: ["name", "value", "type", "id", "label"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            list_sample: 3,
            key_preview: 5,
            value_preview: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub path: PathBuf,
    pub pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ontology_concepts.json"),
            pretty: true,
        }
    }
}

impl OntoscanConfig {
    /// Layer defaults, the config file and `ONTOSCAN__SECTION__KEY` variables.
    ///
    /// An explicit `config_file` must exist; otherwise `ontoscan.toml` in the
    /// repository root is picked up when present.
    pub fn load(repo_root: &Path, config_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match config_file {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = repo_root.join(DEFAULT_CONFIG_FILE);
                builder = builder.add_source(config::File::from(default_path).required(false));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: OntoscanConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan.source_root.as_os_str().is_empty() || self.scan.config_root.as_os_str().is_empty() {
            return Err(OntoscanError::Config("scan roots must not be empty".to_string()));
        }
        if self.scan.source_extensions.is_empty() && self.scan.config_extensions.is_empty() {
            return Err(OntoscanError::Config("no file extensions configured".to_string()));
        }
        if self.extraction.max_doc_chars == 0 {
            return Err(OntoscanError::Config("extraction.max_doc_chars must be positive".to_string()));
        }
        if self.output.path.as_os_str().is_empty() {
            return Err(OntoscanError::Config("output.path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Catalog location, resolved against the repository root when relative.
    pub fn output_path(&self, repo_root: &Path) -> PathBuf {
        if self.output.path.is_absolute() {
            self.output.path.clone()
        } else {
            repo_root.join(&self.output.path)
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| OntoscanError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = OntoscanConfig::default();
        assert_eq!(config.scan.source_root, PathBuf::from("src"));
        assert_eq!(config.scan.config_root, PathBuf::from("conf"));
        assert_eq!(config.extraction.max_doc_chars, 200);
        assert_eq!(config.extraction.yaml.max_depth, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = OntoscanConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.output.path, PathBuf::from("ontology_concepts.json"));
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[scan]\nsource_root = \"lib\"\n\n[extraction.yaml]\nmax_depth = 2\n",
        )
        .unwrap();

        let config = OntoscanConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.scan.source_root, PathBuf::from("lib"));
        assert_eq!(config.scan.config_root, PathBuf::from("conf"));
        assert_eq!(config.extraction.yaml.max_depth, 2);
        assert_eq!(config.extraction.yaml.recurse_depth, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(OntoscanConfig::load(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_doc_chars() {
        let mut config = OntoscanConfig::default();
        config.extraction.max_doc_chars = 0;
        assert!(matches!(config.validate(), Err(OntoscanError::Config(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = OntoscanConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: OntoscanConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.scan.config_extensions, config.scan.config_extensions);
        assert_eq!(parsed.extraction.yaml.generic_keys, config.extraction.yaml.generic_keys);
    }
}
