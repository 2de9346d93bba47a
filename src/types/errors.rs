use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OntoscanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    #[error("Catalog not found at {}. Run 'ontoscan extract' first.", .0.display())]
    CatalogMissing(PathBuf),
}

impl OntoscanError {
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        OntoscanError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for OntoscanError {
    fn from(err: config::ConfigError) -> Self {
        OntoscanError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OntoscanError>;
