pub mod types;
pub mod analyzers;
pub mod scanner;
pub mod storage;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod cli;
pub mod cli_types;
pub mod ui;

// Re-export commonly used types
pub use types::*;
pub use analyzers::{ConceptAnalyzer, PythonAnalyzer, YamlAnalyzer};
pub use storage::Catalog;
pub use scanner::{RepositoryScanner, ScanResult};
pub use config::OntoscanConfig;
pub use pipeline::{ConceptExtractor, ExtractionReport};
pub use cli::CliApp;
pub use ui::UIManager;
