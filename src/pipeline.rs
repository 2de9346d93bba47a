use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::analyzers::{ConceptAnalyzer, PythonAnalyzer, YamlAnalyzer};
use crate::config::OntoscanConfig;
use crate::scanner::{root_prefix, DiscoveredFile, FileRole, RepositoryScanner, ScanResult};
use crate::storage::Catalog;
use crate::types::{ConceptRecord, Result};

/// A file that contributed no records because it could not be read or parsed.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub relative_path: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct ExtractionReport {
    pub catalog: Catalog,
    pub files_scanned: usize,
    pub skipped: Vec<SkippedFile>,
    pub missing_roots: Vec<PathBuf>,
}

/// Walks a repository and runs every discovered file through its analyzer.
pub struct ConceptExtractor {
    scanner: RepositoryScanner,
    python: PythonAnalyzer,
    yaml: YamlAnalyzer,
}

impl ConceptExtractor {
    pub fn new(config: &OntoscanConfig) -> Result<Self> {
        let scanner = RepositoryScanner::new(&config.scan)?;
        let python = PythonAnalyzer::new(config.extraction.clone())?;
        let yaml = YamlAnalyzer::new(
            config.extraction.yaml.clone(),
            root_prefix(&config.scan.config_root),
        );

        Ok(Self { scanner, python, yaml })
    }

    pub fn discover(&self, repo_root: &Path) -> Result<ScanResult> {
        self.scanner.scan(repo_root)
    }

    /// Extract records from already discovered files, in discovery order.
    ///
    /// `on_file` is called once per file before it is analyzed.
    pub fn extract_files<F>(&self, scan: ScanResult, mut on_file: F) -> ExtractionReport
    where
        F: FnMut(&DiscoveredFile),
    {
        let mut catalog = Catalog::new();
        let mut skipped = Vec::new();

        for file in &scan.files {
            on_file(file);

            match self.extract_file(file) {
                Ok(records) => {
                    debug!("{}: {} concepts", file.relative_path, records.len());
                    catalog.extend(records);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", file.relative_path, e);
                    skipped.push(SkippedFile {
                        relative_path: file.relative_path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Extracted {} concepts from {} files ({} skipped)",
            catalog.len(),
            scan.files.len(),
            skipped.len()
        );

        ExtractionReport {
            catalog,
            files_scanned: scan.files.len(),
            skipped,
            missing_roots: scan.missing_roots,
        }
    }

    pub fn run(&self, repo_root: &Path) -> Result<ExtractionReport> {
        let scan = self.discover(repo_root)?;
        Ok(self.extract_files(scan, |_| {}))
    }

    fn extract_file(&self, file: &DiscoveredFile) -> Result<Vec<ConceptRecord>> {
        let content = fs::read_to_string(&file.path)?;
        let analyzer = self.analyzer_for(file.role);
        debug!("Analyzing {} as {}", file.relative_path, analyzer.language());
        analyzer.extract(&file.relative_path, &content)
    }

    fn analyzer_for(&self, role: FileRole) -> &dyn ConceptAnalyzer {
        match role {
            FileRole::Source => &self.python,
            FileRole::Config => &self.yaml,
        }
    }
}
