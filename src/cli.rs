use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::{
    cli_types::{AnalyzeArgs, Cli, ExtractArgs, InsightsArgs, ReportFormat, VerifyArgs},
    config::OntoscanConfig,
    pipeline::ConceptExtractor,
    report::{self, AnalysisOptions, AnalysisReport, InsightsReport, VerifyOptions},
    scanner::root_prefix,
    storage::Catalog,
    ui::UIManager,
};

const SIMILAR_SHOWN: usize = 3;
const OVERLOAD_SOURCES_SHOWN: usize = 5;
const DESCRIPTION_PREVIEW: usize = 150;

pub struct CliApp {
    config: OntoscanConfig,
    repo_root: PathBuf,
    output_path: PathBuf,
    verbose: bool,
    ui: UIManager,
}

impl CliApp {
    pub fn new(cli: &Cli) -> Result<Self> {
        info!("Initializing ontoscan");

        let repo_root = cli.repo.clone();
        let config = OntoscanConfig::load(&repo_root, cli.config.as_deref())
            .context("Failed to load configuration")?;

        let output_path = match &cli.output {
            Some(path) => path.clone(),
            None => config.output_path(&repo_root),
        };

        Ok(Self {
            config,
            repo_root,
            output_path,
            verbose: cli.verbose > 0,
            ui: UIManager::new(!cli.no_color, true),
        })
    }

    pub fn extract(&self, args: ExtractArgs) -> Result<()> {
        let start_time = Instant::now();
        self.ui.print_header("Concept Extraction");

        if self.verbose {
            self.ui.print_info(&format!("Repository: {}", self.repo_root.display()));
            self.ui.print_info(&format!("Source root: {}", self.config.scan.source_root.display()));
            self.ui.print_info(&format!("Config root: {}", self.config.scan.config_root.display()));
        }

        let extractor = ConceptExtractor::new(&self.config).context("Failed to create concept extractor")?;
        let scan = extractor
            .discover(&self.repo_root)
            .with_context(|| format!("Failed to scan {}", self.repo_root.display()))?;

        for root in &scan.missing_roots {
            self.ui.print_warning(&format!("Root not found, skipped: {}", root.display()));
        }

        let progress = if args.no_progress {
            UIManager::new(self.ui.colors_enabled(), false).create_progress(scan.files.len() as u64)
        } else {
            self.ui.create_progress(scan.files.len() as u64)
        };
        let report = extractor.extract_files(scan, |file| {
            progress.set_message(file.relative_path.clone());
            progress.inc(1);
        });
        progress.finish_and_clear();

        for skipped in &report.skipped {
            self.ui.print_warning(&format!("Skipped {}: {}", skipped.relative_path, skipped.reason));
        }

        report
            .catalog
            .save(&self.output_path, self.config.output.pretty)
            .with_context(|| format!("Failed to write catalog to {}", self.output_path.display()))?;

        self.ui.print_counts("Concepts by type", &report::analysis::kind_counts(&report.catalog));
        self.ui.print_success(&format!(
            "Extracted {} concepts from {} files to {} in {:?}",
            report.catalog.len(),
            report.files_scanned,
            self.output_path.display(),
            start_time.elapsed()
        ));

        Ok(())
    }

    pub fn analyze(&self, args: AnalyzeArgs) -> Result<()> {
        let catalog = self.load_catalog()?;
        let options = AnalysisOptions {
            top: args.top,
            similarity: args.similarity,
            search: args.search,
            fuzzy: args.fuzzy,
            ..AnalysisOptions::default()
        };
        let analysis = report::analyze(&catalog, &options);

        match args.format {
            ReportFormat::Json => print_json(&analysis),
            ReportFormat::Text => {
                self.display_analysis(&analysis);
                Ok(())
            }
        }
    }

    pub fn insights(&self, args: InsightsArgs) -> Result<()> {
        let catalog = self.load_catalog()?;
        let insights = report::insights(&catalog, args.top);

        match args.format {
            ReportFormat::Json => print_json(&insights),
            ReportFormat::Text => {
                self.display_insights(&insights);
                Ok(())
            }
        }
    }

    /// Returns whether the catalog passed every check.
    pub fn verify(&self, args: VerifyArgs) -> Result<bool> {
        self.ui.print_header("Catalog Verification");

        let catalog = self.load_catalog()?;
        let roots = vec![
            root_prefix(&self.config.scan.source_root),
            root_prefix(&self.config.scan.config_root),
        ];
        let options = VerifyOptions {
            expect_total: args.expect_total,
            expect_config: args.expect_config,
        };
        let outcome = report::verify(&catalog, &roots, &options);

        for violation in &outcome.violations {
            self.ui.print_error(&violation.to_string());
        }
        for mismatch in &outcome.mismatches {
            self.ui.print_error(&format!(
                "Expected {} {}, found {}",
                mismatch.expected, mismatch.what, mismatch.actual
            ));
        }

        if outcome.passed() {
            self.ui.print_success(&format!("{} concepts verified", outcome.total));
        } else {
            self.ui.print_error(&format!("{} check(s) failed", outcome.failure_count()));
        }
        Ok(outcome.passed())
    }

    pub fn show_config(&self) -> Result<()> {
        self.ui.print_header("Configuration");
        let text = self.config.to_toml().context("Failed to serialize configuration")?;
        println!("{}", text);
        self.ui.print_info(&format!("Catalog path: {}", self.output_path.display()));
        Ok(())
    }

    fn load_catalog(&self) -> Result<Catalog> {
        let catalog = Catalog::load(&self.output_path)?;
        if self.verbose {
            self.ui.print_info(&format!(
                "Loaded {} concepts from {}",
                catalog.len(),
                self.output_path.display()
            ));
        }
        Ok(catalog)
    }

    fn display_analysis(&self, analysis: &AnalysisReport) {
        self.ui.print_header("Concept Catalog Analysis");
        self.ui.print_info(&format!("Total concepts loaded: {}", analysis.total));

        self.ui.print_counts("Concepts by type", &analysis.by_kind);
        self.ui.print_counts("Top modules by concept count", &analysis.modules);

        self.ui.print_section("Configuration");
        self.ui.print_info(&format!("Total configuration concepts: {}", analysis.config.total));
        self.ui.print_counts("Top configuration files", &analysis.config.files);

        self.ui.print_section("Overloaded concept names (same name, several locations)");
        if analysis.overloaded.is_empty() {
            self.ui.print_info("No overloaded concept names found.");
        } else {
            self.ui.print_info(&format!("Found {} overloaded concept names", analysis.overloaded_total));
            for entry in &analysis.overloaded {
                self.ui.print_info(&format!(
                    "\n'{}' appears in {} locations:",
                    entry.name.bold(),
                    entry.sources.len()
                ));
                for source in entry.sources.iter().take(OVERLOAD_SOURCES_SHOWN) {
                    self.ui.print_info(&format!("  - {}", source));
                }
                if entry.sources.len() > OVERLOAD_SOURCES_SHOWN {
                    self.ui.print_info(&format!(
                        "  ... and {} more",
                        entry.sources.len() - OVERLOAD_SOURCES_SHOWN
                    ));
                }
            }
        }

        self.ui.print_section("Similar concept names (potential redundancies)");
        for group in &analysis.similar {
            self.ui.print_info(&format!("\n'{}'", group.name.bold()));
            for (name, ratio) in group.matches.iter().take(SIMILAR_SHOWN) {
                self.ui.print_info(&format!("  -> '{}' (similarity: {:.2})", name, ratio));
            }
        }
        if analysis.similar_total > analysis.similar.len() {
            self.ui.print_info(&format!(
                "\n... and {} more similar groups",
                analysis.similar_total - analysis.similar.len()
            ));
        }

        if let Some(search) = &analysis.search {
            let mode = if search.fuzzy { "fuzzy-matching" } else { "matching" };
            self.ui.print_section(&format!("Concepts {} '{}'", mode, search.keyword));
            self.ui.print_info(&format!("Found {} matches\n", search.total));
            for record in &search.records {
                self.ui.print_info(&format!("Concept: {}", record.concept.bold()));
                self.ui.print_info(&format!("  Description: {}", preview(&record.description)));
                self.ui.print_info(&format!("  Source: {}", record.source.dimmed()));
            }
            if search.total > search.records.len() {
                self.ui.print_info(&format!("... and {} more matches", search.total - search.records.len()));
            }
        }
    }

    fn display_insights(&self, insights: &InsightsReport) {
        self.ui.print_header("Catalog Insights");
        self.ui.print_counts("Most common words in concept names", &insights.common_words);
        self.ui.print_counts("Files with most concepts", &insights.busiest_files);
        self.ui.print_counts("Most complex configuration files", &insights.complex_configs);
        self.ui.print_counts("Naming patterns worth standardizing", &insights.naming_patterns);
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

fn preview(text: &str) -> String {
    text.chars().take(DESCRIPTION_PREVIEW).collect()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report to JSON")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/pkg")).unwrap();
        fs::create_dir_all(dir.path().join("conf")).unwrap();
        fs::write(dir.path().join("src/pkg/agent.py"), "class Agent:\n    pass\n").unwrap();
        fs::write(dir.path().join("conf/run.yaml"), "seed: 1\n").unwrap();
        dir
    }

    fn app(dir: &TempDir, extra: &[&str]) -> CliApp {
        let repo = dir.path().to_string_lossy().into_owned();
        let mut args = vec!["ontoscan", "--repo", repo.as_str(), "--no-color"];
        args.extend_from_slice(extra);
        CliApp::new(&Cli::try_parse_from(args).unwrap()).unwrap()
    }

    #[test]
    fn test_extract_then_verify() {
        let dir = fixture();
        let app = app(&dir, &[]);
        app.extract(ExtractArgs { no_progress: true }).unwrap();
        assert!(app.output_path().is_file());

        let passed = app
            .verify(VerifyArgs {
                expect_total: Some(2),
                expect_config: Some(1),
            })
            .unwrap();
        assert!(passed);

        let failed = app
            .verify(VerifyArgs {
                expect_total: Some(5),
                expect_config: None,
            })
            .unwrap();
        assert!(!failed);
    }

    #[test]
    fn test_reports_require_catalog() {
        let dir = fixture();
        let app = app(&dir, &[]);
        let err = app.verify(VerifyArgs::default()).unwrap_err();
        assert!(err.to_string().contains("ontoscan extract"));
    }

    #[test]
    fn test_output_flag_overrides_config() {
        let dir = fixture();
        let target = dir.path().join("out/catalog.json");
        let target_arg = target.to_string_lossy().into_owned();
        let app = app(&dir, &["--output", target_arg.as_str()]);
        app.extract(ExtractArgs { no_progress: true }).unwrap();
        assert!(target.is_file());
        assert!(!dir.path().join("ontology_concepts.json").exists());
    }
}
