use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::{rank, CountEntry};
use crate::storage::{source_file, Catalog};
use crate::types::{ConceptKind, ConceptRecord};

const MODULE_DEPTH: usize = 3;

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub top: usize,
    /// Names must be strictly more similar than this to be grouped.
    pub similarity: f64,
    pub search: Option<String>,
    /// Rank name matches by fuzzy score instead of pattern matching.
    pub fuzzy: bool,
    pub search_limit: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            top: 20,
            similarity: 0.85,
            search: None,
            fuzzy: false,
            search_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub total: usize,
    pub files: Vec<CountEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverloadedName {
    pub name: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarGroup {
    pub name: String,
    pub matches: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub keyword: String,
    pub fuzzy: bool,
    pub total: usize,
    pub records: Vec<ConceptRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub total: usize,
    pub by_kind: Vec<CountEntry>,
    pub modules: Vec<CountEntry>,
    pub config: ConfigSummary,
    pub overloaded_total: usize,
    pub overloaded: Vec<OverloadedName>,
    pub similar_total: usize,
    pub similar: Vec<SimilarGroup>,
    pub search: Option<SearchResult>,
}

pub fn analyze(catalog: &Catalog, options: &AnalysisOptions) -> AnalysisReport {
    let overloaded = overloaded_names(catalog);
    let similar = similar_names(catalog, options.similarity);
    let search = options.search.as_deref().map(|keyword| {
        let matches: Vec<&ConceptRecord> = if options.fuzzy {
            catalog
                .fuzzy_search(keyword, usize::MAX)
                .into_iter()
                .map(|(record, _)| record)
                .collect()
        } else {
            catalog.search(keyword, usize::MAX)
        };
        SearchResult {
            keyword: keyword.to_string(),
            fuzzy: options.fuzzy,
            total: matches.len(),
            records: matches.into_iter().take(options.search_limit).cloned().collect(),
        }
    });

    AnalysisReport {
        total: catalog.len(),
        by_kind: kind_counts(catalog),
        modules: module_counts(catalog, options.top),
        config: config_summary(catalog, options.top),
        overloaded_total: overloaded.len(),
        overloaded: overloaded.into_iter().take(options.top).collect(),
        similar_total: similar.len(),
        similar: similar.into_iter().take(options.top).collect(),
        search,
    }
}

/// Record counts per description prefix, unrecognized prefixes included.
pub fn kind_counts(catalog: &Catalog) -> Vec<CountEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in catalog.records() {
        if let Some((prefix, _)) = record.description.split_once(':') {
            *counts.entry(prefix.to_string()).or_default() += 1;
        }
    }
    rank(counts, None)
}

/// Record counts per leading path components of the source file; the key
/// path of configuration locators is not part of a module.
pub fn module_counts(catalog: &Catalog, top: usize) -> Vec<CountEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in catalog.records() {
        let parts: Vec<&str> = source_file(&record.source)
            .split('/')
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 2 {
            continue;
        }
        let module = parts[..parts.len().min(MODULE_DEPTH)].join("/");
        *counts.entry(module).or_default() += 1;
    }
    rank(counts, Some(top))
}

pub fn config_summary(catalog: &Catalog, top: usize) -> ConfigSummary {
    let configs = catalog.of_kind(ConceptKind::Config);
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in &configs {
        *counts.entry(source_file(&record.source).to_string()).or_default() += 1;
    }

    ConfigSummary {
        total: configs.len(),
        files: rank(counts, Some(top)),
    }
}

/// Names recorded more than once, most occurrences first.
pub fn overloaded_names(catalog: &Catalog) -> Vec<OverloadedName> {
    let mut overloaded: Vec<OverloadedName> = catalog
        .overloaded_names()
        .into_iter()
        .map(|(name, indices)| OverloadedName {
            name: name.to_string(),
            sources: indices
                .iter()
                .filter_map(|&i| catalog.records().get(i))
                .map(|record| record.source.clone())
                .collect(),
        })
        .collect();

    overloaded.sort_by(|a, b| {
        b.sources
            .len()
            .cmp(&a.sources.len())
            .then_with(|| a.name.cmp(&b.name))
    });
    overloaded
}

/// Distinct names whose case-insensitive normalized edit similarity exceeds
/// `threshold`, grouped under the earlier name in catalog order.
pub fn similar_names(catalog: &Catalog, threshold: f64) -> Vec<SimilarGroup> {
    let mut seen = HashSet::new();
    let names: Vec<(&str, String)> = catalog
        .records()
        .iter()
        .map(|record| record.concept.as_str())
        .filter(|name| seen.insert(*name))
        .map(|name| (name, name.to_lowercase()))
        .collect();

    let mut groups = Vec::new();
    for (i, (name, lowered)) in names.iter().enumerate() {
        let matches: Vec<(String, f64)> = names[i + 1..]
            .iter()
            .filter_map(|(other, other_lowered)| {
                similarity(lowered, other_lowered, threshold)
                    .filter(|ratio| *ratio > threshold)
                    .map(|ratio| (other.to_string(), ratio))
            })
            .collect();

        if !matches.is_empty() {
            groups.push(SimilarGroup {
                name: name.to_string(),
                matches,
            });
        }
    }
    groups
}

/// `1 - distance / longer length`, or `None` when the length gap alone rules
/// out exceeding `threshold`.
fn similarity(a: &str, b: &str, threshold: f64) -> Option<f64> {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let longest = a_len.max(b_len);
    if longest == 0 {
        return Some(1.0);
    }

    let gap = a_len.abs_diff(b_len) as f64 / longest as f64;
    if gap >= 1.0 - threshold {
        return None;
    }

    let distance = levenshtein::levenshtein(a, b);
    Some(1.0 - distance as f64 / longest as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_records(vec![
            ConceptRecord::new("EvidenceMatcher", "Class: Matches.", "src/tbp/monty/matcher.py"),
            ConceptRecord::new("EvidenceMatchers", "Class:", "src/tbp/monty/other.py"),
            ConceptRecord::new("step", "Method:", "src/tbp/monty/matcher.py"),
            ConceptRecord::new("step", "Function:", "src/tbp/env/runner.py"),
            ConceptRecord::new("step", "Method:", "src/tbp/env/loop.py"),
            ConceptRecord::new("run/logging", "Config: Configuration group with keys: level", "conf/run.yaml/logging"),
            ConceptRecord::new("run/logging/level", "Config: Configuration value = 'INFO'", "conf/run.yaml/logging/level"),
            ConceptRecord::new("exp/seed", "Config: Configuration value = 3", "conf/exp.yml/seed"),
        ])
    }

    #[test]
    fn test_kind_counts() {
        let counts = kind_counts(&catalog());
        assert_eq!(
            counts,
            vec![
                CountEntry::new("Config", 3),
                CountEntry::new("Class", 2),
                CountEntry::new("Method", 2),
                CountEntry::new("Function", 1),
            ]
        );
    }

    #[test]
    fn test_module_counts_use_three_components() {
        let modules = module_counts(&catalog(), 2);
        assert_eq!(
            modules,
            vec![CountEntry::new("src/tbp/monty", 3), CountEntry::new("conf/run.yaml", 2)]
        );
    }

    #[test]
    fn test_config_summary_groups_by_file() {
        let summary = config_summary(&catalog(), 10);
        assert_eq!(summary.total, 3);
        assert_eq!(
            summary.files,
            vec![CountEntry::new("conf/run.yaml", 2), CountEntry::new("conf/exp.yml", 1)]
        );
    }

    #[test]
    fn test_overloaded_names_keep_every_source() {
        let overloaded = overloaded_names(&catalog());
        assert_eq!(overloaded.len(), 1);
        assert_eq!(overloaded[0].name, "step");
        assert_eq!(
            overloaded[0].sources,
            vec!["src/tbp/monty/matcher.py", "src/tbp/env/runner.py", "src/tbp/env/loop.py"]
        );
    }

    #[test]
    fn test_similar_names() {
        let groups = similar_names(&catalog(), 0.85);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "EvidenceMatcher");
        assert_eq!(groups[0].matches.len(), 1);
        assert_eq!(groups[0].matches[0].0, "EvidenceMatchers");
        assert!((groups[0].matches[0].1 - 0.9375).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_prefilter() {
        assert_eq!(similarity("abcd", "abcdefgh", 0.85), None);
        assert_eq!(similarity("abc", "abc", 0.85), Some(1.0));
    }

    #[test]
    fn test_analyze_with_search() {
        let options = AnalysisOptions {
            top: 5,
            search: Some("match".to_string()),
            search_limit: 1,
            ..AnalysisOptions::default()
        };
        let report = analyze(&catalog(), &options);
        assert_eq!(report.total, 8);
        assert_eq!(report.overloaded_total, 1);

        let search = report.search.unwrap();
        assert_eq!(search.total, 2);
        assert_eq!(search.records.len(), 1);
        assert_eq!(search.records[0].concept, "EvidenceMatcher");
    }

    #[test]
    fn test_module_counts_ignore_config_key_paths() {
        let catalog = Catalog::from_records(vec![
            ConceptRecord::new("run/a", "Config: Configuration value = 1", "conf/run.yaml/a"),
            ConceptRecord::new("run/b", "Config: Configuration group with keys: c", "conf/run.yaml/b"),
            ConceptRecord::new("run/b/c", "Config: Configuration value = 2", "conf/run.yaml/b/c"),
            ConceptRecord::new("exp/base/d", "Config: Configuration value = 3", "conf/exp/base.yaml/d/e"),
        ]);
        assert_eq!(
            module_counts(&catalog, 10),
            vec![CountEntry::new("conf/run.yaml", 3), CountEntry::new("conf/exp/base.yaml", 1)]
        );
    }

    #[test]
    fn test_analyze_with_fuzzy_search() {
        let options = AnalysisOptions {
            search: Some("evmatch".to_string()),
            fuzzy: true,
            ..AnalysisOptions::default()
        };
        let search = analyze(&catalog(), &options).search.unwrap();
        assert!(search.fuzzy);
        assert_eq!(search.total, 2);

        let mut names: Vec<&str> = search.records.iter().map(|r| r.concept.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["EvidenceMatcher", "EvidenceMatchers"]);

        let exact = AnalysisOptions {
            search: Some("evmatch".to_string()),
            ..AnalysisOptions::default()
        };
        assert_eq!(analyze(&catalog(), &exact).search.unwrap().total, 0);
    }
}
