use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use super::{rank, CountEntry};
use crate::storage::{source_file, Catalog};
use crate::types::ConceptKind;

static LETTER_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").expect("letter pattern is valid"));

const MIN_WORD_CHARS: usize = 4;

/// Substrings worth standardizing, with the label they are reported under.
const NAMING_PATTERNS: [(&str, &str); 4] = [
    ("Matching", "match"),
    ("Logger/Logging", "log"),
    ("Module", "module"),
    ("Handler", "handler"),
];

#[derive(Debug, Clone, Serialize)]
pub struct InsightsReport {
    pub common_words: Vec<CountEntry>,
    pub busiest_files: Vec<CountEntry>,
    pub complex_configs: Vec<CountEntry>,
    pub naming_patterns: Vec<CountEntry>,
}

pub fn insights(catalog: &Catalog, top: usize) -> InsightsReport {
    InsightsReport {
        common_words: common_words(catalog, top),
        busiest_files: busiest_files(catalog, top),
        complex_configs: complex_configs(catalog, top),
        naming_patterns: naming_patterns(catalog),
    }
}

/// Lowercased words of the last path segment of a name, split on case
/// changes and non-letters. Short words are dropped.
pub fn split_words(name: &str) -> Vec<String> {
    let last = name.rsplit('/').next().unwrap_or(name);
    let mut words = Vec::new();

    for run in LETTER_RUNS.find_iter(last) {
        let chars: Vec<char> = run.as_str().chars().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let boundary = chars[i].is_ascii_uppercase()
                && (chars[i - 1].is_ascii_lowercase()
                    || (chars[i - 1].is_ascii_uppercase()
                        && chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase())));
            if boundary {
                words.push(chars[start..i].iter().collect::<String>());
                start = i;
            }
        }
        words.push(chars[start..].iter().collect::<String>());
    }

    words
        .into_iter()
        .filter(|word| word.chars().count() >= MIN_WORD_CHARS)
        .map(|word| word.to_lowercase())
        .collect()
}

pub fn common_words(catalog: &Catalog, top: usize) -> Vec<CountEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in catalog.records() {
        for word in split_words(&record.concept) {
            *counts.entry(word).or_default() += 1;
        }
    }
    rank(counts, Some(top))
}

/// Files contributing the most records; configuration keys count toward
/// their file.
pub fn busiest_files(catalog: &Catalog, top: usize) -> Vec<CountEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in catalog.records() {
        *counts.entry(source_file(&record.source).to_string()).or_default() += 1;
    }
    rank(counts, Some(top))
}

pub fn complex_configs(catalog: &Catalog, top: usize) -> Vec<CountEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in catalog.of_kind(ConceptKind::Config) {
        *counts.entry(source_file(&record.source).to_string()).or_default() += 1;
    }
    rank(counts, Some(top))
}

/// Fixed order, one entry per pattern even when nothing matches.
pub fn naming_patterns(catalog: &Catalog) -> Vec<CountEntry> {
    let lowered: Vec<String> = catalog.records().iter().map(|r| r.concept.to_lowercase()).collect();
    NAMING_PATTERNS
        .iter()
        .map(|(label, needle)| CountEntry::new(*label, lowered.iter().filter(|name| name.contains(needle)).count()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConceptRecord;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("EvidenceGraphMatcher"), vec!["evidence", "graph", "matcher"]);
        assert_eq!(split_words("HTTPServerHandler"), vec!["http", "server", "handler"]);
        assert_eq!(split_words("exp/logging/log_level"), vec!["level"]);
        assert_eq!(split_words("MAX_STEPS"), vec!["steps"]);
        assert!(split_words("run").is_empty());
        assert_eq!(split_words("step"), vec!["step"]);
    }

    fn catalog() -> Catalog {
        Catalog::from_records(vec![
            ConceptRecord::new("GraphMatcher", "Class:", "src/pkg/graph.py"),
            ConceptRecord::new("match_graphs", "Function:", "src/pkg/graph.py"),
            ConceptRecord::new("LogHandler", "Class:", "src/pkg/logs.py"),
            ConceptRecord::new("run/logging", "Config: Configuration group with keys: level", "conf/run.yaml/logging"),
            ConceptRecord::new("run/logging/level", "Config: Configuration value = 'INFO'", "conf/run.yaml/logging/level"),
            ConceptRecord::new("sweep/module", "Config: Configuration value = 'a'", "conf/sweep.yaml/module"),
        ])
    }

    #[test]
    fn test_common_words() {
        let words = common_words(&catalog(), 3);
        assert_eq!(
            words,
            vec![
                CountEntry::new("graph", 1),
                CountEntry::new("graphs", 1),
                CountEntry::new("handler", 1),
            ]
        );
    }

    #[test]
    fn test_file_rankings() {
        let catalog = catalog();
        assert_eq!(
            busiest_files(&catalog, 2),
            vec![CountEntry::new("conf/run.yaml", 2), CountEntry::new("src/pkg/graph.py", 2)]
        );
        assert_eq!(
            complex_configs(&catalog, 5),
            vec![CountEntry::new("conf/run.yaml", 2), CountEntry::new("conf/sweep.yaml", 1)]
        );
    }

    #[test]
    fn test_naming_patterns() {
        let patterns = naming_patterns(&catalog());
        assert_eq!(
            patterns,
            vec![
                CountEntry::new("Matching", 2),
                CountEntry::new("Logger/Logging", 3),
                CountEntry::new("Module", 1),
                CountEntry::new("Handler", 1),
            ]
        );
    }
}
