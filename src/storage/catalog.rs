use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::pyrepr;
use crate::types::{ConceptKind, ConceptRecord, OntoscanError, Result};

const CONFIG_FILE_SUFFIXES: [&str; 2] = [".yaml", ".yml"];

/// The ordered record list of one extraction run, with lookup indexes.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<ConceptRecord>,

    name_index: HashMap<String, Vec<usize>>,
    kind_index: HashMap<ConceptKind, Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    EmptyField(&'static str),
    UnknownKind(String),
    PrivateName,
    OutsideRoots,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub index: usize,
    pub concept: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let problem = match &self.kind {
            ViolationKind::EmptyField(field) => format!("empty field '{}'", field),
            ViolationKind::UnknownKind(prefix) => format!("unrecognized kind prefix '{}'", prefix),
            ViolationKind::PrivateName => "private name in code record".to_string(),
            ViolationKind::OutsideRoots => "source outside configured roots".to_string(),
        };
        write!(f, "#{} '{}': {}", self.index, self.concept, problem)
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ConceptRecord>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            catalog.push(record);
        }
        catalog
    }

    pub fn push(&mut self, record: ConceptRecord) {
        let index = self.records.len();
        self.name_index.entry(record.concept.clone()).or_default().push(index);
        if let Some(kind) = record.kind() {
            self.kind_index.entry(kind).or_default().push(index);
        }
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = ConceptRecord>) {
        for record in records {
            self.push(record);
        }
    }

    pub fn records(&self) -> &[ConceptRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record with exactly this concept name, in catalog order.
    pub fn find_by_name(&self, name: &str) -> Vec<&ConceptRecord> {
        self.name_index
            .get(name)
            .map(|indices| indices.iter().filter_map(|&i| self.records.get(i)).collect())
            .unwrap_or_default()
    }

    pub fn of_kind(&self, kind: ConceptKind) -> Vec<&ConceptRecord> {
        self.kind_index
            .get(&kind)
            .map(|indices| indices.iter().filter_map(|&i| self.records.get(i)).collect())
            .unwrap_or_default()
    }

    pub fn count_kind(&self, kind: ConceptKind) -> usize {
        self.kind_index.get(&kind).map_or(0, Vec::len)
    }

    /// Names that occur more than once, with their record indices.
    pub fn overloaded_names(&self) -> Vec<(&str, &[usize])> {
        self.name_index
            .iter()
            .filter(|(_, indices)| indices.len() > 1)
            .map(|(name, indices)| (name.as_str(), indices.as_slice()))
            .collect()
    }

    /// Records whose concept or description matches `pattern`, in catalog order.
    pub fn search(&self, pattern: &str, limit: usize) -> Vec<&ConceptRecord> {
        let regex = compile_if_regex(pattern);
        self.records
            .iter()
            .filter(|record| {
                matches_pattern(&record.concept, pattern, regex.as_ref())
                    || matches_pattern(&record.description, pattern, regex.as_ref())
            })
            .take(limit)
            .collect()
    }

    /// Fuzzy match over concept names, best score first.
    pub fn fuzzy_search(&self, query: &str, limit: usize) -> Vec<(&ConceptRecord, i64)> {
        let matcher = SkimMatcherV2::default();
        let mut results: Vec<(&ConceptRecord, i64)> = self
            .records
            .iter()
            .filter_map(|record| matcher.fuzzy_match(&record.concept, query).map(|score| (record, score)))
            .collect();

        results.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.concept.cmp(&b.0.concept)));
        results.truncate(limit);
        results
    }

    /// Check the catalog invariants. `roots` are the forward-slash scan roots.
    pub fn validate(&self, roots: &[String]) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (index, record) in self.records.iter().enumerate() {
            let mut report = |kind: ViolationKind| {
                violations.push(Violation {
                    index,
                    concept: record.concept.clone(),
                    kind,
                });
            };

            for (field, value) in [
                ("concept", &record.concept),
                ("description", &record.description),
                ("source", &record.source),
            ] {
                if value.is_empty() {
                    report(ViolationKind::EmptyField(field));
                }
            }

            match record.kind() {
                Some(kind) => {
                    if kind.is_code() && kind != ConceptKind::Module && !pyrepr::is_public_name(&record.concept) {
                        report(ViolationKind::PrivateName);
                    }
                }
                None => {
                    let prefix = record.description.split(':').next().unwrap_or_default();
                    report(ViolationKind::UnknownKind(prefix.to_string()));
                }
            }

            let inside = roots
                .iter()
                .any(|root| record.source.starts_with(&format!("{}/", root)));
            if !inside {
                report(ViolationKind::OutsideRoots);
            }
        }

        violations
    }

    /// Replace the catalog file in one step: write a sibling temp file, then rename.
    pub fn save(&self, path: &Path, pretty: bool) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        if pretty {
            serde_json::to_writer_pretty(&mut temp, &self.records)?;
        } else {
            serde_json::to_writer(&mut temp, &self.records)?;
        }
        temp.write_all(b"\n")?;
        temp.flush()?;
        temp.persist(path).map_err(|e| OntoscanError::Io(e.error))?;

        info!("Saved {} concepts to {}", self.records.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(OntoscanError::CatalogMissing(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let records: Vec<ConceptRecord> = serde_json::from_str(&content)?;
        debug!("Loaded {} concepts from {}", records.len(), path.display());
        Ok(Self::from_records(records))
    }
}

/// The file part of a source locator; configuration records append a key path
/// after the file name.
pub fn source_file(source: &str) -> &str {
    let mut offset = 0;
    for segment in source.split('/') {
        let base = segment.split('[').next().unwrap_or(segment);
        if CONFIG_FILE_SUFFIXES.iter().any(|suffix| base.ends_with(suffix)) {
            return &source[..offset + base.len()];
        }
        offset += segment.len() + 1;
    }
    source
}

fn compile_if_regex(pattern: &str) -> Option<Regex> {
    if pattern.contains(['*', '^', '$', '[', ']', '(', ')', '{', '}', '|', '+', '?', '\\']) {
        Regex::new(pattern).ok()
    } else {
        None
    }
}

fn matches_pattern(text: &str, pattern: &str, regex: Option<&Regex>) -> bool {
    if text == pattern {
        return true;
    }

    if let Some(regex) = regex {
        return regex.is_match(text);
    }

    text.to_lowercase().contains(&pattern.to_lowercase())
}
