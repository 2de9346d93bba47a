//! Aggregate views over a saved catalog.
//!
//! Every function here is pure: it reads a [`Catalog`](crate::storage::Catalog)
//! and returns plain data, leaving rendering to the command layer. Rankings
//! break count ties by label so repeated runs print identical output.

pub mod analysis;
pub mod insights;
pub mod verify;

use serde::Serialize;
use std::collections::HashMap;

pub use analysis::{analyze, AnalysisOptions, AnalysisReport, ConfigSummary, OverloadedName, SimilarGroup};
pub use insights::{insights, split_words, InsightsReport};
pub use verify::{verify, CountMismatch, VerifyOptions, VerifyOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub label: String,
    pub count: usize,
}

impl CountEntry {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Highest count first, then by label; `top` caps the result.
pub(crate) fn rank(counts: HashMap<String, usize>, top: Option<usize>) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(label, count)| CountEntry { label, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    if let Some(top) = top {
        entries.truncate(top);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_breaks_ties_by_label() {
        let counts = HashMap::from([
            ("b".to_string(), 2),
            ("a".to_string(), 2),
            ("c".to_string(), 5),
            ("d".to_string(), 1),
        ]);
        let ranked = rank(counts, Some(3));
        assert_eq!(
            ranked,
            vec![CountEntry::new("c", 5), CountEntry::new("a", 2), CountEntry::new("b", 2)]
        );
    }
}
