use serde::Serialize;

use crate::storage::{Catalog, Violation};
use crate::types::ConceptKind;

#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub expect_total: Option<usize>,
    pub expect_config: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub what: &'static str,
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub total: usize,
    pub violations: Vec<Violation>,
    pub mismatches: Vec<CountMismatch>,
}

impl VerifyOutcome {
    pub fn passed(&self) -> bool {
        self.violations.is_empty() && self.mismatches.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.violations.len() + self.mismatches.len()
    }
}

pub fn verify(catalog: &Catalog, roots: &[String], options: &VerifyOptions) -> VerifyOutcome {
    let mut mismatches = Vec::new();

    let checks = [
        ("total concepts", options.expect_total, catalog.len()),
        ("config concepts", options.expect_config, catalog.count_kind(ConceptKind::Config)),
    ];
    for (what, expected, actual) in checks {
        if let Some(expected) = expected {
            if expected != actual {
                mismatches.push(CountMismatch { what, expected, actual });
            }
        }
    }

    VerifyOutcome {
        total: catalog.len(),
        violations: catalog.validate(roots),
        mismatches,
    }
}
