use crate::types::{ConceptRecord, Result};

/// Turns the contents of one file into catalog records.
///
/// `relative_path` is the forward-slash path of the file below the
/// repository root and becomes the base of every record's `source`.
/// A file that cannot be parsed is an error; callers skip it.
pub trait ConceptAnalyzer {
    fn language(&self) -> &'static str;

    fn extract(&self, relative_path: &str, content: &str) -> Result<Vec<ConceptRecord>>;
}
