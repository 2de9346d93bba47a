pub mod concept;
pub mod errors;

pub use concept::{ConceptKind, ConceptRecord, DescriptionBuilder};
pub use errors::{OntoscanError, Result};
