pub mod catalog;

pub use catalog::{source_file, Catalog, Violation, ViolationKind};
