pub mod pyrepr;
pub mod python;
pub mod traits;
pub mod yaml;

pub use python::PythonAnalyzer;
pub use traits::ConceptAnalyzer;
pub use yaml::YamlAnalyzer;
