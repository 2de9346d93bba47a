pub mod discovery;

pub use discovery::{relative_slash_path, root_prefix, DiscoveredFile, FileRole, RepositoryScanner, ScanResult};
