/// Project discovery and loading.
pub mod project;
/// Automated test discovery.
pub mod scanner;
pub mod yaml;

pub use project::{Project, ProjectLoadError};
pub use scanner::ScanError;
pub use yaml::{LoadError, load_requirements, load_tests};
