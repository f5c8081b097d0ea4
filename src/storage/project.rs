//! A filesystem backed project
//!
//! The [`Project`] gathers everything a review needs from disk: requirements
//! documents and test protocols under the docs directories, and automated
//! tests under the test directories.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::Config,
    engine::Input,
    storage::{
        scanner::{self, ScanError},
        yaml::{self, LoadError},
    },
};

const REQUIREMENTS_STEM: &str = "requirements";
const TESTS_STEM: &str = "tests";
const EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Errors that can occur when loading a project.
#[derive(Debug, thiserror::Error)]
pub enum ProjectLoadError {
    /// A docs directory could not be walked.
    #[error("failed to walk docs directory")]
    Walk(#[from] walkdir::Error),
    /// A document could not be loaded.
    #[error("failed to load {}", path.display())]
    Document {
        /// The offending document.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: LoadError,
    },
    /// Automated tests could not be discovered.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DocumentKind {
    Requirements,
    Tests,
}

impl DocumentKind {
    fn of(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if !EXTENSIONS.contains(&extension) {
            return None;
        }
        match path.file_stem()?.to_str()? {
            REQUIREMENTS_STEM => Some(Self::Requirements),
            TESTS_STEM => Some(Self::Tests),
            _ => None,
        }
    }
}

/// The documents and test code of a project.
#[derive(Debug, Clone)]
pub struct Project {
    docs_dirs: BTreeSet<PathBuf>,
    test_dirs: BTreeSet<PathBuf>,
    config: Config,
}

impl Project {
    /// A project laid out as the configuration describes.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            docs_dirs: config.docs_dirs.iter().cloned().collect(),
            test_dirs: config.test_dirs.iter().cloned().collect(),
            config,
        }
    }

    /// Load every document and discover every automated test.
    ///
    /// Documents are parsed in parallel and returned in path order.
    ///
    /// # Errors
    ///
    /// Fails if a directory cannot be walked, or a document or test file
    /// cannot be read or parsed.
    #[instrument(
        level = "debug",
        skip(self),
        fields(docs = ?self.docs_dirs, tests = ?self.test_dirs)
    )]
    pub fn load(&self) -> Result<Input, ProjectLoadError> {
        let paths = self.collect_document_paths()?;
        tracing::info!("Found {} documents", paths.len());

        let (requirement_paths, test_paths): (Vec<_>, Vec<_>) = paths
            .into_iter()
            .partition(|(_, kind)| *kind == DocumentKind::Requirements);

        let requirements = requirement_paths
            .par_iter()
            .map(|(path, _)| with_path(path, yaml::load_requirements(path)))
            .collect::<Result<Vec<_>, _>>()?;
        let protocols = test_paths
            .par_iter()
            .map(|(path, _)| with_path(path, yaml::load_tests(path)))
            .collect::<Result<Vec<_>, _>>()?;

        let test_dirs: Vec<_> = self.test_dirs.iter().cloned().collect();
        let automated = scanner::discover(&test_dirs, &self.config)?;

        Ok(Input {
            requirements,
            protocols,
            automated,
        })
    }

    fn collect_document_paths(&self) -> Result<BTreeSet<(PathBuf, DocumentKind)>, walkdir::Error> {
        let mut paths = BTreeSet::new();
        for dir in &self.docs_dirs {
            tracing::info!("Looking for documents in {}", dir.display());
            for entry in WalkDir::new(dir) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(kind) = DocumentKind::of(entry.path()) {
                    tracing::debug!("Found {kind:?} document: {}", entry.path().display());
                    paths.insert((entry.into_path(), kind));
                }
            }
        }
        Ok(paths)
    }
}

fn with_path<T>(path: &Path, result: Result<T, LoadError>) -> Result<T, ProjectLoadError> {
    result.map_err(|source| ProjectLoadError::Document {
        path: path.to_path_buf(),
        source,
    })
}
