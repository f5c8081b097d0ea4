use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::domain::IssueKind;

/// The name of the configuration file looked up when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "vmatrix.toml";

/// Configuration for a verification review.
///
/// Values given on the command line take precedence over these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct Config {
    /// Directories searched recursively for `requirements.yaml` and
    /// `tests.yaml` documents.
    pub docs_dirs: Vec<PathBuf>,

    /// Directories searched recursively for automated test files.
    pub test_dirs: Vec<PathBuf>,

    /// Issue kinds to suppress from the report.
    pub ignore: Vec<IssueKind>,

    /// Glob patterns identifying automated test files by name.
    pub test_file_patterns: Vec<Pattern>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dirs: default_dirs(),
            test_dirs: default_dirs(),
            ignore: Vec::new(),
            test_file_patterns: compile_patterns(default_test_file_patterns())
                .expect("this must never fail"),
        }
    }
}

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("failed to access config file {}", path.display())]
    Io {
        /// The config file path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The config file already exists.
    #[error("config file {} already exists", path.display())]
    Exists {
        /// The config file path.
        path: PathBuf,
    },
    /// The file is not valid configuration.
    #[error("failed to parse config file {}", path.display())]
    Parse {
        /// The config file path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: toml::de::Error,
    },
    /// The configuration could not be serialized.
    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration from `path` if given, otherwise from
    /// [`DEFAULT_CONFIG_FILE`] in the working directory if it exists.
    ///
    /// A missing default file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, or any file that is
    /// found cannot be parsed.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            tracing::info!("Loading config file {}", default_path.display());
            Self::load(default_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes this configuration to a new file, refusing to overwrite one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Exists`] if the file is already there, or any
    /// error [`Config::save`] returns.
    pub fn init(&self, path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::Exists {
                path: path.to_path_buf(),
            });
        }
        self.save(path)?;
        tracing::info!("Wrote config file {}", path.display());
        Ok(())
    }

    /// Whether the given file name matches one of the automated test file
    /// patterns.
    #[must_use]
    pub fn is_test_file(&self, file_name: &str) -> bool {
        self.test_file_patterns
            .iter()
            .any(|pattern| pattern.matches(file_name))
    }
}

fn default_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_test_file_patterns() -> Vec<String> {
    vec!["test_*.py".to_string(), "*_test.py".to_string()]
}

fn compile_patterns(patterns: Vec<String>) -> Result<Vec<Pattern>, InvalidPattern> {
    patterns
        .into_iter()
        .map(|pattern| {
            Pattern::new(&pattern).map_err(|source| InvalidPattern { pattern, source })
        })
        .collect()
}

/// A test file pattern that is not a valid glob.
#[derive(Debug, thiserror::Error)]
#[error("invalid test file pattern '{pattern}': {source}")]
pub struct InvalidPattern {
    /// The pattern as written.
    pub pattern: String,
    /// Why it failed to compile.
    pub source: glob::PatternError,
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1(V1),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct V1 {
    #[serde(default = "default_dirs")]
    docs_dirs: Vec<PathBuf>,

    #[serde(default = "default_dirs")]
    test_dirs: Vec<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ignore: Vec<IssueKind>,

    #[serde(default = "default_test_file_patterns")]
    test_file_patterns: Vec<String>,
}

impl TryFrom<Versions> for Config {
    type Error = InvalidPattern;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1(V1 {
                docs_dirs,
                test_dirs,
                ignore,
                test_file_patterns,
            }) => Ok(Self {
                docs_dirs,
                test_dirs,
                ignore,
                test_file_patterns: compile_patterns(test_file_patterns)?,
            }),
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1(V1 {
            docs_dirs: config.docs_dirs,
            test_dirs: config.test_dirs,
            ignore: config.ignore,
            test_file_patterns: config
                .test_file_patterns
                .iter()
                .map(|pattern| pattern.as_str().to_string())
                .collect(),
        })
    }
}
