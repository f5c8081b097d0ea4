//! Requirement-to-test coverage and validation
//!
//! Requirements and manual test protocols are YAML documents. Automated tests
//! are discovered in source code. A review cross-references them, reports
//! defects, and computes which requirements are covered by at least one test.

pub mod domain;
pub use domain::{Config, Issue, IssueKind, Severity};

/// The review engine.
pub mod engine;
pub use engine::{CoverageResult, Input, Report, Verdict, review};

/// Filesystem storage and discovery.
pub mod storage;
pub use storage::Project;
