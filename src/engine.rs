//! The coverage and validation engine.
//!
//! A pure, synchronous transform: parsed documents and discovered tests go in,
//! a [`Report`] comes out. Nothing is shared between reviews.
//!
//! ```
//! use vmatrix::{
//!     domain::{DocumentMeta, RequirementItem, RequirementsDoc, TestItem},
//!     engine::{self, Input},
//! };
//!
//! let input = Input {
//!     requirements: vec![RequirementsDoc::flat(
//!         DocumentMeta::new("Software Requirements"),
//!         vec![RequirementItem::new("REQ-001", "The system shall add", "Users add")],
//!     )],
//!     automated: vec![TestItem::automated("test_add", "Adds numbers", ["REQ-001"])],
//!     ..Input::default()
//! };
//!
//! let report = engine::review(&input);
//! assert!(report.passed());
//! ```

/// Requirement-to-test coverage.
pub mod coverage;
mod report;
/// Reference resolution into a cross-reference graph.
pub mod resolver;
/// Document checks.
pub mod validator;

pub use coverage::{CoverageResult, CoverageStatus, RequirementCoverage, VerifyingTest};
pub use report::{Report, ReviewOptions, Verdict};
pub use resolver::CrossReferenceGraph;

use tracing::instrument;

use crate::domain::{RequirementsDoc, TestItem, TestsDoc};

/// Everything a review consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Input {
    /// Requirements documents, in load order.
    pub requirements: Vec<RequirementsDoc>,
    /// Manual test protocols, in load order.
    pub protocols: Vec<TestsDoc>,
    /// Automated tests discovered in code.
    pub automated: Vec<TestItem>,
}

/// Review the input with default options.
#[must_use]
pub fn review(input: &Input) -> Report {
    review_with(input, &ReviewOptions::default())
}

/// Resolve references, validate, compute coverage and assemble the report.
#[must_use]
#[instrument(level = "debug", skip_all)]
pub fn review_with(input: &Input, options: &ReviewOptions) -> Report {
    let graph = CrossReferenceGraph::resolve(input);
    let issues = validator::validate(&graph);
    let coverage = CoverageResult::compute(&graph);
    let report = Report::assemble_with(issues, coverage, options);
    tracing::info!(
        verdict = ?report.verdict(),
        issues = report.issues().len(),
        requirements = report.coverage().len(),
        covered = report.coverage().covered_count(),
        "review complete"
    );
    report
}
