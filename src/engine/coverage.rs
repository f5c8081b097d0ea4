//! Requirement-to-test coverage.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::instrument;

use crate::{domain::TestKind, engine::resolver::CrossReferenceGraph};

/// Whether a requirement is verified by at least one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    /// At least one test verifies the requirement.
    Covered,
    /// No test verifies the requirement.
    Uncovered,
}

/// A test that verifies a requirement.
///
/// Ordered by id, then kind, so automated and manual tests sharing an id have
/// a stable order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct VerifyingTest {
    /// The test's identifier.
    pub id: String,
    /// Automated or manual.
    pub kind: TestKind,
}

/// Coverage of a single active requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementCoverage {
    /// Covered if `tests` is non-empty.
    pub status: CoverageStatus,
    /// Verifying tests, sorted by id.
    pub tests: Vec<VerifyingTest>,
}

/// Coverage of every active requirement, keyed and ordered by requirement id.
///
/// Obsolete requirements are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CoverageResult {
    entries: BTreeMap<String, RequirementCoverage>,
}

impl CoverageResult {
    /// Compute coverage from the resolved graph.
    ///
    /// Only the first-loaded definition of each requirement id is accounted
    /// for; later duplicates never receive edges.
    #[must_use]
    #[instrument(level = "debug", skip_all)]
    pub fn compute(graph: &CrossReferenceGraph<'_>) -> Self {
        let mut entries = BTreeMap::new();
        for (position, entry) in graph.requirements().iter().enumerate() {
            if entry.item.is_obsolete() || !graph.is_canonical(position) {
                continue;
            }
            let tests: BTreeSet<VerifyingTest> = graph
                .verifiers(position)
                .map(|test| {
                    let item = graph.tests()[test].item;
                    VerifyingTest {
                        id: item.id().to_string(),
                        kind: item.kind(),
                    }
                })
                .collect();
            let status = if tests.is_empty() {
                tracing::debug!("{} has no tests", entry.item.id());
                CoverageStatus::Uncovered
            } else {
                CoverageStatus::Covered
            };
            entries.insert(
                entry.item.id().to_string(),
                RequirementCoverage {
                    status,
                    tests: tests.into_iter().collect(),
                },
            );
        }
        Self { entries }
    }

    /// Coverage of the requirement with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RequirementCoverage> {
        self.entries.get(id)
    }

    /// All entries, ordered by requirement id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RequirementCoverage)> {
        self.entries.iter().map(|(id, coverage)| (id.as_str(), coverage))
    }

    /// Ids of requirements no test verifies, in order.
    pub fn uncovered(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, coverage)| coverage.status == CoverageStatus::Uncovered)
            .map(|(id, _)| id)
    }

    /// Number of active requirements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no active requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of covered requirements.
    #[must_use]
    pub fn covered_count(&self) -> usize {
        self.len() - self.uncovered().count()
    }

    /// Whether every active requirement is covered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.uncovered().next().is_none()
    }
}
