use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    domain::{Config, Issue, IssueKind, Severity},
    engine::coverage::CoverageResult,
};

/// The overall outcome of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// No errors and every active requirement is covered.
    Pass,
    /// At least one error, or at least one uncovered requirement.
    Fail,
}

/// Options controlling how a review is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewOptions {
    /// Issue kinds removed from the report before the verdict is computed.
    pub ignore: BTreeSet<IssueKind>,
}

impl From<&Config> for ReviewOptions {
    fn from(config: &Config) -> Self {
        Self {
            ignore: config.ignore.iter().copied().collect(),
        }
    }
}

/// The combined result of validation and coverage analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    verdict: Verdict,
    issues: Vec<Issue>,
    coverage: CoverageResult,
}

impl Report {
    /// Combine validator issues and coverage into a report.
    ///
    /// The verdict fails if any issue is an error or any active requirement
    /// is uncovered. Warnings never fail it.
    #[must_use]
    pub fn assemble(issues: Vec<Issue>, coverage: CoverageResult) -> Self {
        let verdict = if issues.iter().any(Issue::is_error) || !coverage.is_complete() {
            Verdict::Fail
        } else {
            Verdict::Pass
        };
        Self {
            verdict,
            issues,
            coverage,
        }
    }

    /// Like [`Report::assemble`], but drops issues of the ignored kinds
    /// first.
    #[must_use]
    pub fn assemble_with(
        issues: Vec<Issue>,
        coverage: CoverageResult,
        options: &ReviewOptions,
    ) -> Self {
        let issues = issues
            .into_iter()
            .filter(|issue| !options.ignore.contains(&issue.kind))
            .collect();
        Self::assemble(issues, coverage)
    }

    /// The overall verdict.
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Whether the review passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Issues, in check order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Coverage of the active requirements.
    #[must_use]
    pub const fn coverage(&self) -> &CoverageResult {
        &self.coverage
    }

    /// Number of issues with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Location;

    fn warning() -> Issue {
        Issue::warning(
            IssueKind::EmptyStepSequence,
            Location::new(None, "TEST-1"),
            "manual test has no steps",
        )
    }

    fn error() -> Issue {
        Issue::error(
            IssueKind::DanglingVerifiesReference,
            Location::new(None, "t1"),
            "test verifies non-existent requirement REQ-999",
        )
    }

    #[test]
    fn warnings_do_not_fail() {
        let report = Report::assemble(vec![warning()], CoverageResult::default());
        assert!(report.passed());
        assert_eq!(report.count(Severity::Warning), 1);
    }

    #[test]
    fn errors_fail() {
        let report = Report::assemble(vec![warning(), error()], CoverageResult::default());
        assert_eq!(report.verdict(), Verdict::Fail);
        assert_eq!(report.count(Severity::Error), 1);
    }

    #[test]
    fn ignored_errors_do_not_fail() {
        let options = ReviewOptions {
            ignore: [IssueKind::DanglingVerifiesReference].into(),
        };
        let report = Report::assemble_with(vec![error()], CoverageResult::default(), &options);
        assert!(report.passed());
        assert!(report.issues().is_empty());
    }
}
