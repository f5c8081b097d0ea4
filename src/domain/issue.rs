use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// How serious an issue is.
///
/// Only errors fail the overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; never fails the verdict.
    Warning,
    /// Fails the verdict.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// The closed taxonomy of document defects.
///
/// Variants are declared in the order the validator runs its checks. Names
/// parse case-insensitively, from the command line and from configuration
/// alike.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum IssueKind {
    /// The same identifier appears more than once in a namespace.
    DuplicateIdentifier,
    /// A required field is missing or empty.
    MissingRequiredField,
    /// A conditional field is present when it has no meaning.
    RedundantField,
    /// A test verifies a requirement that is not loaded.
    DanglingVerifiesReference,
    /// A requirement's parent is not loaded.
    DanglingParentReference,
    /// A test verifies a retired requirement.
    ObsoleteRequirementVerified,
    /// A manual test has no steps.
    EmptyStepSequence,
    /// A manual step names an unknown evidence kind.
    InvalidEvidenceKind,
}

impl IssueKind {
    /// Every kind, in check order.
    pub const ALL: [Self; 8] = [
        Self::DuplicateIdentifier,
        Self::MissingRequiredField,
        Self::RedundantField,
        Self::DanglingVerifiesReference,
        Self::DanglingParentReference,
        Self::ObsoleteRequirementVerified,
        Self::EmptyStepSequence,
        Self::InvalidEvidenceKind,
    ];

    /// The stable kebab-case name used in configuration and output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DuplicateIdentifier => "duplicate-identifier",
            Self::MissingRequiredField => "missing-required-field",
            Self::RedundantField => "redundant-field",
            Self::DanglingVerifiesReference => "dangling-verifies-reference",
            Self::DanglingParentReference => "dangling-parent-reference",
            Self::ObsoleteRequirementVerified => "obsolete-requirement-verified",
            Self::EmptyStepSequence => "empty-step-sequence",
            Self::InvalidEvidenceKind => "invalid-evidence-kind",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown issue kind name.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown issue kind '{0}'")]
pub struct UnknownIssueKind(String);

impl FromStr for IssueKind {
    type Err = UnknownIssueKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownIssueKind(s.to_string()))
    }
}

impl TryFrom<String> for IssueKind {
    type Error = UnknownIssueKind;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

/// Where an issue was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Document number (or title), or the source file of an automated test.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Identifier of the offending item.
    pub item: String,
    /// Zero-based index of the offending manual step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
}

impl Location {
    /// A location naming an item in a document.
    #[must_use]
    pub fn new(document: Option<String>, item: impl Into<String>) -> Self {
        Self {
            document,
            item: item.into(),
            step: None,
        }
    }

    /// Narrow the location to a single manual step.
    #[must_use]
    pub const fn at_step(mut self, step: usize) -> Self {
        self.step = Some(step);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(document) = &self.document {
            write!(f, "{document}: ")?;
        }
        f.write_str(&self.item)?;
        if let Some(step) = self.step {
            write!(f, " (step {})", step + 1)?;
        }
        Ok(())
    }
}

/// A single defect found in the documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// What kind of defect this is.
    pub kind: IssueKind,
    /// How serious it is.
    pub severity: Severity,
    /// Where it was found.
    pub location: Location,
    /// Human-readable detail.
    pub message: String,
}

impl Issue {
    /// Construct an error-severity issue.
    #[must_use]
    pub fn error(kind: IssueKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            location,
            message: message.into(),
        }
    }

    /// Construct a warning-severity issue.
    #[must_use]
    pub fn warning(kind: IssueKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            location,
            message: message.into(),
        }
    }

    /// Whether this issue fails the verdict.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.kind, self.location, self.message
        )
    }
}
