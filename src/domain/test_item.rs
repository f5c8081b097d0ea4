use std::{
    convert::Infallible,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Serialize;

/// Where a test item came from.
///
/// Automated and manual test identifiers live in separate namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// Discovered from source code.
    Automated,
    /// Declared in a test protocol document.
    Manual,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automated => f.write_str("automated"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// The kind of evidence recorded to prove a manual step passed.
///
/// The set of valid kinds is closed. Unknown tags are kept verbatim so the
/// validator can report them instead of the parser rejecting the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// A screenshot of the system under test.
    Screenshot,
    /// A captured log.
    Log,
    /// A written observation by the tester.
    Observation,
    /// A tag outside the closed set.
    Unrecognised(String),
}

impl Evidence {
    /// Whether this tag is one of the recognised evidence kinds.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !matches!(self, Self::Unrecognised(_))
    }
}

impl FromStr for Evidence {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "screenshot" => Self::Screenshot,
            "log" => Self::Log,
            "observation" => Self::Observation,
            other => Self::Unrecognised(other.to_string()),
        })
    }
}

impl From<String> for Evidence {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(evidence) => evidence,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Screenshot => f.write_str("screenshot"),
            Self::Log => f.write_str("log"),
            Self::Observation => f.write_str("observation"),
            Self::Unrecognised(tag) => f.write_str(tag),
        }
    }
}

/// A single given/when/then step of a manual test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestStep {
    pub(crate) given: String,
    pub(crate) when: String,
    pub(crate) then: String,
    pub(crate) evidence: Option<Evidence>,
}

impl TestStep {
    /// Construct a step with no evidence requirement.
    #[must_use]
    pub fn new(given: impl Into<String>, when: impl Into<String>, then: impl Into<String>) -> Self {
        Self {
            given: given.into(),
            when: when.into(),
            then: then.into(),
            evidence: None,
        }
    }

    /// Require the given kind of evidence for this step.
    #[must_use]
    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = Some(evidence);
        self
    }

    /// The precondition.
    #[must_use]
    pub fn given(&self) -> &str {
        &self.given
    }

    /// The action taken.
    #[must_use]
    pub fn when(&self) -> &str {
        &self.when
    }

    /// The expected outcome.
    #[must_use]
    pub fn then(&self) -> &str {
        &self.then
    }

    /// The evidence to record, if any.
    #[must_use]
    pub const fn evidence(&self) -> Option<&Evidence> {
        self.evidence.as_ref()
    }
}

/// A test case, either discovered in code or declared in a protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestItem {
    pub(crate) id: String,
    pub(crate) description: String,
    pub(crate) verifies: Vec<String>,
    pub(crate) kind: TestKind,
    /// Always empty for automated tests.
    pub(crate) steps: Vec<TestStep>,
    /// Source file the test was found in, if known.
    pub(crate) source: Option<PathBuf>,
}

impl TestItem {
    /// Construct an automated test item.
    #[must_use]
    pub fn automated(
        id: impl Into<String>,
        description: impl Into<String>,
        verifies: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            verifies: verifies.into_iter().map(Into::into).collect(),
            kind: TestKind::Automated,
            steps: Vec::new(),
            source: None,
        }
    }

    /// Construct a manual test item.
    #[must_use]
    pub fn manual(
        id: impl Into<String>,
        description: impl Into<String>,
        verifies: impl IntoIterator<Item = impl Into<String>>,
        steps: Vec<TestStep>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            verifies: verifies.into_iter().map(Into::into).collect(),
            kind: TestKind::Manual,
            steps,
            source: None,
        }
    }

    /// Record the file this test was found in.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The test's identifier, unique within its namespace.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// What the test demonstrates.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Identifiers of the requirements this test verifies, in declared order.
    #[must_use]
    pub fn verifies(&self) -> &[String] {
        &self.verifies
    }

    /// Automated or manual.
    #[must_use]
    pub const fn kind(&self) -> TestKind {
        self.kind
    }

    /// The manual steps. Empty for automated tests.
    #[must_use]
    pub fn steps(&self) -> &[TestStep] {
        &self.steps
    }

    /// The file this test was found in.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("screenshot", Evidence::Screenshot; "screenshot")]
    #[test_case("log", Evidence::Log; "log")]
    #[test_case("observation", Evidence::Observation; "observation")]
    #[test_case(
        "settings",
        Evidence::Unrecognised("settings".to_string());
        "settings is not recognised"
    )]
    #[test_case("Log", Evidence::Unrecognised("Log".to_string()); "tags are case sensitive")]
    fn evidence_parsing(input: &str, expected: Evidence) {
        let evidence: Evidence = input.parse().unwrap();
        assert_eq!(evidence, expected);
        assert_eq!(evidence.to_string(), input);
    }

    #[test]
    fn automated_tests_have_no_steps() {
        let test = TestItem::automated("t1", "checks things", ["REQ-001"]);
        assert_eq!(test.kind(), TestKind::Automated);
        assert!(test.steps().is_empty());
        assert_eq!(test.verifies(), ["REQ-001".to_string()]);
    }
}
