//! Structural and semantic checks over the resolved documents.
//!
//! Every check runs, in the order of [`CHECKS`], and issues are concatenated
//! in that order. A defect in one item never stops the remaining checks.

use std::collections::{HashMap, HashSet};

use tracing::instrument;

use crate::{
    domain::{Evidence, Issue, IssueKind, TestKind},
    engine::resolver::{CrossReferenceGraph, Link, Node},
};

type Check = fn(&CrossReferenceGraph<'_>, &mut Vec<Issue>);

/// The checks, in the order their issues are reported.
const CHECKS: [(IssueKind, Check); 7] = [
    (IssueKind::DuplicateIdentifier, duplicate_identifiers),
    (IssueKind::MissingRequiredField, schema_violations),
    (IssueKind::DanglingVerifiesReference, dangling_verifies),
    (IssueKind::DanglingParentReference, dangling_parents),
    (IssueKind::ObsoleteRequirementVerified, obsolete_verified),
    (IssueKind::EmptyStepSequence, empty_step_sequences),
    (IssueKind::InvalidEvidenceKind, invalid_evidence),
];

/// Run every check against the resolved graph.
#[must_use]
#[instrument(level = "debug", skip_all)]
pub fn validate(graph: &CrossReferenceGraph<'_>) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (kind, check) in CHECKS {
        let before = issues.len();
        check(graph, &mut issues);
        tracing::debug!(check = %kind, found = issues.len() - before, "ran check");
    }
    for issue in &issues {
        tracing::debug!("{issue}");
    }
    issues
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// One issue per occurrence of an identifier beyond its first, per namespace.
///
/// Namespaces are requirements (across all documents), automated tests, and
/// manual tests (across all protocols).
fn duplicate_identifiers(graph: &CrossReferenceGraph<'_>, issues: &mut Vec<Issue>) {
    let mut first_seen: HashMap<&str, String> = HashMap::new();
    for entry in graph.requirements() {
        let id = entry.item.id();
        if is_blank(id) {
            continue;
        }
        match first_seen.get(id) {
            Some(origin) => issues.push(Issue::error(
                IssueKind::DuplicateIdentifier,
                entry.location(),
                format!("requirement {id} is already defined in {origin}"),
            )),
            None => {
                first_seen.insert(id, entry.document.label().to_string());
            }
        }
    }

    for kind in [TestKind::Automated, TestKind::Manual] {
        let mut seen = HashSet::new();
        for entry in graph.tests().iter().filter(|entry| entry.item.kind() == kind) {
            let id = entry.item.id();
            if is_blank(id) || seen.insert(id) {
                continue;
            }
            issues.push(Issue::error(
                IssueKind::DuplicateIdentifier,
                entry.location(),
                format!("{kind} test {id} is defined more than once"),
            ));
        }
    }
}

/// Missing required fields (errors) and redundant conditional fields
/// (warnings).
fn schema_violations(graph: &CrossReferenceGraph<'_>, issues: &mut Vec<Issue>) {
    for entry in graph.requirements() {
        let item = entry.item;
        let required = [
            ("id", item.id()),
            ("specification", item.specification()),
            ("rationale", item.rationale()),
        ];
        for (field, value) in required {
            if is_blank(value) {
                issues.push(Issue::error(
                    IssueKind::MissingRequiredField,
                    entry.location(),
                    format!("requirement is missing its {field}"),
                ));
            }
        }

        match (item.is_obsolete(), item.obsolete_reason()) {
            (true, None) => issues.push(Issue::error(
                IssueKind::MissingRequiredField,
                entry.location(),
                "requirement is marked obsolete without a reason given",
            )),
            (false, Some(_)) => issues.push(Issue::warning(
                IssueKind::RedundantField,
                entry.location(),
                "obsolete_reason is given but the requirement is not obsolete",
            )),
            _ => {}
        }
    }

    for entry in graph.tests() {
        let item = entry.item;
        for (field, value) in [("id", item.id()), ("description", item.description())] {
            if is_blank(value) {
                issues.push(Issue::error(
                    IssueKind::MissingRequiredField,
                    entry.location(),
                    format!("{} test is missing its {field}", item.kind()),
                ));
            }
        }
        for (index, step) in item.steps().iter().enumerate() {
            for (field, value) in [
                ("given", step.given()),
                ("when", step.when()),
                ("then", step.then()),
            ] {
                if is_blank(value) {
                    issues.push(Issue::error(
                        IssueKind::MissingRequiredField,
                        entry.location().at_step(index),
                        format!("step is missing its '{field}' clause"),
                    ));
                }
            }
        }
    }
}

fn unresolved_issues(
    graph: &CrossReferenceGraph<'_>,
    issues: &mut Vec<Issue>,
    link: Link,
    make: impl Fn(Node, &str) -> Issue,
) {
    issues.extend(
        graph
            .unresolved()
            .iter()
            .filter(|reference| reference.link == link)
            .map(|reference| make(reference.origin, reference.target)),
    );
}

fn node_location(graph: &CrossReferenceGraph<'_>, node: Node) -> crate::domain::Location {
    match node {
        Node::Requirement(position) => graph.requirements()[position].location(),
        Node::Test(position) => graph.tests()[position].location(),
    }
}

fn dangling_verifies(graph: &CrossReferenceGraph<'_>, issues: &mut Vec<Issue>) {
    unresolved_issues(graph, issues, Link::Verifies, |origin, target| {
        Issue::error(
            IssueKind::DanglingVerifiesReference,
            node_location(graph, origin),
            format!("test verifies non-existent requirement {target}"),
        )
    });
}

fn dangling_parents(graph: &CrossReferenceGraph<'_>, issues: &mut Vec<Issue>) {
    unresolved_issues(graph, issues, Link::Parent, |origin, target| {
        Issue::warning(
            IssueKind::DanglingParentReference,
            node_location(graph, origin),
            format!("parent requirement {target} is not in any loaded document"),
        )
    });
}

fn obsolete_verified(graph: &CrossReferenceGraph<'_>, issues: &mut Vec<Issue>) {
    for entry in graph.tests() {
        let mut seen = HashSet::new();
        for target in entry.item.verifies() {
            if !seen.insert(target.as_str()) {
                continue;
            }
            let Some((_, requirement)) = graph.find_requirement(target) else {
                continue;
            };
            if requirement.item.is_obsolete() {
                issues.push(Issue::warning(
                    IssueKind::ObsoleteRequirementVerified,
                    entry.location(),
                    format!("test verifies obsolete requirement {target}"),
                ));
            }
        }
    }
}

fn empty_step_sequences(graph: &CrossReferenceGraph<'_>, issues: &mut Vec<Issue>) {
    issues.extend(
        graph
            .tests()
            .iter()
            .filter(|entry| entry.item.kind() == TestKind::Manual && entry.item.steps().is_empty())
            .map(|entry| {
                Issue::warning(
                    IssueKind::EmptyStepSequence,
                    entry.location(),
                    "manual test has no steps",
                )
            }),
    );
}

fn invalid_evidence(graph: &CrossReferenceGraph<'_>, issues: &mut Vec<Issue>) {
    for entry in graph.tests() {
        for (index, step) in entry.item.steps().iter().enumerate() {
            if let Some(Evidence::Unrecognised(tag)) = step.evidence() {
                issues.push(Issue::error(
                    IssueKind::InvalidEvidenceKind,
                    entry.location().at_step(index),
                    format!(
                        "unknown evidence kind '{tag}' (expected screenshot, log or observation)"
                    ),
                ));
            }
        }
    }
}
