//! Cross-reference resolution.
//!
//! The [`CrossReferenceGraph`] borrows every item from the engine [`Input`];
//! it never owns them. Nodes are positions in the flattened item lists, edges
//! point from the referring item to the referenced requirement.

use std::collections::{HashMap, HashSet};

use petgraph::{graphmap::DiGraphMap, Direction};
use tracing::instrument;

use crate::{
    domain::{DocumentMeta, Location, RequirementItem, TestItem, TestKind},
    engine::Input,
};

/// A node in the cross-reference graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
    /// Index into [`CrossReferenceGraph::requirements`].
    Requirement(usize),
    /// Index into [`CrossReferenceGraph::tests`].
    Test(usize),
}

/// The relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// A test verifies a requirement.
    Verifies,
    /// A requirement refines a parent requirement.
    Parent,
}

/// A loaded requirement together with the document it came from.
#[derive(Debug, Clone, Copy)]
pub struct RequirementEntry<'a> {
    /// The requirement.
    pub item: &'a RequirementItem,
    /// The owning document.
    pub document: &'a DocumentMeta,
}

impl RequirementEntry<'_> {
    /// Location of this requirement for issue reporting.
    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(Some(self.document.label().to_string()), self.item.id())
    }
}

/// A loaded test together with its origin.
#[derive(Debug, Clone, Copy)]
pub struct TestEntry<'a> {
    /// The test.
    pub item: &'a TestItem,
    /// The owning protocol. `None` for automated tests.
    pub document: Option<&'a DocumentMeta>,
}

impl TestEntry<'_> {
    /// Location of this test for issue reporting.
    ///
    /// Manual tests are located by protocol, automated tests by source file.
    #[must_use]
    pub fn location(&self) -> Location {
        let document = match self.document {
            Some(document) => Some(document.label().to_string()),
            None => self.item.source().map(|path| path.display().to_string()),
        };
        Location::new(document, self.item.id())
    }
}

/// A reference that did not resolve to any loaded requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnresolvedReference<'a> {
    /// The referring item.
    pub origin: Node,
    /// The identifier that could not be found.
    pub target: &'a str,
    /// The kind of reference.
    pub link: Link,
}

/// Lookup-only reference graph between requirements and tests.
///
/// Built fresh for every review and discarded afterwards.
#[derive(Debug)]
pub struct CrossReferenceGraph<'a> {
    requirements: Vec<RequirementEntry<'a>>,
    tests: Vec<TestEntry<'a>>,
    /// Requirement id to the index of its first-loaded definition.
    index: HashMap<&'a str, usize>,
    graph: DiGraphMap<Node, Link>,
    unresolved: Vec<UnresolvedReference<'a>>,
}

impl<'a> CrossReferenceGraph<'a> {
    /// Resolve every `parent` and `verifies` reference in the input.
    ///
    /// When a requirement id is defined more than once, references resolve to
    /// the first-loaded definition.
    #[must_use]
    #[instrument(level = "debug", skip_all)]
    pub fn resolve(input: &'a Input) -> Self {
        let requirements: Vec<_> = input
            .requirements
            .iter()
            .flat_map(|doc| {
                doc.requirements().map(move |item| RequirementEntry {
                    item,
                    document: doc.meta(),
                })
            })
            .collect();

        let tests: Vec<_> = input
            .protocols
            .iter()
            .flat_map(|doc| {
                doc.tests().iter().map(move |item| TestEntry {
                    item,
                    document: Some(doc.meta()),
                })
            })
            .chain(
                input
                    .automated
                    .iter()
                    .map(|item| TestEntry { item, document: None }),
            )
            .collect();

        let mut index = HashMap::with_capacity(requirements.len());
        for (position, entry) in requirements.iter().enumerate() {
            index.entry(entry.item.id()).or_insert(position);
        }

        let mut graph = Self {
            graph: DiGraphMap::with_capacity(
                requirements.len() + tests.len(),
                requirements.len() + tests.len(),
            ),
            requirements,
            tests,
            index,
            unresolved: Vec::new(),
        };
        graph.link_parents();
        graph.link_tests();

        tracing::debug!(
            requirements = graph.requirements.len(),
            tests = graph.tests.len(),
            edges = graph.graph.edge_count(),
            unresolved = graph.unresolved.len(),
            "resolved cross references"
        );

        graph
    }

    fn link_parents(&mut self) {
        for position in 0..self.requirements.len() {
            let node = Node::Requirement(position);
            self.graph.add_node(node);
            let entry = self.requirements[position];
            let Some(parent) = entry.item.parent() else {
                continue;
            };
            match self.index.get(parent) {
                Some(&target) => {
                    self.graph
                        .add_edge(node, Node::Requirement(target), Link::Parent);
                }
                None => self.unresolved.push(UnresolvedReference {
                    origin: node,
                    target: parent,
                    link: Link::Parent,
                }),
            }
        }
    }

    fn link_tests(&mut self) {
        for position in 0..self.tests.len() {
            let node = Node::Test(position);
            self.graph.add_node(node);
            let item = self.tests[position].item;
            let mut seen = HashSet::new();
            for target in item.verifies() {
                if !seen.insert(target.as_str()) {
                    continue;
                }
                match self.index.get(target.as_str()) {
                    Some(&requirement) => {
                        self.graph
                            .add_edge(node, Node::Requirement(requirement), Link::Verifies);
                    }
                    None => self.unresolved.push(UnresolvedReference {
                        origin: node,
                        target,
                        link: Link::Verifies,
                    }),
                }
            }
        }
    }

    /// All loaded requirements, in load order, duplicates included.
    #[must_use]
    pub fn requirements(&self) -> &[RequirementEntry<'a>] {
        &self.requirements
    }

    /// All loaded tests: manual tests in protocol order, then automated tests.
    #[must_use]
    pub fn tests(&self) -> &[TestEntry<'a>] {
        &self.tests
    }

    /// Look up the requirement a reference to `id` resolves to.
    #[must_use]
    pub fn find_requirement(&self, id: &str) -> Option<(usize, &RequirementEntry<'a>)> {
        let &position = self.index.get(id)?;
        Some((position, &self.requirements[position]))
    }

    /// Whether the requirement at `position` is the definition references
    /// resolve to, rather than a later duplicate.
    #[must_use]
    pub fn is_canonical(&self, position: usize) -> bool {
        self.requirements
            .get(position)
            .and_then(|entry| self.index.get(entry.item.id()))
            == Some(&position)
    }

    /// Positions of the tests that verify the requirement at `position`.
    pub fn verifiers(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.incoming(Node::Requirement(position))
            .filter_map(|node| match node {
                Node::Test(test) => Some(test),
                Node::Requirement(_) => None,
            })
    }

    /// Positions of the requirements that name the requirement at `position`
    /// as their parent.
    pub fn children(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.incoming(Node::Requirement(position))
            .filter_map(|node| match node {
                Node::Requirement(child) => Some(child),
                Node::Test(_) => None,
            })
    }

    /// Positions of the requirements the test at `position` resolves to.
    pub fn verified_by(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        let node = Node::Test(position);
        self.graph
            .contains_node(node)
            .then(|| self.graph.neighbors_directed(node, Direction::Outgoing))
            .into_iter()
            .flatten()
            .filter_map(|node| match node {
                Node::Requirement(requirement) => Some(requirement),
                Node::Test(_) => None,
            })
    }

    /// The kind of link between two nodes, if any.
    #[must_use]
    pub fn link(&self, from: Node, to: Node) -> Option<Link> {
        self.graph.edge_weight(from, to).copied()
    }

    /// References that could not be resolved, in item order.
    #[must_use]
    pub fn unresolved(&self) -> &[UnresolvedReference<'a>] {
        &self.unresolved
    }

    /// The kind of the test at `position`.
    #[must_use]
    pub fn test_kind(&self, position: usize) -> TestKind {
        self.tests[position].item.kind()
    }

    fn incoming(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        self.graph
            .contains_node(node)
            .then(|| self.graph.neighbors_directed(node, Direction::Incoming))
            .into_iter()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RequirementsDoc, TestsDoc, TestStep};

    fn requirement(id: &str) -> RequirementItem {
        RequirementItem::new(id, "The system shall work", "Because")
    }

    fn doc(number: &str, items: Vec<RequirementItem>) -> RequirementsDoc {
        RequirementsDoc::flat(
            DocumentMeta::new("Software Requirements").with_number(number),
            items,
        )
    }

    #[test]
    fn verifies_edges_resolve() {
        let input = Input {
            requirements: vec![doc("SRS", vec![requirement("REQ-001")])],
            automated: vec![TestItem::automated("t1", "test", ["REQ-001"])],
            ..Input::default()
        };
        let graph = CrossReferenceGraph::resolve(&input);

        assert_eq!(graph.verifiers(0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(graph.verified_by(0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(
            graph.link(Node::Test(0), Node::Requirement(0)),
            Some(Link::Verifies)
        );
        assert!(graph.unresolved().is_empty());
    }

    #[test]
    fn unresolved_verifies_are_recorded_without_edges() {
        let input = Input {
            requirements: vec![doc("SRS", vec![requirement("REQ-001")])],
            automated: vec![TestItem::automated("t1", "test", ["REQ-999"])],
            ..Input::default()
        };
        let graph = CrossReferenceGraph::resolve(&input);

        assert_eq!(graph.verified_by(0).count(), 0);
        assert_eq!(
            graph.unresolved(),
            &[UnresolvedReference {
                origin: Node::Test(0),
                target: "REQ-999",
                link: Link::Verifies,
            }]
        );
    }

    #[test]
    fn repeated_verifies_entries_resolve_once() {
        let input = Input {
            requirements: vec![doc("SRS", vec![])],
            automated: vec![TestItem::automated(
                "t1",
                "test",
                ["REQ-404", "REQ-404"],
            )],
            ..Input::default()
        };
        let graph = CrossReferenceGraph::resolve(&input);
        assert_eq!(graph.unresolved().len(), 1);
    }

    #[test]
    fn duplicates_resolve_to_first_loaded() {
        let input = Input {
            requirements: vec![
                doc("A", vec![requirement("REQ-001")]),
                doc(
                    "B",
                    vec![
                        requirement("REQ-001"),
                        requirement("REQ-002").with_parent("REQ-001"),
                    ],
                ),
            ],
            automated: vec![TestItem::automated("t1", "test", ["REQ-001"])],
            ..Input::default()
        };
        let graph = CrossReferenceGraph::resolve(&input);

        assert!(graph.is_canonical(0));
        assert!(!graph.is_canonical(1));
        assert_eq!(graph.find_requirement("REQ-001").unwrap().0, 0);
        assert_eq!(graph.verifiers(0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(graph.verifiers(1).count(), 0);
        assert_eq!(graph.children(0).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn external_parents_are_unresolved() {
        let input = Input {
            requirements: vec![doc(
                "SRS",
                vec![requirement("REQ-001").with_parent("URS-001")],
            )],
            ..Input::default()
        };
        let graph = CrossReferenceGraph::resolve(&input);
        assert_eq!(graph.unresolved().len(), 1);
        assert_eq!(graph.unresolved()[0].link, Link::Parent);
        assert_eq!(graph.unresolved()[0].target, "URS-001");
    }

    #[test]
    fn manual_tests_precede_automated_tests() {
        let input = Input {
            requirements: vec![doc("SRS", vec![requirement("REQ-001")])],
            protocols: vec![TestsDoc::new(
                DocumentMeta::new("Protocol"),
                vec![TestItem::manual(
                    "TEST-1",
                    "manual",
                    ["REQ-001"],
                    vec![TestStep::new("a", "b", "c")],
                )],
            )],
            automated: vec![TestItem::automated("t1", "test", ["REQ-001"])],
        };
        let graph = CrossReferenceGraph::resolve(&input);

        assert_eq!(graph.test_kind(0), TestKind::Manual);
        assert_eq!(graph.test_kind(1), TestKind::Automated);
        let mut verifiers: Vec<_> = graph.verifiers(0).collect();
        verifiers.sort_unstable();
        assert_eq!(verifiers, vec![0, 1]);
    }
}
