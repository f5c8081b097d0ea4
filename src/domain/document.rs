use std::path::{Path, PathBuf};

use crate::domain::{RequirementItem, TestItem};

/// Metadata common to every document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMeta {
    /// Document title. Always present.
    pub title: String,
    /// Document number, e.g. `SRS-01`.
    pub number: Option<String>,
    /// Revision, e.g. `A`.
    pub revision: Option<String>,
    /// Author of the document.
    pub author: Option<String>,
}

impl DocumentMeta {
    /// Construct metadata with only a title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the document number.
    #[must_use]
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// The number and revision followed by the title, e.g. `SRS-01A Software
    /// Requirements`.
    #[must_use]
    pub fn full_title(&self) -> String {
        let prefix = format!(
            "{}{}",
            self.number.as_deref().unwrap_or_default(),
            self.revision.as_deref().unwrap_or_default()
        );
        if prefix.is_empty() {
            self.title.clone()
        } else {
            format!("{prefix} {}", self.title)
        }
    }

    /// A short label for issue locations: the document number if set,
    /// otherwise the title.
    #[must_use]
    pub fn label(&self) -> &str {
        self.number.as_deref().unwrap_or(&self.title)
    }
}

/// A titled group of requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section heading.
    pub title: String,
    /// Requirements in document order.
    pub items: Vec<RequirementItem>,
}

/// A requirements specification document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementsDoc {
    meta: DocumentMeta,
    sections: Vec<Section>,
    path: Option<PathBuf>,
}

impl RequirementsDoc {
    /// Construct a requirements document.
    #[must_use]
    pub const fn new(meta: DocumentMeta, sections: Vec<Section>) -> Self {
        Self {
            meta,
            sections,
            path: None,
        }
    }

    /// Construct a document with a single section holding all the given
    /// requirements, titled after the document.
    #[must_use]
    pub fn flat(meta: DocumentMeta, items: Vec<RequirementItem>) -> Self {
        let section = Section {
            title: meta.title.clone(),
            items,
        };
        Self::new(meta, vec![section])
    }

    /// Record the file the document was loaded from.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Document metadata.
    #[must_use]
    pub const fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    /// Sections in document order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// All requirements across all sections, in document order.
    pub fn requirements(&self) -> impl Iterator<Item = &RequirementItem> {
        self.sections.iter().flat_map(|section| section.items.iter())
    }

    /// The file this document was loaded from.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// A manual test protocol document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestsDoc {
    meta: DocumentMeta,
    tests: Vec<TestItem>,
    path: Option<PathBuf>,
}

impl TestsDoc {
    /// Construct a test protocol.
    #[must_use]
    pub const fn new(meta: DocumentMeta, tests: Vec<TestItem>) -> Self {
        Self {
            meta,
            tests,
            path: None,
        }
    }

    /// Record the file the document was loaded from.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Document metadata.
    #[must_use]
    pub const fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    /// Manual tests in document order.
    #[must_use]
    pub fn tests(&self) -> &[TestItem] {
        &self.tests
    }

    /// The file this document was loaded from.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
