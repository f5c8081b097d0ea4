/// A single requirement entry in a requirements document.
///
/// Items are immutable once parsed. Identity is the `id` within the owning
/// document. Required fields may still be empty here; the validator reports
/// them rather than the parser rejecting them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementItem {
    pub(crate) id: String,
    pub(crate) specification: String,
    pub(crate) rationale: String,
    /// Identifier of the requirement this one refines, possibly in a document
    /// that is not loaded.
    pub(crate) parent: Option<String>,
    pub(crate) obsolete: bool,
    pub(crate) obsolete_reason: Option<String>,
}

impl RequirementItem {
    /// Construct a new, active [`RequirementItem`] with no parent.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        specification: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            specification: specification.into(),
            rationale: rationale.into(),
            parent: None,
            obsolete: false,
            obsolete_reason: None,
        }
    }

    /// Set the parent requirement identifier.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the obsolete flag.
    #[must_use]
    pub const fn with_obsolete(mut self, obsolete: bool) -> Self {
        self.obsolete = obsolete;
        self
    }

    /// Set the reason the requirement was retired.
    #[must_use]
    pub fn with_obsolete_reason(mut self, reason: impl Into<String>) -> Self {
        self.obsolete_reason = Some(reason.into());
        self
    }

    /// Mark the requirement obsolete with the given reason.
    #[must_use]
    pub fn retired(self, reason: impl Into<String>) -> Self {
        self.with_obsolete(true).with_obsolete_reason(reason)
    }

    /// The requirement's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// What the system shall do.
    #[must_use]
    pub fn specification(&self) -> &str {
        &self.specification
    }

    /// Why the requirement exists.
    #[must_use]
    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    /// The parent requirement identifier, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Whether the requirement has been retired from active tracking.
    #[must_use]
    pub const fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// The reason given for retirement.
    ///
    /// Blank reasons are treated as absent.
    #[must_use]
    pub fn obsolete_reason(&self) -> Option<&str> {
        self.obsolete_reason
            .as_deref()
            .filter(|reason| !reason.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::RequirementItem;

    #[test]
    fn blank_obsolete_reason_is_absent() {
        let item = RequirementItem::new("REQ-001", "spec", "why").retired("   ");
        assert!(item.is_obsolete());
        assert_eq!(item.obsolete_reason(), None);
    }

    #[test]
    fn builder_sets_parent() {
        let item = RequirementItem::new("REQ-002", "spec", "why").with_parent("SYS-001");
        assert_eq!(item.parent(), Some("SYS-001"));
        assert!(!item.is_obsolete());
    }
}
