//! Domain models for verification documentation.
//!
//! This module contains the parsed document types (requirements documents and
//! manual test protocols), the shared item types, the issue taxonomy and the
//! tool configuration. None of these types perform validation; that is the
//! job of the [`engine`](crate::engine).

/// Document metadata, requirements documents and test protocols.
pub mod document;
pub use document::{DocumentMeta, RequirementsDoc, Section, TestsDoc};

/// Requirement items.
pub mod requirement;
pub use requirement::RequirementItem;

/// Automated and manual test items.
pub mod test_item;
pub use test_item::{Evidence, TestItem, TestKind, TestStep};

/// Issue records produced by the validator.
pub mod issue;
pub use issue::{Issue, IssueKind, Location, Severity};

/// Tool configuration.
pub mod config;
pub use config::{Config, ConfigError};
