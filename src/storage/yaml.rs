//! YAML serialization for requirements documents and test protocols.
//!
//! The serialized forms are deliberately lenient at item level: missing
//! fields deserialize as empty so the validator can report them. Only the
//! document metadata block is structurally required. Scalar fields accept
//! numbers and booleans as well as strings, so `number: 42` reads as `"42"`.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::domain::{
    DocumentMeta, Evidence, RequirementItem, RequirementsDoc, Section, TestItem, TestStep,
    TestsDoc,
};

/// Errors that can occur when loading a document.
#[derive(Debug, thiserror::Error)]
#[error("failed to read document")]
pub enum LoadError {
    /// An I/O error occurred.
    Io(#[from] io::Error),
    /// The YAML is malformed or the metadata block is missing.
    Yaml(#[from] serde_yaml::Error),
}

fn scalar_text<E: serde::de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        other => Err(E::custom(format!("expected a scalar, found {other:?}"))),
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_text::<D::Error>(Value::deserialize(deserializer)?)?.unwrap_or_default())
}

fn optional_scalar<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    scalar_text(Value::deserialize(deserializer)?)
}

fn scalars<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Option::<Vec<Value>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(|value| Ok(scalar_text::<D::Error>(value)?.unwrap_or_default()))
        .collect()
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(deserialize_with = "scalar")]
    title: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    number: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar")]
    revision: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar")]
    author: Option<String>,
}

impl From<Meta> for DocumentMeta {
    fn from(meta: Meta) -> Self {
        let Meta {
            title,
            number,
            revision,
            author,
        } = meta;
        Self {
            title,
            number,
            revision,
            author,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RequirementsFile {
    #[serde(flatten)]
    meta: Meta,
    /// Either a list of sections or a flat list of requirements.
    #[serde(default)]
    body: Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionFile {
    #[serde(deserialize_with = "scalar")]
    title: String,
    #[serde(default)]
    items: Vec<RequirementFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequirementFile {
    #[serde(default, deserialize_with = "scalar")]
    id: String,
    #[serde(default, deserialize_with = "scalar")]
    specification: String,
    #[serde(default, deserialize_with = "scalar")]
    rationale: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    parent: Option<String>,
    #[serde(default)]
    obsolete: bool,
    #[serde(default, deserialize_with = "optional_scalar")]
    obsolete_reason: Option<String>,
}

impl From<RequirementFile> for RequirementItem {
    fn from(file: RequirementFile) -> Self {
        let RequirementFile {
            id,
            specification,
            rationale,
            parent,
            obsolete,
            obsolete_reason,
        } = file;
        Self {
            id,
            specification,
            rationale,
            // an empty parent means no parent
            parent: parent.filter(|parent| !parent.trim().is_empty()),
            obsolete,
            obsolete_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TestsFile {
    #[serde(flatten)]
    meta: Meta,
    #[serde(default)]
    tests: Vec<TestFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestFile {
    #[serde(default, deserialize_with = "scalar")]
    id: String,
    #[serde(default, deserialize_with = "scalar")]
    description: String,
    #[serde(default, deserialize_with = "scalars")]
    verifies: Vec<String>,
    #[serde(default)]
    steps: Vec<StepFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepFile {
    #[serde(default, deserialize_with = "scalar")]
    given: String,
    #[serde(default, deserialize_with = "scalar")]
    when: String,
    #[serde(default, deserialize_with = "scalar")]
    then: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    evidence: Option<String>,
}

impl From<StepFile> for TestStep {
    fn from(step: StepFile) -> Self {
        let StepFile {
            given,
            when,
            then,
            evidence,
        } = step;
        Self {
            given,
            when,
            then,
            evidence: evidence.map(Evidence::from),
        }
    }
}

impl From<TestFile> for TestItem {
    fn from(test: TestFile) -> Self {
        let TestFile {
            id,
            description,
            verifies,
            steps,
        } = test;
        Self::manual(
            id,
            description,
            verifies,
            steps.into_iter().map(TestStep::from).collect(),
        )
    }
}

/// A body is sectioned when any entry carries a section's `title` or `items`.
fn is_sectioned(body: &Value) -> bool {
    body.as_sequence().is_none_or(|entries| {
        entries.is_empty()
            || entries
                .iter()
                .any(|entry| entry.get("title").is_some() || entry.get("items").is_some())
    })
}

/// Read a requirements document from YAML.
///
/// A flat list of requirements is grouped under a single section titled after
/// the document.
///
/// # Errors
///
/// Returns an error if the input cannot be read, is not valid YAML, lacks
/// the document metadata, or an entry carries an unknown or mistyped field.
pub fn read_requirements<R: Read>(reader: R) -> Result<RequirementsDoc, LoadError> {
    let RequirementsFile { meta, body } = serde_yaml::from_reader(reader)?;
    let meta = DocumentMeta::from(meta);
    if body.is_null() {
        return Ok(RequirementsDoc::new(meta, Vec::new()));
    }
    if !is_sectioned(&body) {
        let items: Vec<RequirementFile> = serde_yaml::from_value(body)?;
        return Ok(RequirementsDoc::flat(
            meta,
            items.into_iter().map(RequirementItem::from).collect(),
        ));
    }
    let sections: Vec<SectionFile> = serde_yaml::from_value(body)?;
    Ok(RequirementsDoc::new(
        meta,
        sections
            .into_iter()
            .map(|section| Section {
                title: section.title,
                items: section.items.into_iter().map(RequirementItem::from).collect(),
            })
            .collect(),
    ))
}

/// Read a manual test protocol from YAML.
///
/// # Errors
///
/// Returns an error if the input cannot be read, is not valid YAML, or lacks
/// the document metadata.
pub fn read_tests<R: Read>(reader: R) -> Result<TestsDoc, LoadError> {
    let TestsFile { meta, tests } = serde_yaml::from_reader(reader)?;
    Ok(TestsDoc::new(
        meta.into(),
        tests.into_iter().map(TestItem::from).collect(),
    ))
}

/// Load a requirements document from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_requirements(path: &Path) -> Result<RequirementsDoc, LoadError> {
    let file = File::open(path)?;
    Ok(read_requirements(BufReader::new(file))?.with_path(path))
}

/// Load a manual test protocol from a file.
///
/// Tests record the protocol file as their source.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_tests(path: &Path) -> Result<TestsDoc, LoadError> {
    let file = File::open(path)?;
    let doc = read_tests(BufReader::new(file))?;
    let tests = doc
        .tests()
        .iter()
        .cloned()
        .map(|test| test.with_source(path))
        .collect();
    Ok(TestsDoc::new(doc.meta().clone(), tests).with_path(path))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::*;
    use crate::domain::TestKind;

    #[test]
    fn sectioned_requirements() {
        let input = r"
title: Software Requirements
number: SRS-01
revision: A
author: Jane Doe
body:
  - title: Arithmetic
    items:
      - id: REQ-001
        specification: The system shall add numbers.
        rationale: Users need sums.
      - id: REQ-002
        specification: The system shall multiply numbers.
        rationale: Users need products.
        parent: URS-001
  - title: Retired
    items:
      - id: REQ-003
        specification: The system shall divide by zero.
        rationale: Nobody knows.
        obsolete: true
        obsolete_reason: Impossible.
";
        let doc = read_requirements(Cursor::new(input)).unwrap();

        assert_eq!(doc.meta().full_title(), "SRS-01A Software Requirements");
        assert_eq!(doc.meta().author.as_deref(), Some("Jane Doe"));
        assert_eq!(doc.sections().len(), 2);
        let items: Vec<_> = doc.requirements().collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].parent(), Some("URS-001"));
        assert!(items[2].is_obsolete());
        assert_eq!(items[2].obsolete_reason(), Some("Impossible."));
    }

    #[test]
    fn flat_requirements_are_grouped() {
        let input = r"
title: Flat Requirements
body:
  - id: REQ-001
    specification: The system shall add numbers.
    rationale: Users need sums.
";
        let doc = read_requirements(Cursor::new(input)).unwrap();
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.sections()[0].title, "Flat Requirements");
        assert_eq!(doc.requirements().next().unwrap().id(), "REQ-001");
    }

    #[test]
    fn missing_item_fields_parse_as_empty() {
        let input = r"
title: Sparse
body:
  - id: REQ-001
    parent: ''
";
        let doc = read_requirements(Cursor::new(input)).unwrap();
        let item = doc.requirements().next().unwrap();
        assert_eq!(item.specification(), "");
        assert_eq!(item.rationale(), "");
        assert_eq!(item.parent(), None);
    }

    #[test]
    fn missing_metadata_is_an_error() {
        let input = r"
body:
  - id: REQ-001
";
        let result = read_requirements(Cursor::new(input));
        assert!(matches!(result, Err(LoadError::Yaml(_))));
    }

    #[test]
    fn numeric_scalars_read_as_text() {
        let input = r"
title: Numbered
number: 42
revision: 2
body:
  - id: 101
    specification: The system shall count.
    rationale: Users count.
    parent: 7
";
        let doc = read_requirements(Cursor::new(input)).unwrap();
        assert_eq!(doc.meta().number.as_deref(), Some("42"));
        assert_eq!(doc.meta().revision.as_deref(), Some("2"));
        let item = doc.requirements().next().unwrap();
        assert_eq!(item.id(), "101");
        assert_eq!(item.parent(), Some("7"));

        let protocol = r"
title: Protocol
tests:
  - id: 1
    description: Count.
    verifies: [101, REQ-002]
";
        let doc = read_tests(Cursor::new(protocol)).unwrap();
        assert_eq!(doc.tests()[0].id(), "1");
        assert_eq!(doc.tests()[0].verifies(), ["101", "REQ-002"]);
    }

    #[test]
    fn mistyped_obsolete_is_an_error() {
        let input = r"
title: Flat
body:
  - id: REQ-001
    specification: s
    rationale: r
    obsolete: maybe
";
        let result = read_requirements(Cursor::new(input));
        assert!(matches!(result, Err(LoadError::Yaml(_))));
    }

    #[test]
    fn misspelt_section_field_is_an_error() {
        let input = r"
title: Sectioned
body:
  - title: Arithmetic
    itmes:
      - id: REQ-001
";
        let result = read_requirements(Cursor::new(input));
        assert!(matches!(result, Err(LoadError::Yaml(_))));
    }

    #[test]
    fn misspelt_requirement_field_is_an_error() {
        let input = r"
title: Flat
body:
  - id: REQ-001
    specificaton: s
";
        let result = read_requirements(Cursor::new(input));
        assert!(matches!(result, Err(LoadError::Yaml(_))));
    }

    #[test]
    fn missing_body_is_empty() {
        let doc = read_requirements(Cursor::new("title: Empty\n")).unwrap();
        assert!(doc.sections().is_empty());
    }

    #[test]
    fn manual_tests() {
        let input = r"
title: Test Protocol
number: TP-01
tests:
  - id: TEST-1
    description: Add two numbers.
    verifies: [REQ-001, REQ-002]
    steps:
      - given: the calculator is open
        when: the user enters 1 + 2
        then: 3 is shown
        evidence: screenshot
      - given: the result is shown
        when: the user clears
        then: 0 is shown
        evidence: settings
  - id: TEST-2
    description: Nothing to do.
    verifies: []
";
        let doc = read_tests(Cursor::new(input)).unwrap();
        assert_eq!(doc.meta().label(), "TP-01");
        let tests = doc.tests();
        assert_eq!(tests.len(), 2);
        assert_eq!(tests[0].kind(), TestKind::Manual);
        assert_eq!(tests[0].verifies(), ["REQ-001", "REQ-002"]);
        assert_eq!(tests[0].steps()[0].evidence(), Some(&Evidence::Screenshot));
        assert_eq!(
            tests[0].steps()[1].evidence(),
            Some(&Evidence::Unrecognised("settings".to_string()))
        );
        assert!(tests[1].steps().is_empty());
    }

    #[test]
    fn invalid_yaml() {
        let input = "title: [unterminated";
        assert!(matches!(
            read_tests(Cursor::new(input)),
            Err(LoadError::Yaml(_))
        ));
    }

    #[test]
    fn load_records_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tests.yaml");
        std::fs::write(
            &path,
            "title: Protocol\ntests:\n  - id: TEST-1\n    description: d\n    verifies: []\n",
        )
        .unwrap();

        let doc = load_tests(&path).unwrap();
        assert_eq!(doc.path(), Some(path.as_path()));
        assert_eq!(doc.tests()[0].source(), Some(path.as_path()));
    }

    #[test]
    fn load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_requirements(&dir.path().join("requirements.yaml"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
