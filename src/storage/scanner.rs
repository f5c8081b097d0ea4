//! Discovery of automated tests in source code.
//!
//! Test functions declare the requirements they verify with one or more
//! decorators stacked above the function:
//!
//! ```python
//! @verifies("REQ-011")
//! @verifies("REQ-021", "REQ-022")
//! def test_multiply():
//!     """Multiplying negatives gives a positive."""
//! ```
//!
//! Only functions whose names start with `test` are reported, and only if at
//! least one `verifies` decorator is present.

use std::{
    io,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use regex::Regex;
use tracing::instrument;
use walkdir::WalkDir;

use crate::domain::{Config, TestItem};

static VERIFIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^@(?:[A-Za-z_][\w.]*\.)?verifies\s*\((?P<args>.*)\)$")
        .expect("this must never fail")
});

static STRING_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]*)"|'([^']*)'"#).expect("this must never fail")
});

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:async\s+)?def\s+(?P<name>\w+)\s*\(").expect("this must never fail")
});

/// Errors that can occur while discovering automated tests.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A directory could not be walked.
    #[error("failed to walk test directory")]
    Walk(#[from] walkdir::Error),
    /// A source file could not be read.
    #[error("failed to read test file {}", path.display())]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// Find all automated tests under the given directories.
///
/// Directories are walked recursively, skipping hidden entries. Files whose
/// names match the configured test file patterns are scanned. Results are
/// ordered by directory, then by path.
///
/// # Errors
///
/// Returns an error if a directory cannot be walked or a test file cannot be
/// read.
#[instrument(level = "debug", skip(config))]
pub fn discover(dirs: &[PathBuf], config: &Config) -> Result<Vec<TestItem>, ScanError> {
    let mut paths = Vec::new();
    for dir in dirs {
        tracing::info!("Looking for tests in {}", dir.display());
        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if config.is_test_file(name) {
                tracing::debug!("Found test file: {}", entry.path().display());
                paths.push(entry.into_path());
            }
        }
    }

    let per_file: Vec<Vec<TestItem>> = paths
        .par_iter()
        .map(|path| {
            let source = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
                path: path.clone(),
                source,
            })?;
            Ok(scan_source(path, &source))
        })
        .collect::<Result<_, ScanError>>()?;

    let tests: Vec<_> = per_file.into_iter().flatten().collect();
    tracing::info!("Found {} automated tests", tests.len());
    Ok(tests)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// Extract decorated test functions from a single source file.
///
/// Test ids take the form `<path>::<function>`.
#[must_use]
pub fn scan_source(path: &Path, source: &str) -> Vec<TestItem> {
    let display_path = path.strip_prefix(".").unwrap_or(path);
    let statements = logical_lines(source);
    let mut tests = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut decorated = false;

    for (index, statement) in statements.iter().enumerate() {
        if let Some(captures) = VERIFIES.captures(statement) {
            pending.extend(
                STRING_LITERAL
                    .captures_iter(&captures["args"])
                    .filter_map(|literal| literal.get(1).or_else(|| literal.get(2)))
                    .map(|id| id.as_str().to_string()),
            );
            decorated = true;
        } else if statement.starts_with('@') {
            // other decorators may sit between ours and the function
        } else if let Some(captures) = FUNCTION.captures(statement) {
            let name = &captures["name"];
            if decorated && name.starts_with("test") {
                let id = format!("{}::{name}", display_path.display());
                // a body on the signature line has no docstring
                let description = if statement.ends_with(':') {
                    statements
                        .get(index + 1)
                        .map(String::as_str)
                        .map(docstring)
                        .unwrap_or_default()
                } else {
                    String::new()
                };
                tracing::debug!("{id} verifies {pending:?}");
                tests.push(
                    TestItem::automated(id, description, std::mem::take(&mut pending))
                        .with_source(path),
                );
            }
            pending.clear();
            decorated = false;
        } else {
            pending.clear();
            decorated = false;
        }
    }

    tests
}

/// Split Python source into trimmed, non-empty logical lines.
///
/// Comments are dropped. Physical lines are joined while a bracket is open,
/// after a trailing backslash, and inside triple-quoted strings.
fn logical_lines(source: &str) -> Vec<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '#' => {
                while i + 1 < chars.len() && chars[i + 1] != '\n' {
                    i += 1;
                }
            }
            '"' | '\'' => i = read_string(&chars, i, &mut current),
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '\\' if chars.get(i + 1) == Some(&'\n') => {
                i += 1;
                current.push(' ');
            }
            '\n' if depth > 0 => current.push(' '),
            '\n' => flush(&mut current, &mut lines),
            _ => current.push(c),
        }
        i += 1;
    }
    flush(&mut current, &mut lines);
    lines
}

fn flush(current: &mut String, lines: &mut Vec<String>) {
    let line = current.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
    current.clear();
}

/// Copy the string literal opening at `chars[start]` into `out`, returning
/// the index of its last character.
fn read_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let triple = chars.get(start + 1) == Some(&quote) && chars.get(start + 2) == Some(&quote);
    let width = if triple { 3 } else { 1 };
    let closes = |at: usize| (0..width).all(|offset| chars.get(at + offset) == Some(&quote));

    out.extend(&chars[start..start + width]);
    let mut i = start + width;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if closes(i) {
            out.extend(&chars[i..i + width]);
            return i + width - 1;
        }
        if c == '\n' && !triple {
            // unterminated, leave the newline to end the line
            return i - 1;
        }
        out.push(c);
        i += 1;
    }
    chars.len()
}

/// The first line of a docstring statement, or empty if `statement` is not a
/// string literal.
fn docstring(statement: &str) -> String {
    let literal = statement.trim_start_matches(['r', 'R', 'u', 'U']);
    let Some(quote) = ["\"\"\"", "'''", "\"", "'"]
        .into_iter()
        .find(|quote| literal.starts_with(quote))
    else {
        return String::new();
    };
    let Some(body) = literal[quote.len()..].strip_suffix(quote) else {
        return String::new();
    };
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::TestKind;

    const SOURCE: &str = r#"import pytest
from doxlib import verifies

from project.calculator import add_numbers


@verifies("REQ-001")
def test_1():
    """Test 1."""
    assert add_numbers(1, 2) == 3


@verifies("REQ-011", 'REQ-021')
@pytest.mark.slow
@lib.verifies("REQ-031")
def test_2():
    """
    Test 2 spans lines.

    More detail.
    """
    assert add_numbers(-10.5, -5.5) == -16.0


def test_3():
    """Undecorated."""
    with pytest.raises(ValueError):
        add_numbers(1, "2")


@verifies("REQ-009")
def helper():
    pass


@verifies("REQ-002")
async def test_async(
    fixture,
):
    assert True
"#;

    #[test]
    fn finds_decorated_tests() {
        let tests = scan_source(Path::new("tests/test_calc.py"), SOURCE);

        let ids: Vec<_> = tests.iter().map(TestItem::id).collect();
        assert_eq!(
            ids,
            vec![
                "tests/test_calc.py::test_1",
                "tests/test_calc.py::test_2",
                "tests/test_calc.py::test_async",
            ]
        );
        assert!(tests.iter().all(|test| test.kind() == TestKind::Automated));
        assert_eq!(tests[0].verifies(), ["REQ-001"]);
        assert_eq!(tests[1].verifies(), ["REQ-011", "REQ-021", "REQ-031"]);
        assert_eq!(tests[2].verifies(), ["REQ-002"]);
    }

    #[test]
    fn descriptions_come_from_docstrings() {
        let tests = scan_source(Path::new("test_calc.py"), SOURCE);
        assert_eq!(tests[0].description(), "Test 1.");
        assert_eq!(tests[1].description(), "Test 2 spans lines.");
        assert_eq!(tests[2].description(), "");
    }

    #[test]
    fn statements_break_decorator_chains() {
        let source = "@verifies(\"REQ-001\")\nx = 1\ndef test_x():\n    pass\n";
        assert!(scan_source(Path::new("test_x.py"), source).is_empty());
    }

    #[test]
    fn trailing_comments_are_ignored() {
        let source = r#"
@verifies("REQ-001")  # login flow
def test_login():  # smoke
    """Logs in."""
"#;
        let tests = scan_source(Path::new("test_login.py"), source);
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].verifies(), ["REQ-001"]);
        assert_eq!(tests[0].description(), "Logs in.");
    }

    #[test]
    fn decorator_arguments_may_span_lines() {
        let source = r#"
@verifies(
    "REQ-001",  # happy path
    "REQ-002",
)
@pytest.mark.parametrize(
    "user",
    ["alice", "bob"],
)
def test_login(user):
    pass
"#;
        let tests = scan_source(Path::new("test_login.py"), source);
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].verifies(), ["REQ-001", "REQ-002"]);
    }

    #[test]
    fn hashes_inside_strings_are_kept() {
        let source = "@verifies(\"REQ-#1\")\ndef test_x():\n    pass\n";
        let tests = scan_source(Path::new("test_x.py"), source);
        assert_eq!(tests[0].verifies(), ["REQ-#1"]);
    }

    #[test]
    fn docstrings_do_not_leak_between_functions() {
        let source = r#"
@verifies("REQ-001")
def test_a(): assert True


@verifies("REQ-002")
def test_b():
    """Belongs to B."""


@verifies("REQ-003")
def test_c():  # smoke


def helper():
    """Helper doc."""
"#;
        let tests = scan_source(Path::new("test_a.py"), source);
        let descriptions: Vec<_> = tests
            .iter()
            .map(|test| (test.id(), test.description()))
            .collect();
        assert_eq!(
            descriptions,
            vec![
                ("test_a.py::test_a", ""),
                ("test_a.py::test_b", "Belongs to B."),
                ("test_a.py::test_c", ""),
            ]
        );
    }

    #[test]
    fn brackets_in_docstrings_do_not_join_lines() {
        let source = r#"
@verifies("REQ-001")
def test_x():
    """Opens a (parenthesis."""

@verifies("REQ-002")
def test_y():
    pass
"#;
        let tests = scan_source(Path::new("test_x.py"), source);
        assert_eq!(tests.len(), 2);
        assert_eq!(tests[0].description(), "Opens a (parenthesis.");
        assert_eq!(tests[1].verifies(), ["REQ-002"]);
    }

    #[test]
    fn leading_current_dir_is_stripped() {
        let source = "@verifies(\"REQ-001\")\ndef test_x():\n    pass\n";
        let tests = scan_source(Path::new("./tests/test_x.py"), source);
        assert_eq!(tests[0].id(), "tests/test_x.py::test_x");
        assert_eq!(tests[0].source(), Some(Path::new("./tests/test_x.py")));
    }

    #[test]
    fn discover_walks_matching_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::create_dir_all(root.join(".hidden")).unwrap();
        let source = "@verifies(\"REQ-001\")\ndef test_x():\n    \"\"\"X.\"\"\"\n";
        std::fs::write(root.join("test_b.py"), source).unwrap();
        std::fs::write(root.join("nested").join("a_test.py"), source).unwrap();
        std::fs::write(root.join(".hidden").join("test_c.py"), source).unwrap();
        std::fs::write(root.join("helpers.py"), source).unwrap();

        let tests = discover(&[root.to_path_buf()], &Config::default()).unwrap();

        let files: Vec<_> = tests
            .iter()
            .map(|test| test.source().unwrap().file_name().unwrap().to_owned())
            .collect();
        assert_eq!(files, vec!["a_test.py", "test_b.py"]);
    }

    #[test]
    fn discover_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let result = discover(&[dir.path().join("missing")], &Config::default());
        assert!(matches!(result, Err(ScanError::Walk(_))));
    }
}
