//! This bench test reviews a large synthetic project, both in memory and
//! loaded from disk.

#![allow(missing_docs)]

use std::{fmt::Write as _, hint::black_box, path::Path};

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use tempfile::TempDir;
use vmatrix::{
    Config, Input, Project,
    domain::{DocumentMeta, RequirementItem, RequirementsDoc, TestItem, TestStep, TestsDoc},
    engine,
};

const REQUIREMENTS: usize = 2_000;

/// Generates interlinked requirements, half verified by automated tests and
/// half by manual tests.
fn synthetic_input() -> Input {
    let items = (0..REQUIREMENTS)
        .map(|i| {
            let item = RequirementItem::new(format!("REQ-{i:04}"), "The system shall", "Because");
            if i > 0 {
                item.with_parent(format!("REQ-{:04}", i / 2))
            } else {
                item
            }
        })
        .collect();

    let automated = (0..REQUIREMENTS / 2)
        .map(|i| {
            TestItem::automated(
                format!("tests/test_{i}.py::test_{i}"),
                "test",
                [format!("REQ-{i:04}")],
            )
        })
        .collect();

    let manual = (REQUIREMENTS / 2..REQUIREMENTS)
        .map(|i| {
            TestItem::manual(
                format!("TEST-{i}"),
                "manual",
                [format!("REQ-{i:04}"), "REQ-9999".to_string()],
                vec![TestStep::new("given", "when", "then")],
            )
        })
        .collect();

    Input {
        requirements: vec![RequirementsDoc::flat(DocumentMeta::new("Requirements"), items)],
        protocols: vec![TestsDoc::new(DocumentMeta::new("Protocol"), manual)],
        automated,
    }
}

fn preseed_directory(root: &Path) {
    let mut requirements = String::from("title: Requirements\nbody:\n");
    let mut protocol = String::from("title: Protocol\ntests:\n");
    for i in 0..REQUIREMENTS {
        writeln!(
            requirements,
            "  - id: REQ-{i:04}\n    specification: The system shall\n    rationale: Because"
        )
        .unwrap();
        writeln!(
            protocol,
            "  - id: TEST-{i}\n    description: manual\n    verifies: [REQ-{i:04}]\n    \
             steps:\n      - given: g\n        when: w\n        then: t"
        )
        .unwrap();
    }
    std::fs::create_dir_all(root.join("docs")).unwrap();
    std::fs::create_dir_all(root.join("tests")).unwrap();
    std::fs::write(root.join("docs/requirements.yaml"), requirements).unwrap();
    std::fs::write(root.join("docs/tests.yaml"), protocol).unwrap();
    for i in 0..100 {
        std::fs::write(
            root.join(format!("tests/test_{i}.py")),
            format!("@verifies(\"REQ-{i:04}\")\ndef test_{i}():\n    \"\"\"Test {i}.\"\"\"\n"),
        )
        .unwrap();
    }
}

fn review_in_memory(c: &mut Criterion) {
    let input = synthetic_input();
    c.bench_function("review in memory", |b| {
        b.iter(|| engine::review(black_box(&input)));
    });
}

fn review_from_disk(c: &mut Criterion) {
    let tmp_dir = TempDir::new().unwrap();
    preseed_directory(tmp_dir.path());
    let config = Config {
        docs_dirs: vec![tmp_dir.path().join("docs")],
        test_dirs: vec![tmp_dir.path().join("tests")],
        ..Config::default()
    };

    c.bench_function("load and review", |b| {
        b.iter_batched(
            || Project::new(config.clone()),
            |project| engine::review(&project.load().unwrap()),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, review_in_memory, review_from_disk);
criterion_main!(benches);
