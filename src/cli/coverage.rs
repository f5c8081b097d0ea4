use std::{collections::BTreeMap, process};

use clap::Parser;
use tracing::instrument;
use vmatrix::{
    Config, CoverageResult,
    engine::{CoverageStatus, RequirementCoverage},
};

use super::{
    OutputFormat, load_and_review,
    terminal::{Style, Styled, heading, is_narrow, paint},
};

#[derive(Debug, Parser, Default)]
#[command(about = "Show which tests verify each active requirement")]
pub struct Coverage {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Only show requirements no test verifies
    #[arg(long)]
    uncovered: bool,
}

impl Coverage {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let report = load_and_review(config)?;
        let coverage = report.coverage();

        match self.output {
            OutputFormat::Json => {
                let entries: BTreeMap<&str, &RequirementCoverage> = coverage
                    .iter()
                    .filter(|(_, entry)| {
                        !self.uncovered || entry.status == CoverageStatus::Uncovered
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            OutputFormat::Table => print_table(coverage, self.uncovered),
        }

        if !coverage.is_complete() {
            process::exit(2);
        }

        Ok(())
    }
}

/// Print the coverage matrix.
pub fn print_table(coverage: &CoverageResult, uncovered_only: bool) {
    heading("Coverage");

    if coverage.is_empty() {
        println!("{}", paint("No active requirements found.", Style::Muted));
        return;
    }

    let width = coverage.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
    let narrow = is_narrow();

    for (id, entry) in coverage.iter() {
        if uncovered_only && entry.status == CoverageStatus::Covered {
            continue;
        }
        let tests: Vec<_> = entry.tests.iter().map(|test| test.id.as_str()).collect();

        if narrow {
            // Stacked output for narrow terminals
            println!("{id}: {}", entry.status.painted(0));
            for test in tests {
                println!("  - {test}");
            }
        } else {
            println!(
                "{id:<width$}  {}  {}",
                entry.status.painted(9),
                tests.join(", ")
            );
        }
    }

    println!();
    let covered = coverage.covered_count();
    let total = coverage.len();
    let style = if covered == total {
        Style::Good
    } else {
        Style::Caution
    };
    println!(
        "{}",
        paint(&format!("{covered}/{total} requirements covered"), style)
    );
}
