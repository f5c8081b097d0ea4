use std::process;

use clap::Parser;
use tracing::instrument;
use vmatrix::{Config, Report, Severity, Verdict};

use super::{
    OutputFormat, coverage, load_and_review,
    terminal::{Style, Styled, heading, is_narrow, paint},
};

#[derive(Debug, Parser, Default)]
#[command(about = "Validate the documentation and report coverage")]
pub struct Review {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Print a single summary line for scripting
    #[arg(long, short)]
    quiet: bool,
}

impl Review {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let report = load_and_review(config)?;

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Table => {
                if self.quiet {
                    Self::output_quiet(&report);
                } else {
                    Self::output_table(&report);
                }
            }
        }

        if report.verdict() == Verdict::Fail {
            process::exit(2);
        }

        Ok(())
    }

    fn output_quiet(report: &Report) {
        println!(
            "verdict={} errors={} warnings={} covered={} total={}",
            report.verdict().label().to_lowercase(),
            report.count(Severity::Error),
            report.count(Severity::Warning),
            report.coverage().covered_count(),
            report.coverage().len(),
        );
    }

    fn output_table(report: &Report) {
        heading("Issues");

        if report.issues().is_empty() {
            println!("No issues found ✅");
        } else if is_narrow() {
            // Stacked output for narrow terminals
            for issue in report.issues() {
                println!("{}: {}", issue.severity.painted(0), issue.kind);
                println!("  {}", issue.location);
                println!("  {}", paint(&issue.message, Style::Muted));
            }
        } else {
            let width = report
                .issues()
                .iter()
                .map(|issue| issue.kind.name().len())
                .max()
                .unwrap_or(0);
            for issue in report.issues() {
                println!(
                    "{}  {:<width$}  {}: {}",
                    issue.severity.painted(7),
                    issue.kind.name(),
                    issue.location,
                    issue.message
                );
            }
        }

        println!();
        coverage::print_table(report.coverage(), false);
        println!();

        println!(
            "Verdict: {} ({} errors, {} warnings)",
            report.verdict().painted(0),
            report.count(Severity::Error),
            report.count(Severity::Warning),
        );
    }
}
