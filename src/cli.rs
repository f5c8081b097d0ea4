use std::path::{Path, PathBuf};

mod coverage;
mod review;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use coverage::Coverage;
use review::Review;
use tracing::instrument;
use vmatrix::{
    Config, Input, IssueKind, Project, Report,
    domain::config::DEFAULT_CONFIG_FILE,
    engine::{self, ReviewOptions},
};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// A directory searched for requirements and test protocols (repeatable)
    #[arg(long = "docs-dir", value_name = "DIR", global = true)]
    docs_dirs: Vec<PathBuf>,

    /// A directory searched for automated tests (repeatable)
    #[arg(long = "test-dir", value_name = "DIR", global = true)]
    test_dirs: Vec<PathBuf>,

    /// An issue kind to suppress, e.g. `empty-step-sequence` (repeatable)
    #[arg(long, value_name = "KIND", global = true)]
    ignore: Vec<IssueKind>,

    /// Path to the configuration file [default: vmatrix.toml]
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        // a fresh config starts from the defaults, not from a file that may be broken
        let mut config = if matches!(self.command, Some(Command::Init)) {
            Config::default()
        } else {
            Config::discover(self.config.as_deref()).context("failed to load configuration")?
        };
        if !self.docs_dirs.is_empty() {
            config.docs_dirs = self.docs_dirs;
        }
        if !self.test_dirs.is_empty() {
            config.test_dirs = self.test_dirs;
        }
        if !self.ignore.is_empty() {
            config.ignore = self.ignore;
        }
        tracing::debug!(?config, "resolved configuration");

        let config_path = self
            .config
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        self.command
            .unwrap_or_else(|| Command::Review(Review::default()))
            .run(&config, &config_path)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Validate the documentation and report coverage (default)
    Review(Review),

    /// Show the requirement-to-test coverage matrix
    Coverage(Coverage),

    /// Write a configuration file holding the resolved settings
    Init,
}

impl Command {
    fn run(self, config: &Config, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Review(command) => command.run(config)?,
            Self::Coverage(command) => command.run(config)?,
            Self::Init => Init::run(config, config_path)?,
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Init {}

impl Init {
    #[instrument(skip(config))]
    fn run(config: &Config, path: &Path) -> anyhow::Result<()> {
        config
            .init(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        println!("Created {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Load the project and review it.
fn load_and_review(config: &Config) -> anyhow::Result<Report> {
    let input: Input = Project::new(config.clone())
        .load()
        .context("failed to load project")?;
    Ok(engine::review_with(&input, &ReviewOptions::from(config)))
}
