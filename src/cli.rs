use crate::config::Config;
use crate::model::WeekRange;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weekly-digest")]
#[command(about = "Weekly engineering digests from collected commit logs")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Path to config file (default: ./weekly-digest.toml if present)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Path to the collected commit dump")]
    pub input: Option<PathBuf>,

    #[arg(long, help = "Directory for saved JSON reports")]
    pub report_dir: Option<PathBuf>,

    #[arg(long, help = "Do not save the report to the report directory", default_value_t = false)]
    pub no_save: bool,
}

#[derive(Args, Clone, Copy)]
pub struct WeekArgs {
    #[arg(help = "First day of the week (YYYY-MM-DD)")]
    pub start: NaiveDate,

    #[arg(help = "Last day of the week (YYYY-MM-DD)")]
    pub end: NaiveDate,
}

impl WeekArgs {
    pub fn range(&self) -> Result<WeekRange> {
        WeekRange::new(self.start, self.end).context("Invalid reporting week")
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Per-repository, per-author and per-type commit breakdown
    Technical {
        #[clap(flatten)]
        week: WeekArgs,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output commit records as NDJSON")]
        ndjson: bool,
    },
    /// Initiative rollup and component health
    Business {
        #[clap(flatten)]
        week: WeekArgs,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Analyse each configured repository in parallel and aggregate the results
    Orchestrate {
        #[clap(flatten)]
        week: WeekArgs,

        #[clap(flatten)]
        opts: OrchestrateArgs,
    },
}

#[derive(Args, Clone)]
pub struct OrchestrateArgs {
    #[arg(long, help = "Aggregate existing analysis artifacts without re-running analysis")]
    pub aggregate_only: bool,

    #[arg(long, help = "Directory of per-repository commit dumps")]
    pub commit_dir: Option<PathBuf>,

    #[arg(long, help = "Directory for per-repository analysis artifacts")]
    pub artifact_dir: Option<PathBuf>,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}

impl CommonArgs {
    /// Loads the config file and folds the CLI overrides into it.
    pub fn config(&self) -> Result<Config> {
        let mut config =
            Config::load(self.config.as_deref()).context("Failed to load configuration")?;
        if let Some(input) = &self.input {
            config.input.log_file = input.clone();
        }
        if let Some(dir) = &self.report_dir {
            config.output.report_dir = dir.clone();
        }
        Ok(config)
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Technical { week, json, ndjson } => {
                crate::technical::exec(self.common, week.range()?, json, ndjson)
            }
            Commands::Business { week, json } => {
                crate::summary::exec(self.common, week.range()?, json)
            }
            Commands::Orchestrate { week, opts } => {
                crate::orchestrate::exec(self.common, week.range()?, opts)
            }
        }
    }
}
