//! evalcli - batch scoring of generated arrangements
//!
//! Subcommands:
//! - `evalcli score <inputs>...` - Run the IM/IR/DP tests over sample files
//! - `evalcli config` - Show the effective configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod input;
mod output;

#[derive(Parser)]
#[command(name = "evalcli")]
#[command(about = "Score generated arrangements against ground-truth instrument activity")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./arrange-eval.toml)
    #[arg(long, global = true, env = "ARRANGE_EVAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score sample files and print per-sample and corpus scores
    Score {
        /// Sample JSON files or directories containing them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for report files (overrides paths.report_dir)
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Do not write report files
        #[arg(long)]
        no_report: bool,

        /// Only print the corpus total
        #[arg(short, long)]
        quiet: bool,

        /// Print the corpus total as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration and its sources
    Config,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, sources) = commands::load_config(cli.config.as_deref())?;
    init_logging(&config.telemetry.log_level);

    match cli.command {
        Commands::Score {
            inputs,
            report_dir,
            no_report,
            quiet,
            json,
        } => commands::score(
            &config,
            commands::ScoreOptions {
                inputs,
                report_dir,
                no_report,
                quiet,
                json,
            },
        )?,
        Commands::Config => commands::show_config(&config, &sources),
    }

    Ok(())
}
