use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "archplan")]
#[command(about = "Validate, order and execute architecture-generation plans")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(subcommand)]
    Plan(PlanCommand),
    Run(RunArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum PlanCommand {
    /// Repair a candidate plan and show what changed.
    Validate(PlanFileArgs),
    /// Repair a candidate plan and show its execution order.
    Order(PlanFileArgs),
}

#[derive(Debug, Clone, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, clap::Args)]
pub struct PlanFileArgs {
    #[arg(long)]
    pub plan: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    #[arg(long)]
    pub plan: PathBuf,
    #[arg(long = "doc")]
    pub docs: Vec<PathBuf>,
    #[arg(long, default_value = "")]
    pub prompt: String,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Append engine events as JSONL to this file, or print them instead of the summary with `-`.
    #[arg(long)]
    pub events_jsonl: Option<String>,
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
