//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// LDO - Extract table rows from documents with a language model.
#[derive(Debug, Parser)]
#[command(name = "ldo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.ldo/config.toml)
    #[arg(short, long, global = true, env = "LDO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the schema of a database table
    Describe(DescribeArgs),

    /// Extract, validate and insert rows from documents
    Run(RunArgs),
}

/// Arguments for the describe command.
#[derive(Debug, Parser)]
pub struct DescribeArgs {
    /// Target table
    #[arg(short, long)]
    pub table: String,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Target table
    #[arg(short, long)]
    pub table: String,

    /// Document file or folder
    #[arg(short, long)]
    pub input: PathBuf,

    /// JSON file with one gold entry per document
    #[arg(long)]
    pub test_set: Option<PathBuf>,

    /// Pages to keep, e.g. "1,3-5"
    #[arg(long)]
    pub pages: Option<String>,

    /// Fail the run on insert failures and quality gate rejections
    #[arg(long)]
    pub strict: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
