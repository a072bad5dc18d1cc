use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shop-detect")]
#[command(about = "Checks a list of URLs for signs of an online shop")]
#[command(version)]
pub struct Args {
    /// File with one URL per line, or a CSV with a URL column
    pub input: PathBuf,

    /// JSON configuration file (keywords, patterns, steps, limits)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of concurrent fetches (overrides the config file)
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds (overrides the config file)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Deadline for the whole batch in seconds
    #[arg(long)]
    pub total_timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tsv)]
    pub format: OutputFormat,

    /// Write results here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Tsv,
    Json,
}
