use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "logfacets",
    about = "Report page reference counts and referrer sites from web access logs",
    version,
    long_about = None
)]
pub struct Args {
    /// SQLite file holding the access-log rows
    #[arg(long)]
    pub store: PathBuf,

    /// Database (schema) name the log store is attached as
    #[arg(long)]
    pub db_name: String,

    /// Log table name
    #[arg(long)]
    pub table_name: String,

    /// Domain to report on (e.g. example.com)
    #[arg(long)]
    pub domain: String,

    /// Number of referrer sites to display
    #[arg(short, long, default_value_t = 10)]
    pub top: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
