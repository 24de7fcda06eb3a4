use clap::{Args, Parser, Subcommand};
use redax_core::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "redax")]
#[command(about = "Redact sensitive data from documents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available redaction rules
    Rules {
        #[arg(long)]
        json: bool,
    },

    /// Check that the document converter is usable
    Status {
        /// Converter binary to check instead of the configured one
        #[arg(long)]
        converter: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Redact a batch of documents
    Run(RunArgs),

    /// Show the active configuration
    Config {
        /// Print only the config file location
        #[arg(long)]
        path: bool,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Files or directories to process
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Rule key to apply (repeatable, e.g. --rule redact_email_address)
    #[arg(long = "rule", short = 'r')]
    pub rules: Vec<String>,

    /// Comma-separated literal terms to redact
    #[arg(long, short = 'k')]
    pub keywords: Option<String>,

    /// Output format: md, pdf, docx or html
    #[arg(long, short = 'f')]
    pub format: Option<OutputFormat>,

    /// Where redacted files are saved (default: current directory)
    #[arg(long, short = 'o')]
    pub out_dir: Option<PathBuf>,

    /// Converter binary, overriding converter.path
    #[arg(long)]
    pub converter: Option<PathBuf>,

    /// Staging directory, overriding staging.dir
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Descend into subdirectories of directory arguments
    #[arg(long)]
    pub recursive: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}
