//! Command-line arguments for the `mailprobe` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mailprobe", version, about = "Validate email addresses via syntax, MX and SMTP checks")]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true, env = "MAILPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip the SMTP probe; verdicts stop at MX confirmation.
    #[arg(long, global = true)]
    pub no_smtp: bool,

    /// Envelope sender used for MAIL FROM.
    #[arg(long, global = true, env = "MAILPROBE_FROM")]
    pub from: Option<String>,

    /// DNS timeout in seconds.
    #[arg(long, global = true)]
    pub dns_timeout: Option<u64>,

    /// Per-connection SMTP timeout in seconds.
    #[arg(long, global = true)]
    pub smtp_timeout: Option<u64>,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a single address and print the result as JSON.
    Check {
        email: String,
    },
    /// Validate every address in a file and write results.json / results.csv.
    Batch {
        /// Text file with one address per line, or a CSV with an `email` column.
        input: PathBuf,

        /// Directory receiving the export files.
        #[arg(short, long, default_value = "results")]
        out: PathBuf,

        /// Number of concurrent workers (0 selects the default of 12).
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        workers: i64,

        /// Hide the progress bar.
        #[arg(long)]
        quiet: bool,
    },
}
