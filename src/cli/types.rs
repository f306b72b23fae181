//! CLI type definitions
//!
//! The host runs one command per process: a command name plus a JSON
//! argument object.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "lacework-adapter")]
#[command(about = "Lacework integration adapter for SOAR hosts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to run, e.g. `fetch-incidents` or `lw-get-alert-details`
    pub command: String,

    /// Command arguments as a JSON object
    #[arg(short, long, conflicts_with = "args_file")]
    pub args: Option<String>,

    /// Read command arguments from a JSON file
    #[arg(long, value_name = "PATH")]
    pub args_file: Option<PathBuf>,

    /// Configuration file (defaults to ./lacework.yaml)
    #[arg(short, long, value_name = "PATH", env = "LACEWORK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the poll cursor file from the configuration
    #[arg(long, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Print the markdown rendering instead of the JSON payload
    #[arg(long)]
    pub human: bool,
}
