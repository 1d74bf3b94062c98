use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "spanbase",
    about = "Spanbase: chunked binary objects on SQLite",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Database file (overrides the config file's store path)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a file as a new object
    Put(PutArgs),
    /// Reassemble an object and write it out
    Get(GetArgs),
    /// List the most recent objects
    List(ListArgs),
    /// Show object, span, and byte counts
    Stats,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct PutArgs {
    pub path: PathBuf,
    /// Label stored with the object (defaults to the file name)
    #[arg(short, long)]
    pub text: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub target: String,
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,
}
