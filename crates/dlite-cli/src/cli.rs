use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dlite",
    about = "Inspect, hash and query DLite collection bundles",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Prefix prepended to every relation id
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Fail when a member instance cannot be resolved
    #[arg(long, global = true)]
    pub strict: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the members of a collection
    Inspect(InspectArgs),
    /// Print the recursive content hash of a collection
    Hash(HashArgs),
    /// Query relations by subject, predicate and object
    Relations(RelationsArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    /// Bundle file (JSON)
    pub file: PathBuf,
}

#[derive(Args)]
pub struct HashArgs {
    /// Bundle file (JSON)
    pub file: PathBuf,
}

#[derive(Args)]
pub struct RelationsArgs {
    /// Bundle file (JSON)
    pub file: PathBuf,
    #[arg(short, long)]
    pub subject: Option<String>,
    #[arg(short, long)]
    pub predicate: Option<String>,
    #[arg(short, long)]
    pub object: Option<String>,
}
