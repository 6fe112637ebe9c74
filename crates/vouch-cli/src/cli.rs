use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vouch",
    about = "Mergeable review annotations stored inside the repository",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Repository to operate on (default: discovered from the current directory)
    #[arg(short = 'C', long = "repo", global = true)]
    pub repo: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a repository and a config template
    Init(InitArgs),
    /// Show the repository, the local store and the acting identity
    Info,
    /// Record the working tree as a code commit on HEAD
    Commit(CommitArgs),
    /// Record votes on a hash: `set HASH [+|-]OP...`
    Set(SetArgs),
    /// Show whether each commit on HEAD carries the primary operation
    Log(LogArgs),
    /// Sign off revisions or `a..b` ranges
    Signoff(SignoffArgs),
    /// Print every value of the local store
    Dump,
    /// Fetch another repository's store into a local ref
    Pull(PullArgs),
    /// Show merged votes on a hash across local and peer stores
    Votes(VotesArgs),
    /// List peer stores
    Peers,
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub hash: String,
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub ops: Vec<String>,
}

#[derive(Args)]
pub struct LogArgs {
    /// Break each commit down by identity, including peers
    #[arg(long)]
    pub peers: bool,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct SignoffArgs {
    #[arg(required = true)]
    pub revisions: Vec<String>,
}

#[derive(Args)]
pub struct PullArgs {
    pub url: String,
    /// Local ref, or a peer name for `refs/vouch-peers/<name>`
    pub reference: String,
}

#[derive(Args)]
pub struct VotesArgs {
    pub hash: String,
    pub operation: Option<String>,
}
