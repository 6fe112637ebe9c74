use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use tracing::debug;
use vouch_repo::{ObjectId, Repository};
use vouch_review::commands::{self, InfoReport, LogEntry, LogOptions, PeerSummary};
use vouch_review::{Config, Session};
use vouch_types::Operation;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        format,
        repo,
        ..
    } = cli;
    match command {
        Command::Init(args) => cmd_init(repo, args),
        Command::Info => cmd_info(open_session(repo)?, format),
        Command::Commit(args) => cmd_commit(open_session(repo)?, args, format),
        Command::Set(args) => cmd_set(open_session(repo)?, args, format),
        Command::Log(args) => cmd_log(open_session(repo)?, args, format),
        Command::Signoff(args) => cmd_signoff(open_session(repo)?, args, format),
        Command::Dump => cmd_dump(open_session(repo)?),
        Command::Pull(args) => cmd_pull(open_session(repo)?, args),
        Command::Votes(args) => cmd_votes(open_session(repo)?, args, format),
        Command::Peers => cmd_peers(open_session(repo)?, format),
    }
}

fn open_session(repo: Option<PathBuf>) -> anyhow::Result<Session> {
    let start = match repo {
        Some(path) => path,
        None => env::current_dir().context("cannot read current directory")?,
    };
    let repo = Repository::discover(&start)?;
    let config = Config::for_repository(&repo)?.with_process_env();
    debug!(%repo, "loaded configuration");
    Ok(Session::open(Arc::new(repo), config)?)
}

fn show_commit(id: Option<ObjectId>) -> String {
    id.map_or_else(|| "(none)".to_string(), |id| id.to_hex())
}

fn cmd_init(repo: Option<PathBuf>, args: InitArgs) -> anyhow::Result<()> {
    let path = match args.path.or(repo) {
        Some(path) => path,
        None => env::current_dir().context("cannot read current directory")?,
    };
    let repo = commands::init(&path)?;
    println!("{} Initialized vouch repository in {}", "✓".green().bold(), repo.to_string().bold());
    if let Some(config) = repo.config_path() {
        println!("  Config: {}", config.display());
    }
    Ok(())
}

pub(crate) fn info_lines(report: &InfoReport) -> Vec<String> {
    let mut lines = vec![
        format!("repo = {}", report.repo),
        format!("DB = {}", show_commit(report.latest)),
        format!("User name = {}", report.identity.name()),
        format!("User email = {}", report.identity.email()),
    ];
    for (remote, patterns) in &report.auth {
        for pattern in patterns {
            lines.push(format!("auth: allow '{pattern}' from '{remote}'"));
        }
    }
    for peer in &report.peers {
        lines.push(format!("peer = {peer}"));
    }
    lines
}

fn cmd_info(session: Session, format: OutputFormat) -> anyhow::Result<()> {
    let report = session.run(|s| commands::info(s))?;
    match format {
        OutputFormat::Text => {
            for line in info_lines(&report) {
                println!("{line}");
            }
        }
        OutputFormat::Json => print_json(&json!({
            "repo": report.repo,
            "db": report.latest.map(|id| id.to_hex()),
            "user": { "name": report.identity.name(), "email": report.identity.email() },
            "scope": report.scope.to_string(),
            "auth": report.auth,
            "peers": report.peers,
        }))?,
    }
    Ok(())
}

fn cmd_commit(session: Session, args: CommitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let commit = session.run(|s| commands::commit(s, &args.message))?;
    match format {
        OutputFormat::Text => println!(
            "{} {} {}",
            "✓".green().bold(),
            commit.short_hex().yellow(),
            args.message
        ),
        OutputFormat::Json => print_json(&json!({
            "commit": commit.to_hex(),
            "message": args.message,
        }))?,
    }
    Ok(())
}

fn cmd_set(session: Session, args: SetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let outcome = session.run(|s| commands::set(s, &args.hash, &args.ops))?;
    match format {
        OutputFormat::Text => println!(
            "{} {} vote(s) on {} ({})",
            "✓".green().bold(),
            outcome.recorded,
            args.hash.yellow(),
            outcome.commit.short_hex().dimmed()
        ),
        OutputFormat::Json => print_json(&json!({
            "hash": args.hash,
            "recorded": outcome.recorded,
            "commit": outcome.commit.to_hex(),
        }))?,
    }
    Ok(())
}

pub(crate) fn log_lines(entry: &LogEntry) -> Vec<String> {
    let hash = entry.commit.to_hex();
    let mark = if entry.ok { "OK".green() } else { "X".red() };
    let mut lines = vec![format!("{hash} {mark}")];
    for (identity, vote) in &entry.votes {
        let mark = if *vote { "OK".green() } else { "X".red() };
        lines.push(format!("    {identity} {mark}"));
    }
    lines
}

fn cmd_log(session: Session, args: LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let options = LogOptions {
        peers: args.peers,
        limit: args.limit,
    };
    let entries = session.run(|s| commands::log(s, options))?;
    match format {
        OutputFormat::Text => {
            for entry in &entries {
                for line in log_lines(entry) {
                    println!("{line}");
                }
            }
        }
        OutputFormat::Json => print_json(&json!(entries
            .iter()
            .map(|e| json!({ "commit": e.commit.to_hex(), "ok": e.ok, "votes": e.votes }))
            .collect::<Vec<_>>()))?,
    }
    Ok(())
}

fn cmd_signoff(session: Session, args: SignoffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let outcome = session.run(|s| commands::signoff(s, &args.revisions))?;
    match format {
        OutputFormat::Text => {
            for commit in &outcome.signed {
                println!("  {} {}", "signed:".green(), commit.to_hex());
            }
            println!(
                "{} Signed off {} commit(s) ({})",
                "✓".green().bold(),
                outcome.signed.len(),
                outcome.commit.short_hex().dimmed()
            );
        }
        OutputFormat::Json => print_json(&json!({
            "signed": outcome.signed.iter().map(|id| id.to_hex()).collect::<Vec<_>>(),
            "commit": outcome.commit.to_hex(),
        }))?,
    }
    Ok(())
}

fn cmd_dump(session: Session) -> anyhow::Result<()> {
    let stdout = io::stdout();
    session.run(|s| commands::dump(s, &mut stdout.lock()))?;
    Ok(())
}

fn cmd_pull(session: Session, args: PullArgs) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let outcome = session
        .run(|s| commands::pull(s, &args.url, &args.reference, &mut stdout.lock()))
        .with_context(|| format!("pull from {}", args.url))?;
    let status = if outcome.is_up_to_date() {
        "up to date".green()
    } else {
        format!("{} object(s)", outcome.objects_copied).yellow()
    };
    eprintln!("{} -> {}: {}", args.url.bold(), outcome.local_ref, status);
    Ok(())
}

fn cmd_votes(session: Session, args: VotesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let operation = args.operation.as_deref().map(Operation::parse);
    let report = session.run(|s| commands::votes(s, &args.hash, operation))?;
    match format {
        OutputFormat::Text => {
            if report.is_empty() {
                println!("No votes on {}.", args.hash.yellow());
            }
            for (operation, votes) in &report {
                println!("{}", operation.bold());
                for (identity, vote) in votes {
                    let mark = if *vote { "+1".green() } else { "-1".red() };
                    println!("  {mark} {identity}");
                }
            }
        }
        OutputFormat::Json => print_json(&json!(report))?,
    }
    Ok(())
}

fn cmd_peers(session: Session, format: OutputFormat) -> anyhow::Result<()> {
    let peers: Vec<PeerSummary> = session.run(|s| commands::peers(s))?;
    match format {
        OutputFormat::Text => {
            if peers.is_empty() {
                println!("No peers.");
            }
            for peer in &peers {
                println!("{}  {}", peer.name.bold(), show_commit(peer.latest).dimmed());
            }
        }
        OutputFormat::Json => print_json(&json!(peers
            .iter()
            .map(|p| json!({
                "name": p.name,
                "reference": p.reference,
                "latest": p.latest.map(|id| id.to_hex()),
            }))
            .collect::<Vec<_>>()))?,
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
