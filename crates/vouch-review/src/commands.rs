//! The operations behind each `vouch` command.
//!
//! Each function takes an open [`Session`] and returns a report for the
//! caller to print; none of them write to stdout themselves except `dump`
//! and `pull`, which stream into a caller-supplied sink. Run them through
//! [`Session::run`] so the notes are rebuilt afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::info;
use vouch_db::{dump as dump_store, Db, KvRead, KvStore};
use vouch_refs::names::LOCAL_STORE_REF;
use vouch_refs::{peer_ref, validate_ref_name};
use vouch_repo::revision::is_range;
use vouch_repo::{FetchOutcome, LocalTransport, ObjectId, Repository};
use vouch_types::{Identity, KeyPath, Operation, Vote, VoteKey};

use crate::config::TEMPLATE;
use crate::error::{ConfigError, ReviewResult};
use crate::peers::AuthRules;
use crate::protocol::{is_set, read_votes, record_vote, write_vote};
use crate::session::Session;

/// Create a repository at `path` with a config template.
pub fn init(path: &Path) -> ReviewResult<Repository> {
    let repo = Repository::init(path)?;
    if let Some(config_path) = repo.config_path() {
        fs::write(&config_path, TEMPLATE).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;
    }
    info!(path = %path.display(), "initialized repository");
    Ok(repo)
}

/// What `info` reports.
#[derive(Clone, Debug)]
pub struct InfoReport {
    pub repo: String,
    /// Latest commit of the local store, `None` before the first vote.
    pub latest: Option<ObjectId>,
    pub identity: Identity,
    pub scope: KeyPath,
    pub auth: AuthRules,
    pub peers: Vec<String>,
}

pub fn info(session: &Session) -> ReviewResult<InfoReport> {
    Ok(InfoReport {
        repo: session.repository().to_string(),
        latest: session.local().inner().latest(),
        identity: session.identity().clone(),
        scope: session.scope().clone(),
        auth: session.auth().clone(),
        peers: session.peers()?.into_keys().collect(),
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetOutcome {
    /// Votes written; empty operations are not counted.
    pub recorded: usize,
    pub commit: ObjectId,
}

/// Record `ops` on `hash` and commit with the space-joined arguments as
/// the message.
pub fn set(session: &mut Session, hash: &str, ops: &[String]) -> ReviewResult<SetOutcome> {
    let identity = session.identity().clone();
    let mut recorded = 0;
    for op in ops {
        if record_vote(session.local_mut(), hash, op, &identity)? {
            recorded += 1;
        }
    }
    let message = std::iter::once(hash)
        .chain(ops.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    let commit = session.local_mut().commit(&message)?;
    Ok(SetOutcome { recorded, commit })
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LogOptions {
    /// Also collect every identity's vote from the local store and peers.
    pub peers: bool,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub commit: ObjectId,
    /// Whether the acting identity holds the primary operation.
    pub ok: bool,
    /// Identity to vote; empty unless [`LogOptions::peers`] is set.
    pub votes: BTreeMap<String, bool>,
}

/// Record the working tree as a new code commit on `HEAD`, authored by the
/// acting identity. Returns the new commit.
pub fn commit(session: &Session, message: &str) -> ReviewResult<ObjectId> {
    let author = session.identity().to_string();
    Ok(session.repository().commit_worktree(&author, message)?)
}

/// Walk first parents from `HEAD`, checking the primary operation on each
/// commit. An unborn `HEAD` is an error.
pub fn log(session: &Session, options: LogOptions) -> ReviewResult<Vec<LogEntry>> {
    let repo = session.repository();
    let head = repo.resolve_revision("HEAD")?;
    let primary = session.primary();
    let peers = if options.peers {
        Some(session.peers()?)
    } else {
        None
    };

    let mut entries = Vec::new();
    for commit in repo.first_parent_history(head, options.limit)? {
        let hash = commit.to_hex();
        let ok = is_set(session.local(), &hash, &primary, session.identity())?;
        let votes = match &peers {
            Some(peers) => read_votes(
                session.local(),
                peers.values().map(|p| p as &dyn KvRead),
                &hash,
                &primary,
            )?,
            None => BTreeMap::new(),
        };
        entries.push(LogEntry { commit, ok, votes });
    }
    Ok(entries)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignoffOutcome {
    /// Commits signed, in argument order.
    pub signed: Vec<ObjectId>,
    pub commit: ObjectId,
}

/// Sign off every commit named by `args`: single revisions, or `a..b`
/// ranges (reachable from `b`, not from `a`). Commits once at the end.
pub fn signoff(session: &mut Session, args: &[String]) -> ReviewResult<SignoffOutcome> {
    let repo = Arc::clone(session.repository());
    let identity = session.identity().clone();
    let mut signed = Vec::new();
    for arg in args {
        let commits = if is_range(arg) {
            let (from, to) = repo.resolve_range(arg)?;
            repo.walk_range(from, to)?
        } else {
            vec![repo.resolve_revision(arg)?]
        };
        for commit in commits {
            let key = VoteKey::new(commit.to_hex(), Operation::SignedOff, identity.clone())?;
            write_vote(session.local_mut(), &key, Vote::Affirmative)?;
            signed.push(commit);
        }
    }
    let commit = session
        .local_mut()
        .commit(&format!("signoff {}", args.join(" ")))?;
    info!(count = signed.len(), "signed off");
    Ok(SignoffOutcome { signed, commit })
}

/// Write the local store as `path = value` lines.
pub fn dump(session: &Session, sink: &mut dyn Write) -> ReviewResult<()> {
    dump_store(session.local(), sink)?;
    Ok(())
}

/// Fetch the store of the repository at `url` into `reference` and dump it.
///
/// A bare name is taken as a peer name, `refs/vouch-peers/<name>`.
pub fn pull(
    session: &Session,
    url: &str,
    reference: &str,
    sink: &mut dyn Write,
) -> ReviewResult<FetchOutcome> {
    let local_ref = if reference.starts_with("refs/") {
        validate_ref_name(reference)?;
        reference.to_string()
    } else {
        peer_ref(reference)?
    };
    let repo = session.repository();
    let transport = LocalTransport::open(url)?;
    let outcome = repo.fetch(&transport, LOCAL_STORE_REF, &local_ref)?;
    Db::open(Arc::clone(repo), &local_ref)?.dump(sink)?;
    Ok(outcome)
}

/// Merged votes on `hash`, per operation.
///
/// With `operation` set only that operation is reported; otherwise every
/// operation present in the local store or any peer.
pub fn votes(
    session: &Session,
    hash: &str,
    operation: Option<Operation>,
) -> ReviewResult<BTreeMap<String, BTreeMap<String, bool>>> {
    let peers = session.peers()?;
    let sources: Vec<&dyn KvRead> = std::iter::once(session.local() as &dyn KvRead)
        .chain(peers.values().map(|p| p as &dyn KvRead))
        .collect();

    let operations = match operation {
        Some(op) => vec![op],
        None => {
            let hash_path = KeyPath::root().child(hash)?;
            let mut names = BTreeSet::new();
            for source in &sources {
                names.extend(source.list(&hash_path)?);
            }
            names.iter().map(|n| Operation::parse(n)).collect()
        }
    };

    let mut report = BTreeMap::new();
    for op in operations {
        let merged = read_votes(
            session.local(),
            peers.values().map(|p| p as &dyn KvRead),
            hash,
            &op,
        )?;
        if !merged.is_empty() {
            report.insert(op.as_str().to_string(), merged);
        }
    }
    Ok(report)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerSummary {
    pub name: String,
    pub reference: String,
    pub latest: Option<ObjectId>,
}

pub fn peers(session: &Session) -> ReviewResult<Vec<PeerSummary>> {
    Ok(session
        .peers()?
        .into_iter()
        .map(|(name, store)| PeerSummary {
            reference: store.inner().reference().unwrap_or_default().to_string(),
            latest: store.inner().latest(),
            name,
        })
        .collect())
}
