//! Per-hash summaries in the notes store.
//!
//! The notes store is a projection of the local store and is rebuilt from
//! scratch by every command; it is never merged from peers.

use tracing::{info, warn};
use vouch_db::{Db, KvRead, KvStore};
use vouch_types::{KeyPath, VoteKey};

use crate::error::ReviewResult;

/// Commit message of every notes rebuild.
pub const SYNC_MESSAGE: &str = "sync";

/// Render the note for `hash`: sorted `"<operation>: <identity>"` lines,
/// newline-terminated.
///
/// Negative votes are listed too; the note records who voted, not how.
/// Keys that do not decode as votes are left out.
pub fn render_note<L: KvRead + ?Sized>(local: &L, hash: &str) -> ReviewResult<String> {
    let hash_path = KeyPath::root().child(hash)?;
    let mut lines = Vec::new();
    for operation in local.list(&hash_path)? {
        let operation_path = hash_path.child(&operation)?;
        for identity in local.list(&operation_path)? {
            let path = operation_path.child(&identity)?;
            match VoteKey::from_path(&path) {
                Ok(key) => lines.push(format!("{}: {}", key.operation, key.identity)),
                Err(err) => warn!(%path, %err, "skipping undecodable vote key"),
            }
        }
    }
    lines.sort();
    Ok(lines.join("\n") + "\n")
}

/// Replace the contents of `notes` with one note per hash in `local` and
/// commit it on top of the previous notes commit.
///
/// Notes for hashes no longer in `local` are dropped. Returns the number of
/// notes written.
pub fn sync_notes<L: KvRead + ?Sized>(local: &L, notes: &mut Db) -> ReviewResult<usize> {
    notes.clear()?;
    let hashes = local.list(&KeyPath::root())?;
    for hash in &hashes {
        let note = render_note(local, hash)?;
        notes.set(&KeyPath::root().child(hash)?, &note)?;
    }
    let commit = notes.commit(SYNC_MESSAGE)?;
    info!(notes = hashes.len(), %commit, "synced notes");
    Ok(hashes.len())
}
