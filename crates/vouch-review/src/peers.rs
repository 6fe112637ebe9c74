//! Peer stores and remote allow-lists.
//!
//! A peer is any reference under `refs/vouch-peers/`. Peers are returned in
//! name order, which is also the order their votes are overlaid in.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};
use vouch_db::{Db, Scoped};
use vouch_refs::names::PEER_REF_PREFIX;
use vouch_refs::validate_peer_name;
use vouch_repo::Repository;
use vouch_types::KeyPath;

use crate::config::Config;
use crate::error::ReviewResult;

/// Remote name to its ordered allow-patterns.
pub type AuthRules = BTreeMap<String, Vec<String>>;

/// Open every peer store, scoped like the local store.
///
/// Refs whose remainder is not a single valid peer name are skipped.
pub fn discover_peers(
    repo: &Arc<Repository>,
    scope: &KeyPath,
) -> ReviewResult<BTreeMap<String, Scoped<Db>>> {
    let mut peers = BTreeMap::new();
    for (name, _) in repo.refs().list_refs(PEER_REF_PREFIX)? {
        let Some(peer) = name.strip_prefix(PEER_REF_PREFIX) else {
            continue;
        };
        if let Err(e) = validate_peer_name(peer) {
            warn!(reference = %name, error = %e, "skipping peer ref");
            continue;
        }
        let db = Db::open(Arc::clone(repo), &name)?;
        peers.insert(peer.to_string(), Scoped::new(db, scope.clone()));
    }
    debug!(count = peers.len(), "discovered peers");
    Ok(peers)
}

/// Allow-lists from `[remote.<name>] allow = [...]`.
///
/// Entries that are not a table with a string-array `allow` are skipped with
/// a warning, as are non-string patterns. The rules are reported, not
/// enforced.
pub fn load_auth_rules(config: &Config) -> AuthRules {
    let mut rules = AuthRules::new();
    for (remote, value) in &config.remote {
        let Some(allow) = value.get("allow") else {
            warn!(remote = %remote, "remote has no allow list, skipping");
            continue;
        };
        let Some(items) = allow.as_array() else {
            warn!(remote = %remote, "remote allow is not an array, skipping");
            continue;
        };
        let mut patterns = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str() {
                Some(pattern) => patterns.push(pattern.to_string()),
                None => warn!(remote = %remote, entry = %item, "ignoring non-string allow entry"),
            }
        }
        rules.insert(remote.clone(), patterns);
    }
    rules
}
