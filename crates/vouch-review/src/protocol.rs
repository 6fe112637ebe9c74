//! Recording and reading votes.
//!
//! Every vote goes through [`VoteKey`], so the key layout is encoded in one
//! place. Reads that span peers build a [`MergePipeline`] over the
//! `<hash>/<operation>` subtree of each store: the local store first, then
//! each peer in the order given, later sources overwriting earlier ones.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use vouch_db::{optional, KvRead, KvStore, Scoped};
use vouch_merge::MergePipeline;
use vouch_types::{Identity, KeyPath, Operation, Vote, VoteKey};

use crate::error::ReviewResult;

/// Split `[+|-]operation` into an operation and a vote.
///
/// Returns `None` when nothing is left after the sign.
pub fn parse_vote(arg: &str) -> Option<(Operation, Vote)> {
    let (vote, name) = if let Some(rest) = arg.strip_prefix('-') {
        (Vote::Negative, rest)
    } else if let Some(rest) = arg.strip_prefix('+') {
        (Vote::Affirmative, rest)
    } else {
        (Vote::Affirmative, arg)
    };
    if name.is_empty() {
        return None;
    }
    Some((Operation::parse(name), vote))
}

/// Stage `vote` at its key in `store`.
pub fn write_vote<S: KvStore + ?Sized>(store: &mut S, key: &VoteKey, vote: Vote) -> ReviewResult<()> {
    let path = key.to_path()?;
    store.set(&path, vote.as_str())?;
    debug!(%path, vote = vote.as_str(), "staged vote");
    Ok(())
}

/// Stage one `[+|-]operation` vote by `identity` on `hash`.
///
/// Returns `false` when `arg` names no operation and nothing was written.
/// The hash is not checked against the object store.
pub fn record_vote<S: KvStore + ?Sized>(
    store: &mut S,
    hash: &str,
    arg: &str,
    identity: &Identity,
) -> ReviewResult<bool> {
    let Some((operation, vote)) = parse_vote(arg) else {
        debug!(arg, "skipping empty operation");
        return Ok(false);
    };
    let key = VoteKey::new(hash, operation, identity.clone())?;
    write_vote(store, &key, vote)?;
    Ok(true)
}

/// Decode a stored vote value; anything but `"1"` or `"-1"` reads as
/// not affirmative.
fn is_affirmative(path: &KeyPath, value: &str) -> bool {
    match Vote::from_value(value) {
        Ok(vote) => vote.is_affirmative(),
        Err(err) => {
            warn!(%path, %err, "ignoring malformed vote");
            false
        }
    }
}

/// Whether `identity` holds an affirmative vote for `operation` on `hash`.
///
/// An absent vote reads as `false`.
pub fn is_set<S: KvRead + ?Sized>(
    store: &S,
    hash: &str,
    operation: &Operation,
    identity: &Identity,
) -> ReviewResult<bool> {
    let path = VoteKey::new(hash, operation.clone(), identity.clone())?.to_path()?;
    Ok(optional(store.get(&path))?.is_some_and(|value| is_affirmative(&path, &value)))
}

/// Every identity's vote for `operation` on `hash`, merged across the local
/// store and `peers`.
///
/// The local store is applied first and each peer after it, so the last
/// peer holding a vote for an identity decides that identity's entry.
pub fn read_votes<'p, I>(
    local: &dyn KvRead,
    peers: I,
    hash: &str,
    operation: &Operation,
) -> ReviewResult<BTreeMap<String, bool>>
where
    I: IntoIterator<Item = &'p dyn KvRead>,
{
    let prefix = VoteKey::operation_path(hash, operation)?;
    let mut views: Vec<Scoped<&dyn KvRead>> = vec![Scoped::new(local, prefix.clone())];
    for peer in peers {
        views.push(Scoped::new(peer, prefix.clone()));
    }

    let pipeline = views.iter().fold(MergePipeline::new(), |pipeline, view| {
        pipeline.add(KeyPath::root(), view, true)
    });
    let merged = pipeline.run()?;

    let mut votes = BTreeMap::new();
    for identity in merged.list(&KeyPath::root())? {
        let path = KeyPath::root().child(&identity)?;
        if let Some(value) = optional(merged.get(&path))? {
            let affirmative = is_affirmative(&prefix.join(&path), &value);
            votes.insert(identity, affirmative);
        }
    }
    debug!(hash, %operation, sources = views.len(), voters = votes.len(), "read votes");
    Ok(votes)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use proptest::prelude::*;
    use vouch_db::Db;
    use vouch_repo::Repository;

    fn repo() -> Arc<Repository> {
        Arc::new(Repository::in_memory().unwrap())
    }

    fn id(name: &str) -> Identity {
        Identity::new(name, format!("{}@example.com", name.to_lowercase())).unwrap()
    }

    fn store(repo: &Arc<Repository>, reference: &str) -> Db {
        Db::open(Arc::clone(repo), reference).unwrap()
    }

    #[test]
    fn parse_signs() {
        assert_eq!(
            parse_vote("signoff"),
            Some((Operation::SignedOff, Vote::Affirmative))
        );
        assert_eq!(
            parse_vote("+Tested-by"),
            Some((Operation::Tested, Vote::Affirmative))
        );
        assert_eq!(parse_vote("-ack"), Some((Operation::Acked, Vote::Negative)));
        assert_eq!(parse_vote("-"), None);
        assert_eq!(parse_vote("+"), None);
        assert_eq!(parse_vote(""), None);
    }

    #[test]
    fn record_writes_canonical_key() {
        let repo = repo();
        let mut db = store(&repo, "refs/vouch");
        assert!(record_vote(&mut db, "abc123", "signoff", &id("Jane")).unwrap());
        assert_eq!(
            db.get(&KeyPath::parse("abc123/Signed-off-by/Jane <jane@example.com>").unwrap())
                .unwrap(),
            "1"
        );
    }

    #[test]
    fn empty_operation_is_skipped() {
        let repo = repo();
        let mut db = store(&repo, "refs/vouch");
        assert!(!record_vote(&mut db, "abc123", "-", &id("Jane")).unwrap());
        assert!(db.list(&KeyPath::root()).unwrap().is_empty());
    }

    #[test]
    fn negative_overwrites_and_repeat_is_stable() {
        let repo = repo();
        let mut db = store(&repo, "refs/vouch");
        let jane = id("Jane");
        record_vote(&mut db, "h", "review", &jane).unwrap();
        record_vote(&mut db, "h", "review", &jane).unwrap();
        assert!(is_set(&db, "h", &Operation::Reviewed, &jane).unwrap());
        record_vote(&mut db, "h", "-review", &jane).unwrap();
        assert!(!is_set(&db, "h", &Operation::Reviewed, &jane).unwrap());
        assert_eq!(
            db.get(&KeyPath::parse("h/Reviewed-by/Jane <jane@example.com>").unwrap())
                .unwrap(),
            "-1"
        );
    }

    #[test]
    fn absent_vote_is_not_set() {
        let repo = repo();
        let db = store(&repo, "refs/vouch");
        assert!(!is_set(&db, "h", &Operation::Acked, &id("Jane")).unwrap());
    }

    #[test]
    fn malformed_value_reads_as_unset() {
        let repo = repo();
        let mut db = store(&repo, "refs/vouch");
        let jane = id("Jane");
        let path = KeyPath::parse("h/Acked-by/Jane <jane@example.com>").unwrap();
        db.set(&path, "yes").unwrap();
        assert!(!is_set(&db, "h", &Operation::Acked, &jane).unwrap());
        let votes = read_votes(&db, std::iter::empty(), "h", &Operation::Acked).unwrap();
        assert_eq!(votes.get("Jane <jane@example.com>"), Some(&false));
    }

    #[test]
    fn invalid_hash_is_rejected() {
        let repo = repo();
        let mut db = store(&repo, "refs/vouch");
        assert!(record_vote(&mut db, "a/b", "ack", &id("Jane")).is_err());
    }

    #[test]
    fn later_peer_wins() {
        let repo = repo();
        let local = store(&repo, "refs/vouch");
        let mut p1 = store(&repo, "refs/vouch-peers/p1");
        let mut p2 = store(&repo, "refs/vouch-peers/p2");
        let bob = id("Bob");
        record_vote(&mut p1, "h", "ack", &bob).unwrap();
        record_vote(&mut p2, "h", "-ack", &bob).unwrap();

        let peers: Vec<&dyn KvRead> = vec![&p1, &p2];
        let votes = read_votes(&local, peers, "h", &Operation::Acked).unwrap();
        assert_eq!(votes.get("Bob <bob@example.com>"), Some(&false));

        let reversed: Vec<&dyn KvRead> = vec![&p2, &p1];
        let votes = read_votes(&local, reversed, "h", &Operation::Acked).unwrap();
        assert_eq!(votes.get("Bob <bob@example.com>"), Some(&true));
    }

    #[test]
    fn merged_view_unions_voters() {
        let repo = repo();
        let mut local = store(&repo, "refs/vouch");
        let mut peer = store(&repo, "refs/vouch-peers/p");
        record_vote(&mut local, "h", "test", &id("Jane")).unwrap();
        record_vote(&mut peer, "h", "test", &id("Bob")).unwrap();
        record_vote(&mut peer, "other", "test", &id("Carol")).unwrap();

        let votes =
            read_votes(&local, [&peer as &dyn KvRead], "h", &Operation::Tested).unwrap();
        assert_eq!(votes.len(), 2);
        assert!(votes.values().all(|v| *v));
    }

    proptest! {
        #[test]
        fn recorded_vote_reads_back(
            hash in "[0-9a-f]{6,40}",
            op in prop::sample::select(vec!["signoff", "review", "ack", "test", "Custom-by"]),
            negative in any::<bool>(),
            noise in "[0-9a-f]{6,40}",
        ) {
            let repo = repo();
            let mut db = store(&repo, "refs/vouch");
            let jane = id("Jane");
            record_vote(&mut db, &noise, "ack", &id("Bob")).unwrap();
            let arg = if negative { format!("-{op}") } else { op.to_string() };
            record_vote(&mut db, &hash, &arg, &jane).unwrap();

            let operation = Operation::parse(op);
            prop_assert_eq!(is_set(&db, &hash, &operation, &jane).unwrap(), !negative);
            let votes = read_votes(&db, std::iter::empty(), &hash, &operation).unwrap();
            prop_assert_eq!(votes.get(&jane.to_string()).copied(), Some(!negative));
        }
    }
}
