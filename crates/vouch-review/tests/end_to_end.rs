//! Command-level behaviour over real repositories.

use std::sync::Arc;

use vouch_db::{Db, DbError, KvRead, KvStore};
use vouch_repo::{ObjectId, ObjectStore, Repository, Tree};
use vouch_review::commands::{self, LogOptions};
use vouch_review::{Config, ReviewError, Session};
use vouch_types::{KeyPath, Operation};

fn jane() -> Config {
    Config::default().with_identity("Jane Doe", "jane@example.com")
}

fn key(s: &str) -> KeyPath {
    KeyPath::parse(s).unwrap()
}

/// Commit `n` code commits on `HEAD`, oldest first.
fn code_history(repo: &Repository, n: usize) -> Vec<ObjectId> {
    let tree = repo.write_tree(&Tree::empty()).unwrap();
    (0..n)
        .map(|i| repo.commit_to_head(tree, "dev", &format!("change {i}")).unwrap())
        .collect()
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn run<T>(
    repo: &Arc<Repository>,
    config: Config,
    body: impl FnOnce(&mut Session) -> vouch_review::ReviewResult<T>,
) -> T {
    Session::open(Arc::clone(repo), config)
        .unwrap()
        .run(body)
        .unwrap()
}

fn seed_peer(repo: &Arc<Repository>, peer: &str, path: &str, value: &str) {
    let mut db = Db::open(Arc::clone(repo), &format!("refs/vouch-peers/{peer}")).unwrap();
    db.set(&key(path), value).unwrap();
    db.commit("seed").unwrap();
}

#[test]
fn set_then_log_reports_signoff() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let head = code_history(&repo, 1)[0];
    let hash = head.to_hex();

    run(&repo, jane(), |s| commands::set(s, &hash, &args(&["signoff"])));
    let log = run(&repo, jane(), |s| commands::log(s, LogOptions::default()));
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].commit, head);
    assert!(log[0].ok);

    run(&repo, jane(), |s| commands::set(s, &hash, &args(&["-signoff"])));
    let log = run(&repo, jane(), |s| commands::log(s, LogOptions::default()));
    assert!(!log[0].ok);
}

#[test]
fn set_commit_message_is_joined_arguments() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let outcome = run(&repo, jane(), |s| {
        commands::set(s, "abc123", &args(&["review", "-ack", "+"]))
    });
    assert_eq!(outcome.recorded, 2);
    assert_eq!(
        repo.read_commit(&outcome.commit).unwrap().message,
        "abc123 review -ack +"
    );
}

#[test]
fn log_other_identity_is_unmarked() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let hash = code_history(&repo, 1)[0].to_hex();
    run(&repo, jane(), |s| commands::set(s, &hash, &args(&["signoff"])));

    let bob = Config::default().with_identity("Bob", "bob@example.com");
    let log = run(&repo, bob, |s| commands::log(s, LogOptions::default()));
    assert!(!log[0].ok);
}

#[test]
fn log_on_unborn_head_fails() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let err = Session::open(Arc::clone(&repo), jane())
        .unwrap()
        .run(|s| commands::log(s, LogOptions::default()))
        .unwrap_err();
    assert!(matches!(err, ReviewError::Repo(_)));
}

#[test]
fn range_signoff_is_left_exclusive() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let history = code_history(&repo, 4);

    let outcome = run(&repo, jane(), |s| commands::signoff(s, &args(&["HEAD~3..HEAD"])));
    assert_eq!(outcome.signed.len(), 3);
    assert_eq!(
        repo.read_commit(&outcome.commit).unwrap().message,
        "signoff HEAD~3..HEAD"
    );

    let log = run(&repo, jane(), |s| commands::log(s, LogOptions::default()));
    let marks: Vec<(ObjectId, bool)> = log.iter().map(|e| (e.commit, e.ok)).collect();
    assert_eq!(
        marks,
        vec![
            (history[3], true),
            (history[2], true),
            (history[1], true),
            (history[0], false),
        ]
    );
}

#[test]
fn two_commit_range() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let history = code_history(&repo, 4);
    let outcome = run(&repo, jane(), |s| commands::signoff(s, &args(&["HEAD~2..HEAD"])));
    let mut signed = outcome.signed.clone();
    signed.sort();
    let mut expected = vec![history[2], history[3]];
    expected.sort();
    assert_eq!(signed, expected);
}

#[test]
fn signoff_single_revisions() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let history = code_history(&repo, 3);
    let first = history[0].to_hex();
    let outcome = run(&repo, jane(), |s| commands::signoff(s, &args(&[&first, "HEAD"])));
    assert_eq!(outcome.signed, vec![history[0], history[2]]);

    let log = run(&repo, jane(), |s| commands::log(s, LogOptions { peers: false, limit: Some(2) }));
    assert_eq!(log.len(), 2);
    assert!(log[0].ok);
    assert!(!log[1].ok);
}

#[test]
fn signoff_unknown_revision_commits_nothing() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    code_history(&repo, 1);
    let err = Session::open(Arc::clone(&repo), jane())
        .unwrap()
        .run(|s| commands::signoff(s, &args(&["HEAD", "nope"])))
        .unwrap_err();
    assert!(matches!(err, ReviewError::Repo(_)));
    assert!(repo.refs().read_ref("refs/vouch").unwrap().is_none());
}

#[test]
fn last_peer_wins_in_merged_votes() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let vote = "0.0.2/abc/Acked-by/Carol <carol@example.com>";
    seed_peer(&repo, "p1", vote, "1");
    seed_peer(&repo, "p2", vote, "-1");

    let report = run(&repo, jane(), |s| {
        commands::votes(s, "abc", Some(Operation::Acked))
    });
    assert_eq!(report["Acked-by"]["Carol <carol@example.com>"], false);
}

#[test]
fn votes_without_operation_lists_every_operation() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    seed_peer(&repo, "bob", "0.0.2/abc/Tested-by/Bob <bob@example.com>", "1");
    run(&repo, jane(), |s| commands::set(s, "abc", &args(&["review"])));

    let report = run(&repo, jane(), |s| commands::votes(s, "abc", None));
    assert_eq!(
        report.keys().collect::<Vec<_>>(),
        vec!["Reviewed-by", "Tested-by"]
    );
    assert_eq!(report["Reviewed-by"]["Jane Doe <jane@example.com>"], true);
}

#[test]
fn log_with_peers_breaks_down_identities() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let hash = code_history(&repo, 1)[0].to_hex();
    seed_peer(
        &repo,
        "bob",
        &format!("0.0.2/{hash}/Signed-off-by/Bob <bob@example.com>"),
        "1",
    );
    let log = run(&repo, jane(), |s| {
        commands::log(s, LogOptions { peers: true, limit: None })
    });
    assert!(!log[0].ok);
    assert_eq!(log[0].votes.get("Bob <bob@example.com>"), Some(&true));
}

#[test]
fn scopes_do_not_see_each_other() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let hash = code_history(&repo, 1)[0].to_hex();
    run(&repo, jane(), |s| commands::set(s, &hash, &args(&["signoff"])));

    let mut old = jane();
    old.review.scope = "0.0.1".into();
    let log = run(&repo, old, |s| commands::log(s, LogOptions::default()));
    assert!(!log[0].ok);

    let local = Db::open(Arc::clone(&repo), "refs/vouch").unwrap();
    assert_eq!(local.list(&KeyPath::root()).unwrap(), vec!["0.0.2"]);
}

#[test]
fn notes_follow_every_command() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    run(&repo, jane(), |s| commands::set(s, "abc", &args(&["signoff", "test"])));
    run(&repo, jane(), |s| commands::set(s, "abc", &args(&["-test"])));
    run(&repo, jane(), |s| commands::set(s, "def", &args(&["ack"])));

    let notes = Db::open(Arc::clone(&repo), "refs/notes/commits").unwrap();
    assert_eq!(
        notes.get(&key("abc")).unwrap(),
        "Signed-off-by: Jane Doe <jane@example.com>\nTested-by: Jane Doe <jane@example.com>\n"
    );
    assert_eq!(
        notes.get(&key("def")).unwrap(),
        "Acked-by: Jane Doe <jane@example.com>\n"
    );
    assert_eq!(notes.list(&KeyPath::root()).unwrap(), vec!["abc", "def"]);
}

#[test]
fn concurrent_commit_is_a_write_conflict() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    run(&repo, jane(), |s| commands::set(s, "abc", &args(&["ack"])));

    let mut first = Session::open(Arc::clone(&repo), jane()).unwrap();
    let mut second = Session::open(Arc::clone(&repo), jane()).unwrap();
    commands::set(&mut first, "abc", &args(&["review"])).unwrap();
    let err = commands::set(&mut second, "abc", &args(&["test"])).unwrap_err();
    assert!(matches!(
        err,
        ReviewError::Db(DbError::WriteConflict { .. })
    ));
}

#[test]
fn info_reports_latest_snapshot() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    let config = Config::parse(
        "[user]\nname = \"Jane Doe\"\nemail = \"jane@example.com\"\n\n[remote.alice]\nallow = [\"refs/vouch\"]\n",
        std::path::Path::new("config.toml"),
    )
    .unwrap();

    let before = run(&repo, config.clone(), |s| commands::info(s));
    assert_eq!(before.latest, None);
    assert_eq!(before.auth["alice"], vec!["refs/vouch"]);

    let set = run(&repo, jane(), |s| commands::set(s, "abc", &args(&["ack"])));
    let after = run(&repo, config, |s| commands::info(s));
    assert_eq!(after.latest, Some(set.commit));
    assert_eq!(after.identity.to_string(), "Jane Doe <jane@example.com>");
}

#[test]
fn dump_lists_scoped_votes() {
    let repo = Arc::new(Repository::in_memory().unwrap());
    run(&repo, jane(), |s| commands::set(s, "abc", &args(&["ack", "-test"])));
    let mut out = Vec::new();
    run(&repo, jane(), |s| commands::dump(s, &mut out));
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "abc/Acked-by/Jane Doe <jane@example.com> = 1\n\
         abc/Tested-by/Jane Doe <jane@example.com> = -1\n"
    );
}

#[test]
fn pull_fetches_peer_store_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let remote_path = dir.path().join("remote");
    let local_path = dir.path().join("local");

    let remote = Arc::new(commands::init(&remote_path).unwrap());
    let bob = Config::default().with_identity("Bob", "bob@example.com");
    run(&remote, bob, |s| commands::set(s, "abc", &args(&["review"])));
    drop(remote);

    let local = Arc::new(commands::init(&local_path).unwrap());
    let url = format!("file://{}", remote_path.display());
    let mut out = Vec::new();
    let outcome = run(&local, jane(), |s| commands::pull(s, &url, "bob", &mut out));
    assert_eq!(outcome.local_ref, "refs/vouch-peers/bob");
    assert!(outcome.objects_copied > 0);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "0.0.2/abc/Reviewed-by/Bob <bob@example.com> = 1\n"
    );

    let peers = run(&local, jane(), |s| commands::peers(s));
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].name, "bob");
    assert_eq!(peers[0].latest, Some(outcome.new));

    let report = run(&local, jane(), |s| {
        commands::votes(s, "abc", Some(Operation::Reviewed))
    });
    assert_eq!(report["Reviewed-by"]["Bob <bob@example.com>"], true);

    let again = run(&local, jane(), |s| commands::pull(s, &url, "bob", &mut Vec::new()));
    assert!(again.is_up_to_date());
}

#[test]
fn init_writes_loadable_config() {
    let dir = tempfile::tempdir().unwrap();
    commands::init(dir.path()).unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    let repo = Repository::discover(dir.path().join("nested")).unwrap();
    assert_eq!(repo.path(), Some(dir.path()));
    let config = Config::for_repository(&repo).unwrap();
    assert_eq!(config.review.scope, "0.0.2");
    assert!(matches!(
        commands::init(dir.path()),
        Err(ReviewError::Repo(_))
    ));
}

#[test]
fn committed_worktree_can_be_logged_and_signed_off() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(commands::init(dir.path()).unwrap());
    let err = Session::open(Arc::clone(&repo), jane())
        .unwrap()
        .run(|s| commands::log(s, LogOptions::default()))
        .unwrap_err();
    assert!(matches!(err, ReviewError::Repo(_)));

    std::fs::write(dir.path().join("lib.rs"), "pub fn one() {}").unwrap();
    let first = run(&repo, jane(), |s| commands::commit(s, "add lib"));
    std::fs::write(dir.path().join("lib.rs"), "pub fn two() {}").unwrap();
    let second = run(&repo, jane(), |s| commands::commit(s, "rename"));
    let commit = repo.read_commit(&second).unwrap();
    assert_eq!(commit.parents, vec![first]);
    assert_eq!(commit.author, "Jane Doe <jane@example.com>");

    let outcome = run(&repo, jane(), |s| commands::signoff(s, &args(&["HEAD"])));
    assert_eq!(outcome.signed, vec![second]);

    let reopened = Arc::new(Repository::open(dir.path()).unwrap());
    let log = run(&reopened, jane(), |s| commands::log(s, LogOptions::default()));
    let marks: Vec<_> = log.iter().map(|e| (e.commit, e.ok)).collect();
    assert_eq!(marks, vec![(second, true), (first, false)]);
}

#[test]
fn reading_votes_writes_no_objects() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(commands::init(dir.path()).unwrap());
    std::fs::write(dir.path().join("README"), "hi").unwrap();
    let head = run(&repo, jane(), |s| commands::commit(s, "import")).to_hex();
    run(&repo, jane(), |s| commands::set(s, &head, &args(&["review"])));
    seed_peer(&repo, "bob", &format!("0.0.2/{head}/Reviewed-by/Bob <bob@example.com>"), "1");
    run(&repo, jane(), |s| commands::info(s));

    let before = repo.objects().ids().unwrap();
    let report = run(&repo, jane(), |s| commands::votes(s, &head, None));
    assert_eq!(report["Reviewed-by"].len(), 2);
    let options = LogOptions { peers: true, limit: None };
    run(&repo, jane(), |s| commands::log(s, options));
    assert_eq!(repo.objects().ids().unwrap(), before);
}
