use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info};
use vouch_refs::{validate_ref_name, RefError};
use vouch_repo::Repository;
use vouch_store::{EntryMode, Tree, TreeEntry};
use vouch_types::{KeyPath, ObjectId};

use crate::error::{DbError, DbResult};
use crate::traits::{self, Entry, EntryKind, KvRead, KvStore};

/// Author recorded on commits when none is configured.
pub const DEFAULT_AUTHOR: &str = "vouch";

/// A key/value store whose snapshots are tree objects behind one reference.
///
/// `set` writes the new blob and the rewritten path of trees into the object
/// store immediately, but only `commit` moves the reference. Dropping a
/// store with staged changes discards them.
pub struct Db {
    repo: Arc<Repository>,
    reference: Option<String>,
    /// Commit this store was opened from, or last committed.
    parent: Option<ObjectId>,
    /// Snapshot of `parent` (empty tree for an unborn reference).
    base: ObjectId,
    /// Current snapshot, including staged changes.
    tree: ObjectId,
    author: String,
}

impl Db {
    /// Open the store behind `reference`. An absent reference opens as an
    /// empty snapshot; the reference is created by the first commit.
    pub fn open(repo: Arc<Repository>, reference: &str) -> DbResult<Self> {
        validate_ref_name(reference)?;
        let parent = repo.refs().read_ref(reference)?;
        let base = match parent {
            Some(commit) => repo.read_commit(&commit)?.tree,
            None => repo.write_tree(&Tree::empty())?,
        };
        debug!(reference, latest = ?parent, "opened store");
        Ok(Self {
            repo,
            reference: Some(reference.to_string()),
            parent,
            base,
            tree: base,
            author: DEFAULT_AUTHOR.to_string(),
        })
    }

    /// A store over an existing tree with no reference; `commit` fails.
    pub fn detached(repo: Arc<Repository>, tree: ObjectId) -> Self {
        Self {
            repo,
            reference: None,
            parent: None,
            base: tree,
            tree,
            author: DEFAULT_AUTHOR.to_string(),
        }
    }

    /// A detached store over an empty tree.
    pub fn empty(repo: Arc<Repository>) -> DbResult<Self> {
        let tree = repo.write_tree(&Tree::empty())?;
        Ok(Self::detached(repo, tree))
    }

    /// Record `author` on future commits.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.repo
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// The commit the reference pointed at when opened or last committed.
    pub fn latest(&self) -> Option<ObjectId> {
        self.parent
    }

    /// The current snapshot tree, staged changes included.
    pub fn tree(&self) -> ObjectId {
        self.tree
    }

    /// Returns `true` if the snapshot differs from the last commit.
    pub fn has_changes(&self) -> bool {
        self.tree != self.base
    }

    /// Stage an empty snapshot, keeping the parent commit. A following
    /// `commit` replaces the whole tree rather than patching it.
    pub fn clear(&mut self) -> DbResult<()> {
        self.tree = self.repo.write_tree(&Tree::empty())?;
        Ok(())
    }

    /// Write `path = value` lines for every leaf.
    pub fn dump(&self, sink: &mut dyn Write) -> DbResult<()> {
        traits::dump(self, sink)
    }

    fn subtree(&self, path: &KeyPath) -> DbResult<Option<Tree>> {
        let mut tree = self.repo.read_tree(&self.tree)?;
        for segment in path.segments() {
            match tree.get(segment) {
                Some(entry) if entry.is_tree() => tree = self.repo.read_tree(&entry.object_id)?,
                _ => return Ok(None),
            }
        }
        Ok(Some(tree))
    }

    /// Rewrite the spine of trees from `tree` down to `segments`, placing
    /// `blob` at the end.
    fn replace(
        &self,
        tree: Option<ObjectId>,
        segments: &[String],
        blob: ObjectId,
    ) -> DbResult<ObjectId> {
        let mut node = match tree {
            Some(id) => self.repo.read_tree(&id)?,
            None => Tree::empty(),
        };
        match segments {
            [] => return Err(DbError::InvalidPath(String::new())),
            [leaf] => node.upsert(TreeEntry::new(EntryMode::Regular, leaf.as_str(), blob)),
            [head, rest @ ..] => {
                let child = node
                    .get(head)
                    .filter(|entry| entry.is_tree())
                    .map(|entry| entry.object_id);
                let sub = self.replace(child, rest, blob)?;
                node.upsert(TreeEntry::new(EntryMode::Directory, head.as_str(), sub));
            }
        }
        Ok(self.repo.write_tree(&node)?)
    }
}

impl KvRead for Db {
    fn get(&self, path: &KeyPath) -> DbResult<String> {
        let not_found = || DbError::NotFound(path.to_string());
        let (leaf, parent) = match path.segments().split_last() {
            Some((leaf, parent)) => (leaf, KeyPath::from_segments(parent.iter().cloned())?),
            None => return Err(not_found()),
        };
        let tree = self.subtree(&parent)?.ok_or_else(not_found)?;
        match tree.get(leaf) {
            Some(entry) if !entry.is_tree() => Ok(self.repo.read_text(&entry.object_id)?),
            _ => Err(not_found()),
        }
    }

    fn entries(&self, path: &KeyPath) -> DbResult<Vec<Entry>> {
        Ok(self
            .subtree(path)?
            .map(|tree| {
                tree.entries
                    .into_iter()
                    .map(|e| Entry {
                        kind: if e.is_tree() {
                            EntryKind::Subtree
                        } else {
                            EntryKind::Leaf
                        },
                        name: e.name,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl KvStore for Db {
    fn set(&mut self, path: &KeyPath, value: &str) -> DbResult<()> {
        if path.is_root() {
            return Err(DbError::InvalidPath(path.to_string()));
        }
        let blob = self.repo.write_text(value)?;
        self.tree = self.replace(Some(self.tree), path.segments(), blob)?;
        debug!(%path, value, "staged");
        Ok(())
    }

    fn commit(&mut self, message: &str) -> DbResult<ObjectId> {
        let reference = self.reference.clone().ok_or(DbError::Detached)?;
        if let (Some(parent), false) = (self.parent, self.has_changes()) {
            debug!(%reference, "nothing to commit");
            return Ok(parent);
        }
        let commit = self.repo.create_commit(
            self.tree,
            self.parent.into_iter().collect(),
            &self.author,
            message,
        )?;
        self.repo
            .refs()
            .compare_and_swap(&reference, self.parent, commit)
            .map_err(|err| match err {
                RefError::Conflict {
                    expected, actual, ..
                } => DbError::WriteConflict {
                    reference: reference.clone(),
                    expected,
                    actual,
                },
                other => other.into(),
            })?;
        info!(%reference, %commit, message, "committed");
        self.parent = Some(commit);
        self.base = self.tree;
        Ok(commit)
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("reference", &self.reference)
            .field("latest", &self.parent)
            .field("tree", &self.tree)
            .finish()
    }
}
