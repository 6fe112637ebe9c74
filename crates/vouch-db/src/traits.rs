//! Store capability traits.
//!
//! Callers never branch on the concrete store shape: a [`Db`](crate::Db), a
//! [`Scoped`](crate::Scoped) view and a detached merge result all implement
//! [`KvRead`], and the writable ones [`KvStore`].

use std::io::Write;

use vouch_types::{KeyPath, ObjectId};

use crate::error::DbResult;

/// Whether a child is a value or a subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Leaf,
    Subtree,
}

/// A direct child of a subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

/// Read access to a hierarchical key/value snapshot.
pub trait KvRead {
    /// The value of the leaf at `path`.
    ///
    /// Fails with [`DbError::NotFound`](crate::DbError::NotFound) if any segment is absent or the
    /// path names a subtree.
    fn get(&self, path: &KeyPath) -> DbResult<String>;

    /// Direct children of the subtree at `path`, sorted by name. Empty if
    /// `path` is absent or a leaf.
    fn entries(&self, path: &KeyPath) -> DbResult<Vec<Entry>>;

    /// Names of the direct children of `path`.
    fn list(&self, path: &KeyPath) -> DbResult<Vec<String>> {
        Ok(self.entries(path)?.into_iter().map(|e| e.name).collect())
    }
}

/// A store that can stage writes and persist them.
pub trait KvStore: KvRead {
    /// Stage `value` at `path`, creating intermediate subtrees.
    fn set(&mut self, path: &KeyPath, value: &str) -> DbResult<()>;

    /// Persist staged changes; returns the commit now at the tip.
    fn commit(&mut self, message: &str) -> DbResult<ObjectId>;
}

impl<S: KvRead + ?Sized> KvRead for &S {
    fn get(&self, path: &KeyPath) -> DbResult<String> {
        (**self).get(path)
    }

    fn entries(&self, path: &KeyPath) -> DbResult<Vec<Entry>> {
        (**self).entries(path)
    }
}

impl<S: KvRead + ?Sized> KvRead for &mut S {
    fn get(&self, path: &KeyPath) -> DbResult<String> {
        (**self).get(path)
    }

    fn entries(&self, path: &KeyPath) -> DbResult<Vec<Entry>> {
        (**self).entries(path)
    }
}

impl<S: KvStore + ?Sized> KvStore for &mut S {
    fn set(&mut self, path: &KeyPath, value: &str) -> DbResult<()> {
        (**self).set(path, value)
    }

    fn commit(&mut self, message: &str) -> DbResult<ObjectId> {
        (**self).commit(message)
    }
}

/// Every leaf under `root`, depth first in name order, with paths relative
/// to `root`.
pub fn walk_leaves<S: KvRead + ?Sized>(
    store: &S,
    root: &KeyPath,
) -> DbResult<Vec<(KeyPath, String)>> {
    let mut leaves = Vec::new();
    let mut stack = vec![KeyPath::root()];
    while let Some(rel) = stack.pop() {
        let abs = root.join(&rel);
        let mut subtrees = Vec::new();
        for entry in store.entries(&abs)? {
            let child = rel.child(&entry.name)?;
            match entry.kind {
                EntryKind::Leaf => leaves.push((child.clone(), store.get(&root.join(&child))?)),
                EntryKind::Subtree => subtrees.push(child),
            }
        }
        stack.extend(subtrees.into_iter().rev());
    }
    leaves.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(leaves)
}

/// Write `path = value` lines for every leaf of `store`.
pub fn dump<S: KvRead + ?Sized>(store: &S, sink: &mut dyn Write) -> DbResult<()> {
    for (path, value) in walk_leaves(store, &KeyPath::root())? {
        writeln!(sink, "{path} = {value}")?;
    }
    Ok(())
}

/// Treat [`DbError::NotFound`](crate::DbError::NotFound) as `None`.
pub fn optional(result: DbResult<String>) -> DbResult<Option<String>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}
