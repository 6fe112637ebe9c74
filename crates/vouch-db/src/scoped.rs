use vouch_types::{KeyPath, ObjectId};

use crate::error::DbResult;
use crate::traits::{Entry, KvRead, KvStore};

/// A view of a store rooted at a path prefix.
///
/// Every path is rewritten to `prefix/path` before reaching the inner store.
/// Scoping a scoped store concatenates prefixes in application order;
/// `commit` goes straight to the inner store, so a scope has no history of
/// its own.
#[derive(Debug)]
pub struct Scoped<S> {
    inner: S,
    prefix: KeyPath,
}

impl<S> Scoped<S> {
    pub fn new(inner: S, prefix: KeyPath) -> Self {
        Self { inner, prefix }
    }

    pub fn prefix(&self) -> &KeyPath {
        &self.prefix
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn full(&self, path: &KeyPath) -> KeyPath {
        self.prefix.join(path)
    }
}

impl<S: KvRead> KvRead for Scoped<S> {
    fn get(&self, path: &KeyPath) -> DbResult<String> {
        self.inner.get(&self.full(path))
    }

    fn entries(&self, path: &KeyPath) -> DbResult<Vec<Entry>> {
        self.inner.entries(&self.full(path))
    }
}

impl<S: KvStore> KvStore for Scoped<S> {
    fn set(&mut self, path: &KeyPath, value: &str) -> DbResult<()> {
        let full = self.full(path);
        self.inner.set(&full, value)
    }

    fn commit(&mut self, message: &str) -> DbResult<ObjectId> {
        self.inner.commit(message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vouch_repo::Repository;

    use super::*;
    use crate::db::Db;
    use crate::error::DbError;

    fn key(s: &str) -> KeyPath {
        KeyPath::parse(s).unwrap()
    }

    fn db() -> Db {
        Db::open(Arc::new(Repository::in_memory().unwrap()), "refs/vouch").unwrap()
    }

    #[test]
    fn writes_land_under_prefix() {
        let mut scoped = Scoped::new(db(), key("0.0.2"));
        scoped.set(&key("abc/Acked-by/A <a@x>"), "1").unwrap();
        assert_eq!(scoped.get(&key("abc/Acked-by/A <a@x>")).unwrap(), "1");
        assert_eq!(scoped.list(&KeyPath::root()).unwrap(), vec!["abc"]);
        assert_eq!(
            scoped.inner().get(&key("0.0.2/abc/Acked-by/A <a@x>")).unwrap(),
            "1"
        );
        assert_eq!(scoped.inner().list(&KeyPath::root()).unwrap(), vec!["0.0.2"]);
    }

    #[test]
    fn scopes_are_isolated() {
        let mut inner = db();
        Scoped::new(&mut inner, key("0.0.2"))
            .set(&key("h/op/id"), "1")
            .unwrap();
        let old = Scoped::new(&inner, key("0.0.1"));
        assert!(matches!(old.get(&key("h/op/id")), Err(DbError::NotFound(_))));
        assert!(old.list(&KeyPath::root()).unwrap().is_empty());
    }

    #[test]
    fn nested_scopes_concatenate() {
        let mut db = db();
        let mut nested = Scoped::new(Scoped::new(&mut db, key("0.0.2")), key("abc/Tested-by"));
        nested.set(&key("T <t@x>"), "-1").unwrap();
        assert_eq!(nested.get(&key("T <t@x>")).unwrap(), "-1");

        assert_eq!(db.get(&key("0.0.2/abc/Tested-by/T <t@x>")).unwrap(), "-1");
        let outer = Scoped::new(&db, key("0.0.2"));
        assert_eq!(outer.get(&key("abc/Tested-by/T <t@x>")).unwrap(), "-1");

        let wrapped = Scoped::new(Scoped::new(&db, key("0.0.2")), key("abc"));
        assert_eq!(wrapped.prefix().to_string(), "abc");
        assert_eq!(wrapped.list(&KeyPath::root()).unwrap(), vec!["Tested-by"]);
    }

    #[test]
    fn commit_delegates_to_root() {
        let mut scoped = Scoped::new(db(), key("0.0.2"));
        scoped.set(&key("h/op/id"), "1").unwrap();
        let commit = scoped.commit("h op").unwrap();
        assert_eq!(scoped.inner().latest(), Some(commit));
    }
}
