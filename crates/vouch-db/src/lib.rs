//! Versioned key/value stores backed by tree and commit objects.
//!
//! A [`Db`] wraps one reference. Reads traverse the snapshot tree, writes
//! stage a new snapshot in memory, and [`KvStore::commit`] persists it as a
//! commit on top of the snapshot the store was opened from.
//!
//! Every store shape implements the same two capability traits:
//!
//! - [`KvRead`] -- `get`, `list`, `entries`
//! - [`KvStore`] -- adds `set` and `commit`
//!
//! [`Scoped`] roots any store at a path prefix; a detached [`Db`] (no
//! reference) serves as the output of a merge.

pub mod db;
pub mod error;
pub mod scoped;
pub mod traits;

pub use db::Db;
pub use error::{DbError, DbResult};
pub use scoped::Scoped;
pub use traits::{dump, optional, walk_leaves, Entry, EntryKind, KvRead, KvStore};
