//! Repository facade for vouch.
//!
//! A [`Repository`] bundles an object store and a ref store. On disk it is a
//! `.vouch` directory holding `objects/`, `refs/`, `HEAD` and
//! `config.toml`; in tests it lives entirely in memory. Code history and
//! annotation stores share the same object and ref stores.

pub mod error;
pub mod repository;
pub mod revision;
pub mod transport;
pub mod walk;

pub use error::{RepoError, RepoResult};
pub use repository::Repository;
pub use transport::{FetchOutcome, LocalTransport, Transport};

// Re-export key types
pub use vouch_refs::{Head, RefStore};
pub use vouch_store::{Blob, Commit, EntryMode, ObjectKind, ObjectStore, StoredObject, Tree, TreeEntry};
pub use vouch_types::ObjectId;
