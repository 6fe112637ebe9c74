use std::path::PathBuf;

use thiserror::Error;
use vouch_types::ObjectId;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not a vouch repository (or any parent): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("repository already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("repository has no working tree")]
    NoWorkingTree,

    #[error("unknown revision: {0}")]
    UnknownRevision(String),

    #[error("ambiguous revision: {0}")]
    AmbiguousRevision(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("object {0} is not a commit")]
    NotACommit(ObjectId),

    #[error("remote {url} has no ref {name}")]
    RemoteRefNotFound { url: String, name: String },

    #[error("store error: {0}")]
    Store(#[from] vouch_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] vouch_refs::RefError),

    #[error(transparent)]
    Type(#[from] vouch_types::TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
