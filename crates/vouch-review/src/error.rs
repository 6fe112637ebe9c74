use std::path::PathBuf;

use thiserror::Error;

/// Problems with `.vouch/config.toml` or the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("user identity not configured: set [user] name and email, or VOUCH_USER_NAME and VOUCH_USER_EMAIL")]
    MissingIdentity,

    #[error("invalid user identity: {0}")]
    InvalidIdentity(#[source] vouch_types::TypeError),

    #[error("invalid scope {scope:?}: {source}")]
    InvalidScope {
        scope: String,
        source: vouch_types::TypeError,
    },

    #[error("cannot parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Db(#[from] vouch_db::DbError),

    #[error(transparent)]
    Merge(#[from] vouch_merge::MergeError),

    #[error(transparent)]
    Repo(#[from] vouch_repo::RepoError),

    #[error("ref error: {0}")]
    Ref(#[from] vouch_refs::RefError),

    #[error(transparent)]
    Type(#[from] vouch_types::TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReviewResult<T> = Result<T, ReviewError>;
