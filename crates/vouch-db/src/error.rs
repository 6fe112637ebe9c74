use thiserror::Error;
use vouch_types::ObjectId;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("no value at {0}")]
    NotFound(String),

    #[error("store has no reference to commit to")]
    Detached,

    #[error("{reference} moved since it was opened (expected {}, found {})", show(.expected), show(.actual))]
    WriteConflict {
        reference: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Repo(#[from] vouch_repo::RepoError),

    #[error("ref error: {0}")]
    Ref(#[from] vouch_refs::RefError),

    #[error(transparent)]
    Type(#[from] vouch_types::TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Returns `true` for a missing value.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<vouch_store::StoreError> for DbError {
    fn from(err: vouch_store::StoreError) -> Self {
        Self::Repo(err.into())
    }
}

fn show(id: &Option<ObjectId>) -> String {
    id.map_or_else(|| "(none)".to_string(), |id| id.short_hex())
}

pub type DbResult<T> = Result<T, DbError>;
