use thiserror::Error;
use vouch_db::DbError;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("reading source of step {step}: {source}")]
    Source { step: usize, source: DbError },

    #[error("writing merge output: {0}")]
    Output(#[source] DbError),
}

pub type MergeResult<T> = Result<T, MergeError>;
