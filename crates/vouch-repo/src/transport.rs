//! Fetching a store from another repository.
//!
//! A [`Transport`] exposes the refs and objects of a remote repository.
//! [`Repository::fetch`] copies every object reachable from one remote ref
//! that the local repository lacks, then moves a local ref with
//! compare-and-swap.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use vouch_store::{Commit, ObjectKind, StoredObject, Tree};
use vouch_types::ObjectId;

use crate::error::{RepoError, RepoResult};
use crate::repository::Repository;

/// Read access to a remote repository.
pub trait Transport {
    /// Human-readable location, used in messages.
    fn url(&self) -> &str;

    /// Remote refs whose names start with `prefix`, sorted by name.
    fn list_refs(&self, prefix: &str) -> RepoResult<Vec<(String, ObjectId)>>;

    /// Read one object.
    fn read_object(&self, id: &ObjectId) -> RepoResult<StoredObject>;
}

/// Transport to a repository on the local filesystem.
///
/// Accepts a plain path or a `file://` URL naming the working tree.
pub struct LocalTransport {
    url: String,
    repo: Repository,
}

impl LocalTransport {
    pub fn open(url: &str) -> RepoResult<Self> {
        let path: PathBuf = Path::new(url.strip_prefix("file://").unwrap_or(url)).to_path_buf();
        Ok(Self::from_repository(url, Repository::open(&path)?))
    }

    /// Wrap an already-open repository.
    pub fn from_repository(url: impl Into<String>, repo: Repository) -> Self {
        Self {
            url: url.into(),
            repo,
        }
    }
}

impl Transport for LocalTransport {
    fn url(&self) -> &str {
        &self.url
    }

    fn list_refs(&self, prefix: &str) -> RepoResult<Vec<(String, ObjectId)>> {
        Ok(self.repo.refs().list_refs(prefix)?)
    }

    fn read_object(&self, id: &ObjectId) -> RepoResult<StoredObject> {
        self.repo.read_object(id)
    }
}

/// Result of a fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOutcome {
    pub remote_ref: String,
    pub local_ref: String,
    pub old: Option<ObjectId>,
    pub new: ObjectId,
    pub objects_copied: usize,
}

impl FetchOutcome {
    /// Returns `true` if the local ref did not move.
    pub fn is_up_to_date(&self) -> bool {
        self.old == Some(self.new)
    }
}

fn references(id: &ObjectId, obj: &StoredObject) -> RepoResult<Vec<ObjectId>> {
    Ok(match obj.kind {
        ObjectKind::Blob => Vec::new(),
        ObjectKind::Tree => Tree::from_stored_object(obj)?
            .entries
            .into_iter()
            .map(|e| e.object_id)
            .collect(),
        ObjectKind::Commit => {
            let commit = Commit::from_stored_object(obj)?;
            let mut refs = vec![commit.tree];
            refs.extend(commit.parents);
            debug!(%id, "walking fetched commit");
            refs
        }
    })
}

impl Repository {
    /// Copy `remote_ref` from `transport` into `local_ref`.
    pub fn fetch(
        &self,
        transport: &dyn Transport,
        remote_ref: &str,
        local_ref: &str,
    ) -> RepoResult<FetchOutcome> {
        let new = transport
            .list_refs(remote_ref)?
            .into_iter()
            .find(|(name, _)| name == remote_ref)
            .map(|(_, id)| id)
            .ok_or_else(|| RepoError::RemoteRefNotFound {
                url: transport.url().to_string(),
                name: remote_ref.to_string(),
            })?;
        let old = self.refs().read_ref(local_ref)?;

        // Objects already present locally are complete: their dependencies
        // were written before them.
        let mut missing = Vec::new();
        let mut stack = vec![new];
        let mut seen = std::collections::HashSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) || self.objects().exists(&id)? {
                continue;
            }
            let obj = transport.read_object(&id)?;
            stack.extend(references(&id, &obj)?);
            missing.push(obj);
        }

        let objects_copied = missing.len();
        for obj in missing.iter().rev() {
            self.objects().write(obj)?;
        }
        if old != Some(new) {
            self.refs().compare_and_swap(local_ref, old, new)?;
        }
        info!(
            url = transport.url(),
            remote_ref,
            local_ref,
            %new,
            objects_copied,
            "fetched"
        );
        Ok(FetchOutcome {
            remote_ref: remote_ref.to_string(),
            local_ref: local_ref.to_string(),
            old,
            new,
            objects_copied,
        })
    }
}
