//! In-memory reference store for testing and ephemeral use.
//!
//! [`InMemoryRefStore`] keeps refs in a `BTreeMap` behind a `RwLock`, so
//! listing is naturally sorted. Compare-and-swap holds the write lock for the
//! whole check-and-update.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use vouch_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::Head;

/// An in-memory implementation of [`RefStore`].
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, ObjectId>>,
    head: RwLock<Option<Head>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }

    fn refs(&self) -> RefResult<RwLockReadGuard<'_, BTreeMap<String, ObjectId>>> {
        self.refs.read().map_err(|_| RefError::LockPoisoned)
    }

    fn refs_mut(&self) -> RefResult<RwLockWriteGuard<'_, BTreeMap<String, ObjectId>>> {
        self.refs.write().map_err(|_| RefError::LockPoisoned)
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> RefResult<Option<ObjectId>> {
        Ok(self.refs()?.get(name).copied())
    }

    fn write_ref(&self, name: &str, target: ObjectId) -> RefResult<()> {
        validate_ref_name(name)?;
        self.refs_mut()?.insert(name.to_string(), target);
        debug!(name, %target, "ref written");
        Ok(())
    }

    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> RefResult<()> {
        validate_ref_name(name)?;
        let mut refs = self.refs_mut()?;
        let actual = refs.get(name).copied();
        if actual != expected {
            return Err(RefError::Conflict {
                name: name.to_string(),
                expected,
                actual,
            });
        }
        refs.insert(name.to_string(), new);
        debug!(name, %new, "ref updated");
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> RefResult<bool> {
        Ok(self.refs_mut()?.remove(name).is_some())
    }

    fn list_refs(&self, prefix: &str) -> RefResult<Vec<(String, ObjectId)>> {
        Ok(self
            .refs()?
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(name, id)| (name.clone(), *id))
            .collect())
    }

    fn head(&self) -> RefResult<Option<Head>> {
        Ok(self.head.read().map_err(|_| RefError::LockPoisoned)?.clone())
    }

    fn set_head(&self, name: &str) -> RefResult<()> {
        validate_ref_name(name)?;
        *self.head.write().map_err(|_| RefError::LockPoisoned)? =
            Some(Head::Symbolic(name.to_string()));
        Ok(())
    }

    fn set_head_detached(&self, target: ObjectId) -> RefResult<()> {
        *self.head.write().map_err(|_| RefError::LockPoisoned)? = Some(Head::Detached(target));
        Ok(())
    }
}
