//! The [`RefStore`] trait defining the reference storage interface.

use vouch_types::ObjectId;

use crate::error::RefResult;
use crate::types::Head;

/// Storage backend for named references.
///
/// Implementations must be thread-safe (`Send + Sync`). Names are full ref
/// names (`refs/...`) and are validated on write.
pub trait RefStore: Send + Sync {
    /// Read a ref. Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> RefResult<Option<ObjectId>>;

    /// Create or overwrite a ref unconditionally.
    fn write_ref(&self, name: &str, target: ObjectId) -> RefResult<()>;

    /// Update a ref only if its current value equals `expected`
    /// (`None` meaning "must not exist yet").
    ///
    /// Fails with [`RefError::Conflict`](crate::RefError::Conflict) otherwise;
    /// the ref is left untouched.
    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> RefResult<()>;

    /// Delete a ref. Returns `Ok(true)` if it existed.
    fn delete_ref(&self, name: &str) -> RefResult<bool>;

    /// List all refs whose name starts with `prefix`, sorted by name.
    fn list_refs(&self, prefix: &str) -> RefResult<Vec<(String, ObjectId)>>;

    /// Read the current HEAD state. `Ok(None)` if HEAD has not been set.
    fn head(&self) -> RefResult<Option<Head>>;

    /// Point HEAD at a ref (symbolic).
    fn set_head(&self, name: &str) -> RefResult<()>;

    /// Point HEAD directly at a commit.
    fn set_head_detached(&self, target: ObjectId) -> RefResult<()>;

    /// The commit HEAD currently resolves to, if any.
    ///
    /// A symbolic HEAD naming a ref that does not exist yet (an unborn
    /// branch) resolves to `None`.
    fn resolve_head(&self) -> RefResult<Option<ObjectId>> {
        match self.head()? {
            Some(Head::Symbolic(name)) => self.read_ref(&name),
            Some(Head::Detached(id)) => Ok(Some(id)),
            None => Ok(None),
        }
    }
}
