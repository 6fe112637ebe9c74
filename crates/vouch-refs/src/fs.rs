//! Filesystem reference store.
//!
//! Each ref is a file under the repository directory whose path is the ref
//! name (`<root>/refs/vouch`) and whose content is the hex commit id.
//! `HEAD` lives at `<root>/HEAD` as `ref: <name>` or a hex id.
//!
//! Updates take an exclusive `<ref>.lock` file (created with `create_new`),
//! check the current value while holding it, write the new value into the
//! lock file and rename it over the ref.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use vouch_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::Head;

const HEAD_FILE: &str = "HEAD";
const LOCK_SUFFIX: &str = ".lock";

/// Filesystem-backed [`RefStore`].
#[derive(Debug, Clone)]
pub struct FsRefStore {
    root: PathBuf,
}

/// An exclusive lock on one ref; removed on drop unless committed.
struct RefLock {
    name: String,
    lock_path: PathBuf,
    target_path: PathBuf,
    file: Option<File>,
}

impl RefLock {
    fn acquire(name: &str, target_path: PathBuf) -> RefResult<Self> {
        if let Some(dir) = target_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut lock_path = target_path.clone().into_os_string();
        lock_path.push(LOCK_SUFFIX);
        let lock_path = PathBuf::from(lock_path);
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(RefError::Locked {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            name: name.to_string(),
            lock_path,
            target_path,
            file: Some(file),
        })
    }

    fn commit(mut self, content: &str) -> RefResult<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&self.lock_path, &self.target_path)?;
        self.file = None;
        debug!(name = %self.name, "ref lock committed");
        Ok(())
    }
}

impl Drop for RefLock {
    fn drop(&mut self) {
        // Still holding the file means commit never ran.
        if self.file.take().is_some() {
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}

impl FsRefStore {
    /// Open a ref store rooted at a repository directory.
    pub fn open(root: impl AsRef<Path>) -> RefResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("refs"))?;
        Ok(Self { root })
    }

    /// The repository directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        name.split('/')
            .fold(self.root.clone(), |path, component| path.join(component))
    }

    fn read_file(&self, name: &str, path: &Path) -> RefResult<Option<ObjectId>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        text.trim()
            .parse()
            .map(Some)
            .map_err(|e| RefError::Corrupt {
                name: name.to_string(),
                reason: format!("{e}"),
            })
    }

    fn collect(&self, dir: &Path, name: &str, out: &mut Vec<(String, ObjectId)>) -> RefResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            let child = format!("{name}/{file_name}");
            if entry.file_type()?.is_dir() {
                self.collect(&entry.path(), &child, out)?;
            } else if !file_name.ends_with(LOCK_SUFFIX) {
                if let Some(id) = self.read_file(&child, &entry.path())? {
                    out.push((child, id));
                }
            }
        }
        Ok(())
    }

    fn write_head(&self, head: &Head) -> RefResult<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        writeln!(tmp, "{head}")?;
        tmp.persist(self.root.join(HEAD_FILE))
            .map_err(|e| RefError::Io(e.error))?;
        Ok(())
    }
}

impl RefStore for FsRefStore {
    fn read_ref(&self, name: &str) -> RefResult<Option<ObjectId>> {
        validate_ref_name(name)?;
        self.read_file(name, &self.ref_path(name))
    }

    fn write_ref(&self, name: &str, target: ObjectId) -> RefResult<()> {
        validate_ref_name(name)?;
        let lock = RefLock::acquire(name, self.ref_path(name))?;
        lock.commit(&format!("{target}\n"))?;
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
        let path = self.ref_path(name);
        let lock = RefLock::acquire(name, path.clone())?;
        let actual = self.read_file(name, &path)?;
        if actual != expected {
            return Err(RefError::Conflict {
                name: name.to_string(),
                expected,
                actual,
            });
        }
        lock.commit(&format!("{new}\n"))?;
        debug!(name, %new, "ref updated");
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> RefResult<bool> {
        validate_ref_name(name)?;
        let path = self.ref_path(name);
        let _lock = RefLock::acquire(name, path.clone())?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_refs(&self, prefix: &str) -> RefResult<Vec<(String, ObjectId)>> {
        let mut refs = Vec::new();
        self.collect(&self.root.join("refs"), "refs", &mut refs)?;
        refs.retain(|(name, _)| name.starts_with(prefix));
        refs.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(refs)
    }

    fn head(&self) -> RefResult<Option<Head>> {
        let text = match fs::read_to_string(self.root.join(HEAD_FILE)) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Head::parse(&text).map(Some).ok_or_else(|| RefError::Corrupt {
            name: HEAD_FILE.to_string(),
            reason: format!("unrecognised content {:?}", text.trim()),
        })
    }

    fn set_head(&self, name: &str) -> RefResult<()> {
        validate_ref_name(name)?;
        self.write_head(&Head::Symbolic(name.to_string()))
    }

    fn set_head_detached(&self, target: ObjectId) -> RefResult<()> {
        self.write_head(&Head::Detached(target))
    }
}
