//! Revision syntax.
//!
//! A revision is a base followed by any number of suffixes:
//!
//! - base: `HEAD` (or `@`), a full 64-hex id, a ref name (`refs/vouch`,
//!   `heads/main`, `main`, a peer name), or a unique hex prefix of at least
//!   four characters naming a commit
//! - `~N`: the N-th first-parent ancestor (`~` alone is `~1`)
//! - `^N`: the N-th parent (`^` alone is `^1`, `^0` is the commit itself)
//!
//! A range `a..b` selects the commits reachable from `b` but not from `a`;
//! an empty side means `HEAD`.

use vouch_refs::names::{validate_ref_name, PEER_REF_PREFIX};
use vouch_types::ObjectId;

use crate::error::{RepoError, RepoResult};
use crate::repository::Repository;

/// Shortest accepted abbreviated id.
pub const MIN_PREFIX_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Ancestor(usize),
    Parent(usize),
}

/// Returns `true` if `rev` uses range syntax.
pub fn is_range(rev: &str) -> bool {
    rev.contains("..")
}

fn split_suffix(rev: &str) -> (&str, &str) {
    match rev.find(['~', '^']) {
        Some(i) => rev.split_at(i),
        None => (rev, ""),
    }
}

fn parse_steps(suffix: &str, rev: &str) -> RepoResult<Vec<Step>> {
    let unknown = || RepoError::UnknownRevision(rev.to_string());
    let mut steps = Vec::new();
    let mut rest = suffix;
    while let Some(op) = rest.chars().next() {
        if op != '~' && op != '^' {
            return Err(unknown());
        }
        let tail = &rest[1..];
        let digits = tail.len() - tail.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let n = if digits == 0 {
            1
        } else {
            tail[..digits].parse().map_err(|_| unknown())?
        };
        steps.push(if op == '~' {
            Step::Ancestor(n)
        } else {
            Step::Parent(n)
        });
        rest = &tail[digits..];
    }
    Ok(steps)
}

impl Repository {
    /// Resolve a revision to a commit id.
    pub fn resolve_revision(&self, rev: &str) -> RepoResult<ObjectId> {
        let rev = rev.trim();
        let (base, suffix) = split_suffix(rev);
        if base.is_empty() {
            return Err(RepoError::UnknownRevision(rev.to_string()));
        }
        let mut id = self.resolve_base(base, rev)?;
        for step in parse_steps(suffix, rev)? {
            id = match step {
                Step::Ancestor(n) => {
                    let mut current = id;
                    for _ in 0..n {
                        current = self.nth_parent(rev, current, 1)?;
                    }
                    current
                }
                Step::Parent(n) => self.nth_parent(rev, id, n)?,
            };
        }
        Ok(id)
    }

    /// Resolve `a..b` to `(a, b)`.
    pub fn resolve_range(&self, rev: &str) -> RepoResult<(ObjectId, ObjectId)> {
        let (from, to) = rev
            .trim()
            .split_once("..")
            .ok_or_else(|| RepoError::InvalidRange(rev.to_string()))?;
        if to.starts_with('.') || is_range(to) {
            return Err(RepoError::InvalidRange(rev.to_string()));
        }
        let side = |s: &str| {
            if s.is_empty() {
                self.resolve_revision("HEAD")
            } else {
                self.resolve_revision(s)
            }
        };
        Ok((side(from)?, side(to)?))
    }

    fn resolve_base(&self, base: &str, rev: &str) -> RepoResult<ObjectId> {
        let unknown = || RepoError::UnknownRevision(rev.to_string());

        let id = if base == "HEAD" || base == "@" {
            self.refs().resolve_head()?.ok_or_else(unknown)?
        } else if let Ok(id) = ObjectId::from_hex(base) {
            id
        } else if let Some(id) = self.resolve_ref_name(base)? {
            id
        } else if base.len() >= MIN_PREFIX_LEN && base.chars().all(|c| c.is_ascii_hexdigit()) {
            self.resolve_prefix(base, rev)?
        } else {
            return Err(unknown());
        };

        match self.objects().read(&id)? {
            None => Err(unknown()),
            Some(obj) if obj.kind != vouch_store::ObjectKind::Commit => {
                Err(RepoError::NotACommit(id))
            }
            Some(_) => Ok(id),
        }
    }

    fn resolve_ref_name(&self, name: &str) -> RepoResult<Option<ObjectId>> {
        let candidates = [
            name.to_string(),
            format!("refs/{name}"),
            format!("refs/heads/{name}"),
            format!("{PEER_REF_PREFIX}{name}"),
        ];
        for candidate in candidates {
            if validate_ref_name(&candidate).is_err() {
                continue;
            }
            if let Some(id) = self.refs().read_ref(&candidate)? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    fn resolve_prefix(&self, prefix: &str, rev: &str) -> RepoResult<ObjectId> {
        let mut found = None;
        for id in self.objects().ids()? {
            if !id.matches_prefix(prefix) || !self.is_commit(&id)? {
                continue;
            }
            if found.replace(id).is_some() {
                return Err(RepoError::AmbiguousRevision(rev.to_string()));
            }
        }
        found.ok_or_else(|| RepoError::UnknownRevision(rev.to_string()))
    }

    fn nth_parent(&self, rev: &str, id: ObjectId, n: usize) -> RepoResult<ObjectId> {
        if n == 0 {
            return Ok(id);
        }
        self.read_commit(&id)?
            .parents
            .get(n - 1)
            .copied()
            .ok_or_else(|| RepoError::UnknownRevision(rev.to_string()))
    }
}
