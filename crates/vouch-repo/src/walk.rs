//! Commit history traversal.

use std::collections::{HashSet, VecDeque};

use vouch_types::ObjectId;

use crate::error::RepoResult;
use crate::repository::Repository;

impl Repository {
    /// Follow first parents from `start`, newest first, stopping after
    /// `limit` commits when given.
    pub fn first_parent_history(
        &self,
        start: ObjectId,
        limit: Option<usize>,
    ) -> RepoResult<Vec<ObjectId>> {
        let mut history = Vec::new();
        let mut next = Some(start);
        while let Some(id) = next {
            if limit.is_some_and(|limit| history.len() >= limit) {
                break;
            }
            next = self.read_commit(&id)?.first_parent();
            history.push(id);
        }
        Ok(history)
    }

    /// Every commit reachable from `start`, `start` included.
    pub fn ancestors(&self, start: ObjectId) -> RepoResult<HashSet<ObjectId>> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            if seen.insert(id) {
                queue.extend(self.read_commit(&id)?.parents);
            }
        }
        Ok(seen)
    }

    /// Commits reachable from `to` and not from `from`, breadth first from
    /// `to`.
    pub fn walk_range(&self, from: ObjectId, to: ObjectId) -> RepoResult<Vec<ObjectId>> {
        let excluded = self.ancestors(from)?;
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([to]);
        let mut commits = Vec::new();
        while let Some(id) = queue.pop_front() {
            if excluded.contains(&id) || !seen.insert(id) {
                continue;
            }
            queue.extend(self.read_commit(&id)?.parents);
            commits.push(id);
        }
        Ok(commits)
    }
}
