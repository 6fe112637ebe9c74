use std::fmt;
use std::sync::Arc;

use tracing::debug;
use vouch_db::{optional, walk_leaves, Db, EntryKind, KvRead, KvStore};
use vouch_repo::Repository;
use vouch_types::KeyPath;

use crate::error::{MergeError, MergeResult};

/// What a step does when the output already holds a value at a path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlayPolicy {
    /// Replace it: later steps take precedence.
    #[default]
    Overwrite,
    /// Keep it: earlier steps take precedence.
    KeepExisting,
}

struct Step<'a> {
    dest: KeyPath,
    source: &'a dyn KvRead,
    recursive: bool,
    policy: OverlayPolicy,
}

/// An ordered list of overlay steps.
///
/// Built by value: `add` consumes the pipeline and returns it extended, so a
/// pipeline is assembled in one expression and never mutated afterwards.
///
/// ```ignore
/// let merged = MergePipeline::new()
///     .add(KeyPath::root(), &local, true)
///     .add(KeyPath::root(), &peer, true)
///     .run()?;
/// ```
#[derive(Default)]
pub struct MergePipeline<'a> {
    steps: Vec<Step<'a>>,
}

impl<'a> MergePipeline<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step with [`OverlayPolicy::Overwrite`].
    ///
    /// The step copies `source` from its root into `dest`: every leaf when
    /// `recursive`, otherwise only the leaves directly under the root.
    pub fn add(self, dest: KeyPath, source: &'a dyn KvRead, recursive: bool) -> Self {
        self.add_with(dest, source, recursive, OverlayPolicy::Overwrite)
    }

    /// Append a step with an explicit policy.
    pub fn add_with(
        mut self,
        dest: KeyPath,
        source: &'a dyn KvRead,
        recursive: bool,
        policy: OverlayPolicy,
    ) -> Self {
        self.steps.push(Step {
            dest,
            source,
            recursive,
            policy,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step into a fresh detached store.
    ///
    /// The output lives in an in-memory scratch repository; merging never
    /// writes objects into the repositories the sources read from.
    pub fn run(&self) -> MergeResult<Db> {
        let scratch = Repository::in_memory().map_err(|e| MergeError::Output(e.into()))?;
        let mut out = Db::empty(Arc::new(scratch)).map_err(MergeError::Output)?;
        self.run_into(&mut out)?;
        Ok(out)
    }

    /// Run every step into `out`, returning the number of values written.
    pub fn run_into<S: KvStore + ?Sized>(&self, out: &mut S) -> MergeResult<usize> {
        let mut written = 0;
        for (index, step) in self.steps.iter().enumerate() {
            let source_err = |source| MergeError::Source {
                step: index,
                source,
            };
            let leaves = if step.recursive {
                walk_leaves(step.source, &KeyPath::root()).map_err(source_err)?
            } else {
                direct_leaves(step.source).map_err(source_err)?
            };

            let mut copied = 0;
            for (rel, value) in leaves {
                let target = step.dest.join(&rel);
                if step.policy == OverlayPolicy::KeepExisting
                    && optional(out.get(&target))
                        .map_err(MergeError::Output)?
                        .is_some()
                {
                    continue;
                }
                out.set(&target, &value).map_err(MergeError::Output)?;
                copied += 1;
            }
            debug!(step = index, dest = %step.dest, copied, "overlay step");
            written += copied;
        }
        Ok(written)
    }
}

fn direct_leaves(source: &dyn KvRead) -> vouch_db::DbResult<Vec<(KeyPath, String)>> {
    let root = KeyPath::root();
    let mut leaves = Vec::new();
    for entry in source.entries(&root)? {
        if entry.kind == EntryKind::Leaf {
            let path = root.child(&entry.name)?;
            let value = source.get(&path)?;
            leaves.push((path, value));
        }
    }
    Ok(leaves)
}

impl fmt::Debug for MergePipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.steps
                    .iter()
                    .map(|s| (s.dest.to_string(), s.recursive, s.policy)),
            )
            .finish()
    }
}
