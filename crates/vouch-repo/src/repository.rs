use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};
use walkdir::WalkDir;
use vouch_refs::names::DEFAULT_BRANCH;
use vouch_refs::{FsRefStore, Head, InMemoryRefStore, RefStore};
use vouch_store::{
    Blob, Commit, EntryMode, FsObjectStore, InMemoryObjectStore, ObjectKind, ObjectStore,
    StoredObject, Tree, TreeEntry,
};
use vouch_types::ObjectId;

use crate::error::{RepoError, RepoResult};

/// Name of the repository directory inside a working tree.
pub const REPO_DIR: &str = ".vouch";

/// Name of the configuration file inside [`REPO_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// A repository: objects plus refs, optionally rooted on disk.
pub struct Repository {
    root: Option<PathBuf>,
    objects: Box<dyn ObjectStore>,
    refs: Box<dyn RefStore>,
}

impl Repository {
    /// Create a new repository in `path/.vouch` with `HEAD` naming
    /// `refs/heads/main`.
    pub fn init(path: impl AsRef<Path>) -> RepoResult<Self> {
        let root = path.as_ref().to_path_buf();
        let dir = root.join(REPO_DIR);
        if dir.exists() {
            return Err(RepoError::AlreadyExists(dir));
        }
        fs::create_dir_all(&dir)?;
        let repo = Self::from_dir(root)?;
        repo.refs.set_head(DEFAULT_BRANCH)?;
        info!(path = %dir.display(), "initialized repository");
        Ok(repo)
    }

    /// Open the repository whose working tree is exactly `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.join(REPO_DIR).is_dir() {
            return Err(RepoError::NotARepository(root));
        }
        Self::from_dir(root)
    }

    /// Open the repository containing `start`, searching parent directories.
    pub fn discover(start: impl AsRef<Path>) -> RepoResult<Self> {
        let start = start.as_ref();
        for dir in start.ancestors() {
            if dir.join(REPO_DIR).is_dir() {
                debug!(path = %dir.display(), "discovered repository");
                return Self::from_dir(dir.to_path_buf());
            }
        }
        Err(RepoError::NotARepository(start.to_path_buf()))
    }

    /// A repository with no filesystem backing.
    pub fn in_memory() -> RepoResult<Self> {
        let refs = InMemoryRefStore::new();
        refs.set_head(DEFAULT_BRANCH)?;
        Ok(Self {
            root: None,
            objects: Box::new(InMemoryObjectStore::new()),
            refs: Box::new(refs),
        })
    }

    fn from_dir(root: PathBuf) -> RepoResult<Self> {
        let dir = root.join(REPO_DIR);
        let objects = FsObjectStore::open(dir.join("objects"))?;
        let refs = FsRefStore::open(&dir)?;
        Ok(Self {
            root: Some(root),
            objects: Box::new(objects),
            refs: Box::new(refs),
        })
    }

    // ---- Location ----

    /// The working tree, or `None` for an in-memory repository.
    pub fn path(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// The `.vouch` directory.
    pub fn repo_dir(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(REPO_DIR))
    }

    /// Location of `config.toml`.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.repo_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    // ---- Content operations ----

    pub fn write_blob(&self, data: &[u8]) -> RepoResult<ObjectId> {
        Ok(self.objects.write(&Blob::new(data.to_vec()).to_stored_object())?)
    }

    pub fn write_text(&self, text: &str) -> RepoResult<ObjectId> {
        Ok(self.objects.write(&Blob::from_text(text).to_stored_object())?)
    }

    /// Read a blob as UTF-8 text.
    pub fn read_text(&self, id: &ObjectId) -> RepoResult<String> {
        let obj = self.read_object(id)?;
        Ok(Blob::from_stored_object(&obj)?.into_text(*id)?)
    }

    pub fn write_tree(&self, tree: &Tree) -> RepoResult<ObjectId> {
        Ok(self.objects.write(&tree.to_stored_object()?)?)
    }

    pub fn read_tree(&self, id: &ObjectId) -> RepoResult<Tree> {
        let obj = self.read_object(id)?;
        Ok(Tree::from_stored_object(&obj)?)
    }

    pub fn read_object(&self, id: &ObjectId) -> RepoResult<StoredObject> {
        self.objects
            .read(id)?
            .ok_or(RepoError::ObjectNotFound(*id))
    }

    // ---- Commit operations ----

    /// Write a commit object. Does not move any ref.
    pub fn create_commit(
        &self,
        tree: ObjectId,
        parents: Vec<ObjectId>,
        author: &str,
        message: &str,
    ) -> RepoResult<ObjectId> {
        let commit = Commit {
            tree,
            parents,
            author: author.to_string(),
            message: message.to_string(),
            timestamp_ms: now_ms(),
        };
        let id = self.objects.write(&commit.to_stored_object()?)?;
        debug!(%id, message, "created commit");
        Ok(id)
    }

    pub fn read_commit(&self, id: &ObjectId) -> RepoResult<Commit> {
        let obj = self.read_object(id)?;
        if obj.kind != ObjectKind::Commit {
            return Err(RepoError::NotACommit(*id));
        }
        Ok(Commit::from_stored_object(&obj)?)
    }

    /// Returns `true` if `id` names a commit in this repository.
    pub fn is_commit(&self, id: &ObjectId) -> RepoResult<bool> {
        Ok(matches!(self.objects.read(id)?, Some(obj) if obj.kind == ObjectKind::Commit))
    }

    /// Commit `tree` on top of `HEAD` and advance it.
    ///
    /// With a symbolic `HEAD` the named branch moves (compare-and-swap
    /// against the value read here); a detached `HEAD` moves itself.
    pub fn commit_to_head(&self, tree: ObjectId, author: &str, message: &str) -> RepoResult<ObjectId> {
        let parent = self.refs.resolve_head()?;
        let id = self.create_commit(tree, parent.into_iter().collect(), author, message)?;
        match self.refs.head()? {
            Some(Head::Detached(_)) => self.refs.set_head_detached(id)?,
            Some(Head::Symbolic(branch)) => self.refs.compare_and_swap(&branch, parent, id)?,
            None => {
                self.refs.compare_and_swap(DEFAULT_BRANCH, parent, id)?;
                self.refs.set_head(DEFAULT_BRANCH)?;
            }
        }
        Ok(id)
    }

    // ---- Working tree ----

    /// Write the working tree as a tree object, leaving out every `.vouch`
    /// directory. Only regular files and directories are recorded.
    pub fn snapshot_worktree(&self) -> RepoResult<ObjectId> {
        let root = self.root.as_deref().ok_or(RepoError::NoWorkingTree)?;
        // Contents come before their directory, so each directory's entries
        // are complete by the time it is visited.
        let mut pending: HashMap<PathBuf, Vec<TreeEntry>> = HashMap::new();
        let walk = WalkDir::new(root)
            .min_depth(1)
            .contents_first(true)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != REPO_DIR);
        for entry in walk {
            let entry = entry.map_err(io::Error::from)?;
            let name = entry.file_name().to_string_lossy().to_string();
            let item = if entry.file_type().is_dir() {
                let children = pending.remove(entry.path()).unwrap_or_default();
                let tree = self.write_tree(&Tree::new(children))?;
                TreeEntry::new(EntryMode::Directory, name, tree)
            } else if entry.file_type().is_file() {
                let blob = self.write_blob(&fs::read(entry.path())?)?;
                TreeEntry::new(EntryMode::Regular, name, blob)
            } else {
                continue;
            };
            let parent = entry.path().parent().unwrap_or(root).to_path_buf();
            pending.entry(parent).or_default().push(item);
        }
        self.write_tree(&Tree::new(pending.remove(root).unwrap_or_default()))
    }

    /// Snapshot the working tree and commit it on top of `HEAD`.
    pub fn commit_worktree(&self, author: &str, message: &str) -> RepoResult<ObjectId> {
        let tree = self.snapshot_worktree()?;
        let id = self.commit_to_head(tree, author, message)?;
        info!(%id, message, "committed working tree");
        Ok(id)
    }

    // ---- Accessors ----

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn refs(&self) -> &dyn RefStore {
        self.refs.as_ref()
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository").field("root", &self.root).finish()
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => write!(f, "{}", root.display()),
            None => f.write_str("(in-memory)"),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_file_tree(repo: &Repository, content: &str) -> ObjectId {
        let blob = repo.write_blob(content.as_bytes()).unwrap();
        repo.write_tree(&Tree::new(vec![TreeEntry::new(
            EntryMode::Regular,
            "file.txt",
            blob,
        )]))
        .unwrap()
    }

    #[test]
    fn init_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert!(dir.path().join(".vouch/objects").is_dir());
        assert_eq!(
            repo.refs().head().unwrap(),
            Some(Head::Symbolic("refs/heads/main".into()))
        );
        assert_eq!(repo.config_path().unwrap(), dir.path().join(".vouch/config.toml"));
    }

    #[test]
    fn init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        assert!(matches!(
            Repository::init(dir.path()),
            Err(RepoError::AlreadyExists(_))
        ));
    }

    #[test]
    fn discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("src/deep");
        fs::create_dir_all(&nested).unwrap();
        let repo = Repository::discover(&nested).unwrap();
        assert_eq!(repo.path(), Some(dir.path()));
    }

    #[test]
    fn open_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Repository::open(dir.path()),
            Err(RepoError::NotARepository(_))
        ));
    }

    #[test]
    fn blob_and_tree_roundtrip() {
        let repo = Repository::in_memory().unwrap();
        let id = repo.write_blob(b"1").unwrap();
        assert_eq!(repo.read_text(&id).unwrap(), "1");
        let tree_id = one_file_tree(&repo, "hello");
        assert_eq!(repo.read_tree(&tree_id).unwrap().names(), vec!["file.txt"]);
    }

    #[test]
    fn commit_to_head_builds_history() {
        let repo = Repository::in_memory().unwrap();
        let first = repo
            .commit_to_head(one_file_tree(&repo, "a"), "dev", "first")
            .unwrap();
        let second = repo
            .commit_to_head(one_file_tree(&repo, "b"), "dev", "second")
            .unwrap();
        assert_eq!(repo.refs().resolve_head().unwrap(), Some(second));
        assert_eq!(repo.read_commit(&second).unwrap().parents, vec![first]);
        assert!(repo.read_commit(&first).unwrap().parents.is_empty());
    }

    #[test]
    fn read_commit_rejects_other_kinds() {
        let repo = Repository::in_memory().unwrap();
        let blob = repo.write_blob(b"x").unwrap();
        assert!(matches!(repo.read_commit(&blob), Err(RepoError::NotACommit(_))));
        assert!(!repo.is_commit(&blob).unwrap());
        let missing = ObjectId::from_bytes(b"missing");
        assert!(matches!(
            repo.read_commit(&missing),
            Err(RepoError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn worktree_snapshot_skips_repo_dir() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("README"), "hello").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();

        let first = repo.commit_worktree("dev", "import").unwrap();
        let tree = repo.read_tree(&repo.read_commit(&first).unwrap().tree).unwrap();
        assert_eq!(tree.names(), vec!["README", "src"]);
        let src = repo.read_tree(&tree.get("src").unwrap().object_id).unwrap();
        let main = src.get("main.rs").unwrap().object_id;
        assert_eq!(repo.read_text(&main).unwrap(), "fn main() {}");

        fs::write(dir.path().join("README"), "changed").unwrap();
        let second = repo.commit_worktree("dev", "edit").unwrap();
        assert_eq!(repo.read_commit(&second).unwrap().parents, vec![first]);
        assert_eq!(repo.refs().resolve_head().unwrap(), Some(second));
    }

    #[test]
    fn in_memory_repository_has_no_worktree() {
        let repo = Repository::in_memory().unwrap();
        assert!(matches!(
            repo.commit_worktree("dev", "x"),
            Err(RepoError::NoWorkingTree)
        ));
    }

    #[test]
    fn on_disk_repository_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let head = {
            let repo = Repository::init(dir.path()).unwrap();
            repo.commit_to_head(one_file_tree(&repo, "x"), "dev", "init")
                .unwrap()
        };
        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.refs().resolve_head().unwrap(), Some(head));
        assert_eq!(repo.read_commit(&head).unwrap().message, "init");
    }
}
