//! The filesystem facade and its directory cache.
//!
//! `Filesystem` resolves directory paths into shared `Directory` instances. A
//! requested directory is resolved ancestors first: the parent is resolved (and
//! cached), the child is looked up in the parent's listing, and only then is the
//! child directory built. With caching on, resolving the same path again returns
//! the very same instance until nothing holds the facade any more.
//!
//! ### Capability tiers
//! Every mutation passes three gates before a backend hook runs:
//! 1. the filesystem-wide capability (`FsConfig::supports_*`),
//! 2. the writeability of the directory involved,
//! 3. the entry's own eligibility (deletion only).
//!
//! The `can_*` predicates report the outcome of these gates without side effects;
//! the mutating calls check them again and fail with a typed `FsError`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::core::{FsBackend, FsConfig, FsError, PathModel, Result, Stat};
use crate::vfs::{Directory, Entry};

/// Normalized path -> directory.
struct DirCache {
    enabled: bool,
    dirs: RefCell<HashMap<String, Rc<Directory>>>,
}

impl DirCache {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            dirs: RefCell::new(HashMap::new()),
        }
    }

    fn get(&self, key: &str) -> Option<Rc<Directory>> {
        if !self.enabled {
            return None;
        }
        self.dirs.borrow().get(key).cloned()
    }

    fn insert(&self, key: String, dir: &Rc<Directory>) {
        if self.enabled {
            self.dirs.borrow_mut().insert(key, Rc::clone(dir));
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.dirs.borrow().contains_key(key)
    }

    fn clear(&self) {
        // Take the map out first: dropping directories must not happen while borrowed.
        let dirs = std::mem::take(&mut *self.dirs.borrow_mut());
        drop(dirs);
    }
}

/// State shared by the facade and every directory and entry it hands out.
pub(crate) struct FsCore {
    pub(crate) backend: Box<dyn FsBackend>,
    pub(crate) config: FsConfig,
    pub(crate) paths: PathModel,
    cache: DirCache,
}

impl FsCore {
    /// Resolves `dirname` into a directory, ancestors first.
    pub(crate) fn resolve(self: &Rc<Self>, dirname: &str) -> Result<Rc<Directory>> {
        let key = self.paths.path_key(dirname);
        if let Some(dir) = self.cache.get(&key) {
            trace!("directory cache hit for {dirname}");
            return Ok(dir);
        }

        let dirname = self.paths.canonical(dirname);
        let (parent_name, leafname) = self.paths.decompose(&dirname);
        let dir = if leafname.is_empty() || parent_name == dirname {
            Directory::new(Rc::clone(self), None, dirname)
        } else {
            let parent = self.resolve(&parent_name)?;
            let entry = parent.lookup(&leafname)?;
            if !entry.is_dir() {
                return Err(FsError::NotADirectory(entry.filename().to_owned()));
            }
            Directory::new(Rc::clone(self), Some(&parent), entry.filename().to_owned())
        };
        debug!("resolved directory {}", dir.dirname());

        self.cache.insert(key, &dir);
        Ok(dir)
    }

    pub(crate) fn invalidate_dir(&self, dirname: &str) {
        if let Some(dir) = self.cache.get(&self.paths.path_key(dirname)) {
            dir.invalidate();
        }
    }
}

/// Backend-agnostic view of one hierarchical namespace.
///
/// `Filesystem` owns the directory cache and hands out `Rc<Directory>` and
/// `Rc<Entry>` handles. It is single-threaded: the cache and the directory
/// populations are unsynchronized.
///
/// ### Example:
/// ```
/// use vfs_facade::{Filesystem, MapFS};
///
/// let map = MapFS::new();
/// map.mkdir("/A").unwrap();
/// map.mkfile("/b.txt", b"0123456789").unwrap();
///
/// let fs = Filesystem::new(map);
/// assert_eq!(fs.fileinfo("/b.txt").unwrap().size(), Some(10));
///
/// fs.rename("/b.txt", "/c.txt").unwrap();
/// assert!(fs.fileinfo("/c.txt").is_ok());
/// ```
pub struct Filesystem {
    core: Rc<FsCore>,
}

impl Filesystem {
    /// Creates a facade configured the way `backend` suggests.
    pub fn new<B: FsBackend + 'static>(backend: B) -> Self {
        let config = backend.config();
        Self::with_config(backend, config)
    }

    pub fn with_config<B: FsBackend + 'static>(backend: B, config: FsConfig) -> Self {
        let paths = config.path_model();
        let cache = DirCache::new(config.caching);
        Self {
            core: Rc::new(FsCore {
                backend: Box::new(backend),
                config,
                paths,
                cache,
            }),
        }
    }

    pub fn config(&self) -> &FsConfig {
        &self.core.config
    }

    pub fn paths(&self) -> &PathModel {
        &self.core.paths
    }

    pub fn rootname(&self) -> &str {
        self.core.paths.root()
    }

    pub fn rootdir(&self) -> Result<Rc<Directory>> {
        self.dir(self.rootname())
    }

    /// Resolves a directory through the cache. The empty path is the root.
    pub fn dir(&self, dirname: &str) -> Result<Rc<Directory>> {
        self.core.resolve(dirname)
    }

    /// Whether `dirname` currently has a cache entry.
    pub fn is_cached(&self, dirname: &str) -> bool {
        self.core.cache.contains(&self.core.paths.path_key(dirname))
    }

    /// Makes the cached directory repopulate on its next query. The cache entry
    /// itself stays. Without caching this does nothing: holders of directories
    /// must invalidate them themselves.
    pub fn invalidate_dir(&self, dirname: &str) {
        self.core.invalidate_dir(dirname);
    }

    /// Information about the root itself.
    pub fn rootinfo(&self) -> Result<Rc<Entry>> {
        let root = self.rootname().to_owned();
        let stat = match self.core.backend.stat(&root) {
            Ok(stat) => stat,
            Err(err) => {
                debug!("stat of the root failed: {err:#}");
                Stat::directory()
            }
        };
        Ok(Rc::new(Entry::new(
            Rc::clone(&self.core),
            Weak::new(),
            root,
            Some(Stat {
                is_dir: true,
                ..stat
            }),
        )))
    }

    /// Information about any path.
    pub fn fileinfo(&self, path: &str) -> Result<Rc<Entry>> {
        let (dirname, leafname) = self.core.paths.decompose(path);
        if leafname.is_empty() {
            return self.rootinfo();
        }
        self.dir(&dirname)?.lookup(&leafname)
    }

    pub fn supports_mkdir(&self) -> bool {
        self.core.config.supports_mkdir
    }

    pub fn supports_delete(&self) -> bool {
        self.core.config.supports_delete
    }

    pub fn supports_rename(&self) -> bool {
        self.core.config.supports_rename
    }

    /// Whether the directory `path` could be created.
    pub fn can_mkdir(&self, path: &str) -> bool {
        if !self.supports_mkdir() {
            return false;
        }
        let (dirname, leafname) = self.core.paths.decompose(path);
        !leafname.is_empty()
            && self
                .dir(&dirname)
                .is_ok_and(|dir| dir.can_mkdir() && !dir.contains(&leafname).unwrap_or(true))
    }

    pub fn can_delete(&self, path: &str) -> bool {
        if !self.supports_delete() {
            return false;
        }
        let (dirname, leafname) = self.core.paths.decompose(path);
        !leafname.is_empty()
            && self
                .dir(&dirname)
                .is_ok_and(|dir| dir.can_delete(&leafname))
    }

    /// Whether `source` could be renamed to `dest`. Moves between directories are
    /// never allowed.
    pub fn can_rename(&self, source: &str, dest: &str) -> bool {
        if !self.supports_rename() {
            return false;
        }
        let paths = &self.core.paths;
        let (source_dir, source_leaf) = paths.decompose(source);
        let (dest_dir, dest_leaf) = paths.decompose(dest);
        if source_leaf.is_empty() || dest_leaf.is_empty() {
            return false;
        }
        if paths.normalise_name(&source_dir) != paths.normalise_name(&dest_dir) {
            return false;
        }
        self.dir(&source_dir)
            .is_ok_and(|dir| dir.can_rename(&source_leaf, &dest_leaf))
    }

    pub fn mkdir(&self, path: &str) -> Result<()> {
        if !self.supports_mkdir() {
            return Err(FsError::mkdir_failed(
                path,
                "creating directories is not supported",
            ));
        }
        let (dirname, leafname) = self.core.paths.decompose(path);
        if leafname.is_empty() {
            return Err(FsError::mkdir_failed(path, "the root already exists"));
        }
        self.dir(&dirname)?.mkdir(&leafname)
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        if !self.supports_delete() {
            return Err(FsError::delete_failed(path, "deletion is not supported"));
        }
        let (dirname, leafname) = self.core.paths.decompose(path);
        if leafname.is_empty() {
            return Err(FsError::delete_failed(path, "the root cannot be deleted"));
        }
        let entry = self
            .dir(&dirname)
            .and_then(|dir| dir.lookup(&leafname))
            .map_err(|err| FsError::delete_failed(path, err))?;
        entry.delete()
    }

    /// Renames `source` to `dest`; both must be in the same directory.
    pub fn rename(&self, source: &str, dest: &str) -> Result<()> {
        if !self.supports_rename() {
            return Err(FsError::rename_failed(source, "renaming is not supported"));
        }
        let paths = &self.core.paths;
        let (source_dir, source_leaf) = paths.decompose(source);
        let (dest_dir, dest_leaf) = paths.decompose(dest);
        if source_leaf.is_empty() || dest_leaf.is_empty() {
            return Err(FsError::rename_failed(source, "the root cannot be renamed"));
        }
        if paths.normalise_name(&source_dir) != paths.normalise_name(&dest_dir) {
            return Err(FsError::rename_failed(
                source,
                format!("cannot move between directories ({source_dir} to {dest_dir})"),
            ));
        }
        if paths.normalise_name(&source_leaf) == paths.normalise_name(&dest_leaf) {
            return Ok(());
        }
        self.dir(&source_dir)?.rename(&source_leaf, &dest_leaf)
    }
}

impl fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filesystem")
            .field("config", &self.core.config)
            .finish()
    }
}

impl Drop for Filesystem {
    /// Cached directories point back at the shared core; releasing them breaks the
    /// cycle.
    fn drop(&mut self) {
        self.core.cache.clear();
    }
}
