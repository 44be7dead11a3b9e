//! This module provides a backend that maps the namespace onto a real directory on the
//! host system.
//!
//! ### Key Features:
//! - **Isolated root**: All operations are confined to a designated root directory (self.root).
//! - **Path translation**: Canonical `/`-separated paths are mapped below the root;
//!   `.` and `..` components are refused.
//! - **Lazy metadata**: Listings only read names; metadata is read per entry on demand.
//! - **Read-only mode**: Optionally reports no mutation capabilities at all.
//! - **Cross‑platform**: Uses std::path::Path and PathBuf for portable path handling.

use std::fs::{File, Metadata};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::core::{FileType, FsBackend, FsConfig, FsError, Member, PathModel, Stat};

/// A backend that maps to a real directory on the host system.
///
/// `DirFS` exposes the tree below `root` to a `Filesystem`. Every canonical path of
/// the facade is a path relative to `root`: `/docs/note.txt` is `root/docs/note.txt`
/// on the host.
///
/// ### Usage notes:
/// - `DirFS` does not follow symlinks for metadata; deleting a link removes the link,
///   not the target.
/// - Permissions are not adjusted; a directory is writeable when its permissions say so.
/// - Case folding follows the host: on for Windows and macOS, off elsewhere.
/// - Errors are returned via `anyhow::Result` with descriptive messages.
///
/// ### Example:
/// ```
/// use vfs_facade::{DirFS, Filesystem};
///
/// let root = std::env::temp_dir().join("vfs_facade_doc_example");
/// std::fs::create_dir_all(&root).unwrap();
///
/// let fs = Filesystem::new(DirFS::new(&root).unwrap());
/// if fs.fileinfo("/docs").is_err() {
///     fs.mkdir("/docs").unwrap();
/// }
/// assert!(fs.fileinfo("/docs").unwrap().is_dir());
///
/// std::fs::remove_dir_all(&root).unwrap();
/// ```
#[derive(Debug)]
pub struct DirFS {
    root: PathBuf, // host-related absolute normalized path
    paths: PathModel,
    read_only: bool,
}

impl DirFS {
    /// Creates a new DirFS with the root directory at `root`.
    /// * `root` is an absolute host path to an existing directory.
    /// If `root` is empty, relative, missing or not a directory, error returns.
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref();

        if root.as_os_str().is_empty() {
            return Err(anyhow!("invalid root path: empty"));
        }
        if root.is_relative() {
            return Err(anyhow!("the root path must be absolute"));
        }
        let root = Self::normalize(root);
        if !root.is_dir() {
            return Err(anyhow!("{:?} is not a directory", root));
        }

        Ok(Self {
            root,
            paths: PathModel::default(),
            read_only: false,
        })
    }

    /// Returns root path related to the host file system.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// A read-only `DirFS` reports no mutation capability and refuses every
    /// mutating hook.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the path on the host system that matches the canonical `path`.
    pub fn to_host(&self, path: &str) -> anyhow::Result<PathBuf> {
        let mut host = self.root.clone();
        for part in self.paths.split(path) {
            if part == "." || part == ".." {
                bail!("invalid path component {part:?} in {path}");
            }
            host.push(part);
        }
        Ok(host)
    }

    /// Resolves `.` and `..` lexically and drops trailing separators.
    fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
        let mut result = PathBuf::new();
        for component in path.as_ref().components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    result.pop();
                }
                _ => result.push(component),
            }
        }
        result
    }

    /// Host metadata of `path`, without following links; a missing path is `NotFound`.
    fn metadata(&self, path: &str) -> anyhow::Result<Metadata> {
        let host = self.to_host(path)?;
        std::fs::symlink_metadata(&host).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => {
                let (dirname, leafname) = self.paths.decompose(path);
                anyhow::Error::new(FsError::not_found(dirname, leafname))
            }
            _ => anyhow::Error::new(err).context(format!("cannot stat {}", host.display())),
        })
    }
}

impl FsBackend for DirFS {
    fn config(&self) -> FsConfig {
        FsConfig::default()
            .with_mutation(!self.read_only)
            .with_case_insensitive(cfg!(any(windows, target_os = "macos")))
    }

    fn members(&self, dirname: &str) -> anyhow::Result<Vec<Member>> {
        if !self.metadata(dirname)?.is_dir() {
            return Err(FsError::NotADirectory(dirname.to_owned()).into());
        }
        let host = self.to_host(dirname)?;
        let mut members = Vec::new();
        for entry in std::fs::read_dir(&host)
            .with_context(|| format!("cannot list {}", host.display()))?
        {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => members.push(Member::new(name)),
                Err(name) => warn!("skipping non UTF-8 name {name:?} in {}", host.display()),
            }
        }
        Ok(members)
    }

    fn stat(&self, filename: &str) -> anyhow::Result<Stat> {
        let metadata = self.metadata(filename)?;
        let is_dir = metadata.is_dir();
        Ok(Stat {
            size: (!is_dir).then_some(metadata.len()),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            filetype: if is_dir {
                FileType::DIRECTORY
            } else {
                FileType::DATA
            },
            is_dir,
        })
    }

    fn is_writeable(&self, dirname: &str) -> bool {
        !self.read_only
            && self
                .metadata(dirname)
                .is_ok_and(|metadata| metadata.is_dir() && !metadata.permissions().readonly())
    }

    fn can_delete(&self, filename: &str) -> bool {
        !self.read_only && !self.paths.is_root(filename)
    }

    fn open_for_read(&self, filename: &str) -> anyhow::Result<Box<dyn Read>> {
        if self.metadata(filename)?.is_dir() {
            bail!("{filename} is a directory");
        }
        let host = self.to_host(filename)?;
        let file =
            File::open(&host).with_context(|| format!("cannot open {}", host.display()))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn do_mkdir(&self, path: &str) -> anyhow::Result<()> {
        if self.read_only {
            bail!("{path}: read-only filesystem");
        }
        let host = self.to_host(path)?;
        std::fs::create_dir(&host).with_context(|| format!("cannot create {}", host.display()))
    }

    fn do_delete(&self, filename: &str) -> anyhow::Result<()> {
        if self.read_only {
            bail!("{filename}: read-only filesystem");
        }
        if self.paths.is_root(filename) {
            bail!("invalid path: the root cannot be removed");
        }
        let host = self.to_host(filename)?;
        let result = if self.metadata(filename)?.is_dir() {
            std::fs::remove_dir_all(&host)
        } else {
            std::fs::remove_file(&host)
        };
        result.with_context(|| format!("cannot remove {}", host.display()))
    }

    fn do_rename(&self, source: &str, dest: &str) -> anyhow::Result<()> {
        if self.read_only {
            bail!("{source}: read-only filesystem");
        }
        let from = self.to_host(source)?;
        let to = self.to_host(dest)?;
        // std::fs::rename silently replaces files on unix
        if std::fs::symlink_metadata(&to).is_ok() {
            bail!("{} already exists", to.display());
        }
        std::fs::rename(&from, &to)
            .with_context(|| format!("cannot rename {} to {}", from.display(), to.display()))
    }
}
