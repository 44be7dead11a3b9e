//! This module provides a backend that keeps the whole namespace in memory.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use anyhow::{anyhow, bail};
use chrono::{DateTime, Utc};

use crate::core::{FileType, FsBackend, FsConfig, FsError, Member, PathModel, Stat};

#[derive(Debug, Clone, PartialEq)]
struct Node {
    is_dir: bool,
    content: Vec<u8>,
    filetype: FileType,
    modified: Option<DateTime<Utc>>,
}

impl Node {
    fn directory() -> Self {
        Self {
            is_dir: true,
            content: Vec::new(),
            filetype: FileType::DIRECTORY,
            modified: None,
        }
    }

    fn file(content: &[u8]) -> Self {
        Self {
            is_dir: false,
            content: content.to_vec(),
            filetype: FileType::DATA,
            modified: None,
        }
    }

    fn stat(&self) -> Stat {
        Stat {
            size: (!self.is_dir).then_some(self.content.len() as u64),
            modified: self.modified,
            filetype: self.filetype,
            is_dir: self.is_dir,
        }
    }
}

/// An in-memory namespace, usable as a `Filesystem` backend.
///
/// `MapFS` keeps every file and directory in a map keyed by canonical `/`-separated
/// path. Names are stored case-preserving; whether lookups fold case is up to the
/// facade's configuration.
///
/// ### Internal state
///
/// * `entries` — canonical path -> node. Uses `BTreeMap` for deterministic iteration.
/// * `read_only` — when set, the backend reports no mutation capability and no
///   directory is writeable. The builder methods (`mkdir()`, `mkfile()`, ...) keep
///   working so a read-only tree can still be set up.
///
/// ### Invariants
///
/// 1. **Root existence**: `/` is always present and is a directory.
/// 2. **Parent consistency**: for every entry at `/a/b/c` there is a directory `/a/b`.
///
/// ### Example
///
/// ```
/// use vfs_facade::{Filesystem, MapFS};
///
/// let map = MapFS::new();
/// map.mkdir("/docs").unwrap();
/// map.mkfile("/docs/note.txt", b"Hello").unwrap();
///
/// let fs = Filesystem::new(map);
/// assert_eq!(fs.fileinfo("/docs/note.txt").unwrap().read_all().unwrap(), b"Hello");
/// ```
pub struct MapFS {
    paths: PathModel,
    entries: RefCell<BTreeMap<String, Node>>,
    read_only: Cell<bool>,
}

impl Default for MapFS {
    fn default() -> Self {
        Self::new()
    }
}

impl MapFS {
    /// Creates a writeable namespace holding only the root directory.
    pub fn new() -> Self {
        let paths = PathModel::default().with_case_insensitive(false);
        let mut entries = BTreeMap::new();
        entries.insert(paths.root().to_owned(), Node::directory());

        Self {
            paths,
            entries: RefCell::new(entries),
            read_only: Cell::new(false),
        }
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.get()
    }

    pub fn exists(&self, path: &str) -> bool {
        let path = self.paths.canonical(path);
        self.entries.borrow().contains_key(&path)
    }

    /// Creates a directory and all its parents, if needed.
    pub fn mkdir(&self, path: &str) -> anyhow::Result<()> {
        let path = self.paths.canonical(path);
        if self.exists(&path) {
            bail!("path already exists: {path}");
        }
        self.ensure_dir(&path)
    }

    /// Creates a file with `content`. Missing parent directories are created.
    pub fn mkfile(&self, path: &str, content: &[u8]) -> anyhow::Result<()> {
        let path = self.paths.canonical(path);
        if self.exists(&path) {
            bail!("{path} already exists");
        }
        let parent = self.paths.dirname(&path);
        self.ensure_dir(&parent)?;
        self.entries.borrow_mut().insert(path, Node::file(content));
        Ok(())
    }

    pub fn set_filetype(&self, path: &str, filetype: FileType) -> anyhow::Result<()> {
        self.update(path, |node| node.filetype = filetype)
    }

    pub fn set_modified(&self, path: &str, modified: DateTime<Utc>) -> anyhow::Result<()> {
        self.update(path, |node| node.modified = Some(modified))
    }

    fn update(&self, path: &str, change: impl FnOnce(&mut Node)) -> anyhow::Result<()> {
        let path = self.paths.canonical(path);
        let mut entries = self.entries.borrow_mut();
        let node = entries
            .get_mut(&path)
            .ok_or_else(|| anyhow!("{path} does not exist"))?;
        change(node);
        Ok(())
    }

    /// Creates `path` and its missing ancestors as directories.
    fn ensure_dir(&self, path: &str) -> anyhow::Result<()> {
        let mut built = Vec::new();
        for part in self.paths.split(path) {
            built.push(part);
            let prefix = self.paths.join(&built);
            let mut entries = self.entries.borrow_mut();
            match entries.get(&prefix) {
                Some(node) if !node.is_dir => {
                    bail!("path '{prefix}' exists but is not a directory")
                }
                Some(_) => {}
                None => {
                    entries.insert(prefix, Node::directory());
                }
            }
        }
        Ok(())
    }

    fn node(&self, path: &str) -> anyhow::Result<Node> {
        self.entries
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| {
                let (dirname, leafname) = self.paths.decompose(path);
                anyhow::Error::new(FsError::not_found(dirname, leafname))
            })
    }

    /// `path` itself and everything below it.
    fn is_within(&self, path: &str, ancestor: &str) -> bool {
        if self.paths.is_root(ancestor) {
            return true;
        }
        path == ancestor
            || path
                .strip_prefix(ancestor)
                .is_some_and(|rest| rest.starts_with(self.paths.separator()))
    }
}

impl FsBackend for MapFS {
    fn config(&self) -> FsConfig {
        FsConfig::default().with_mutation(!self.is_read_only())
    }

    fn members(&self, dirname: &str) -> anyhow::Result<Vec<Member>> {
        if !self.node(dirname)?.is_dir {
            return Err(FsError::NotADirectory(dirname.to_owned()).into());
        }
        Ok(self
            .entries
            .borrow()
            .keys()
            .filter(|path| !self.paths.is_root(path) && self.paths.dirname(path) == dirname)
            .map(|path| Member::new(self.paths.leafname(path)))
            .collect())
    }

    fn stat(&self, filename: &str) -> anyhow::Result<Stat> {
        Ok(self.node(filename)?.stat())
    }

    fn is_writeable(&self, dirname: &str) -> bool {
        !self.is_read_only() && self.node(dirname).is_ok_and(|node| node.is_dir)
    }

    fn can_delete(&self, filename: &str) -> bool {
        !self.is_read_only() && !self.paths.is_root(filename)
    }

    fn open_for_read(&self, filename: &str) -> anyhow::Result<Box<dyn Read>> {
        let node = self.node(filename)?;
        if node.is_dir {
            bail!("{filename} is a directory");
        }
        Ok(Box::new(Cursor::new(node.content)))
    }

    fn do_mkdir(&self, path: &str) -> anyhow::Result<()> {
        if self.is_read_only() {
            bail!("{path}: read-only filesystem");
        }
        if self.exists(path) {
            bail!("path already exists: {path}");
        }
        let parent = self.paths.dirname(path);
        if !self.node(&parent)?.is_dir {
            bail!("{parent} is not a directory");
        }
        self.entries
            .borrow_mut()
            .insert(path.to_owned(), Node::directory());
        Ok(())
    }

    fn do_delete(&self, filename: &str) -> anyhow::Result<()> {
        if self.is_read_only() {
            bail!("{filename}: read-only filesystem");
        }
        if self.paths.is_root(filename) {
            bail!("the root cannot be removed");
        }
        self.node(filename)?;

        let mut entries = self.entries.borrow_mut();
        entries.retain(|path, _| !self.is_within(path, filename));
        Ok(())
    }

    fn do_rename(&self, source: &str, dest: &str) -> anyhow::Result<()> {
        if self.is_read_only() {
            bail!("{source}: read-only filesystem");
        }
        if self.paths.is_root(source) {
            bail!("the root cannot be renamed");
        }
        self.node(source)?;
        if self.exists(dest) {
            bail!("{dest} already exists");
        }

        let mut entries = self.entries.borrow_mut();
        let moved: Vec<String> = entries
            .keys()
            .filter(|path| self.is_within(path, source))
            .cloned()
            .collect();
        for path in moved {
            if let Some(node) = entries.remove(&path) {
                let renamed = format!("{dest}{}", &path[source.len()..]);
                entries.insert(renamed, node);
            }
        }
        Ok(())
    }
}
