//! A backend-agnostic facade over hierarchical namespaces for Rust.
//! Gives uniform path handling, lazily cached directory listings, file metadata and
//! capability-gated mutation, whatever store sits underneath.
//!
//! ### Overview
//!
//! `vfs-facade` lets you browse and modify filesystem-like structures through one API.
//! It defines the `FsBackend` trait and ships two implementations: `DirFS`, which maps
//! to a real host directory, and `MapFS`, which keeps everything in memory.
//!
//! **Key ideas**:
//! - **Abstraction**: `Filesystem`, `Directory` and `Entry` behave the same over every backend.
//! - **Lazy caching**: directories are resolved ancestors first, cached by normalized path
//!   and populated on first use; `invalidate_dir()` forces a fresh listing.
//! - **Case handling**: lookups can fold case while names keep their original spelling.
//! - **Capability gates**: every mutation is checked against the filesystem, the directory
//!   and the entry before the backend is asked to act; `can_*` predicates report the same
//!   decision without side effects.
//! - **Typed failures**: every error is an `FsError` variant.
//!
//! ### Example
//!
//! ```
//! use vfs_facade::{Filesystem, MapFS};
//!
//! let map = MapFS::new();
//! map.mkdir("/A").unwrap();
//! map.mkfile("/b.txt", b"0123456789").unwrap();
//!
//! let fs = Filesystem::new(map);
//! let names: Vec<_> = fs
//!     .rootdir()
//!     .unwrap()
//!     .listing()
//!     .unwrap()
//!     .iter()
//!     .map(|entry| entry.leafname().to_owned())
//!     .collect();
//! assert_eq!(names, ["A", "b.txt"]);
//! assert_eq!(fs.fileinfo("/b.txt").unwrap().size(), Some(10));
//! ```

mod core;
mod vfs;

pub use crate::core::{
    BoxError, FileType, FsBackend, FsConfig, FsError, Member, PathModel, Result, Stat,
};
pub use crate::vfs::{DirFS, Directory, Entry, Filesystem, MapFS};
