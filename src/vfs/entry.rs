use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;
use std::io::Read;
use std::rc::{Rc, Weak};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::core::{FileType, FsError, Result, Stat};
use crate::vfs::Directory;
use crate::vfs::filesystem::FsCore;

/// One addressable item of a filesystem: a file or a directory.
///
/// Entries are created when their directory populates and live as long as that
/// population. Metadata is resolved lazily through the backend's `stat` hook, at
/// most once per entry.
///
/// Entries compare and order by leafname, case-sensitively.
pub struct Entry {
    fs: Rc<FsCore>,
    parent: Weak<Directory>,
    filename: String,
    dirname: String,
    leafname: String,
    stat: OnceCell<Stat>,
}

impl Entry {
    pub(crate) fn new(
        fs: Rc<FsCore>,
        parent: Weak<Directory>,
        filename: String,
        stat: Option<Stat>,
    ) -> Entry {
        let (dirname, leafname) = fs.paths.decompose(&filename);
        let resolved = OnceCell::new();
        if let Some(stat) = stat {
            let _ = resolved.set(stat);
        }
        Entry {
            fs,
            parent,
            filename,
            dirname,
            leafname,
            stat: resolved,
        }
    }

    /// Canonical path.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn dirname(&self) -> &str {
        &self.dirname
    }

    pub fn leafname(&self) -> &str {
        &self.leafname
    }

    pub fn is_root(&self) -> bool {
        self.fs.paths.is_root(&self.filename)
    }

    /// Metadata, resolved on first use. A failing stat is logged and reports
    /// everything unknown; it is not kept, so the next call asks the backend again.
    pub fn stat(&self) -> Stat {
        if let Some(stat) = self.stat.get() {
            return *stat;
        }
        match self.fs.backend.stat(&self.filename) {
            Ok(stat) => *self.stat.get_or_init(|| stat),
            Err(err) => {
                warn!("stat of {} failed: {err:#}", self.filename);
                Stat::default()
            }
        }
    }

    pub fn is_stat_resolved(&self) -> bool {
        self.stat.get().is_some()
    }

    pub fn is_dir(&self) -> bool {
        self.stat().is_dir
    }

    pub fn size(&self) -> Option<u64> {
        self.stat().size
    }

    pub fn modified_time(&self) -> Option<DateTime<Utc>> {
        self.stat().modified
    }

    pub fn filetype(&self) -> FileType {
        self.stat().filetype
    }

    /// The directory this entry names.
    pub fn dir(&self) -> Result<Rc<Directory>> {
        if !self.is_dir() {
            return Err(FsError::NotADirectory(self.filename.clone()));
        }
        self.fs.resolve(&self.filename)
    }

    /// The directory containing this entry.
    pub fn parent(&self) -> Result<Rc<Directory>> {
        match self.parent.upgrade() {
            Some(parent) => Ok(parent),
            None => self.fs.resolve(&self.dirname),
        }
    }

    pub fn open_for_read(&self) -> Result<Box<dyn Read>> {
        self.fs
            .backend
            .open_for_read(&self.filename)
            .map_err(|err| FsError::read_failed(&self.filename, err))
    }

    /// Reads the whole content. The stream is released on every path out.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let mut stream = self.open_for_read()?;
        let mut content = Vec::new();
        stream
            .read_to_end(&mut content)
            .map_err(|err| FsError::read_failed(&self.filename, err))?;
        Ok(content)
    }

    /// Whether `delete()` would be attempted. Has no side effects.
    pub fn can_delete(&self) -> bool {
        !self.is_root()
            && self.fs.config.supports_delete
            && self.fs.backend.is_writeable(&self.dirname)
            && self.fs.backend.can_delete(&self.filename)
    }

    pub fn delete(&self) -> Result<()> {
        if !self.can_delete() {
            return Err(FsError::delete_failed(
                &self.filename,
                "deletion is not permitted",
            ));
        }
        self.fs
            .backend
            .do_delete(&self.filename)
            .map_err(|err| FsError::delete_failed(&self.filename, err))?;
        info!("deleted {}", self.filename);

        match self.parent.upgrade() {
            Some(parent) => parent.invalidate(),
            None => self.fs.invalidate_dir(&self.dirname),
        }
        Ok(())
    }

    pub fn format_size(&self) -> String {
        match self.size() {
            Some(size) => format!("{size} bytes"),
            None => String::from("Unknown"),
        }
    }

    pub fn format_filetype(&self) -> String {
        if self.is_dir() {
            return FileType::DIRECTORY.to_string();
        }
        self.filetype().to_string()
    }

    /// `HH:MM:SS.cc DD Mon YYYY`, in UTC.
    pub fn format_timestamp(&self) -> String {
        match self.modified_time() {
            Some(time) => format!(
                "{}.{:02} {}",
                time.format("%H:%M:%S"),
                time.timestamp_subsec_millis() / 10,
                time.format("%d %b %Y")
            ),
            None => String::from("Unknown"),
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("filename", &self.filename)
            .field("stat", &self.stat.get())
            .finish()
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.leafname == other.leafname
    }
}

impl Eq for Entry {}

impl PartialEq<str> for Entry {
    fn eq(&self, other: &str) -> bool {
        self.leafname == other
    }
}

impl PartialEq<&str> for Entry {
    fn eq(&self, other: &&str) -> bool {
        self.leafname == *other
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.leafname.cmp(&other.leafname)
    }
}
