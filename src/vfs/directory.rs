use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use crate::core::{FsError, Result};
use crate::vfs::Entry;
use crate::vfs::filesystem::FsCore;

/// Entries of a populated directory.
struct Population {
    by_key: HashMap<String, Rc<Entry>>, // normalized leafname -> entry
    sorted: Vec<Rc<Entry>>,             // ordered by leafname
}

/// One directory of a filesystem.
///
/// A directory starts unpopulated. The first listing or lookup asks the backend
/// for the members and wraps each of them into an `Entry`; the result is kept
/// until `invalidate()`, so repeated queries see the same entries in the same
/// order.
///
/// Mutations are gated: `mkdir`, `rename` and entry deletion check writeability
/// first and invalidate the directory only after the backend hook succeeded.
///
/// ### Example:
/// ```
/// use vfs_facade::{Filesystem, MapFS};
///
/// let map = MapFS::new();
/// map.mkdir("/docs").unwrap();
/// map.mkfile("/docs/note.txt", b"Hello").unwrap();
///
/// let fs = Filesystem::new(map);
/// let docs = fs.dir("/docs").unwrap();
/// let names: Vec<_> = docs
///     .listing()
///     .unwrap()
///     .iter()
///     .map(|entry| entry.leafname().to_owned())
///     .collect();
/// assert_eq!(names, ["note.txt"]);
/// ```
pub struct Directory {
    fs: Rc<FsCore>,
    me: Weak<Directory>,
    parent: Option<Weak<Directory>>, // `None` for the root
    dirname: String,
    files: RefCell<Option<Population>>,
}

impl Directory {
    pub(crate) fn new(
        fs: Rc<FsCore>,
        parent: Option<&Rc<Directory>>,
        dirname: String,
    ) -> Rc<Directory> {
        Rc::new_cyclic(|me| Directory {
            fs,
            me: me.clone(),
            parent: parent.map(Rc::downgrade),
            dirname,
            files: RefCell::new(None),
        })
    }

    /// Canonical path.
    pub fn dirname(&self) -> &str {
        &self.dirname
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The parent directory; the root is its own parent.
    pub fn parent(&self) -> Result<Rc<Directory>> {
        let parent = match &self.parent {
            None => self.me.upgrade(),
            Some(parent) => parent.upgrade(),
        };
        match parent {
            Some(parent) => Ok(parent),
            // The parent is gone when caching is off; resolve it again.
            None => self.fs.resolve(&self.fs.paths.dirname(&self.dirname)),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.files.borrow().is_some()
    }

    /// Forgets the entries; the next query repopulates. Subdirectories are not
    /// affected.
    pub fn invalidate(&self) {
        if self.files.borrow_mut().take().is_some() {
            debug!("invalidated {}", self.dirname);
        }
    }

    fn populate(&self) -> Result<()> {
        if self.is_populated() {
            return Ok(());
        }

        let members = self.fs.backend.members(&self.dirname).map_err(|err| {
            FsError::from_backend(err, |source| FsError::read_failed(&self.dirname, source))
        })?;

        let paths = &self.fs.paths;
        let mut by_key = HashMap::with_capacity(members.len());
        for member in members {
            let (name, stat) = member.into_parts();
            if !paths.is_valid_leafname(&name) {
                warn!("skipping member {name:?} of {}", self.dirname);
                continue;
            }
            let filename = paths.join([self.dirname.as_str(), name.as_str()]);
            let entry = Entry::new(Rc::clone(&self.fs), self.me.clone(), filename, stat);
            if let Some(previous) = by_key.insert(paths.normalise_name(&name), Rc::new(entry)) {
                warn!("{} shadowed by {name} in {}", previous.leafname(), self.dirname);
            }
        }

        let mut sorted: Vec<_> = by_key.values().cloned().collect();
        sorted.sort();
        debug!("populated {} with {} entries", self.dirname, sorted.len());

        *self.files.borrow_mut() = Some(Population { by_key, sorted });
        Ok(())
    }

    /// Entries ordered by leafname.
    pub fn listing(&self) -> Result<Vec<Rc<Entry>>> {
        self.populate()?;
        let files = self.files.borrow();
        Ok(files
            .as_ref()
            .map(|files| files.sorted.clone())
            .unwrap_or_default())
    }

    pub fn len(&self) -> Result<usize> {
        self.populate()?;
        Ok(self
            .files
            .borrow()
            .as_ref()
            .map_or(0, |files| files.sorted.len()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Looks an entry up by name, case-folded as the namespace requires.
    pub fn lookup(&self, name: &str) -> Result<Rc<Entry>> {
        self.populate()?;
        let key = self.fs.paths.normalise_name(name);
        self.files
            .borrow()
            .as_ref()
            .and_then(|files| files.by_key.get(&key).cloned())
            .ok_or_else(|| FsError::not_found(&self.dirname, name))
    }

    /// Looks an entry up by its position in `listing()`.
    pub fn lookup_index(&self, index: usize) -> Result<Rc<Entry>> {
        self.populate()?;
        self.files
            .borrow()
            .as_ref()
            .and_then(|files| files.sorted.get(index).cloned())
            .ok_or_else(|| FsError::not_found(&self.dirname, format!("#{index}")))
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        self.populate()?;
        let key = self.fs.paths.normalise_name(name);
        Ok(self
            .files
            .borrow()
            .as_ref()
            .is_some_and(|files| files.by_key.contains_key(&key)))
    }

    pub fn is_writeable(&self) -> bool {
        self.fs.backend.is_writeable(&self.dirname)
    }

    pub fn can_mkdir(&self) -> bool {
        self.fs.config.supports_mkdir && self.is_writeable()
    }

    /// Creates the subdirectory `leafname`.
    pub fn mkdir(&self, leafname: &str) -> Result<()> {
        if !self.is_writeable() {
            return Err(FsError::WriteFailed(self.dirname.clone()));
        }
        let path = self.fs.paths.join([self.dirname.as_str(), leafname]);
        if !self.fs.paths.is_valid_leafname(leafname) {
            return Err(FsError::mkdir_failed(path, "invalid directory name"));
        }
        if self.contains(leafname)? {
            return Err(FsError::mkdir_failed(path, "already exists"));
        }
        self.fs
            .backend
            .do_mkdir(&path)
            .map_err(|err| FsError::mkdir_failed(&path, err))?;
        info!("created directory {path}");
        self.invalidate();
        Ok(())
    }

    /// Whether the entry `leafname` could be deleted. Never fails: a missing entry
    /// just cannot be deleted.
    pub fn can_delete(&self, leafname: &str) -> bool {
        self.fs.config.supports_delete
            && self.is_writeable()
            && self
                .lookup(leafname)
                .is_ok_and(|entry| entry.can_delete())
    }

    pub fn can_rename(&self, source: &str, dest: &str) -> bool {
        if !self.fs.config.supports_rename || !self.is_writeable() {
            return false;
        }
        let paths = &self.fs.paths;
        if paths.normalise_name(source) == paths.normalise_name(dest) {
            return true;
        }
        paths.is_valid_leafname(dest)
            && self.contains(source).unwrap_or(false)
            && !self.contains(dest).unwrap_or(true)
    }

    /// Renames the entry `source` to `dest` within this directory. Names that only
    /// differ where the namespace folds them are left alone.
    pub fn rename(&self, source: &str, dest: &str) -> Result<()> {
        let paths = &self.fs.paths;
        if paths.normalise_name(source) == paths.normalise_name(dest) {
            debug!("rename of {source} onto itself in {} skipped", self.dirname);
            return Ok(());
        }

        let source_path = paths.join([self.dirname.as_str(), source]);
        if !self.is_writeable() {
            return Err(FsError::rename_failed(
                source_path,
                format!("{} is not writeable", self.dirname),
            ));
        }
        if !paths.is_valid_leafname(dest) {
            return Err(FsError::rename_failed(source_path, "invalid destination name"));
        }
        let entry = match self.lookup(source) {
            Ok(entry) => entry,
            Err(err) => return Err(FsError::rename_failed(source_path, err)),
        };
        let dest_path = paths.join([self.dirname.as_str(), dest]);
        if self.contains(dest)? {
            return Err(FsError::rename_failed(
                entry.filename(),
                format!("{dest_path} already exists"),
            ));
        }

        self.fs
            .backend
            .do_rename(entry.filename(), &dest_path)
            .map_err(|err| FsError::rename_failed(entry.filename(), err))?;
        info!("renamed {} to {dest_path}", entry.filename());
        self.invalidate();
        Ok(())
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("dirname", &self.dirname)
            .field("populated", &self.is_populated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Filesystem, FsConfig, MapFS};

    fn setup_test_vfs() -> MapFS {
        let map = MapFS::new();
        map.mkdir("/home/user").unwrap();
        map.mkdir("/home/guest").unwrap();
        map.mkfile("/home/user/file2.txt", b"Content 2").unwrap();
        map.mkfile("/home/user/File1.txt", b"Content 1").unwrap();
        map.mkfile("/home/user/config", b"").unwrap();
        map
    }

    fn setup_test_fs() -> Filesystem {
        Filesystem::new(setup_test_vfs())
    }

    mod listing {
        use super::*;

        #[test]
        fn test_listing_sorted_by_leafname() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            let names: Vec<_> = user
                .listing()?
                .iter()
                .map(|entry| entry.leafname().to_owned())
                .collect();
            // case-sensitive order: upper case sorts first
            assert_eq!(names, ["File1.txt", "config", "file2.txt"]);
            Ok(())
        }

        #[test]
        fn test_listing_is_stable_snapshot() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            let first = user.listing()?;
            let second = user.listing()?;
            assert_eq!(first.len(), second.len());
            for (a, b) in first.iter().zip(&second) {
                assert!(Rc::ptr_eq(a, b));
            }
            Ok(())
        }

        #[test]
        fn test_listing_empty_directory() -> Result<()> {
            let fs = setup_test_fs();
            let guest = fs.dir("/home/guest")?;
            assert!(guest.listing()?.is_empty());
            assert!(guest.is_empty()?);
            Ok(())
        }

        #[test]
        fn test_population_is_lazy() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            assert!(!user.is_populated());
            assert_eq!(user.len()?, 3);
            assert!(user.is_populated());
            user.invalidate();
            assert!(!user.is_populated());
            Ok(())
        }
    }

    mod lookup {
        use super::*;

        #[test]
        fn test_lookup_case_insensitive() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            let entry = user.lookup("FILE1.TXT")?;
            assert_eq!(entry.leafname(), "File1.txt");
            assert!(user.contains("file1.txt")?);
            Ok(())
        }

        #[test]
        fn test_lookup_case_sensitive() -> Result<()> {
            let fs = Filesystem::with_config(
                setup_test_vfs(),
                FsConfig::default().with_case_insensitive(false),
            );
            let user = fs.dir("/home/user")?;
            assert!(user.lookup("File1.txt").is_ok());
            assert!(user.lookup("file1.txt").unwrap_err().is_not_found());
            Ok(())
        }

        #[test]
        fn test_lookup_missing() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            let err = user.lookup("nothing").unwrap_err();
            assert!(err.is_not_found());
            assert!(err.to_string().contains("nothing"));
            Ok(())
        }

        #[test]
        fn test_lookup_index() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            assert_eq!(user.lookup_index(0)?.leafname(), "File1.txt");
            assert_eq!(user.lookup_index(2)?.leafname(), "file2.txt");
            assert!(user.lookup_index(3).unwrap_err().is_not_found());
            Ok(())
        }
    }

    mod parent {
        use super::*;

        #[test]
        fn test_parent_chain() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            let home = user.parent()?;
            assert_eq!(home.dirname(), "/home");
            assert!(Rc::ptr_eq(&home, &fs.dir("/home")?));
            let root = home.parent()?;
            assert!(root.is_root());
            assert!(Rc::ptr_eq(&root.parent()?, &root));
            Ok(())
        }

        #[test]
        fn test_parent_without_caching() -> Result<()> {
            let fs = Filesystem::with_config(
                setup_test_vfs(),
                FsConfig::default().with_caching(false),
            );
            let user = fs.dir("/home/user")?;
            assert_eq!(user.parent()?.dirname(), "/home");
            Ok(())
        }
    }

    mod mkdir {
        use super::*;

        #[test]
        fn test_mkdir_invalidates() -> Result<()> {
            let fs = setup_test_fs();
            let home = fs.dir("/home")?;
            assert_eq!(home.len()?, 2);
            assert!(home.can_mkdir());
            home.mkdir("admin")?;
            assert!(!home.is_populated());
            assert!(home.lookup("admin")?.is_dir());
            Ok(())
        }

        #[test]
        fn test_mkdir_not_writeable() -> Result<()> {
            let map = setup_test_vfs();
            map.set_read_only(true);
            let fs = Filesystem::new(map);
            let home = fs.dir("/home")?;
            home.listing()?;
            assert!(!home.can_mkdir());
            assert!(matches!(
                home.mkdir("admin").unwrap_err(),
                FsError::WriteFailed(_)
            ));
            assert!(home.is_populated());
            Ok(())
        }

        #[test]
        fn test_mkdir_existing_fails() -> Result<()> {
            let fs = setup_test_fs();
            let home = fs.dir("/home")?;
            home.listing()?;
            assert!(matches!(
                home.mkdir("user").unwrap_err(),
                FsError::MkDirFailed { .. }
            ));
            assert!(home.is_populated());
            Ok(())
        }

        #[test]
        fn test_mkdir_case_variant_fails() -> Result<()> {
            let fs = setup_test_fs();
            let home = fs.dir("/home")?;
            assert!(matches!(
                home.mkdir("USER").unwrap_err(),
                FsError::MkDirFailed { .. }
            ));
            assert_eq!(home.len()?, 2);
            assert_eq!(home.lookup("user")?.leafname(), "user");
            assert!(fs.fileinfo("/home/user/config").is_ok());
            Ok(())
        }

        #[test]
        fn test_mkdir_invalid_name() -> Result<()> {
            let fs = setup_test_fs();
            let home = fs.dir("/home")?;
            assert!(matches!(
                home.mkdir("a/b").unwrap_err(),
                FsError::MkDirFailed { .. }
            ));
            Ok(())
        }
    }

    mod delete {
        use super::*;

        #[test]
        fn test_can_delete() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            assert!(user.can_delete("config"));
            assert!(!user.can_delete("missing"));
            Ok(())
        }

        #[test]
        fn test_can_delete_without_capability() -> Result<()> {
            let fs = Filesystem::with_config(
                setup_test_vfs(),
                FsConfig::default().with_mutation(true).with_delete(false),
            );
            let user = fs.dir("/home/user")?;
            assert!(!user.can_delete("config"));
            Ok(())
        }
    }

    mod rename {
        use super::*;

        #[test]
        fn test_rename() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            assert!(user.can_rename("config", "settings"));
            user.rename("config", "settings")?;
            assert!(!user.is_populated());
            assert!(user.contains("settings")?);
            assert!(!user.contains("config")?);
            Ok(())
        }

        #[test]
        fn test_rename_same_name_is_noop() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            user.listing()?;
            assert!(user.can_rename("config", "CONFIG"));
            user.rename("config", "CONFIG")?;
            assert!(user.is_populated());
            assert_eq!(user.lookup("config")?.leafname(), "config");
            Ok(())
        }

        #[test]
        fn test_rename_collision() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            assert!(!user.can_rename("config", "file2.txt"));
            let err = user.rename("config", "file2.txt").unwrap_err();
            assert!(matches!(err, FsError::RenameFailed { .. }));
            assert!(user.is_populated());
            Ok(())
        }

        #[test]
        fn test_rename_missing_source() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            assert!(!user.can_rename("missing", "other"));
            assert!(matches!(
                user.rename("missing", "other").unwrap_err(),
                FsError::RenameFailed { .. }
            ));
            Ok(())
        }

        #[test]
        fn test_predicates_keep_population_state() -> Result<()> {
            let fs = setup_test_fs();
            let user = fs.dir("/home/user")?;
            user.listing()?;
            user.can_rename("config", "other");
            user.can_delete("config");
            user.can_mkdir();
            assert!(user.is_populated());
            Ok(())
        }
    }
}
