use std::io::Read;

use anyhow::bail;

use crate::core::{FsConfig, Member, Stat};

/// Behaviour a concrete store plugs into the facade.
///
/// Every path handed to a hook is a canonical path of the facade's namespace;
/// translating it into the store's own addressing is up to the backend.
///
/// Only `members()` is mandatory. The remaining hooks default to a read-only,
/// metadata-less store: nothing is writeable, nothing can be deleted, and every
/// mutating hook fails.
///
/// Hooks return `anyhow::Result`. The facade reports a failing hook as the error
/// kind of the operation that invoked it; read-side hooks (`members`, `stat`) may
/// return an `FsError` wrapped in `anyhow` to pick the reported kind themselves.
pub trait FsBackend {
    /// Default configuration of the namespace.
    fn config(&self) -> FsConfig {
        FsConfig::default()
    }

    /// Raw members of `dirname`, in any order.
    fn members(&self, dirname: &str) -> anyhow::Result<Vec<Member>>;

    /// Metadata of `filename`. Called at most once per entry, and never for
    /// members that came with a stat.
    fn stat(&self, _filename: &str) -> anyhow::Result<Stat> {
        Ok(Stat::default())
    }

    fn is_writeable(&self, _dirname: &str) -> bool {
        false
    }

    /// Backend-specific eligibility of `filename` for deletion.
    fn can_delete(&self, _filename: &str) -> bool {
        false
    }

    fn open_for_read(&self, filename: &str) -> anyhow::Result<Box<dyn Read>> {
        bail!("reading {filename} is not implemented")
    }

    /// Creates the directory `path`; its parent exists.
    fn do_mkdir(&self, path: &str) -> anyhow::Result<()> {
        bail!("creating {path} is not implemented")
    }

    fn do_delete(&self, filename: &str) -> anyhow::Result<()> {
        bail!("deleting {filename} is not implemented")
    }

    /// Renames `source` to `dest`. Both live in the same directory.
    fn do_rename(&self, source: &str, dest: &str) -> anyhow::Result<()> {
        bail!("renaming {source} to {dest} is not implemented")
    }
}
