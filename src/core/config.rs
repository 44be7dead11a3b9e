use crate::core::PathModel;

/// Settings of one `Filesystem` instance.
///
/// Backends provide a sensible default through `FsBackend::config()`; callers can
/// override it with `Filesystem::with_config()`.
///
/// ### Example:
/// ```
/// use vfs_facade::FsConfig;
///
/// let config = FsConfig::default().with_mkdir(true).with_caching(false);
/// assert!(config.supports_mkdir);
/// assert!(!config.supports_delete);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsConfig {
    /// Marker every canonical path starts with.
    pub root: String,
    pub separator: char,
    /// Keep resolved directories in the directory cache.
    pub caching: bool,
    /// Fold case for lookup keys.
    pub case_insensitive: bool,
    pub supports_mkdir: bool,
    pub supports_delete: bool,
    pub supports_rename: bool,
}

impl Default for FsConfig {
    /// `/`-rooted, cached, case insensitive and read-only.
    fn default() -> Self {
        Self {
            root: String::from("/"),
            separator: '/',
            caching: true,
            case_insensitive: true,
            supports_mkdir: false,
            supports_delete: false,
            supports_rename: false,
        }
    }
}

impl FsConfig {
    pub fn with_root(mut self, root: impl Into<String>, separator: char) -> Self {
        self.root = root.into();
        self.separator = separator;
        self
    }

    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn with_mkdir(mut self, supported: bool) -> Self {
        self.supports_mkdir = supported;
        self
    }

    pub fn with_delete(mut self, supported: bool) -> Self {
        self.supports_delete = supported;
        self
    }

    pub fn with_rename(mut self, supported: bool) -> Self {
        self.supports_rename = supported;
        self
    }

    /// Turns every mutation capability on or off at once.
    pub fn with_mutation(self, supported: bool) -> Self {
        self.with_mkdir(supported)
            .with_delete(supported)
            .with_rename(supported)
    }

    pub fn path_model(&self) -> PathModel {
        PathModel::new(self.root.clone(), self.separator)
            .with_case_insensitive(self.case_insensitive)
    }
}
