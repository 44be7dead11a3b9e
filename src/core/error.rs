//! Error taxonomy shared by the facade, directories and entries.
//!
//! Every failure is one `FsError` variant. Gate failures carry a short reason,
//! backend failures carry the backend's own error as `source`.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum FsError {
    /// Lookup by name or index found nothing.
    #[error("{name} not found in {dirname}")]
    NotFound { dirname: String, name: String },

    /// A directory operation was requested on something that is not a directory.
    #[error("{0} is not a directory")]
    NotADirectory(String),

    #[error("cannot read {path}")]
    ReadFailed {
        path: String,
        #[source]
        source: BoxError,
    },

    /// A directory mutation was attempted on a directory that is not writeable.
    #[error("{0} is not writeable")]
    WriteFailed(String),

    #[error("cannot create directory {path}")]
    MkDirFailed {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot delete {path}")]
    DeleteFailed {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot rename {path}")]
    RenameFailed {
        path: String,
        #[source]
        source: BoxError,
    },
}

impl FsError {
    pub fn not_found(dirname: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            dirname: dirname.into(),
            name: name.into(),
        }
    }

    pub fn read_failed(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ReadFailed {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn mkdir_failed(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::MkDirFailed {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn delete_failed(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::DeleteFailed {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn rename_failed(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::RenameFailed {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Recovers an `FsError` a backend returned through `anyhow`, otherwise wraps the
    /// backend error with `fallback`.
    pub(crate) fn from_backend(
        err: anyhow::Error,
        fallback: impl FnOnce(BoxError) -> FsError,
    ) -> FsError {
        match err.downcast::<FsError>() {
            Ok(err) => err,
            Err(err) => fallback(err.into()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
