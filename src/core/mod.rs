mod backend;
mod config;
mod error;
mod path;
mod types;

pub use backend::FsBackend;
pub use config::FsConfig;
pub use error::{BoxError, FsError};
pub use path::PathModel;
pub use types::{FileType, Member, Stat};

pub type Result<T> = std::result::Result<T, FsError>;
