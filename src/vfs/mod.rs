mod dir_fs;
mod directory;
mod entry;
mod filesystem;
mod map_fs;

pub use dir_fs::DirFS;
pub use directory::Directory;
pub use entry::Entry;
pub use filesystem::Filesystem;
pub use map_fs::MapFS;
