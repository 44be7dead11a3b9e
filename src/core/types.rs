use std::fmt;

use chrono::{DateTime, Utc};

/// Numeric file type code.
///
/// Codes follow the Acorn filetype convention: twelve-bit types, with a few
/// reserved values used as markers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileType(i32);

impl FileType {
    pub const DATA: FileType = FileType(0xFFD);
    pub const DIRECTORY: FileType = FileType(0x1000);
    /// Codes at or above this value classify as images.
    pub const IMAGE: FileType = FileType(0x3000);
    /// Load/exec addressed file without a type.
    pub const LOADEXEC: FileType = FileType(-1);

    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    pub const fn code(self) -> i32 {
        self.0
    }

    pub fn is_directory(self) -> bool {
        self == Self::DIRECTORY
    }

    pub fn is_untyped(self) -> bool {
        self == Self::LOADEXEC
    }

    pub fn is_image(self) -> bool {
        self.0 >= Self::IMAGE.0
    }
}

impl Default for FileType {
    /// Unknown types are data.
    fn default() -> Self {
        Self::DATA
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_directory() {
            write!(f, "Directory")
        } else if self.is_untyped() {
            write!(f, "Untyped")
        } else if self.is_image() {
            write!(f, "Image file (&{:03X})", self.0)
        } else {
            write!(f, "&{:03X}", self.0)
        }
    }
}

/// Metadata of a single entry. `None` means unknown.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Stat {
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
    pub filetype: FileType,
    pub is_dir: bool,
}

impl Stat {
    pub fn directory() -> Self {
        Self {
            filetype: FileType::DIRECTORY,
            is_dir: true,
            ..Self::default()
        }
    }

    pub fn file(size: u64) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn with_filetype(mut self, filetype: FileType) -> Self {
        self.filetype = filetype;
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }
}

/// One raw member reported by a backend for a directory listing.
///
/// Backends which get metadata for free while listing can hand it over here, so
/// the entry never has to stat lazily.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    name: String,
    stat: Option<Stat>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stat: None,
        }
    }

    pub fn with_stat(name: impl Into<String>, stat: Stat) -> Self {
        Self {
            name: name.into(),
            stat: Some(stat),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stat(&self) -> Option<&Stat> {
        self.stat.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, Option<Stat>) {
        (self.name, self.stat)
    }
}

impl From<&str> for Member {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Member {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filetype_display() {
        assert_eq!(FileType::DIRECTORY.to_string(), "Directory");
        assert_eq!(FileType::LOADEXEC.to_string(), "Untyped");
        assert_eq!(FileType::DATA.to_string(), "&FFD");
        assert_eq!(FileType::new(0x3000).to_string(), "Image file (&3000)");
        assert_eq!(FileType::new(0x12).to_string(), "&012");
    }

    #[test]
    fn test_filetype_classification() {
        assert!(FileType::new(0x3001).is_image());
        assert!(!FileType::DATA.is_image());
        assert!(!FileType::LOADEXEC.is_image());
        assert_eq!(FileType::default(), FileType::DATA);
    }

    #[test]
    fn test_stat_constructors() {
        let dir = Stat::directory();
        assert!(dir.is_dir);
        assert_eq!(dir.filetype, FileType::DIRECTORY);
        assert_eq!(dir.size, None);

        let file = Stat::file(10).with_filetype(FileType::new(0xFFF));
        assert!(!file.is_dir);
        assert_eq!(file.size, Some(10));
        assert_eq!(file.filetype.code(), 0xFFF);
    }

    #[test]
    fn test_member_from_name() {
        let member = Member::from("notes");
        assert_eq!(member.name(), "notes");
        assert!(member.stat().is_none());
    }
}
