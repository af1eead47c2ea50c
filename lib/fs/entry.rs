//! Entries returned by listings and `stat`.

use std::cmp::Ordering;
use std::time::SystemTime;

use bitflags::bitflags;

bitflags! {
    /// Mode bits reported for an entry.
    ///
    /// Objects carry no mode bits at all; synthetic directories only carry [`EntryMode::DIR`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntryMode: u32 {
        /// The entry is a directory.
        const DIR = 1 << 31;
    }
}

/// The kind of an entry.
///
/// Declaration order matters: on equal names a directory sorts before a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    /// A synthetic directory, i.e. a common key prefix.
    Directory,
    /// An object.
    File,
}

/// A file or synthetic directory.
///
/// Built fresh by every listing or `stat` call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    name: String,
    size: u64,
    kind: EntryKind,
    mod_time: SystemTime,
}

impl Entry {
    /// An object entry.
    pub fn file(name: impl Into<String>, size: u64, mod_time: SystemTime) -> Self {
        let name = name.into();
        debug_assert!(!name.contains('/'), "entry name {name:?} contains a separator");
        Self {
            name,
            size,
            kind: EntryKind::File,
            mod_time,
        }
    }

    /// A synthetic directory entry. Its size is 0 and its modification time is the epoch.
    pub fn directory(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(!name.contains('/'), "entry name {name:?} contains a separator");
        Self {
            name,
            size: 0,
            kind: EntryKind::Directory,
            mod_time: SystemTime::UNIX_EPOCH,
        }
    }

    /// Base name of the entry, without any path.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes; always 0 for directories.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether this is a file or a directory.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether this is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Mode bits: [`EntryMode::DIR`] for directories, empty for files.
    #[must_use]
    pub fn mode(&self) -> EntryMode {
        match self.kind {
            EntryKind::Directory => EntryMode::DIR,
            EntryKind::File => EntryMode::empty(),
        }
    }

    /// Last modification time; [`SystemTime::UNIX_EPOCH`] for directories.
    #[must_use]
    pub fn mod_time(&self) -> SystemTime {
        self.mod_time
    }

    /// Listing order: by name, directories first on a tie.
    pub(crate) fn listing_order(a: &Self, b: &Self) -> Ordering {
        a.name.cmp(&b.name).then_with(|| a.kind.cmp(&b.kind))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn directory_has_zero_metadata() {
        let dir = Entry::directory("dir1");
        assert!(dir.is_dir());
        assert_eq!(dir.size(), 0);
        assert_eq!(dir.mode(), EntryMode::DIR);
        assert_eq!(dir.mod_time(), SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn file_has_no_mode_bits() {
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(60);
        let file = Entry::file("a.txt", 7, when);
        assert!(!file.is_dir());
        assert!(file.mode().is_empty());
        assert_eq!(file.mod_time(), when);
    }

    #[test]
    fn directory_sorts_before_file_of_same_name() {
        let mut entries = vec![
            Entry::file("a", 1, SystemTime::UNIX_EPOCH),
            Entry::file("a.txt", 1, SystemTime::UNIX_EPOCH),
            Entry::directory("a"),
        ];
        entries.sort_by(Entry::listing_order);
        let got: Vec<_> = entries.iter().map(|e| (e.name(), e.is_dir())).collect();
        assert_eq!(got, vec![("a", true), ("a", false), ("a.txt", false)]);
    }
}
