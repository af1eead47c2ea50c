//! Path syntax accepted by the facade.
//!
//! Paths are relative, `/`-separated, and never end with a separator. The bucket root is
//! spelled [`ROOT`].

/// The path naming the root directory.
pub const ROOT: &str = ".";

/// The key separator used to emulate directories.
pub const SEPARATOR: char = '/';

/// Whether `path` is acceptable to the facade.
///
/// `"."` is valid only on its own. Otherwise every element must be non-empty and must not be
/// `"."` or `".."`, which also rules out leading, trailing and doubled separators.
#[must_use]
pub fn is_valid_path(path: &str) -> bool {
    if path == ROOT {
        return true;
    }
    !path.is_empty()
        && path
            .split(SEPARATOR)
            .all(|elem| !matches!(elem, "" | "." | ".."))
}

/// Last element of a key or common prefix, ignoring a trailing separator.
pub(crate) fn base_name(key: &str) -> &str {
    let trimmed = key.strip_suffix(SEPARATOR).unwrap_or(key);
    trimmed
        .rsplit_once(SEPARATOR)
        .map_or(trimmed, |(_, base)| base)
}

/// Join a child name onto a facade path.
pub(crate) fn join(parent: &str, name: &str) -> String {
    if parent == ROOT {
        name.to_owned()
    } else {
        format!("{parent}{SEPARATOR}{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_relative_paths() {
        for path in [".", "a", "a.txt", "dir1/dir11/file.txt", "x/.hidden"] {
            assert!(is_valid_path(path), "{path:?} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_paths() {
        for path in ["", "/", "/a", "a/", "a//b", "./a", "a/.", "a/../b", "..", "a/./b"] {
            assert!(!is_valid_path(path), "{path:?} should be invalid");
        }
    }

    #[test]
    fn base_name_strips_directories_and_trailing_separator() {
        assert_eq!(base_name("a/b/c.txt"), "c.txt");
        assert_eq!(base_name("dir1/dir11/"), "dir11");
        assert_eq!(base_name("top"), "top");
    }

    #[test]
    fn join_from_root_has_no_dot() {
        assert_eq!(join(".", "a"), "a");
        assert_eq!(join("a/b", "c"), "a/b/c");
    }
}
