//! Errors reported by the filesystem facade and its handles.

use std::fmt;

use bucket_client::ClientError;
use thiserror::Error;

/// The operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Opening a file or directory.
    Open,
    /// Resolving metadata.
    Stat,
    /// Listing a directory.
    ReadDir,
    /// Reading file bytes.
    Read,
    /// Repositioning a file handle.
    Seek,
    /// Re-rooting the facade at a subdirectory.
    Sub,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Stat => "stat",
            Self::ReadDir => "readdir",
            Self::Read => "read",
            Self::Seek => "seek",
            Self::Sub => "sub",
        })
    }
}

/// Why an operation failed.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The path is structurally malformed.
    #[error("invalid path")]
    InvalidPath,

    /// Neither an object nor a synthetic directory exists at the path, or the object changed
    /// underneath an open handle.
    #[error("file does not exist")]
    NotExist,

    /// A listing was requested for a file.
    #[error("not a directory")]
    NotADirectory,

    /// File bytes were requested from a directory.
    #[error("is a directory")]
    IsADirectory,

    /// A seek or whence argument was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Reading the object's byte stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object store reported an error; passed through unchanged.
    #[error(transparent)]
    Client(ClientError),
}

impl From<ClientError> for ErrorKind {
    fn from(e: ClientError) -> Self {
        if e.is_not_found() {
            Self::NotExist
        } else {
            Self::Client(e)
        }
    }
}

/// An error carrying the failed operation and the path it was applied to.
#[derive(Debug, Error)]
#[error("{op} {path}: {kind}")]
pub struct FsError {
    /// The failed operation.
    pub op: Op,
    /// The caller-facing path.
    pub path: String,
    /// What went wrong.
    #[source]
    pub kind: ErrorKind,
}

impl FsError {
    pub(crate) fn new(op: Op, path: impl Into<String>, kind: impl Into<ErrorKind>) -> Self {
        Self {
            op,
            path: path.into(),
            kind: kind.into(),
        }
    }

    /// Whether the path named neither an object nor a directory.
    #[must_use]
    pub fn is_not_exist(&self) -> bool {
        matches!(self.kind, ErrorKind::NotExist)
    }

    /// Whether the path was rejected before any request.
    #[must_use]
    pub fn is_invalid_path(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidPath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_op_and_path() {
        let err = FsError::new(Op::ReadDir, "dir1/notexist", ErrorKind::NotExist);
        assert_eq!(err.to_string(), "readdir dir1/notexist: file does not exist");
    }

    #[test]
    fn client_not_found_becomes_not_exist() {
        let kind: ErrorKind = ClientError::not_found("k").into();
        assert!(matches!(kind, ErrorKind::NotExist));
    }

    #[test]
    fn other_client_errors_pass_through() {
        let kind: ErrorKind = ClientError::NoSuchBucket("b".to_owned()).into();
        assert!(matches!(kind, ErrorKind::Client(ClientError::NoSuchBucket(_))));
    }
}
