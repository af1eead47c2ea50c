//! bucket-fs shared library.
//!
//! Presents an object-storage bucket as a read-only directory tree. Keys containing `/` are
//! split into synthetic directories; everything else is a file.

/// Filesystem view over a bucket.
pub mod fs;

pub use bucket_client as client;
