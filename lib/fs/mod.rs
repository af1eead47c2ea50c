//! Hierarchical filesystem view over a flat object namespace.

/// The filesystem facade: `open`, `stat`, `read_dir` and friends.
pub mod bucket_fs;
/// Incremental, paginated directory listing.
pub mod dir;
pub mod entry;
pub mod error;
/// Byte-stream handles over single objects.
pub mod file;
pub mod path;

pub use bucket_fs::{BucketFs, Handle};
pub use dir::{Dir, DirChunk};
pub use entry::{Entry, EntryKind, EntryMode};
pub use error::{ErrorKind, FsError, Op};
pub use file::{Anchor, File, SeekableFile, StreamFile};
pub use path::{ROOT, SEPARATOR, is_valid_path};
