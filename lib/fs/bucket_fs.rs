use std::sync::Arc;

use bucket_client::{GetObjectRequest, ListObjectsRequest, ObjectClient};
use tracing::{debug, instrument};

use super::dir::Dir;
use super::entry::Entry;
use super::error::{ErrorKind, FsError, Op};
use super::file::{File, StreamFile};
use super::path::{ROOT, SEPARATOR, base_name, is_valid_path, join};

/// The result of [`BucketFs::open`].
#[derive(Debug)]
pub enum Handle<C> {
    /// The path named an object.
    File(File<C>),
    /// The path named the root or a synthetic directory.
    Dir(Dir<C>),
}

impl<C: ObjectClient> Handle<C> {
    /// Metadata of the opened file or directory.
    pub async fn stat(&self) -> Result<Entry, FsError> {
        match self {
            Self::File(f) => f.stat().await,
            Self::Dir(d) => Ok(d.entry().clone()),
        }
    }

    /// Whether the path opened as a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Dir(_))
    }

    /// The file handle, if the path named an object.
    #[must_use]
    pub fn into_file(self) -> Option<File<C>> {
        match self {
            Self::File(f) => Some(f),
            Self::Dir(_) => None,
        }
    }

    /// The directory enumerator, if the path named a directory.
    #[must_use]
    pub fn into_dir(self) -> Option<Dir<C>> {
        match self {
            Self::File(_) => None,
            Self::Dir(d) => Some(d),
        }
    }
}

/// A read-only directory tree over one bucket.
///
/// Keys are split on `/`: the leading segments of a key are synthetic directories and the
/// last is a file. Nothing is cached; every call goes to the client.
pub struct BucketFs<C> {
    client: Arc<C>,
    bucket: Arc<str>,
    /// Key prefix of the root directory: empty, or ending with `/`.
    root: Arc<str>,
    root_name: Arc<str>,
    seekable: bool,
    page_size: Option<u32>,
}

impl<C> Clone for BucketFs<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            bucket: Arc::clone(&self.bucket),
            root: Arc::clone(&self.root),
            root_name: Arc::clone(&self.root_name),
            seekable: self.seekable,
            page_size: self.page_size,
        }
    }
}

impl<C> std::fmt::Debug for BucketFs<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketFs")
            .field("bucket", &self.bucket)
            .field("root", &self.root)
            .field("seekable", &self.seekable)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl<C: ObjectClient> BucketFs<C> {
    /// A filesystem whose files only support forward reads.
    pub fn new(client: impl Into<Arc<C>>, bucket: impl Into<String>) -> Self {
        let bucket: String = bucket.into();
        Self {
            client: client.into(),
            bucket: Arc::from(bucket),
            root: Arc::from(""),
            root_name: Arc::from(ROOT),
            seekable: false,
            page_size: None,
        }
    }

    /// A filesystem whose files are opened as [`File::Seekable`].
    pub fn new_seekable(client: impl Into<Arc<C>>, bucket: impl Into<String>) -> Self {
        Self {
            seekable: true,
            ..Self::new(client, bucket)
        }
    }

    /// Cap the number of keys requested per listing page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Name of the bucket being browsed.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The object store client.
    #[must_use]
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Whether files open as [`File::Seekable`].
    #[must_use]
    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    fn key(&self, path: &str) -> String {
        format!("{}{path}", self.root)
    }

    fn root_entry(&self) -> Entry {
        Entry::directory(&*self.root_name)
    }

    fn validate(op: Op, path: &str) -> Result<(), FsError> {
        if is_valid_path(path) {
            Ok(())
        } else {
            Err(FsError::new(op, path, ErrorKind::InvalidPath))
        }
    }

    /// An enumerator for a path already known to be a directory.
    fn dir(&self, path: &str) -> Dir<C> {
        let (prefix, entry, is_root) = if path == ROOT {
            (self.root.to_string(), self.root_entry(), true)
        } else {
            (
                format!("{}{SEPARATOR}", self.key(path)),
                Entry::directory(base_name(path)),
                false,
            )
        };
        Dir::new(
            Arc::clone(&self.client),
            Arc::clone(&self.bucket),
            prefix,
            path.to_owned(),
            entry,
            is_root,
            self.page_size,
        )
    }

    /// Whether at least one key lives under `key/`.
    async fn probe_dir(&self, op: Op, path: &str, key: &str) -> Result<bool, FsError> {
        let request = ListObjectsRequest {
            bucket: self.bucket.to_string(),
            prefix: format!("{key}{SEPARATOR}"),
            delimiter: Some(SEPARATOR.to_string()),
            cursor: None,
            max_keys: Some(1),
        };
        let page = self
            .client
            .list_objects(request)
            .await
            .map_err(|e| FsError::new(op, path, ErrorKind::Client(e)))?;
        let found = !page.objects.is_empty() || !page.common_prefixes.is_empty();
        debug!(key, found, "directory probe");
        Ok(found)
    }

    /// Open a file or directory.
    ///
    /// The object is fetched first; only if it does not exist is the path tried as a
    /// directory.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn open(&self, path: &str) -> Result<Handle<C>, FsError> {
        Self::validate(Op::Open, path)?;
        if path == ROOT {
            return Ok(Handle::Dir(self.dir(path)));
        }

        let key = self.key(path);
        match self
            .client
            .get_object(GetObjectRequest::new(&*self.bucket, key.as_str()))
            .await
        {
            Ok(output) => {
                let stream = StreamFile::new(
                    Arc::clone(&self.client),
                    Arc::clone(&self.bucket),
                    key,
                    path.to_owned(),
                    output,
                );
                Ok(Handle::File(File::new(stream, self.seekable)))
            }
            Err(e) if e.is_not_found() => {
                if self.probe_dir(Op::Open, path, &key).await? {
                    Ok(Handle::Dir(self.dir(path)))
                } else {
                    Err(FsError::new(Op::Open, path, ErrorKind::NotExist))
                }
            }
            Err(e) => Err(FsError::new(Op::Open, path, ErrorKind::Client(e))),
        }
    }

    /// Metadata for a file or directory.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn stat(&self, path: &str) -> Result<Entry, FsError> {
        Self::validate(Op::Stat, path)?;
        if path == ROOT {
            return Ok(self.root_entry());
        }

        let key = self.key(path);
        match self.client.head_object(&self.bucket, &key).await {
            Ok(meta) => Ok(Entry::file(base_name(path), meta.size, meta.last_modified)),
            Err(e) if e.is_not_found() => {
                if self.probe_dir(Op::Stat, path, &key).await? {
                    Ok(Entry::directory(base_name(path)))
                } else {
                    Err(FsError::new(Op::Stat, path, ErrorKind::NotExist))
                }
            }
            Err(e) => Err(FsError::new(Op::Stat, path, ErrorKind::Client(e))),
        }
    }

    /// All entries of a directory, sorted by name with directories first on a tie.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn read_dir(&self, path: &str) -> Result<Vec<Entry>, FsError> {
        Self::validate(Op::ReadDir, path)?;
        if path != ROOT {
            let entry = self
                .stat(path)
                .await
                .map_err(|e| FsError { op: Op::ReadDir, ..e })?;
            if !entry.is_dir() {
                return Err(FsError::new(Op::ReadDir, path, ErrorKind::NotADirectory));
            }
        }
        self.dir(path).read_all().await
    }

    /// The whole content of a file.
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        match self.open(path).await? {
            Handle::File(mut file) => file.read_to_end().await,
            Handle::Dir(_) => Err(FsError::new(Op::Read, path, ErrorKind::IsADirectory)),
        }
    }

    /// A filesystem rooted at the directory `dir`.
    ///
    /// The new root is named after the last element of `dir`.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn sub(&self, dir: &str) -> Result<Self, FsError> {
        Self::validate(Op::Sub, dir)?;
        if dir == ROOT {
            return Ok(self.clone());
        }
        let entry = self
            .stat(dir)
            .await
            .map_err(|e| FsError { op: Op::Sub, ..e })?;
        if !entry.is_dir() {
            return Err(FsError::new(Op::Sub, dir, ErrorKind::NotADirectory));
        }
        Ok(Self {
            root: Arc::from(format!("{}{SEPARATOR}", self.key(dir))),
            root_name: Arc::from(entry.name()),
            ..self.clone()
        })
    }

    /// Every entry at and below `path`, depth first, parents before children and siblings in
    /// listing order. Paths are relative to this filesystem's root.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn walk(&self, path: &str) -> Result<Vec<(String, Entry)>, FsError> {
        let top = self.stat(path).await?;
        let mut out = Vec::new();
        let mut stack = vec![(path.to_owned(), top)];
        while let Some((p, entry)) = stack.pop() {
            if entry.is_dir() {
                let children = self.dir(&p).read_all().await?;
                stack.extend(
                    children
                        .into_iter()
                        .rev()
                        .map(|child| (join(&p, child.name()), child)),
                );
            }
            out.push((p, entry));
        }
        Ok(out)
    }
}
