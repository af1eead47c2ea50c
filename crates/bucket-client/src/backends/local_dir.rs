//! Object store backed by a local directory tree.
//!
//! Each bucket is a directory directly under the root; each object is a regular file whose
//! path relative to the bucket directory, joined with `/`, is its key. Empty directories hold
//! no keys and are therefore invisible, exactly like in a real object store.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::io::AsyncSeekExt as _;
use tracing::{instrument, trace, warn};

use crate::error::ClientError;
use crate::listing;
use crate::models::{
    GetObjectOutput, GetObjectRequest, ListObjectsOutput, ListObjectsRequest, ObjectMeta,
    ObjectSummary,
};
use crate::object_client::ObjectClient;

/// An [`ObjectClient`] serving buckets out of a local directory.
#[derive(Debug, Clone)]
pub struct LocalDirClient {
    root: PathBuf,
}

impl LocalDirClient {
    /// Serve the buckets found under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding the buckets.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, ClientError> {
        if matches!(bucket, "" | "." | "..") || bucket.contains('/') {
            return Err(ClientError::NoSuchBucket(bucket.to_owned()));
        }
        let dir = self.root.join(bucket);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(ClientError::NoSuchBucket(bucket.to_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ClientError::NoSuchBucket(bucket.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Map a key onto a file path, rejecting keys that would escape the bucket.
    fn object_path(bucket_dir: &Path, key: &str) -> Result<PathBuf, ClientError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && !key.ends_with('/')
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(ClientError::InvalidKey(key.to_owned()));
        }
        Ok(bucket_dir.join(relative))
    }

    async fn meta_of(path: &Path, key: &str) -> Result<ObjectMeta, ClientError> {
        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(ClientError::not_found(key)),
            Err(e) if is_missing(&e) => return Err(ClientError::not_found(key)),
            Err(e) => return Err(e.into()),
        };
        let last_modified = meta.modified().unwrap_or(UNIX_EPOCH);
        Ok(ObjectMeta {
            size: meta.len(),
            last_modified,
            etag: Some(etag_of(last_modified, meta.len())),
        })
    }

    /// Collect every key under `start`, which lives at `key_prefix` within the bucket.
    async fn collect_keys(
        start: PathBuf,
        key_prefix: String,
    ) -> Result<Vec<ObjectSummary>, ClientError> {
        let mut out = Vec::new();
        let mut stack = vec![(start, key_prefix)];
        while let Some((dir, prefix)) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if is_missing(&e) => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
                    warn!(path = ?entry.path(), "skipping non UTF-8 file name");
                    continue;
                };
                let meta = entry.metadata().await?;
                if meta.is_dir() {
                    stack.push((entry.path(), format!("{prefix}{name}/")));
                } else if meta.is_file() {
                    let last_modified = meta.modified().unwrap_or(UNIX_EPOCH);
                    out.push(ObjectSummary {
                        key: format!("{prefix}{name}"),
                        size: meta.len(),
                        last_modified,
                        etag: Some(etag_of(last_modified, meta.len())),
                    });
                }
            }
        }
        out.sort_unstable_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }
}

/// A path through a regular file is missing, not broken.
fn is_missing(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
    )
}

fn etag_of(last_modified: SystemTime, size: u64) -> String {
    let nanos = last_modified
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    format!("\"{nanos:x}-{size:x}\"")
}

impl ObjectClient for LocalDirClient {
    #[instrument(skip(self), fields(root = %self.root.display()), level = "trace")]
    async fn list_objects(
        &self,
        request: ListObjectsRequest,
    ) -> Result<ListObjectsOutput, ClientError> {
        let bucket_dir = self.bucket_dir(&request.bucket).await?;

        // Only the directory holding the prefix's last complete segment can contain matches.
        let dir_part = request.prefix.rfind('/').map_or("", |i| &request.prefix[..=i]);
        let start = if dir_part.is_empty() {
            bucket_dir
        } else {
            match Self::object_path(&bucket_dir, dir_part.trim_end_matches('/')) {
                Ok(path) => path,
                Err(_) => return Ok(ListObjectsOutput::default()),
            }
        };

        let summaries = Self::collect_keys(start, dir_part.to_owned()).await?;
        let out = listing::paginate(summaries, &request);
        trace!(
            objects = out.objects.len(),
            prefixes = out.common_prefixes.len(),
            truncated = out.is_truncated,
            "listed page"
        );
        Ok(out)
    }

    #[instrument(skip(self), fields(root = %self.root.display()), level = "trace")]
    async fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectOutput, ClientError> {
        let bucket_dir = self.bucket_dir(&request.bucket).await?;
        let path = Self::object_path(&bucket_dir, &request.key)?;
        let meta = Self::meta_of(&path, &request.key).await?;

        if let Some(expected) = &request.if_match
            && meta.etag.as_ref() != Some(expected)
        {
            return Err(ClientError::PreconditionFailed { key: request.key });
        }

        let mut file = tokio::fs::File::open(&path).await?;
        if let Some(start) = request.range_start {
            file.seek(SeekFrom::Start(start.min(meta.size))).await?;
        }

        Ok(GetObjectOutput {
            body: Box::pin(file),
            content_length: Some(meta.size),
            last_modified: Some(meta.last_modified),
            etag: meta.etag,
        })
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta, ClientError> {
        let bucket_dir = self.bucket_dir(bucket).await?;
        let path = Self::object_path(&bucket_dir, key)?;
        Self::meta_of(&path, key).await
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), ClientError> {
        let bucket_dir = self.bucket_dir(bucket).await?;
        let path = Self::object_path(&bucket_dir, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &body).await?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ClientError> {
        let bucket_dir = self.bucket_dir(bucket).await?;
        let path = Self::object_path(&bucket_dir, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
