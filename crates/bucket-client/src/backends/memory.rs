//! In-memory object store, used by tests and emulator-free runs.

use std::collections::BTreeMap;
use std::hash::Hasher as _;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use bytes::Bytes;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};
use tracing::{instrument, trace};

use crate::error::ClientError;
use crate::listing;
use crate::models::{
    GetObjectOutput, GetObjectRequest, ListObjectsOutput, ListObjectsRequest, ObjectMeta,
    ObjectSummary,
};
use crate::object_client::ObjectClient;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: SystemTime,
    etag: String,
}

impl StoredObject {
    fn meta(&self) -> ObjectMeta {
        ObjectMeta {
            size: self.data.len() as u64,
            last_modified: self.last_modified,
            etag: Some(self.etag.clone()),
        }
    }
}

/// An [`ObjectClient`] that keeps every bucket in process memory.
///
/// Buckets must be created with [`MemoryClient::create_bucket`] before use. Each `put` gets a
/// fresh entity tag, so conditional reads observe overwrites even when the bytes are identical.
#[derive(Debug, Default)]
pub struct MemoryClient {
    buckets: RwLock<FxHashMap<String, BTreeMap<String, StoredObject>>>,
    generation: AtomicU64,
}

impl MemoryClient {
    /// Create an empty store with no buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bucket. Creating an existing bucket keeps its contents.
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.write().entry(bucket.to_owned()).or_default();
    }

    /// Store `data` under `key`, creating the bucket if needed.
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        let data = data.into();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let mut hasher = FxHasher::default();
        hasher.write(&data);
        hasher.write_u64(generation);
        let object = StoredObject {
            data,
            last_modified: SystemTime::now(),
            etag: format!("\"{:016x}\"", hasher.finish()),
        };
        self.buckets
            .write()
            .entry(bucket.to_owned())
            .or_default()
            .insert(key.to_owned(), object);
    }

    fn object(&self, bucket: &str, key: &str) -> Result<StoredObject, ClientError> {
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| ClientError::NoSuchBucket(bucket.to_owned()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| ClientError::not_found(key))
    }
}

impl ObjectClient for MemoryClient {
    #[instrument(skip(self), level = "trace")]
    async fn list_objects(
        &self,
        request: ListObjectsRequest,
    ) -> Result<ListObjectsOutput, ClientError> {
        let buckets = self.buckets.read();
        let objects = buckets
            .get(&request.bucket)
            .ok_or_else(|| ClientError::NoSuchBucket(request.bucket.clone()))?;

        let summaries = objects
            .range(request.prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&request.prefix))
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: object.data.len() as u64,
                last_modified: object.last_modified,
                etag: Some(object.etag.clone()),
            });

        let out = listing::paginate(summaries, &request);
        trace!(
            objects = out.objects.len(),
            prefixes = out.common_prefixes.len(),
            truncated = out.is_truncated,
            "listed page"
        );
        Ok(out)
    }

    #[instrument(skip(self), level = "trace")]
    async fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectOutput, ClientError> {
        let object = self.object(&request.bucket, &request.key)?;

        if let Some(expected) = &request.if_match
            && *expected != object.etag
        {
            return Err(ClientError::PreconditionFailed { key: request.key });
        }

        let len = object.data.len();
        let start = request
            .range_start
            .map_or(0, |s| usize::try_from(s).unwrap_or(len).min(len));
        let body = Cursor::new(object.data.slice(start..));

        Ok(GetObjectOutput {
            body: Box::pin(body),
            content_length: Some(len as u64),
            last_modified: Some(object.last_modified),
            etag: Some(object.etag),
        })
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta, ClientError> {
        self.object(bucket, key).map(|object| object.meta())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), ClientError> {
        if !self.buckets.read().contains_key(bucket) {
            return Err(ClientError::NoSuchBucket(bucket.to_owned()));
        }
        self.insert(bucket, key, body);
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ClientError> {
        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| ClientError::NoSuchBucket(bucket.to_owned()))?;
        objects.remove(key);
        Ok(())
    }
}
