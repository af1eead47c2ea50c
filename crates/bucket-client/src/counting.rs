//! Call-counting decorator around any [`ObjectClient`].

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

use crate::error::ClientError;
use crate::models::{
    GetObjectOutput, GetObjectRequest, ListObjectsOutput, ListObjectsRequest, ObjectMeta,
};
use crate::object_client::ObjectClient;

/// A snapshot of how many calls a [`CountingClient`] has forwarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `list_objects` calls.
    pub list: u64,
    /// `get_object` calls.
    pub get: u64,
    /// `head_object` calls.
    pub head: u64,
    /// `put_object` calls.
    pub put: u64,
    /// `delete_object` calls.
    pub delete: u64,
}

impl CallCounts {
    /// Total number of calls of any kind.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.list + self.get + self.head + self.put + self.delete
    }
}

/// Wraps an [`ObjectClient`] and counts every call it forwards.
///
/// Counters belong to the instance, so independent test cases never observe each other.
#[derive(Debug, Default)]
pub struct CountingClient<C> {
    inner: C,
    list: AtomicU64,
    get: AtomicU64,
    head: AtomicU64,
    put: AtomicU64,
    delete: AtomicU64,
}

impl<C> CountingClient<C> {
    /// Start counting calls made to `inner`.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            list: AtomicU64::new(0),
            get: AtomicU64::new(0),
            head: AtomicU64::new(0),
            put: AtomicU64::new(0),
            delete: AtomicU64::new(0),
        }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Current call counts.
    pub fn counts(&self) -> CallCounts {
        CallCounts {
            list: self.list.load(Ordering::Relaxed),
            get: self.get.load(Ordering::Relaxed),
            head: self.head.load(Ordering::Relaxed),
            put: self.put.load(Ordering::Relaxed),
            delete: self.delete.load(Ordering::Relaxed),
        }
    }
}

impl<C: ObjectClient> ObjectClient for CountingClient<C> {
    async fn list_objects(
        &self,
        request: ListObjectsRequest,
    ) -> Result<ListObjectsOutput, ClientError> {
        self.list.fetch_add(1, Ordering::Relaxed);
        self.inner.list_objects(request).await
    }

    async fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectOutput, ClientError> {
        self.get.fetch_add(1, Ordering::Relaxed);
        self.inner.get_object(request).await
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta, ClientError> {
        self.head.fetch_add(1, Ordering::Relaxed);
        self.inner.head_object(bucket, key).await
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), ClientError> {
        self.put.fetch_add(1, Ordering::Relaxed);
        self.inner.put_object(bucket, key, body).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ClientError> {
        self.delete.fetch_add(1, Ordering::Relaxed);
        self.inner.delete_object(bucket, key).await
    }
}
