//! Object-store client abstraction for pluggable backends.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::error::ClientError;
use crate::models::{
    GetObjectOutput, GetObjectRequest, ListObjectsOutput, ListObjectsRequest, ObjectMeta,
};

/// The byte stream of a fetched object.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Trait for pluggable object-store backends.
///
/// Uses native `impl Future` in traits, so implementors can write plain `async fn`s.
/// Retries, timeouts and authentication are the implementor's business.
pub trait ObjectClient: Send + Sync {
    /// Fetch one page of a (possibly delimited) listing.
    fn list_objects(
        &self,
        request: ListObjectsRequest,
    ) -> impl Future<Output = Result<ListObjectsOutput, ClientError>> + Send;

    /// Fetch an object's bytes, optionally from an offset and conditioned on an entity tag.
    fn get_object(
        &self,
        request: GetObjectRequest,
    ) -> impl Future<Output = Result<GetObjectOutput, ClientError>> + Send;

    /// Fetch an object's metadata without its bytes.
    fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<ObjectMeta, ClientError>> + Send;

    /// Store an object, replacing any previous version.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Remove an object. Removing a missing key is not an error.
    fn delete_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}
