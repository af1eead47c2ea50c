//! Request and response types for [`ObjectClient`](crate::ObjectClient) calls.

use std::fmt;
use std::time::SystemTime;

use crate::object_client::ByteStream;

/// Parameters of one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsRequest {
    /// Bucket to list.
    pub bucket: String,
    /// Only keys starting with this prefix are returned.
    pub prefix: String,
    /// Keys containing the delimiter after the prefix are rolled up into common prefixes.
    pub delimiter: Option<String>,
    /// Continuation cursor returned by the previous page.
    pub cursor: Option<String>,
    /// Maximum number of keys plus common prefixes in this page.
    pub max_keys: Option<u32>,
}

/// A single object as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Full object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: SystemTime,
    /// Entity tag, if the store reports one in listings.
    pub etag: Option<String>,
}

/// One page of listing results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsOutput {
    /// Objects directly matched by the request.
    pub objects: Vec<ObjectSummary>,
    /// Rolled-up prefixes, each ending with the delimiter.
    pub common_prefixes: Vec<String>,
    /// Cursor for the next page, if any.
    pub next_cursor: Option<String>,
    /// Whether more pages are available.
    pub is_truncated: bool,
}

/// Parameters of an object fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetObjectRequest {
    /// Bucket holding the object.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Fetch bytes starting at this offset through the end of the object.
    pub range_start: Option<u64>,
    /// Only succeed if the object's entity tag matches.
    pub if_match: Option<String>,
}

impl GetObjectRequest {
    /// A plain fetch of the whole object.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            ..Self::default()
        }
    }
}

/// The result of an object fetch.
pub struct GetObjectOutput {
    /// The object bytes, starting at the requested range.
    pub body: ByteStream,
    /// Total object size in bytes, when reported.
    pub content_length: Option<u64>,
    /// Last modification time, when reported.
    pub last_modified: Option<SystemTime>,
    /// Entity tag, when reported.
    pub etag: Option<String>,
}

impl fmt::Debug for GetObjectOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetObjectOutput")
            .field("content_length", &self.content_length)
            .field("last_modified", &self.last_modified)
            .field("etag", &self.etag)
            .finish_non_exhaustive()
    }
}

/// Object metadata returned by a head request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: SystemTime,
    /// Entity tag, when reported.
    pub etag: Option<String>,
}
