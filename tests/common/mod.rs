#![allow(dead_code, missing_docs, clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use bucket_fs::client::{
    ClientError, GetObjectOutput, GetObjectRequest, ListObjectsOutput, ListObjectsRequest,
    MemoryClient, ObjectClient, ObjectMeta, ObjectSummary,
};
use bytes::Bytes;

pub const BUCKET: &str = "test-bucket";
pub const CONTENT: &[u8] = b"content";

/// Every key of the shared fixture tree; each object holds [`CONTENT`].
pub const ALL_FILES: [&str; 13] = [
    "file.txt",
    "dir/a.txt",
    "dir1/file1.txt",
    "dir1/file2.txt",
    "dir1/dir11/file.txt",
    "dir2/file1.txt",
    "x/file1.txt",
    "y.txt",
    "y2.txt",
    "y3.txt",
    "z/z/file1.txt",
    "a.txt",
    "a/b.txt",
];

/// A memory store holding [`ALL_FILES`] in [`BUCKET`].
pub fn fixture_client() -> MemoryClient {
    let client = MemoryClient::new();
    for key in ALL_FILES {
        client.insert(BUCKET, key, Bytes::from_static(CONTENT));
    }
    client
}

/// A root-level listing page: `dirs` become common prefixes, `files` become objects.
pub fn page(dirs: &[&str], files: &[&str]) -> ListObjectsOutput {
    ListObjectsOutput {
        objects: files
            .iter()
            .map(|name| ObjectSummary {
                key: (*name).to_owned(),
                size: 1,
                last_modified: SystemTime::UNIX_EPOCH,
                etag: None,
            })
            .collect(),
        common_prefixes: dirs.iter().map(|d| format!("{d}/")).collect(),
        next_cursor: None,
        is_truncated: false,
    }
}

/// Serves a fixed sequence of listing pages, ignoring the request prefix.
///
/// The cursor handed out is the index of the next page. Object fetches always miss.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    pages: Vec<ListObjectsOutput>,
    fail_at: Mutex<Option<usize>>,
    pub requests: Mutex<Vec<ListObjectsRequest>>,
    exhausted_read: AtomicBool,
}

impl ScriptedClient {
    pub fn new(pages: Vec<ListObjectsOutput>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// The next request for page `index` fails once.
    pub fn fail_once_at(self, index: usize) -> Self {
        *self.fail_at.lock().unwrap() = Some(index);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Whether a page was requested after the last one had been served.
    pub fn read_past_end(&self) -> bool {
        self.exhausted_read.load(Ordering::Relaxed)
    }
}

impl ObjectClient for ScriptedClient {
    async fn list_objects(
        &self,
        request: ListObjectsRequest,
    ) -> Result<ListObjectsOutput, ClientError> {
        let index = request
            .cursor
            .as_deref()
            .map_or(0, |c| c.parse::<usize>().unwrap());
        self.requests.lock().unwrap().push(request);

        {
            let mut fail_at = self.fail_at.lock().unwrap();
            if *fail_at == Some(index) {
                *fail_at = None;
                return Err(ClientError::Other("scripted failure".into()));
            }
        }

        let Some(page) = self.pages.get(index) else {
            self.exhausted_read.store(true, Ordering::Relaxed);
            return Ok(ListObjectsOutput::default());
        };
        let mut page = page.clone();
        if index + 1 < self.pages.len() {
            page.is_truncated = true;
            page.next_cursor = Some((index + 1).to_string());
        }
        Ok(page)
    }

    async fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectOutput, ClientError> {
        Err(ClientError::not_found(request.key))
    }

    async fn head_object(&self, _bucket: &str, key: &str) -> Result<ObjectMeta, ClientError> {
        Err(ClientError::not_found(key))
    }

    async fn put_object(&self, _bucket: &str, _key: &str, _body: Bytes) -> Result<(), ClientError> {
        Ok(())
    }

    async fn delete_object(&self, _bucket: &str, _key: &str) -> Result<(), ClientError> {
        Ok(())
    }
}
