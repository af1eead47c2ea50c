use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use bucket_client::{ListObjectsOutput, ListObjectsRequest, ObjectClient};
use tracing::{instrument, trace, warn};

use super::entry::Entry;
use super::error::{ErrorKind, FsError, Op};
use super::path::SEPARATOR;

/// One batch returned by [`Dir::read`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirChunk {
    /// Entries in listing order.
    pub entries: Vec<Entry>,
    /// No entries remain after this batch.
    pub eof: bool,
}

/// Listing position and the entries fetched but not yet returned.
///
/// Listing pages arrive in raw key order, which is not entry-name order: the object `a.txt`
/// sorts before the common prefix `a/`, yet the directory `a` must be returned first. Entries
/// are therefore held back until no later page can produce a smaller name.
#[derive(Debug, Default)]
struct Cursor {
    next: Option<String>,
    started: bool,
    exhausted: bool,
    /// Released entries, sorted, waiting to be handed out.
    ready: VecDeque<Entry>,
    pending_dirs: BTreeSet<String>,
    pending_objects: Vec<Entry>,
    /// Directory names already moved to `ready`; repeated prefixes are dropped.
    released_dirs: HashSet<String>,
    /// Largest prefix-relative object key seen so far. Common prefixes carry no ordering
    /// guarantee across pages and never raise it.
    high_water: Option<String>,
}

impl Cursor {
    fn raise_high_water(&mut self, raw: &str) {
        if self.high_water.as_deref().is_none_or(|hw| raw > hw) {
            self.high_water = Some(raw.to_owned());
        }
    }

    /// Every name a later page can produce is at least this bound.
    ///
    /// Later raw keys are greater than the high-water mark `H`. Stripping the trailing
    /// separator of a later common prefix can only make its name smaller than `H` where `H`
    /// holds a byte below the separator, so the bound is `H` cut before its first such byte.
    fn safe_bound(&self) -> Option<&str> {
        let hw = self.high_water.as_deref()?;
        let cut = hw
            .bytes()
            .position(|b| b < SEPARATOR as u8)
            .unwrap_or(hw.len());
        Some(&hw[..cut])
    }

    /// Move every pending entry whose name is below the safe bound (or everything once the
    /// listing is exhausted) into `ready`, keeping `ready` sorted.
    fn release(&mut self) {
        let (dirs, objects) = if self.exhausted {
            (
                std::mem::take(&mut self.pending_dirs),
                std::mem::take(&mut self.pending_objects),
            )
        } else {
            let Some(bound) = self.safe_bound().map(str::to_owned) else {
                return;
            };
            let keep_dirs = self.pending_dirs.split_off(bound.as_str());
            let dirs = std::mem::replace(&mut self.pending_dirs, keep_dirs);
            let (objects, keep_objects): (Vec<Entry>, Vec<Entry>) =
                std::mem::take(&mut self.pending_objects)
                    .into_iter()
                    .partition(|e| e.name() < bound.as_str());
            self.pending_objects = keep_objects;
            (dirs, objects)
        };

        if dirs.is_empty() && objects.is_empty() {
            return;
        }
        trace!(
            dirs = dirs.len(),
            objects = objects.len(),
            "releasing listing entries"
        );

        for name in dirs {
            self.released_dirs.insert(name.clone());
            self.ready.push_back(Entry::directory(name));
        }
        self.ready.extend(objects);
        self.ready.make_contiguous().sort_by(Entry::listing_order);
    }
}

/// An open directory: an incremental listing of one key prefix.
///
/// Each page is one `list_objects` call with `/` as the delimiter. Objects directly under
/// the prefix become files, common prefixes become directories, and the two are merged into
/// a single sorted sequence without duplicates.
pub struct Dir<C> {
    client: Arc<C>,
    bucket: Arc<str>,
    /// Key prefix being listed: empty at the bucket root, otherwise ends with `/`.
    prefix: String,
    path: String,
    entry: Entry,
    is_root: bool,
    page_size: Option<u32>,
    cursor: Cursor,
}

impl<C> std::fmt::Debug for Dir<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dir")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("path", &self.path)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl<C: ObjectClient> Dir<C> {
    pub(crate) fn new(
        client: Arc<C>,
        bucket: Arc<str>,
        prefix: String,
        path: String,
        entry: Entry,
        is_root: bool,
        page_size: Option<u32>,
    ) -> Self {
        debug_assert!(prefix.is_empty() || prefix.ends_with(SEPARATOR));
        Self {
            client,
            bucket,
            prefix,
            path,
            entry,
            is_root,
            page_size,
            cursor: Cursor::default(),
        }
    }

    /// The directory's own entry.
    #[must_use]
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// The path this directory was opened with.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Return up to `n` entries in listing order; `n == 0` drains the whole directory.
    ///
    /// Pages are fetched only as needed. Once the listing is exhausted and nothing is left
    /// buffered the returned chunk has `eof` set; this may accompany the final entries. A
    /// failed page leaves already-buffered entries in place, so the call may be retried.
    #[instrument(skip(self), fields(bucket = %self.bucket, prefix = %self.prefix))]
    pub async fn read(&mut self, n: usize) -> Result<DirChunk, FsError> {
        while !self.cursor.exhausted && (n == 0 || self.cursor.ready.len() < n) {
            self.advance_one_page().await?;
        }

        let take = if n == 0 {
            self.cursor.ready.len()
        } else {
            n.min(self.cursor.ready.len())
        };
        let entries: Vec<Entry> = self.cursor.ready.drain(..take).collect();
        let eof = self.cursor.exhausted && self.cursor.ready.is_empty();
        Ok(DirChunk { entries, eof })
    }

    /// Drain every remaining entry.
    pub async fn read_all(&mut self) -> Result<Vec<Entry>, FsError> {
        Ok(self.read(0).await?.entries)
    }

    async fn advance_one_page(&mut self) -> Result<(), FsError> {
        let request = ListObjectsRequest {
            bucket: self.bucket.to_string(),
            prefix: self.prefix.clone(),
            delimiter: Some(SEPARATOR.to_string()),
            cursor: self.cursor.next.clone(),
            max_keys: self.page_size,
        };
        trace!(cursor = ?request.cursor, "listing page");
        let page = self
            .client
            .list_objects(request)
            .await
            .map_err(|e| FsError::new(Op::ReadDir, &*self.path, ErrorKind::Client(e)))?;

        let first = !self.cursor.started;
        if first
            && !self.is_root
            && page.objects.is_empty()
            && page.common_prefixes.is_empty()
        {
            return Err(FsError::new(Op::ReadDir, &*self.path, ErrorKind::NotExist));
        }
        self.absorb(page);
        Ok(())
    }

    fn absorb(&mut self, page: ListObjectsOutput) {
        let ListObjectsOutput {
            objects,
            common_prefixes,
            next_cursor,
            is_truncated,
        } = page;

        for object in objects {
            let Some(rel) = object.key.strip_prefix(self.prefix.as_str()) else {
                warn!(key = %object.key, "listing returned a key outside the prefix");
                continue;
            };
            if rel.is_empty() {
                // Directory marker.
                continue;
            }
            if rel.contains(SEPARATOR) {
                warn!(key = %object.key, "listing returned an undelimited key");
                continue;
            }
            self.cursor.raise_high_water(rel);
            self.cursor
                .pending_objects
                .push(Entry::file(rel, object.size, object.last_modified));
        }

        for common in common_prefixes {
            let Some(rel) = common.strip_prefix(self.prefix.as_str()) else {
                warn!(prefix = %common, "listing returned a common prefix outside the prefix");
                continue;
            };
            let name = rel.strip_suffix(SEPARATOR).unwrap_or(rel);
            if name.is_empty() || name.contains(SEPARATOR) {
                warn!(prefix = %common, "ignoring malformed common prefix");
                continue;
            }
            if !self.cursor.released_dirs.contains(name) {
                self.cursor.pending_dirs.insert(name.to_owned());
            }
        }

        self.cursor.started = true;
        self.cursor.exhausted = !is_truncated || next_cursor.is_none();
        self.cursor.next = next_cursor;
        self.cursor.release();
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn file(name: &str) -> Entry {
        Entry::file(name, 1, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn bound_cuts_before_first_byte_below_separator() {
        let mut cursor = Cursor::default();
        assert_eq!(cursor.safe_bound(), None);
        cursor.raise_high_water("a.txt");
        assert_eq!(cursor.safe_bound(), Some("a"));
        cursor.raise_high_water("b");
        assert_eq!(cursor.safe_bound(), Some("b"));
        cursor.raise_high_water("Z");
        assert_eq!(cursor.safe_bound(), Some("b"));
    }

    #[test]
    fn file_before_prefix_waits_for_directory() {
        let mut cursor = Cursor::default();
        cursor.pending_objects.push(file("a.txt"));
        cursor.raise_high_water("a.txt");
        cursor.release();
        assert!(cursor.ready.is_empty());

        cursor.pending_dirs.insert("a".to_owned());
        cursor.release();
        assert!(cursor.ready.is_empty());

        cursor.pending_objects.push(file("b"));
        cursor.raise_high_water("b");
        cursor.release();
        let names: Vec<_> = cursor.ready.iter().map(|e| e.name().to_owned()).collect();
        assert_eq!(names, vec!["a", "a.txt"]);
    }

    #[test]
    fn exhaustion_releases_everything() {
        let mut cursor = Cursor::default();
        cursor.pending_dirs.insert("z".to_owned());
        cursor.pending_objects.push(file("y"));
        cursor.exhausted = true;
        cursor.release();
        let names: Vec<_> = cursor.ready.iter().map(|e| e.name().to_owned()).collect();
        assert_eq!(names, vec!["y", "z"]);
        assert!(cursor.released_dirs.contains("z"));
    }
}
