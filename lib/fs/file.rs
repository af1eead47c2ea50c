use std::sync::Arc;

use bucket_client::{ByteStream, GetObjectOutput, GetObjectRequest, ObjectClient};
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use super::entry::Entry;
use super::error::{ErrorKind, FsError, Op};
use super::path::base_name;

/// Reference point for [`SeekableFile::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// From the beginning of the object.
    Start,
    /// From the current offset.
    Current,
    /// From the end of the object.
    End,
}

impl TryFrom<i32> for Anchor {
    type Error = ErrorKind;

    /// Maps the conventional whence values 0, 1 and 2.
    fn try_from(whence: i32) -> Result<Self, Self::Error> {
        match whence {
            0 => Ok(Self::Start),
            1 => Ok(Self::Current),
            2 => Ok(Self::End),
            _ => Err(ErrorKind::InvalidArgument("invalid whence")),
        }
    }
}

/// A forward-only read handle over one object.
pub struct StreamFile<C> {
    client: Arc<C>,
    bucket: Arc<str>,
    key: String,
    path: String,
    body: ByteStream,
    offset: u64,
    /// Metadata taken from the fetch response, when it was complete.
    info: Option<Entry>,
    etag: Option<String>,
}

impl<C> std::fmt::Debug for StreamFile<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamFile")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("offset", &self.offset)
            .field("etag", &self.etag)
            .finish_non_exhaustive()
    }
}

impl<C: ObjectClient> StreamFile<C> {
    pub(crate) fn new(
        client: Arc<C>,
        bucket: Arc<str>,
        key: String,
        path: String,
        output: GetObjectOutput,
    ) -> Self {
        let info = match (output.content_length, output.last_modified) {
            (Some(size), Some(mod_time)) => Some(Entry::file(base_name(&key), size, mod_time)),
            _ => None,
        };
        Self {
            client,
            bucket,
            key,
            path,
            body: output.body,
            offset: 0,
            info,
            etag: output.etag,
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        let n = self
            .body
            .read(buf)
            .await
            .map_err(|e| FsError::new(Op::Read, &*self.path, e))?;
        self.offset += n as u64;
        Ok(n)
    }

    async fn read_to_end(&mut self) -> Result<Vec<u8>, FsError> {
        let mut out = Vec::new();
        let n = self
            .body
            .read_to_end(&mut out)
            .await
            .map_err(|e| FsError::new(Op::Read, &*self.path, e))?;
        self.offset += n as u64;
        Ok(out)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, key = %self.key))]
    async fn stat(&self) -> Result<Entry, FsError> {
        if let Some(info) = &self.info {
            return Ok(info.clone());
        }
        let meta = self
            .client
            .head_object(&self.bucket, &self.key)
            .await
            .map_err(|e| FsError::new(Op::Stat, &*self.path, e))?;
        Ok(Entry::file(
            base_name(&self.key),
            meta.size,
            meta.last_modified,
        ))
    }
}

/// A read handle that can be repositioned.
///
/// Repositioning drops the current byte stream and fetches a new one starting at the target
/// offset, conditioned on the entity tag captured at open. If the object has been replaced
/// in the meantime the seek fails with [`ErrorKind::NotExist`].
#[derive(Debug)]
pub struct SeekableFile<C> {
    stream: StreamFile<C>,
}

impl<C: ObjectClient> SeekableFile<C> {
    /// Move the read position and return the new absolute offset.
    ///
    /// Seeking to the current offset is free. Seeking to or past the end leaves a handle that
    /// reads nothing.
    #[instrument(skip(self), fields(bucket = %self.stream.bucket, key = %self.stream.key))]
    pub async fn seek(&mut self, offset: i64, anchor: Anchor) -> Result<u64, FsError> {
        let current = self.stream.offset;
        let target = match anchor {
            Anchor::Start => i128::from(offset),
            Anchor::Current => i128::from(current) + i128::from(offset),
            Anchor::End => i128::from(self.size().await?) + i128::from(offset),
        };

        if target == i128::from(current) {
            return Ok(current);
        }
        let Ok(target) = u64::try_from(target) else {
            return Err(FsError::new(
                Op::Seek,
                &*self.stream.path,
                ErrorKind::InvalidArgument("seeked to a negative position"),
            ));
        };

        if target >= self.size().await? {
            debug!(target, "seek at or past end of object");
            self.stream.body = Box::pin(tokio::io::empty());
            self.stream.offset = target;
            return Ok(target);
        }

        let request = GetObjectRequest {
            range_start: Some(target),
            if_match: self.stream.etag.clone(),
            ..GetObjectRequest::new(&*self.stream.bucket, self.stream.key.as_str())
        };
        let output = self.stream.client.get_object(request).await.map_err(|e| {
            let kind = if e.is_precondition_failed() || e.is_not_found() {
                ErrorKind::NotExist
            } else {
                ErrorKind::Client(e)
            };
            FsError::new(Op::Seek, &*self.stream.path, kind)
        })?;
        self.stream.body = output.body;
        self.stream.offset = target;
        Ok(target)
    }

    async fn size(&self) -> Result<u64, FsError> {
        self.stream
            .stat()
            .await
            .map(|entry| entry.size())
            .map_err(|e| FsError { op: Op::Seek, ..e })
    }
}

/// An open file.
#[derive(Debug)]
pub enum File<C> {
    /// Forward-only reads.
    Stream(StreamFile<C>),
    /// Reads plus [`SeekableFile::seek`].
    Seekable(SeekableFile<C>),
}

impl<C: ObjectClient> File<C> {
    pub(crate) fn new(stream: StreamFile<C>, seekable: bool) -> Self {
        if seekable {
            Self::Seekable(SeekableFile { stream })
        } else {
            Self::Stream(stream)
        }
    }

    fn stream(&self) -> &StreamFile<C> {
        match self {
            Self::Stream(s) => s,
            Self::Seekable(s) => &s.stream,
        }
    }

    fn stream_mut(&mut self) -> &mut StreamFile<C> {
        match self {
            Self::Stream(s) => s,
            Self::Seekable(s) => &mut s.stream,
        }
    }

    /// Read into `buf`, returning the number of bytes read; `Ok(0)` means end of object.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        self.stream_mut().read(buf).await
    }

    /// Read everything from the current offset to the end.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>, FsError> {
        self.stream_mut().read_to_end().await
    }

    /// The file's metadata. Answered from the open response when possible.
    pub async fn stat(&self) -> Result<Entry, FsError> {
        self.stream().stat().await
    }

    /// Current read position.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.stream().offset
    }

    /// The seekable handle, if this file supports seeking.
    pub fn as_seekable(&mut self) -> Option<&mut SeekableFile<C>> {
        match self {
            Self::Stream(_) => None,
            Self::Seekable(s) => Some(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whence_values_map_to_anchors() {
        assert_eq!(Anchor::try_from(0).ok(), Some(Anchor::Start));
        assert_eq!(Anchor::try_from(1).ok(), Some(Anchor::Current));
        assert_eq!(Anchor::try_from(2).ok(), Some(Anchor::End));
    }

    #[test]
    fn unknown_whence_is_rejected() {
        let err = Anchor::try_from(3).unwrap_err();
        assert!(matches!(err, ErrorKind::InvalidArgument("invalid whence")));
        assert_eq!(err.to_string(), "invalid argument: invalid whence");
    }
}
