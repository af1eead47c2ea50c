#![allow(clippy::unwrap_used, missing_docs)]

mod common;

use std::sync::Arc;

use bucket_fs::client::{CountingClient, MemoryClient, ObjectClient};
use bucket_fs::fs::{Anchor, BucketFs, ErrorKind, File, Handle, Op};
use common::{BUCKET, CONTENT};

const TEST_FILE: &str = "file.txt";

fn seekable_fs() -> BucketFs<CountingClient<MemoryClient>> {
    let client = MemoryClient::new();
    client.insert(BUCKET, TEST_FILE, CONTENT);
    BucketFs::new_seekable(CountingClient::new(client), BUCKET)
}

async fn open_file<C: ObjectClient>(fs: &BucketFs<C>, path: &str) -> File<C> {
    match fs.open(path).await.unwrap() {
        Handle::File(file) => file,
        Handle::Dir(_) => panic!("{path} opened as a directory"),
    }
}

async fn read_n<C: ObjectClient>(file: &mut File<C>, n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    let mut filled = 0;
    while filled < n {
        let read = file.read(&mut out[filled..]).await.unwrap();
        if read == 0 {
            break;
        }
        filled += read;
    }
    out.truncate(filled);
    out
}

#[tokio::test]
async fn default_filesystem_opens_stream_files() {
    let client = MemoryClient::new();
    client.insert(BUCKET, TEST_FILE, CONTENT);
    let fs = BucketFs::new(client, BUCKET);

    let mut file = open_file(&fs, TEST_FILE).await;
    assert!(matches!(file, File::Stream(_)));
    assert!(file.as_seekable().is_none());
    assert_eq!(file.read_to_end().await.unwrap(), CONTENT);
    assert_eq!(file.offset(), CONTENT.len() as u64);
}

#[tokio::test]
async fn seek_then_read() {
    let fs = seekable_fs();
    let mut file = open_file(&fs, TEST_FILE).await;

    let seekable = file.as_seekable().unwrap();
    assert_eq!(seekable.seek(2, Anchor::Start).await.unwrap(), 2);
    assert_eq!(read_n(&mut file, 3).await, b"nte");
    assert_eq!(file.offset(), 5);
}

#[tokio::test]
async fn seek_once() {
    let fixtures = [
        ("start", 2, Anchor::Start, 2),
        ("current", 4, Anchor::Current, 4),
        ("end", -1, Anchor::End, CONTENT.len() as u64 - 1),
    ];
    for (desc, offset, anchor, want) in fixtures {
        let fs = seekable_fs();
        let mut file = open_file(&fs, TEST_FILE).await;
        let got = file
            .as_seekable()
            .unwrap()
            .seek(offset, anchor)
            .await
            .unwrap();
        assert_eq!(got, want, "{desc}");
        assert_eq!(file.offset(), want, "{desc}");
    }
}

#[tokio::test]
async fn seek_relative_to_current_after_reading() {
    let fs = seekable_fs();
    let mut file = open_file(&fs, TEST_FILE).await;
    assert_eq!(read_n(&mut file, 4).await, b"cont");

    let pos = file
        .as_seekable()
        .unwrap()
        .seek(-3, Anchor::Current)
        .await
        .unwrap();
    assert_eq!(pos, 1);
    assert_eq!(file.read_to_end().await.unwrap(), b"ontent");
}

#[tokio::test]
async fn seek_to_current_offset_makes_no_call() {
    let fs = seekable_fs();
    let mut file = open_file(&fs, TEST_FILE).await;
    read_n(&mut file, 3).await;
    let before = fs.client().counts();

    let seekable = file.as_seekable().unwrap();
    assert_eq!(seekable.seek(3, Anchor::Start).await.unwrap(), 3);
    assert_eq!(seekable.seek(0, Anchor::Current).await.unwrap(), 3);

    assert_eq!(fs.client().counts(), before);
    assert_eq!(file.read_to_end().await.unwrap(), b"tent");
}

#[tokio::test]
async fn seek_to_negative_position_fails() {
    for (offset, anchor) in [(-1, Anchor::Current), (-1, Anchor::Start), (-8, Anchor::End)] {
        let fs = seekable_fs();
        let mut file = open_file(&fs, TEST_FILE).await;

        let err = file
            .as_seekable()
            .unwrap()
            .seek(offset, anchor)
            .await
            .unwrap_err();
        assert_eq!(err.op, Op::Seek);
        assert_eq!(err.path, TEST_FILE);
        assert!(matches!(
            err.kind,
            ErrorKind::InvalidArgument("seeked to a negative position")
        ));

        assert_eq!(file.offset(), 0);
        assert_eq!(file.read_to_end().await.unwrap(), CONTENT);
    }
}

#[tokio::test]
async fn seek_past_end_reads_nothing() {
    let fs = seekable_fs();
    let mut file = open_file(&fs, TEST_FILE).await;
    let gets = fs.client().counts().get;

    let pos = file.as_seekable().unwrap().seek(10, Anchor::Start).await.unwrap();
    assert_eq!(pos, 10);
    let mut buf = [0u8; 4];
    assert_eq!(file.read(&mut buf).await.unwrap(), 0);
    assert_eq!(file.offset(), 10);
    assert_eq!(fs.client().counts().get, gets);

    // Back inside the object fetches again.
    let pos = file.as_seekable().unwrap().seek(-3, Anchor::End).await.unwrap();
    assert_eq!(pos, 4);
    assert_eq!(file.read_to_end().await.unwrap(), b"ent");
    assert_eq!(fs.client().counts().get, gets + 1);
}

#[tokio::test]
async fn seek_fails_if_file_changed() {
    let client = Arc::new(MemoryClient::new());
    client.insert(BUCKET, "otherFile.txt", "con");
    let fs: BucketFs<MemoryClient> = BucketFs::new_seekable(Arc::clone(&client), BUCKET);
    let mut file = open_file(&fs, "otherFile.txt").await;

    assert_eq!(
        file.as_seekable().unwrap().seek(0, Anchor::End).await.unwrap(),
        3
    );

    client.delete_object(BUCKET, "otherFile.txt").await.unwrap();
    client.insert(BUCKET, "otherFile.txt", "tent");

    let err = file
        .as_seekable()
        .unwrap()
        .seek(0, Anchor::Start)
        .await
        .unwrap_err();
    assert_eq!(err.op, Op::Seek);
    assert!(err.is_not_exist(), "{err}");
}

#[tokio::test]
async fn seek_fails_if_file_deleted() {
    let client = Arc::new(MemoryClient::new());
    client.insert(BUCKET, TEST_FILE, CONTENT);
    let fs: BucketFs<MemoryClient> = BucketFs::new_seekable(Arc::clone(&client), BUCKET);
    let mut file = open_file(&fs, TEST_FILE).await;

    client.delete_object(BUCKET, TEST_FILE).await.unwrap();

    let err = file
        .as_seekable()
        .unwrap()
        .seek(1, Anchor::Start)
        .await
        .unwrap_err();
    assert!(err.is_not_exist(), "{err}");
}

#[tokio::test]
async fn invalid_whence_is_rejected() {
    let err = Anchor::try_from(3).unwrap_err();
    assert!(matches!(err, ErrorKind::InvalidArgument("invalid whence")));
    assert_eq!(Anchor::try_from(2).unwrap(), Anchor::End);
}
