use super::*;
use crate::config::CacheConfig;
use super::frame::decode_frame;
use crate::constants::{FRAME_HEADER_LEN, INFO_RECORD_COST, JOURNAL_FILE_NAME};
use crate::id::PackedId;
use bytes::Bytes;
use std::io::Write;
use tempfile::TempDir;

fn key(raw: u64) -> PackedId {
    PackedId::new(raw).expect("test key in range")
}

fn info() -> CutoutInfo {
    CutoutInfo::new(BoundingBox::new(4, 8, 120, 60)).with_baseline(0.4, 0.8)
}

fn full_entry(batch: &mut WriteBatch, k: PackedId, mask: &'static [u8]) {
    batch.put_info(k, info());
    batch.put_mask(k, Bytes::from_static(mask));
    batch.set_exists(k, true);
}

fn config(temp: &TempDir) -> CacheConfig {
    CacheConfig::new(temp.path().join("cache")).with_sync_writes(false)
}

#[tokio::test]
async fn test_memory_apply_and_read() {
    let backend = MemoryBackend::new();
    let mut batch = WriteBatch::new();
    full_entry(&mut batch, key(1), b"abc");
    backend.apply(batch).await.unwrap();

    let snapshot = backend.read(key(1)).await.unwrap();
    assert_eq!(snapshot.exists, Some(true));
    assert_eq!(snapshot.info, Some(info()));
    assert_eq!(snapshot.mask.as_deref(), Some(&b"abc"[..]));
    assert!(backend.read(key(2)).await.unwrap().is_vacant());
    assert_eq!(backend.payload_bytes(), INFO_RECORD_COST + 3);
}

#[tokio::test]
async fn test_memory_replace_and_remove_accounting() {
    let backend = MemoryBackend::new();
    let mut batch = WriteBatch::new();
    full_entry(&mut batch, key(1), b"abcdef");
    backend.apply(batch).await.unwrap();

    let mut batch = WriteBatch::new();
    batch.put_mask(key(1), Bytes::from_static(b"xy"));
    backend.apply(batch).await.unwrap();
    assert_eq!(backend.payload_bytes(), INFO_RECORD_COST + 2);

    let mut batch = WriteBatch::new();
    for space in RecordSpace::ALL {
        batch.remove(key(1), space);
    }
    backend.apply(batch).await.unwrap();
    assert_eq!(backend.payload_bytes(), 0);
    assert!(backend.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_quota_failure_is_all_or_nothing() {
    let limits = Limits {
        quota_bytes: 2 * INFO_RECORD_COST + 10,
        max_mask_len: 1024,
        ..Limits::default()
    };
    let backend = MemoryBackend::with_limits(limits);

    let mut batch = WriteBatch::new();
    full_entry(&mut batch, key(1), b"12345");
    full_entry(&mut batch, key(2), b"123456789");
    let err = backend.apply(batch).await.unwrap_err();

    match err {
        StorageError::QuotaExceeded {
            key: failed, space, ..
        } => {
            assert_eq!(failed, key(2));
            assert_eq!(space, RecordSpace::Mask);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(backend.read(key(1)).await.unwrap().is_vacant());
    assert!(backend.read(key(2)).await.unwrap().is_vacant());
    assert_eq!(backend.payload_bytes(), 0);
}

#[tokio::test]
async fn test_replacement_within_batch_is_counted_once() {
    let limits = Limits {
        quota_bytes: INFO_RECORD_COST + 4,
        max_mask_len: 1024,
        ..Limits::default()
    };
    let backend = MemoryBackend::with_limits(limits);

    let mut batch = WriteBatch::new();
    batch.put_info(key(1), info());
    batch.put_mask(key(1), Bytes::from_static(b"1234"));
    batch.put_mask(key(1), Bytes::from_static(b"abcd"));
    batch.put_info(key(1), info());
    backend.apply(batch).await.unwrap();
    assert_eq!(backend.payload_bytes(), INFO_RECORD_COST + 4);
}

#[tokio::test]
async fn test_mask_size_limit() {
    let backend = MemoryBackend::with_limits(Limits {
        quota_bytes: 1 << 20,
        max_mask_len: 4,
        ..Limits::default()
    });
    let mut batch = WriteBatch::new();
    batch.put_mask(key(3), Bytes::from_static(b"12345"));
    let err = backend.apply(batch).await.unwrap_err();
    assert!(matches!(err, StorageError::MaskTooLarge { len: 5, max: 4, .. }));
    assert_eq!(err.key(), Some(key(3)));
}

#[tokio::test]
async fn test_batch_keys_in_first_seen_order() {
    let mut batch = WriteBatch::new();
    full_entry(&mut batch, key(9), b"a");
    full_entry(&mut batch, key(3), b"b");
    batch.set_exists(key(9), false);
    assert_eq!(batch.keys(), vec![key(9), key(3)]);
    assert_eq!(batch.len(), 7);
    assert_eq!(batch.payload_bytes(), 2);
}

#[tokio::test]
async fn test_file_backend_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp);

    {
        let backend = FileBackend::open(&config).await.unwrap();
        let mut batch = WriteBatch::new();
        full_entry(&mut batch, key(1), b"first");
        full_entry(&mut batch, key(2), b"second");
        backend.apply(batch).await.unwrap();

        let mut batch = WriteBatch::new();
        batch.set_exists(key(2), false);
        batch.remove(key(2), RecordSpace::Info);
        batch.remove(key(2), RecordSpace::Mask);
        backend.apply(batch).await.unwrap();
    }

    let backend = FileBackend::open(&config).await.unwrap();
    let first = backend.read(key(1)).await.unwrap();
    assert_eq!(first.exists, Some(true));
    assert_eq!(first.mask.as_deref(), Some(&b"first"[..]));

    let second = backend.read(key(2)).await.unwrap();
    assert_eq!(second.exists, Some(false));
    assert!(second.info.is_none());
    assert!(second.mask.is_none());
    assert_eq!(backend.payload_bytes(), INFO_RECORD_COST + 5);
}

#[tokio::test]
async fn test_file_backend_rejected_batch_not_journaled() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp).with_max_mask_len(4);

    {
        let backend = FileBackend::open(&config).await.unwrap();
        let mut batch = WriteBatch::new();
        full_entry(&mut batch, key(1), b"ok");
        backend.apply(batch).await.unwrap();
        let len = backend.journal_len().await;

        let mut batch = WriteBatch::new();
        full_entry(&mut batch, key(2), b"too long");
        assert!(backend.apply(batch).await.is_err());
        assert_eq!(backend.journal_len().await, len);
    }

    let backend = FileBackend::open(&config).await.unwrap();
    assert_eq!(backend.keys().await.unwrap(), vec![key(1)]);
}

#[tokio::test]
async fn test_torn_tail_is_discarded() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp);

    let intact_len = {
        let backend = FileBackend::open(&config).await.unwrap();
        let mut batch = WriteBatch::new();
        full_entry(&mut batch, key(1), b"kept");
        backend.apply(batch).await.unwrap();
        backend.journal_len().await
    };

    // Simulate a crash halfway through the next frame.
    let path = config.directory().join(JOURNAL_FILE_NAME);
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[0, 0, 0, 200, 1, 2, 3]).unwrap();
    drop(file);

    let backend = FileBackend::open(&config).await.unwrap();
    assert_eq!(backend.journal_len().await, intact_len);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), intact_len);
    assert_eq!(backend.read(key(1)).await.unwrap().exists, Some(true));

    // New writes land after the intact prefix and replay cleanly.
    let mut batch = WriteBatch::new();
    full_entry(&mut batch, key(2), b"new");
    backend.apply(batch).await.unwrap();
    drop(backend);

    let backend = FileBackend::open(&config).await.unwrap();
    assert_eq!(backend.keys().await.unwrap(), vec![key(1), key(2)]);
}

#[tokio::test]
async fn test_compact_preserves_state() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp);

    let backend = FileBackend::open(&config).await.unwrap();
    for round in 0..5u8 {
        let mut batch = WriteBatch::new();
        batch.put_info(key(1), info());
        batch.put_mask(key(1), Bytes::from(vec![round; 64]));
        batch.set_exists(key(1), true);
        backend.apply(batch).await.unwrap();
    }
    let mut batch = WriteBatch::new();
    batch.set_exists(key(2), false);
    backend.apply(batch).await.unwrap();

    let before = backend.journal_len().await;
    backend.compact().await.unwrap();
    assert!(backend.journal_len().await < before);
    drop(backend);

    let backend = FileBackend::open(&config).await.unwrap();
    let snapshot = backend.read(key(1)).await.unwrap();
    assert_eq!(snapshot.mask, Some(Bytes::from(vec![4u8; 64])));
    assert_eq!(snapshot.info, Some(info()));
    assert_eq!(backend.read(key(2)).await.unwrap().exists, Some(false));
}

#[tokio::test]
async fn test_open_fails_when_directory_is_a_file() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("cache");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let result = FileBackend::open(&CacheConfig::new(&blocker)).await;
    assert!(matches!(result, Err(StorageError::Io(_))));
}

#[tokio::test]
async fn test_batch_over_frame_limit_is_refused() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp).with_max_frame_len(512);

    {
        let backend = FileBackend::open(&config).await.unwrap();
        let mut batch = WriteBatch::new();
        for raw in 0..10 {
            batch.put_info(key(raw), info());
            batch.put_mask(key(raw), Bytes::from(vec![7u8; 100]));
            batch.set_exists(key(raw), true);
        }
        let err = backend.apply(batch).await.unwrap_err();
        assert!(matches!(err, StorageError::FrameTooLarge { max: 512, .. }));
        assert_eq!(backend.journal_len().await, 0);
        assert!(backend.keys().await.unwrap().is_empty());

        // later writes are unaffected and survive reopen
        let mut batch = WriteBatch::new();
        full_entry(&mut batch, key(500), b"small");
        backend.apply(batch).await.unwrap();
    }

    let backend = FileBackend::open(&config).await.unwrap();
    assert_eq!(backend.keys().await.unwrap(), vec![key(500)]);
}

#[tokio::test]
async fn test_compact_splits_state_into_bounded_frames() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp).with_max_frame_len(512);

    {
        let backend = FileBackend::open(&config).await.unwrap();
        for raw in 0..20 {
            let mut batch = WriteBatch::new();
            batch.put_info(key(raw), info());
            batch.put_mask(key(raw), Bytes::from(vec![raw as u8; 100]));
            batch.set_exists(key(raw), true);
            backend.apply(batch).await.unwrap();
        }
        backend.compact().await.unwrap();

        let mut batch = WriteBatch::new();
        full_entry(&mut batch, key(500), b"after");
        backend.apply(batch).await.unwrap();
    }

    let data = Bytes::from(std::fs::read(config.directory().join(JOURNAL_FILE_NAME)).unwrap());
    let mut offset = 0;
    let mut frames = 0;
    while offset < data.len() {
        let (_, used) = decode_frame(&data.slice(offset..), 512).unwrap();
        assert!(used - FRAME_HEADER_LEN <= 512);
        offset += used;
        frames += 1;
    }
    assert!(frames > 2);

    let backend = FileBackend::open(&config).await.unwrap();
    assert_eq!(backend.keys().await.unwrap().len(), 21);
    for raw in 0..20 {
        let snapshot = backend.read(key(raw)).await.unwrap();
        assert_eq!(snapshot.exists, Some(true));
        assert_eq!(snapshot.mask, Some(Bytes::from(vec![raw as u8; 100])));
    }
    assert!(backend.read(key(500)).await.unwrap().exists == Some(true));
}

#[test]
fn test_frame_limit_cannot_exceed_replay_limit() {
    let config = CacheConfig::default().with_max_frame_len(usize::MAX);
    assert_eq!(config.max_frame_len(), crate::constants::MAX_FRAME_LEN);
    assert_eq!(Limits::from_config(&config).max_frame_len, crate::constants::MAX_FRAME_LEN);
}
