use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as TokioMutex;

use super::backend::{Backend, OpenBackend};
use super::batch::WriteBatch;
use super::error::StorageError;
use super::frame::{decode_frame, encode_frame, split_batch, FrameError};
use super::record::Snapshot;
use super::spaces::{Limits, Spaces};
use crate::config::CacheConfig;
use crate::constants::{JOURNAL_COMPACT_FILE_NAME, JOURNAL_FILE_NAME, MAX_FRAME_LEN};
use crate::id::PackedId;

struct Journal {
    file: File,
    path: PathBuf,
    /// Length of the journal up to the last complete frame.
    len: u64,
    /// Set once the file may no longer end at `len`. Appending after that
    /// point could hide committed frames behind garbage, so all further writes
    /// are refused.
    poisoned: Option<String>,
}

impl Journal {
    fn check(&self) -> Result<(), StorageError> {
        match &self.poisoned {
            Some(reason) => Err(StorageError::Poisoned {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn poison(&mut self, reason: String) {
        tracing::error!(path = %self.path.display(), %reason, "journal disabled");
        self.poisoned = Some(reason);
    }

    async fn append(&mut self, frame: &[u8], sync: bool) -> io::Result<()> {
        self.file.write_all(frame).await?;
        self.file.flush().await?;
        if sync {
            self.file.sync_data().await?;
        }
        self.len += frame.len() as u64;
        Ok(())
    }

    /// Cuts off whatever part of a failed append reached the file.
    async fn rollback(&mut self) {
        if let Err(e) = self.file.set_len(self.len).await {
            self.poison(format!("failed to truncate after a failed append: {e}"));
        }
    }
}

async fn write_frames(path: &Path, frames: &[Bytes]) -> io::Result<()> {
    let mut file = File::create(path).await?;
    for frame in frames {
        file.write_all(frame).await?;
    }
    file.flush().await?;
    file.sync_all().await
}

/// Makes a rename inside `directory` durable.
#[cfg(unix)]
async fn sync_dir(directory: &Path) -> io::Result<()> {
    File::open(directory).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_directory: &Path) -> io::Result<()> {
    Ok(())
}

/// Rebuilds the record spaces from journal bytes.
///
/// Stops at the first torn frame and returns the length of the intact prefix.
fn replay(data: &Bytes) -> Result<(Spaces, usize, usize), StorageError> {
    let mut spaces = Spaces::default();
    let mut offset = 0;
    let mut frames = 0;

    while offset < data.len() {
        match decode_frame(&data.slice(offset..), MAX_FRAME_LEN) {
            Ok((batch, used)) => {
                spaces.install(batch);
                offset += used;
                frames += 1;
            }
            Err(FrameError::Torn(reason)) => {
                tracing::warn!(
                    offset,
                    discarded = data.len() - offset,
                    reason,
                    "discarding torn journal tail"
                );
                break;
            }
            Err(FrameError::Invalid(reason)) => {
                return Err(StorageError::Corrupt {
                    offset: offset as u64,
                    reason,
                });
            }
        }
    }

    Ok((spaces, offset, frames))
}

/// A durable backend: an in-memory image of the record spaces backed by an
/// append-only journal.
///
/// Every committed batch is one checksummed journal frame. A batch becomes
/// visible to readers only after its frame has been written (and synced, if
/// configured), so a crash loses at most the batch being written, never part
/// of one.
pub struct FileBackend {
    image: RwLock<Spaces>,
    journal: TokioMutex<Journal>,
    directory: PathBuf,
    limits: Limits,
    sync_writes: bool,
}

impl FileBackend {
    /// Opens (or creates) the journal in `config.directory()` and replays it.
    pub async fn open(config: &CacheConfig) -> Result<Self, StorageError> {
        Self::open_journal(config).await
    }

    async fn open_journal(config: &CacheConfig) -> Result<Self, StorageError> {
        let directory = config.directory().to_path_buf();
        tokio::fs::create_dir_all(&directory).await?;
        let path = directory.join(JOURNAL_FILE_NAME);

        let data = match tokio::fs::read(&path).await {
            Ok(data) => Bytes::from(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Bytes::new(),
            Err(e) => return Err(e.into()),
        };
        let (image, valid_len, frames) = replay(&data)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        if valid_len < data.len() {
            file.set_len(valid_len as u64).await?;
            file.sync_all().await?;
        }

        tracing::info!(
            path = %path.display(),
            frames,
            bytes = valid_len,
            "opened cutout journal"
        );

        Ok(Self {
            image: RwLock::new(image),
            journal: TokioMutex::new(Journal {
                file,
                path,
                len: valid_len as u64,
                poisoned: None,
            }),
            directory,
            limits: Limits::from_config(config),
            sync_writes: config.sync_writes(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn payload_bytes(&self) -> usize {
        self.image.read().used()
    }

    /// Length of the journal in bytes.
    pub async fn journal_len(&self) -> u64 {
        self.journal.lock().await.len
    }

    /// Rewrites the journal to hold only the current state.
    ///
    /// The image is split into frames within the frame limit and written to a
    /// temporary file, which is synced and renamed over the old journal. A
    /// crash before the rename leaves the old journal intact.
    pub async fn compact(&self) -> Result<(), StorageError> {
        let mut journal = self.journal.lock().await;
        journal.check()?;
        let before = journal.len;

        let state = self.image.read().to_batch();
        let frames = split_batch(state, self.limits.max_frame_len)
            .iter()
            .map(|part| encode_frame(part, self.limits.max_frame_len))
            .collect::<Result<Vec<_>, _>>()?;
        let after: u64 = frames.iter().map(|frame| frame.len() as u64).sum();

        let tmp = self.directory.join(JOURNAL_COMPACT_FILE_NAME);
        let written = match write_frames(&tmp, &frames).await {
            Ok(()) => tokio::fs::rename(&tmp, &journal.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::debug!(error = %cleanup, "failed to remove compaction file");
            }
            return Err(e.into());
        }

        // The old handle now refers to the replaced file.
        let reopened = match OpenOptions::new().append(true).open(&journal.path).await {
            Ok(file) => sync_dir(&self.directory).await.map(|()| file),
            Err(e) => Err(e),
        };
        match reopened {
            Ok(file) => {
                journal.file = file;
                journal.len = after;
            }
            Err(e) => {
                journal.poison(format!("failed to reopen journal after compaction: {e}"));
                return Err(e.into());
            }
        }

        tracing::info!(
            before,
            after,
            frames = frames.len(),
            "compacted cutout journal"
        );
        Ok(())
    }
}

impl Backend for FileBackend {
    async fn read(&self, key: PackedId) -> Result<Snapshot, StorageError> {
        Ok(self.image.read().snapshot(key))
    }

    async fn apply(&self, batch: WriteBatch) -> Result<(), StorageError> {
        if batch.is_empty() {
            return Ok(());
        }

        // Writers are serialised here so journal order matches install order,
        // and an admitted batch stays admissible until it is installed.
        let mut journal = self.journal.lock().await;
        journal.check()?;
        self.image.read().admit(&batch, &self.limits)?;

        let frame = encode_frame(&batch, self.limits.max_frame_len)?;
        if let Err(e) = journal.append(&frame, self.sync_writes).await {
            journal.rollback().await;
            return Err(e.into());
        }

        let ops = batch.len();
        self.image.write().install(batch);
        tracing::debug!(ops, bytes = frame.len(), "committed batch");
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<PackedId>, StorageError> {
        Ok(self.image.read().keys())
    }
}

impl OpenBackend for FileBackend {
    async fn open(config: &CacheConfig) -> Result<Self, StorageError> {
        Self::open_journal(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BoundingBox, CutoutInfo};
    use tempfile::TempDir;

    fn key(raw: u64) -> PackedId {
        PackedId::new(raw).unwrap()
    }

    fn entry(raw: u64, mask: &'static [u8]) -> WriteBatch {
        let mut batch = WriteBatch::new();
        batch.put_info(key(raw), CutoutInfo::new(BoundingBox::new(0, 0, 8, 8)));
        batch.put_mask(key(raw), Bytes::from_static(mask));
        batch.set_exists(key(raw), true);
        batch
    }

    async fn open(temp: &TempDir) -> FileBackend {
        let config = CacheConfig::new(temp.path()).with_sync_writes(false);
        FileBackend::open(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_rollback_cuts_partial_append() {
        let temp = TempDir::new().unwrap();
        let backend = open(&temp).await;
        backend.apply(entry(1, b"kept")).await.unwrap();

        {
            let mut journal = backend.journal.lock().await;
            let intact = journal.len;

            // half a frame reaches the file before the write fails
            let frame = encode_frame(&entry(2, b"lost"), MAX_FRAME_LEN).unwrap();
            journal.file.write_all(&frame[..frame.len() / 2]).await.unwrap();
            journal.file.flush().await.unwrap();

            journal.rollback().await;
            assert!(journal.poisoned.is_none());
            assert_eq!(journal.file.metadata().await.unwrap().len(), intact);
        }

        backend.apply(entry(3, b"after")).await.unwrap();
        drop(backend);

        let backend = open(&temp).await;
        assert_eq!(backend.keys().await.unwrap(), vec![key(1), key(3)]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_unrecoverable_append_disables_journal() {
        // Writes to /dev/full fail with ENOSPC, and it cannot be truncated.
        if !Path::new("/dev/full").exists() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let backend = open(&temp).await;
        backend.apply(entry(1, b"kept")).await.unwrap();

        backend.journal.lock().await.file = OpenOptions::new()
            .append(true)
            .open("/dev/full")
            .await
            .unwrap();

        let err = backend.apply(entry(2, b"lost")).await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(backend.read(key(2)).await.unwrap().is_vacant());

        let err = backend.apply(entry(3, b"refused")).await.unwrap_err();
        assert!(matches!(err, StorageError::Poisoned { .. }));
        assert!(matches!(
            backend.compact().await,
            Err(StorageError::Poisoned { .. })
        ));
        assert_eq!(backend.read(key(1)).await.unwrap().exists, Some(true));
        drop(backend);

        let backend = open(&temp).await;
        assert_eq!(backend.keys().await.unwrap(), vec![key(1)]);
    }
}
