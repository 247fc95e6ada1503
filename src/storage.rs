//! Record spaces and the backends that persist them.
//!
//! Every cutout identifier owns up to three records, one per
//! [`RecordSpace`]: an existence flag, an info record and a mask blob. A
//! [`Backend`] stores them and commits [`WriteBatch`]es atomically.
//!
//! # Components
//!
//! - [`Backend`] - the storage contract: consistent reads, all-or-nothing batches
//! - [`MemoryBackend`] - volatile storage behind a single lock
//! - [`FileBackend`] - durable storage: in-memory image plus an append-only journal
//! - [`Limits`] - payload quota and mask size limit checked at admission
//!
//! # Journal recovery
//!
//! [`FileBackend`] writes one checksummed frame per batch. On open the journal
//! is replayed; a frame that is cut short or fails its checksum marks the end
//! of the last completed write and everything after it is discarded. A frame
//! with a valid checksum but undecodable contents is reported as
//! [`StorageError::Corrupt`].
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use cutout_store::id::PackedId;
//! use cutout_store::storage::{Backend, BoundingBox, CutoutInfo, MemoryBackend, WriteBatch};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MemoryBackend::new();
//! let key = PackedId::new(42).unwrap();
//!
//! let mut batch = WriteBatch::new();
//! batch.put_info(key, CutoutInfo::new(BoundingBox::new(0, 0, 8, 8)));
//! batch.put_mask(key, Bytes::from_static(b"mask"));
//! batch.set_exists(key, true);
//! backend.apply(batch).await?;
//!
//! let snapshot = backend.read(key).await?;
//! assert_eq!(snapshot.exists, Some(true));
//! # Ok(())
//! # }
//! ```

mod backend;
mod batch;
mod error;
mod frame;
mod journal;
mod memory;
mod record;
mod spaces;

pub use backend::{Backend, OpenBackend};
pub use batch::{WriteBatch, WriteOp};
pub use error::StorageError;
pub use journal::FileBackend;
pub use memory::MemoryBackend;
pub use record::{BoundingBox, CutoutInfo, RecordSpace, Snapshot};
pub use spaces::Limits;

#[cfg(test)]
mod tests;
