//! The identifier-addressed cutout cache.
//!
//! Local storage for cutout metadata and masks, keyed by packed [`WordId`]s,
//! that answers every lookup with one of three states:
//!
//! - [`Lookup::FullyPresent`] - info and mask are stored and flagged as existing
//! - [`Lookup::KnownAbsent`] - the remote authority said the cutout does not exist
//! - [`Lookup::Unknown`] - nothing reliable is stored; fetch from the remote authority
//!
//! # Components
//!
//! - [`CutoutCache`] - the cache operations over any [`Backend`]
//! - [`CacheHandle`] - the process-wide handle that opens its backend lazily
//! - [`CutoutRecord`] - a complete cutout (info plus mask)
//!
//! # Consistency
//!
//! Writes go to the backend as a single batch, so an entry's existence flag
//! is set in the same atomic step as its payload, and a failed
//! [`put_many`](CutoutCache::put_many) leaves none of its entries visible. An
//! entry flagged as existing but missing part of its payload can only come
//! from outside corruption; lookups log it and report [`Lookup::Unknown`],
//! and [`CutoutCache::audit`] lists all such entries.
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use cutout_store::cache::{CutoutCache, Lookup};
//! use cutout_store::id::WordId;
//! use cutout_store::storage::{BoundingBox, CutoutInfo, MemoryBackend};
//!
//! # async fn example() -> Result<(), cutout_store::CacheError> {
//! let cache = CutoutCache::new(MemoryBackend::new());
//! let word = WordId::new(1, 3, 27, 0, 2);
//!
//! assert_eq!(cache.get_one(&word).await?, Lookup::Unknown);
//!
//! let info = CutoutInfo::new(BoundingBox::new(310, 88, 54, 40));
//! cache.put_one(&word, info, Bytes::from_static(b"mask")).await?;
//! assert!(cache.get_one(&word).await?.is_present());
//!
//! // the remote authority deleted the word
//! cache.invalidate(&word).await?;
//! assert_eq!(cache.get_one(&word).await?, Lookup::KnownAbsent);
//! # Ok(())
//! # }
//! ```
//!
//! [`WordId`]: crate::id::WordId
//! [`Backend`]: crate::storage::Backend

mod cutout_cache;
mod error;
mod handle;
mod record;

pub use cutout_cache::CutoutCache;
pub use error::CacheError;
pub use handle::CacheHandle;
pub use record::{CutoutRecord, Inconsistency, Lookup};
