//! cutout-store - packed word identifiers and a local cutout cache
//!
//! This library packs small structured identifiers into integers that stay
//! exact as IEEE-754 doubles, and caches per-word cutout metadata and masks
//! under those integers with a three-state lookup.
//!
//! # Modules
//!
//! - [`bitfield`] - MSB-first bit-field packing and the 52-bit layout contract
//! - [`id`] - word and page identifiers built on fixed layouts
//! - [`mask`] - binary cutout masks and their run-length encoding
//! - [`storage`] - record spaces, atomic write batches, memory and journal backends
//! - [`cache`] - the cutout cache and its lazily opened handle
//! - [`config`] - cache location and limits

pub mod bitfield;
pub mod cache;
pub mod config;
pub mod constants;
pub mod id;
pub mod mask;
pub mod storage;

pub use bitfield::{pack, unpack, BitField, BitLayout, CodecError};
pub use cache::{CacheError, CacheHandle, CutoutCache, CutoutRecord, Inconsistency, Lookup};
pub use config::CacheConfig;
pub use id::{Identifier, PackedId, PageId, WordId};
pub use mask::{BinaryMask, MaskError};
pub use storage::{
    Backend, BoundingBox, CutoutInfo, FileBackend, MemoryBackend, StorageError, WriteBatch,
};
