use bytes::Bytes;
use tokio::sync::Mutex;

use super::error::CacheError;
use super::record::{CutoutRecord, Inconsistency, Lookup};
use crate::id::{Identifier, PackedId, WordId};
use crate::storage::{Backend, CutoutInfo, FileBackend, RecordSpace, Snapshot, WriteBatch};

/// Interprets the three record spaces of one identifier.
fn classify(key: PackedId, snapshot: Snapshot) -> Lookup {
    match snapshot {
        Snapshot {
            exists: Some(true),
            info: Some(info),
            mask: Some(mask),
        } => Lookup::FullyPresent(CutoutRecord { info, mask }),
        Snapshot {
            exists: Some(true),
            info,
            mask,
        } => {
            tracing::warn!(
                %key,
                has_info = info.is_some(),
                has_mask = mask.is_some(),
                "existence flag set without full payload, reporting unknown"
            );
            Lookup::Unknown
        }
        Snapshot {
            exists: Some(false),
            ..
        } => Lookup::KnownAbsent,
        Snapshot { exists: None, .. } => Lookup::Unknown,
    }
}

fn is_inconsistent(snapshot: &Snapshot) -> bool {
    snapshot.exists == Some(true) && (snapshot.info.is_none() || snapshot.mask.is_none())
}

/// Cutout metadata and masks addressed by packed [`WordId`]s.
///
/// Every write is a single [`WriteBatch`], so the existence flag of an entry
/// only becomes `true` together with its info record and mask. Writes made
/// through one cache are serialized, so a write that depends on a prior read
/// sees no interleaved change from the same cache.
pub struct CutoutCache<B> {
    backend: B,
    writes: Mutex<()>,
}

impl<B: Backend> CutoutCache<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            writes: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn stage(
        batch: &mut WriteBatch,
        id: &WordId,
        info: CutoutInfo,
        mask: Bytes,
    ) -> Result<PackedId, CacheError> {
        let key = id.pack()?;
        info.validate()
            .map_err(|reason| CacheError::InvalidRecord { key, reason })?;
        if mask.is_empty() {
            return Err(CacheError::InvalidRecord {
                key,
                reason: "mask is empty",
            });
        }
        batch.put_info(key, info);
        batch.put_mask(key, mask);
        batch.set_exists(key, true);
        Ok(key)
    }

    /// Applies `batch`. Callers hold the write lock.
    async fn commit(&self, batch: WriteBatch, entries: usize) -> Result<(), CacheError> {
        self.backend.apply(batch).await.map_err(|source| {
            let failed = source.key();
            tracing::warn!(entries, ?failed, error = %source, "cutout write not committed");
            CacheError::PartialWrite {
                entries,
                failed,
                source,
            }
        })
    }

    /// Stores one cutout, replacing any previous info and mask.
    ///
    /// # Errors
    ///
    /// On any failure nothing is written and the entry keeps its previous
    /// state.
    pub async fn put_one(
        &self,
        id: &WordId,
        info: CutoutInfo,
        mask: Bytes,
    ) -> Result<(), CacheError> {
        let mut batch = WriteBatch::with_capacity(3);
        let key = Self::stage(&mut batch, id, info, mask)?;
        let _writing = self.writes.lock().await;
        self.commit(batch, 1).await?;
        tracing::trace!(%key, %id, "stored cutout");
        Ok(())
    }

    /// Stores several cutouts in one all-or-nothing write.
    ///
    /// Either every entry becomes visible or none does. An invalid identifier
    /// or record anywhere in `entries` aborts before anything is written.
    pub async fn put_many<I>(&self, entries: I) -> Result<(), CacheError>
    where
        I: IntoIterator<Item = (WordId, CutoutInfo, Bytes)>,
    {
        let mut batch = WriteBatch::new();
        let mut count = 0;
        for (id, info, mask) in entries {
            Self::stage(&mut batch, &id, info, mask)?;
            count += 1;
        }
        if count == 0 {
            return Ok(());
        }
        let _writing = self.writes.lock().await;
        self.commit(batch, count).await?;
        tracing::debug!(entries = count, "stored cutouts");
        Ok(())
    }

    /// Looks up a cutout.
    ///
    /// Storage failures are returned as errors, never as
    /// [`Lookup::KnownAbsent`].
    pub async fn get_one(&self, id: &WordId) -> Result<Lookup, CacheError> {
        let key = id.pack()?;
        let snapshot = self.backend.read(key).await?;
        Ok(classify(key, snapshot))
    }

    pub async fn get_many(&self, ids: &[WordId]) -> Result<Vec<Lookup>, CacheError> {
        let mut lookups = Vec::with_capacity(ids.len());
        for id in ids {
            lookups.push(self.get_one(id).await?);
        }
        Ok(lookups)
    }

    /// Records that the remote authority has no cutout for `id`.
    ///
    /// Drops any stored payload. Returns `false` without writing if the entry
    /// is already known absent.
    pub async fn mark_absent(&self, id: &WordId) -> Result<bool, CacheError> {
        let key = id.pack()?;
        let _writing = self.writes.lock().await;
        let snapshot = self.backend.read(key).await?;
        if snapshot.exists == Some(false) && snapshot.info.is_none() && snapshot.mask.is_none() {
            return Ok(false);
        }

        let mut batch = WriteBatch::with_capacity(3);
        batch.set_exists(key, false);
        batch.remove(key, RecordSpace::Info);
        batch.remove(key, RecordSpace::Mask);
        self.commit(batch, 1).await?;
        Ok(true)
    }

    /// Handles a delete notification from the remote authority.
    ///
    /// Afterwards [`get_one`](Self::get_one) reports
    /// [`Lookup::KnownAbsent`]. Invalidating twice is a no-op the second time.
    pub async fn invalidate(&self, id: &WordId) -> Result<bool, CacheError> {
        let changed = self.mark_absent(id).await?;
        if changed {
            tracing::debug!(%id, "invalidated cutout");
        }
        Ok(changed)
    }

    /// Drops all local knowledge of `id`, so it reads as [`Lookup::Unknown`].
    pub async fn forget(&self, id: &WordId) -> Result<bool, CacheError> {
        let key = id.pack()?;
        let _writing = self.writes.lock().await;
        if self.backend.read(key).await?.is_vacant() {
            return Ok(false);
        }
        self.remove_all(key).await?;
        Ok(true)
    }

    /// Forgets `key` only if it is still flagged as existing without a full
    /// payload.
    pub(crate) async fn forget_if_inconsistent(&self, key: PackedId) -> Result<bool, CacheError> {
        let _writing = self.writes.lock().await;
        if !is_inconsistent(&self.backend.read(key).await?) {
            return Ok(false);
        }
        self.remove_all(key).await?;
        Ok(true)
    }

    async fn remove_all(&self, key: PackedId) -> Result<(), CacheError> {
        let mut batch = WriteBatch::with_capacity(3);
        for space in RecordSpace::ALL {
            batch.remove(key, space);
        }
        self.commit(batch, 1).await
    }

    /// Finds every identifier flagged as existing without a complete payload.
    pub async fn audit(&self) -> Result<Vec<Inconsistency>, CacheError> {
        let mut found = Vec::new();
        for key in self.backend.keys().await? {
            let snapshot = self.backend.read(key).await?;
            if is_inconsistent(&snapshot) {
                found.push(Inconsistency {
                    key,
                    has_info: snapshot.info.is_some(),
                    has_mask: snapshot.mask.is_some(),
                });
            }
        }
        if !found.is_empty() {
            tracing::warn!(count = found.len(), "audit found inconsistent cutout entries");
        }
        Ok(found)
    }

    /// Forgets every inconsistent entry so it is fetched again.
    ///
    /// Each entry is checked again just before removal; one that was rewritten
    /// since the audit is left alone.
    pub async fn repair(&self) -> Result<usize, CacheError> {
        let mut repaired = 0;
        for inconsistency in self.audit().await? {
            if self.forget_if_inconsistent(inconsistency.key).await? {
                repaired += 1;
            }
        }
        Ok(repaired)
    }
}

impl CutoutCache<FileBackend> {
    /// Rewrites the journal to hold only the current state.
    pub async fn compact(&self) -> Result<(), CacheError> {
        self.backend.compact().await.map_err(CacheError::from)
    }
}
