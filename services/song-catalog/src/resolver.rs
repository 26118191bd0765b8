//!
//! src/resolver.rs  Andrew Belles  Oct 19th, 2026
//!
//! Find-or-enrich: returns the catalog entry for a (group, song) pair,
//! creating it from the external provider the first time it is asked for
//!

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info};

use crate::errors::CatalogError;
use crate::fetch::DetailProvider;
use crate::persistent::SongStore;
use crate::types::{NewSong, Song, SongKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Found(Song),
    Created(Song)
}

impl Resolved {
    pub fn into_song(self) -> Song {
        match self {
            Resolved::Found(song) | Resolved::Created(song) => song
        }
    }
}

///
/// One async mutex per key currently being resolved. Entries are removed
/// by the last holder, and any left behind by an abandoned waiter are
/// swept on the next acquire
///
#[derive(Debug, Default)]
struct KeyLocks {
    locks: Mutex<HashMap<SongKey, Arc<tokio::sync::Mutex<()>>>>
}

struct KeyGuard<'a> {
    owner: &'a KeyLocks,
    key: SongKey,
    guard: Option<OwnedMutexGuard<()>>
}

impl KeyLocks {
    async fn acquire(&self, key: &SongKey) -> KeyGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        KeyGuard { owner: self, key: key.clone(), guard: Some(guard) }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.owner.locks.lock().unwrap_or_else(|e| e.into_inner());
        // only the map still points at it: nobody is waiting
        if locks.get(&self.key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&self.key);
        }
    }
}

pub struct Resolver {
    store: Arc<dyn SongStore>,
    provider: Arc<dyn DetailProvider>,
    inflight: KeyLocks
}

impl Resolver {
    pub fn new(store: Arc<dyn SongStore>, provider: Arc<dyn DetailProvider>) -> Self {
        Self { store, provider, inflight: KeyLocks::default() }
    }

    async fn lookup(&self, key: &SongKey) -> Result<Option<Song>, CatalogError> {
        self.store.find_by_group_and_title(key.group(), key.title()).await
    }

    /// Stored song for `key`, or a new one built from provider details.
    /// Concurrent calls for one key wait on each other so the provider is
    /// asked at most once and a single row is written
    #[tracing::instrument(skip(self, key), fields(key = %key))]
    pub async fn resolve(&self, key: &SongKey) -> Result<Resolved, CatalogError> {
        if let Some(song) = self.lookup(key).await? {
            info!(id = %song.id, "song.resolve.hit");
            return Ok(Resolved::Found(song));
        }

        let _guard = self.inflight.acquire(key).await;
        if let Some(song) = self.lookup(key).await? {
            debug!(id = %song.id, "song.resolve.joined");
            return Ok(Resolved::Found(song));
        }

        info!("song.resolve.miss");
        let detail = self.provider.lookup(key).await?;

        let inserted = self.store.try_insert(&NewSong::from_detail(key, detail))
            .await
            .map_err(|e| {
                error!(error = %e, "song.resolve.persist_failed");
                CatalogError::Rejected(format!("failed to add {key}: {e}"))
            })?;

        match inserted {
            Some(song) => {
                info!(id = %song.id, "song.resolve.enriched");
                Ok(Resolved::Created(song))
            }
            None => {
                // written by another process between our lookup and insert
                let song = self.lookup(key).await?.ok_or_else(|| {
                    CatalogError::Rejected(format!("failed to add {key}: row vanished"))
                })?;
                debug!(id = %song.id, "song.resolve.raced");
                Ok(Resolved::Found(song))
            }
        }
    }
}
