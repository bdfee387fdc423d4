//! The collection store: single owner of the persisted game list.

mod backend;
mod memory;

pub use backend::{FileBackend, StorageBackend};
pub use memory::MemoryBackend;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    config::AppConfig,
    error::StoreError,
    models::{GamePatch, GameRecord, GameStatus, NewGame},
    seed::seed_records,
    views::sort_newest_first,
};

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "games";

const EVENT_CAPACITY: usize = 64;

/// Change notifications published by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    /// The collection was (re)loaded from storage.
    Loaded {
        /// Number of records now held.
        total: usize,
    },
    /// A record was created.
    Added(GameRecord),
    /// A record was changed.
    Updated(GameRecord),
    /// An update moved a record into [`GameStatus::Completed`].
    Completed(GameRecord),
    /// A record was deleted.
    Removed {
        /// Identifier of the deleted record.
        id: String,
    },
    /// The whole collection was erased.
    Cleared,
}

/// Authoritative access to the persisted collection.
///
/// Every mutation is a full read-modify-write of the stored blob with no
/// locking across the backend round trip. Callers must not issue overlapping
/// mutations; two racing writes can lose one of them (last write wins).
pub struct CollectionStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
    seed_on_first_run: bool,
    snapshot: RwLock<Vec<GameRecord>>,
    events: broadcast::Sender<CollectionEvent>,
}

impl CollectionStore {
    /// Create a store persisting under `key` in `backend`. Seeding is enabled.
    pub fn new(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            key: key.into(),
            seed_on_first_run: true,
            snapshot: RwLock::new(Vec::new()),
            events,
        }
    }

    /// File-backed store configured from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let backend = Arc::new(FileBackend::new(config.data_dir.clone()));
        Self::new(backend, config.storage_key.clone()).with_seeding(config.seed_on_first_run)
    }

    /// Toggle writing the example collection when storage is empty.
    pub fn with_seeding(mut self, enabled: bool) -> Self {
        self.seed_on_first_run = enabled;
        self
    }

    /// Storage key holding the collection.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Receive change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionEvent> {
        self.events.subscribe()
    }

    /// Records as of the last load or mutation.
    pub fn records(&self) -> Vec<GameRecord> {
        self.snapshot.read().clone()
    }

    /// Look up a record in the current snapshot. No storage access.
    pub fn find_by_id(&self, id: &str) -> Option<GameRecord> {
        self.snapshot
            .read()
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    /// Read the collection, seeding it on first run.
    ///
    /// Never fails: backend and decoding errors are logged and yield an
    /// empty collection.
    pub async fn load(&self) -> Vec<GameRecord> {
        let records = match self.backend.get(&self.key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<GameRecord>>(&raw) {
                Ok(records) => records,
                Err(err) => {
                    error!(key = %self.key, ?err, "Stored collection is unreadable");
                    Vec::new()
                }
            },
            Ok(None) if self.seed_on_first_run => {
                let seed = seed_records();
                if let Err(err) = self.persist(&seed).await {
                    warn!(key = %self.key, ?err, "Failed to persist seed collection");
                } else {
                    info!(total = seed.len(), "Seeded empty collection");
                }
                seed
            }
            Ok(None) => Vec::new(),
            Err(err) => {
                error!(key = %self.key, ?err, "Failed to read collection");
                Vec::new()
            }
        };

        self.replace_snapshot(records.clone());
        self.publish(CollectionEvent::Loaded {
            total: records.len(),
        });
        debug!(total = records.len(), "Collection loaded");
        records
    }

    /// Validate `input`, create a record and persist the re-sorted collection.
    pub async fn add(&self, input: NewGame) -> Result<GameRecord, StoreError> {
        input.validate()?;

        let mut records = self.read_collection().await?;
        let now = Utc::now();
        let record = input.into_record(next_id(&records, now), now);
        records.push(record.clone());
        sort_newest_first(&mut records);

        self.persist(&records).await?;
        self.replace_snapshot(records);
        info!(id = %record.id, title = %record.title, "Game added");
        self.publish(CollectionEvent::Added(record.clone()));
        Ok(record)
    }

    /// Merge `patch` into the record with `id` and persist.
    pub async fn update(&self, id: &str, patch: GamePatch) -> Result<GameRecord, StoreError> {
        patch.validate()?;

        let mut records = self.read_collection().await?;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let was_completed = record.status == GameStatus::Completed;
        patch.apply(record, Utc::now());
        let updated = record.clone();

        self.persist(&records).await?;
        self.replace_snapshot(records);
        info!(id = %updated.id, "Game updated");
        self.publish(CollectionEvent::Updated(updated.clone()));
        if !was_completed && updated.status == GameStatus::Completed {
            self.publish(CollectionEvent::Completed(updated.clone()));
        }
        Ok(updated)
    }

    /// Delete the record with `id`. The collection is persisted either way;
    /// returns whether a record was removed.
    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.read_collection().await?;
        let before = records.len();
        records.retain(|record| record.id != id);
        let removed = records.len() != before;

        self.persist(&records).await?;
        self.replace_snapshot(records);
        if removed {
            info!(%id, "Game removed");
            self.publish(CollectionEvent::Removed { id: id.to_string() });
        } else {
            debug!(%id, "Remove matched nothing");
        }
        Ok(removed)
    }

    /// Erase the stored collection. The next `load` seeds again if enabled.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(&self.key).await?;
        self.replace_snapshot(Vec::new());
        info!(key = %self.key, "Collection cleared");
        self.publish(CollectionEvent::Cleared);
        Ok(())
    }

    async fn read_collection(&self) -> Result<Vec<GameRecord>, StoreError> {
        let raw = self.backend.get(&self.key).await.map_err(|err| {
            error!(key = %self.key, ?err, "Failed to read collection");
            StoreError::from(err)
        })?;
        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, records: &[GameRecord]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(records)?;
        self.backend.set(&self.key, &encoded).await.map_err(|err| {
            error!(key = %self.key, ?err, "Failed to write collection");
            StoreError::from(err)
        })
    }

    fn replace_snapshot(&self, records: Vec<GameRecord>) {
        *self.snapshot.write() = records;
    }

    fn publish(&self, event: CollectionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Millisecond timestamp token, bumped past any id already taken.
fn next_id(records: &[GameRecord], now: DateTime<Utc>) -> String {
    let mut candidate = now.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if records.iter().all(|record| record.id != id) {
            return id;
        }
        candidate += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::stats;
    use anyhow::Result;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn memory_store() -> (Arc<MemoryBackend>, CollectionStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = CollectionStore::new(backend.clone(), DEFAULT_STORAGE_KEY);
        (backend, store)
    }

    fn stored(backend: &MemoryBackend) -> Vec<GameRecord> {
        backend
            .raw(DEFAULT_STORAGE_KEY)
            .map(|raw| serde_json::from_str(&raw).unwrap())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn first_load_seeds_and_is_idempotent() {
        let (backend, store) = memory_store();
        let first = store.load().await;
        assert!(!first.is_empty());
        assert_eq!(first, seed_records());
        assert_eq!(stored(&backend), first);

        let second = store.load().await;
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn seeding_can_be_disabled() {
        let backend = Arc::new(MemoryBackend::new());
        let store = CollectionStore::new(backend.clone(), "games").with_seeding(false);
        assert!(store.load().await.is_empty());
        assert_eq!(backend.raw("games"), None);
    }

    #[tokio::test]
    async fn unreadable_blob_loads_empty() {
        let backend = Arc::new(MemoryBackend::with_value("games", "{not json"));
        let store = CollectionStore::new(backend.clone(), "games");
        assert!(store.load().await.is_empty());
        // Nothing is written over the corrupt value.
        assert_eq!(backend.raw("games").as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn backend_read_failure_loads_empty() {
        let (backend, store) = memory_store();
        backend.set_fail_reads(true);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn add_round_trips_through_load() -> Result<()> {
        let (_backend, store) = memory_store();
        store.load().await;

        let input = NewGame {
            title: "Celeste".into(),
            platform: Some("PC".into()),
            status: Some(GameStatus::Completed),
            hours_played: Some(10),
            rating: Some(5),
            cover_image_uri: Some("file:///covers/celeste.jpg".into()),
            notes: Some("B-sides next".into()),
        };
        let created = store.add(input.clone()).await?;

        let loaded = store.load().await;
        let found = loaded
            .iter()
            .find(|record| record.id == created.id)
            .expect("added record persisted");
        assert_eq!(found.title, input.title);
        assert_eq!(found.platform, "PC");
        assert_eq!(found.status, GameStatus::Completed);
        assert_eq!(found.hours_played, 10);
        assert_eq!(found.rating, 5);
        assert_eq!(found.cover_image_uri, input.cover_image_uri);
        assert_eq!(found.notes, "B-sides next");
        // Newest first.
        assert_eq!(loaded[0].id, created.id);
        Ok(())
    }

    #[tokio::test]
    async fn add_then_find_by_id() -> Result<()> {
        let (_backend, store) = memory_store();
        let created = store.add(NewGame::titled("Tunic")).await?;
        assert_eq!(store.find_by_id(&created.id), Some(created));
        Ok(())
    }

    #[tokio::test]
    async fn add_on_empty_backend_does_not_seed() -> Result<()> {
        let (backend, store) = memory_store();
        store.add(NewGame::titled("Tunic")).await?;
        assert_eq!(stored(&backend).len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn ids_stay_unique_for_rapid_adds() -> Result<()> {
        let (_backend, store) = memory_store();
        for n in 0..20 {
            store.add(NewGame::titled(format!("Game {n}"))).await?;
        }
        let records = store.load().await;
        let ids: HashSet<_> = records.iter().map(|record| record.id.clone()).collect();
        assert_eq!(ids.len(), 20);
        Ok(())
    }

    #[tokio::test]
    async fn blank_title_is_rejected_without_writing() {
        let (backend, store) = memory_store();
        let result = store.add(NewGame::titled("  ")).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(backend.raw(DEFAULT_STORAGE_KEY), None);
    }

    #[tokio::test]
    async fn update_merges_fields() -> Result<()> {
        let (_backend, store) = memory_store();
        let created = store
            .add(NewGame {
                title: "Hades".into(),
                platform: Some("PC".into()),
                ..NewGame::default()
            })
            .await?;

        let updated = store
            .update(
                &created.id,
                GamePatch {
                    hours_played: Some(30),
                    rating: Some(4),
                    ..GamePatch::default()
                },
            )
            .await?;
        assert_eq!(updated.hours_played, 30);
        assert_eq!(updated.rating, 4);
        assert_eq!(updated.platform, "PC");
        assert_eq!(updated.title, "Hades");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(store.load().await[0], updated);
        Ok(())
    }

    #[tokio::test]
    async fn update_missing_id_leaves_storage_untouched() {
        let (backend, store) = memory_store();
        store.load().await;
        let before = backend.raw(DEFAULT_STORAGE_KEY);

        let result = store
            .update(
                "missing-id",
                GamePatch {
                    hours_played: Some(1),
                    ..GamePatch::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(id)) if id == "missing-id"));
        assert_eq!(backend.raw(DEFAULT_STORAGE_KEY), before);
    }

    #[tokio::test]
    async fn remove_then_find_is_absent() -> Result<()> {
        let (backend, store) = memory_store();
        let created = store.add(NewGame::titled("Inside")).await?;
        assert!(store.remove(&created.id).await?);
        assert_eq!(store.find_by_id(&created.id), None);
        assert!(stored(&backend).is_empty());

        assert!(!store.remove(&created.id).await?);
        // Persisted even when nothing matched.
        assert_eq!(backend.raw(DEFAULT_STORAGE_KEY).as_deref(), Some("[]"));
        Ok(())
    }

    #[tokio::test]
    async fn write_failures_propagate() {
        let (backend, store) = memory_store();
        store.load().await;
        backend.set_fail_writes(true);

        let result = store.add(NewGame::titled("Braid")).await;
        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert!(store.records().iter().all(|record| record.title != "Braid"));

        let before = store.records();
        let patch = GamePatch {
            hours_played: Some(999),
            ..GamePatch::default()
        };
        assert!(matches!(
            store.update("1", patch).await,
            Err(StoreError::Persistence(_))
        ));
        assert_eq!(store.records(), before);
        assert_eq!(stored(&backend), before);

        assert!(matches!(
            store.remove("1").await,
            Err(StoreError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_blob_is_not_overwritten_by_add() {
        let backend = Arc::new(MemoryBackend::with_value("games", "[{"));
        let store = CollectionStore::new(backend.clone(), "games");
        let result = store.add(NewGame::titled("Braid")).await;
        assert!(matches!(result, Err(StoreError::Codec(_))));
        assert_eq!(backend.raw("games").as_deref(), Some("[{"));
    }

    #[tokio::test]
    async fn events_follow_mutations() -> Result<()> {
        let (_backend, store) = memory_store();
        let mut events = store.subscribe();

        let created = store.add(NewGame::titled("Outer Wilds")).await?;
        store
            .update(
                &created.id,
                GamePatch {
                    status: Some(GameStatus::Completed),
                    ..GamePatch::default()
                },
            )
            .await?;
        store.remove(&created.id).await?;
        store.clear().await?;

        assert!(matches!(events.recv().await?, CollectionEvent::Added(r) if r.id == created.id));
        assert!(matches!(events.recv().await?, CollectionEvent::Updated(_)));
        assert!(
            matches!(events.recv().await?, CollectionEvent::Completed(r) if r.status == GameStatus::Completed)
        );
        assert_eq!(
            events.recv().await?,
            CollectionEvent::Removed {
                id: created.id.clone()
            }
        );
        assert_eq!(events.recv().await?, CollectionEvent::Cleared);
        Ok(())
    }

    #[tokio::test]
    async fn clear_reseeds_on_next_load() -> Result<()> {
        let (backend, store) = memory_store();
        store.add(NewGame::titled("Braid")).await?;
        store.clear().await?;
        assert_eq!(backend.raw(DEFAULT_STORAGE_KEY), None);
        assert!(store.records().is_empty());
        assert_eq!(store.load().await, seed_records());
        Ok(())
    }

    #[tokio::test]
    async fn stats_over_loaded_collection() -> Result<()> {
        let backend = Arc::new(MemoryBackend::new());
        let store = CollectionStore::new(backend, "games").with_seeding(false);
        for (title, hours) in [("A", 10), ("B", 0), ("C", 85)] {
            store
                .add(NewGame {
                    title: title.into(),
                    hours_played: Some(hours),
                    ..NewGame::default()
                })
                .await?;
        }
        assert_eq!(stats(&store.load().await).total_hours, 95);
        Ok(())
    }

    #[tokio::test]
    async fn file_backed_collection_survives_restart() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            seed_on_first_run: false,
            ..AppConfig::default()
        };

        let store = CollectionStore::from_config(&config);
        let added = store.add(NewGame::titled("Outer Wilds")).await?;
        assert!(dir.path().join("games.json").exists());

        let reopened = CollectionStore::from_config(&config);
        let records = reopened.load().await;
        assert_eq!(records, vec![added.clone()]);
        assert_eq!(reopened.find_by_id(&added.id), Some(added));
        Ok(())
    }

    /// Two interleaved adds each read the same snapshot, so the later write
    /// drops the other's record. This is a known limitation, not a guarantee.
    #[tokio::test]
    async fn concurrent_adds_can_lose_a_write() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_yield_after_read(true);
        let first = CollectionStore::new(backend.clone(), "games");
        let second = CollectionStore::new(backend.clone(), "games");

        let (a, b) = tokio::join!(
            first.add(NewGame::titled("Left")),
            second.add(NewGame::titled("Right"))
        );
        assert!(a.is_ok() && b.is_ok());

        let titles: Vec<String> = stored(&backend)
            .into_iter()
            .map(|record| record.title)
            .collect();
        assert_eq!(titles.len(), 1, "one write is lost: {titles:?}");
    }

    #[test]
    fn next_id_skips_taken_ids() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let taken = NewGame::titled("x").into_record("1700000000000".into(), now);
        assert_eq!(next_id(&[taken], now), "1700000000001");
        assert_eq!(next_id(&[], now), "1700000000000");
    }
}
