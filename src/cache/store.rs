//! CacheStore: shared read-through cache of relations per knowledge-base id

use super::log::RelationLog;
use super::CacheResult;
use crate::model::{KbId, Relation};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct CacheState {
    cached: HashMap<KbId, Vec<Relation>>,
    /// Every relation in `cached`, for deduplication by full triple
    known: HashSet<Relation>,
    /// Relations not yet written to the log
    pending: Vec<Relation>,
}

impl CacheState {
    fn add(&mut self, relation: Relation) -> bool {
        if !self.known.insert(relation.clone()) {
            return false;
        }
        self.cached
            .entry(relation.source.clone())
            .or_default()
            .push(relation);
        true
    }
}

/// Process-wide relation cache shared by every worker.
///
/// Two independent locks:
/// - the state lock guards the in-memory map and the pending buffer;
/// - the log lock guards file access.
///
/// `flush` drains the pending buffer under the state lock and writes it
/// under the log lock only, so lookups and inserts proceed while the disk
/// write is in progress. The log is read on first access, exactly once,
/// even under concurrent first use.
#[derive(Debug)]
pub struct CacheStore {
    log: Option<Mutex<RelationLog>>,
    state: OnceLock<Mutex<CacheState>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CacheStore {
    /// Cache backed by the log at `path`. Nothing is read until first use.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            log: Some(Mutex::new(RelationLog::new(path.as_ref()))),
            state: OnceLock::new(),
        }
    }

    /// Cache without a persisted log; flushing is a no-op.
    pub fn in_memory() -> Self {
        Self {
            log: None,
            state: OnceLock::new(),
        }
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.get().is_some()
    }

    fn state(&self) -> &Mutex<CacheState> {
        self.state.get_or_init(|| Mutex::new(self.load()))
    }

    /// Read the log now instead of on first use.
    pub fn hydrate(&self) {
        self.state();
    }

    /// [`CacheStore::hydrate`] on the blocking pool.
    pub async fn hydrate_async(self: &Arc<Self>) -> CacheResult<()> {
        if self.is_hydrated() {
            return Ok(());
        }
        let cache = Arc::clone(self);
        tokio::task::spawn_blocking(move || cache.hydrate()).await?;
        Ok(())
    }

    fn load(&self) -> CacheState {
        let mut state = CacheState::default();
        let Some(log) = &self.log else {
            return state;
        };

        let log = lock(log);
        match log.read_all() {
            Ok(relations) => {
                let total = relations.len();
                for relation in relations {
                    state.add(relation);
                }
                info!(
                    path = %log.path().display(),
                    relations = state.known.len(),
                    duplicates = total - state.known.len(),
                    entities = state.cached.len(),
                    "Hydrated relation cache"
                );
            }
            Err(e) => {
                warn!(path = %log.path().display(), error = %e, "Could not read relation cache; starting empty");
            }
        }
        state
    }

    /// Relations known for each of `ids`. Ids without cached relations are
    /// absent from the result.
    pub fn lookup<'a, I>(&self, ids: I) -> HashMap<KbId, Vec<Relation>>
    where
        I: IntoIterator<Item = &'a KbId>,
    {
        let state = lock(self.state());
        ids.into_iter()
            .filter_map(|id| state.cached.get(id).map(|rels| (id.clone(), rels.clone())))
            .collect()
    }

    /// Add relations not already cached. Returns how many were new.
    pub fn insert(&self, relations: &[Relation]) -> usize {
        let persistent = self.log.is_some();
        let mut state = lock(self.state());
        let mut added = 0;
        for relation in relations {
            if state.add(relation.clone()) {
                if persistent {
                    state.pending.push(relation.clone());
                }
                added += 1;
            }
        }
        added
    }

    /// Write pending relations to the log. Returns how many were written.
    ///
    /// On failure the drained relations go back to the pending buffer and
    /// are retried by the next flush.
    pub fn flush(&self) -> CacheResult<usize> {
        let Some(log) = &self.log else {
            return Ok(0);
        };

        let drained = std::mem::take(&mut lock(self.state()).pending);
        if drained.is_empty() {
            return Ok(0);
        }

        let written = lock(log).append(&drained);
        match written {
            Ok(()) => {
                debug!(relations = drained.len(), "Flushed relation cache");
                Ok(drained.len())
            }
            Err(e) => {
                let mut state = lock(self.state());
                let mut restored = drained;
                restored.append(&mut state.pending);
                state.pending = restored;
                Err(e)
            }
        }
    }

    /// [`CacheStore::flush`] on the blocking pool, so a slow disk stalls
    /// neither the runtime threads nor cache reads from other tasks.
    pub async fn flush_async(self: &Arc<Self>) -> CacheResult<usize> {
        let cache = Arc::clone(self);
        tokio::task::spawn_blocking(move || cache.flush()).await?
    }

    #[cfg(test)]
    pub(crate) fn lock_log(&self) -> Option<MutexGuard<'_, RelationLog>> {
        self.log.as_ref().map(lock)
    }

    /// Relations awaiting a flush
    pub fn pending_len(&self) -> usize {
        lock(self.state()).pending.len()
    }

    /// Number of knowledge-base ids with cached relations
    pub fn len(&self) -> usize {
        lock(self.state()).cached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    fn ids(raw: &[&str]) -> Vec<KbId> {
        raw.iter().map(|id| KbId::new(*id)).collect()
    }

    #[test]
    fn open_does_not_read_until_first_access() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path().join("cache.csv"));
        assert!(!store.is_hydrated());

        store.lookup(&ids(&["Q1"]));
        assert!(store.is_hydrated());
    }

    #[test]
    fn lookup_returns_only_present_ids() {
        let store = CacheStore::in_memory();
        store.insert(&[
            Relation::new("Q1", "occupation", "writer"),
            Relation::new("Q1", "country", "Germany"),
        ]);

        let found = store.lookup(&ids(&["Q1", "Q2"]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[&KbId::new("Q1")].len(), 2);
    }

    #[test]
    fn insert_deduplicates_by_full_triple() {
        let store = CacheStore::in_memory();
        let relation = Relation::new("Q1", "occupation", "writer");

        assert_eq!(store.insert(&[relation.clone(), relation.clone()]), 1);
        assert_eq!(store.insert(&[relation]), 0);
        assert_eq!(store.lookup(&ids(&["Q1"]))[&KbId::new("Q1")].len(), 1);
    }

    #[test]
    fn in_memory_store_never_has_pending() {
        let store = CacheStore::in_memory();
        store.insert(&[Relation::new("Q1", "occupation", "writer")]);
        assert_eq!(store.pending_len(), 0);
        assert_eq!(store.flush().unwrap(), 0);
    }

    #[test]
    fn flush_then_rehydrate_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.csv");
        let relations = vec![
            Relation::new("Q1", "occupation", "writer"),
            Relation::new("Q1", "country", "Germany"),
            Relation::new("Q2", "occupation", "poet"),
        ];

        let store = CacheStore::open(&path);
        store.insert(&relations);
        assert_eq!(store.flush().unwrap(), 3);
        assert_eq!(store.pending_len(), 0);

        let first = CacheStore::open(&path).lookup(&ids(&["Q1", "Q2"]));
        let second = CacheStore::open(&path).lookup(&ids(&["Q1", "Q2"]));
        assert_eq!(first, second);
        for relation in &relations {
            assert!(first[&relation.source].contains(relation));
        }
    }

    #[test]
    fn hydrated_entries_are_not_flushed_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.csv");

        let store = CacheStore::open(&path);
        store.insert(&[Relation::new("Q1", "occupation", "writer")]);
        store.flush().unwrap();

        let reopened = CacheStore::open(&path);
        assert_eq!(reopened.insert(&[Relation::new("Q1", "occupation", "writer")]), 0);
        assert_eq!(reopened.flush().unwrap(), 0);
    }

    #[test]
    fn unreadable_log_hydrates_empty() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the log file should be cannot be read as CSV
        let path = dir.path().join("cache.csv");
        fs::create_dir(&path).unwrap();

        let store = CacheStore::open(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn failed_flush_keeps_pending_relations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.csv");
        fs::create_dir(&path).unwrap();

        let store = CacheStore::open(&path);
        store.insert(&[
            Relation::new("Q1", "occupation", "writer"),
            Relation::new("Q2", "occupation", "poet"),
        ]);

        assert!(store.flush().is_err());
        assert_eq!(store.pending_len(), 2);
        // Still served from memory
        assert_eq!(store.len(), 2);

        fs::remove_dir(&path).unwrap();
        assert_eq!(store.flush().unwrap(), 2);
        assert_eq!(CacheStore::open(&path).len(), 2);
    }

    #[test]
    fn concurrent_first_access_hydrates_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.csv");
        fs::write(&path, "source,name,target\nQ1,occupation,writer\n").unwrap();

        let store = Arc::new(CacheStore::open(&path));
        std::thread::scope(|scope| {
            for i in 0..8 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    store.insert(&[Relation::new(format!("Q{}", 100 + i), "occupation", "writer")]);
                    assert!(store.lookup(&ids(&["Q1"])).contains_key(&KbId::new("Q1")));
                });
            }
        });

        assert_eq!(store.len(), 9);
        assert_eq!(store.pending_len(), 8);
    }
}
