//! Analysis contexts, one per reference set.
//!
//! A context is built at most once per [`ReferenceSet`] key: the first caller
//! builds it on a blocking thread while later callers for the same key await
//! the same slot. Entries are kept in LRU order and the least recently used
//! one is dropped once `capacity` is exceeded. Requests already holding a
//! context keep it alive through their `Arc`.

pub mod error;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::{AnalysisContext, AnalysisEngine, EngineError};

pub use error::{CacheError, CacheResult};

/// A canonical, order-insensitive set of reference identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceSet {
    references: Vec<String>,
    key: String,
}

impl ReferenceSet {
    /// Trimmed, deduplicated and sorted. Blank identifiers are dropped.
    pub fn new<I, S>(references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut references: Vec<String> = references
            .into_iter()
            .map(|r| r.as_ref().trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        references.sort();
        references.dedup();
        let key = references.join(";");
        Self { references, key }
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Cache key; equal for any permutation of the same identifiers.
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Maximum number of cached contexts; `0` means unbounded.
    pub capacity: usize,
    /// Reference load failures tolerated before a key fails to build.
    pub max_reference_failures: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            capacity: 32,
            max_reference_failures: 4,
        }
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    evictions: AtomicU64,
}

type Slot = Arc<OnceCell<CacheResult<Arc<dyn AnalysisContext>>>>;

pub struct ContextCache {
    engine: Arc<dyn AnalysisEngine>,
    options: CacheOptions,
    /// Slots in LRU order, most recent last. Held only for lookup and insert.
    slots: Mutex<IndexMap<String, Slot>>,
    /// Set once the host fails to start.
    host_failure: OnceLock<String>,
    counters: Counters,
}

impl ContextCache {
    pub fn new(engine: Arc<dyn AnalysisEngine>, options: CacheOptions) -> Self {
        Self {
            engine,
            options,
            slots: Mutex::new(IndexMap::new()),
            host_failure: OnceLock::new(),
            counters: Counters::default(),
        }
    }

    pub fn engine(&self) -> &Arc<dyn AnalysisEngine> {
        &self.engine
    }

    /// The context for `references`, building it on first use.
    ///
    /// A cancelled build leaves the slot empty so the next caller retries;
    /// any other failure is remembered for the key.
    pub async fn get_or_create(
        &self,
        references: &ReferenceSet,
        cancel: &CancellationToken,
    ) -> CacheResult<Arc<dyn AnalysisContext>> {
        if let Some(reason) = self.host_failure.get() {
            return Err(CacheError::HostUnavailable(reason.clone()));
        }

        let slot = self.slot(references.key());
        let outcome = slot
            .get_or_try_init(|| async {
                match self.build(references, cancel).await {
                    Err(CacheError::Cancelled) => Err(CacheError::Cancelled),
                    other => Ok(other),
                }
            })
            .await?;
        outcome.clone()
    }

    /// Find or insert the slot for `key`, marking it most recently used.
    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock();
        if let Some(index) = slots.get_index_of(key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            let last = slots.len() - 1;
            slots.move_index(index, last);
            return Arc::clone(&slots[last]);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let slot: Slot = Arc::new(OnceCell::new());
        slots.insert(key.to_string(), Arc::clone(&slot));
        while self.options.capacity > 0 && slots.len() > self.options.capacity {
            if let Some((evicted, _)) = slots.shift_remove_index(0) {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %evicted, "context evicted");
            }
        }
        slot
    }

    async fn build(
        &self,
        references: &ReferenceSet,
        cancel: &CancellationToken,
    ) -> CacheResult<Arc<dyn AnalysisContext>> {
        let key = references.key().to_string();
        let started = Instant::now();
        let engine = Arc::clone(&self.engine);
        let refs = references.references().to_vec();
        let token = cancel.clone();
        let joined =
            tokio::task::spawn_blocking(move || engine.create_context(&refs, &token)).await;

        let build = match joined {
            Ok(Ok(build)) => build,
            Ok(Err(EngineError::Cancelled)) => return Err(CacheError::Cancelled),
            Ok(Err(EngineError::HostInit(reason))) => {
                error!(%reason, "analysis host failed to start");
                let reason = self.host_failure.get_or_init(|| reason).clone();
                return Err(CacheError::HostUnavailable(reason));
            }
            Ok(Err(e)) => {
                return Err(CacheError::Construction {
                    key,
                    reason: e.to_string(),
                })
            }
            Err(join) => {
                return Err(CacheError::Construction {
                    key,
                    reason: format!("context build panicked: {join}"),
                })
            }
        };

        for (reference, reason) in &build.failed_references {
            warn!(%reference, %reason, "reference skipped");
        }
        let failed = build.failed_references.len();
        if failed > self.options.max_reference_failures {
            return Err(CacheError::Construction {
                key,
                reason: format!(
                    "{failed} of {} references failed to load",
                    references.references().len()
                ),
            });
        }

        self.counters.builds.fetch_add(1, Ordering::Relaxed);
        info!(
            key = %key,
            skipped = failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "context built"
        );
        Ok(build.context)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.slots.lock().len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            builds: self.counters.builds.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// Drop every cached context. A host failure stays in effect.
    pub fn reset(&self) -> usize {
        let mut slots = self.slots.lock();
        let dropped = slots.len();
        slots.clear();
        info!(dropped, "context cache reset");
        dropped
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::engine::{Compilation, ContextBuild, EngineResult, OutputKind};

    struct FakeContext(Vec<String>);

    impl AnalysisContext for FakeContext {
        fn references(&self) -> Vec<String> {
            self.0.clone()
        }

        fn compile(
            &self,
            _source: &str,
            _output: OutputKind,
            _cancel: &CancellationToken,
        ) -> EngineResult<Compilation> {
            Err(EngineError::internal("not used"))
        }
    }

    #[derive(Default)]
    struct FakeEngine {
        builds: AtomicUsize,
        host_broken: bool,
        missing: Vec<String>,
    }

    impl AnalysisEngine for FakeEngine {
        fn language_id(&self) -> &'static str {
            "fake"
        }

        fn create_context(
            &self,
            references: &[String],
            _cancel: &CancellationToken,
        ) -> EngineResult<ContextBuild> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if self.host_broken {
                return Err(EngineError::HostInit("grammar mismatch".into()));
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
            let (missing, loaded): (Vec<_>, Vec<_>) = references
                .iter()
                .cloned()
                .partition(|r| self.missing.contains(r));
            Ok(ContextBuild {
                context: Arc::new(FakeContext(loaded)),
                failed_references: missing.into_iter().map(|r| (r, "not found".into())).collect(),
            })
        }
    }

    fn cache(engine: FakeEngine, capacity: usize) -> (Arc<FakeEngine>, ContextCache) {
        let engine = Arc::new(engine);
        let cache = ContextCache::new(
            engine.clone(),
            CacheOptions {
                capacity,
                max_reference_failures: 1,
            },
        );
        (engine, cache)
    }

    #[test]
    fn reference_set_is_order_insensitive() {
        let a = ReferenceSet::new(["b.rs", "a.rs", "b.rs"]);
        let b = ReferenceSet::new([" a.rs", "b.rs", ""]);
        assert_eq!(a.key(), "a.rs;b.rs");
        assert_eq!(a, b);
        assert_eq!(ReferenceSet::new(Vec::<String>::new()).key(), "");
    }

    #[tokio::test]
    async fn permutations_share_one_context() {
        let (engine, cache) = cache(FakeEngine::default(), 8);
        let cancel = CancellationToken::new();
        let first = cache
            .get_or_create(&ReferenceSet::new(["x", "y"]), &cancel)
            .await
            .unwrap();
        let second = cache
            .get_or_create(&ReferenceSet::new(["y", "x"]), &cancel)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.builds.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.builds), (1, 1, 1));
    }

    #[tokio::test]
    async fn concurrent_first_access_builds_once() {
        let (engine, cache) = cache(FakeEngine::default(), 8);
        let cache = Arc::new(cache);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_create(&ReferenceSet::new(["shared"]), &CancellationToken::new())
                    .await
                    .unwrap()
            }));
        }
        let mut contexts = Vec::new();
        for h in handles {
            contexts.push(h.await.unwrap());
        }
        assert_eq!(engine.builds.load(Ordering::SeqCst), 1);
        assert!(contexts.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn tolerated_reference_failures_are_skipped() {
        let engine = FakeEngine {
            missing: vec!["gone".into(), "lost".into()],
            ..Default::default()
        };
        let (_, cache) = cache(engine, 8);
        let cancel = CancellationToken::new();
        let ctx = cache
            .get_or_create(&ReferenceSet::new(["gone", "ok"]), &cancel)
            .await
            .unwrap();
        assert_eq!(ctx.references(), vec!["ok".to_string()]);

        // Two failures exceed the limit of one, and the failure sticks to the key.
        let key = ReferenceSet::new(["gone", "lost", "ok"]);
        let err = cache.get_or_create(&key, &cancel).await.err().unwrap();
        assert!(matches!(err, CacheError::Construction { .. }));
        let again = cache.get_or_create(&key, &cancel).await.err().unwrap();
        assert_eq!(err, again);
        assert_eq!(cache.stats().builds, 1);
    }

    #[tokio::test]
    async fn host_failure_poisons_every_key() {
        let engine = FakeEngine {
            host_broken: true,
            ..Default::default()
        };
        let (engine, cache) = cache(engine, 8);
        let cancel = CancellationToken::new();
        let err = cache
            .get_or_create(&ReferenceSet::new(["a"]), &cancel)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CacheError::HostUnavailable(_)));
        let other = cache
            .get_or_create(&ReferenceSet::new(["b"]), &cancel)
            .await
            .err()
            .unwrap();
        assert!(matches!(other, CacheError::HostUnavailable(_)));
        assert_eq!(engine.builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_build_is_not_cached() {
        let (_, cache) = cache(FakeEngine::default(), 8);
        let key = ReferenceSet::new(["a"]);
        let cancelled = CancellationToken::new();
        cancelled.cancel();
        // The fake ignores the token, so cancel through an engine error instead.
        struct Cancelling;
        impl AnalysisEngine for Cancelling {
            fn language_id(&self) -> &'static str {
                "fake"
            }
            fn create_context(
                &self,
                _references: &[String],
                _cancel: &CancellationToken,
            ) -> EngineResult<ContextBuild> {
                Err(EngineError::Cancelled)
            }
        }
        let cancelling = ContextCache::new(Arc::new(Cancelling), CacheOptions::default());
        let err = cancelling.get_or_create(&key, &cancelled).await.err().unwrap();
        assert_eq!(err, CacheError::Cancelled);
        assert!(cancelling.slots.lock()[0].get().is_none());

        assert!(cache.get_or_create(&key, &CancellationToken::new()).await.is_ok());
    }

    #[tokio::test]
    async fn lru_evicts_least_recently_used() {
        let (engine, cache) = cache(FakeEngine::default(), 2);
        let cancel = CancellationToken::new();
        for key in ["a", "b", "a", "c"] {
            cache
                .get_or_create(&ReferenceSet::new([key]), &cancel)
                .await
                .unwrap();
        }
        // "b" was least recently used when "c" arrived.
        let keys: Vec<String> = cache.slots.lock().keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(cache.stats().evictions, 1);

        cache.get_or_create(&ReferenceSet::new(["b"]), &cancel).await.unwrap();
        assert_eq!(engine.builds.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn reset_drops_entries() {
        let (engine, cache) = cache(FakeEngine::default(), 0);
        let cancel = CancellationToken::new();
        let key = ReferenceSet::new(["a"]);
        cache.get_or_create(&key, &cancel).await.unwrap();
        assert_eq!(cache.reset(), 1);
        assert_eq!(cache.stats().entries, 0);
        cache.get_or_create(&key, &cancel).await.unwrap();
        assert_eq!(engine.builds.load(Ordering::SeqCst), 2);
    }
}
