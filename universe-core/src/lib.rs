//! Universe materialization and streaming core (spec §2): bit codecs, the
//! VoidPool slot recycler, per-slot analytics, the tick engine, the snapshot
//! store, the materialization pipeline, the tiered snapshot builder, the
//! delta streaming protocol, and the snapshot encoder.
//!
//! Everything mutable lives behind one explicit [`Engine`] value rather than
//! module-level statics (§9 Design Notes), so a process can host more than
//! one universe (tests, multiple regions) without sharing state by accident.

pub mod analytics;
pub mod asset;
pub mod codec;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod materializer;
pub mod pool;
pub mod store;
pub mod stream;
pub mod tiered;

use std::sync::atomic::{AtomicBool, Ordering};

use asset::Snapshot;
use engine::{PriceUpdate, TickEngine};
use error::CoreResult;
use pool::VoidPool;
use store::SnapshotStore;
use tiered::TieredBuilder;

/// Owns the detectors, the snapshot store, and (optionally) the VoidPool
/// slot recycler for one universe. Constructed once per process (or once per
/// test) and handed to the HTTP layer as shared state.
pub struct Engine {
    pub store: SnapshotStore,
    pub tick_engine: TickEngine,
    pub builder: TieredBuilder,
    pub void_pool: Option<VoidPool>,
    void_pool_enabled: AtomicBool,
}

impl Engine {
    pub fn new(capacity_hint: usize, builder: TieredBuilder, enable_void_pool: bool) -> Self {
        let void_pool = enable_void_pool.then(|| VoidPool::new(capacity_hint.max(1)));
        Self {
            store: SnapshotStore::new(),
            tick_engine: TickEngine::new(capacity_hint),
            builder,
            void_pool,
            void_pool_enabled: AtomicBool::new(enable_void_pool),
        }
    }

    pub fn void_pool_enabled(&self) -> bool {
        self.void_pool_enabled.load(Ordering::Relaxed)
    }

    /// Drive one tick of price updates through the analytics engine and
    /// patch the snapshot store.
    pub fn run_tick(&self, updates: impl IntoIterator<Item = PriceUpdate>) -> CoreResult<Vec<usize>> {
        self.tick_engine.enqueue(updates);
        self.tick_engine.run_tick(&self.store)
    }

    /// Build a fresh snapshot via the Sovereign/Ambassador/Sentinel fallback
    /// chain, without touching `self.store` (materialization is a separate,
    /// explicit step triggered by the caller per §4.F).
    pub async fn build_snapshot(&self, limit: usize) -> CoreResult<Snapshot> {
        self.builder.build_snapshot(limit).await
    }
}
