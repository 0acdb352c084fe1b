//! Ingest surface (spec's Supplement to §1): a pluggable price source feeding
//! the tick engine, grounded on `engines/technical/*`'s pluggable-provider
//! shape (CoinGecko/FRED/yfinance in the original) reduced to a trait plus
//! one in-process implementation. Live network providers stay out of scope.

use crate::engine::PriceUpdate;

/// A source of price/volume updates for one tick. Implementations decide
/// their own batching; the tick engine only needs `next_batch` to return
/// whatever is ready right now.
pub trait PriceProvider: Send + Sync {
    fn next_batch(&mut self) -> Vec<PriceUpdate>;
}

/// In-process provider backed by a caller-supplied queue, enough to exercise
/// the tick engine end to end in tests without a live network integration.
#[derive(Debug, Default)]
pub struct StaticPriceProvider {
    queued: Vec<PriceUpdate>,
}

impl StaticPriceProvider {
    pub fn new(updates: Vec<PriceUpdate>) -> Self {
        Self { queued: updates }
    }

    pub fn push(&mut self, update: PriceUpdate) {
        self.queued.push(update);
    }
}

impl PriceProvider for StaticPriceProvider {
    /// Drains everything queued so far; callers control batching by how
    /// often they call `next_batch` and how much they `push` between calls.
    fn next_batch(&mut self) -> Vec<PriceUpdate> {
        std::mem::take(&mut self.queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_everything_queued_since_the_last_batch() {
        let mut provider = StaticPriceProvider::new(vec![]);
        provider.push(PriceUpdate { symbol: "AAA".into(), price: 1.0, volume: Some(10.0) });
        provider.push(PriceUpdate { symbol: "BBB".into(), price: 2.0, volume: Some(20.0) });
        let batch = provider.next_batch();
        assert_eq!(batch.len(), 2);
        assert!(provider.next_batch().is_empty());
    }

    #[test]
    fn an_empty_provider_yields_empty_batches() {
        let mut provider = StaticPriceProvider::new(vec![]);
        assert!(provider.next_batch().is_empty());
    }
}
