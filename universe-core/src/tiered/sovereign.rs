//! Sovereign tier (spec §4.G.1): the real canonical source.
//!
//! Modeled as `SovereignResult` rather than exceptions-for-control-flow (§9
//! Design Notes), so an empty registry is a distinct, matchable case from a
//! transport error instead of the source's `FileNotFoundError`-as-signal.

use async_trait::async_trait;

use crate::asset::UniverseAsset;
use crate::error::CoreError;

#[async_trait]
pub trait SovereignSource: Send + Sync {
    /// Read up to `limit` canonical assets ordered by `(render_priority, id)`.
    async fn fetch(&self, limit: usize) -> Result<Vec<UniverseAsset>, CoreError>;
}

#[derive(Debug)]
pub enum SovereignResult {
    Ok(Vec<UniverseAsset>),
    Empty,
    TimedOut,
    Err(CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Governance, Sector};

    struct AlwaysEmpty;

    #[async_trait]
    impl SovereignSource for AlwaysEmpty {
        async fn fetch(&self, _limit: usize) -> Result<Vec<UniverseAsset>, CoreError> {
            Ok(Vec::new())
        }
    }

    struct AlwaysOne;

    #[async_trait]
    impl SovereignSource for AlwaysOne {
        async fn fetch(&self, _limit: usize) -> Result<Vec<UniverseAsset>, CoreError> {
            Ok(vec![UniverseAsset {
                symbol: "AAA".into(),
                taxonomy32: 1,
                meta32: 1,
                fidelity: 0.9,
                governance: Governance::Sanctioned,
                x: 0.1,
                y: 0.2,
                z: 0.3,
                render_priority: 1,
                cluster_id: None,
                liquidity_tier: 2,
                sector: Sector::Tech,
                name: "Acme".into(),
            }])
        }
    }

    #[tokio::test]
    async fn empty_registry_is_distinguishable_from_a_populated_one() {
        assert!(AlwaysEmpty.fetch(10).await.unwrap().is_empty());
        assert!(!AlwaysOne.fetch(10).await.unwrap().is_empty());
    }
}
