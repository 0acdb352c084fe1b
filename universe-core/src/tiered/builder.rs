//! Tiered snapshot builder (spec §4.G): Sovereign → Ambassador → Sentinel
//! fallback behind a 300 ms circuit breaker, with `last`-snapshot state
//! preservation (P10, P11).

use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::time::timeout;

use crate::asset::{Sector, Snapshot, Tier, UniverseAsset};
use crate::codec::{morton63_salted, morton63_to_u32, unpack_taxonomy32, Vertex28};
use crate::error::CoreResult;
use crate::materializer::derive::stable_hash;
use crate::tiered::ambassador;
use crate::tiered::breaker::CircuitBreaker;
use crate::tiered::sentinel;
use crate::tiered::sovereign::SovereignSource;

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(300);

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Vertex28's first word is the truncated salted Morton code, consistent
/// with the materializer's staging output and the Open Questions
/// resolution, not `taxonomy32` directly.
fn asset_to_vertex(asset: &UniverseAsset) -> CoreResult<Vertex28> {
    let salt = stable_hash(asset.symbol.as_bytes());
    let morton = morton63_salted(asset.x as f64, asset.y as f64, asset.z as f64, salt);
    let morton_u32 = morton63_to_u32(morton);
    let risk_tier = unpack_taxonomy32(asset.taxonomy32).risk_tier;
    let parity = (asset.taxonomy32.count_ones() % 2) as f32;
    let spin = parity * (risk_tier as f32 / 7.0);
    Vertex28::new(morton_u32, asset.meta32, asset.x, asset.y, asset.z, asset.fidelity, spin)
}

fn finalize(assets: Vec<UniverseAsset>, tier: Tier) -> CoreResult<Snapshot> {
    let mut bytes = Vec::with_capacity(assets.len() * 28);
    for asset in &assets {
        bytes.extend_from_slice(&asset_to_vertex(asset)?.to_bytes());
    }
    Ok(Snapshot { ts_ms: now_ms(), assets, vertex_bytes: Bytes::from(bytes), tier })
}

pub struct TieredBuilder {
    sovereign: Box<dyn SovereignSource>,
    breaker: CircuitBreaker,
    deadline: Duration,
    ambassador_seed: u64,
    last: Mutex<Option<Snapshot>>,
}

impl TieredBuilder {
    pub fn new(sovereign: Box<dyn SovereignSource>, ambassador_seed: u64) -> Self {
        Self::with_params(
            sovereign,
            ambassador_seed,
            DEFAULT_FAILURE_THRESHOLD,
            DEFAULT_RESET_TIMEOUT,
            DEFAULT_DEADLINE,
        )
    }

    pub fn with_params(
        sovereign: Box<dyn SovereignSource>,
        ambassador_seed: u64,
        failure_threshold: u32,
        reset_timeout: Duration,
        deadline: Duration,
    ) -> Self {
        Self {
            sovereign,
            breaker: CircuitBreaker::new(failure_threshold, reset_timeout),
            deadline,
            ambassador_seed,
            last: Mutex::new(None),
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        self.breaker.is_open()
    }

    pub fn last_snapshot(&self) -> Option<Snapshot> {
        self.last.lock().unwrap().clone()
    }

    /// Build a snapshot for up to `limit` assets, trying Sovereign first,
    /// Ambassador on any Sovereign failure/timeout/empty/open-circuit, and
    /// Sentinel only when `limit == 0` makes Ambassador synthesis
    /// meaningless.
    pub async fn build_snapshot(&self, limit: usize) -> CoreResult<Snapshot> {
        if limit == 0 {
            let snap = finalize(sentinel::synthesize(), Tier::Sentinel)?;
            self.preserve_if_first(&snap);
            return Ok(snap);
        }

        if self.breaker.try_acquire() {
            match timeout(self.deadline, self.sovereign.fetch(limit)).await {
                Ok(Ok(assets)) if !assets.is_empty() => {
                    self.breaker.record_success();
                    let snap = finalize(assets, Tier::Sovereign)?;
                    *self.last.lock().unwrap() = Some(snap.clone());
                    return Ok(snap);
                }
                Ok(Ok(_empty)) => {
                    // "404"-equivalent: fall through without penalizing the breaker.
                }
                Ok(Err(_core_err)) => {
                    self.breaker.record_failure();
                }
                Err(_elapsed) => {
                    self.breaker.record_failure();
                }
            }
        }

        let snap = finalize(ambassador::synthesize(limit, self.ambassador_seed), Tier::Ambassador)?;
        self.preserve_if_first(&snap);
        Ok(snap)
    }

    /// A fallback never discards `last`; it only fills `last` the first
    /// time the builder is ever asked (so something is cached even if
    /// Sovereign has never once succeeded).
    fn preserve_if_first(&self, snap: &Snapshot) {
        let mut guard = self.last.lock().unwrap();
        if guard.is_none() {
            *guard = Some(snap.clone());
        }
    }
}
