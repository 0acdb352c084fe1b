//! Sentinel tier (spec §4.G.3): deterministic mock, tiny count, ns latency.
//! The last-resort tier when even Ambassador synthesis isn't meaningful
//! (e.g. a zero-row request).

use crate::asset::{Governance, Sector, UniverseAsset};

const SENTINEL_SYMBOLS: &[&str] = &["SENTINEL-TECH", "SENTINEL-FIN", "SENTINEL-UTIL"];

/// A fixed, tiny set of mock assets, one per a handful of sectors. No
/// randomness, no I/O — this tier exists purely so `build_snapshot` always
/// has something to return.
pub fn synthesize() -> Vec<UniverseAsset> {
    let sectors = [Sector::Tech, Sector::Fin, Sector::Util];
    SENTINEL_SYMBOLS
        .iter()
        .zip(sectors.iter())
        .map(|(&symbol, &sector)| UniverseAsset {
            symbol: symbol.to_string(),
            taxonomy32: 0,
            meta32: 0,
            fidelity: 0.5,
            governance: Governance::Sanctioned,
            x: 0.5,
            y: 0.5,
            z: 0.5,
            render_priority: 255,
            cluster_id: None,
            liquidity_tier: 1,
            sector,
            name: format!("Sentinel mock ({})", sector.as_str()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_small_and_deterministic() {
        let a = synthesize();
        let b = synthesize();
        assert_eq!(a.len(), SENTINEL_SYMBOLS.len());
        assert_eq!(a, b);
    }
}
