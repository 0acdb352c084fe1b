//! Deterministic derivation of `taxonomy32`/`meta32` for source rows that
//! arrive with a zero word (spec §4.F.2, supplemented from
//! `engines/taxonomy_engine.py`). No wall-clock, no external randomness —
//! every derived value is a pure function of `(sector, symbol, liquidity_tier)`.

use crate::asset::Sector;
use crate::codec::{pack_meta32, pack_taxonomy32};

/// FNV-1a, used only as a deterministic bucketing hash — not for anything
/// security-sensitive.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Bucket `symbol`'s hash into the inclusive range `[lo, hi]`.
pub fn stable_bucket(symbol: &str, lo: u8, hi: u8) -> u8 {
    let span = (hi - lo) as u64 + 1;
    lo + (fnv1a(symbol.as_bytes()) % span) as u8
}

/// The raw 64-bit hash, exposed for callers (the staging pass's Morton salt
/// and coordinate fallback) that need more entropy than a single bucket.
pub fn stable_hash(bytes: &[u8]) -> u64 {
    fnv1a(bytes)
}

/// Derive a non-zero canonical `taxonomy32` when the source row carried the
/// all-zero sentinel. `domain` comes from the row's sector (1..8, within the
/// field's 1..15 range); `industry` from a symbol hash bucketed 1..63;
/// `risk_tier` from `liquidity_tier` (1..3 maps onto the odd risk tiers
/// 1/3/5, leaving 2/4/6/7 to explicit, non-derived rows); `vol_tier` from a
/// symbol+sector hash bucketed 1..31.
pub fn derive_taxonomy32(sector: Sector, symbol: &str, liquidity_tier: u8) -> u32 {
    let domain = sector.rank() as u8 + 1;
    let industry = stable_bucket(symbol, 1, 63);
    let risk_tier = liquidity_tier.clamp(1, 3) * 2 - 1;
    let salted = format!("{symbol}:{}", sector.as_str());
    let vol_tier = stable_bucket(&salted, 1, 31);
    pack_taxonomy32(domain, industry, risk_tier, vol_tier)
}

/// Derive a baseline `meta32` when the source row carried the all-zero
/// sentinel: no shock or trend yet (the tick engine hasn't touched this row),
/// a risk/vitality baseline from `liquidity_tier`, and `macro8` flagged from
/// a deterministic ~10% outlier bucket.
pub fn derive_meta32(symbol: &str, liquidity_tier: u8) -> u32 {
    let (risk8, vital6) = match liquidity_tier {
        1 => (200u8, 10u8),
        2 => (120, 32),
        _ => (40, 55),
    };
    let outlier = stable_bucket(symbol, 0, 9) == 0;
    let macro8 = if outlier { 255 } else { 0 };
    pack_meta32(0, risk8, 0, vital6, macro8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_bucket_is_deterministic_and_in_range() {
        for _ in 0..5 {
            let b = stable_bucket("AAPL", 1, 63);
            assert!((1..=63).contains(&b));
            assert_eq!(b, stable_bucket("AAPL", 1, 63));
        }
    }

    #[test]
    fn different_symbols_usually_land_in_different_buckets() {
        let a = stable_bucket("AAPL", 1, 63);
        let b = stable_bucket("MSFT", 1, 63);
        assert_ne!(a, b, "hash collision on two arbitrary symbols is suspicious, not fatal");
    }

    #[test]
    fn derived_taxonomy_is_never_the_zero_sentinel() {
        let word = derive_taxonomy32(Sector::Tech, "AAPL", 2);
        assert_ne!(word, 0);
    }

    #[test]
    fn derived_taxonomy_is_deterministic() {
        let a = derive_taxonomy32(Sector::Fin, "JPM", 1);
        let b = derive_taxonomy32(Sector::Fin, "JPM", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn derived_meta32_risk_decreases_with_higher_liquidity_tier() {
        let low = derive_meta32("XYZ", 1);
        let high = derive_meta32("XYZ", 3);
        let risk_low = (low >> 8) & 0xFF;
        let risk_high = (high >> 8) & 0xFF;
        assert!(risk_low > risk_high);
    }
}
