//! Ambassador tier (spec §4.G.2): deterministic synthetic assets with a
//! plausible per-sector fidelity distribution.
//!
//! Grounded on `sovereign_orchestrator.py`'s per-sector Beta(a,b) fidelity
//! draw; the source names parameters for five sectors (TECH, FIN, ENER,
//! HLTH, INDS), remapped onto this spec's 8-sector enum with COMM/MATR/UTIL
//! given a neutral `Beta(2.0, 2.0)` (decision recorded in DESIGN.md). `rand`
//! has no Beta sampler built in and the teacher's dependency stack has no
//! `rand_distr`, so fidelity is drawn via Jöhnk's rejection method on two
//! uniform draws, seeded per-asset for reproducibility.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::asset::{Governance, Sector, UniverseAsset};
use crate::materializer::derive::{derive_taxonomy32, stable_hash};

fn beta_params(sector: Sector) -> (f64, f64) {
    match sector {
        Sector::Tech => (2.5, 1.6),
        Sector::Fin => (2.0, 2.2),
        Sector::Ener => (1.8, 2.8),
        Sector::Hlth => (2.2, 1.9),
        Sector::Inds => (1.9, 2.1),
        Sector::Comm | Sector::Matr | Sector::Util => (2.0, 2.0),
    }
}

/// Jöhnk's algorithm: draw `u, v ~ Uniform(0,1)`, set `x = u^(1/a)`,
/// `y = v^(1/b)`; if `x + y <= 1`, `x / (x + y) ~ Beta(a, b)`. Rejection
/// probability is modest for `a, b` in the 1.6-2.8 range this module uses.
fn sample_beta(rng: &mut ChaCha8Rng, a: f64, b: f64) -> f64 {
    loop {
        let u: f64 = rng.gen();
        let v: f64 = rng.gen();
        let x = u.powf(1.0 / a);
        let y = v.powf(1.0 / b);
        let s = x + y;
        if s <= 1.0 && s > 0.0 {
            return x / s;
        }
    }
}

/// Synthesize `limit` assets, cycling through the canonical sectors and
/// seeding each asset's RNG from `seed` mixed with its index so the same
/// `(seed, limit)` pair always reproduces byte-identical output.
pub fn synthesize(limit: usize, seed: u64) -> Vec<UniverseAsset> {
    Sector::ALL
        .iter()
        .cycle()
        .take(limit)
        .enumerate()
        .map(|(i, &sector)| {
            let symbol = format!("AMB-{i:06}");
            let mut rng = ChaCha8Rng::seed_from_u64(seed ^ stable_hash(symbol.as_bytes()));
            let (a, b) = beta_params(sector);
            let fidelity = sample_beta(&mut rng, a, b) as f32;
            let x: f32 = rng.gen();
            let y: f32 = rng.gen();
            let z: f32 = rng.gen();
            let liquidity_tier = 1 + (i % 3) as u8;
            let taxonomy32 = derive_taxonomy32(sector, &symbol, liquidity_tier);
            UniverseAsset {
                symbol: symbol.clone(),
                taxonomy32,
                meta32: 0,
                fidelity: fidelity.clamp(0.0, 1.0),
                governance: Governance::Provisional,
                x,
                y,
                z,
                render_priority: 200,
                cluster_id: None,
                liquidity_tier,
                sector,
                name: format!("Ambassador Synthetic {i}"),
            }
        })
        .collect()
}
