//! Compute-and-stage pass (spec §4.F.2): turn one source row into a
//! deterministic staging record, ready for collision repair and the atomic
//! swap.

use crate::asset::Sector;
use crate::codec::{morton63_salted, morton63_to_u32, unpack_taxonomy32, Vertex28};
use crate::error::CoreResult;
use crate::materializer::derive::{derive_meta32, derive_taxonomy32, stable_hash};

/// One row read from the source inventory, ordered by a stable primary key
/// (`id`).
#[derive(Debug, Clone)]
pub struct SourceRow {
    pub id: u64,
    pub symbol: String,
    pub sector: Sector,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub taxonomy32: u32,
    pub meta32: u32,
    pub has_price: bool,
    pub has_sector: bool,
    pub liquidity_tier: u8,
}

/// Global (x,y,z) bounds read once from the source view.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

const DEGENERATE_EPSILON: f64 = 1e-9;

impl Bounds {
    pub fn from_rows(rows: &[SourceRow]) -> Self {
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_z, mut max_z) = (f64::INFINITY, f64::NEG_INFINITY);
        for row in rows {
            for (v, lo, hi) in [
                (row.x, &mut min_x, &mut max_x),
                (row.y, &mut min_y, &mut max_y),
                (row.z, &mut min_z, &mut max_z),
            ] {
                if let Some(v) = v {
                    if v.is_finite() {
                        *lo = lo.min(v);
                        *hi = hi.max(v);
                    }
                }
            }
        }
        Self { min_x, max_x, min_y, max_y, min_z, max_z }
    }

    fn axis_degenerate(lo: f64, hi: f64) -> bool {
        !lo.is_finite() || !hi.is_finite() || (hi - lo) < DEGENERATE_EPSILON
    }

    pub fn is_degenerate(&self) -> bool {
        Self::axis_degenerate(self.min_x, self.max_x)
            || Self::axis_degenerate(self.min_y, self.max_y)
            || Self::axis_degenerate(self.min_z, self.max_z)
    }
}

/// A computed row ready to be written into a per-sector staging table.
#[derive(Debug, Clone)]
pub struct StagedRow {
    pub id: u64,
    pub symbol: String,
    pub sector: Sector,
    pub taxonomy32: u32,
    pub meta32: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub fidelity: f32,
    pub spin: f32,
    pub morton64: u64,
    pub vertex: Vertex28,
}

fn unit_from_hash(seed: &str) -> f64 {
    let h = stable_hash(seed.as_bytes());
    (h % 1_000_000) as f64 / 1_000_000.0
}

fn normalize(row: &SourceRow, bounds: &Bounds) -> (f64, f64, f64) {
    let usable = !bounds.is_degenerate()
        && row.x.is_some_and(f64::is_finite)
        && row.y.is_some_and(f64::is_finite)
        && row.z.is_some_and(f64::is_finite);

    if !usable {
        return (
            unit_from_hash(&format!("{}:x", row.symbol)),
            unit_from_hash(&format!("{}:y", row.symbol)),
            unit_from_hash(&format!("{}:z", row.symbol)),
        );
    }

    let nx = (row.x.unwrap() - bounds.min_x) / (bounds.max_x - bounds.min_x);
    let ny = (row.y.unwrap() - bounds.min_y) / (bounds.max_y - bounds.min_y);
    let nz = (row.z.unwrap() - bounds.min_z) / (bounds.max_z - bounds.min_z);
    (nx.clamp(0.0, 1.0), ny.clamp(0.0, 1.0), nz.clamp(0.0, 1.0))
}

/// Stage one row: normalize coordinates, compute the salted Morton code,
/// derive `taxonomy32`/`meta32` when the source carried the zero sentinel,
/// derive `fidelity` and `spin`, and pack the Vertex28 record. The vertex's
/// first word is the truncated Morton code (the stream's wire-active value
/// per the Open Questions resolution), not `taxonomy32` — `taxonomy32` is a
/// separate column in the canonical relation (§6.3).
pub fn stage_row(row: &SourceRow, bounds: &Bounds) -> CoreResult<StagedRow> {
    let (nx, ny, nz) = normalize(row, bounds);
    let salt = stable_hash(row.symbol.as_bytes());
    let morton64 = morton63_salted(nx, ny, nz, salt);
    let morton_u32 = morton63_to_u32(morton64);

    let taxonomy32 = if row.taxonomy32 == 0 {
        derive_taxonomy32(row.sector, &row.symbol, row.liquidity_tier)
    } else {
        row.taxonomy32
    };
    let meta32 =
        if row.meta32 == 0 { derive_meta32(&row.symbol, row.liquidity_tier) } else { row.meta32 };

    let fidelity = match (row.has_price, row.has_sector) {
        (false, false) => 0.62,
        (true, false) => 0.78,
        (false, true) => 0.84,
        (true, true) => 0.92,
    };

    let risk_tier = unpack_taxonomy32(taxonomy32).risk_tier;
    let parity = (taxonomy32.count_ones() % 2) as f32;
    let spin = parity * (risk_tier as f32 / 7.0);

    let vertex = Vertex28::new(morton_u32, meta32, nx as f32, ny as f32, nz as f32, fidelity, spin)?;

    Ok(StagedRow {
        id: row.id,
        symbol: row.symbol.clone(),
        sector: row.sector,
        taxonomy32,
        meta32,
        x: nx as f32,
        y: ny as f32,
        z: nz as f32,
        fidelity,
        spin,
        morton64,
        vertex,
    })
}
