//! Morton collision repair (spec §4.F.3, I-MORTON-UNIQ, P5).

use std::collections::HashSet;

use crate::codec::{morton63_salted, morton63_to_u32, Vertex28};
use crate::error::{CoreError, CoreResult};
use crate::materializer::derive::stable_hash;
use crate::materializer::staging::StagedRow;

/// Resample attempts bounded per the spec's "(e.g. 64)".
pub const MAX_REPAIR_ATTEMPTS: u32 = 64;

fn resample_unit(symbol: &str, axis: char, attempt: u32) -> f64 {
    let h = stable_hash(format!("{symbol}:{axis}:{attempt}").as_bytes());
    (h % 1_000_000) as f64 / 1_000_000.0
}

/// Deterministically resolve every duplicate Morton code across the UNION of
/// staging rows. Ordering is `(morton, id)` so "keep first" is a pure
/// function of the staged set, not insertion order.
pub fn repair_collisions(mut rows: Vec<StagedRow>) -> CoreResult<Vec<StagedRow>> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| rows[a].morton64.cmp(&rows[b].morton64).then(rows[a].id.cmp(&rows[b].id)));

    let mut seen: HashSet<u64> = HashSet::with_capacity(rows.len());
    let mut duplicates = Vec::new();
    for &idx in &order {
        if !seen.insert(rows[idx].morton64) {
            duplicates.push(idx);
        }
    }

    for idx in duplicates {
        let symbol = rows[idx].symbol.clone();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            if attempt > MAX_REPAIR_ATTEMPTS {
                return Err(CoreError::MortonIrreparable { asset: symbol, attempts: MAX_REPAIR_ATTEMPTS });
            }
            let nx = resample_unit(&symbol, 'x', attempt);
            let ny = resample_unit(&symbol, 'y', attempt);
            let nz = resample_unit(&symbol, 'z', attempt);
            let salt = stable_hash(symbol.as_bytes()).wrapping_add(attempt as u64);
            let new_code = morton63_salted(nx, ny, nz, salt);

            if seen.insert(new_code) {
                let row = &mut rows[idx];
                row.x = nx as f32;
                row.y = ny as f32;
                row.z = nz as f32;
                row.morton64 = new_code;
                let morton_u32 = morton63_to_u32(new_code);
                row.vertex =
                    Vertex28::new(morton_u32, row.meta32, row.x, row.y, row.z, row.fidelity, row.spin)?;
                break;
            }
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Sector;
    use crate::materializer::staging::{stage_row, Bounds, SourceRow};

    fn identical_rows(n: usize) -> Vec<StagedRow> {
        let rows: Vec<SourceRow> = (0..n)
            .map(|i| SourceRow {
                id: i as u64,
                symbol: format!("SYM{i}"),
                sector: Sector::Tech,
                x: Some(0.5),
                y: Some(0.5),
                z: Some(0.5),
                taxonomy32: 1,
                meta32: 1,
                has_price: true,
                has_sector: true,
                liquidity_tier: 2,
            })
            .collect();
        let bounds = Bounds::from_rows(&rows);
        rows.iter().map(|r| stage_row(r, &bounds).unwrap()).collect()
    }

    #[test]
    fn duplicate_coordinates_produce_unique_morton_after_repair() {
        let staged = identical_rows(8);
        let codes: HashSet<u64> = staged.iter().map(|r| r.morton64).collect();
        assert!(codes.len() < 8, "fixture should start with collisions");

        let repaired = repair_collisions(staged).unwrap();
        let codes: HashSet<u64> = repaired.iter().map(|r| r.morton64).collect();
        assert_eq!(codes.len(), 8);
    }

    #[test]
    fn repair_preserves_row_count_and_non_spatial_fields() {
        let staged = identical_rows(4);
        let before: Vec<u32> = staged.iter().map(|r| r.taxonomy32).collect();
        let repaired = repair_collisions(staged).unwrap();
        assert_eq!(repaired.len(), 4);
        let after: Vec<u32> = repaired.iter().map(|r| r.taxonomy32).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn repaired_vertex_bytes_stay_contract_valid() {
        let staged = identical_rows(6);
        let repaired = repair_collisions(staged).unwrap();
        for row in &repaired {
            assert!((0.0..=1.0).contains(&row.vertex.x));
            assert!((0.0..=1.0).contains(&row.vertex.y));
            assert!((0.0..=1.0).contains(&row.vertex.z));
        }
    }

    #[test]
    fn already_unique_rows_are_untouched() {
        let rows: Vec<SourceRow> = (0..4)
            .map(|i| SourceRow {
                id: i,
                symbol: format!("U{i}"),
                sector: Sector::Fin,
                x: Some(i as f64 * 0.2),
                y: Some(i as f64 * 0.3),
                z: Some(i as f64 * 0.1),
                taxonomy32: 1,
                meta32: 1,
                has_price: true,
                has_sector: true,
                liquidity_tier: 2,
            })
            .collect();
        let bounds = Bounds::from_rows(&rows);
        let staged: Vec<StagedRow> = rows.iter().map(|r| stage_row(r, &bounds).unwrap()).collect();
        let before: Vec<u64> = staged.iter().map(|r| r.morton64).collect();
        let repaired = repair_collisions(staged).unwrap();
        let after: Vec<u64> = repaired.iter().map(|r| r.morton64).collect();
        assert_eq!(before, after);
    }
}
