//! Full materialization pipeline (spec §4.F): quota plan → select → stage →
//! collision repair → validate → atomic swap.
//!
//! Database access sits behind [`CanonicalSink`] so the pipeline is testable
//! without a live Postgres instance; `universe-server` supplies the
//! `deadpool-postgres`-backed implementation that performs §4.F.4's
//! transaction (`TRUNCATE` + `INSERT ... UNION ALL` + assertions + rollback
//! on failure).

use std::collections::{BTreeMap, HashSet};

use crate::asset::Sector;
use crate::codec::pack_vertex_buffer;
use crate::error::{CoreError, CoreResult};
use crate::materializer::collision::repair_collisions;
use crate::materializer::quota::plan_quota;
use crate::materializer::staging::{stage_row, Bounds, SourceRow, StagedRow};

/// The destination for a finalized materialization. A failing `swap` must
/// leave the previously-canonical data untouched (§4.F.4: "no partially
/// visible universe").
pub trait CanonicalSink {
    fn swap(&mut self, rows: &[StagedRow]) -> CoreResult<()>;
}

/// In-process sink for tests and for the Sentinel/Ambassador tiers, which
/// never touch Postgres.
#[derive(Debug, Default)]
pub struct InMemorySink {
    pub rows: Vec<StagedRow>,
}

impl CanonicalSink for InMemorySink {
    fn swap(&mut self, rows: &[StagedRow]) -> CoreResult<()> {
        self.rows = rows.to_vec();
        Ok(())
    }
}

/// Select exactly `target` rows from `rows_by_sector` per the quota plan:
/// each sector's own first `keep[s]` rows (by ascending `id`) are kept
/// as-is; surplus donor rows beyond that prefix are relabeled to receiver
/// sectors per the plan's deterministic transfer list.
fn select_rows(
    rows_by_sector: &BTreeMap<Sector, Vec<SourceRow>>,
    target: usize,
) -> CoreResult<Vec<SourceRow>> {
    let mut sorted: BTreeMap<Sector, Vec<SourceRow>> = BTreeMap::new();
    for (&sector, rows) in rows_by_sector {
        let mut rows = rows.clone();
        rows.sort_by_key(|r| r.id);
        sorted.insert(sector, rows);
    }

    let real: BTreeMap<Sector, usize> = sorted.iter().map(|(&s, v)| (s, v.len())).collect();
    let plan = plan_quota(&real, target)?;

    let mut selected = Vec::with_capacity(target);
    let mut donor_cursor: BTreeMap<Sector, usize> = Sector::ALL
        .iter()
        .map(|&s| (s, plan.keep.get(&s).copied().unwrap_or(0)))
        .collect();

    for &s in &Sector::ALL {
        let take = plan.keep.get(&s).copied().unwrap_or(0);
        if let Some(rows) = sorted.get(&s) {
            selected.extend(rows[..take.min(rows.len())].iter().cloned());
        }
    }

    for t in &plan.transfers {
        let cursor = donor_cursor.get_mut(&t.donor).expect("canonical sector");
        let donor_rows = sorted
            .get(&t.donor)
            .filter(|rows| *cursor < rows.len())
            .ok_or_else(|| CoreError::SwapAssert {
                reason: format!("donor sector {:?} exhausted its surplus", t.donor),
            })?;
        let mut row = donor_rows[*cursor].clone();
        *cursor += 1;
        row.sector = t.receiver;
        selected.push(row);
    }

    if selected.len() != target {
        return Err(CoreError::SwapAssert {
            reason: format!("selected {} rows, expected target {}", selected.len(), target),
        });
    }

    Ok(selected)
}

fn validate_final(rows: &[StagedRow], target: usize) -> CoreResult<()> {
    if rows.len() != target {
        return Err(CoreError::SwapAssert {
            reason: format!("final count {} != target {}", rows.len(), target),
        });
    }
    let distinct: HashSet<u64> = rows.iter().map(|r| r.morton64).collect();
    if distinct.len() != rows.len() {
        return Err(CoreError::SwapAssert {
            reason: "duplicate morton_code survived collision repair".to_string(),
        });
    }
    Ok(())
}

/// Run the full pipeline against an in-memory source view and hand the
/// result to `sink` in a single call, matching §4.F.4's "in a single
/// transaction" contract at the sink boundary.
pub fn materialize(
    rows_by_sector: &BTreeMap<Sector, Vec<SourceRow>>,
    target: usize,
    sink: &mut dyn CanonicalSink,
) -> CoreResult<Vec<StagedRow>> {
    let selected = select_rows(rows_by_sector, target)?;
    let bounds = Bounds::from_rows(&selected);
    let staged: CoreResult<Vec<StagedRow>> = selected.iter().map(|r| stage_row(r, &bounds)).collect();
    let staged = staged?;
    let repaired = repair_collisions(staged)?;
    validate_final(&repaired, target)?;
    sink.swap(&repaired)?;
    Ok(repaired)
}

/// Flatten a validated row set into the Vertex28 wire buffer (`28*N` bytes).
pub fn vertex_buffer(rows: &[StagedRow]) -> Vec<u8> {
    let vertices: Vec<_> = rows.iter().map(|r| r.vertex).collect();
    pack_vertex_buffer(&vertices)
}
