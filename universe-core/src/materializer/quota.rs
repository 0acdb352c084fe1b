//! Two-phase sector quota plan (spec §4.F.1).
//!
//! `S`, "the fixed canonical order" the spec plans over, is the key set of
//! the caller's `real` map — `Sector` already orders by the glossary's
//! canonical TECH..UTIL sequence, so any subset (the full 8-sector universe
//! in production, or the 3-sector toy example in §8's scenario 4) plans
//! identically.

use std::collections::BTreeMap;

use crate::asset::Sector;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub donor: Sector,
    pub receiver: Sector,
}

#[derive(Debug, Clone)]
pub struct QuotaPlan {
    pub desired: BTreeMap<Sector, usize>,
    pub keep: BTreeMap<Sector, usize>,
    pub transfers: Vec<Transfer>,
    pub final_count: BTreeMap<Sector, usize>,
}

/// Base quota: `T/|S| + (1 if rank(s) < T mod |S| else 0)`, where `rank` is
/// the sector's position within `order` (not within the full 8-sector
/// enum) — the plan's own canonical order for this call.
fn desired_quota(order: &[Sector], target: usize) -> BTreeMap<Sector, usize> {
    let n = order.len();
    let base = target / n;
    let remainder = target % n;
    order.iter().enumerate().map(|(rank, &s)| (s, base + usize::from(rank < remainder))).collect()
}

/// Round-robin donor/receiver pairing over `order`, one unit at a time,
/// until every deficit is closed. Deterministic given `(order, real, desired)`.
fn redistribute(
    order: &[Sector],
    desired: &BTreeMap<Sector, usize>,
    real: &BTreeMap<Sector, usize>,
) -> Vec<Transfer> {
    let n = order.len();
    let mut sur: Vec<i64> = order
        .iter()
        .map(|s| {
            let r = *real.get(s).unwrap_or(&0) as i64;
            let d = desired[s] as i64;
            (r - d).max(0)
        })
        .collect();
    let mut def: Vec<i64> = order
        .iter()
        .map(|s| {
            let r = *real.get(s).unwrap_or(&0) as i64;
            let d = desired[s] as i64;
            (d - r).max(0)
        })
        .collect();

    let mut transfers = Vec::new();
    let mut donor_ptr = 0usize;
    let mut receiver_ptr = 0usize;
    let total_def: i64 = def.iter().sum();

    for _ in 0..total_def {
        if def.iter().all(|&d| d == 0) {
            break;
        }
        let mut spins = 0;
        while sur[donor_ptr] <= 0 {
            donor_ptr = (donor_ptr + 1) % n;
            spins += 1;
            debug_assert!(spins <= n, "no donor surplus remains; quota infeasible");
        }
        let mut spins = 0;
        while def[receiver_ptr] <= 0 {
            receiver_ptr = (receiver_ptr + 1) % n;
            spins += 1;
            debug_assert!(spins <= n, "no receiver deficit remains; loop should have exited");
        }
        sur[donor_ptr] -= 1;
        def[receiver_ptr] -= 1;
        transfers.push(Transfer { donor: order[donor_ptr], receiver: order[receiver_ptr] });
        donor_ptr = (donor_ptr + 1) % n;
        receiver_ptr = (receiver_ptr + 1) % n;
    }

    transfers
}

/// Build the quota plan for `target` rows given per-sector source counts.
/// The sector universe `S` is exactly `real`'s key set. Fails fast with
/// `INSUFFICIENT_INVENTORY` if `Σreal < target`.
pub fn plan_quota(real: &BTreeMap<Sector, usize>, target: usize) -> CoreResult<QuotaPlan> {
    let order: Vec<Sector> = real.keys().copied().collect();
    let total_real: usize = real.values().sum();
    if total_real < target {
        return Err(CoreError::InsufficientInventory { available: total_real, target });
    }

    let desired = desired_quota(&order, target);
    let keep: BTreeMap<Sector, usize> =
        order.iter().map(|&s| (s, (*real.get(&s).unwrap_or(&0)).min(desired[&s]))).collect();

    let transfers = redistribute(&order, &desired, real);

    let mut final_count = keep.clone();
    for t in &transfers {
        *final_count.entry(t.receiver).or_insert(0) += 1;
    }

    Ok(QuotaPlan { desired, keep, transfers, final_count })
}
