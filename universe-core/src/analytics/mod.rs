//! Per-slot analytics aggregation (spec §4.C).
//!
//! The three detectors are arranged as dense arrays indexed by slot id
//! rather than a per-asset map, per the Design Notes' guidance to replace
//! dictionary-keyed state with array-keyed state ahead of a GPU upload: a
//! tick only ever touches the slots named in that tick's batch, and growing
//! the arrays is a single `resize`, not a rehash.

pub mod cusum;
pub mod rls;
pub mod vpin;

use cusum::CusumState;
use rls::RlsState;
use vpin::VpinState;

use crate::codec::pack_meta32;

/// Dense, slot-indexed analytics state plus a single shared macro-regime
/// byte (`macro8`) that every slot's packed `meta32` carries unchanged.
pub struct AnalyticsEngine {
    cusum: Vec<CusumState>,
    rls: Vec<RlsState>,
    vpin: Vec<VpinState>,
    macro8: u8,
}

impl AnalyticsEngine {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cusum: vec![CusumState::default(); capacity],
            rls: vec![RlsState::default(); capacity],
            vpin: vec![VpinState::default(); capacity],
            macro8: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cusum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cusum.is_empty()
    }

    /// Grow the dense arrays to cover `slot` if needed.
    pub fn ensure_capacity(&mut self, slot: usize) {
        if slot >= self.cusum.len() {
            let new_len = slot + 1;
            self.cusum.resize(new_len, CusumState::default());
            self.rls.resize(new_len, RlsState::default());
            self.vpin.resize(new_len, VpinState::default());
        }
    }

    pub fn set_macro8(&mut self, macro8: u8) {
        self.macro8 = macro8;
    }

    pub fn macro8(&self) -> u8 {
        self.macro8
    }

    /// Feed one tick's `(price, volume, log_return)` observation for `slot`
    /// and return the packed `meta32` word for that slot.
    pub fn update_slot(&mut self, slot: usize, price: f64, volume: f64, log_return: f64) -> u32 {
        self.ensure_capacity(slot);
        let shock8 = self.cusum[slot].update(log_return);
        let trend2 = self.rls[slot].update(price);
        let (risk8, vital6) = self.vpin[slot].update(price, volume);
        pack_meta32(shock8, risk8, trend2, vital6, self.macro8)
    }

    pub fn reset_slot(&mut self, slot: usize) {
        if let Some(c) = self.cusum.get_mut(slot) {
            c.reset();
        }
        if let Some(r) = self.rls.get_mut(slot) {
            r.reset();
        }
        if let Some(v) = self.vpin.get_mut(slot) {
            v.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_slot_grows_dense_arrays_on_demand() {
        let mut engine = AnalyticsEngine::with_capacity(1);
        let word = engine.update_slot(10, 100.0, 5.0, 0.0);
        assert_eq!(engine.len(), 11);
        assert_eq!(word & 0xFFFF, (0u32 << 0) | (128u32 << 8));
    }

    #[test]
    fn macro8_is_stamped_into_every_slot() {
        let mut engine = AnalyticsEngine::with_capacity(4);
        engine.set_macro8(0xAB);
        let word = engine.update_slot(0, 50.0, 1.0, 0.01);
        assert_eq!((word >> 24) & 0xFF, 0xAB);
    }

    #[test]
    fn independent_slots_do_not_share_detector_state() {
        let mut engine = AnalyticsEngine::with_capacity(2);
        for _ in 0..20 {
            engine.update_slot(0, 100.0, 10.0, 0.05);
        }
        let untouched = engine.update_slot(1, 100.0, 10.0, 0.05);
        let touched = engine.update_slot(0, 100.0, 10.0, 0.05);
        assert_ne!(untouched & 0xFF, touched & 0xFF);
    }

    #[test]
    fn reset_slot_clears_only_that_slot() {
        let mut engine = AnalyticsEngine::with_capacity(2);
        engine.update_slot(0, 100.0, 10.0, 0.05);
        engine.update_slot(1, 100.0, 10.0, 0.05);
        engine.reset_slot(0);
        let word = engine.update_slot(0, 100.0, 10.0, 0.05);
        assert_eq!(word & 0xFF, 0);
    }
}
