//! CUSUM shock detector (spec §4.C, `shock8`).
//!
//! Grounded on `analytics/cusum.py`: an exponentially-weighted mean tracks
//! the running baseline, and two one-sided cumulative sums (`s_plus`,
//! `s_minus`) accumulate sustained deviation from it. The first observation
//! for a slot seeds the mean with that observation and reports no shock.

const THRESHOLD: f64 = 0.02;
const DRIFT: f64 = 0.001;

#[derive(Debug, Clone, Copy, Default)]
pub struct CusumState {
    s_plus: f64,
    s_minus: f64,
    mean: f64,
    count: u32,
}

impl CusumState {
    /// Feed a log-return `r` and return the updated `shock8` score.
    pub fn update(&mut self, r: f64) -> u8 {
        if self.count == 0 {
            self.mean = r;
            self.count = 1;
            return 0;
        }

        let alpha = 1.0 / (self.count.min(100) as f64);
        let new_mean = (1.0 - alpha) * self.mean + alpha * r;
        let deviation = r - new_mean;

        let s_plus = (self.s_plus + deviation - DRIFT).max(0.0);
        let s_minus = (self.s_minus - deviation - DRIFT).max(0.0);

        let shock_magnitude = s_plus.max(s_minus);
        let normalized = (shock_magnitude / (THRESHOLD * 2.0)).tanh();
        let shock8 = (normalized * 255.0).round().clamp(0.0, 255.0) as u8;

        self.s_plus = s_plus;
        self.s_minus = s_minus;
        self.mean = new_mean;
        self.count = self.count.saturating_add(1);

        shock8
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_returns_zero() {
        let mut s = CusumState::default();
        assert_eq!(s.update(0.05), 0);
    }

    #[test]
    fn sustained_positive_return_drives_shock_up() {
        let mut s = CusumState::default();
        s.update(0.0);
        let mut last = 0u8;
        for _ in 0..20 {
            last = s.update(0.05);
        }
        assert!(last > 100, "expected strong shock after sustained deviation, got {last}");
    }

    #[test]
    fn steady_state_stays_near_zero() {
        let mut s = CusumState::default();
        s.update(0.001);
        let mut last = 255u8;
        for _ in 0..20 {
            last = s.update(0.001);
        }
        assert!(last < 50, "expected near-zero shock under steady input, got {last}");
    }

    #[test]
    fn extreme_inputs_stay_finite_and_in_range() {
        let mut s = CusumState::default();
        s.update(1e10);
        let v = s.update(-1e10);
        assert!((0..=255).contains(&(v as i32)));
    }

    #[test]
    fn reset_clears_state() {
        let mut s = CusumState::default();
        s.update(0.1);
        s.update(0.1);
        s.reset();
        assert_eq!(s.update(0.1), 0);
    }
}
