//! Recursive Least Squares trend detector (spec §4.C, `trend2`).
//!
//! Grounded on `analytics/rls.py`: a scalar 1-D RLS fit of price change
//! against a step index, with exponential forgetting. The regressor is the
//! sample's position in the stream (`count + 1`), not wall-clock time.

const LAMBDA: f64 = 0.95;
const MIN_SAMPLES: u32 = 5;
const MIN_COVARIANCE: f64 = 1e-3;
const BULL_THRESHOLD: f64 = 1e-4;
const BEAR_THRESHOLD: f64 = -1e-4;

#[derive(Debug, Clone, Copy)]
pub struct RlsState {
    p: f64,
    theta: f64,
    count: u32,
    last_price: f64,
    initialized: bool,
}

impl Default for RlsState {
    fn default() -> Self {
        Self { p: 1.0, theta: 0.0, count: 0, last_price: 0.0, initialized: false }
    }
}

impl RlsState {
    /// Feed the current `price` and return `trend2`: 0=flat, 1=bull, 2=bear.
    pub fn update(&mut self, price: f64) -> u8 {
        if !self.initialized {
            self.p = 1.0;
            self.theta = 0.0;
            self.count = 0;
            self.last_price = price;
            self.initialized = true;
            return 0;
        }

        let x = (self.count + 1) as f64;
        let y = price - self.last_price;

        let innovation = y - self.theta * x;
        let k = self.p * x / (LAMBDA + self.p * x * x);
        let theta_new = self.theta + k * innovation;
        let p_new = ((1.0 / LAMBDA) * (self.p - k * x * self.p)).max(MIN_COVARIANCE);

        let mut trend2 = 0u8;
        if self.count >= MIN_SAMPLES && self.last_price > 0.0 {
            let relative_slope = theta_new / self.last_price;
            if relative_slope > BULL_THRESHOLD {
                trend2 = 1;
            } else if relative_slope < BEAR_THRESHOLD {
                trend2 = 2;
            }
        }

        self.p = p_new;
        self.theta = theta_new;
        self.count = self.count.saturating_add(1);
        self.last_price = price;

        trend2
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_is_flat() {
        let mut s = RlsState::default();
        assert_eq!(s.update(100.0), 0);
    }

    #[test]
    fn sustained_uptrend_is_eventually_bull() {
        let mut s = RlsState::default();
        let mut price = 100.0;
        let mut last = 0u8;
        for _ in 0..30 {
            price *= 1.01;
            last = s.update(price);
        }
        assert_eq!(last, 1);
    }

    #[test]
    fn sustained_downtrend_is_eventually_bear() {
        let mut s = RlsState::default();
        let mut price = 100.0;
        let mut last = 0u8;
        for _ in 0..30 {
            price *= 0.99;
            last = s.update(price);
        }
        assert_eq!(last, 2);
    }

    #[test]
    fn covariance_never_drops_below_floor() {
        let mut s = RlsState::default();
        let mut price = 100.0;
        for _ in 0..50 {
            price += 1.0;
            s.update(price);
        }
        assert!(s.p >= MIN_COVARIANCE);
    }

    #[test]
    fn flat_before_min_samples() {
        let mut s = RlsState::default();
        s.update(100.0);
        for _ in 0..(MIN_SAMPLES - 1) {
            assert_eq!(s.update(1000.0), 0);
        }
    }

    #[test]
    fn zero_price_does_not_panic_or_produce_nan() {
        let mut s = RlsState::default();
        s.update(0.0);
        for _ in 0..10 {
            let t = s.update(0.0);
            assert!((0..=2).contains(&t));
        }
        assert!(s.theta.is_finite());
    }
}
