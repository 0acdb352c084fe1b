//! VPIN (Volume-synchronized Probability of Informed Trading) detector
//! (spec §4.C, `risk8`/`vital6`).
//!
//! Grounded on `analytics/vpin.py`: a fixed-size trailing window of
//! (buy_volume, sell_volume, total_volume) buckets, classified by comparing
//! each trade's price against the previous observed price. Ties and the very
//! first observation split volume 50/50 between buy and sell.

const WINDOW_SIZE: usize = 50;
const KAPPA_MIN: f64 = 1e-3;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    buy: f64,
    sell: f64,
    total: f64,
}

#[derive(Debug, Clone)]
pub struct VpinState {
    window: std::collections::VecDeque<Bucket>,
    prev_price: Option<f64>,
}

impl Default for VpinState {
    fn default() -> Self {
        Self { window: std::collections::VecDeque::with_capacity(WINDOW_SIZE), prev_price: None }
    }
}

impl VpinState {
    /// Feed a trade's `price` and `volume`, returning `(risk8, vital6)`.
    pub fn update(&mut self, price: f64, volume: f64) -> (u8, u8) {
        let (buy, sell) = match self.prev_price {
            None => (volume * 0.5, volume * 0.5),
            Some(prev) if price > prev => (volume, 0.0),
            Some(prev) if price < prev => (0.0, volume),
            Some(_) => (volume * 0.5, volume * 0.5),
        };
        self.prev_price = Some(price);

        self.window.push_back(Bucket { buy, sell, total: volume });
        if self.window.len() > WINDOW_SIZE {
            self.window.pop_front();
        }

        if self.window.len() < 2 {
            return (128, 32);
        }

        let (mut total_buy, mut total_sell, mut total_vol) = (0.0, 0.0, 0.0);
        for b in &self.window {
            total_buy += b.buy;
            total_sell += b.sell;
            total_vol += b.total;
        }
        let total_vol = total_vol.max(KAPPA_MIN);

        let vpin = ((total_buy - total_sell).abs() / total_vol).clamp(0.0, 1.0);

        let risk8 = (vpin * 255.0).round().clamp(0.0, 255.0) as u8;
        let vital6 = ((1.0 - vpin) * 63.0).round().clamp(0.0, 63.0) as u8;
        (risk8, vital6)
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.prev_price = None;
    }
}
