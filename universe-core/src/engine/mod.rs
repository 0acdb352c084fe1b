//! Tick engine: batch price updates → detectors → `meta32` patches (spec §4.D).

pub mod tick_engine;

pub use tick_engine::{PriceUpdate, TickEngine, WORK_CAP_PER_TICK};
