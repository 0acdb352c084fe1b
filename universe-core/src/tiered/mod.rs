//! Sovereign → Ambassador → Sentinel tiered snapshot builder (spec §4.G).

pub mod ambassador;
pub mod breaker;
pub mod builder;
pub mod sentinel;
pub mod sovereign;

pub use breaker::CircuitBreaker;
pub use builder::{TieredBuilder, DEFAULT_DEADLINE, DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT};
pub use sovereign::{SovereignResult, SovereignSource};
