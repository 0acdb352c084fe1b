//! Fatal/internal error kinds for the materialization and streaming core.
//!
//! These map one-to-one onto the error table in the specification: each
//! variant is either fatal to the operation that raised it (codec, quota,
//! swap, pool) or a signal the tiered builder pattern-matches on
//! (`ProviderTimeout`, `CircuitOpen`) rather than propagates as a 5xx.

use thiserror::Error;

/// Machine-readable reason code, stable across releases (used in the HTTP
/// error envelope's `reason` field and in logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Stride28,
    Range,
    MortonCollision,
    MortonIrreparable,
    InsufficientInventory,
    SwapAssert,
    ProviderTimeout,
    CircuitOpen,
    PoolExhausted,
    AbaStaleRelease,
    Contract,
    CapabilityMissing,
}

impl ErrorKind {
    pub fn as_code(&self) -> &'static str {
        match self {
            ErrorKind::Stride28 => "STRIDE_28",
            ErrorKind::Range => "RANGE",
            ErrorKind::MortonCollision => "MORTON_COLLISION",
            ErrorKind::MortonIrreparable => "MORTON_IRREPARABLE",
            ErrorKind::InsufficientInventory => "INSUFFICIENT_INVENTORY",
            ErrorKind::SwapAssert => "SWAP_ASSERT",
            ErrorKind::ProviderTimeout => "PROVIDER_TIMEOUT",
            ErrorKind::CircuitOpen => "CIRCUIT_OPEN",
            ErrorKind::PoolExhausted => "POOL_EXHAUSTED",
            ErrorKind::AbaStaleRelease => "ABA_STALE_RELEASE",
            ErrorKind::Contract => "CONTRACT",
            ErrorKind::CapabilityMissing => "CAPABILITY_MISSING",
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("FAIL_FAST: buffer length {len} is not a multiple of 28 (STRIDE_28)")]
    Stride28 { len: usize },

    #[error("RANGE: {field} out of bounds or non-finite: {detail}")]
    Range { field: &'static str, detail: String },

    #[error("MORTON_COLLISION: {count} duplicate morton codes in staging")]
    MortonCollision { count: usize },

    #[error("MORTON_IRREPARABLE: exceeded {attempts} resample attempts for asset {asset}")]
    MortonIrreparable { asset: String, attempts: u32 },

    #[error("INSUFFICIENT_INVENTORY: source has {available} rows, target requires {target}")]
    InsufficientInventory { available: usize, target: usize },

    #[error("SWAP_ASSERT: {reason}")]
    SwapAssert { reason: String },

    #[error("PROVIDER_TIMEOUT: sovereign tier exceeded {deadline_ms}ms deadline")]
    ProviderTimeout { deadline_ms: u64 },

    #[error("CIRCUIT_OPEN: sovereign tier circuit breaker is open")]
    CircuitOpen,

    #[error("POOL_EXHAUSTED: void pool has no free slots (capacity {capacity})")]
    PoolExhausted { capacity: usize },

    #[error("ABA_STALE_RELEASE: release rejected for slot {slot} (generation mismatch)")]
    AbaStaleRelease { slot: u32 },

    #[error("CONTRACT: sample validation failed at record {index}: {reason}")]
    Contract { index: usize, reason: String },

    #[error("CAPABILITY_MISSING: {capability} is not available; no silent downgrade")]
    CapabilityMissing { capability: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Stride28 { .. } => ErrorKind::Stride28,
            CoreError::Range { .. } => ErrorKind::Range,
            CoreError::MortonCollision { .. } => ErrorKind::MortonCollision,
            CoreError::MortonIrreparable { .. } => ErrorKind::MortonIrreparable,
            CoreError::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
            CoreError::SwapAssert { .. } => ErrorKind::SwapAssert,
            CoreError::ProviderTimeout { .. } => ErrorKind::ProviderTimeout,
            CoreError::CircuitOpen => ErrorKind::CircuitOpen,
            CoreError::PoolExhausted { .. } => ErrorKind::PoolExhausted,
            CoreError::AbaStaleRelease { .. } => ErrorKind::AbaStaleRelease,
            CoreError::Contract { .. } => ErrorKind::Contract,
            CoreError::CapabilityMissing { .. } => ErrorKind::CapabilityMissing,
        }
    }

    /// Human-readable remediation, surfaced in the HTTP error envelope.
    pub fn remediation(&self) -> String {
        match self {
            CoreError::Stride28 { .. } => {
                "the buffer was truncated or corrupted in transit; re-request the snapshot".into()
            }
            CoreError::Range { .. } => "reject and re-validate the offending input".into(),
            CoreError::MortonCollision { .. } => {
                "re-run materialization; collision repair should resolve this automatically".into()
            }
            CoreError::MortonIrreparable { .. } => {
                "source coordinates are too degenerate to separate; widen normalization bounds".into()
            }
            CoreError::InsufficientInventory { .. } => {
                "grow the source inventory or lower the target rowcount".into()
            }
            CoreError::SwapAssert { .. } => {
                "materialization was rolled back; the previous canonical snapshot is untouched".into()
            }
            CoreError::ProviderTimeout { .. } => {
                "sovereign tier is slow; the response fell back to a lower tier".into()
            }
            CoreError::CircuitOpen => {
                "sovereign tier is circuit-broken; retry after the cooldown window".into()
            }
            CoreError::PoolExhausted { .. } => "raise VoidPool capacity or release stale slots".into(),
            CoreError::AbaStaleRelease { .. } => "this is a bug in the caller; the release was ignored".into(),
            CoreError::Contract { .. } => "do not cache this response; re-materialize".into(),
            CoreError::CapabilityMissing { .. } => {
                "request a supported format/compression combination".into()
            }
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
