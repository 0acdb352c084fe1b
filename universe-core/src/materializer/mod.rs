//! Deterministic materialization pipeline (spec §4.F): quota planning,
//! derivation, staging, collision repair, and the atomic swap.

pub mod collision;
pub mod derive;
pub mod pipeline;
pub mod quota;
pub mod staging;

pub use pipeline::{materialize, vertex_buffer, CanonicalSink, InMemorySink};
pub use quota::{plan_quota, QuotaPlan, Transfer};
pub use staging::{stage_row, Bounds, SourceRow, StagedRow};
