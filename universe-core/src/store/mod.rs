//! Shared Vertex28 buffer and its indices (spec §4.E).

pub mod snapshot_store;

pub use snapshot_store::SnapshotStore;
