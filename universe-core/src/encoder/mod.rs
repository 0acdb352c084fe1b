//! Snapshot encoder (spec §4.I).

pub mod snapshot_encoder;

pub use snapshot_encoder::{encode_snapshot, Compression, EncodedSnapshot, Format, ResponseHeaders};
