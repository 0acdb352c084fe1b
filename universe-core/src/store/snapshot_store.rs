//! Snapshot store (spec §4.E): the authoritative Vertex28 buffer plus its
//! symbol/asset-id indices, guarded by a single read-write exclusion.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use uuid::Uuid;

use crate::codec::vertex28::VERTEX28_STRIDE;
use crate::codec::Vertex28;
use crate::error::{CoreError, CoreResult};

struct StoreInner {
    bytes: Vec<u8>,
    symbol_to_index: HashMap<String, usize>,
    index_to_asset_id: Vec<Uuid>,
}

/// Owns the flat `N*28`-byte vertex buffer plus its indices. Reads
/// (`snapshot`) take an owned copy so writers are never blocked by a slow
/// reader beyond the copy itself; writes (`update_meta32`/`update_batch`)
/// patch the 4-byte meta lane in place, leaving the rest of each record
/// untouched.
pub struct SnapshotStore {
    inner: RwLock<StoreInner>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                bytes: Vec::new(),
                symbol_to_index: HashMap::new(),
                index_to_asset_id: Vec::new(),
            }),
        }
    }

    /// Replace the buffer wholesale and rebuild the indices. Called by the
    /// materializer/tiered builder after a (re)materialization.
    pub fn initialize(&self, records: &[(String, Uuid, Vertex28)]) {
        let mut bytes = Vec::with_capacity(records.len() * VERTEX28_STRIDE);
        let mut symbol_to_index = HashMap::with_capacity(records.len());
        let mut index_to_asset_id = Vec::with_capacity(records.len());
        for (index, (symbol, asset_id, vertex)) in records.iter().enumerate() {
            bytes.extend_from_slice(&vertex.to_bytes());
            symbol_to_index.insert(symbol.clone(), index);
            index_to_asset_id.push(*asset_id);
        }
        let mut guard = self.inner.write().unwrap();
        guard.bytes = bytes;
        guard.symbol_to_index = symbol_to_index;
        guard.index_to_asset_id = index_to_asset_id;
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().bytes.len() / VERTEX28_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.inner.read().unwrap().symbol_to_index.get(symbol).copied()
    }

    pub fn asset_id_at(&self, index: usize) -> Option<Uuid> {
        self.inner.read().unwrap().index_to_asset_id.get(index).copied()
    }

    /// Patch the 4-byte `meta32` lane at `28*index + 4`, preserving every
    /// other field of the record.
    pub fn update_meta32(&self, index: usize, meta32: u32) -> CoreResult<()> {
        let mut guard = self.inner.write().unwrap();
        let offset = index
            .checked_mul(VERTEX28_STRIDE)
            .filter(|&o| o + VERTEX28_STRIDE <= guard.bytes.len())
            .ok_or(CoreError::Range {
                field: "index",
                detail: format!("index {index} out of bounds"),
            })?;
        guard.bytes[offset + 4..offset + 8].copy_from_slice(&meta32.to_le_bytes());
        Ok(())
    }

    /// Apply a batch of `(index, meta32)` patches in input-iteration order.
    pub fn update_batch(&self, updates: &[(usize, u32)]) -> CoreResult<()> {
        let mut guard = self.inner.write().unwrap();
        for &(index, meta32) in updates {
            let offset = index
                .checked_mul(VERTEX28_STRIDE)
                .filter(|&o| o + VERTEX28_STRIDE <= guard.bytes.len())
                .ok_or(CoreError::Range {
                    field: "index",
                    detail: format!("index {index} out of bounds"),
                })?;
            guard.bytes[offset + 4..offset + 8].copy_from_slice(&meta32.to_le_bytes());
        }
        Ok(())
    }

    /// A logically immutable copy of the current buffer. Readers never
    /// observe a partially-written record because the copy is taken under
    /// the same read lock that serializes against in-place patches.
    pub fn snapshot(&self) -> Bytes {
        Bytes::from(self.inner.read().unwrap().bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(tax: u32) -> Vertex28 {
        Vertex28::new(tax, 0, 0.1, 0.2, 0.3, 0.5, 0.0).unwrap()
    }

    #[test]
    fn initialize_builds_symbol_index() {
        let store = SnapshotStore::new();
        store.initialize(&[
            ("AAA".to_string(), Uuid::nil(), vertex(1)),
            ("BBB".to_string(), Uuid::nil(), vertex(2)),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.index_of("AAA"), Some(0));
        assert_eq!(store.index_of("BBB"), Some(1));
        assert_eq!(store.index_of("ZZZ"), None);
    }

    #[test]
    fn update_meta32_preserves_other_fields() {
        let store = SnapshotStore::new();
        store.initialize(&[("AAA".to_string(), Uuid::nil(), vertex(0xABCD))]);
        store.update_meta32(0, 0x1234).unwrap();
        let snap = store.snapshot();
        let records = crate::codec::unpack_vertex_buffer(&snap).unwrap();
        assert_eq!(records[0].taxonomy32, 0xABCD);
        assert_eq!(records[0].meta32, 0x1234);
    }

    #[test]
    fn update_batch_applies_in_order() {
        let store = SnapshotStore::new();
        store.initialize(&[
            ("AAA".to_string(), Uuid::nil(), vertex(1)),
            ("BBB".to_string(), Uuid::nil(), vertex(2)),
        ]);
        store.update_batch(&[(0, 0xA), (1, 0xB)]).unwrap();
        let snap = store.snapshot();
        let records = crate::codec::unpack_vertex_buffer(&snap).unwrap();
        assert_eq!(records[0].meta32, 0xA);
        assert_eq!(records[1].meta32, 0xB);
    }

    #[test]
    fn out_of_bounds_update_is_rejected() {
        let store = SnapshotStore::new();
        store.initialize(&[("AAA".to_string(), Uuid::nil(), vertex(1))]);
        assert!(store.update_meta32(5, 0).is_err());
    }

    #[test]
    fn snapshot_length_is_exact_stride_multiple() {
        let store = SnapshotStore::new();
        store.initialize(&[
            ("AAA".to_string(), Uuid::nil(), vertex(1)),
            ("BBB".to_string(), Uuid::nil(), vertex(2)),
            ("CCC".to_string(), Uuid::nil(), vertex(3)),
        ]);
        assert_eq!(store.snapshot().len(), 3 * VERTEX28_STRIDE);
    }
}
