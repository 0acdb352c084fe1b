//! Snapshot encoder (spec §4.I): vertex28 body, zstd/none compression,
//! contract-sample validation, and the response header contract.

use crate::asset::{Snapshot, Tier};
use crate::codec::vertex28::{Vertex28, VERTEX28_STRIDE};
use crate::error::{CoreError, CoreResult};

const CONTRACT_SAMPLE_SIZE: usize = 10;
const ZSTD_LEVEL: i32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Vertex28,
}

impl Format {
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "vertex28" => Ok(Format::Vertex28),
            other => Err(CoreError::CapabilityMissing { capability: format!("format={other}") }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Zstd,
    None,
}

impl Compression {
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "zstd" => Ok(Compression::Zstd),
            "none" => Ok(Compression::None),
            other => Err(CoreError::CapabilityMissing { capability: format!("compression={other}") }),
        }
    }
}

/// Header set matching §4.I.5 exactly, kept as an ordered list so the HTTP
/// layer can apply them without re-deriving names.
#[derive(Debug, Clone)]
pub struct ResponseHeaders {
    pub vertex_stride: usize,
    pub asset_count: usize,
    pub source_tier: &'static str,
    pub cache_control: &'static str,
    pub content_encoding: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct EncodedSnapshot {
    pub body: Vec<u8>,
    pub headers: ResponseHeaders,
}

/// Unpack and range-check `CONTRACT_SAMPLE_SIZE` records spaced evenly across
/// `vertex_bytes`, failing hard on the first violation. Never samples zero
/// records when the buffer is non-empty, and never samples more records than
/// exist.
fn validate_contract_sample(vertex_bytes: &[u8]) -> CoreResult<()> {
    let stride = VERTEX28_STRIDE;
    let record_count = vertex_bytes.len() / stride;
    if record_count == 0 {
        return Ok(());
    }
    let sample_count = CONTRACT_SAMPLE_SIZE.min(record_count);
    for i in 0..sample_count {
        let index = if sample_count == 1 { 0 } else { i * (record_count - 1) / (sample_count - 1) };
        let offset = index * stride;
        let chunk: [u8; VERTEX28_STRIDE] =
            vertex_bytes[offset..offset + stride].try_into().expect("stride-aligned slice");
        let record = Vertex28::from_bytes(&chunk);
        for (name, v) in [("x", record.x), ("y", record.y), ("z", record.z), ("fidelity", record.fidelity)] {
            if v.is_nan() || !(0.0..=1.0).contains(&v) {
                return Err(CoreError::Contract {
                    index,
                    reason: format!("{name}={v} outside [0,1] in contract sample"),
                });
            }
        }
    }
    Ok(())
}

/// Encode a snapshot for the wire. Returns `Ok(None)` for the 204-equivalent
/// empty-in-production case (§6.1); any other failure is a hard error the
/// HTTP layer maps to 422/400/503.
pub fn encode_snapshot(
    snapshot: &Snapshot,
    format: Format,
    compression: Compression,
    debug: bool,
) -> CoreResult<Option<EncodedSnapshot>> {
    if snapshot.assets.is_empty() && !debug {
        return Ok(None);
    }

    let Format::Vertex28 = format;
    let vertex_bytes = snapshot.vertex_bytes.as_ref();
    crate::codec::vertex28::validate_vertex28_blob(vertex_bytes)?;
    validate_contract_sample(vertex_bytes)?;

    let (body, content_encoding) = match compression {
        Compression::None => (vertex_bytes.to_vec(), None),
        Compression::Zstd => {
            let compressed = zstd::encode_all(vertex_bytes, ZSTD_LEVEL).map_err(|e| {
                CoreError::CapabilityMissing { capability: format!("zstd snapshot compression: {e}") }
            })?;
            (compressed, Some("zstd"))
        }
    };

    Ok(Some(EncodedSnapshot {
        body,
        headers: ResponseHeaders {
            vertex_stride: VERTEX28_STRIDE,
            asset_count: snapshot.assets.len(),
            source_tier: tier_header(snapshot.tier),
            cache_control: "no-store",
            content_encoding,
        },
    }))
}

fn tier_header(tier: Tier) -> &'static str {
    tier.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Governance, Sector, UniverseAsset};
    use bytes::Bytes;

    fn vertex_bytes(n: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for i in 0..n {
            let frac = (i as f32 + 1.0) / (n as f32 + 1.0);
            let v = Vertex28::new(i as u32, i as u32, frac, frac, frac, frac, 0.0).unwrap();
            out.extend_from_slice(&v.to_bytes());
        }
        out
    }

    fn asset(symbol: &str) -> UniverseAsset {
        UniverseAsset {
            symbol: symbol.to_string(),
            taxonomy32: 1,
            meta32: 1,
            fidelity: 0.9,
            governance: Governance::Sanctioned,
            x: 0.1,
            y: 0.1,
            z: 0.1,
            render_priority: 1,
            cluster_id: None,
            liquidity_tier: 1,
            sector: Sector::Tech,
            name: symbol.to_string(),
        }
    }

    fn snapshot(n: usize, tier: Tier) -> Snapshot {
        Snapshot {
            ts_ms: 0,
            assets: (0..n).map(|i| asset(&format!("A{i}"))).collect(),
            vertex_bytes: Bytes::from(vertex_bytes(n)),
            tier,
        }
    }

    #[test]
    fn empty_snapshot_outside_debug_is_none() {
        let snap = snapshot(0, Tier::Sovereign);
        let encoded = encode_snapshot(&snap, Format::Vertex28, Compression::None, false).unwrap();
        assert!(encoded.is_none());
    }

    #[test]
    fn empty_snapshot_in_debug_still_encodes() {
        let snap = snapshot(0, Tier::Sentinel);
        let encoded = encode_snapshot(&snap, Format::Vertex28, Compression::None, true).unwrap().unwrap();
        assert_eq!(encoded.body.len(), 0);
        assert_eq!(encoded.headers.asset_count, 0);
    }

    #[test]
    fn uncompressed_body_matches_raw_vertex_bytes() {
        let snap = snapshot(5, Tier::Sovereign);
        let encoded = encode_snapshot(&snap, Format::Vertex28, Compression::None, false).unwrap().unwrap();
        assert_eq!(encoded.body, snap.vertex_bytes.to_vec());
        assert!(encoded.headers.content_encoding.is_none());
    }

    #[test]
    fn compressed_body_round_trips_to_the_original() {
        let snap = snapshot(30, Tier::Ambassador);
        let encoded = encode_snapshot(&snap, Format::Vertex28, Compression::Zstd, false).unwrap().unwrap();
        assert_eq!(encoded.headers.content_encoding, Some("zstd"));
        let decompressed = zstd::decode_all(encoded.body.as_slice()).unwrap();
        assert_eq!(decompressed, snap.vertex_bytes.to_vec());
    }

    #[test]
    fn headers_report_stride_count_and_tier() {
        let snap = snapshot(12, Tier::Sentinel);
        let encoded = encode_snapshot(&snap, Format::Vertex28, Compression::None, false).unwrap().unwrap();
        assert_eq!(encoded.headers.vertex_stride, 28);
        assert_eq!(encoded.headers.asset_count, 12);
        assert_eq!(encoded.headers.source_tier, "sentinel");
        assert_eq!(encoded.headers.cache_control, "no-store");
    }

    #[test]
    fn malformed_stride_is_a_contract_violation() {
        let mut snap = snapshot(3, Tier::Sovereign);
        let mut bad = snap.vertex_bytes.to_vec();
        bad.push(0);
        snap.vertex_bytes = Bytes::from(bad);
        let err = encode_snapshot(&snap, Format::Vertex28, Compression::None, false).unwrap_err();
        assert_eq!(err.kind().as_code(), "STRIDE_28");
    }

    #[test]
    fn unsupported_format_is_capability_missing() {
        assert!(Format::parse("flatbuffer").is_err());
    }

    #[test]
    fn unsupported_compression_is_capability_missing() {
        assert!(Compression::parse("gzip").is_err());
    }

    #[test]
    fn contract_sample_catches_out_of_range_fidelity() {
        // Hand-build one bad record past the unit range by writing raw bytes,
        // bypassing Vertex28::new's own validation.
        let bad = Vertex28 { taxonomy32: 0, meta32: 0, x: 0.1, y: 0.1, z: 0.1, fidelity: 1.5, spin: 0.0 };
        let bytes = bad.to_bytes();
        let err = validate_contract_sample(&bytes).unwrap_err();
        assert_eq!(err.kind().as_code(), "CONTRACT");
    }

    #[test]
    fn sample_never_exceeds_available_record_count() {
        // 3 records is fewer than CONTRACT_SAMPLE_SIZE; must not panic or
        // divide by zero.
        let snap = snapshot(3, Tier::Sovereign);
        assert!(validate_contract_sample(snap.vertex_bytes.as_ref()).is_ok());
    }
}
