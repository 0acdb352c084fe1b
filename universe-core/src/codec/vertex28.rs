//! Vertex28: the 28-byte, little-endian, tightly packed GPU vertex record.
//!
//! Field order (matches the wire contract exactly):
//! `taxonomy32 | meta32 | x | y | z | fidelity | spin`.

use bytemuck::{Pod, Zeroable};

use crate::error::CoreError;

pub const VERTEX28_STRIDE: usize = 28;

/// Zero-copy, `#[repr(C)]` mirror of the wire layout. `bytemuck` gives us a
/// checked, allocation-free cast to/from `&[u8]` as long as the host is
/// little-endian-compatible at the byte level (the struct is written out
/// field-by-field in [`Vertex28::to_bytes`] rather than relying on host
/// endianness, so this type is safe to use on big-endian hosts too).
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex28 {
    pub taxonomy32: u32,
    pub meta32: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub fidelity: f32,
    pub spin: f32,
}

impl Vertex28 {
    /// Construct a record, validating the wire-critical range invariants
    /// (I-RANGE): `x, y, z, fidelity ∈ [0,1]` and none of them NaN.
    pub fn new(
        taxonomy32: u32,
        meta32: u32,
        x: f32,
        y: f32,
        z: f32,
        fidelity: f32,
        spin: f32,
    ) -> Result<Self, CoreError> {
        for (field, v) in [("x", x), ("y", y), ("z", z), ("fidelity", fidelity)] {
            if v.is_nan() {
                return Err(CoreError::Range { field, detail: "NaN".to_string() });
            }
            if !(0.0..=1.0).contains(&v) {
                return Err(CoreError::Range { field, detail: format!("{v} not in [0,1]") });
            }
        }
        if spin.is_nan() {
            return Err(CoreError::Range { field: "spin", detail: "NaN".to_string() });
        }
        Ok(Self { taxonomy32, meta32, x, y, z, fidelity, spin })
    }

    /// Serialize to exactly 28 little-endian bytes.
    pub fn to_bytes(&self) -> [u8; VERTEX28_STRIDE] {
        let mut out = [0u8; VERTEX28_STRIDE];
        out[0..4].copy_from_slice(&self.taxonomy32.to_le_bytes());
        out[4..8].copy_from_slice(&self.meta32.to_le_bytes());
        out[8..12].copy_from_slice(&self.x.to_le_bytes());
        out[12..16].copy_from_slice(&self.y.to_le_bytes());
        out[16..20].copy_from_slice(&self.z.to_le_bytes());
        out[20..24].copy_from_slice(&self.fidelity.to_le_bytes());
        out[24..28].copy_from_slice(&self.spin.to_le_bytes());
        out
    }

    /// Decode 28 little-endian bytes. Does not re-validate I-RANGE — callers
    /// that need the invariant checked should follow with
    /// [`validate_vertex28_blob`] plus a contract sample pass (see the
    /// snapshot encoder).
    pub fn from_bytes(buf: &[u8; VERTEX28_STRIDE]) -> Self {
        Self {
            taxonomy32: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            meta32: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            x: f32::from_le_bytes(buf[8..12].try_into().unwrap()),
            y: f32::from_le_bytes(buf[12..16].try_into().unwrap()),
            z: f32::from_le_bytes(buf[16..20].try_into().unwrap()),
            fidelity: f32::from_le_bytes(buf[20..24].try_into().unwrap()),
            spin: f32::from_le_bytes(buf[24..28].try_into().unwrap()),
        }
    }
}

/// Concatenate records into a flat buffer (I-STRIDE is true by construction:
/// `28 * n`).
pub fn pack_vertex_buffer(records: &[Vertex28]) -> Vec<u8> {
    let mut out = Vec::with_capacity(records.len() * VERTEX28_STRIDE);
    for r in records {
        out.extend_from_slice(&r.to_bytes());
    }
    out
}

/// Validate that `buf.len()` is a multiple of 28 (I-STRIDE). Fails fast with
/// [`CoreError::Stride28`] otherwise — this must never be relaxed.
pub fn validate_vertex28_blob(buf: &[u8]) -> Result<(), CoreError> {
    if buf.len() % VERTEX28_STRIDE != 0 {
        return Err(CoreError::Stride28 { len: buf.len() });
    }
    Ok(())
}

/// Decode every record in a validated buffer.
pub fn unpack_vertex_buffer(buf: &[u8]) -> Result<Vec<Vertex28>, CoreError> {
    validate_vertex28_blob(buf)?;
    Ok(buf
        .chunks_exact(VERTEX28_STRIDE)
        .map(|chunk| Vertex28::from_bytes(chunk.try_into().unwrap()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_within_one_ulp() {
        let v = Vertex28::new(0xDEADBEEF, 0x11223344, 0.25, 0.5, 0.75, 0.9, 0.5).unwrap();
        let bytes = v.to_bytes();
        assert_eq!(bytes.len(), VERTEX28_STRIDE);
        let back = Vertex28::from_bytes(&bytes);
        assert_eq!(back.taxonomy32, 0xDEADBEEF);
        assert_eq!(back.meta32, 0x11223344);
        assert!((back.x - 0.25).abs() <= f32::EPSILON);
        assert!((back.y - 0.5).abs() <= f32::EPSILON);
        assert!((back.z - 0.75).abs() <= f32::EPSILON);
        assert!((back.fidelity - 0.9).abs() <= f32::EPSILON);
        assert!((back.spin - 0.5).abs() <= f32::EPSILON);
    }

    #[test]
    fn stride_validation_rejects_27_bytes() {
        let buf = vec![0u8; 27];
        let err = validate_vertex28_blob(&buf).unwrap_err();
        assert_eq!(err.kind().as_code(), "STRIDE_28");
        assert!(err.to_string().contains("FAIL_FAST"));
    }

    #[test]
    fn stride_holds_for_any_concatenation() {
        for n in 0..10usize {
            let records = vec![Vertex28::new(0, 0, 0.0, 0.0, 0.0, 0.0, 0.0).unwrap(); n];
            let buf = pack_vertex_buffer(&records);
            assert_eq!(buf.len(), n * VERTEX28_STRIDE);
            assert!(validate_vertex28_blob(&buf).is_ok());
        }
    }

    #[test]
    fn rejects_nan_coordinate() {
        assert!(Vertex28::new(0, 0, f32::NAN, 0.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn rejects_out_of_unit_range() {
        assert!(Vertex28::new(0, 0, 1.5, 0.0, 0.0, 0.0, 0.0).is_err());
        assert!(Vertex28::new(0, 0, -0.1, 0.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn spin_is_unbounded_but_not_nan() {
        assert!(Vertex28::new(0, 0, 0.0, 0.0, 0.0, 0.0, -42.5).is_ok());
        assert!(Vertex28::new(0, 0, 0.0, 0.0, 0.0, 0.0, f32::NAN).is_err());
    }

    #[test]
    fn unpack_buffer_round_trip() {
        let records = vec![
            Vertex28::new(1, 2, 0.1, 0.2, 0.3, 0.4, 0.5).unwrap(),
            Vertex28::new(3, 4, 0.5, 0.6, 0.7, 0.8, 0.9).unwrap(),
        ];
        let buf = pack_vertex_buffer(&records);
        let decoded = unpack_vertex_buffer(&buf).unwrap();
        assert_eq!(decoded, records);
    }
}
