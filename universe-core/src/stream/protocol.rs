//! Delta streaming frame protocol (spec §4.H): opcoded, MessagePack-tagged,
//! optionally zstd-compressed, self-contained frames at a fixed cadence.

use serde::{Deserialize, Serialize};

use crate::codec::vertex28::VERTEX28_STRIDE;
use crate::error::CoreError;

pub const OP_ASSET_ADD: u8 = 0x01;
pub const OP_ASSET_REMOVE: u8 = 0x02;
pub const OP_FIDELITY_UPDATE: u8 = 0x03;

/// Canonical asset identifier width used by `ASSET_REMOVE`/`FIDELITY_UPDATE`
/// payloads — a fixed 16-byte UUID, not a variable-length symbol string.
pub const ASSET_ID_BYTES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opcode {
    AssetAdd,
    AssetRemove,
    FidelityUpdate,
}

impl Opcode {
    pub fn as_u8(&self) -> u8 {
        match self {
            Opcode::AssetAdd => OP_ASSET_ADD,
            Opcode::AssetRemove => OP_ASSET_REMOVE,
            Opcode::FidelityUpdate => OP_FIDELITY_UPDATE,
        }
    }

    /// Decoders reject unknown opcodes (spec §4.H) rather than skip them.
    pub fn from_u8(op: u8) -> Result<Self, CoreError> {
        match op {
            OP_ASSET_ADD => Ok(Opcode::AssetAdd),
            OP_ASSET_REMOVE => Ok(Opcode::AssetRemove),
            OP_FIDELITY_UPDATE => Ok(Opcode::FidelityUpdate),
            other => Err(CoreError::Contract { index: 0, reason: format!("unknown opcode {other:#04x}") }),
        }
    }
}

/// Wire shape of one frame: `{ op: u8, payload: bytes }`. Frames never
/// reference prior frames — every payload stands alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frame {
    pub op: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn asset_add(vertex_bytes: &[u8]) -> Self {
        Self { op: OP_ASSET_ADD, payload: vertex_bytes.to_vec() }
    }

    pub fn asset_remove(asset_id: [u8; ASSET_ID_BYTES]) -> Self {
        Self { op: OP_ASSET_REMOVE, payload: asset_id.to_vec() }
    }

    pub fn fidelity_update(asset_id: [u8; ASSET_ID_BYTES], fidelity_millionths: u32) -> Self {
        let mut payload = Vec::with_capacity(ASSET_ID_BYTES + 4);
        payload.extend_from_slice(&asset_id);
        payload.extend_from_slice(&fidelity_millionths.to_le_bytes());
        Self { op: OP_FIDELITY_UPDATE, payload }
    }

    pub fn opcode(&self) -> Result<Opcode, CoreError> {
        Opcode::from_u8(self.op)
    }

    /// Validate payload shape for the opcode this frame carries. Rejects a
    /// well-formed-MessagePack frame whose payload doesn't match its
    /// opcode's expected layout, which `serde` alone cannot catch since both
    /// fields decode independently of one another.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.opcode()? {
            Opcode::AssetAdd => {
                if self.payload.len() % VERTEX28_STRIDE != 0 {
                    return Err(CoreError::Stride28 { len: self.payload.len() });
                }
            }
            Opcode::AssetRemove => {
                if self.payload.len() != ASSET_ID_BYTES {
                    return Err(CoreError::Contract {
                        index: 0,
                        reason: format!("ASSET_REMOVE payload must be {ASSET_ID_BYTES} bytes, got {}", self.payload.len()),
                    });
                }
            }
            Opcode::FidelityUpdate => {
                let expected = ASSET_ID_BYTES + 4;
                if self.payload.len() != expected {
                    return Err(CoreError::Contract {
                        index: 0,
                        reason: format!("FIDELITY_UPDATE payload must be {expected} bytes, got {}", self.payload.len()),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Encode a frame via the tagged MessagePack-equivalent binary encoder
/// (`rmp-serde`), then optionally zstd-compress the whole encoded frame.
pub fn encode_frame(frame: &Frame, compress: bool) -> Result<Vec<u8>, CoreError> {
    let packed = rmp_serde::to_vec(frame)
        .map_err(|e| CoreError::Contract { index: 0, reason: format!("frame encode failed: {e}") })?;
    if compress {
        zstd::encode_all(packed.as_slice(), 0)
            .map_err(|e| CoreError::CapabilityMissing { capability: format!("zstd frame compression: {e}") })
    } else {
        Ok(packed)
    }
}

/// Decode a frame, optionally zstd-decompressing first, then validating it
/// against its own opcode's payload shape.
pub fn decode_frame(bytes: &[u8], compressed: bool) -> Result<Frame, CoreError> {
    let raw = if compressed {
        zstd::decode_all(bytes)
            .map_err(|e| CoreError::CapabilityMissing { capability: format!("zstd frame decompression: {e}") })?
    } else {
        bytes.to_vec()
    };
    let frame: Frame = rmp_serde::from_slice(&raw)
        .map_err(|e| CoreError::Contract { index: 0, reason: format!("frame decode failed: {e}") })?;
    frame.validate()?;
    Ok(frame)
}
