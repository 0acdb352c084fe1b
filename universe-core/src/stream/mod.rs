//! Delta streaming protocol (spec §4.H).

pub mod protocol;

pub use protocol::{
    decode_frame, encode_frame, Frame, Opcode, ASSET_ID_BYTES, OP_ASSET_ADD, OP_ASSET_REMOVE,
    OP_FIDELITY_UPDATE,
};
