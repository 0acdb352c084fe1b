//! Bit-packed encodings and the Vertex28 binary contract (spec §4.A).

pub mod meta32;
pub mod morton;
pub mod taxonomy32;
pub mod taxonomy_legacy;
pub mod vertex28;

pub use meta32::{pack_meta32, unpack_meta32, Meta};
pub use morton::{morton63, morton63_salted, morton63_to_u32};
pub use taxonomy32::{pack_taxonomy32, unpack_taxonomy32, Taxonomy};
pub use vertex28::{
    pack_vertex_buffer, unpack_vertex_buffer, validate_vertex28_blob, Vertex28, VERTEX28_STRIDE,
};
