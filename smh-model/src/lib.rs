//! smh-model: compact binary mesh codec
//!
//! Converts between the canonical in-memory mesh model ([`Model`]) and the
//! compact `.smhmb` binary stream. The stream trades a handful of sentinel
//! conventions for size: repeated points collapse to NaN, frequent points and
//! UVs become keys into sorted lookup tables, normal runs are stored as a
//! single count, and ascending face-index runs shrink to one negative value.
//!
//! The decoder resolves every one of those tricks, so a decoded [`Model`] only
//! ever contains plain arrays.
//!
//! # Stream Layout
//!
//! All multi-byte values are big-endian. Sections follow each other with no
//! padding:
//!
//! ```text
//! global properties   u8 count, then strings (u16 length + UTF-8 bytes)
//! points keys         u16 count, then count × f32 (strictly ascending)
//! points indices      keys × 3 × f32 (no count)
//! normals indices     u16 count, then count × 3 × f32
//! tex coords keys     u16 count, then count × f32 (strictly ascending)
//! tex coords indices  keys × 2 × f32 (no count)
//! points              u16 vertex count, then sentinel-coded f32 stream
//! normals             u16 normal count, then sentinel-coded f32 stream
//! tex coords          u16 UV count, then sentinel-coded f32 stream
//! parts               u8 count; each: u16 index count + run-coded i16 stream
//! materials           u8 count; each: 9 color bytes, opacity u8,
//!                     shininess f32, diffuse + specular texture strings
//! nodes               u8 count; each: id, T(3) R(4) S(3) f32, properties,
//!                     node parts (u8 count, u8 pairs), children (u8 count)
//! ```
//!
//! # Usage
//!
//! ```
//! use smh_model::{decode_bytes, encode_to_vec, EncodeOptions, Model};
//!
//! let model = Model {
//!     points: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
//!     parts: vec![vec![0, 1, 2]],
//!     ..Model::default()
//! };
//!
//! let bytes = encode_to_vec(&model, &EncodeOptions::default()).unwrap();
//! let decoded = decode_bytes(&bytes).unwrap();
//! assert_eq!(decoded, model);
//! ```

mod decode;
mod encode;
mod error;
mod io;
mod model;
mod text;
mod validate;

pub use decode::{decode, decode_bytes};
pub use encode::{encode, encode_to_vec, EncodeOptions, EncodeStats};
pub use error::{DecodeError, EncodeError, Section};
pub use model::{Material, Model, Node, NodePart};
pub use text::write_text;

// =============================================================================
// Constants
// =============================================================================

/// Scalars per point
pub const POINT_SIZE: usize = 3;

/// Scalars per normal
pub const NORMAL_SIZE: usize = 3;

/// Scalars per texture coordinate
pub const TEX_COORD_SIZE: usize = 2;

/// Indices per face
pub const FACE_SIZE: usize = 3;

/// Largest count stored in a one-byte prefix
pub const MAX_U8_COUNT: usize = u8::MAX as usize;

/// Largest count stored in a two-byte prefix
pub const MAX_U16_COUNT: usize = u16::MAX as usize;

/// Largest UTF-8 string (in bytes) the two-byte length prefix can hold
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// File extension of the binary format
pub const BINARY_EXTENSION: &str = "smhmb";

/// File extension of the text format
pub const TEXT_EXTENSION: &str = "smhmt";
