//! Codec error types

use core::fmt;

/// Wire section, used to locate errors and in log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    GlobalProperties,
    PointsKeys,
    PointsIndices,
    NormalsIndices,
    TexCoordsKeys,
    TexCoordsIndices,
    Points,
    Normals,
    TexCoords,
    Parts,
    Materials,
    Nodes,
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::GlobalProperties => "global properties",
            Section::PointsKeys => "points keys",
            Section::PointsIndices => "points indices",
            Section::NormalsIndices => "normals indices",
            Section::TexCoordsKeys => "tex coords keys",
            Section::TexCoordsIndices => "tex coords indices",
            Section::Points => "points",
            Section::Normals => "normals",
            Section::TexCoords => "tex coords",
            Section::Parts => "parts",
            Section::Materials => "materials",
            Section::Nodes => "nodes",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoding failure
///
/// Every variant is fatal; the decoder never returns a partial model.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Stream ended inside a declared field
    #[error("unexpected end of stream in {section}")]
    UnexpectedEof { section: Section },

    /// Underlying reader failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Repeat or run sentinel with nothing to repeat yet
    #[error("sentinel at {section}[{position}] before {required} values were read")]
    SentinelBeforeData {
        section: Section,
        position: usize,
        required: usize,
    },

    /// Backreference into a lookup table that is too short
    #[error("{section}[{position}] references table entry {index} (table size {len})")]
    BackreferenceOutOfRange {
        section: Section,
        position: usize,
        index: usize,
        len: usize,
    },

    /// Copy or run would write past the declared section length
    #[error("{section}[{position}] expands to {needed} values past declared length {len}")]
    GroupOverflow {
        section: Section,
        position: usize,
        needed: u64,
        len: usize,
    },

    /// Scalar matches no literal, backreference, or run range
    #[error("invalid sentinel {value} at {section}[{position}]")]
    InvalidSentinel {
        section: Section,
        position: usize,
        value: f32,
    },

    /// Key table not strictly ascending (or contains NaN)
    #[error("{section} not strictly ascending at entry {position}")]
    UnsortedKeys { section: Section, position: usize },

    /// String bytes are not UTF-8
    #[error("invalid UTF-8 string in {section}")]
    InvalidString { section: Section },

    /// Face index (literal or run-generated) past the decoded points
    #[error("part {part} index [{position}] = {index} out of range ({points} points)")]
    FaceIndexOutOfRange {
        part: usize,
        position: usize,
        index: u16,
        points: usize,
    },

    /// Node part referencing a missing part or material
    #[error(
        "node part ({part_index}, {material_index}) out of range ({parts} parts, {materials} materials)"
    )]
    NodePartOutOfRange {
        part_index: u8,
        material_index: u8,
        parts: usize,
        materials: usize,
    },
}

/// Encoding failure
///
/// All variants except `Io` are raised before the first byte is written.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Sequence longer than its count prefix allows
    #[error("too many {what}: {count} (max {max})")]
    TooMany {
        what: &'static str,
        count: usize,
        max: usize,
    },

    /// String longer than its length prefix allows
    #[error("string of {len} bytes exceeds the {max} byte limit", max = crate::MAX_STRING_LEN)]
    StringTooLong { len: usize },

    /// Value that would be read back as a sentinel
    #[error("{section}[{position}] = {value} cannot be stored literally")]
    NonEncodableValue {
        section: Section,
        position: usize,
        value: f32,
    },

    /// Part length not divisible by 3
    #[error("part {part} has {len} indices (must be divisible by 3)")]
    IncompleteTriangle { part: usize, len: usize },

    /// Face index outside the points array
    #[error("part {part} index [{position}] = {index} out of range ({points} points)")]
    FaceIndexOutOfRange {
        part: usize,
        position: usize,
        index: u16,
        points: usize,
    },

    /// Node part referencing a missing part or material
    #[error(
        "node part ({part_index}, {material_index}) out of range ({parts} parts, {materials} materials)"
    )]
    NodePartOutOfRange {
        part_index: u8,
        material_index: u8,
        parts: usize,
        materials: usize,
    },

    /// Large index the decoder would read as a run
    #[error("part {part} index [{position}] = {index} would decode as a run")]
    AmbiguousIndex {
        part: usize,
        position: usize,
        index: u16,
    },

    /// Underlying writer failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DecodeError::UnexpectedEof {
                section: Section::Normals
            }
            .to_string(),
            "unexpected end of stream in normals"
        );
        assert_eq!(
            DecodeError::SentinelBeforeData {
                section: Section::Points,
                position: 0,
                required: 3,
            }
            .to_string(),
            "sentinel at points[0] before 3 values were read"
        );
        assert_eq!(
            EncodeError::TooMany {
                what: "materials",
                count: 300,
                max: 255,
            }
            .to_string(),
            "too many materials: 300 (max 255)"
        );
        assert_eq!(
            EncodeError::StringTooLong { len: 70000 }.to_string(),
            "string of 70000 bytes exceeds the 65535 byte limit"
        );
    }
}
