use thiserror::Error;

/// Errors that can occur when parsing the binary TIFF structure of an EXIF block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TiffError {
    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42, got {0}")]
    InvalidVersion(u16),

    /// Block is too small for the structure being read
    #[error("Truncated TIFF data: need at least {required} bytes, got {actual}")]
    Truncated { required: usize, actual: usize },

    /// IFD offset points outside the block
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u32),

    /// IFD offset was already visited while walking the directory graph
    #[error("Directory cycle detected at offset {0}")]
    DirectoryCycle(u32),

    /// Field value declared by count/type does not fit in the remaining bytes
    #[error("Field 0x{tag:04X} value out of range: {length} bytes at offset {offset}")]
    FieldOutOfRange { tag: u16, offset: u32, length: u64 },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors surfaced by the metadata engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExifError {
    /// Input is not a recognizable JPEG/TIFF structure
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    /// IFD structure is broken beyond what partial parsing can recover
    #[error("Malformed directory: {0}")]
    MalformedDirectory(#[from] TiffError),

    /// No TIFF field type accepted by the tag matches the value's shape
    #[error("No field type of tag 0x{tag:04X} ({name}) accepts a {shape} value")]
    UnknownFieldType {
        tag: i32,
        name: &'static str,
        shape: &'static str,
    },

    /// Serialized APP1 payload does not fit in one JPEG segment
    #[error("EXIF segment too large: {size} bytes exceeds the {limit} byte limit")]
    SegmentTooLarge { size: usize, limit: usize },

    /// Update requested against an image without EXIF metadata
    #[error("Image has no EXIF metadata")]
    MissingExif,
}

impl ExifError {
    /// Shorthand for an `UnsupportedFormat` error.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        ExifError::UnsupportedFormat {
            reason: reason.into(),
        }
    }
}
