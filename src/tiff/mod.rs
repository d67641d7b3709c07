//! TIFF directory model for EXIF metadata.
//!
//! The EXIF block of a JPEG is a small TIFF file: a header, a chain of IFDs
//! and out-of-line value data, all addressed by offsets from the header.
//!
//! # Key Concepts
//!
//! - **Byte order**: the header declares endianness (II = little-endian,
//!   MM = big-endian); every multi-byte value follows it.
//!
//! - **Directory roles**: IFD0 describes the main image, IFD1 the thumbnail.
//!   The Exif and GPS IFDs hang off IFD0 through pointer tags, the
//!   Interoperability IFD off the Exif IFD.
//!
//! - **Inline vs offset values**: values of up to 4 bytes live inside the
//!   12-byte entry; larger ones live elsewhere in the block.
//!
//! - **Read vs write**: [`ImageMetadata`] is an immutable parse result;
//!   [`OutputSet`] is the mutable structure that gets serialized.

mod parser;
mod reader;
mod tags;
mod values;
pub mod write;

pub use parser::{ByteOrder, IfdEntry, RawIfd, TiffHeader, TIFF_HEADER_SIZE};
pub use reader::{FieldWarning, GpsCoordinates, ImageMetadata, TiffDirectory, TiffField};
pub use tags::{
    is_structural_tag, tag, DirectoryRole, FieldType, TagInfo, TagRegistry, UNKNOWN_TAG_NAME,
};
pub use values::FieldValue;
pub use write::{write_tiff_block, OutputDirectory, OutputField, OutputSet, TiffLayout, Value};
