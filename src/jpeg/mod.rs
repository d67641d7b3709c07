//! JPEG container handling.
//!
//! Only the marker segments in front of the image data are examined; pixel
//! data is never decoded. [`segments`] finds segment boundaries and
//! [`rewriter`] swaps the EXIF APP1 segment in and out.

pub mod rewriter;
pub mod segments;

pub use rewriter::{read_metadata, ExifRewriter};
pub use segments::{
    build_exif_segment, split_segments, strip_exif_identifier, JpegSegment, JpegStructure,
    EXIF_IDENTIFIER, MAX_SEGMENT_PAYLOAD,
};
