//! JPEG segment boundaries.
//!
//! The splitter walks the marker segments that precede the image data and
//! hands them out as borrowed slices of the input. It never looks inside the
//! entropy-coded data: everything from the first SOS (or EOI) marker to the
//! end of the input is returned untouched as one remainder block, so joining
//! SOI, the segments and the remainder reproduces the input exactly.
//!
//! # Segment Structure
//! ```text
//! FF xx            marker (any number of extra FF fill bytes may precede it)
//! LL LL            big-endian length, counting itself but not the marker
//! payload          length - 2 bytes
//! ```

use crate::error::ExifError;

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Start Of Scan marker
pub const SOS: [u8; 2] = [0xFF, 0xDA];

/// Application segment 0 (JFIF/JFXX) marker
pub const APP0: [u8; 2] = [0xFF, 0xE0];

/// Application segment 1 (EXIF/XMP) marker
pub const APP1: [u8; 2] = [0xFF, 0xE1];

/// Identifier that opens the payload of an EXIF APP1 segment
pub const EXIF_IDENTIFIER: &[u8; 6] = b"Exif\0\0";

/// Largest segment payload: the 16-bit length field minus its own two bytes
pub const MAX_SEGMENT_PAYLOAD: usize = 65533;

/// Marker plus length field
const SEGMENT_HEADER_SIZE: usize = 4;

/// Markers that stand alone, without a length field (TEM and RST0-RST7).
fn is_standalone_marker(code: u8) -> bool {
    code == 0x01 || (0xD0..=0xD7).contains(&code)
}

/// Strip the `Exif\0\0` identifier from an APP1 payload.
pub fn strip_exif_identifier(payload: &[u8]) -> Option<&[u8]> {
    payload.strip_prefix(EXIF_IDENTIFIER.as_slice())
}

// =============================================================================
// Segments
// =============================================================================

/// One marker segment, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegSegment<'a> {
    /// Marker code (the byte after FF)
    pub marker: u8,

    /// Offset of the segment in the input
    pub offset: usize,

    /// The whole segment: fill bytes, marker, length and payload
    pub bytes: &'a [u8],

    header_len: usize,
}

impl<'a> JpegSegment<'a> {
    /// Payload after the length field; empty for standalone markers.
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[self.header_len..]
    }

    pub fn is_app0(&self) -> bool {
        self.marker == APP0[1]
    }

    /// APP1 segment whose payload starts with the Exif identifier.
    pub fn is_exif(&self) -> bool {
        self.marker == APP1[1] && self.payload().starts_with(EXIF_IDENTIFIER)
    }
}

/// A JPEG split at its segment boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegStructure<'a> {
    /// The SOI marker
    pub soi: &'a [u8],

    /// Marker segments between SOI and the image data, in file order
    pub segments: Vec<JpegSegment<'a>>,

    /// Everything from the first SOS or EOI marker to the end of the input
    pub remainder: &'a [u8],
}

impl<'a> JpegStructure<'a> {
    /// The EXIF APP1 segments, in file order.
    pub fn exif_segments(&self) -> impl Iterator<Item = &JpegSegment<'a>> {
        self.segments.iter().filter(|s| s.is_exif())
    }

    /// Number of APP0 segments directly after SOI.
    pub fn leading_app0_count(&self) -> usize {
        self.segments.iter().take_while(|s| s.is_app0()).count()
    }
}

/// Split `jpeg` into SOI, marker segments and the remainder.
///
/// # Errors
/// `UnsupportedFormat` if the input does not start with SOI, or a segment
/// header is malformed or runs past the end of the input.
pub fn split_segments(jpeg: &[u8]) -> Result<JpegStructure<'_>, ExifError> {
    if jpeg.len() < SOI.len() || jpeg[..2] != SOI {
        return Err(ExifError::unsupported("not a JPEG stream (missing SOI)"));
    }

    let mut segments = Vec::new();
    let mut pos = SOI.len();

    while pos < jpeg.len() {
        let start = pos;
        if jpeg[pos] != 0xFF {
            return Err(ExifError::unsupported(format!(
                "expected a marker at offset {pos}, found 0x{:02X}",
                jpeg[pos]
            )));
        }

        // Skip fill bytes
        while pos + 1 < jpeg.len() && jpeg[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 1 >= jpeg.len() {
            return Err(ExifError::unsupported(format!(
                "truncated marker at offset {start}"
            )));
        }

        let marker = jpeg[pos + 1];
        if marker == SOS[1] || marker == EOI[1] {
            return Ok(JpegStructure {
                soi: &jpeg[..SOI.len()],
                segments,
                remainder: &jpeg[start..],
            });
        }

        if is_standalone_marker(marker) {
            pos += 2;
            segments.push(JpegSegment {
                marker,
                offset: start,
                bytes: &jpeg[start..pos],
                header_len: pos - start,
            });
            continue;
        }

        if pos + SEGMENT_HEADER_SIZE > jpeg.len() {
            return Err(ExifError::unsupported(format!(
                "truncated segment header at offset {start}"
            )));
        }
        let length = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        let end = pos + 2 + length;
        if length < 2 || end > jpeg.len() {
            return Err(ExifError::unsupported(format!(
                "invalid length {length} for segment 0xFF{marker:02X} at offset {start}"
            )));
        }

        segments.push(JpegSegment {
            marker,
            offset: start,
            bytes: &jpeg[start..end],
            header_len: pos + SEGMENT_HEADER_SIZE - start,
        });
        pos = end;
    }

    // No image data; tolerated so that header-only streams still round-trip.
    Ok(JpegStructure {
        soi: &jpeg[..SOI.len()],
        segments,
        remainder: &jpeg[pos..],
    })
}

/// Build a complete EXIF APP1 segment around a TIFF block.
///
/// # Errors
/// `SegmentTooLarge` if identifier plus block exceed [`MAX_SEGMENT_PAYLOAD`].
pub fn build_exif_segment(tiff: &[u8]) -> Result<Vec<u8>, ExifError> {
    let payload_len = EXIF_IDENTIFIER.len() + tiff.len();
    if payload_len > MAX_SEGMENT_PAYLOAD {
        return Err(ExifError::SegmentTooLarge {
            size: payload_len,
            limit: MAX_SEGMENT_PAYLOAD,
        });
    }

    let mut segment = Vec::with_capacity(SEGMENT_HEADER_SIZE + payload_len);
    segment.extend_from_slice(&APP1);
    segment.extend_from_slice(&((payload_len + 2) as u16).to_be_bytes());
    segment.extend_from_slice(EXIF_IDENTIFIER);
    segment.extend_from_slice(tiff);
    Ok(segment)
}

// =============================================================================
// Tests
// =============================================================================
