//! Test utilities for integration tests.
//!
//! Helpers for building real JPEG streams and EXIF metadata to feed the
//! rewriter.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

use exif_rewriter::jpeg::{build_exif_segment, split_segments};
use exif_rewriter::{
    tag, write_tiff_block, ByteOrder, FieldValue, OutputField, OutputSet, RationalNumber,
};

// =============================================================================
// JPEG Builders
// =============================================================================

/// Encode a small gradient image as a baseline JPEG.
///
/// The encoder writes a JFIF APP0 segment right after SOI.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 85);
    encoder.encode_image(&img).unwrap();
    buf
}

/// Build a marker segment with the given payload.
pub fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, marker];
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Insert `segment` into `jpeg` right after SOI.
pub fn insert_after_soi(jpeg: &[u8], segment: &[u8]) -> Vec<u8> {
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(segment);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Drop every APP0 segment that directly follows SOI.
pub fn without_app0(jpeg: &[u8]) -> Vec<u8> {
    let mut out = jpeg[..2].to_vec();
    let mut pos = 2;
    while jpeg[pos] == 0xFF && jpeg[pos + 1] == 0xE0 {
        let len = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        pos += 2 + len;
    }
    out.extend_from_slice(&jpeg[pos..]);
    out
}

/// Encoded APP1 segment holding `set`.
pub fn exif_segment(set: &OutputSet) -> Vec<u8> {
    let tiff = write_tiff_block(set).unwrap();
    build_exif_segment(&tiff).unwrap()
}

/// Insert `segment` right after the JFIF APP0 segment that follows SOI.
pub fn insert_after_app0(jpeg: &[u8], segment: &[u8]) -> Vec<u8> {
    let app0_len = u16::from_be_bytes([jpeg[4], jpeg[5]]) as usize;
    let split = 2 + 2 + app0_len;
    let mut out = jpeg[..split].to_vec();
    out.extend_from_slice(segment);
    out.extend_from_slice(&jpeg[split..]);
    out
}

/// A test JPEG carrying camera metadata in its own APP1 segment.
pub fn create_jpeg_with_exif(byte_order: ByteOrder) -> Vec<u8> {
    let app1 = exif_segment(&camera_metadata(byte_order));

    // Place the APP1 after the JFIF header, like cameras that emit both
    insert_after_app0(&create_test_jpeg(32, 24), &app1)
}

/// A test JPEG whose EXIF block comes from [`create_foreign_exif_block`].
pub fn create_jpeg_with_foreign_exif(thumbnail: &[u8]) -> Vec<u8> {
    let app1 = build_exif_segment(&create_foreign_exif_block(thumbnail)).unwrap();
    insert_after_app0(&create_test_jpeg(24, 16), &app1)
}

// =============================================================================
// Hand-laid TIFF blocks
// =============================================================================

/// Little-endian TIFF block writer with offset back-patching.
#[derive(Default)]
struct LeBlock(Vec<u8>);

impl LeBlock {
    fn len(&self) -> u32 {
        self.0.len() as u32
    }

    fn bytes(&mut self, data: &[u8]) {
        self.0.extend_from_slice(data);
    }

    fn u16(&mut self, value: u16) {
        self.bytes(&value.to_le_bytes());
    }

    /// Append a u32 and return its position.
    fn u32(&mut self, value: u32) -> usize {
        let at = self.0.len();
        self.bytes(&value.to_le_bytes());
        at
    }

    /// Append an IFD entry; returns the position of its value field.
    fn entry(&mut self, tag: u16, field_type: u16, count: u32, value: u32) -> usize {
        self.u16(tag);
        self.u16(field_type);
        self.u32(count);
        self.u32(value)
    }

    /// Point the value field at `at` to the current end of the block.
    fn patch_here(&mut self, at: usize) {
        let here = self.len().to_le_bytes();
        self.0[at..at + 4].copy_from_slice(&here);
    }
}

/// EXIF block laid out the way other writers do it, not the way this crate
/// writes:
/// - IFD entries are not in tag order
/// - out-of-line values and the thumbnail start at odd offsets
/// - IFD1 comes before the Exif IFD
/// - the Exif IFD is the last thing in the block and has no next-IFD offset
pub fn create_foreign_exif_block(thumbnail: &[u8]) -> Vec<u8> {
    let mut b = LeBlock::default();
    b.bytes(b"II");
    b.u16(42);
    b.u32(8);

    // IFD0
    b.u16(4);
    let model = b.entry(tag::MODEL, 2, 9, 0);
    b.entry(tag::MAKE, 2, 4, u32::from_le_bytes(*b"ACM\0"));
    let exif = b.entry(tag::EXIF_OFFSET, 4, 1, 0);
    b.entry(tag::ORIENTATION, 3, 1, 6);
    let next = b.u32(0);
    b.bytes(&[0]);
    b.patch_here(model);
    b.bytes(b"Camera X\0");

    // IFD1
    b.patch_here(next);
    b.u16(3);
    b.entry(tag::JPEG_INTERCHANGE_FORMAT_LENGTH, 4, 1, thumbnail.len() as u32);
    let thumbnail_offset = b.entry(tag::JPEG_INTERCHANGE_FORMAT, 4, 1, 0);
    let resolution = b.entry(tag::X_RESOLUTION, 5, 1, 0);
    b.u32(0);
    b.bytes(&[0]);
    b.patch_here(resolution);
    b.u32(72);
    b.u32(1);
    b.patch_here(thumbnail_offset);
    b.bytes(thumbnail);
    if b.len() % 2 == 0 {
        b.bytes(&[0]);
    }

    // Exif values first, then its table
    let exposure = b.len();
    b.u32(1);
    b.u32(125);
    let comment = b.len();
    b.bytes(b"ASCII\0\0\0hello");
    b.patch_here(exif);
    b.u16(3);
    b.entry(tag::USER_COMMENT, 7, 13, comment);
    b.entry(tag::ISO, 3, 1, 200);
    b.entry(tag::EXPOSURE_TIME, 5, 1, exposure);
    b.0
}

// =============================================================================
// Metadata Builders
// =============================================================================

/// Typical camera metadata spread over Root, Exif, Interop and GPS.
pub fn camera_metadata(byte_order: ByteOrder) -> OutputSet {
    let field = |t, v| OutputField::from_value(t, v, byte_order);
    let mut set = OutputSet::new(byte_order);

    let root = set.get_or_create_root_directory();
    root.add(field(tag::MAKE, FieldValue::ascii("Canon")));
    root.add(field(tag::MODEL, FieldValue::ascii("Canon EOS 5D")));
    root.add(field(tag::ORIENTATION, FieldValue::Short(vec![1])));
    root.add(field(
        tag::X_RESOLUTION,
        FieldValue::Rational(vec![RationalNumber::new(72, 1)]),
    ));
    root.add(field(
        tag::Y_RESOLUTION,
        FieldValue::Rational(vec![RationalNumber::new(72, 1)]),
    ));
    root.add(field(tag::DATE_TIME, FieldValue::ascii("2006:04:01 12:00:00")));

    let exif = set.get_or_create_exif_directory();
    exif.add(field(
        tag::EXPOSURE_TIME,
        FieldValue::Rational(vec![RationalNumber::new(1, 250)]),
    ));
    exif.add(field(
        tag::F_NUMBER,
        FieldValue::Rational(vec![RationalNumber::new(56, 10)]),
    ));
    exif.add(field(tag::ISO, FieldValue::Short(vec![400])));
    exif.add(field(tag::EXIF_VERSION, FieldValue::Undefined(b"0221".to_vec())));
    exif.add(field(
        tag::BRIGHTNESS_VALUE,
        FieldValue::SRational(vec![RationalNumber::new(-3, 2)]),
    ));
    exif.add(field(
        tag::MAKER_NOTE,
        FieldValue::Undefined((0u8..=200).collect()),
    ));

    set.get_or_create_interop_directory()
        .add(field(tag::INTEROP_INDEX, FieldValue::ascii("R98")));

    set.set_gps_in_degrees(-122.4194, 37.7749);
    set
}

// =============================================================================
// Assertions
// =============================================================================

/// Every segment of `jpeg` that is not EXIF, plus the scan data, in order.
pub fn non_exif_parts(jpeg: &[u8]) -> Vec<Vec<u8>> {
    let structure = split_segments(jpeg).unwrap();
    let mut parts = vec![structure.soi.to_vec()];
    parts.extend(
        structure
            .segments
            .iter()
            .filter(|s| !s.is_exif())
            .map(|s| s.bytes.to_vec()),
    );
    parts.push(structure.remainder.to_vec());
    parts
}

/// Check if data decodes as a JPEG.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    image::load_from_memory_with_format(data, image::ImageFormat::Jpeg).is_ok()
}

/// Decoded RGB pixels of a JPEG.
pub fn decode_pixels(data: &[u8]) -> Vec<u8> {
    image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .unwrap()
        .to_rgb8()
        .into_raw()
}
