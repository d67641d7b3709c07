//! Lossless rewrite integration tests.
//!
//! Tests verify:
//! - Non-EXIF segments and scan data are copied byte for byte
//! - Decoded pixels are unchanged by a rewrite
//! - New EXIF segments are placed after the JFIF header or SOI
//! - Oversized metadata is rejected without producing output

use exif_rewriter::jpeg::split_segments;
use exif_rewriter::{
    tag, ByteOrder, DirectoryRole, ExifError, ExifRewriter, FieldValue, OutputField, OutputSet,
};

use super::test_utils::{
    camera_metadata, create_jpeg_with_exif, create_test_jpeg, decode_pixels, exif_segment,
    insert_after_soi, is_valid_jpeg, non_exif_parts, without_app0,
};

// =============================================================================
// Reading
// =============================================================================

#[test]
fn test_read_metadata_without_exif() {
    let jpeg = create_test_jpeg(16, 16);
    let rewriter = ExifRewriter::new();

    assert!(rewriter.read_metadata(&jpeg).unwrap().is_none());
}

#[test]
fn test_read_metadata_from_camera_jpeg() {
    let jpeg = create_jpeg_with_exif(ByteOrder::LittleEndian);
    let metadata = ExifRewriter::new().read_metadata(&jpeg).unwrap().unwrap();

    assert_eq!(metadata.byte_order(), ByteOrder::LittleEndian);
    let make = metadata.find_field(tag::MAKE).unwrap();
    assert_eq!(make.tag_name(), "Make");
    assert_eq!(make.value.as_text().as_deref(), Some("Canon"));
    assert!(metadata.directory(DirectoryRole::Interop).is_some());
    assert!(metadata.warnings().is_empty());
}

#[test]
fn test_not_a_jpeg() {
    let rewriter = ExifRewriter::new();
    let result = rewriter.remove_exif_metadata(b"GIF89a\x01\x00\x01\x00");

    assert!(matches!(result, Err(ExifError::UnsupportedFormat { .. })));
}

// =============================================================================
// Stripping
// =============================================================================

#[test]
fn test_strip_restores_original_bytes() {
    let original = create_test_jpeg(32, 24);
    let with_exif = create_jpeg_with_exif(ByteOrder::BigEndian);
    assert_ne!(original, with_exif);

    let stripped = ExifRewriter::new().remove_exif_metadata(&with_exif).unwrap();
    assert_eq!(&stripped[..], &original[..]);
}

#[test]
fn test_strip_without_exif_is_identity() {
    let jpeg = create_test_jpeg(16, 8);
    let stripped = ExifRewriter::new().remove_exif_metadata(&jpeg).unwrap();

    assert_eq!(&stripped[..], &jpeg[..]);
}

// =============================================================================
// Updating
// =============================================================================

#[test]
fn test_update_preserves_non_exif_bytes() {
    let jpeg = create_jpeg_with_exif(ByteOrder::BigEndian);
    let rewriter = ExifRewriter::new();

    let updated = rewriter
        .update_exif_metadata_with(&jpeg, |set| {
            let order = set.byte_order();
            set.remove_field(tag::MODEL);
            set.get_or_create_root_directory().add(OutputField::from_value(
                tag::MODEL,
                FieldValue::ascii("Canon EOS 5D Mark II"),
                order,
            ));
            Ok(())
        })
        .unwrap();

    assert_eq!(non_exif_parts(&updated), non_exif_parts(&jpeg));
    let metadata = rewriter.read_metadata(&updated).unwrap().unwrap();
    assert_eq!(
        metadata.find_field(tag::MODEL).unwrap().value.as_text().as_deref(),
        Some("Canon EOS 5D Mark II")
    );
}

#[test]
fn test_update_keeps_pixels_identical() {
    let jpeg = create_jpeg_with_exif(ByteOrder::LittleEndian);
    let rewriter = ExifRewriter::new();

    let updated = rewriter
        .update_exif_metadata_with(&jpeg, |set| {
            set.set_gps_in_degrees(2.2945, 48.8584);
            Ok(())
        })
        .unwrap();

    assert!(is_valid_jpeg(&updated));
    assert_eq!(decode_pixels(&updated), decode_pixels(&jpeg));
}

#[test]
fn test_update_with_registry_typed_value() {
    let jpeg = create_jpeg_with_exif(ByteOrder::BigEndian);
    let rewriter = ExifRewriter::new();

    let updated = rewriter
        .update_exif_metadata_with(&jpeg, |set| {
            set.remove_field(tag::APERTURE_VALUE);
            let info = rewriter
                .registry()
                .lookup(DirectoryRole::Exif, tag::APERTURE_VALUE);
            let aperture = OutputField::create(&info, set.byte_order(), 0.3)?;
            set.get_or_create_exif_directory().add(aperture);
            Ok(())
        })
        .unwrap();

    let metadata = rewriter.read_metadata(&updated).unwrap().unwrap();
    let field = metadata
        .find_field_in(DirectoryRole::Exif, tag::APERTURE_VALUE)
        .unwrap();
    let FieldValue::Rational(values) = &field.value else {
        panic!("expected RATIONAL, got {:?}", field.value);
    };
    assert!((values[0].to_f64() - 0.3).abs() < 1e-9);
}

#[test]
fn test_update_without_exif_fails() {
    let jpeg = create_test_jpeg(8, 8);
    let result = ExifRewriter::new().update_exif_metadata_with(&jpeg, |_| Ok(()));

    assert!(matches!(result, Err(ExifError::MissingExif)));
}

#[test]
fn test_edit_error_is_propagated() {
    let jpeg = create_jpeg_with_exif(ByteOrder::BigEndian);
    let result = ExifRewriter::new().update_exif_metadata_with(&jpeg, |_| {
        Err(ExifError::unsupported("rejected by caller"))
    });

    assert!(matches!(result, Err(ExifError::UnsupportedFormat { .. })));
}

// =============================================================================
// Placement
// =============================================================================

#[test]
fn test_insert_after_jfif_header() {
    let jpeg = create_test_jpeg(16, 16);
    let set = camera_metadata(ByteOrder::BigEndian);

    let updated = ExifRewriter::new()
        .update_exif_metadata_lossless(&jpeg, &set)
        .unwrap();
    let structure = split_segments(&updated).unwrap();

    assert!(structure.segments[0].is_app0());
    assert!(structure.segments[1].is_exif());
    assert_eq!(structure.exif_segments().count(), 1);
    assert_eq!(non_exif_parts(&updated), non_exif_parts(&jpeg));
}

#[test]
fn test_insert_after_soi_without_jfif() {
    let jpeg = without_app0(&create_test_jpeg(16, 16));
    let set = camera_metadata(ByteOrder::LittleEndian);

    let updated = ExifRewriter::new()
        .update_exif_metadata_lossless(&jpeg, &set)
        .unwrap();
    let structure = split_segments(&updated).unwrap();

    assert!(structure.segments[0].is_exif());
    assert!(is_valid_jpeg(&updated));
}

#[test]
fn test_replace_first_and_drop_extra_exif_segments() {
    // EXIF before the JFIF header, and a second one after it
    let first = exif_segment(&camera_metadata(ByteOrder::BigEndian));
    let jpeg = insert_after_soi(&create_jpeg_with_exif(ByteOrder::LittleEndian), &first);
    assert_eq!(split_segments(&jpeg).unwrap().exif_segments().count(), 2);

    let mut set = OutputSet::new(ByteOrder::BigEndian);
    set.get_or_create_root_directory().add(OutputField::from_value(
        tag::SOFTWARE,
        FieldValue::ascii("exif-rewriter"),
        ByteOrder::BigEndian,
    ));
    let rewriter = ExifRewriter::new();
    let updated = rewriter.update_exif_metadata_lossless(&jpeg, &set).unwrap();
    let structure = split_segments(&updated).unwrap();

    assert_eq!(structure.exif_segments().count(), 1);
    assert!(structure.segments[0].is_exif());
    assert!(structure.segments[1].is_app0());

    let metadata = rewriter.read_metadata(&updated).unwrap().unwrap();
    assert!(metadata.find_field(tag::MAKE).is_none());
    assert!(metadata.find_field(tag::SOFTWARE).is_some());
}

// =============================================================================
// Size limit
// =============================================================================

#[test]
fn test_segment_too_large() {
    let jpeg = create_jpeg_with_exif(ByteOrder::BigEndian);
    let rewriter = ExifRewriter::new();

    let result = rewriter.update_exif_metadata_with(&jpeg, |set| {
        let order = set.byte_order();
        set.remove_field(tag::MAKER_NOTE);
        set.get_or_create_exif_directory().add(OutputField::from_value(
            tag::MAKER_NOTE,
            FieldValue::Undefined(vec![0xAB; 70_000]),
            order,
        ));
        Ok(())
    });

    match result {
        Err(ExifError::SegmentTooLarge { size, limit }) => {
            assert_eq!(limit, 65533);
            assert!(size > 70_000);
        }
        other => panic!("expected SegmentTooLarge, got {other:?}"),
    }
}

#[test]
fn test_segment_just_under_limit() {
    let jpeg = create_test_jpeg(8, 8);
    let mut set = OutputSet::new(ByteOrder::BigEndian);
    set.get_or_create_exif_directory().add(OutputField::from_value(
        tag::MAKER_NOTE,
        FieldValue::Undefined(vec![0; 60_000]),
        ByteOrder::BigEndian,
    ));

    let updated = ExifRewriter::new()
        .update_exif_metadata_lossless(&jpeg, &set)
        .unwrap();
    assert!(is_valid_jpeg(&updated));
}
