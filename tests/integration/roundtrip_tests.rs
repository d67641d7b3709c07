//! Read, copy and rewrite round-trip tests.
//!
//! Tests verify:
//! - Field values survive parse -> output set -> rewrite -> parse
//! - Switching byte order preserves every value
//! - Thumbnails and GPS positions are carried through
//! - Rewriting unchanged metadata is stable
//! - Blocks laid out by other writers survive a rewrite

use exif_rewriter::{
    tag, ByteOrder, DirectoryRole, ExifRewriter, FieldValue, ImageMetadata, OutputSet,
    RationalNumber,
};

use super::test_utils::{
    create_jpeg_with_exif, create_jpeg_with_foreign_exif, create_test_jpeg, is_valid_jpeg,
    non_exif_parts,
};

type FieldEntry = (DirectoryRole, u16, FieldValue);

/// (role, tag, value) of every field, in directory order.
fn field_values(metadata: &ImageMetadata) -> Vec<FieldEntry> {
    metadata
        .directories()
        .iter()
        .flat_map(|directory| {
            directory
                .fields()
                .iter()
                .map(move |field| (directory.role(), field.tag, field.value.clone()))
        })
        .filter(|(role, t, _)| !exif_rewriter::tiff::is_structural_tag(*role, *t))
        .collect()
}

fn sorted(mut values: Vec<FieldEntry>) -> Vec<FieldEntry> {
    values.sort_by_key(|(role, t, _)| (role.raw(), *t));
    values
}

fn rewrite_unchanged(jpeg: &[u8]) -> Vec<u8> {
    ExifRewriter::new()
        .update_exif_metadata_with(jpeg, |_| Ok(()))
        .unwrap()
        .to_vec()
}

#[test]
fn test_roundtrip_big_endian() {
    let jpeg = create_jpeg_with_exif(ByteOrder::BigEndian);
    let rewriter = ExifRewriter::new();
    let before = rewriter.read_metadata(&jpeg).unwrap().unwrap();

    let rewritten = rewrite_unchanged(&jpeg);
    let after = rewriter.read_metadata(&rewritten).unwrap().unwrap();

    assert_eq!(after.byte_order(), ByteOrder::BigEndian);
    assert_eq!(sorted(field_values(&after)), sorted(field_values(&before)));
    assert_eq!(non_exif_parts(&rewritten), non_exif_parts(&jpeg));
}

#[test]
fn test_roundtrip_little_endian() {
    let jpeg = create_jpeg_with_exif(ByteOrder::LittleEndian);
    let rewriter = ExifRewriter::new();
    let before = rewriter.read_metadata(&jpeg).unwrap().unwrap();

    let rewritten = rewrite_unchanged(&jpeg);
    let after = rewriter.read_metadata(&rewritten).unwrap().unwrap();

    assert_eq!(after.byte_order(), ByteOrder::LittleEndian);
    assert_eq!(sorted(field_values(&after)), sorted(field_values(&before)));
}

#[test]
fn test_rewrite_is_stable() {
    let jpeg = create_jpeg_with_exif(ByteOrder::LittleEndian);

    let once = rewrite_unchanged(&jpeg);
    let twice = rewrite_unchanged(&once);

    assert_eq!(once, twice);
}

#[test]
fn test_switch_byte_order_preserves_values() {
    let jpeg = create_jpeg_with_exif(ByteOrder::LittleEndian);
    let rewriter = ExifRewriter::new();
    let before = rewriter.read_metadata(&jpeg).unwrap().unwrap();

    let converted = rewriter
        .update_exif_metadata_with(&jpeg, |set| {
            set.set_byte_order(ByteOrder::BigEndian);
            Ok(())
        })
        .unwrap();
    let after = rewriter.read_metadata(&converted).unwrap().unwrap();

    assert_eq!(after.byte_order(), ByteOrder::BigEndian);
    assert_eq!(sorted(field_values(&after)), sorted(field_values(&before)));

    let structure = exif_rewriter::jpeg::split_segments(&converted).unwrap();
    let payload = structure.exif_segments().next().unwrap().payload();
    assert_eq!(&payload[6..8], b"MM");
}

#[test]
fn test_gps_roundtrip() {
    let jpeg = create_jpeg_with_exif(ByteOrder::BigEndian);
    let metadata = ExifRewriter::new().read_metadata(&jpeg).unwrap().unwrap();

    let gps = metadata.gps().unwrap();
    assert!((gps.latitude - 37.7749).abs() < 1e-4);
    assert!((gps.longitude + 122.4194).abs() < 1e-4);

    let version = metadata
        .find_field_in(DirectoryRole::Gps, tag::GPS_VERSION_ID)
        .unwrap();
    assert_eq!(version.value, FieldValue::Byte(vec![2, 2, 0, 0]));
}

#[test]
fn test_thumbnail_roundtrip() {
    let thumbnail = create_test_jpeg(8, 8);
    let mut set = OutputSet::new(ByteOrder::LittleEndian);
    set.get_or_create_root_directory().add(exif_rewriter::OutputField::from_value(
        tag::MAKE,
        FieldValue::ascii("Nikon"),
        ByteOrder::LittleEndian,
    ));
    set.set_thumbnail(thumbnail.clone());

    let rewriter = ExifRewriter::new();
    let jpeg = rewriter
        .update_exif_metadata_lossless(&create_test_jpeg(32, 32), &set)
        .unwrap();
    let metadata = rewriter.read_metadata(&jpeg).unwrap().unwrap();

    let embedded = metadata.thumbnail().unwrap();
    assert_eq!(&embedded[..], &thumbnail[..]);
    assert!(is_valid_jpeg(embedded));
    assert!(metadata.directory(DirectoryRole::Thumbnail).is_some());

    // The thumbnail is carried through an unchanged rewrite
    let rewritten = rewrite_unchanged(&jpeg);
    let again = rewriter.read_metadata(&rewritten).unwrap().unwrap();
    assert_eq!(again.thumbnail(), metadata.thumbnail());
}

#[test]
fn test_output_set_copy_is_independent() {
    let jpeg = create_jpeg_with_exif(ByteOrder::BigEndian);
    let metadata = ExifRewriter::new().read_metadata(&jpeg).unwrap().unwrap();

    let mut set = metadata.to_output_set();
    assert!(set.remove_field(tag::MAKE));
    assert!(set.find_field(tag::MAKE).is_none());

    // The parsed metadata is not affected by edits to the copy
    assert!(metadata.find_field(tag::MAKE).is_some());
    assert!(set.directory(DirectoryRole::Exif).is_some());
    assert!(set
        .directory(DirectoryRole::Root)
        .unwrap()
        .find_field(tag::EXIF_OFFSET)
        .is_none());
}

#[test]
fn test_copy_from_one_image_to_another() {
    let source = create_jpeg_with_exif(ByteOrder::LittleEndian);
    let target = create_test_jpeg(20, 10);
    let rewriter = ExifRewriter::new();

    let set = rewriter
        .read_metadata(&source)
        .unwrap()
        .unwrap()
        .to_output_set();
    let copied = rewriter.update_exif_metadata_lossless(&target, &set).unwrap();

    assert!(is_valid_jpeg(&copied));
    assert_eq!(non_exif_parts(&copied), non_exif_parts(&target));
    let metadata = rewriter.read_metadata(&copied).unwrap().unwrap();
    assert_eq!(
        metadata.find_field(tag::ISO).unwrap().value,
        FieldValue::Short(vec![400])
    );
}

#[test]
fn test_roundtrip_foreign_layout() {
    let thumbnail = create_test_jpeg(8, 8);
    let jpeg = create_jpeg_with_foreign_exif(&thumbnail);
    let rewriter = ExifRewriter::new();

    let metadata = rewriter.read_metadata(&jpeg).unwrap().unwrap();
    assert!(metadata.warnings().is_empty(), "{:?}", metadata.warnings());
    assert_eq!(metadata.byte_order(), ByteOrder::LittleEndian);
    assert_eq!(
        metadata.find_field_in(DirectoryRole::Root, tag::MODEL).unwrap().value,
        FieldValue::ascii("Camera X")
    );
    assert_eq!(
        metadata.find_field_in(DirectoryRole::Root, tag::MAKE).unwrap().value,
        FieldValue::ascii("ACM")
    );
    assert_eq!(
        metadata.find_field_in(DirectoryRole::Thumbnail, tag::X_RESOLUTION).unwrap().value,
        FieldValue::Rational(vec![RationalNumber::new(72, 1)])
    );
    assert_eq!(
        metadata.find_field_in(DirectoryRole::Exif, tag::EXPOSURE_TIME).unwrap().value,
        FieldValue::Rational(vec![RationalNumber::new(1, 125)])
    );
    assert_eq!(
        metadata.find_field_in(DirectoryRole::Exif, tag::USER_COMMENT).unwrap().value,
        FieldValue::Undefined(b"ASCII\0\0\0hello".to_vec())
    );
    assert_eq!(&metadata.thumbnail().unwrap()[..], &thumbnail[..]);

    let rewritten = rewrite_unchanged(&jpeg);
    assert!(is_valid_jpeg(&rewritten));
    assert_eq!(non_exif_parts(&rewritten), non_exif_parts(&jpeg));

    let again = rewriter.read_metadata(&rewritten).unwrap().unwrap();
    assert!(again.warnings().is_empty());
    assert_eq!(sorted(field_values(&again)), sorted(field_values(&metadata)));
    assert_eq!(again.thumbnail(), metadata.thumbnail());
}
