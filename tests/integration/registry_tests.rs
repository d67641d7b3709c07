//! Tag registry and field type dispatch tests.
//!
//! Tests verify:
//! - Lookups never fail and echo unknown tag numbers verbatim
//! - Directory role disambiguates tags sharing a number
//! - Values are written with the first type the tag allows
//! - Unregistered tags survive a rewrite

use exif_rewriter::{
    tag, ByteOrder, DirectoryRole, ExifError, ExifRewriter, FieldType, FieldValue, OutputField,
    OutputSet, RationalNumber, TagRegistry, Value,
};

use super::test_utils::create_test_jpeg;

const PRIVATE_TAG: u16 = 0xFDE8;

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn test_unknown_tags_echo_number() {
    let registry = TagRegistry::global();

    let negative = registry.lookup(DirectoryRole::Unknown, -1);
    assert_eq!(negative.tag, -1);
    assert_eq!(negative.name, "Unknown Tag");

    let unregistered = registry.lookup(DirectoryRole::Exif, 50933);
    assert_eq!(unregistered.tag, 50933);
    assert_eq!(unregistered.name, "Unknown Tag");
    assert!(unregistered.is_unknown());
    assert_eq!(unregistered.field_types, FieldType::ALL);
}

#[test]
fn test_role_disambiguates_shared_numbers() {
    let registry = TagRegistry::global();

    assert_eq!(registry.lookup(DirectoryRole::Gps, 1u16).name, "GPSLatitudeRef");
    assert_eq!(registry.lookup(DirectoryRole::Interop, 1u16).name, "InteropIndex");
}

#[test]
fn test_lookup_falls_back_to_any_directory() {
    let registry = TagRegistry::global();

    // Make lives in IFD0, but is still found when asked for from Exif
    let make = registry.lookup(DirectoryRole::Exif, tag::MAKE);
    assert_eq!(make.name, "Make");
    assert_eq!(make.role, Some(DirectoryRole::Root));
}

#[test]
fn test_lookup_by_name_ignores_case() {
    let registry = TagRegistry::global();

    let info = registry.lookup_by_name("exposuretime").unwrap();
    assert_eq!(info.tag, i32::from(tag::EXPOSURE_TIME));
    assert!(registry.lookup_by_name("NoSuchTag").is_none());
}

// =============================================================================
// Type dispatch
// =============================================================================

#[test]
fn test_double_becomes_rational() {
    let registry = TagRegistry::global();
    let info = registry.lookup(DirectoryRole::Exif, tag::EXPOSURE_TIME);

    let field = OutputField::create(&info, ByteOrder::BigEndian, 0.004).unwrap();
    assert_eq!(field.field_type(), FieldType::Rational);
    assert_eq!(
        field.value(),
        &FieldValue::Rational(vec![RationalNumber::new(1, 250)])
    );
}

#[test]
fn test_negative_double_becomes_srational() {
    let registry = TagRegistry::global();
    let info = registry.lookup(DirectoryRole::Exif, tag::BRIGHTNESS_VALUE);

    let field = OutputField::create(&info, ByteOrder::LittleEndian, -0.5).unwrap();
    assert_eq!(field.field_type(), FieldType::SRational);
    assert_eq!(
        field.value(),
        &FieldValue::SRational(vec![RationalNumber::new(-1, 2)])
    );
}

#[test]
fn test_integer_uses_first_fitting_type() {
    let registry = TagRegistry::global();

    let width = registry.lookup(DirectoryRole::Exif, 0xA002u16);
    let small = OutputField::create(&width, ByteOrder::BigEndian, 640i64).unwrap();
    assert_eq!(small.field_type(), FieldType::Short);
    let large = OutputField::create(&width, ByteOrder::BigEndian, 100_000i64).unwrap();
    assert_eq!(large.field_type(), FieldType::Long);

    let unknown = registry.lookup(DirectoryRole::Exif, PRIVATE_TAG);
    let field = OutputField::create(&unknown, ByteOrder::BigEndian, 7i64).unwrap();
    assert_eq!(field.field_type(), FieldType::Byte);
}

#[test]
fn test_text_for_undefined_tag() {
    let registry = TagRegistry::global();
    let info = registry.lookup(DirectoryRole::Exif, tag::USER_COMMENT);

    let field = OutputField::create(&info, ByteOrder::BigEndian, "hello").unwrap();
    assert_eq!(field.value(), &FieldValue::Undefined(b"hello".to_vec()));
}

#[test]
fn test_mismatched_shape_is_rejected() {
    let registry = TagRegistry::global();
    let iso = registry.lookup(DirectoryRole::Exif, tag::ISO);

    let result = OutputField::create(&iso, ByteOrder::BigEndian, "fast");
    match result {
        Err(ExifError::UnknownFieldType { tag: number, name, shape }) => {
            assert_eq!(number, i32::from(tag::ISO));
            assert_eq!(name, "ISO");
            assert_eq!(shape, "text");
        }
        other => panic!("expected UnknownFieldType, got {other:?}"),
    }

    // Negative values cannot be stored in an unsigned-only tag
    let focal = registry.lookup(DirectoryRole::Exif, tag::FOCAL_LENGTH);
    assert!(OutputField::create(&focal, ByteOrder::BigEndian, -35.0).is_err());
}

#[test]
fn test_negative_tag_cannot_be_written() {
    let registry = TagRegistry::global();
    let info = registry.lookup(DirectoryRole::Unknown, -1);

    let result = OutputField::create(&info, ByteOrder::BigEndian, Value::Integer(1));
    assert!(matches!(result, Err(ExifError::UnsupportedFormat { .. })));
}

// =============================================================================
// Unregistered tags in files
// =============================================================================

#[test]
fn test_unregistered_tag_survives_rewrite() {
    let order = ByteOrder::LittleEndian;
    let mut set = OutputSet::new(order);
    set.get_or_create_exif_directory().add(OutputField::from_value(
        PRIVATE_TAG,
        FieldValue::Long(vec![1, 2, 3]),
        order,
    ));

    let rewriter = ExifRewriter::new();
    let jpeg = rewriter
        .update_exif_metadata_lossless(&create_test_jpeg(8, 8), &set)
        .unwrap();
    let rewritten = rewriter
        .update_exif_metadata_with(&jpeg, |_| Ok(()))
        .unwrap();
    let metadata = rewriter.read_metadata(&rewritten).unwrap().unwrap();

    let field = metadata
        .find_field_in(DirectoryRole::Exif, PRIVATE_TAG)
        .unwrap();
    assert_eq!(field.tag_name(), "Unknown Tag");
    assert!(field.tag_info.is_unknown());
    assert_eq!(field.value, FieldValue::Long(vec![1, 2, 3]));
}

#[test]
fn test_custom_registry() {
    let registry = TagRegistry::new();
    let rewriter = ExifRewriter::with_registry(&registry);
    let jpeg = create_test_jpeg(8, 8);

    assert!(rewriter.read_metadata(&jpeg).unwrap().is_none());
    assert_eq!(rewriter.registry().len(), TagRegistry::global().len());
}
