//! Mutable metadata to be serialized: [`OutputSet`] → [`OutputDirectory`] →
//! [`OutputField`].
//!
//! Fields are built either from an explicit [`FieldValue`]
//! ([`OutputField::from_value`]) or from a loosely shaped [`Value`] that is
//! matched against the tag's allowed field types ([`OutputField::create`]).

use std::borrow::Cow;
use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::ExifError;
use crate::rational::RationalNumber;
use crate::tiff::parser::ByteOrder;
use crate::tiff::tags::{tag, DirectoryRole, FieldType, TagInfo};
use crate::tiff::values::FieldValue;

/// Version written to GPSVersionID by [`OutputSet::set_gps_in_degrees`].
const GPS_VERSION: [u8; 4] = [2, 2, 0, 0];

// =============================================================================
// Value
// =============================================================================

/// A value in the shape the caller has it, before a TIFF type is chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Doubles(Vec<f64>),
    Rational(RationalNumber),
    Rationals(Vec<RationalNumber>),
    Text(String),
    Integer(i64),
    Integers(Vec<i64>),
    Bytes(Vec<u8>),
}

impl Value {
    /// Short name of the shape, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Double(_) => "double",
            Value::Doubles(_) => "double array",
            Value::Rational(_) => "rational",
            Value::Rationals(_) => "rational array",
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Integers(_) => "integer array",
            Value::Bytes(_) => "byte array",
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<RationalNumber> for Value {
    fn from(value: RationalNumber) -> Self {
        Value::Rational(value)
    }
}

impl From<Vec<RationalNumber>> for Value {
    fn from(values: Vec<RationalNumber>) -> Self {
        Value::Rationals(values)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

// =============================================================================
// Type dispatch
// =============================================================================

fn dispatch_doubles(info: &TagInfo, values: &[f64]) -> Option<FieldValue> {
    if values.iter().all(|v| *v >= 0.0) && info.accepts(FieldType::Rational) {
        return Some(FieldValue::Rational(
            values.iter().map(|&v| RationalNumber::from_f64(v)).collect(),
        ));
    }
    if info.accepts(FieldType::SRational) {
        return Some(FieldValue::SRational(
            values
                .iter()
                .map(|&v| RationalNumber::from_f64_signed(v))
                .collect(),
        ));
    }
    if info.accepts(FieldType::Double) {
        return Some(FieldValue::Double(values.to_vec()));
    }
    if info.accepts(FieldType::Float) {
        return Some(FieldValue::Float(values.iter().map(|&v| v as f32).collect()));
    }
    None
}

fn dispatch_rationals(info: &TagInfo, values: &[RationalNumber]) -> Option<FieldValue> {
    if values.iter().all(|r| r.fits_unsigned()) && info.accepts(FieldType::Rational) {
        return Some(FieldValue::Rational(values.to_vec()));
    }
    if values.iter().all(|r| r.fits_signed()) && info.accepts(FieldType::SRational) {
        return Some(FieldValue::SRational(values.to_vec()));
    }
    None
}

fn dispatch_text(info: &TagInfo, text: &str) -> Option<FieldValue> {
    if info.accepts(FieldType::Ascii) {
        Some(FieldValue::ascii(text))
    } else if info.accepts(FieldType::Undefined) {
        Some(FieldValue::Undefined(text.as_bytes().to_vec()))
    } else {
        None
    }
}

/// First integer type, in the tag's declared order, that holds every value.
///
/// Tags without a fitting integer type take the values as `n/1` rationals,
/// then as DOUBLE, then as FLOAT.
fn dispatch_integers(info: &TagInfo, values: &[i64]) -> Option<FieldValue> {
    fn convert<T: TryFrom<i64>>(values: &[i64]) -> Option<Vec<T>> {
        values.iter().map(|&v| T::try_from(v).ok()).collect()
    }

    let integer = info.field_types.iter().find_map(|field_type| match field_type {
        FieldType::Byte => convert(values).map(FieldValue::Byte),
        FieldType::Short => convert(values).map(FieldValue::Short),
        FieldType::Long => convert(values).map(FieldValue::Long),
        FieldType::SByte => convert(values).map(FieldValue::SByte),
        FieldType::SShort => convert(values).map(FieldValue::SShort),
        FieldType::SLong => convert(values).map(FieldValue::SLong),
        _ => None,
    });
    if integer.is_some() {
        return integer;
    }

    let rationals: Vec<RationalNumber> =
        values.iter().map(|&v| RationalNumber::new(v, 1)).collect();
    if let Some(value) = dispatch_rationals(info, &rationals) {
        return Some(value);
    }
    if info.accepts(FieldType::Double) {
        return Some(FieldValue::Double(values.iter().map(|&v| v as f64).collect()));
    }
    if info.accepts(FieldType::Float) {
        return Some(FieldValue::Float(values.iter().map(|&v| v as f32).collect()));
    }
    None
}

fn dispatch_bytes(info: &TagInfo, bytes: &[u8]) -> Option<FieldValue> {
    if info.accepts(FieldType::Undefined) {
        Some(FieldValue::Undefined(bytes.to_vec()))
    } else if info.accepts(FieldType::Byte) {
        Some(FieldValue::Byte(bytes.to_vec()))
    } else {
        None
    }
}

// =============================================================================
// OutputField
// =============================================================================

/// A field ready to be written: tag, type, count and encoded value bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputField {
    tag: u16,
    value: FieldValue,
    byte_order: ByteOrder,
    bytes: Bytes,
}

impl OutputField {
    /// Build a field from a value of any supported shape.
    ///
    /// The concrete TIFF type is the first one `tag_info` allows for that
    /// shape: doubles become RATIONAL/SRATIONAL, then DOUBLE, then FLOAT;
    /// rationals RATIONAL or SRATIONAL by range; text ASCII, else UNDEFINED;
    /// integers the first allowed integer type that holds every value; bytes
    /// UNDEFINED, else BYTE.
    ///
    /// # Errors
    /// `UnknownFieldType` if no allowed type matches the value's shape.
    pub fn create(
        tag_info: &TagInfo,
        byte_order: ByteOrder,
        value: impl Into<Value>,
    ) -> Result<Self, ExifError> {
        let value = value.into();
        let tag = u16::try_from(tag_info.tag).map_err(|_| {
            ExifError::unsupported(format!("tag {} is not a 16-bit TIFF tag", tag_info.tag))
        })?;

        let field_value = match &value {
            Value::Double(v) => dispatch_doubles(tag_info, std::slice::from_ref(v)),
            Value::Doubles(v) => dispatch_doubles(tag_info, v),
            Value::Rational(r) => dispatch_rationals(tag_info, std::slice::from_ref(r)),
            Value::Rationals(r) => dispatch_rationals(tag_info, r),
            Value::Text(text) => dispatch_text(tag_info, text),
            Value::Integer(i) => dispatch_integers(tag_info, std::slice::from_ref(i)),
            Value::Integers(i) => dispatch_integers(tag_info, i),
            Value::Bytes(b) => dispatch_bytes(tag_info, b),
        }
        .ok_or(ExifError::UnknownFieldType {
            tag: tag_info.tag,
            name: tag_info.name,
            shape: value.shape(),
        })?;

        Ok(Self::from_value(tag, field_value, byte_order))
    }

    /// Build a field from an explicit value, keeping its type as is.
    pub fn from_value(tag: u16, value: FieldValue, byte_order: ByteOrder) -> Self {
        let bytes = Bytes::from(value.encode(byte_order));
        OutputField {
            tag,
            value,
            byte_order,
            bytes,
        }
    }

    pub fn tag(&self) -> u16 {
        self.tag
    }

    pub fn field_type(&self) -> FieldType {
        self.value.field_type()
    }

    /// Number of elements
    pub fn count(&self) -> u32 {
        self.value.count() as u32
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Encoded value bytes in the byte order the field was built with.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Value bytes in `byte_order`, re-encoding only when it differs.
    pub fn encoded(&self, byte_order: ByteOrder) -> Cow<'_, [u8]> {
        if byte_order == self.byte_order {
            Cow::Borrowed(&self.bytes)
        } else {
            Cow::Owned(self.value.encode(byte_order))
        }
    }
}

// =============================================================================
// OutputDirectory
// =============================================================================

/// Fields of one directory, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDirectory {
    role: DirectoryRole,
    fields: Vec<OutputField>,
}

impl OutputDirectory {
    pub fn new(role: DirectoryRole) -> Self {
        OutputDirectory {
            role,
            fields: Vec::new(),
        }
    }

    pub fn role(&self) -> DirectoryRole {
        self.role
    }

    /// Append a field.
    ///
    /// An existing field with the same tag is NOT replaced, and which of the
    /// two ends up in the file is unspecified. Call
    /// [`remove_field`](Self::remove_field) first when changing a value.
    pub fn add(&mut self, field: OutputField) {
        self.fields.push(field);
    }

    /// Remove every field with `tag`; returns whether any was removed.
    pub fn remove_field(&mut self, tag: u16) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.tag != tag);
        self.fields.len() != before
    }

    pub fn find_field(&self, tag: u16) -> Option<&OutputField> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    pub fn fields(&self) -> &[OutputField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// OutputSet
// =============================================================================

/// Everything that goes into one EXIF block.
///
/// One byte order applies to the whole set; fields built with another byte
/// order are re-encoded when the block is written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSet {
    byte_order: ByteOrder,
    directories: BTreeMap<DirectoryRole, OutputDirectory>,
    thumbnail: Option<Bytes>,
}

impl OutputSet {
    /// Empty set writing in `byte_order`.
    pub fn new(byte_order: ByteOrder) -> Self {
        OutputSet {
            byte_order,
            directories: BTreeMap::new(),
            thumbnail: None,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn set_byte_order(&mut self, byte_order: ByteOrder) {
        self.byte_order = byte_order;
    }

    pub fn get_or_create_directory(&mut self, role: DirectoryRole) -> &mut OutputDirectory {
        self.directories
            .entry(role)
            .or_insert_with(|| OutputDirectory::new(role))
    }

    pub fn get_or_create_root_directory(&mut self) -> &mut OutputDirectory {
        self.get_or_create_directory(DirectoryRole::Root)
    }

    pub fn get_or_create_exif_directory(&mut self) -> &mut OutputDirectory {
        self.get_or_create_directory(DirectoryRole::Exif)
    }

    pub fn get_or_create_gps_directory(&mut self) -> &mut OutputDirectory {
        self.get_or_create_directory(DirectoryRole::Gps)
    }

    pub fn get_or_create_interop_directory(&mut self) -> &mut OutputDirectory {
        self.get_or_create_directory(DirectoryRole::Interop)
    }

    pub fn directory(&self, role: DirectoryRole) -> Option<&OutputDirectory> {
        self.directories.get(&role)
    }

    pub fn directory_mut(&mut self, role: DirectoryRole) -> Option<&mut OutputDirectory> {
        self.directories.get_mut(&role)
    }

    pub fn directories(&self) -> impl Iterator<Item = &OutputDirectory> {
        self.directories.values()
    }

    /// Find a field by tag, searching Exif, GPS, Root, Interop, then Thumbnail.
    pub fn find_field(&self, tag: u16) -> Option<&OutputField> {
        DirectoryRole::SEARCH_ORDER
            .iter()
            .filter_map(|role| self.directories.get(role))
            .find_map(|d| d.find_field(tag))
    }

    /// Remove `tag` from every directory; returns whether anything was removed.
    pub fn remove_field(&mut self, tag: u16) -> bool {
        self.directories
            .values_mut()
            .fold(false, |removed, d| d.remove_field(tag) | removed)
    }

    /// Embed a JPEG thumbnail, written after IFD1.
    pub fn set_thumbnail(&mut self, jpeg: impl Into<Bytes>) {
        self.thumbnail = Some(jpeg.into());
    }

    pub fn remove_thumbnail(&mut self) -> Option<Bytes> {
        self.thumbnail.take()
    }

    pub fn thumbnail(&self) -> Option<&Bytes> {
        self.thumbnail.as_ref()
    }

    /// True when no directory holds a field and there is no thumbnail.
    pub fn is_empty(&self) -> bool {
        self.thumbnail.is_none() && self.directories.values().all(OutputDirectory::is_empty)
    }

    /// Replace the GPS position with signed decimal degrees.
    ///
    /// Writes GPSVersionID, the latitude/longitude reference letters and the
    /// degrees/minutes/seconds rationals, replacing any existing values.
    pub fn set_gps_in_degrees(&mut self, longitude: f64, latitude: f64) {
        let byte_order = self.byte_order;
        let gps = self.get_or_create_gps_directory();

        for t in [
            tag::GPS_VERSION_ID,
            tag::GPS_LATITUDE_REF,
            tag::GPS_LATITUDE,
            tag::GPS_LONGITUDE_REF,
            tag::GPS_LONGITUDE,
        ] {
            gps.remove_field(t);
        }

        let latitude_ref = if latitude < 0.0 { "S" } else { "N" };
        let longitude_ref = if longitude < 0.0 { "W" } else { "E" };

        gps.add(OutputField::from_value(
            tag::GPS_VERSION_ID,
            FieldValue::Byte(GPS_VERSION.to_vec()),
            byte_order,
        ));
        gps.add(OutputField::from_value(
            tag::GPS_LATITUDE_REF,
            FieldValue::ascii(latitude_ref),
            byte_order,
        ));
        gps.add(OutputField::from_value(
            tag::GPS_LATITUDE,
            FieldValue::Rational(degrees_to_dms(latitude)),
            byte_order,
        ));
        gps.add(OutputField::from_value(
            tag::GPS_LONGITUDE_REF,
            FieldValue::ascii(longitude_ref),
            byte_order,
        ));
        gps.add(OutputField::from_value(
            tag::GPS_LONGITUDE,
            FieldValue::Rational(degrees_to_dms(longitude)),
            byte_order,
        ));
    }
}

/// Unsigned degrees, minutes and seconds of a coordinate.
fn degrees_to_dms(value: f64) -> Vec<RationalNumber> {
    let value = value.abs();
    let degrees = value.trunc();
    let minutes_total = (value - degrees) * 60.0;
    let minutes = minutes_total.trunc();
    let seconds = (minutes_total - minutes) * 60.0;
    vec![
        RationalNumber::new(degrees as i64, 1),
        RationalNumber::new(minutes as i64, 1),
        RationalNumber::from_f64(seconds),
    ]
}

// =============================================================================
// Tests
// =============================================================================
