//! TIFF field types, directory roles and the tag registry.
//!
//! This module defines the vocabulary for EXIF parsing and writing:
//! - [`FieldType`]: how a value is encoded
//! - [`DirectoryRole`]: which IFD a field lives in
//! - [`TagInfo`] / [`TagRegistry`]: what a tag number means in a given IFD
//!
//! The same tag number can mean different things in different directories
//! (0x0001 is `GPSLatitudeRef` in the GPS IFD and `InteropIndex` in the
//! Interoperability IFD), so lookups take the directory role into account.

use std::collections::HashMap;

use once_cell::sync::Lazy;

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF 6.0 field types.
///
/// Each field type has a fixed element size, which determines whether a value
/// fits inline in an IFD entry and how arrays are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer
    Byte = 1,
    /// 8-bit ASCII character, NUL terminated
    Ascii = 2,
    /// Unsigned 16-bit integer
    Short = 3,
    /// Unsigned 32-bit integer
    Long = 4,
    /// Two LONGs: numerator, denominator
    Rational = 5,
    /// Signed 8-bit integer
    SByte = 6,
    /// Opaque byte data
    Undefined = 7,
    /// Signed 16-bit integer
    SShort = 8,
    /// Signed 32-bit integer
    SLong = 9,
    /// Two SLONGs: numerator, denominator
    SRational = 10,
    /// IEEE single precision float
    Float = 11,
    /// IEEE double precision float
    Double = 12,
}

impl FieldType {
    /// Every field type, in type-number order.
    pub const ALL: &'static [FieldType] = &[
        FieldType::Byte,
        FieldType::Ascii,
        FieldType::Short,
        FieldType::Long,
        FieldType::Rational,
        FieldType::SByte,
        FieldType::Undefined,
        FieldType::SShort,
        FieldType::SLong,
        FieldType::SRational,
        FieldType::Float,
        FieldType::Double,
    ];

    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for type numbers outside TIFF 6.0.
    pub fn from_u16(value: u16) -> Option<Self> {
        FieldType::ALL.iter().copied().find(|t| t.as_u16() == value)
    }

    /// Get the numeric type ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Upper-case TIFF name of the type.
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Byte => "BYTE",
            FieldType::Ascii => "ASCII",
            FieldType::Short => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Rational => "RATIONAL",
            FieldType::SByte => "SBYTE",
            FieldType::Undefined => "UNDEFINED",
            FieldType::SShort => "SSHORT",
            FieldType::SLong => "SLONG",
            FieldType::SRational => "SRATIONAL",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
        }
    }
}

// =============================================================================
// Directory Roles
// =============================================================================

/// The role a directory plays in the EXIF structure.
///
/// The raw numbers are the directory-type codes used by tag tables; any raw
/// value without a dedicated role maps to [`DirectoryRole::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DirectoryRole {
    /// IFD0, the primary image directory
    Root,
    /// IFD1, the thumbnail directory
    Thumbnail,
    /// Exif sub-IFD
    Exif,
    /// GPS sub-IFD
    Gps,
    /// Interoperability sub-IFD (child of the Exif IFD)
    Interop,
    /// Directory of unknown role
    Unknown,
}

impl DirectoryRole {
    /// Order in which `find_field` searches directories.
    pub const SEARCH_ORDER: [DirectoryRole; 5] = [
        DirectoryRole::Exif,
        DirectoryRole::Gps,
        DirectoryRole::Root,
        DirectoryRole::Interop,
        DirectoryRole::Thumbnail,
    ];

    pub const fn raw(self) -> i32 {
        match self {
            DirectoryRole::Root => 0,
            DirectoryRole::Thumbnail => 1,
            DirectoryRole::Unknown => -1,
            DirectoryRole::Exif => -2,
            DirectoryRole::Gps => -3,
            DirectoryRole::Interop => -4,
        }
    }

    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            0 => DirectoryRole::Root,
            1 => DirectoryRole::Thumbnail,
            -2 => DirectoryRole::Exif,
            -3 => DirectoryRole::Gps,
            -4 => DirectoryRole::Interop,
            _ => DirectoryRole::Unknown,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DirectoryRole::Root => "IFD0",
            DirectoryRole::Thumbnail => "IFD1",
            DirectoryRole::Exif => "Exif",
            DirectoryRole::Gps => "GPS",
            DirectoryRole::Interop => "Interop",
            DirectoryRole::Unknown => "Unknown",
        }
    }

    /// Parse a role from a user-supplied name (`root`, `ifd0`, `exif`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "root" | "ifd0" => Some(DirectoryRole::Root),
            "thumbnail" | "ifd1" => Some(DirectoryRole::Thumbnail),
            "exif" => Some(DirectoryRole::Exif),
            "gps" => Some(DirectoryRole::Gps),
            "interop" | "interoperability" => Some(DirectoryRole::Interop),
            _ => None,
        }
    }
}

// =============================================================================
// Tag numbers used by the engine itself
// =============================================================================

/// Tag numbers the parser and writer treat specially, plus the common ones
/// callers reach for.
pub mod tag {
    pub const IMAGE_DESCRIPTION: u16 = 0x010E;
    pub const MAKE: u16 = 0x010F;
    pub const MODEL: u16 = 0x0110;
    pub const STRIP_OFFSETS: u16 = 0x0111;
    pub const ORIENTATION: u16 = 0x0112;
    pub const STRIP_BYTE_COUNTS: u16 = 0x0117;
    pub const X_RESOLUTION: u16 = 0x011A;
    pub const Y_RESOLUTION: u16 = 0x011B;
    pub const RESOLUTION_UNIT: u16 = 0x0128;
    pub const SOFTWARE: u16 = 0x0131;
    pub const DATE_TIME: u16 = 0x0132;
    pub const JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;
    pub const JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;
    pub const EXIF_OFFSET: u16 = 0x8769;
    pub const GPS_INFO: u16 = 0x8825;

    pub const EXPOSURE_TIME: u16 = 0x829A;
    pub const F_NUMBER: u16 = 0x829D;
    pub const ISO: u16 = 0x8827;
    pub const EXIF_VERSION: u16 = 0x9000;
    pub const DATE_TIME_ORIGINAL: u16 = 0x9003;
    pub const CREATE_DATE: u16 = 0x9004;
    pub const SHUTTER_SPEED_VALUE: u16 = 0x9201;
    pub const APERTURE_VALUE: u16 = 0x9202;
    pub const BRIGHTNESS_VALUE: u16 = 0x9203;
    pub const FOCAL_LENGTH: u16 = 0x920A;
    pub const MAKER_NOTE: u16 = 0x927C;
    pub const USER_COMMENT: u16 = 0x9286;
    pub const INTEROP_OFFSET: u16 = 0xA005;

    pub const GPS_VERSION_ID: u16 = 0x0000;
    pub const GPS_LATITUDE_REF: u16 = 0x0001;
    pub const GPS_LATITUDE: u16 = 0x0002;
    pub const GPS_LONGITUDE_REF: u16 = 0x0003;
    pub const GPS_LONGITUDE: u16 = 0x0004;

    pub const INTEROP_INDEX: u16 = 0x0001;
}

/// Whether a tag is a structural pointer the writer synthesizes itself.
pub fn is_structural_tag(role: DirectoryRole, tag_number: u16) -> bool {
    match role {
        DirectoryRole::Root | DirectoryRole::Thumbnail => matches!(
            tag_number,
            tag::EXIF_OFFSET
                | tag::GPS_INFO
                | tag::JPEG_INTERCHANGE_FORMAT
                | tag::JPEG_INTERCHANGE_FORMAT_LENGTH
        ),
        DirectoryRole::Exif => tag_number == tag::INTEROP_OFFSET,
        _ => false,
    }
}

// =============================================================================
// TagInfo
// =============================================================================

/// Name used for tags missing from every table.
pub const UNKNOWN_TAG_NAME: &str = "Unknown Tag";

/// Metadata describing a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagInfo {
    /// Tag number, echoed verbatim from the lookup for unknown tags
    pub tag: i32,

    /// Human-readable tag name
    pub name: &'static str,

    /// Field types a value of this tag may be written as, most preferred first
    pub field_types: &'static [FieldType],

    /// Directory the tag is expected in, `None` if it can appear anywhere
    pub role: Option<DirectoryRole>,
}

impl TagInfo {
    pub const fn new(
        tag: i32,
        name: &'static str,
        field_types: &'static [FieldType],
        role: DirectoryRole,
    ) -> Self {
        Self {
            tag,
            name,
            field_types,
            role: Some(role),
        }
    }

    /// Fallback entry for a tag missing from every table.
    pub const fn unknown(tag: i32) -> Self {
        Self {
            tag,
            name: UNKNOWN_TAG_NAME,
            field_types: FieldType::ALL,
            role: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_TAG_NAME
    }

    pub fn accepts(&self, field_type: FieldType) -> bool {
        self.field_types.contains(&field_type)
    }
}

// =============================================================================
// Tag tables
// =============================================================================

use DirectoryRole::{Exif, Gps, Interop, Root};
use FieldType::{Ascii, Byte, Long, Rational, SRational, Short, Undefined};

const BYTE: &[FieldType] = &[Byte];
const ASCII: &[FieldType] = &[Ascii];
const SHORT: &[FieldType] = &[Short];
const LONG: &[FieldType] = &[Long];
const SHORT_OR_LONG: &[FieldType] = &[Short, Long];
const RATIONAL: &[FieldType] = &[Rational];
const SRATIONAL: &[FieldType] = &[SRational];
const UNDEFINED: &[FieldType] = &[Undefined];

const TIFF_TAGS: &[TagInfo] = &[
    TagInfo::new(0x0100, "ImageWidth", SHORT_OR_LONG, Root),
    TagInfo::new(0x0101, "ImageLength", SHORT_OR_LONG, Root),
    TagInfo::new(0x0102, "BitsPerSample", SHORT, Root),
    TagInfo::new(0x0103, "Compression", SHORT, Root),
    TagInfo::new(0x0106, "PhotometricInterpretation", SHORT, Root),
    TagInfo::new(0x010E, "ImageDescription", ASCII, Root),
    TagInfo::new(0x010F, "Make", ASCII, Root),
    TagInfo::new(0x0110, "Model", ASCII, Root),
    TagInfo::new(0x0111, "StripOffsets", SHORT_OR_LONG, Root),
    TagInfo::new(0x0112, "Orientation", SHORT, Root),
    TagInfo::new(0x0115, "SamplesPerPixel", SHORT, Root),
    TagInfo::new(0x0116, "RowsPerStrip", SHORT_OR_LONG, Root),
    TagInfo::new(0x0117, "StripByteCounts", SHORT_OR_LONG, Root),
    TagInfo::new(0x011A, "XResolution", RATIONAL, Root),
    TagInfo::new(0x011B, "YResolution", RATIONAL, Root),
    TagInfo::new(0x011C, "PlanarConfiguration", SHORT, Root),
    TagInfo::new(0x0128, "ResolutionUnit", SHORT, Root),
    TagInfo::new(0x012D, "TransferFunction", SHORT, Root),
    TagInfo::new(0x0131, "Software", ASCII, Root),
    TagInfo::new(0x0132, "DateTime", ASCII, Root),
    TagInfo::new(0x013B, "Artist", ASCII, Root),
    TagInfo::new(0x013E, "WhitePoint", RATIONAL, Root),
    TagInfo::new(0x013F, "PrimaryChromaticities", RATIONAL, Root),
    TagInfo::new(0x0201, "JpegInterchangeFormat", LONG, Root),
    TagInfo::new(0x0202, "JpegInterchangeFormatLength", LONG, Root),
    TagInfo::new(0x0211, "YCbCrCoefficients", RATIONAL, Root),
    TagInfo::new(0x0212, "YCbCrSubSampling", SHORT, Root),
    TagInfo::new(0x0213, "YCbCrPositioning", SHORT, Root),
    TagInfo::new(0x0214, "ReferenceBlackWhite", RATIONAL, Root),
    TagInfo::new(0x4746, "Rating", SHORT, Root),
    TagInfo::new(0x8298, "Copyright", ASCII, Root),
    TagInfo::new(0x8769, "ExifOffset", LONG, Root),
    TagInfo::new(0x8825, "GPSInfo", LONG, Root),
    TagInfo::new(0x9C9B, "XPTitle", BYTE, Root),
    TagInfo::new(0x9C9C, "XPComment", BYTE, Root),
    TagInfo::new(0x9C9D, "XPAuthor", BYTE, Root),
    TagInfo::new(0x9C9E, "XPKeywords", BYTE, Root),
    TagInfo::new(0x9C9F, "XPSubject", BYTE, Root),
];

const EXIF_TAGS: &[TagInfo] = &[
    TagInfo::new(0x829A, "ExposureTime", RATIONAL, Exif),
    TagInfo::new(0x829D, "FNumber", RATIONAL, Exif),
    TagInfo::new(0x8822, "ExposureProgram", SHORT, Exif),
    TagInfo::new(0x8824, "SpectralSensitivity", ASCII, Exif),
    TagInfo::new(0x8827, "ISO", SHORT, Exif),
    TagInfo::new(0x8828, "OptoElectricConvFactor", UNDEFINED, Exif),
    TagInfo::new(0x8830, "SensitivityType", SHORT, Exif),
    TagInfo::new(0x9000, "ExifVersion", UNDEFINED, Exif),
    TagInfo::new(0x9003, "DateTimeOriginal", ASCII, Exif),
    TagInfo::new(0x9004, "CreateDate", ASCII, Exif),
    TagInfo::new(0x9010, "OffsetTime", ASCII, Exif),
    TagInfo::new(0x9011, "OffsetTimeOriginal", ASCII, Exif),
    TagInfo::new(0x9012, "OffsetTimeDigitized", ASCII, Exif),
    TagInfo::new(0x9101, "ComponentsConfiguration", UNDEFINED, Exif),
    TagInfo::new(0x9102, "CompressedBitsPerPixel", RATIONAL, Exif),
    TagInfo::new(0x9201, "ShutterSpeedValue", SRATIONAL, Exif),
    TagInfo::new(0x9202, "ApertureValue", RATIONAL, Exif),
    TagInfo::new(0x9203, "BrightnessValue", SRATIONAL, Exif),
    TagInfo::new(0x9204, "ExposureCompensation", SRATIONAL, Exif),
    TagInfo::new(0x9205, "MaxApertureValue", RATIONAL, Exif),
    TagInfo::new(0x9206, "SubjectDistance", RATIONAL, Exif),
    TagInfo::new(0x9207, "MeteringMode", SHORT, Exif),
    TagInfo::new(0x9208, "LightSource", SHORT, Exif),
    TagInfo::new(0x9209, "Flash", SHORT, Exif),
    TagInfo::new(0x920A, "FocalLength", RATIONAL, Exif),
    TagInfo::new(0x9214, "SubjectArea", SHORT, Exif),
    TagInfo::new(0x927C, "MakerNote", UNDEFINED, Exif),
    TagInfo::new(0x9286, "UserComment", UNDEFINED, Exif),
    TagInfo::new(0x9290, "SubSecTime", ASCII, Exif),
    TagInfo::new(0x9291, "SubSecTimeOriginal", ASCII, Exif),
    TagInfo::new(0x9292, "SubSecTimeDigitized", ASCII, Exif),
    TagInfo::new(0xA000, "FlashpixVersion", UNDEFINED, Exif),
    TagInfo::new(0xA001, "ColorSpace", SHORT, Exif),
    TagInfo::new(0xA002, "ExifImageWidth", SHORT_OR_LONG, Exif),
    TagInfo::new(0xA003, "ExifImageLength", SHORT_OR_LONG, Exif),
    TagInfo::new(0xA004, "RelatedSoundFile", ASCII, Exif),
    TagInfo::new(0xA005, "InteropOffset", LONG, Exif),
    TagInfo::new(0xA20E, "FocalPlaneXResolution", RATIONAL, Exif),
    TagInfo::new(0xA20F, "FocalPlaneYResolution", RATIONAL, Exif),
    TagInfo::new(0xA210, "FocalPlaneResolutionUnit", SHORT, Exif),
    TagInfo::new(0xA215, "ExposureIndex", RATIONAL, Exif),
    TagInfo::new(0xA217, "SensingMethod", SHORT, Exif),
    TagInfo::new(0xA300, "FileSource", UNDEFINED, Exif),
    TagInfo::new(0xA301, "SceneType", UNDEFINED, Exif),
    TagInfo::new(0xA401, "CustomRendered", SHORT, Exif),
    TagInfo::new(0xA402, "ExposureMode", SHORT, Exif),
    TagInfo::new(0xA403, "WhiteBalance", SHORT, Exif),
    TagInfo::new(0xA404, "DigitalZoomRatio", RATIONAL, Exif),
    TagInfo::new(0xA405, "FocalLengthIn35mmFormat", SHORT, Exif),
    TagInfo::new(0xA406, "SceneCaptureType", SHORT, Exif),
    TagInfo::new(0xA407, "GainControl", SHORT, Exif),
    TagInfo::new(0xA408, "Contrast", SHORT, Exif),
    TagInfo::new(0xA409, "Saturation", SHORT, Exif),
    TagInfo::new(0xA40A, "Sharpness", SHORT, Exif),
    TagInfo::new(0xA40C, "SubjectDistanceRange", SHORT, Exif),
    TagInfo::new(0xA420, "ImageUniqueID", ASCII, Exif),
    TagInfo::new(0xA430, "OwnerName", ASCII, Exif),
    TagInfo::new(0xA431, "SerialNumber", ASCII, Exif),
    TagInfo::new(0xA432, "LensInfo", RATIONAL, Exif),
    TagInfo::new(0xA433, "LensMake", ASCII, Exif),
    TagInfo::new(0xA434, "LensModel", ASCII, Exif),
    TagInfo::new(0xA435, "LensSerialNumber", ASCII, Exif),
];

const GPS_TAGS: &[TagInfo] = &[
    TagInfo::new(0x0000, "GPSVersionID", BYTE, Gps),
    TagInfo::new(0x0001, "GPSLatitudeRef", ASCII, Gps),
    TagInfo::new(0x0002, "GPSLatitude", RATIONAL, Gps),
    TagInfo::new(0x0003, "GPSLongitudeRef", ASCII, Gps),
    TagInfo::new(0x0004, "GPSLongitude", RATIONAL, Gps),
    TagInfo::new(0x0005, "GPSAltitudeRef", BYTE, Gps),
    TagInfo::new(0x0006, "GPSAltitude", RATIONAL, Gps),
    TagInfo::new(0x0007, "GPSTimeStamp", RATIONAL, Gps),
    TagInfo::new(0x0008, "GPSSatellites", ASCII, Gps),
    TagInfo::new(0x0009, "GPSStatus", ASCII, Gps),
    TagInfo::new(0x000A, "GPSMeasureMode", ASCII, Gps),
    TagInfo::new(0x000B, "GPSDOP", RATIONAL, Gps),
    TagInfo::new(0x000C, "GPSSpeedRef", ASCII, Gps),
    TagInfo::new(0x000D, "GPSSpeed", RATIONAL, Gps),
    TagInfo::new(0x000E, "GPSTrackRef", ASCII, Gps),
    TagInfo::new(0x000F, "GPSTrack", RATIONAL, Gps),
    TagInfo::new(0x0010, "GPSImgDirectionRef", ASCII, Gps),
    TagInfo::new(0x0011, "GPSImgDirection", RATIONAL, Gps),
    TagInfo::new(0x0012, "GPSMapDatum", ASCII, Gps),
    TagInfo::new(0x0017, "GPSDestBearingRef", ASCII, Gps),
    TagInfo::new(0x0018, "GPSDestBearing", RATIONAL, Gps),
    TagInfo::new(0x001B, "GPSProcessingMethod", UNDEFINED, Gps),
    TagInfo::new(0x001D, "GPSDateStamp", ASCII, Gps),
    TagInfo::new(0x001E, "GPSDifferential", SHORT, Gps),
];

const INTEROP_TAGS: &[TagInfo] = &[
    TagInfo::new(0x0001, "InteropIndex", ASCII, Interop),
    TagInfo::new(0x0002, "InteropVersion", UNDEFINED, Interop),
    TagInfo::new(0x1000, "RelatedImageFileFormat", ASCII, Interop),
    TagInfo::new(0x1001, "RelatedImageWidth", SHORT_OR_LONG, Interop),
    TagInfo::new(0x1002, "RelatedImageHeight", SHORT_OR_LONG, Interop),
];

// =============================================================================
// TagRegistry
// =============================================================================

static GLOBAL_REGISTRY: Lazy<TagRegistry> = Lazy::new(TagRegistry::new);

/// Immutable lookup table from (directory role, tag number) to [`TagInfo`].
///
/// Build one with [`TagRegistry::new`] and pass it to the parser and the
/// rewriter, or share the process-wide instance from [`TagRegistry::global`].
#[derive(Debug, Clone)]
pub struct TagRegistry {
    by_role: HashMap<(DirectoryRole, i32), TagInfo>,
    by_number: HashMap<i32, TagInfo>,
    by_name: HashMap<String, TagInfo>,
}

impl TagRegistry {
    /// Build a registry from the TIFF, Exif, GPS and Interop tables.
    ///
    /// When a number appears in several tables, the number-only lookup keeps
    /// the first one in that table order.
    pub fn new() -> Self {
        let mut registry = TagRegistry {
            by_role: HashMap::new(),
            by_number: HashMap::new(),
            by_name: HashMap::new(),
        };
        for table in [TIFF_TAGS, EXIF_TAGS, GPS_TAGS, INTEROP_TAGS] {
            for info in table {
                registry.register(*info);
            }
        }
        registry
    }

    /// The process-wide registry, built on first use.
    pub fn global() -> &'static TagRegistry {
        &GLOBAL_REGISTRY
    }

    fn register(&mut self, info: TagInfo) {
        if let Some(role) = info.role {
            self.by_role.insert((role, info.tag), info);
        }
        self.by_number.entry(info.tag).or_insert(info);
        self.by_name
            .entry(info.name.to_ascii_lowercase())
            .or_insert(info);
    }

    /// Look up a tag, never failing.
    ///
    /// Prefers an exact (role, tag) match, then any table containing the
    /// number, then a synthesized "Unknown Tag" that echoes `tag` verbatim.
    pub fn lookup(&self, role: DirectoryRole, tag: impl Into<i32>) -> TagInfo {
        let tag = tag.into();
        self.by_role
            .get(&(role, tag))
            .or_else(|| self.by_number.get(&tag))
            .copied()
            .unwrap_or(TagInfo::unknown(tag))
    }

    /// Find a registered tag by name, ignoring case.
    pub fn lookup_by_name(&self, name: &str) -> Option<TagInfo> {
        self.by_name.get(&name.to_ascii_lowercase()).copied()
    }

    /// Number of distinct (role, tag) entries.
    pub fn len(&self) -> usize {
        self.by_role.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_role.is_empty()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
