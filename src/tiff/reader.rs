//! Read model: the parsed, immutable view of an EXIF TIFF block.
//!
//! [`ImageMetadata::parse`] walks the directory graph starting at IFD0:
//!
//! ```text
//! IFD0 (Root) ──ExifOffset──▶ Exif ──InteropOffset──▶ Interop
//!   │  └──────GPSInfo───────▶ GPS
//!   └─next IFD──▶ IFD1 (Thumbnail) ──JpegInterchangeFormat──▶ thumbnail bytes
//! ```
//!
//! # Partial results
//!
//! Only a broken header or an unreadable IFD0 fails the parse. Everything
//! else degrades: a field with an unknown type, or whose value overruns the
//! block, is skipped; a sub-directory pointer that is out of range or points
//! back at an already visited directory is ignored. Each of these is recorded
//! as a [`FieldWarning`] and logged, and parsing continues.

use std::collections::HashSet;
use std::fmt;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{ExifError, TiffError};
use crate::jpeg::segments::strip_exif_identifier;

use super::parser::{ByteOrder, IfdEntry, RawIfd, TiffHeader};
use super::tags::{is_structural_tag, tag, DirectoryRole, FieldType, TagInfo, TagRegistry};
use super::values::FieldValue;
use super::write::{OutputField, OutputSet};

// =============================================================================
// TiffField
// =============================================================================

/// One parsed field.
#[derive(Debug, Clone, PartialEq)]
pub struct TiffField {
    /// Tag number
    pub tag: u16,

    /// Field type as stored
    pub field_type: FieldType,

    /// Number of elements
    pub count: u32,

    /// Value bytes exactly as stored, in the block's byte order
    pub raw: Bytes,

    /// Decoded value
    pub value: FieldValue,

    /// Registry entry for this tag in its directory
    pub tag_info: TagInfo,

    /// Directory this field was read from
    pub directory: DirectoryRole,
}

impl TiffField {
    pub fn tag_name(&self) -> &'static str {
        self.tag_info.name
    }

    /// Display form of the value: quoted text, rationals as `n/d`, hex for
    /// short undefined data.
    pub fn value_description(&self) -> String {
        self.value.describe()
    }
}

impl fmt::Display for TiffField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:04X} ({}): {}",
            self.tag,
            self.tag_name(),
            self.value_description()
        )
    }
}

// =============================================================================
// TiffDirectory
// =============================================================================

/// A parsed directory: its fields in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct TiffDirectory {
    role: DirectoryRole,
    offset: u32,
    fields: Vec<TiffField>,
}

impl TiffDirectory {
    pub fn role(&self) -> DirectoryRole {
        self.role
    }

    /// Offset of the IFD table in the TIFF block
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn fields(&self) -> &[TiffField] {
        &self.fields
    }

    pub fn find_field(&self, tag: u16) -> Option<&TiffField> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// Warnings
// =============================================================================

/// A field or sub-directory that was skipped while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWarning {
    /// Directory being parsed when the problem was found
    pub directory: DirectoryRole,

    /// Offending tag (the pointer tag for sub-directory problems)
    pub tag: u16,

    /// What went wrong
    pub message: String,
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tag 0x{:04X}: {}",
            self.directory.name(),
            self.tag,
            self.message
        )
    }
}

// =============================================================================
// GPS
// =============================================================================

/// GPS position in signed decimal degrees (south and west are negative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Degrees/minutes/seconds rationals plus a reference letter to decimal degrees.
fn dms_to_degrees(field: &TiffField, reference: &TiffField, negative_ref: &str) -> Option<f64> {
    let parts = field.value.as_rationals()?;
    let mut degrees = 0.0;
    for (part, divisor) in parts.iter().zip([1.0, 60.0, 3600.0]) {
        let value = part.to_f64();
        if value.is_nan() {
            return None;
        }
        degrees += value / divisor;
    }
    let reference = reference.value.as_text()?;
    if reference.trim().eq_ignore_ascii_case(negative_ref) {
        degrees = -degrees;
    }
    Some(degrees)
}

// =============================================================================
// ImageMetadata
// =============================================================================

/// Parsed EXIF metadata of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    byte_order: ByteOrder,
    directories: Vec<TiffDirectory>,
    thumbnail: Option<Bytes>,
    warnings: Vec<FieldWarning>,
}

impl ImageMetadata {
    /// Parse a TIFF block starting at its "II"/"MM" header.
    ///
    /// # Errors
    /// - `UnsupportedFormat` if the block does not start with a TIFF header
    /// - `MalformedDirectory` if IFD0 lies outside the block or cannot be read
    pub fn parse(tiff: &[u8], registry: &TagRegistry) -> Result<Self, ExifError> {
        let header = TiffHeader::parse(tiff).map_err(|e| match e {
            TiffError::InvalidIfdOffset(_) => ExifError::MalformedDirectory(e),
            other => ExifError::unsupported(format!("not a TIFF block: {other}")),
        })?;
        let mut walker = DirectoryWalker {
            block: tiff,
            byte_order: header.byte_order,
            registry,
            visited: HashSet::new(),
            warnings: Vec::new(),
        };

        let root_ifd = RawIfd::parse(tiff, header.first_ifd_offset, header.byte_order)?;
        walker.visited.insert(root_ifd.offset);
        let root = walker.read_fields(DirectoryRole::Root, &root_ifd);

        let mut directories = Vec::with_capacity(5);

        let exif = walker.follow(&root, tag::EXIF_OFFSET, DirectoryRole::Exif);
        let interop = exif
            .as_ref()
            .and_then(|exif| walker.follow(exif, tag::INTEROP_OFFSET, DirectoryRole::Interop));
        let gps = walker.follow(&root, tag::GPS_INFO, DirectoryRole::Gps);
        let thumbnail_dir = walker.next_directory(&root_ifd);

        let thumbnail = thumbnail_dir
            .as_ref()
            .and_then(|dir| walker.thumbnail_bytes(dir));
        if let Some(dir) = &thumbnail_dir {
            if dir.find_field(tag::STRIP_OFFSETS).is_some() {
                walker.warn(
                    DirectoryRole::Thumbnail,
                    tag::STRIP_OFFSETS,
                    "strip thumbnail data is not carried over to an output set",
                );
            }
        }

        directories.push(root);
        directories.extend(exif);
        directories.extend(interop);
        directories.extend(gps);
        directories.extend(thumbnail_dir);

        debug!(
            directories = directories.len(),
            warnings = walker.warnings.len(),
            "Parsed EXIF block"
        );

        Ok(ImageMetadata {
            byte_order: header.byte_order,
            directories,
            thumbnail,
            warnings: walker.warnings,
        })
    }

    /// Parse the payload of an EXIF APP1 segment (`Exif\0\0` + TIFF block).
    pub fn from_app1_payload(payload: &[u8], registry: &TagRegistry) -> Result<Self, ExifError> {
        let tiff = strip_exif_identifier(payload)
            .ok_or_else(|| ExifError::unsupported("APP1 payload lacks the Exif identifier"))?;
        Self::parse(tiff, registry)
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Directories in the order they were parsed.
    pub fn directories(&self) -> &[TiffDirectory] {
        &self.directories
    }

    pub fn directory(&self, role: DirectoryRole) -> Option<&TiffDirectory> {
        self.directories.iter().find(|d| d.role == role)
    }

    /// Embedded JPEG thumbnail referenced from IFD1, if any.
    pub fn thumbnail(&self) -> Option<&Bytes> {
        self.thumbnail.as_ref()
    }

    pub fn warnings(&self) -> &[FieldWarning] {
        &self.warnings
    }

    /// Find a field by tag, searching Exif, GPS, Root, Interop, then Thumbnail.
    pub fn find_field(&self, tag: u16) -> Option<&TiffField> {
        DirectoryRole::SEARCH_ORDER
            .iter()
            .find_map(|&role| self.find_field_in(role, tag))
    }

    /// Find a field by tag in one directory.
    pub fn find_field_in(&self, role: DirectoryRole, tag: u16) -> Option<&TiffField> {
        self.directory(role).and_then(|d| d.find_field(tag))
    }

    /// Latitude and longitude, when the GPS directory carries all four
    /// reference and coordinate fields.
    pub fn gps(&self) -> Option<GpsCoordinates> {
        let field = |t| self.find_field_in(DirectoryRole::Gps, t);
        let latitude = dms_to_degrees(
            field(tag::GPS_LATITUDE)?,
            field(tag::GPS_LATITUDE_REF)?,
            "S",
        )?;
        let longitude = dms_to_degrees(
            field(tag::GPS_LONGITUDE)?,
            field(tag::GPS_LONGITUDE_REF)?,
            "W",
        )?;
        Some(GpsCoordinates {
            latitude,
            longitude,
        })
    }

    /// Deep copy into a mutable [`OutputSet`] with the same byte order.
    ///
    /// Directory pointers and thumbnail offset/length are left out; the
    /// writer synthesizes them. Thumbnail bytes are carried over as data.
    /// Strip offsets/counts of an IFD1 strip thumbnail are dropped (parsing
    /// records a warning for them).
    pub fn to_output_set(&self) -> OutputSet {
        let mut set = OutputSet::new(self.byte_order);
        for directory in &self.directories {
            let output = set.get_or_create_directory(directory.role);
            for field in &directory.fields {
                if is_structural_tag(directory.role, field.tag)
                    || is_strip_thumbnail_tag(directory.role, field.tag)
                {
                    continue;
                }
                output.add(OutputField::from_value(
                    field.tag,
                    field.value.clone(),
                    self.byte_order,
                ));
            }
        }
        if let Some(thumbnail) = &self.thumbnail {
            set.set_thumbnail(thumbnail.clone());
        }
        set
    }
}

/// Strip offsets/counts of an uncompressed IFD1 thumbnail. Their offsets
/// would point at stale data after a rewrite, so they are not copied.
fn is_strip_thumbnail_tag(role: DirectoryRole, tag_number: u16) -> bool {
    role == DirectoryRole::Thumbnail
        && matches!(tag_number, tag::STRIP_OFFSETS | tag::STRIP_BYTE_COUNTS)
}

// =============================================================================
// Directory walking
// =============================================================================

struct DirectoryWalker<'a> {
    block: &'a [u8],
    byte_order: ByteOrder,
    registry: &'a TagRegistry,
    visited: HashSet<u32>,
    warnings: Vec<FieldWarning>,
}

impl DirectoryWalker<'_> {
    fn warn(&mut self, directory: DirectoryRole, tag: u16, message: impl Into<String>) {
        let warning = FieldWarning {
            directory,
            tag,
            message: message.into(),
        };
        warn!("Skipping {}", warning);
        self.warnings.push(warning);
    }

    /// Decode every usable entry of `ifd`.
    fn read_fields(&mut self, role: DirectoryRole, ifd: &RawIfd) -> TiffDirectory {
        let mut fields: Vec<TiffField> = Vec::with_capacity(ifd.entries.len());
        for entry in &ifd.entries {
            if fields.iter().any(|f| f.tag == entry.tag) {
                self.warn(role, entry.tag, "duplicate tag in directory");
                continue;
            }
            match self.read_field(role, entry) {
                Ok(field) => fields.push(field),
                Err(e) => self.warn(role, entry.tag, e.to_string()),
            }
        }
        TiffDirectory {
            role,
            offset: ifd.offset,
            fields,
        }
    }

    fn read_field(&self, role: DirectoryRole, entry: &IfdEntry) -> Result<TiffField, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;
        let raw = entry.value_bytes(self.block, self.byte_order)?;
        let value = FieldValue::decode(field_type, entry.count as usize, raw, self.byte_order)?;
        Ok(TiffField {
            tag: entry.tag,
            field_type,
            count: entry.count,
            raw: Bytes::copy_from_slice(raw),
            value,
            tag_info: self.registry.lookup(role, entry.tag),
            directory: role,
        })
    }

    /// Parse the directory at `offset`, guarding against revisits.
    fn load(
        &mut self,
        parent: DirectoryRole,
        pointer_tag: u16,
        role: DirectoryRole,
        offset: u32,
    ) -> Option<TiffDirectory> {
        if !self.visited.insert(offset) {
            self.warn(
                parent,
                pointer_tag,
                TiffError::DirectoryCycle(offset).to_string(),
            );
            return None;
        }
        match RawIfd::parse(self.block, offset, self.byte_order) {
            Ok(ifd) => Some(self.read_fields(role, &ifd)),
            Err(e) => {
                self.warn(parent, pointer_tag, format!("{} directory: {}", role.name(), e));
                None
            }
        }
    }

    /// Follow a pointer field of `parent` to a sub-directory.
    fn follow(
        &mut self,
        parent: &TiffDirectory,
        pointer_tag: u16,
        role: DirectoryRole,
    ) -> Option<TiffDirectory> {
        let field = parent.find_field(pointer_tag)?;
        let offset = field
            .value
            .as_integers()
            .and_then(|values| values.first().copied())
            .and_then(|v| u32::try_from(v).ok());
        match offset {
            Some(offset) => self.load(parent.role, pointer_tag, role, offset),
            None => {
                self.warn(parent.role, pointer_tag, "pointer field holds no offset");
                None
            }
        }
    }

    /// IFD1, linked from IFD0's next-directory offset.
    fn next_directory(&mut self, root: &RawIfd) -> Option<TiffDirectory> {
        if root.next_ifd_offset == 0 {
            return None;
        }
        // No tag carries this link; 0 marks the next-IFD offset in warnings.
        self.load(
            DirectoryRole::Root,
            0,
            DirectoryRole::Thumbnail,
            root.next_ifd_offset,
        )
    }

    fn thumbnail_bytes(&mut self, dir: &TiffDirectory) -> Option<Bytes> {
        let first = |t| {
            dir.find_field(t)
                .and_then(|f| f.value.as_integers())
                .and_then(|v| v.first().copied())
        };
        let offset = first(tag::JPEG_INTERCHANGE_FORMAT)?;
        let length = first(tag::JPEG_INTERCHANGE_FORMAT_LENGTH)?;
        let end = offset.checked_add(length)?;
        if offset < 0 || length < 0 || end as u64 > self.block.len() as u64 {
            self.warn(
                DirectoryRole::Thumbnail,
                tag::JPEG_INTERCHANGE_FORMAT,
                format!("thumbnail of {length} bytes at offset {offset} lies outside the block"),
            );
            return None;
        }
        Some(Bytes::copy_from_slice(
            &self.block[offset as usize..end as usize],
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================
