//! Two-pass TIFF serialization of an [`OutputSet`].
//!
//! Pass one ([`TiffLayout::plan`]) decides which directories exist, adds the
//! structural pointer entries, sorts every directory by tag and assigns an
//! offset to each IFD table, each out-of-line value and the thumbnail. Pass
//! two ([`TiffLayout::emit`]) writes bytes from that plan only; pointer values
//! are resolved from the planned offsets.
//!
//! # Block Layout
//! ```text
//! header (8 bytes)
//! IFD0 table      + IFD0 values
//! Exif table      + Exif values
//! Interop table   + Interop values
//! GPS table       + GPS values
//! IFD1 table      + IFD1 values
//! thumbnail JPEG bytes
//! ```
//! Every table and out-of-line value starts on a word (2-byte) boundary.

use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::ExifError;
use crate::tiff::parser::{ByteOrder, RawIfd, TiffHeader, INLINE_VALUE_SIZE, TIFF_HEADER_SIZE};
use crate::tiff::tags::{is_structural_tag, tag, DirectoryRole, FieldType};

use super::output::OutputSet;

/// Order in which directories are placed in the block.
const LAYOUT_ORDER: [DirectoryRole; 5] = [
    DirectoryRole::Root,
    DirectoryRole::Exif,
    DirectoryRole::Interop,
    DirectoryRole::Gps,
    DirectoryRole::Thumbnail,
];

#[inline]
fn word_align(offset: usize) -> usize {
    offset + (offset & 1)
}

/// Value of a planned entry; structural values are resolved in pass two.
#[derive(Debug)]
enum EntryValue<'a> {
    Data(Cow<'a, [u8]>),
    DirectoryPointer(DirectoryRole),
    ThumbnailOffset,
    ThumbnailLength(u32),
}

#[derive(Debug)]
struct PlannedEntry<'a> {
    tag: u16,
    field_type: FieldType,
    count: u32,
    value: EntryValue<'a>,
    /// Offset of the out-of-line value, `None` when it fits inline
    data_offset: Option<usize>,
}

impl<'a> PlannedEntry<'a> {
    fn data(tag: u16, field_type: FieldType, count: u32, bytes: Cow<'a, [u8]>) -> Self {
        PlannedEntry {
            tag,
            field_type,
            count,
            value: EntryValue::Data(bytes),
            data_offset: None,
        }
    }

    fn long(tag: u16, value: EntryValue<'a>) -> Self {
        PlannedEntry {
            tag,
            field_type: FieldType::Long,
            count: 1,
            value,
            data_offset: None,
        }
    }

    fn out_of_line_len(&self) -> Option<usize> {
        match &self.value {
            EntryValue::Data(bytes) if bytes.len() > INLINE_VALUE_SIZE => Some(bytes.len()),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct PlannedDirectory<'a> {
    role: DirectoryRole,
    offset: usize,
    entries: Vec<PlannedEntry<'a>>,
}

/// The byte-level plan of one TIFF block.
#[derive(Debug)]
pub struct TiffLayout<'a> {
    byte_order: ByteOrder,
    directories: Vec<PlannedDirectory<'a>>,
    thumbnail: Option<(&'a [u8], usize)>,
    total_size: usize,
}

impl<'a> TiffLayout<'a> {
    /// Pass one: build the directory tree and assign every offset.
    ///
    /// # Errors
    /// - `SegmentTooLarge` if the block cannot be addressed with 32-bit offsets
    /// - `UnsupportedFormat` if a directory has more entries than an IFD can
    ///   count
    pub fn plan(set: &'a OutputSet) -> Result<Self, ExifError> {
        let byte_order = set.byte_order();
        let has_fields = |role| set.directory(role).is_some_and(|d| !d.is_empty());
        let thumbnail = set.thumbnail().map(|t| t.as_ref());

        let has_interop = has_fields(DirectoryRole::Interop);
        let has_exif = has_interop || has_fields(DirectoryRole::Exif);
        let has_gps = has_fields(DirectoryRole::Gps);
        let has_thumbnail = thumbnail.is_some() || has_fields(DirectoryRole::Thumbnail);

        for directory in set.directories() {
            if !LAYOUT_ORDER.contains(&directory.role()) && !directory.is_empty() {
                warn!(
                    fields = directory.len(),
                    "Dropping directory of unknown role"
                );
            }
        }

        let mut directories = Vec::with_capacity(LAYOUT_ORDER.len());
        for role in LAYOUT_ORDER {
            let present = match role {
                DirectoryRole::Root => true,
                DirectoryRole::Exif => has_exif,
                DirectoryRole::Interop => has_interop,
                DirectoryRole::Gps => has_gps,
                DirectoryRole::Thumbnail => has_thumbnail,
                DirectoryRole::Unknown => false,
            };
            if !present {
                continue;
            }

            let mut entries: Vec<PlannedEntry<'a>> = set
                .directory(role)
                .map(|d| d.fields())
                .unwrap_or_default()
                .iter()
                .filter(|field| {
                    let structural = is_structural_tag(role, field.tag());
                    if structural {
                        debug!(tag = field.tag(), "Ignoring structural tag supplied as a field");
                    }
                    !structural
                })
                .map(|field| {
                    PlannedEntry::data(
                        field.tag(),
                        field.field_type(),
                        field.count(),
                        field.encoded(byte_order),
                    )
                })
                .collect();

            match role {
                DirectoryRole::Root => {
                    if has_exif {
                        entries.push(PlannedEntry::long(
                            tag::EXIF_OFFSET,
                            EntryValue::DirectoryPointer(DirectoryRole::Exif),
                        ));
                    }
                    if has_gps {
                        entries.push(PlannedEntry::long(
                            tag::GPS_INFO,
                            EntryValue::DirectoryPointer(DirectoryRole::Gps),
                        ));
                    }
                }
                DirectoryRole::Exif if has_interop => {
                    entries.push(PlannedEntry::long(
                        tag::INTEROP_OFFSET,
                        EntryValue::DirectoryPointer(DirectoryRole::Interop),
                    ));
                }
                DirectoryRole::Thumbnail => {
                    if let Some(jpeg) = thumbnail {
                        let length =
                            u32::try_from(jpeg.len()).map_err(|_| ExifError::SegmentTooLarge {
                                size: jpeg.len(),
                                limit: u32::MAX as usize,
                            })?;
                        entries.push(PlannedEntry::long(
                            tag::JPEG_INTERCHANGE_FORMAT,
                            EntryValue::ThumbnailOffset,
                        ));
                        entries.push(PlannedEntry::long(
                            tag::JPEG_INTERCHANGE_FORMAT_LENGTH,
                            EntryValue::ThumbnailLength(length),
                        ));
                    }
                }
                _ => {}
            }

            if entries.len() > u16::MAX as usize {
                return Err(ExifError::unsupported(format!(
                    "{} directory has {} entries, at most {} fit in one IFD",
                    role.name(),
                    entries.len(),
                    u16::MAX
                )));
            }

            entries.sort_by_key(|e| e.tag);
            directories.push(PlannedDirectory {
                role,
                offset: 0,
                entries,
            });
        }

        // Assign offsets
        let mut cursor = TIFF_HEADER_SIZE;
        for directory in &mut directories {
            cursor = word_align(cursor);
            directory.offset = cursor;
            cursor += RawIfd::table_size(directory.entries.len());
            for entry in &mut directory.entries {
                if let Some(len) = entry.out_of_line_len() {
                    cursor = word_align(cursor);
                    entry.data_offset = Some(cursor);
                    cursor += len;
                }
            }
        }
        let thumbnail = thumbnail.map(|jpeg| {
            cursor = word_align(cursor);
            let offset = cursor;
            cursor += jpeg.len();
            (jpeg, offset)
        });

        if cursor > u32::MAX as usize {
            return Err(ExifError::SegmentTooLarge {
                size: cursor,
                limit: u32::MAX as usize,
            });
        }

        debug!(
            directories = directories.len(),
            size = cursor,
            "Planned TIFF layout"
        );

        Ok(TiffLayout {
            byte_order,
            directories,
            thumbnail,
            total_size: cursor,
        })
    }

    /// Size in bytes of the block [`emit`](Self::emit) will produce.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Roles of the directories that will be written, in layout order.
    pub fn roles(&self) -> Vec<DirectoryRole> {
        self.directories.iter().map(|d| d.role).collect()
    }

    fn directory_offset(&self, role: DirectoryRole) -> u32 {
        self.directories
            .iter()
            .find(|d| d.role == role)
            .map_or(0, |d| d.offset as u32)
    }

    /// Pass two: write the planned block.
    pub fn emit(&self) -> Bytes {
        let order = self.byte_order;
        let mut out = BytesMut::with_capacity(self.total_size);

        let first_ifd = self.directory_offset(DirectoryRole::Root);
        out.put_slice(&TiffHeader::to_bytes(order, first_ifd));

        for directory in &self.directories {
            out.resize(directory.offset, 0);
            out.put_slice(&order.u16_bytes(directory.entries.len() as u16));

            for entry in &directory.entries {
                out.put_slice(&order.u16_bytes(entry.tag));
                out.put_slice(&order.u16_bytes(entry.field_type.as_u16()));
                out.put_slice(&order.u32_bytes(entry.count));

                let mut inline = [0u8; INLINE_VALUE_SIZE];
                match (&entry.value, entry.data_offset) {
                    (_, Some(offset)) => inline = order.u32_bytes(offset as u32),
                    (EntryValue::Data(bytes), None) => inline[..bytes.len()].copy_from_slice(bytes),
                    (EntryValue::DirectoryPointer(role), None) => {
                        inline = order.u32_bytes(self.directory_offset(*role))
                    }
                    (EntryValue::ThumbnailOffset, None) => {
                        let offset = self.thumbnail.map_or(0, |(_, offset)| offset);
                        inline = order.u32_bytes(offset as u32)
                    }
                    (EntryValue::ThumbnailLength(len), None) => inline = order.u32_bytes(*len),
                }
                out.put_slice(&inline);
            }

            // Only IFD0 links onward, to IFD1
            let next = match directory.role {
                DirectoryRole::Root => self.directory_offset(DirectoryRole::Thumbnail),
                _ => 0,
            };
            out.put_slice(&order.u32_bytes(next));

            for entry in &directory.entries {
                if let (EntryValue::Data(bytes), Some(offset)) = (&entry.value, entry.data_offset) {
                    out.resize(offset, 0);
                    out.put_slice(bytes);
                }
            }
        }

        if let Some((jpeg, offset)) = self.thumbnail {
            out.resize(offset, 0);
            out.put_slice(jpeg);
        }

        debug_assert_eq!(out.len(), self.total_size);
        out.freeze()
    }
}

/// Serialize `set` as a complete TIFF block.
pub fn write_tiff_block(set: &OutputSet) -> Result<Bytes, ExifError> {
    Ok(TiffLayout::plan(set)?.emit())
}

// =============================================================================
// Tests
// =============================================================================
