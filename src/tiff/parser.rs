//! TIFF header and IFD structure parsing.
//!
//! This module handles the byte-level structure of the TIFF block stored in
//! an EXIF APP1 segment. All offsets are relative to the start of the TIFF
//! header, never to the start of the JPEG file.
//!
//! # TIFF Header Structure (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```
//!
//! # IFD Structure
//! ```text
//! 2 bytes          entry count N
//! N * 12 bytes     entries (tag u16, type u16, count u32, value/offset 4 bytes)
//! 4 bytes          offset of the next IFD (0 = none)
//! ```

use crate::error::TiffError;

use super::tags::FieldType;

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
pub const TIFF_VERSION: u16 = 42;

/// Size of the TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of one IFD entry in bytes
pub const IFD_ENTRY_SIZE: usize = 12;

/// Size of the entry count at the start of an IFD
pub const IFD_COUNT_SIZE: usize = 2;

/// Size of the next-IFD offset at the end of an IFD
pub const IFD_NEXT_OFFSET_SIZE: usize = 4;

/// Size of the value/offset field of an entry; larger values live elsewhere
pub const INLINE_VALUE_SIZE: usize = 4;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF block.
///
/// The block declares its byte order in the first two bytes of the header.
/// All multi-byte values must be read and written respecting this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// The two marker bytes that open a TIFF header in this byte order.
    pub const fn marker(self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => [b'I', b'I'],
            ByteOrder::BigEndian => [b'M', b'M'],
        }
    }

    /// Read a u16 from the first two bytes of a slice.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 2 bytes.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        let raw = [bytes[0], bytes[1]];
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(raw),
            ByteOrder::BigEndian => u16::from_be_bytes(raw),
        }
    }

    /// Read a u32 from the first four bytes of a slice.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 4 bytes.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(raw),
            ByteOrder::BigEndian => u32::from_be_bytes(raw),
        }
    }

    /// Read a u64 from the first eight bytes of a slice.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 8 bytes.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(raw),
            ByteOrder::BigEndian => u64::from_be_bytes(raw),
        }
    }

    #[inline]
    pub fn u16_bytes(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    #[inline]
    pub fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    #[inline]
    pub fn u64_bytes(self, value: u64) -> [u8; 8] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the block
    pub byte_order: ByteOrder,

    /// Offset of IFD0, relative to the header
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Parse a TIFF header from the start of `bytes`.
    ///
    /// # Errors
    /// - `Truncated` if there are fewer than 8 bytes
    /// - `InvalidMagic` if byte order bytes are not II or MM
    /// - `InvalidVersion` if version is not 42
    /// - `InvalidIfdOffset` if IFD0 does not start inside the block
    pub fn parse(bytes: &[u8]) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::Truncated {
                required: TIFF_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        // Read as little-endian because we're checking for specific byte patterns
        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(TiffError::InvalidMagic(magic)),
        };

        let version = byte_order.read_u16(&bytes[2..4]);
        if version != TIFF_VERSION {
            return Err(TiffError::InvalidVersion(version));
        }

        let first_ifd_offset = byte_order.read_u32(&bytes[4..8]);
        if (first_ifd_offset as usize) < TIFF_HEADER_SIZE
            || first_ifd_offset as usize >= bytes.len()
        {
            return Err(TiffError::InvalidIfdOffset(first_ifd_offset));
        }

        Ok(TiffHeader {
            byte_order,
            first_ifd_offset,
        })
    }

    /// Serialize a header pointing at IFD0 located at `first_ifd_offset`.
    pub fn to_bytes(byte_order: ByteOrder, first_ifd_offset: u32) -> [u8; TIFF_HEADER_SIZE] {
        let mut out = [0u8; TIFF_HEADER_SIZE];
        out[0..2].copy_from_slice(&byte_order.marker());
        out[2..4].copy_from_slice(&byte_order.u16_bytes(TIFF_VERSION));
        out[4..8].copy_from_slice(&byte_order.u32_bytes(first_ifd_offset));
        out
    }
}

// =============================================================================
// IFD entries
// =============================================================================

/// A raw 12-byte IFD entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Tag number
    pub tag: u16,

    /// Decoded field type, `None` if the type number is not a TIFF 6.0 type
    pub field_type: Option<FieldType>,

    /// Raw field type number as stored
    pub field_type_raw: u16,

    /// Number of values (not bytes)
    pub count: u32,

    /// The 4-byte value/offset field exactly as stored
    pub value_offset_bytes: [u8; INLINE_VALUE_SIZE],
}

impl IfdEntry {
    fn parse(bytes: &[u8], byte_order: ByteOrder) -> Self {
        let field_type_raw = byte_order.read_u16(&bytes[2..4]);
        let mut value_offset_bytes = [0u8; INLINE_VALUE_SIZE];
        value_offset_bytes.copy_from_slice(&bytes[8..12]);
        IfdEntry {
            tag: byte_order.read_u16(&bytes[0..2]),
            field_type: FieldType::from_u16(field_type_raw),
            field_type_raw,
            count: byte_order.read_u32(&bytes[4..8]),
            value_offset_bytes,
        }
    }

    /// Total size of the value in bytes, `None` for unknown field types.
    pub fn value_byte_size(&self) -> Option<u64> {
        self.field_type
            .map(|t| t.size_in_bytes() as u64 * self.count as u64)
    }

    /// Whether the value is stored inside the entry itself.
    pub fn is_inline(&self) -> bool {
        matches!(self.value_byte_size(), Some(size) if size <= INLINE_VALUE_SIZE as u64)
    }

    /// Interpret the value/offset field as an offset.
    pub fn value_offset(&self, byte_order: ByteOrder) -> u32 {
        byte_order.read_u32(&self.value_offset_bytes)
    }

    /// Borrow the value bytes of this entry from the TIFF block.
    pub fn value_bytes<'a>(
        &'a self,
        block: &'a [u8],
        byte_order: ByteOrder,
    ) -> Result<&'a [u8], TiffError> {
        let size = self
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(self.field_type_raw))?;

        if size <= INLINE_VALUE_SIZE as u64 {
            return Ok(&self.value_offset_bytes[..size as usize]);
        }

        let offset = self.value_offset(byte_order);
        let end = offset as u64 + size;
        if end > block.len() as u64 {
            return Err(TiffError::FieldOutOfRange {
                tag: self.tag,
                offset,
                length: size,
            });
        }
        Ok(&block[offset as usize..end as usize])
    }
}

/// A raw IFD: its entries in file order plus the link to the next IFD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIfd {
    /// Offset of this IFD in the block
    pub offset: u32,

    /// Entries in the order they were stored
    pub entries: Vec<IfdEntry>,

    /// Offset of the next IFD, 0 if this is the last one
    pub next_ifd_offset: u32,
}

impl RawIfd {
    /// Parse the IFD located at `offset` in `block`.
    pub fn parse(block: &[u8], offset: u32, byte_order: ByteOrder) -> Result<Self, TiffError> {
        let start = offset as usize;
        if start < TIFF_HEADER_SIZE || start + IFD_COUNT_SIZE > block.len() {
            return Err(TiffError::InvalidIfdOffset(offset));
        }

        let entry_count = byte_order.read_u16(&block[start..]) as usize;
        let entries_start = start + IFD_COUNT_SIZE;
        let entries_end = entries_start + entry_count * IFD_ENTRY_SIZE;
        let required = entries_end + IFD_NEXT_OFFSET_SIZE;

        // A missing next-IFD pointer is tolerated; some writers omit it on the last IFD.
        if entries_end > block.len() {
            return Err(TiffError::Truncated {
                required,
                actual: block.len(),
            });
        }

        let entries = block[entries_start..entries_end]
            .chunks_exact(IFD_ENTRY_SIZE)
            .map(|chunk| IfdEntry::parse(chunk, byte_order))
            .collect();

        let next_ifd_offset = if required <= block.len() {
            byte_order.read_u32(&block[entries_end..])
        } else {
            0
        };

        Ok(RawIfd {
            offset,
            entries,
            next_ifd_offset,
        })
    }

    /// Size in bytes of an IFD table with `entry_count` entries.
    pub const fn table_size(entry_count: usize) -> usize {
        IFD_COUNT_SIZE + entry_count * IFD_ENTRY_SIZE + IFD_NEXT_OFFSET_SIZE
    }
}

// =============================================================================
// Tests
// =============================================================================
