//! Lossless replacement, insertion and removal of the EXIF APP1 segment.
//!
//! The output is assembled from slices of the input: every segment that is
//! not an EXIF APP1 segment, and everything from the first SOS marker on, is
//! copied byte for byte. Only the EXIF segment itself is regenerated.
//!
//! # Placement
//!
//! - Updating replaces the first EXIF segment in place; any further EXIF
//!   segments are dropped.
//! - Without an existing EXIF segment, the new one goes after the run of APP0
//!   (JFIF/JFXX) segments that directly follows SOI, or right after SOI.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::ExifError;
use crate::tiff::{ImageMetadata, OutputSet, TagRegistry, TiffLayout};

use super::segments::{
    build_exif_segment, split_segments, JpegStructure, EXIF_IDENTIFIER, MAX_SEGMENT_PAYLOAD,
};

/// Parse the EXIF metadata of a JPEG.
///
/// Returns `Ok(None)` when the image has no EXIF segment. When several are
/// present the first one is used.
pub fn read_metadata(
    jpeg: &[u8],
    registry: &TagRegistry,
) -> Result<Option<ImageMetadata>, ExifError> {
    let structure = split_segments(jpeg)?;
    let metadata = structure
        .exif_segments()
        .next()
        .map(|segment| ImageMetadata::from_app1_payload(segment.payload(), registry))
        .transpose();
    metadata
}

/// Rewrites the EXIF segment of JPEG byte streams.
#[derive(Debug, Clone, Copy)]
pub struct ExifRewriter<'a> {
    registry: &'a TagRegistry,
}

impl ExifRewriter<'static> {
    /// Rewriter backed by the process-wide tag registry.
    pub fn new() -> Self {
        ExifRewriter {
            registry: TagRegistry::global(),
        }
    }
}

impl Default for ExifRewriter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ExifRewriter<'a> {
    pub fn with_registry(registry: &'a TagRegistry) -> Self {
        ExifRewriter { registry }
    }

    pub fn registry(&self) -> &'a TagRegistry {
        self.registry
    }

    /// Parse the EXIF metadata of `jpeg`, if it has any.
    pub fn read_metadata(&self, jpeg: &[u8]) -> Result<Option<ImageMetadata>, ExifError> {
        read_metadata(jpeg, self.registry)
    }

    /// Copy `jpeg` without any EXIF segment.
    ///
    /// An image without EXIF is returned unchanged.
    pub fn remove_exif_metadata(&self, jpeg: &[u8]) -> Result<Bytes, ExifError> {
        let structure = split_segments(jpeg)?;
        let removed = structure.exif_segments().count();
        debug!(removed, "Stripping EXIF segments");
        Ok(assemble(&structure, None, jpeg.len()))
    }

    /// Write `set` into `jpeg`, leaving every other byte untouched.
    ///
    /// An empty `set` only replaces an existing EXIF segment; without one the
    /// input is returned as is.
    ///
    /// # Errors
    /// - `UnsupportedFormat` if `jpeg` is not a JPEG stream
    /// - `SegmentTooLarge` if the serialized block does not fit one segment;
    ///   nothing is written in that case
    pub fn update_exif_metadata_lossless(
        &self,
        jpeg: &[u8],
        set: &OutputSet,
    ) -> Result<Bytes, ExifError> {
        let structure = split_segments(jpeg)?;
        if set.is_empty() && structure.exif_segments().next().is_none() {
            debug!("Empty output set and no EXIF segment, leaving input unchanged");
            return Ok(Bytes::copy_from_slice(jpeg));
        }

        let layout = TiffLayout::plan(set)?;
        let payload_len = EXIF_IDENTIFIER.len() + layout.total_size();
        if payload_len > MAX_SEGMENT_PAYLOAD {
            return Err(ExifError::SegmentTooLarge {
                size: payload_len,
                limit: MAX_SEGMENT_PAYLOAD,
            });
        }
        let segment = build_exif_segment(&layout.emit())?;

        debug!(
            segment_size = segment.len(),
            existing = structure.exif_segments().count(),
            "Writing EXIF segment"
        );
        Ok(assemble(&structure, Some(&segment), jpeg.len()))
    }

    /// Read the existing metadata, let `edit` modify it, and write it back.
    ///
    /// # Errors
    /// `MissingExif` if `jpeg` has no EXIF segment, or whatever `edit` or
    /// the rewrite returns.
    pub fn update_exif_metadata_with<F>(&self, jpeg: &[u8], edit: F) -> Result<Bytes, ExifError>
    where
        F: FnOnce(&mut OutputSet) -> Result<(), ExifError>,
    {
        let metadata = self.read_metadata(jpeg)?.ok_or(ExifError::MissingExif)?;
        let mut set = metadata.to_output_set();
        edit(&mut set)?;
        self.update_exif_metadata_lossless(jpeg, &set)
    }
}

/// Join the input back together, swapping in `replacement` for the EXIF
/// segment (or dropping EXIF segments when there is none).
fn assemble(structure: &JpegStructure<'_>, replacement: Option<&[u8]>, size_hint: usize) -> Bytes {
    let mut out = BytesMut::with_capacity(size_hint + replacement.map_or(0, <[u8]>::len));
    out.put_slice(structure.soi);

    let insert_at = match structure.exif_segments().next() {
        Some(_) => None,
        None => Some(structure.leading_app0_count()),
    };
    let mut pending = replacement;

    for (index, segment) in structure.segments.iter().enumerate() {
        if insert_at == Some(index) {
            if let Some(new_segment) = pending.take() {
                out.put_slice(new_segment);
            }
        }
        if segment.is_exif() {
            if let Some(new_segment) = pending.take() {
                out.put_slice(new_segment);
            }
            continue;
        }
        out.put_slice(segment.bytes);
    }
    if let Some(new_segment) = pending {
        out.put_slice(new_segment);
    }

    out.put_slice(structure.remainder);
    out.freeze()
}

// =============================================================================
// Tests
// =============================================================================
