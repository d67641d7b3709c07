//! # exif-rewriter
//!
//! Read, edit and losslessly rewrite the EXIF metadata of JPEG images.
//!
//! EXIF metadata is a small TIFF structure stored in a JPEG APP1 segment.
//! This library parses that structure into typed directories, lets you build
//! a modified copy, and writes it back into the JPEG without touching a
//! single byte outside the metadata segment.
//!
//! ## Architecture
//!
//! - [`rational`] - exact fractions used by RATIONAL fields
//! - [`tiff`] - tag registry, field values, the read model
//!   ([`ImageMetadata`]) and the write model ([`OutputSet`]) with its
//!   two-pass serializer
//! - [`jpeg`] - segment splitting and the [`ExifRewriter`]
//! - [`report`] - serializable dump of parsed metadata
//! - [`config`] - CLI types for the `exif-rewriter` binary
//!
//! ## Example
//!
//! ```rust,no_run
//! use exif_rewriter::{tag, DirectoryRole, ExifRewriter, OutputField};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let jpeg = std::fs::read("photo.jpg")?;
//! let rewriter = ExifRewriter::new();
//!
//! let updated = rewriter.update_exif_metadata_with(&jpeg, |set| {
//!     set.remove_field(tag::APERTURE_VALUE);
//!     let info = rewriter
//!         .registry()
//!         .lookup(DirectoryRole::Exif, tag::APERTURE_VALUE);
//!     let aperture = OutputField::create(&info, set.byte_order(), 0.3)?;
//!     set.get_or_create_exif_directory().add(aperture);
//!     Ok(())
//! })?;
//!
//! std::fs::write("photo-edited.jpg", &updated)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod jpeg;
pub mod rational;
pub mod report;
pub mod tiff;

// Re-export commonly used types
pub use error::{ExifError, TiffError};
pub use jpeg::{read_metadata, ExifRewriter};
pub use rational::RationalNumber;
pub use report::DumpReport;
pub use tiff::{
    tag, write_tiff_block, ByteOrder, DirectoryRole, FieldType, FieldValue, FieldWarning,
    GpsCoordinates, ImageMetadata, OutputDirectory, OutputField, OutputSet, TagInfo, TagRegistry,
    TiffDirectory, TiffField, Value,
};
