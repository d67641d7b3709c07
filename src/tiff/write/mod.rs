//! Write model and serializer.
//!
//! Build or derive an [`OutputSet`], edit it, then serialize it with
//! [`write_tiff_block`] (or through the JPEG rewriter).

mod layout;
mod output;

pub use layout::{write_tiff_block, TiffLayout};
pub use output::{OutputDirectory, OutputField, OutputSet, Value};
