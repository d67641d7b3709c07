//! Serializable summary of parsed metadata, used by `dump`.

use serde::Serialize;

use crate::tiff::{ByteOrder, ImageMetadata, TiffDirectory, TiffField};

/// Report for one image.
#[derive(Debug, Clone, Serialize)]
pub struct DumpReport {
    /// "II" or "MM"
    pub byte_order: &'static str,

    pub directories: Vec<DirectoryReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_size: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsReport>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryReport {
    pub name: &'static str,
    pub offset: u32,
    pub fields: Vec<FieldReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub tag: u16,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: &'static str,
    pub count: u32,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GpsReport {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&TiffField> for FieldReport {
    fn from(field: &TiffField) -> Self {
        FieldReport {
            tag: field.tag,
            name: field.tag_name(),
            field_type: field.field_type.name(),
            count: field.count,
            value: field.value_description(),
        }
    }
}

impl From<&TiffDirectory> for DirectoryReport {
    fn from(directory: &TiffDirectory) -> Self {
        DirectoryReport {
            name: directory.role().name(),
            offset: directory.offset(),
            fields: directory.fields().iter().map(FieldReport::from).collect(),
        }
    }
}

impl DumpReport {
    pub fn new(metadata: &ImageMetadata) -> Self {
        let byte_order = match metadata.byte_order() {
            ByteOrder::LittleEndian => "II",
            ByteOrder::BigEndian => "MM",
        };
        DumpReport {
            byte_order,
            directories: metadata
                .directories()
                .iter()
                .map(DirectoryReport::from)
                .collect(),
            thumbnail_size: metadata.thumbnail().map(|t| t.len()),
            gps: metadata.gps().map(|gps| GpsReport {
                latitude: gps.latitude,
                longitude: gps.longitude,
            }),
            warnings: metadata.warnings().iter().map(ToString::to_string).collect(),
        }
    }

    /// Plain text rendering, one field per line grouped by directory.
    pub fn to_text(&self) -> String {
        let mut out = format!("Byte order: {}\n", self.byte_order);
        for directory in &self.directories {
            out.push_str(&format!(
                "\n[{}] at offset {}, {} field(s)\n",
                directory.name,
                directory.offset,
                directory.fields.len()
            ));
            for field in &directory.fields {
                out.push_str(&format!(
                    "  0x{:04X} {:<28} {:<9} {}\n",
                    field.tag, field.name, field.field_type, field.value
                ));
            }
        }
        if let Some(size) = self.thumbnail_size {
            out.push_str(&format!("\nThumbnail: {size} bytes\n"));
        }
        if let Some(gps) = self.gps {
            out.push_str(&format!(
                "GPS: {:.6}, {:.6}\n",
                gps.latitude, gps.longitude
            ));
        }
        for warning in &self.warnings {
            out.push_str(&format!("warning: {warning}\n"));
        }
        out
    }
}
