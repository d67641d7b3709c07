//! Command line configuration for the `exif-rewriter` binary.
//!
//! Arguments are parsed with clap. Options that make sense across runs can
//! also be set through environment variables with the `EXIF_REWRITER_` prefix:
//!
//! - `EXIF_REWRITER_VERBOSE` - Enable debug logging
//! - `EXIF_REWRITER_BYTE_ORDER` - Byte order for `copy` (`le` or `be`)
//!
//! Log filtering follows `RUST_LOG` when it is set.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::rational::RationalNumber;
use crate::tiff::{ByteOrder, DirectoryRole, FieldType, TagInfo, TagRegistry, Value};

// =============================================================================
// CLI Structure
// =============================================================================

/// exif-rewriter - Read, edit and strip EXIF metadata in JPEG files.
///
/// Every command except `dump` writes a new file; the image data of the
/// input is copied byte for byte.
#[derive(Parser, Debug, Clone)]
#[command(name = "exif-rewriter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true, env = "EXIF_REWRITER_VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print every EXIF field of a JPEG file
    Dump(DumpConfig),

    /// Remove all EXIF metadata
    Strip(IoPaths),

    /// Rewrite the existing metadata, optionally changing its byte order
    Copy(CopyConfig),

    /// Set one tag
    Set(SetConfig),

    /// Remove one tag from every directory
    Remove(RemoveConfig),

    /// Set the GPS position
    Gps(GpsConfig),
}

/// Input and output file paths.
#[derive(Args, Debug, Clone)]
pub struct IoPaths {
    /// Source JPEG file
    pub input: PathBuf,

    /// Destination JPEG file
    pub output: PathBuf,
}

impl IoPaths {
    pub fn validate(&self) -> Result<(), String> {
        if self.input == self.output {
            return Err("Input and output must be different files".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Command Configurations
// =============================================================================

/// Configuration for the `dump` command.
#[derive(Args, Debug, Clone)]
pub struct DumpConfig {
    /// JPEG file to inspect
    pub input: PathBuf,

    /// Print a JSON report instead of text
    #[arg(long)]
    pub json: bool,
}

/// Byte order choices on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrderArg {
    /// Little-endian ("II")
    Le,
    /// Big-endian ("MM")
    Be,
}

impl From<ByteOrderArg> for ByteOrder {
    fn from(arg: ByteOrderArg) -> Self {
        match arg {
            ByteOrderArg::Le => ByteOrder::LittleEndian,
            ByteOrderArg::Be => ByteOrder::BigEndian,
        }
    }
}

/// Configuration for the `copy` command.
#[derive(Args, Debug, Clone)]
pub struct CopyConfig {
    #[command(flatten)]
    pub paths: IoPaths,

    /// Byte order of the written block (default: keep the original)
    #[arg(long, value_enum, env = "EXIF_REWRITER_BYTE_ORDER")]
    pub byte_order: Option<ByteOrderArg>,
}

/// Directory choices on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryArg {
    Root,
    Exif,
    Gps,
    Interop,
    Thumbnail,
}

impl From<DirectoryArg> for DirectoryRole {
    fn from(arg: DirectoryArg) -> Self {
        match arg {
            DirectoryArg::Root => DirectoryRole::Root,
            DirectoryArg::Exif => DirectoryRole::Exif,
            DirectoryArg::Gps => DirectoryRole::Gps,
            DirectoryArg::Interop => DirectoryRole::Interop,
            DirectoryArg::Thumbnail => DirectoryRole::Thumbnail,
        }
    }
}

/// Configuration for the `set` command.
#[derive(Args, Debug, Clone)]
pub struct SetConfig {
    #[command(flatten)]
    pub paths: IoPaths,

    /// Tag name (e.g. `Artist`) or number (e.g. `0x013B`)
    #[arg(long)]
    pub tag: String,

    /// New value. Numbers may be comma separated; rationals are written `n/d`.
    #[arg(long, allow_hyphen_values = true)]
    pub value: String,

    /// Directory to write to (default: the tag's own directory)
    #[arg(long, value_enum)]
    pub directory: Option<DirectoryArg>,
}

impl SetConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.paths.validate()?;
        if self.value.is_empty() {
            return Err("--value must not be empty".to_string());
        }
        Ok(())
    }

    /// Directory the field goes into.
    pub fn target_directory(&self, info: &TagInfo) -> DirectoryRole {
        self.directory
            .map(DirectoryRole::from)
            .or(info.role)
            .unwrap_or(DirectoryRole::Root)
    }

    /// Interpret `--value` according to the field types the tag accepts.
    ///
    /// Text tags take the value verbatim. Otherwise a value containing `/`
    /// is read as rationals, a value with a decimal point as doubles, and
    /// anything else as integers. Values for unknown tags that are not
    /// numbers are kept as text.
    pub fn parse_value(&self, info: &TagInfo) -> Result<Value, String> {
        let textual = info.accepts(FieldType::Ascii) || info.accepts(FieldType::Undefined);
        if textual && !info.is_unknown() {
            return Ok(Value::Text(self.value.clone()));
        }

        match self.parse_numbers() {
            Err(_) if info.is_unknown() => Ok(Value::Text(self.value.clone())),
            result => result,
        }
    }

    fn parse_numbers(&self) -> Result<Value, String> {
        let parts: Vec<&str> = self.value.split(',').map(str::trim).collect();

        if self.value.contains('/') {
            let rationals = parts
                .iter()
                .map(|part| parse_rational(part))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::Rationals(rationals));
        }

        if self.value.contains('.') {
            let doubles = parts
                .iter()
                .map(|part| {
                    part.parse::<f64>()
                        .map_err(|_| format!("'{part}' is not a number"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::Doubles(doubles));
        }

        let integers = parts
            .iter()
            .map(|part| {
                part.parse::<i64>()
                    .map_err(|_| format!("'{part}' is not an integer"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Integers(integers))
    }
}

fn parse_rational(text: &str) -> Result<RationalNumber, String> {
    let (numerator, denominator) = text
        .split_once('/')
        .ok_or_else(|| format!("'{text}' is not a rational (expected n/d)"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| format!("'{text}' is not a rational (expected n/d)"))
    };
    Ok(RationalNumber::new(parse(numerator)?, parse(denominator)?))
}

/// Configuration for the `remove` command.
#[derive(Args, Debug, Clone)]
pub struct RemoveConfig {
    #[command(flatten)]
    pub paths: IoPaths,

    /// Tag name or number
    #[arg(long)]
    pub tag: String,
}

/// Configuration for the `gps` command.
#[derive(Args, Debug, Clone)]
pub struct GpsConfig {
    #[command(flatten)]
    pub paths: IoPaths,

    /// Latitude in decimal degrees (negative is south)
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: f64,

    /// Longitude in decimal degrees (negative is west)
    #[arg(long, allow_hyphen_values = true)]
    pub longitude: f64,
}

impl GpsConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.paths.validate()?;
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!(
                "latitude must be between -90 and 90, got {}",
                self.latitude
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!(
                "longitude must be between -180 and 180, got {}",
                self.longitude
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Tag resolution
// =============================================================================

/// Resolve a tag given by name or by number (`0x`-prefixed hex or decimal).
///
/// Numbers are looked up in `role`, so numbers shared between directories
/// resolve to the right tag.
pub fn resolve_tag(
    registry: &TagRegistry,
    role: Option<DirectoryRole>,
    text: &str,
) -> Result<TagInfo, String> {
    let number = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => {
            Some(u16::from_str_radix(hex, 16).map_err(|_| format!("invalid tag '{text}'"))?)
        }
        None => text.parse::<u16>().ok(),
    };

    match number {
        Some(number) => Ok(registry.lookup(role.unwrap_or(DirectoryRole::Unknown), number)),
        None => registry
            .lookup_by_name(text)
            .ok_or_else(|| format!("unknown tag '{text}'")),
    }
}

// =============================================================================
// Tests
// =============================================================================
