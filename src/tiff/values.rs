//! Typed TIFF field values.
//!
//! [`FieldValue`] has one variant per TIFF field type, so a value and its
//! encoding can never disagree. Values decode from, and encode to, the
//! fixed-width element layout of the field type in a given byte order.

use crate::error::TiffError;
use crate::rational::RationalNumber;

use super::parser::ByteOrder;
use super::tags::FieldType;

/// Byte arrays longer than this are abbreviated by [`FieldValue::describe`].
const MAX_DESCRIBED_BYTES: usize = 32;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Byte(Vec<u8>),
    /// Raw ASCII bytes, including any NUL terminators
    Ascii(Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<RationalNumber>),
    SByte(Vec<i8>),
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<RationalNumber>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl FieldValue {
    /// ASCII value from text, NUL-terminated as TIFF requires.
    pub fn ascii(text: &str) -> Self {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        FieldValue::Ascii(bytes)
    }

    /// The TIFF type this value encodes as.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Byte(_) => FieldType::Byte,
            FieldValue::Ascii(_) => FieldType::Ascii,
            FieldValue::Short(_) => FieldType::Short,
            FieldValue::Long(_) => FieldType::Long,
            FieldValue::Rational(_) => FieldType::Rational,
            FieldValue::SByte(_) => FieldType::SByte,
            FieldValue::Undefined(_) => FieldType::Undefined,
            FieldValue::SShort(_) => FieldType::SShort,
            FieldValue::SLong(_) => FieldType::SLong,
            FieldValue::SRational(_) => FieldType::SRational,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Double(_) => FieldType::Double,
        }
    }

    /// Number of elements (the TIFF "count").
    pub fn count(&self) -> usize {
        match self {
            FieldValue::Byte(v) | FieldValue::Ascii(v) | FieldValue::Undefined(v) => v.len(),
            FieldValue::Short(v) => v.len(),
            FieldValue::Long(v) => v.len(),
            FieldValue::Rational(v) | FieldValue::SRational(v) => v.len(),
            FieldValue::SByte(v) => v.len(),
            FieldValue::SShort(v) => v.len(),
            FieldValue::SLong(v) => v.len(),
            FieldValue::Float(v) => v.len(),
            FieldValue::Double(v) => v.len(),
        }
    }

    /// Decode `count` elements of `field_type` from `bytes`.
    ///
    /// # Errors
    /// `Truncated` if `bytes` is shorter than `count` elements.
    pub fn decode(
        field_type: FieldType,
        count: usize,
        bytes: &[u8],
        byte_order: ByteOrder,
    ) -> Result<Self, TiffError> {
        let size = field_type.size_in_bytes();
        let required = size * count;
        if bytes.len() < required {
            return Err(TiffError::Truncated {
                required,
                actual: bytes.len(),
            });
        }
        let elements = bytes[..required].chunks_exact(size);

        let value = match field_type {
            FieldType::Byte => FieldValue::Byte(bytes[..required].to_vec()),
            FieldType::Ascii => FieldValue::Ascii(bytes[..required].to_vec()),
            FieldType::Undefined => FieldValue::Undefined(bytes[..required].to_vec()),
            FieldType::SByte => {
                FieldValue::SByte(bytes[..required].iter().map(|&b| b as i8).collect())
            }
            FieldType::Short => {
                FieldValue::Short(elements.map(|e| byte_order.read_u16(e)).collect())
            }
            FieldType::SShort => {
                FieldValue::SShort(elements.map(|e| byte_order.read_u16(e) as i16).collect())
            }
            FieldType::Long => FieldValue::Long(elements.map(|e| byte_order.read_u32(e)).collect()),
            FieldType::SLong => {
                FieldValue::SLong(elements.map(|e| byte_order.read_u32(e) as i32).collect())
            }
            FieldType::Rational => FieldValue::Rational(
                elements
                    .map(|e| (byte_order.read_u32(e), byte_order.read_u32(&e[4..])).into())
                    .collect(),
            ),
            FieldType::SRational => FieldValue::SRational(
                elements
                    .map(|e| {
                        (
                            byte_order.read_u32(e) as i32,
                            byte_order.read_u32(&e[4..]) as i32,
                        )
                            .into()
                    })
                    .collect(),
            ),
            FieldType::Float => FieldValue::Float(
                elements
                    .map(|e| f32::from_bits(byte_order.read_u32(e)))
                    .collect(),
            ),
            FieldType::Double => FieldValue::Double(
                elements
                    .map(|e| f64::from_bits(byte_order.read_u64(e)))
                    .collect(),
            ),
        };
        Ok(value)
    }

    /// Encode to fixed-width elements in `byte_order`.
    ///
    /// Rational parts are truncated to 32 bits; callers that build values
    /// from wider integers check the range first.
    pub fn encode(&self, byte_order: ByteOrder) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.count() * self.field_type().size_in_bytes());
        match self {
            FieldValue::Byte(v) | FieldValue::Ascii(v) | FieldValue::Undefined(v) => {
                out.extend_from_slice(v)
            }
            FieldValue::SByte(v) => out.extend(v.iter().map(|&b| b as u8)),
            FieldValue::Short(v) => {
                for &x in v {
                    out.extend_from_slice(&byte_order.u16_bytes(x));
                }
            }
            FieldValue::SShort(v) => {
                for &x in v {
                    out.extend_from_slice(&byte_order.u16_bytes(x as u16));
                }
            }
            FieldValue::Long(v) => {
                for &x in v {
                    out.extend_from_slice(&byte_order.u32_bytes(x));
                }
            }
            FieldValue::SLong(v) => {
                for &x in v {
                    out.extend_from_slice(&byte_order.u32_bytes(x as u32));
                }
            }
            FieldValue::Rational(v) | FieldValue::SRational(v) => {
                for r in v {
                    out.extend_from_slice(&byte_order.u32_bytes(r.numerator as u32));
                    out.extend_from_slice(&byte_order.u32_bytes(r.denominator as u32));
                }
            }
            FieldValue::Float(v) => {
                for &x in v {
                    out.extend_from_slice(&byte_order.u32_bytes(x.to_bits()));
                }
            }
            FieldValue::Double(v) => {
                for &x in v {
                    out.extend_from_slice(&byte_order.u64_bytes(x.to_bits()));
                }
            }
        }
        out
    }

    /// Text content of an ASCII value, up to the first NUL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Ascii(bytes) => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
            _ => None,
        }
    }

    /// Rational elements of a RATIONAL or SRATIONAL value.
    pub fn as_rationals(&self) -> Option<&[RationalNumber]> {
        match self {
            FieldValue::Rational(v) | FieldValue::SRational(v) => Some(v),
            _ => None,
        }
    }

    /// Integer elements widened to i64, for any integer type.
    pub fn as_integers(&self) -> Option<Vec<i64>> {
        match self {
            FieldValue::Byte(v) => Some(v.iter().map(|&x| x as i64).collect()),
            FieldValue::Short(v) => Some(v.iter().map(|&x| x as i64).collect()),
            FieldValue::Long(v) => Some(v.iter().map(|&x| x as i64).collect()),
            FieldValue::SByte(v) => Some(v.iter().map(|&x| x as i64).collect()),
            FieldValue::SShort(v) => Some(v.iter().map(|&x| x as i64).collect()),
            FieldValue::SLong(v) => Some(v.iter().map(|&x| x as i64).collect()),
            _ => None,
        }
    }

    /// Human-readable rendering of the value.
    pub fn describe(&self) -> String {
        fn list<T: ToString>(values: &[T]) -> String {
            match values {
                [single] => single.to_string(),
                _ => format!(
                    "[{}]",
                    values
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }
        }

        match self {
            FieldValue::Ascii(_) => format!("'{}'", self.as_text().unwrap_or_default()),
            FieldValue::Undefined(bytes) if bytes.len() > MAX_DESCRIBED_BYTES => {
                format!("{} bytes of data", bytes.len())
            }
            FieldValue::Undefined(bytes) => format!("0x{}", hex::encode(bytes)),
            FieldValue::Byte(v) if v.len() > MAX_DESCRIBED_BYTES => {
                format!("{} bytes of data", v.len())
            }
            FieldValue::Byte(v) => list(v),
            FieldValue::Short(v) => list(v),
            FieldValue::Long(v) => list(v),
            FieldValue::Rational(v) | FieldValue::SRational(v) => list(v),
            FieldValue::SByte(v) => list(v),
            FieldValue::SShort(v) => list(v),
            FieldValue::SLong(v) => list(v),
            FieldValue::Float(v) => list(v),
            FieldValue::Double(v) => list(v),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
