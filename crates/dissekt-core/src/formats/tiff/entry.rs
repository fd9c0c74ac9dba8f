//! IFD entries and their value payloads.

use crate::cursor::Endian;

/// Size of one IFD entry
pub(super) const ENTRY_LEN: usize = 12;

/// TIFF field types (TIFF 6.0, section 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FieldType {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,
}

impl FieldType {
    pub(super) fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            1 => FieldType::Byte,
            2 => FieldType::Ascii,
            3 => FieldType::Short,
            4 => FieldType::Long,
            5 => FieldType::Rational,
            6 => FieldType::SByte,
            7 => FieldType::Undefined,
            8 => FieldType::SShort,
            9 => FieldType::SLong,
            10 => FieldType::SRational,
            11 => FieldType::Float,
            12 => FieldType::Double,
            _ => return None,
        })
    }

    /// Size of one value in bytes
    pub(super) fn size(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
        }
    }

    pub(super) fn name(self) -> &'static str {
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

/// One 12-byte directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct IfdEntry {
    /// File offset of the entry itself
    pub(super) offset: usize,
    pub(super) tag: u16,
    pub(super) raw_type: u16,
    pub(super) field_type: Option<FieldType>,
    pub(super) count: u32,
    /// The value when it fits in four bytes, its offset otherwise
    pub(super) value: [u8; 4],
}

impl IfdEntry {
    pub(super) fn parse(offset: usize, bytes: [u8; ENTRY_LEN], endian: Endian) -> Self {
        let raw_type = endian.u16([bytes[2], bytes[3]]);
        Self {
            offset,
            tag: endian.u16([bytes[0], bytes[1]]),
            raw_type,
            field_type: FieldType::from_u16(raw_type),
            count: endian.u32([bytes[4], bytes[5], bytes[6], bytes[7]]),
            value: [bytes[8], bytes[9], bytes[10], bytes[11]],
        }
    }

    /// Payload size in bytes, `None` for unknown types or overflow
    pub(super) fn payload_len(&self) -> Option<usize> {
        self.field_type?.size().checked_mul(self.count as usize)
    }

    pub(super) fn is_inline(&self) -> bool {
        self.payload_len().is_some_and(|len| len <= 4)
    }

    pub(super) fn value_offset(&self, endian: Endian) -> u32 {
        endian.u32(self.value)
    }

    /// Human-readable type, falling back to the raw number
    pub(super) fn type_name(&self) -> String {
        match self.field_type {
            Some(field_type) => field_type.name().to_string(),
            None => format!("type {}", self.raw_type),
        }
    }
}

/// Decoded payload values
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Values {
    Unsigned(Vec<u64>),
    Signed(Vec<i64>),
    Rational(Vec<(u32, u32)>),
    SRational(Vec<(i32, i32)>),
    Float(Vec<f64>),
    Bytes(Vec<u8>),
}

impl Values {
    /// Decodes `bytes` as `count` values of `field_type`
    pub(super) fn decode(bytes: &[u8], field_type: FieldType, endian: Endian) -> Self {
        match field_type {
            FieldType::Byte => Values::Unsigned(bytes.iter().map(|&b| u64::from(b)).collect()),
            FieldType::Ascii | FieldType::Undefined => Values::Bytes(bytes.to_vec()),
            FieldType::SByte => Values::Signed(bytes.iter().map(|&b| i64::from(b as i8)).collect()),
            FieldType::Short => Values::Unsigned(
                bytes
                    .chunks_exact(2)
                    .map(|c| u64::from(endian.u16_at(c, 0)))
                    .collect(),
            ),
            FieldType::SShort => Values::Signed(
                bytes
                    .chunks_exact(2)
                    .map(|c| i64::from(endian.u16_at(c, 0) as i16))
                    .collect(),
            ),
            FieldType::Long => Values::Unsigned(
                bytes
                    .chunks_exact(4)
                    .map(|c| u64::from(endian.u32_at(c, 0)))
                    .collect(),
            ),
            FieldType::SLong => Values::Signed(
                bytes
                    .chunks_exact(4)
                    .map(|c| i64::from(endian.u32_at(c, 0) as i32))
                    .collect(),
            ),
            FieldType::Rational => Values::Rational(
                bytes
                    .chunks_exact(8)
                    .map(|c| (endian.u32_at(c, 0), endian.u32_at(c, 4)))
                    .collect(),
            ),
            FieldType::SRational => Values::SRational(
                bytes
                    .chunks_exact(8)
                    .map(|c| (endian.u32_at(c, 0) as i32, endian.u32_at(c, 4) as i32))
                    .collect(),
            ),
            FieldType::Float => Values::Float(
                bytes
                    .chunks_exact(4)
                    .map(|c| f64::from(f32::from_bits(endian.u32_at(c, 0))))
                    .collect(),
            ),
            FieldType::Double => Values::Float(
                bytes
                    .chunks_exact(8)
                    .map(|c| {
                        let (hi, lo) = match endian {
                            Endian::Little => (endian.u32_at(c, 4), endian.u32_at(c, 0)),
                            Endian::Big => (endian.u32_at(c, 0), endian.u32_at(c, 4)),
                        };
                        f64::from_bits(u64::from(hi) << 32 | u64::from(lo))
                    })
                    .collect(),
            ),
        }
    }

    /// Unsigned integer values; signed and fractional types yield nothing
    pub(super) fn unsigned(&self) -> &[u64] {
        match self {
            Values::Unsigned(values) => values,
            _ => &[],
        }
    }

    /// Every value as a float, for the rational-based formatters
    pub(super) fn as_f64(&self) -> Vec<Option<f64>> {
        match self {
            Values::Unsigned(v) => v.iter().map(|&x| Some(x as f64)).collect(),
            Values::Signed(v) => v.iter().map(|&x| Some(x as f64)).collect(),
            Values::Rational(v) => v
                .iter()
                .map(|&(n, d)| (d != 0).then(|| f64::from(n) / f64::from(d)))
                .collect(),
            Values::SRational(v) => v
                .iter()
                .map(|&(n, d)| (d != 0).then(|| f64::from(n) / f64::from(d)))
                .collect(),
            Values::Float(v) => v.iter().map(|&x| Some(x)).collect(),
            Values::Bytes(v) => v.iter().map(|&x| Some(f64::from(x))).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_entry() {
        let bytes = [0x00, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00];
        let entry = IfdEntry::parse(10, bytes, Endian::Little);
        assert_eq!(entry.tag, 0x0100);
        assert_eq!(entry.field_type, Some(FieldType::Short));
        assert_eq!(entry.count, 1);
        assert_eq!(entry.payload_len(), Some(2));
        assert!(entry.is_inline());
    }

    #[test]
    fn test_payload_len_overflow_and_unknown_type() {
        let mut bytes = [0u8; ENTRY_LEN];
        bytes[1] = 5;
        bytes[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
        let entry = IfdEntry::parse(0, bytes, Endian::Big);
        assert_eq!(entry.field_type, Some(FieldType::Rational));
        assert!(!entry.is_inline());

        bytes[1] = 99;
        let unknown = IfdEntry::parse(0, bytes, Endian::Big);
        assert_eq!(unknown.payload_len(), None);
        assert_eq!(unknown.type_name(), "type 99");
    }

    #[test]
    fn test_decode_values() {
        assert_eq!(
            Values::decode(&[1, 0, 2, 0], FieldType::Short, Endian::Little),
            Values::Unsigned(vec![1, 2])
        );
        assert_eq!(
            Values::decode(&[0xFF, 0xFE], FieldType::SShort, Endian::Big),
            Values::Signed(vec![-2])
        );
        assert_eq!(
            Values::decode(&[0, 0, 0, 1, 0, 0, 0, 3], FieldType::Rational, Endian::Big),
            Values::Rational(vec![(1, 3)])
        );
        let double = 1.5f64.to_le_bytes();
        assert_eq!(
            Values::decode(&double, FieldType::Double, Endian::Little),
            Values::Float(vec![1.5])
        );
    }
}
