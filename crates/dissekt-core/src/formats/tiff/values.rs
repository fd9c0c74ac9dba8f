//! Rendering of tag values for the description tabs.

use super::entry::Values;
use super::tags::Kind;
use crate::cursor::{latin1, Endian};
use crate::formats::lookup;

/// Longest array rendered element by element
const MAX_LISTED: usize = 16;

/// A rendered value and whether it is legal for its tag
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Rendered {
    pub(super) text: String,
    pub(super) valid: bool,
}

impl Rendered {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            valid: true,
        }
    }

    fn invalid(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            valid: false,
        }
    }
}

/// Formats a float with at most four decimals, trailing zeros removed
pub(super) fn decimal(value: f64) -> String {
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "undefined".to_string(), decimal)
}

/// Default rendering for any value list
pub(super) fn plain(values: &Values) -> String {
    let rendered: Vec<String> = match values {
        Values::Rational(v) => v
            .iter()
            .map(|&(n, d)| match d {
                0 => format!("{n}/0"),
                1 => n.to_string(),
                _ if n % d == 0 => (n / d).to_string(),
                _ => format!("{n}/{d} ({})", decimal(f64::from(n) / f64::from(d))),
            })
            .collect(),
        Values::SRational(v) => v
            .iter()
            .map(|&(n, d)| match d {
                0 => format!("{n}/0"),
                1 => n.to_string(),
                _ => format!("{n}/{d} ({})", decimal(f64::from(n) / f64::from(d))),
            })
            .collect(),
        Values::Bytes(v) => v.iter().map(|b| format!("{b:02x}")).collect(),
        other => other.as_f64().into_iter().map(number).collect(),
    };
    if rendered.len() > MAX_LISTED {
        format!("{}, ... ({} values)", rendered[..MAX_LISTED].join(", "), rendered.len())
    } else {
        rendered.join(", ")
    }
}

/// Text from an ASCII payload, up to the first NUL
///
/// Anything but printable text renders as an empty string.
pub(super) fn ascii(bytes: &[u8]) -> Rendered {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = &bytes[..end];
    let legal = text
        .iter()
        .all(|&b| b.is_ascii_graphic() || matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
    match std::str::from_utf8(text) {
        Ok(text) if legal => Rendered::ok(text),
        _ => Rendered::invalid(""),
    }
}

fn single(values: &Values) -> Option<u64> {
    match values.unsigned() {
        [value] => Some(*value),
        _ => None,
    }
}

fn flash(value: u64) -> String {
    let mut parts = vec![if value & 0x01 != 0 { "Fired" } else { "Did not fire" }];
    match (value >> 1) & 0x03 {
        2 => parts.push("return light not detected"),
        3 => parts.push("return light detected"),
        _ => {}
    }
    match (value >> 3) & 0x03 {
        1 => parts.push("compulsory firing"),
        2 => parts.push("compulsory suppression"),
        3 => parts.push("auto mode"),
        _ => {}
    }
    if value & 0x20 != 0 {
        parts.push("no flash function");
    }
    if value & 0x40 != 0 {
        parts.push("red-eye reduction");
    }
    parts.join(", ")
}

fn user_comment(bytes: &[u8], endian: Endian) -> Rendered {
    if bytes.len() < 8 {
        return Rendered::invalid("");
    }
    let (code, text) = bytes.split_at(8);
    let trim = |s: String| s.trim_end_matches(&['\0', ' '][..]).to_string();
    match code {
        b"ASCII\0\0\0" => Rendered::ok(trim(latin1(text))),
        b"UNICODE\0" => {
            let units: Vec<u16> = text.chunks_exact(2).map(|c| endian.u16_at(c, 0)).collect();
            Rendered::ok(trim(String::from_utf16_lossy(&units)))
        }
        b"JIS\0\0\0\0\0" => Rendered::ok(format!("JIS encoded text, {} bytes", text.len())),
        [0, 0, 0, 0, 0, 0, 0, 0] => Rendered::ok(trim(latin1(text))),
        _ => Rendered::invalid(format!("Unknown character code, {} bytes", text.len())),
    }
}

/// Renders a value according to its tag
///
/// The strip, JPEG and sub-IFD kinds are rendered plainly here; their side
/// effects are the walker's business.
pub(super) fn render(kind: Kind, values: &Values, bytes: &[u8], endian: Endian) -> Rendered {
    let floats = || values.as_f64();
    match kind {
        Kind::Plain
        | Kind::StripOffsets
        | Kind::StripByteCounts
        | Kind::JpegOffset
        | Kind::JpegLength
        | Kind::SubIfd(_) => Rendered::ok(plain(values)),
        Kind::Ascii => ascii(bytes),
        Kind::Enum(table) => {
            let mut valid = true;
            let rendered: Vec<String> = values
                .unsigned()
                .iter()
                .map(|&v| match u32::try_from(v).ok().and_then(|v| lookup(v, table)) {
                    Some(name) => name.to_string(),
                    None => {
                        valid = false;
                        format!("Unknown ({v})")
                    }
                })
                .collect();
            Rendered {
                text: rendered.join(", "),
                valid,
            }
        }
        Kind::PageNumber => match values.unsigned() {
            [page, 0] => Rendered::ok(format!("Page {}", page + 1)),
            [page, total] => Rendered::ok(format!("Page {} of {total}", page + 1)),
            _ => Rendered::invalid(plain(values)),
        },
        Kind::YCbCrSubSampling => match values.unsigned() {
            [1, 1] => Rendered::ok("4:4:4"),
            [2, 1] => Rendered::ok("4:2:2"),
            [2, 2] => Rendered::ok("4:2:0"),
            [4, 1] => Rendered::ok("4:1:1"),
            [4, 2] => Rendered::ok("4:1:0"),
            _ => Rendered::invalid(plain(values)),
        },
        Kind::YCbCrCoefficients => match floats()[..] {
            [red, green, blue] => Rendered::ok(format!(
                "LumaRed {}, LumaGreen {}, LumaBlue {}",
                number(red),
                number(green),
                number(blue)
            )),
            _ => Rendered::invalid(plain(values)),
        },
        Kind::ReferenceBlackWhite => match floats()[..] {
            [y0, y1, cb0, cb1, cr0, cr1] => Rendered::ok(format!(
                "Y {}..{}, Cb {}..{}, Cr {}..{}",
                number(y0),
                number(y1),
                number(cb0),
                number(cb1),
                number(cr0),
                number(cr1)
            )),
            _ => Rendered::invalid(plain(values)),
        },
        Kind::Flash => match single(values) {
            Some(value) => Rendered::ok(flash(value)),
            None => Rendered::invalid(plain(values)),
        },
        Kind::Version(known) => match known.iter().find(|(raw, _)| raw[..] == *bytes) {
            Some((_, name)) => Rendered::ok(*name),
            None => Rendered::invalid(format!("Unknown ({})", latin1(bytes))),
        },
        Kind::ComponentsConfiguration => match bytes {
            [4, 5, 6, 0] => Rendered::ok("RGB uncompressed"),
            [1, 2, 3, 0] => Rendered::ok("Other cases (YCbCr)"),
            _ => Rendered::invalid(format!("Invalid ({})", plain(values))),
        },
        Kind::ByteEnum(table) => match bytes {
            [value] => match lookup(*value, table) {
                Some(name) => Rendered::ok(name),
                None => Rendered::invalid(format!("Unknown ({value})")),
            },
            _ => Rendered::invalid(plain(values)),
        },
        Kind::UserComment => user_comment(bytes, endian),
        Kind::Opaque => Rendered::ok(format!("{} bytes", bytes.len())),
        Kind::GpsVersion => Rendered::ok(
            values
                .unsigned()
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join("."),
        ),
        Kind::GpsCoordinate => match floats()[..] {
            [Some(degrees), Some(minutes), Some(seconds)] => Rendered::ok(format!(
                "{}\u{b0} {}' {}\" ({})",
                decimal(degrees),
                decimal(minutes),
                decimal(seconds),
                decimal(degrees + minutes / 60.0 + seconds / 3600.0)
            )),
            _ => Rendered::invalid(plain(values)),
        },
        Kind::GpsTimeStamp => match floats()[..] {
            [Some(hours), Some(minutes), Some(seconds)] => Rendered::ok(format!(
                "{:02}:{:02}:{} UTC",
                hours as u64,
                minutes as u64,
                if seconds < 10.0 {
                    format!("0{}", decimal(seconds))
                } else {
                    decimal(seconds)
                }
            )),
            _ => Rendered::invalid(plain(values)),
        },
    }
}
