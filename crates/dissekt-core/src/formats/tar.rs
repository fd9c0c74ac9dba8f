//! TAR analyzer.
//!
//! An archive is a run of 512-byte member headers, each followed by the
//! member's content padded to the next block boundary. The first all-zero
//! block ends the archive; everything after it is padding.
//!
//! pax extended headers (`x`) and GNU long names (`L`, `K`) override the
//! path, link target or size of the member that follows them. Global pax
//! headers (`g`) are listed but not applied.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::field::{ColorCycle, ColorId};
use chrono::{DateTime, SecondsFormat};
use std::ops::Range;
use tracing::{debug, trace};

/// Size of a header and the unit content is padded to
pub const BLOCK_LEN: usize = 512;

const CHECKSUM: Range<usize> = 148..156;
const MAGIC: Range<usize> = 257..263;

const SUMMARY_TAB: &str = "Summary";
const MEMBERS_TAB: &str = "Members";

/// Returns true if `data` starts with a header whose checksum holds
pub fn matches(data: &[u8]) -> bool {
    data.get(..BLOCK_LEN).is_some_and(|header| {
        !is_zero(header)
            && number(&header[CHECKSUM]).is_some_and(|stored| checksum_matches(header, stored))
    })
}

fn is_zero(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Overrides carried from an extended header to the next member
#[derive(Debug, Default)]
struct Pending {
    path: Option<String>,
    link: Option<String>,
    size: Option<u64>,
}

#[derive(Debug, Default)]
struct TarState {
    members: usize,
    content_bytes: u64,
    pending: Pending,
}

pub(crate) fn analyze(ctx: &mut Context<'_>) {
    ctx.tab(SUMMARY_TAB);
    let mut state = TarState::default();
    if let Err(err) = walk(ctx, &mut state) {
        debug!("TAR analysis stopped: {}", err);
        let at = err.offset().unwrap_or_else(|| ctx.position());
        ctx.tab(SUMMARY_TAB).warning(err.to_string());
        ctx.terminate(at);
    }
    ctx.tab(SUMMARY_TAB)
        .entry("Members", state.members.to_string())
        .entry("Content size", format!("{} bytes", state.content_bytes));
}

fn walk(ctx: &mut Context<'_>, state: &mut TarState) -> Result<()> {
    while ctx.position() < ctx.len() {
        let start = ctx.position();
        if is_zero(ctx.cursor.read(BLOCK_LEN)?) {
            debug!("End of archive at offset {}", start);
            ctx.take(BLOCK_LEN, "Final empty block", ColorId::Accent8)?;
            ctx.tag_remaining("Archive padding", ColorId::Accent7);
            return Ok(());
        }
        member(ctx, state)?;
    }
    ctx.tab(SUMMARY_TAB)
        .warning("Archive ends without an end-of-archive block");
    Ok(())
}

fn member(ctx: &mut Context<'_>, state: &mut TarState) -> Result<()> {
    let start = ctx.position();
    let header: [u8; BLOCK_LEN] = ctx.cursor.read_array()?;
    let pending = std::mem::take(&mut state.pending);
    state.members += 1;

    let ustar = header[MAGIC].starts_with(b"ustar");
    let name = c_text(&header[..100]);
    let prefix = if ustar {
        c_text(&header[345..500])
    } else {
        String::new()
    };
    let path = pending.path.unwrap_or_else(|| {
        if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        }
    });
    let typeflag = header[156];
    let kind = type_name(typeflag);
    let magic_ok = matches!(&header[MAGIC], b"ustar\0" | b"ustar " | [0, 0, 0, 0, 0, 0]);
    trace!("Member {:?} at offset {}", path, start);

    ctx.take_nav(100, "File name", ColorId::Accent1, format!("{path} @ {start}"))?;
    let mode = take_number(ctx, 8, "File mode", ColorId::Accent2)?;
    let uid = take_number(ctx, 8, "Owner user ID", ColorId::Accent3)?;
    let gid = take_number(ctx, 8, "Owner group ID", ColorId::Accent4)?;
    let size = take_number(ctx, 12, "File size", ColorId::Accent5)?;
    let mtime = take_number(ctx, 12, "Modification time", ColorId::Accent6)?;
    let checksum = take_checksum(ctx, &header)?;
    ctx.take(
        1,
        "Type flag",
        if kind.is_some() { ColorId::Accent7 } else { ColorId::Error },
    )?;
    ctx.take(100, "Link name", ColorId::Accent8)?;
    ctx.take(6, "Magic", if magic_ok { ColorId::Accent1 } else { ColorId::Error })?;
    ctx.take(2, "Version", ColorId::Accent2)?;
    ctx.take(32, "Owner user name", ColorId::Accent3)?;
    ctx.take(32, "Owner group name", ColorId::Accent4)?;
    let major = take_number(ctx, 8, "Device major number", ColorId::Accent5)?;
    let minor = take_number(ctx, 8, "Device minor number", ColorId::Accent6)?;
    ctx.take(155, "File name prefix", ColorId::Accent7)?;
    ctx.take(12, "Header padding", ColorId::Accent8)?;

    let size = pending.size.or(size);
    let link = pending
        .link
        .unwrap_or_else(|| c_text(&header[157..257]));
    let unknown = || "invalid".to_string();

    let tab = ctx.tab(MEMBERS_TAB);
    tab.section(path.clone())
        .entry(
            "Type",
            kind.map_or_else(|| format!("Invalid (0x{typeflag:02x})"), str::to_string),
        )
        .entry("Size", size.map_or_else(unknown, |size| format!("{size} bytes")))
        .entry(
            "Mode",
            mode.map_or_else(unknown, |mode| format!("{mode:04o} ({})", permissions(mode))),
        )
        .entry("Owner", owner(&header[265..297], uid))
        .entry("Group", owner(&header[297..329], gid))
        .entry("Modified", mtime.and_then(utc_date).unwrap_or_else(unknown));
    if !link.is_empty() {
        tab.entry("Link target", link);
    }
    if matches!(typeflag, b'3' | b'4') {
        tab.entry(
            "Device",
            format!(
                "{}, {}",
                major.map_or_else(unknown, |n| n.to_string()),
                minor.map_or_else(unknown, |n| n.to_string())
            ),
        );
    }
    match checksum {
        Some(true) => {
            tab.entry("Checksum", "Valid");
        }
        Some(false) => {
            tab.warning(format!("Header checksum of {path} does not match"));
        }
        None => {
            tab.entry("Checksum", "Not verified");
        }
    }
    if kind.is_none() {
        tab.warning(format!("Invalid type flag 0x{typeflag:02x}"));
    }
    if !magic_ok {
        tab.warning(format!("Unknown header magic {:?}", c_text(&header[MAGIC])));
    }

    let Some(size) = size else {
        return Err(Error::malformed(
            ctx.position(),
            format!("invalid size field in header of {path}"),
        ));
    };
    state.content_bytes = state.content_bytes.saturating_add(size);
    let len = usize::try_from(size).unwrap_or(usize::MAX);

    match typeflag {
        b'x' | b'g' => extended_header(ctx, state, len, typeflag == b'x')?,
        b'L' | b'K' => {
            let long = c_text(ctx.take(len, "GNU long name", ColorId::Accent1)?);
            if typeflag == b'L' {
                state.pending.path = Some(long);
            } else {
                state.pending.link = Some(long);
            }
        }
        _ if len > 0 => {
            ctx.take_nav(len, "File contents", ColorId::Accent3, path)?;
        }
        _ => {}
    }

    let padding = (BLOCK_LEN - len % BLOCK_LEN) % BLOCK_LEN;
    if padding > 0 {
        ctx.take(padding, "Padding", ColorId::Accent4)?;
    }
    Ok(())
}

/// Tags the records of a pax extended header
///
/// Records of a local header (`x`) apply to the next member.
fn extended_header(
    ctx: &mut Context<'_>,
    state: &mut TarState,
    len: usize,
    local: bool,
) -> Result<()> {
    let start = ctx.position();
    let data = ctx.cursor.read(len)?;
    let mut colors = ColorCycle::new();
    let mut at = 0;

    while at < data.len() {
        if is_zero(&data[at..]) {
            ctx.take(data.len() - at, "Extended header padding", ColorId::Accent8)?;
            break;
        }
        let Some((record_len, key, value)) = pax_record(&data[at..]) else {
            ctx.tag_until(start + len, "Malformed extended header record", ColorId::Error);
            ctx.tab(MEMBERS_TAB).warning(format!(
                "Malformed extended header record at offset {}",
                start + at
            ));
            break;
        };
        ctx.take(record_len, "Extended header record", colors.next_color())?;
        ctx.tab(MEMBERS_TAB).text(format!("{key}={value}"));
        if local {
            match key {
                "path" => state.pending.path = Some(value.to_string()),
                "linkpath" => state.pending.link = Some(value.to_string()),
                "size" => state.pending.size = value.parse().ok(),
                _ => {}
            }
        }
        at += record_len;
    }
    Ok(())
}

/// Splits one `"<len> <key>=<value>\n"` record off the front of `bytes`
fn pax_record(bytes: &[u8]) -> Option<(usize, &str, &str)> {
    let space = bytes.iter().position(|&b| b == b' ')?;
    let len: usize = std::str::from_utf8(&bytes[..space]).ok()?.parse().ok()?;
    let body = bytes.get(..len)?.get(space + 1..)?.strip_suffix(b"\n")?;
    let (key, value) = std::str::from_utf8(body).ok()?.split_once('=')?;
    Some((len, key, value))
}

/// Reads a numeric header field, error-colored when it does not parse
fn take_number(
    ctx: &mut Context<'_>,
    len: usize,
    name: &'static str,
    color: ColorId,
) -> Result<Option<u64>> {
    let start = ctx.position();
    let field = ctx.cursor.read(len)?;
    let value = number(field);
    if value.is_some() && !is_clean_octal(field) {
        ctx.tab(MEMBERS_TAB).warning(format!(
            "{name} at {start} has characters after its octal digits"
        ));
    }
    ctx.take(len, name, if value.is_some() { color } else { ColorId::Error })?;
    Ok(value)
}

fn take_checksum(ctx: &mut Context<'_>, header: &[u8; BLOCK_LEN]) -> Result<Option<bool>> {
    let verified = ctx.config.verify_checksums.then(|| {
        number(&header[CHECKSUM]).is_some_and(|stored| checksum_matches(header, stored))
    });
    let color = if verified == Some(false) {
        ColorId::Error
    } else {
        ColorId::Accent7
    };
    ctx.take(CHECKSUM.len(), "Header checksum", color)?;
    Ok(verified)
}

/// Compares `stored` with the header sum, taken with the checksum field as
/// spaces; both the unsigned and the historic signed sum are accepted
fn checksum_matches(header: &[u8], stored: u64) -> bool {
    let (unsigned, signed) = header
        .iter()
        .enumerate()
        .map(|(i, &b)| if CHECKSUM.contains(&i) { b' ' } else { b })
        .fold((0u64, 0i64), |(unsigned, signed), b| {
            (unsigned + u64::from(b), signed + i64::from(b as i8))
        });
    stored == unsigned || i64::try_from(stored).is_ok_and(|stored| stored == signed)
}

/// Parses a numeric field: octal text, or GNU base-256 when the first
/// byte has its high bit set
///
/// Octal text may have leading spaces and must end in NULs or spaces; an
/// empty field reads as 0. Negative base-256 values are rejected.
fn number(field: &[u8]) -> Option<u64> {
    match field.split_first() {
        Some((&first, rest)) if first & 0x80 != 0 => {
            if first & 0x40 != 0 {
                return None;
            }
            rest.iter().try_fold(u64::from(first & 0x3F), |acc, &b| {
                acc.checked_mul(256)?.checked_add(u64::from(b))
            })
        }
        _ => octal(field),
    }
}

/// Splits an octal field into its digits and whatever follows them
fn octal_digits(field: &[u8]) -> (&[u8], &[u8]) {
    let text = &field[field.iter().take_while(|&&b| b == b' ').count()..];
    let digits = text.iter().take_while(|b| (b'0'..=b'7').contains(*b)).count();
    text.split_at(digits)
}

/// Reads leading octal digits and stops at the first other character
fn octal(field: &[u8]) -> Option<u64> {
    octal_digits(field).0.iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(8)?.checked_add(u64::from(d - b'0'))
    })
}

/// True if only NULs and spaces follow the digits of a base-256 or octal field
fn is_clean_octal(field: &[u8]) -> bool {
    field.first().is_some_and(|&b| b & 0x80 != 0)
        || octal_digits(field).1.iter().all(|&b| b == 0 || b == b' ')
}

/// Text up to the first NUL
fn c_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn type_name(flag: u8) -> Option<&'static str> {
    Some(match flag {
        b'0' | 0 => "Regular file",
        b'1' => "Hard link",
        b'2' => "Symbolic link",
        b'3' => "Character special",
        b'4' => "Block special",
        b'5' => "Directory",
        b'6' => "FIFO",
        b'7' => "Contiguous file",
        b'g' => "Global extended header",
        b'x' => "Extended header",
        b'K' => "GNU long link name",
        b'L' => "GNU long name",
        b'A'..=b'Z' => "Vendor extension",
        _ => return None,
    })
}

/// `ls`-style permission string, including setuid, setgid and sticky bits
fn permissions(mode: u64) -> String {
    const BITS: [(u64, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    let mut chars: Vec<char> = BITS
        .iter()
        .map(|&(bit, c)| if mode & bit != 0 { c } else { '-' })
        .collect();
    for (bit, index, executable, plain) in [
        (0o4000, 2, 's', 'S'),
        (0o2000, 5, 's', 'S'),
        (0o1000, 8, 't', 'T'),
    ] {
        if mode & bit != 0 {
            chars[index] = if chars[index] == 'x' { executable } else { plain };
        }
    }
    chars.into_iter().collect()
}

fn owner(name: &[u8], id: Option<u64>) -> String {
    let name = c_text(name);
    match (name.is_empty(), id) {
        (true, Some(id)) => id.to_string(),
        (false, Some(id)) => format!("{name} ({id})"),
        (false, None) => name,
        (true, None) => "invalid".to_string(),
    }
}

fn utc_date(seconds: u64) -> Option<String> {
    let seconds = i64::try_from(seconds).ok()?;
    DateTime::from_timestamp(seconds, 0).map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true))
}
