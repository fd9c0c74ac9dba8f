//! TIFF analyzer, including the Exif and GPSInfo private directories.
//!
//! ## Walk
//!
//! The 8-byte header names the byte order and the offset of the first IFD.
//! IFDs form a linked list: an entry count, that many 12-byte entries, then
//! the offset of the next IFD (0 ends the chain).
//!
//! Each entry is checked against the tag table of its directory, which also
//! decides how the value is rendered. A payload of up to four bytes sits in
//! the entry itself; anything longer is reached through the offset stored
//! there. ExifIFD and GPSInfoIFD entries point at nested directories walked
//! against their own tables. Strips and JPEG thumbnails are tagged once the
//! directory that declares them is complete.
//!
//! Everything is reached by offset, so each walk records the region it
//! covered and gaps are filled in afterwards.
//!
//! ## Runaway files
//!
//! A corrupt file can declare tens of thousands of garbage entries. Once
//! more than [`MAX_UNKNOWN_TAGS`] unknown tags have been seen and the current
//! IFD declares more than [`LARGE_IFD_ENTRIES`] entries, the analysis stops.

mod entry;
mod exif;
mod gps;
mod tags;
mod values;

use crate::context::Context;
use crate::cursor::{Endian, Offset};
use crate::error::{Error, Result};
use crate::field::{ColorCycle, ColorId, Field};
use entry::{IfdEntry, Values, ENTRY_LEN};
use std::collections::HashSet;
use tags::{Directory, Kind, TagSpec};
use tracing::{debug, trace, warn};

/// Little-endian TIFF header
pub const LITTLE_ENDIAN_MAGIC: [u8; 4] = *b"II\x2a\x00";
/// Big-endian TIFF header
pub const BIG_ENDIAN_MAGIC: [u8; 4] = *b"MM\x00\x2a";

const HEADER_TAB: &str = "Header";

/// Unknown tags tolerated before a large IFD counts as runaway
const MAX_UNKNOWN_TAGS: usize = 10;
/// Entry count above which an IFD counts as large
const LARGE_IFD_ENTRIES: u16 = 100;

/// Returns true if `data` starts with either TIFF header
pub fn matches(data: &[u8]) -> bool {
    data.starts_with(&LITTLE_ENDIAN_MAGIC) || data.starts_with(&BIG_ENDIAN_MAGIC)
}

struct TiffState {
    endian: Endian,
    unknown_tags: usize,
    /// Directory offsets already walked, for loop detection
    visited: HashSet<usize>,
}

/// Image data references collected from one IFD
#[derive(Debug, Default)]
struct ImageData {
    strip_offsets: Option<Vec<u64>>,
    strip_byte_counts: Option<Vec<u64>>,
    jpeg_offset: Option<u64>,
    jpeg_length: Option<u64>,
}

pub(crate) fn analyze(ctx: &mut Context<'_>) {
    let endian = if ctx.data().starts_with(b"MM") {
        Endian::Big
    } else {
        Endian::Little
    };
    let mut state = TiffState {
        endian,
        unknown_tags: 0,
        visited: HashSet::new(),
    };

    match walk(ctx, &mut state) {
        Ok(()) => {}
        Err(err) if err.is_abort() => {
            warn!("TIFF analysis aborted: {}", err);
            ctx.tab(HEADER_TAB).warning(err.to_string());
        }
        Err(err) => {
            debug!("TIFF analysis stopped: {}", err);
            let at = err.offset().unwrap_or_else(|| ctx.position());
            ctx.tab(HEADER_TAB).warning(err.to_string());
            ctx.terminate(at);
        }
    }

    if state.unknown_tags > 0 {
        ctx.tab(HEADER_TAB)
            .entry("Unknown tags", state.unknown_tags.to_string());
    }
}

fn walk(ctx: &mut Context<'_>, state: &mut TiffState) -> Result<()> {
    let endian = state.endian;
    ctx.take(2, "Byte order", ColorId::Accent1)?;
    ctx.take_u16(endian, "TIFF magic number", ColorId::Accent2)?;
    let first = ctx.take_u32(endian, "First IFD offset", ColorId::Accent3)?;
    ctx.mark_region(0, ctx.position());
    ctx.tab(HEADER_TAB)
        .entry("Byte order", endian.as_str())
        .entry("First IFD offset", first.to_string());

    let mut next = first;
    let mut index = 0;
    while next != 0 {
        if index == ctx.config.max_ifd_chain {
            ctx.tab(HEADER_TAB).warning(format!(
                "IFD chain longer than {index} directories, offset {next} not followed"
            ));
            break;
        }
        let offset = Offset::from(next);
        if !state.visited.insert(offset.get()) {
            ctx.tab(HEADER_TAB)
                .warning(format!("IFD chain loops back to offset {next}"));
            break;
        }
        debug!("Walking IFD {} at offset {}", index, next);
        next = ctx.detour_region(offset, |ctx| directory(ctx, state, Directory::Tiff(index)))?;
        index += 1;
    }

    ctx.tab(HEADER_TAB).entry("IFDs", index.to_string());
    Ok(())
}

/// Walks one IFD at the cursor and returns the offset of the next one
fn directory(ctx: &mut Context<'_>, state: &mut TiffState, dir: Directory) -> Result<u32> {
    let title = dir.title();
    let start = ctx.position();
    let count = state.endian.u16(ctx.cursor.read_array()?);
    ctx.take_nav(
        2,
        "Number of directory entries",
        ColorId::Accent8,
        format!("{title} @ {start}"),
    )?;
    ctx.tab(&title)
        .entry("Offset", start.to_string())
        .entry("Entries", count.to_string());

    let mut image = ImageData::default();
    let mut colors = ColorCycle::new();
    for _ in 0..count {
        ifd_entry(ctx, state, dir, &title, count, &mut image, colors.next_color())?;
    }
    let next = ctx.take_u32(state.endian, "Next IFD offset", ColorId::Accent8)?;

    image_data(ctx, &title, &image);
    Ok(next)
}

fn ifd_entry(
    ctx: &mut Context<'_>,
    state: &mut TiffState,
    dir: Directory,
    title: &str,
    declared: u16,
    image: &mut ImageData,
    color: ColorId,
) -> Result<()> {
    let endian = state.endian;
    let offset = ctx.position();
    let entry = IfdEntry::parse(offset, ctx.cursor.read_array::<ENTRY_LEN>()?, endian);
    let Some(spec) = dir.lookup(entry.tag) else {
        return unknown_tag(ctx, state, title, &entry, declared);
    };
    trace!(
        "{}: {} ({} x {}) at {}",
        title,
        spec.name,
        entry.type_name(),
        entry.count,
        offset
    );

    let type_ok = entry
        .field_type
        .is_some_and(|field_type| spec.types.contains(&field_type));
    let count_ok = spec.count.map_or(entry.count > 0, |count| entry.count == count);
    let checked = |ok: bool| if ok { color } else { ColorId::Error };

    ctx.emit(
        Field::new(offset, 2, spec.name, color).with_navigation(format!("{title}: {}", spec.name)),
    );
    ctx.emit(Field::new(offset + 2, 2, "Field type", checked(type_ok)));
    ctx.emit(Field::new(offset + 4, 4, "Count", checked(count_ok)));
    ctx.cursor.advance(8);

    let payload = entry
        .field_type
        .zip(entry.payload_len())
        .filter(|_| type_ok && count_ok);
    let Some((field_type, len)) = payload else {
        ctx.take(4, "Value or offset", ColorId::Error)?;
        ctx.tab(title).warning(format!(
            "{} is {} x {}, expected {} x {}",
            spec.name,
            entry.type_name(),
            entry.count,
            expected_types(spec),
            spec.count.map_or_else(|| "any".to_string(), |count| count.to_string())
        ));
        return Ok(());
    };

    let inline = entry.is_inline();
    let value_at = Offset::from(entry.value_offset(endian));
    let bytes: &[u8] = if inline {
        &entry.value[..len]
    } else {
        match ctx.cursor.read_at(value_at, len) {
            Ok(bytes) => bytes,
            Err(err) => {
                ctx.take(4, "Value offset", ColorId::Error)?;
                ctx.tab(title)
                    .warning(format!("{} value lies outside the file: {err}", spec.name));
                return Ok(());
            }
        }
    };

    let decoded = Values::decode(bytes, field_type, endian);
    let rendered = values::render(spec.kind, &decoded, bytes, endian);
    let value_color = checked(rendered.valid);
    if inline {
        ctx.take(4, "Value", value_color)?;
    } else {
        ctx.take(4, "Value offset", color)?;
        ctx.detour_region(value_at, |ctx| {
            ctx.take(len, format!("{} value", spec.name), value_color)
                .map(drop)
        })?;
    }

    if !rendered.valid {
        ctx.tab(title)
            .warning(format!("{}: invalid value {:?}", spec.name, rendered.text));
    }
    ctx.tab(title).entry_with_tooltip(
        spec.name,
        rendered.text,
        format!("Tag 0x{:04X}, {} x {}", entry.tag, entry.type_name(), entry.count),
    );

    match spec.kind {
        Kind::StripOffsets => image.strip_offsets = Some(decoded.unsigned().to_vec()),
        Kind::StripByteCounts => image.strip_byte_counts = Some(decoded.unsigned().to_vec()),
        Kind::JpegOffset => image.jpeg_offset = decoded.unsigned().first().copied(),
        Kind::JpegLength => image.jpeg_length = decoded.unsigned().first().copied(),
        Kind::SubIfd(sub) => sub_directory(ctx, state, sub, value_at)?,
        _ => {}
    }
    Ok(())
}

fn expected_types(spec: &TagSpec) -> String {
    spec.types
        .iter()
        .map(|field_type| field_type.name())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Tags an entry with no table entry as four error spans
fn unknown_tag(
    ctx: &mut Context<'_>,
    state: &mut TiffState,
    title: &str,
    entry: &IfdEntry,
    declared: u16,
) -> Result<()> {
    state.unknown_tags += 1;
    trace!("{}: unknown tag 0x{:04X} at {}", title, entry.tag, entry.offset);

    ctx.take(2, "Unknown tag", ColorId::Error)?;
    ctx.take(2, "Field type", ColorId::ErrorAlt)?;
    ctx.take(4, "Count", ColorId::Error)?;
    ctx.take(4, "Value or offset", ColorId::ErrorAlt)?;
    ctx.tab(title).warning(format!(
        "Unknown tag 0x{:04X} ({} x {}) at offset {}",
        entry.tag,
        entry.type_name(),
        entry.count,
        entry.offset
    ));

    if state.unknown_tags > MAX_UNKNOWN_TAGS && declared > LARGE_IFD_ENTRIES {
        return Err(Error::aborted(format!(
            "{} unknown tags, {title} declares {declared} entries",
            state.unknown_tags
        )));
    }
    Ok(())
}

/// Walks a nested directory; only an abort escapes it
fn sub_directory(
    ctx: &mut Context<'_>,
    state: &mut TiffState,
    dir: Directory,
    at: Offset,
) -> Result<()> {
    let title = dir.title();
    if !state.visited.insert(at.get()) {
        ctx.tab(&title)
            .warning(format!("Directory at offset {} already walked", at.get()));
        return Ok(());
    }

    debug!("Walking {} IFD at offset {}", title, at.get());
    match ctx.detour_region(at, |ctx| directory(ctx, state, dir)) {
        Ok(_) => Ok(()),
        Err(err) if err.is_abort() => Err(err),
        Err(err) => {
            debug!("{} walk stopped: {}", title, err);
            ctx.tab(&title).warning(format!("Walk stopped: {err}"));
            Ok(())
        }
    }
}

/// Tags the strips and the JPEG thumbnail declared by one IFD
fn image_data(ctx: &mut Context<'_>, title: &str, image: &ImageData) {
    match (&image.strip_offsets, &image.strip_byte_counts) {
        (Some(offsets), Some(counts)) if offsets.len() == counts.len() => {
            let mut colors = ColorCycle::new();
            for (index, (&offset, &length)) in offsets.iter().zip(counts).enumerate() {
                tag_image_range(
                    ctx,
                    title,
                    (offset, length),
                    "Image data strip",
                    colors.next_color(),
                    format!("{title} strip {index}"),
                );
            }
            ctx.tab(title).entry("Strips", offsets.len().to_string());
        }
        (Some(offsets), Some(counts)) => {
            ctx.tab(title).warning(format!(
                "StripOffsets has {} entries but StripByteCounts has {}, strips not tagged",
                offsets.len(),
                counts.len()
            ));
        }
        (Some(_), None) => {
            ctx.tab(title).warning("StripOffsets without StripByteCounts");
        }
        (None, Some(_)) => {
            ctx.tab(title).warning("StripByteCounts without StripOffsets");
        }
        (None, None) => {}
    }

    match (image.jpeg_offset, image.jpeg_length) {
        (Some(offset), Some(length)) if offset != 0 && length != 0 => {
            let tagged = tag_image_range(
                ctx,
                title,
                (offset, length),
                "Embedded JPEG",
                ColorId::Accent5,
                format!("{title} JPEG thumbnail"),
            );
            if let Some((offset, length)) = tagged {
                ctx.embed(offset, length, format!("JPEG thumbnail of {title}"));
            }
        }
        (Some(_), None) => {
            ctx.tab(title)
                .warning("JPEGInterchangeFormat without JPEGInterchangeFormatLength");
        }
        (None, Some(_)) => {
            ctx.tab(title)
                .warning("JPEGInterchangeFormatLength without JPEGInterchangeFormat");
        }
        _ => {}
    }
}

/// Tags `offset..offset + length` if it lies inside the file
fn tag_image_range(
    ctx: &mut Context<'_>,
    title: &str,
    (offset, length): (u64, u64),
    name: &'static str,
    color: ColorId,
    navigation: String,
) -> Option<(usize, usize)> {
    if length == 0 {
        return None;
    }
    let len = ctx.len();
    let range = usize::try_from(offset)
        .ok()
        .zip(usize::try_from(length).ok())
        .filter(|&(start, size)| start.checked_add(size).is_some_and(|end| end <= len));
    let Some((start, size)) = range else {
        ctx.tab(title).warning(format!(
            "{name} at offset {offset} ({length} bytes) lies outside the file"
        ));
        return None;
    };

    ctx.detour_region(Offset(start), |ctx| {
        ctx.take_nav(size, name, color, navigation).map(drop)
    })
    .ok()
    .map(|()| (start, size))
}
