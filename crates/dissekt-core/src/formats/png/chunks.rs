//! Parsers for the fixed-layout chunks.
//!
//! Every parser runs with reads bounded to its chunk's data, so running off
//! the end surfaces as an underrun instead of eating the CRC.

use super::{text, Chunk, ChunkType, Ihdr, PngState, CHUNKS_TAB};
use crate::context::Context;
use crate::cursor::Endian;
use crate::error::{Error, Result};
use crate::field::{ColorCycle, ColorId, Field};

const BE: Endian = Endian::Big;

pub(super) fn parse(
    ctx: &mut Context<'_>,
    state: &mut PngState,
    chunk: Chunk,
    type_name: &str,
) -> Result<()> {
    match chunk.kind {
        ChunkType::Ihdr => ihdr(ctx, state, chunk),
        ChunkType::Plte => plte(ctx, state, chunk),
        ChunkType::Iend => iend(ctx, chunk),
        ChunkType::Trns => trns(ctx, state, chunk),
        ChunkType::Chrm => chrm(ctx, chunk),
        ChunkType::Gama => gama(ctx, chunk),
        ChunkType::Sbit => sbit(ctx, state, chunk),
        ChunkType::Srgb => srgb(ctx, chunk),
        ChunkType::Bkgd => bkgd(ctx, state, chunk),
        ChunkType::Hist => hist(ctx, state, chunk),
        ChunkType::Phys => phys(ctx, chunk),
        ChunkType::Splt => splt(ctx, chunk),
        ChunkType::Time => time(ctx, chunk),
        ChunkType::Text => text::text(ctx, chunk),
        ChunkType::Ztxt => text::ztxt(ctx, chunk),
        ChunkType::Itxt => text::itxt(ctx, chunk),
        ChunkType::Iccp => text::iccp(ctx, chunk),
        ChunkType::Idat => Ok(()),
        ChunkType::Unknown => {
            ctx.tab(CHUNKS_TAB)
                .warning(format!("Unknown chunk type {type_name} at {}", chunk.start - 8));
            ctx.tag_remaining("Unknown chunk data", ColorId::Error);
            Ok(())
        }
    }
}

/// Tags the whole chunk data as one error field and reports why
fn reject(ctx: &mut Context<'_>, chunk: Chunk, name: &'static str, reason: String) -> Result<()> {
    ctx.tag_remaining(name, ColorId::Error);
    Err(Error::malformed(chunk.start, reason))
}

/// Color type from IHDR, or an error over the chunk when IHDR was unusable
fn color_type(ctx: &mut Context<'_>, state: &PngState, chunk: Chunk) -> Result<u8> {
    match state.ihdr {
        Some(ihdr) => Ok(ihdr.color_type),
        None => reject(ctx, chunk, "Chunk data", "no valid IHDR".to_string()).map(|()| 0),
    }
}

fn valid_depth(color_type: u8, bit_depth: u8) -> bool {
    match color_type {
        0 => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
        3 => matches!(bit_depth, 1 | 2 | 4 | 8),
        2 | 4 | 6 => matches!(bit_depth, 8 | 16),
        _ => false,
    }
}

fn ihdr(ctx: &mut Context<'_>, state: &mut PngState, chunk: Chunk) -> Result<()> {
    if chunk.length != 13 {
        return reject(
            ctx,
            chunk,
            "Invalid IHDR data",
            format!("IHDR is {} bytes, expected 13", chunk.length),
        );
    }

    let width_ok = ctx.cursor.read_array::<4>().map(|b| BE.u32(b) != 0)?;
    let width = ctx.take_u32(
        BE,
        "Image width",
        if width_ok { ColorId::Accent1 } else { ColorId::Error },
    )?;
    let height_ok = ctx.cursor.read_array::<4>().map(|b| BE.u32(b) != 0)?;
    let height = ctx.take_u32(
        BE,
        "Image height",
        if height_ok { ColorId::Accent2 } else { ColorId::Error },
    )?;

    let [bit_depth, color_type, compression, filter, interlace] = ctx.cursor.read_array::<5>()?;
    let combination_ok = valid_depth(color_type, bit_depth);
    let pick = |ok: bool, color: ColorId| if ok { color } else { ColorId::Error };

    ctx.take(1, "Bit depth", pick(combination_ok, ColorId::Accent3))?;
    ctx.take(1, "Color type", pick(combination_ok, ColorId::Accent4))?;
    ctx.take(1, "Compression method", pick(compression == 0, ColorId::Accent5))?;
    ctx.take(1, "Filter method", pick(filter == 0, ColorId::Accent6))?;
    ctx.take(1, "Interlace method", pick(interlace <= 1, ColorId::Accent7))?;

    let mut problems = Vec::new();
    if !width_ok || !height_ok {
        problems.push(format!("image size {width}x{height} is empty"));
    }
    if !combination_ok {
        problems.push(format!("bit depth {bit_depth} is invalid for color type {color_type}"));
    }
    if compression != 0 {
        problems.push(format!("unknown compression method {compression}"));
    }
    if filter != 0 {
        problems.push(format!("unknown filter method {filter}"));
    }
    if interlace > 1 {
        problems.push(format!("unknown interlace method {interlace}"));
    }

    state.ihdr = Some(Ihdr {
        width,
        height,
        bit_depth,
        color_type,
        interlace,
    });
    match problems.is_empty() {
        true => Ok(()),
        false => Err(Error::malformed(chunk.start, problems.join(", "))),
    }
}

fn plte(ctx: &mut Context<'_>, state: &mut PngState, chunk: Chunk) -> Result<()> {
    let color_type = color_type(ctx, state, chunk)?;
    if matches!(color_type, 0 | 4) {
        return reject(
            ctx,
            chunk,
            "Palette not allowed",
            format!("PLTE is not allowed for color type {color_type}"),
        );
    }
    let entries = chunk.length / 3;
    if chunk.length % 3 != 0 || !(1..=256).contains(&entries) {
        return reject(
            ctx,
            chunk,
            "Invalid palette",
            format!("PLTE length {} is not 3 to 768 bytes in steps of 3", chunk.length),
        );
    }

    state.palette_entries = Some(entries);
    let mut colors = ColorCycle::new();
    let mut listing = Vec::with_capacity(entries);
    for index in 0..entries {
        let [r, g, b] = ctx.take_array::<3>(format!("Palette entry {index}"), colors.next_color())?;
        listing.push(format!("#{r:02x}{g:02x}{b:02x}"));
    }

    let tab = ctx.tab(CHUNKS_TAB);
    tab.section(format!("PLTE @ {}", chunk.start - 8))
        .entry("Entries", entries.to_string())
        .text(listing.join(" "));
    if let Some(ihdr) = state.ihdr {
        if color_type == 3 && ihdr.bit_depth < 8 && entries > 1 << ihdr.bit_depth {
            tab.warning(format!(
                "Palette has {entries} entries, bit depth {} addresses {}",
                ihdr.bit_depth,
                1 << ihdr.bit_depth
            ));
        }
    }
    Ok(())
}

fn iend(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    if chunk.length != 0 {
        return reject(
            ctx,
            chunk,
            "Invalid IEND data",
            format!("IEND carries {} bytes of data", chunk.length),
        );
    }
    Ok(())
}

fn trns(ctx: &mut Context<'_>, state: &PngState, chunk: Chunk) -> Result<()> {
    let section = format!("tRNS @ {}", chunk.start - 8);
    match color_type(ctx, state, chunk)? {
        0 if chunk.length == 2 => {
            let gray = ctx.take_u16(BE, "Transparent gray level", ColorId::Accent1)?;
            ctx.tab(CHUNKS_TAB)
                .section(section)
                .entry("Gray", gray.to_string());
        }
        2 if chunk.length == 6 => {
            let r = ctx.take_u16(BE, "Transparent red", ColorId::Accent1)?;
            let g = ctx.take_u16(BE, "Transparent green", ColorId::Accent2)?;
            let b = ctx.take_u16(BE, "Transparent blue", ColorId::Accent3)?;
            ctx.tab(CHUNKS_TAB)
                .section(section)
                .entry("Color", format!("{r}, {g}, {b}"));
        }
        3 => {
            let palette = state.palette_entries.unwrap_or(0);
            if chunk.length > palette {
                return reject(
                    ctx,
                    chunk,
                    "Invalid transparency",
                    format!("{} alpha entries for {palette} palette entries", chunk.length),
                );
            }
            let mut colors = ColorCycle::new();
            for index in 0..chunk.length {
                ctx.take_u8(format!("Alpha for palette entry {index}"), colors.next_color())?;
            }
            ctx.tab(CHUNKS_TAB)
                .section(section)
                .entry("Alpha entries", chunk.length.to_string());
        }
        color_type @ (4 | 6) => {
            return reject(
                ctx,
                chunk,
                "Transparency not allowed",
                format!("tRNS is not allowed for color type {color_type}"),
            );
        }
        color_type => {
            return reject(
                ctx,
                chunk,
                "Invalid transparency",
                format!("tRNS of {} bytes for color type {color_type}", chunk.length),
            );
        }
    }
    Ok(())
}

fn chrm(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    const NAMES: [&str; 8] = [
        "White point x",
        "White point y",
        "Red x",
        "Red y",
        "Green x",
        "Green y",
        "Blue x",
        "Blue y",
    ];
    if chunk.length != 32 {
        let reason = format!("cHRM is {} bytes, expected 32", chunk.length);
        return reject(ctx, chunk, "Invalid chromaticities", reason);
    }
    let mut values = Vec::with_capacity(NAMES.len());
    for (index, name) in NAMES.into_iter().enumerate() {
        let value = ctx.take_u32(BE, name, ColorId::accent(index))?;
        values.push((name, value));
    }
    let tab = ctx.tab(CHUNKS_TAB);
    tab.section(format!("cHRM @ {}", chunk.start - 8));
    for (name, value) in values {
        tab.entry(name, format!("{:.5}", f64::from(value) / 100_000.0));
    }
    Ok(())
}

fn gama(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    if chunk.length != 4 {
        let reason = format!("gAMA is {} bytes, expected 4", chunk.length);
        return reject(ctx, chunk, "Invalid gamma", reason);
    }
    let gamma = ctx.take_u32(BE, "Image gamma", ColorId::Accent1)?;
    ctx.tab(CHUNKS_TAB)
        .section(format!("gAMA @ {}", chunk.start - 8))
        .entry("Gamma", format!("{:.5}", f64::from(gamma) / 100_000.0));
    Ok(())
}

fn sbit(ctx: &mut Context<'_>, state: &PngState, chunk: Chunk) -> Result<()> {
    let color_type = color_type(ctx, state, chunk)?;
    let names: &[&'static str] = match color_type {
        0 => &["Significant gray bits"],
        2 | 3 => &["Significant red bits", "Significant green bits", "Significant blue bits"],
        4 => &["Significant gray bits", "Significant alpha bits"],
        6 => &[
            "Significant red bits",
            "Significant green bits",
            "Significant blue bits",
            "Significant alpha bits",
        ],
        _ => &[],
    };
    if names.is_empty() || chunk.length != names.len() {
        return reject(
            ctx,
            chunk,
            "Invalid significant bits",
            format!("sBIT of {} bytes for color type {color_type}", chunk.length),
        );
    }
    let mut bits = Vec::with_capacity(names.len());
    for (index, &name) in names.iter().enumerate() {
        bits.push(ctx.take_u8(name, ColorId::accent(index))?.to_string());
    }
    ctx.tab(CHUNKS_TAB)
        .section(format!("sBIT @ {}", chunk.start - 8))
        .entry("Significant bits", bits.join(", "));
    Ok(())
}

fn srgb(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    if chunk.length != 1 {
        let reason = format!("sRGB is {} bytes, expected 1", chunk.length);
        return reject(ctx, chunk, "Invalid rendering intent", reason);
    }
    let intent = ctx.cursor.read_array::<1>()?[0];
    let meaning = match intent {
        0 => Some("Perceptual"),
        1 => Some("Relative colorimetric"),
        2 => Some("Saturation"),
        3 => Some("Absolute colorimetric"),
        _ => None,
    };
    ctx.take(
        1,
        "Rendering intent",
        if meaning.is_some() { ColorId::Accent1 } else { ColorId::Error },
    )?;
    ctx.tab(CHUNKS_TAB)
        .section(format!("sRGB @ {}", chunk.start - 8))
        .entry("Rendering intent", meaning.unwrap_or("Invalid"));
    Ok(())
}

fn bkgd(ctx: &mut Context<'_>, state: &PngState, chunk: Chunk) -> Result<()> {
    let section = format!("bKGD @ {}", chunk.start - 8);
    let value = match color_type(ctx, state, chunk)? {
        0 | 4 if chunk.length == 2 => ctx
            .take_u16(BE, "Background gray level", ColorId::Accent1)?
            .to_string(),
        2 | 6 if chunk.length == 6 => {
            let r = ctx.take_u16(BE, "Background red", ColorId::Accent1)?;
            let g = ctx.take_u16(BE, "Background green", ColorId::Accent2)?;
            let b = ctx.take_u16(BE, "Background blue", ColorId::Accent3)?;
            format!("{r}, {g}, {b}")
        }
        3 if chunk.length == 1 => {
            let index = ctx.cursor.read_array::<1>()?[0];
            let in_palette = usize::from(index) < state.palette_entries.unwrap_or(0);
            ctx.take(
                1,
                "Background palette index",
                if in_palette { ColorId::Accent1 } else { ColorId::Error },
            )?;
            format!("palette entry {index}")
        }
        color_type => {
            return reject(
                ctx,
                chunk,
                "Invalid background",
                format!("bKGD of {} bytes for color type {color_type}", chunk.length),
            );
        }
    };
    ctx.tab(CHUNKS_TAB).section(section).entry("Background", value);
    Ok(())
}

fn hist(ctx: &mut Context<'_>, state: &PngState, chunk: Chunk) -> Result<()> {
    let Some(entries) = state.palette_entries else {
        return reject(ctx, chunk, "Histogram without palette", "hIST requires PLTE".to_string());
    };
    if entries << 1 != chunk.length {
        // One span over length, type, data and CRC
        let start = chunk.start - 8;
        ctx.emit(Field::new(start, chunk.length + 12, "Invalid histogram", ColorId::Error));
        ctx.cursor.set_position(chunk.end());
        return Err(Error::malformed(
            start,
            format!("hIST is {} bytes for {entries} palette entries", chunk.length),
        ));
    }
    let mut colors = ColorCycle::new();
    for index in 0..entries {
        ctx.take_u16(BE, format!("Frequency of palette entry {index}"), colors.next_color())?;
    }
    ctx.tab(CHUNKS_TAB)
        .section(format!("hIST @ {}", chunk.start - 8))
        .entry("Entries", entries.to_string());
    Ok(())
}

fn phys(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    if chunk.length != 9 {
        let reason = format!("pHYs is {} bytes, expected 9", chunk.length);
        return reject(ctx, chunk, "Invalid physical dimensions", reason);
    }
    let x = ctx.take_u32(BE, "Pixels per unit, X axis", ColorId::Accent1)?;
    let y = ctx.take_u32(BE, "Pixels per unit, Y axis", ColorId::Accent2)?;
    let unit = ctx.cursor.read_array::<1>()?[0];
    ctx.take(1, "Unit specifier", if unit <= 1 { ColorId::Accent3 } else { ColorId::Error })?;

    let tab = ctx.tab(CHUNKS_TAB);
    tab.section(format!("pHYs @ {}", chunk.start - 8));
    if unit == 1 {
        tab.entry(
            "Resolution",
            format!("{:.0} x {:.0} dpi", f64::from(x) * 0.0254, f64::from(y) * 0.0254),
        );
    } else {
        tab.entry("Aspect ratio", format!("{x}:{y}"));
    }
    Ok(())
}

fn splt(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    let name = text::keyword(ctx, "Palette name")?;
    let depth = ctx.cursor.read_array::<1>()?[0];
    let entry_size = match depth {
        8 => 6,
        16 => 10,
        _ => 0,
    };
    ctx.take(1, "Sample depth", if entry_size > 0 { ColorId::Accent3 } else { ColorId::Error })?;
    let remaining = chunk.end() - ctx.position();
    if entry_size == 0 || remaining % entry_size != 0 {
        ctx.tag_remaining("Invalid suggested palette entries", ColorId::Error);
        return Err(Error::malformed(
            chunk.start,
            format!("sPLT with sample depth {depth} and {remaining} bytes of entries"),
        ));
    }

    let mut colors = ColorCycle::new();
    for index in 0..remaining / entry_size {
        ctx.take(entry_size, format!("Suggested palette entry {index}"), colors.next_color())?;
    }
    ctx.tab(CHUNKS_TAB)
        .section(format!("sPLT @ {}", chunk.start - 8))
        .entry("Palette name", name)
        .entry("Sample depth", depth.to_string())
        .entry("Entries", (remaining / entry_size).to_string());
    Ok(())
}

fn time(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    if chunk.length != 7 {
        let reason = format!("tIME is {} bytes, expected 7", chunk.length);
        return reject(ctx, chunk, "Invalid modification time", reason);
    }
    let year = ctx.take_u16(BE, "Year", ColorId::Accent1)?;
    let [month, day, hour, minute, second] = ctx.cursor.read_array::<5>()?;
    let valid = (1..=12).contains(&month)
        && (1..=31).contains(&day)
        && hour <= 23
        && minute <= 59
        && second <= 60;
    let color = |c: ColorId| if valid { c } else { ColorId::Error };
    ctx.take(1, "Month", color(ColorId::Accent2))?;
    ctx.take(1, "Day", color(ColorId::Accent3))?;
    ctx.take(1, "Hour", color(ColorId::Accent4))?;
    ctx.take(1, "Minute", color(ColorId::Accent5))?;
    ctx.take(1, "Second", color(ColorId::Accent6))?;

    ctx.tab(CHUNKS_TAB)
        .section(format!("tIME @ {}", chunk.start - 8))
        .entry(
            "Last modification",
            format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02} UTC"),
        );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testutil::*;
    use crate::dispatch::analyze;
    use crate::field::Field;
    use pretty_assertions::assert_eq;

    fn palette(entries: usize) -> Vec<u8> {
        chunk(b"PLTE", &vec![0x40; entries * 3])
    }

    fn indexed_with_hist(palette_entries: usize, hist_entries: usize) -> Vec<u8> {
        png(&[
            ihdr(1, 1, 8, 3),
            palette(palette_entries),
            chunk(b"hIST", &vec![0; hist_entries * 2]),
            chunk(b"IEND", &[]),
        ])
    }

    #[test]
    fn test_hist_matches_palette() {
        let analysis = analyze(&indexed_with_hist(4, 4));
        assert_eq!(analysis.error_fields().count(), 0);
        assert_eq!(analysis.fields_named("Frequency of palette entry 3").count(), 1);
    }

    #[test]
    fn test_hist_off_by_one() {
        for hist_entries in [3, 5] {
            let data = indexed_with_hist(4, hist_entries);
            let analysis = analyze(&data);
            let errors: Vec<&Field> = analysis.error_fields().collect();
            assert_eq!(errors.len(), 1, "hIST with {hist_entries} entries");
            assert_eq!(errors[0].name, "Invalid histogram");
            // 8 signature + 25 IHDR + 24 PLTE, then the whole hIST chunk
            assert_eq!(errors[0].range(), 57..57 + hist_entries * 2 + 12);
            assert!(analysis.uncovered().is_empty());
        }
    }

    #[test]
    fn test_empty_hist_for_one_entry_palette() {
        let analysis = analyze(&indexed_with_hist(1, 0));
        let errors: Vec<&Field> = analysis.error_fields().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "Invalid histogram");
        // 8 signature + 25 IHDR + 15 PLTE
        assert_eq!(errors[0].range(), 48..60);
    }

    #[test]
    fn test_plte_length_not_multiple_of_three() {
        let data = png(&[
            ihdr(1, 1, 8, 3),
            chunk(b"PLTE", &[0; 7]),
            chunk(b"IEND", &[]),
        ]);
        let analysis = analyze(&data);
        let errors: Vec<&str> = analysis.error_fields().map(|f| f.name.as_ref()).collect();
        assert_eq!(errors, vec!["Invalid palette"]);
    }

    #[test]
    fn test_plte_not_allowed_for_grayscale() {
        let data = png(&[ihdr(1, 1, 8, 0), palette(2), chunk(b"IEND", &[])]);
        let analysis = analyze(&data);
        assert_eq!(analysis.fields_named("Palette not allowed").count(), 1);
    }

    #[test]
    fn test_invalid_bit_depth() {
        let data = png(&[ihdr(1, 1, 4, 2), chunk(b"IEND", &[])]);
        let analysis = analyze(&data);
        let errors: Vec<&str> = analysis.error_fields().map(|f| f.name.as_ref()).collect();
        assert_eq!(errors, vec!["Bit depth", "Color type"]);
        assert!(analysis.warnings().any(|w| w.contains("bit depth 4")));
    }

    #[test]
    fn test_short_ihdr() {
        let data = png(&[chunk(b"IHDR", &[0; 10]), chunk(b"IEND", &[])]);
        let analysis = analyze(&data);
        let invalid = analysis.fields_named("Invalid IHDR data").next().unwrap();
        assert_eq!(invalid.range(), 16..26);
    }

    #[test]
    fn test_trns_for_indexed_color() {
        let ok = png(&[
            ihdr(1, 1, 8, 3),
            palette(3),
            chunk(b"tRNS", &[0, 128]),
            chunk(b"IEND", &[]),
        ]);
        assert_eq!(analyze(&ok).error_fields().count(), 0);

        let too_many = png(&[
            ihdr(1, 1, 8, 3),
            palette(1),
            chunk(b"tRNS", &[0, 128]),
            chunk(b"IEND", &[]),
        ]);
        assert_eq!(
            analyze(&too_many).fields_named("Invalid transparency").count(),
            1
        );

        let with_alpha = png(&[ihdr(1, 1, 8, 6), chunk(b"tRNS", &[0; 6]), chunk(b"IEND", &[])]);
        assert_eq!(
            analyze(&with_alpha).fields_named("Transparency not allowed").count(),
            1
        );
    }

    #[test]
    fn test_bkgd_layout_follows_color_type() {
        let data = png(&[
            ihdr(1, 1, 16, 2),
            chunk(b"bKGD", &[0, 1, 0, 2, 0, 3]),
            chunk(b"IEND", &[]),
        ]);
        let analysis = analyze(&data);
        assert_eq!(analysis.error_fields().count(), 0);
        assert_eq!(analysis.tab("Chunks").unwrap().value("Background"), Some("1, 2, 3"));

        let wrong = png(&[ihdr(1, 1, 8, 0), chunk(b"bKGD", &[0; 6]), chunk(b"IEND", &[])]);
        assert_eq!(analyze(&wrong).fields_named("Invalid background").count(), 1);
    }

    #[test]
    fn test_time_and_phys() {
        let mut time = 2024u16.to_be_bytes().to_vec();
        time.extend_from_slice(&[2, 29, 13, 5, 9]);
        let mut phys = 2835u32.to_be_bytes().to_vec();
        phys.extend_from_slice(&2835u32.to_be_bytes());
        phys.push(1);

        let data = png(&[
            ihdr(1, 1, 8, 0),
            chunk(b"tIME", &time),
            chunk(b"pHYs", &phys),
            chunk(b"IEND", &[]),
        ]);
        let analysis = analyze(&data);
        let tab = analysis.tab("Chunks").unwrap();
        assert_eq!(tab.value("Last modification"), Some("2024-02-29 13:05:09 UTC"));
        assert_eq!(tab.value("Resolution"), Some("72 x 72 dpi"));
    }

    #[test]
    fn test_overlong_fixed_chunk_leftover_is_error() {
        let data = png(&[ihdr(1, 1, 8, 0), chunk(b"gAMA", &[0; 6]), chunk(b"IEND", &[])]);
        let analysis = analyze(&data);
        let invalid = analysis.fields_named("Invalid gamma").next().unwrap();
        assert_eq!(invalid.length, 6);
        assert!(analysis.uncovered().is_empty());
    }
}
