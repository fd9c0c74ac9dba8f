//! PNG analyzer.
//!
//! The file is an 8-byte signature followed by chunks, each
//! `length(4) type(4) data(length) crc(4)`. Chunk data is handed to a
//! per-type parser that can only read inside the chunk; anything it leaves
//! over is tagged as an error. IDAT data is collected across chunks and
//! decoded as one zlib stream once the chunk walk ends.

mod chunks;
mod text;
mod zlib;

use crate::context::{Context, UNRECOGNIZED};
use crate::cursor::{Endian, Offset};
use crate::error::Result;
use crate::field::{ColorId, Field};
use tracing::{debug, trace};
use zlib::IdatChunkTagger;

/// PNG signature at offset 0
pub const MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const SUMMARY_TAB: &str = "Summary";
const CHUNKS_TAB: &str = "Chunks";

/// Returns true if `data` starts with the PNG signature
pub fn matches(data: &[u8]) -> bool {
    data.starts_with(&MAGIC)
}

/// Chunk types with a dedicated parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkType {
    Ihdr,
    Plte,
    Idat,
    Iend,
    Trns,
    Chrm,
    Gama,
    Iccp,
    Sbit,
    Srgb,
    Text,
    Ztxt,
    Itxt,
    Bkgd,
    Hist,
    Phys,
    Splt,
    Time,
    Unknown,
}

impl ChunkType {
    const COUNT: usize = 19;

    const ALL: [ChunkType; Self::COUNT] = [
        ChunkType::Ihdr,
        ChunkType::Plte,
        ChunkType::Idat,
        ChunkType::Iend,
        ChunkType::Trns,
        ChunkType::Chrm,
        ChunkType::Gama,
        ChunkType::Iccp,
        ChunkType::Sbit,
        ChunkType::Srgb,
        ChunkType::Text,
        ChunkType::Ztxt,
        ChunkType::Itxt,
        ChunkType::Bkgd,
        ChunkType::Hist,
        ChunkType::Phys,
        ChunkType::Splt,
        ChunkType::Time,
        ChunkType::Unknown,
    ];

    fn from_bytes(kind: [u8; 4]) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.tag().as_bytes() == kind)
            .unwrap_or(ChunkType::Unknown)
    }

    fn tag(self) -> &'static str {
        match self {
            ChunkType::Ihdr => "IHDR",
            ChunkType::Plte => "PLTE",
            ChunkType::Idat => "IDAT",
            ChunkType::Iend => "IEND",
            ChunkType::Trns => "tRNS",
            ChunkType::Chrm => "cHRM",
            ChunkType::Gama => "gAMA",
            ChunkType::Iccp => "iCCP",
            ChunkType::Sbit => "sBIT",
            ChunkType::Srgb => "sRGB",
            ChunkType::Text => "tEXt",
            ChunkType::Ztxt => "zTXt",
            ChunkType::Itxt => "iTXt",
            ChunkType::Bkgd => "bKGD",
            ChunkType::Hist => "hIST",
            ChunkType::Phys => "pHYs",
            ChunkType::Splt => "sPLT",
            ChunkType::Time => "tIME",
            ChunkType::Unknown => "unknown",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Decoded IHDR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ihdr {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: u8,
    interlace: u8,
}

impl Ihdr {
    fn channels(&self) -> Option<u64> {
        match self.color_type {
            0 | 3 => Some(1),
            2 => Some(3),
            4 => Some(2),
            6 => Some(4),
            _ => None,
        }
    }

    /// Size of the filtered scanlines, including Adam7 sub-images when
    /// the image is interlaced
    fn expected_image_size(&self) -> Option<u64> {
        const ADAM7: [(u64, u64, u64, u64); 7] = [
            (0, 0, 8, 8),
            (4, 0, 8, 8),
            (0, 4, 4, 8),
            (2, 0, 4, 4),
            (0, 2, 2, 4),
            (1, 0, 2, 2),
            (0, 1, 1, 2),
        ];
        let bits_per_pixel = self.channels()? * u64::from(self.bit_depth);
        let scanlines = |width: u64, height: u64| -> Option<u64> {
            if width == 0 || height == 0 {
                return Some(0);
            }
            let row = width.checked_mul(bits_per_pixel)?.div_ceil(8) + 1;
            row.checked_mul(height)
        };

        let (width, height) = (u64::from(self.width), u64::from(self.height));
        match self.interlace {
            0 => scanlines(width, height),
            1 => ADAM7.iter().try_fold(0u64, |total, &(x0, y0, dx, dy)| {
                let w = width.saturating_sub(x0).div_ceil(dx);
                let h = height.saturating_sub(y0).div_ceil(dy);
                total.checked_add(scanlines(w, h)?)
            }),
            _ => None,
        }
    }
}

fn color_type_name(color_type: u8) -> &'static str {
    match color_type {
        0 => "Grayscale",
        2 => "Truecolor",
        3 => "Indexed-color",
        4 => "Grayscale with alpha",
        6 => "Truecolor with alpha",
        _ => "Invalid",
    }
}

/// State carried across the chunk walk
#[derive(Debug, Default)]
struct PngState {
    ihdr: Option<Ihdr>,
    palette_entries: Option<usize>,
    idat: Vec<(usize, usize)>,
    counts: [usize; ChunkType::COUNT],
    iend: bool,
}

impl PngState {
    fn count(&self, kind: ChunkType) -> usize {
        self.counts[kind.index()]
    }
}

/// One chunk's data span
#[derive(Debug, Clone, Copy)]
struct Chunk {
    kind: ChunkType,
    start: usize,
    length: usize,
}

impl Chunk {
    fn end(&self) -> usize {
        self.start + self.length
    }
}

pub(crate) fn analyze(ctx: &mut Context<'_>) {
    let mut state = PngState::default();
    if let Err(err) = walk(ctx, &mut state) {
        debug!("PNG analysis stopped: {}", err);
        let at = err.offset().unwrap_or_else(|| ctx.position());
        ctx.tab(SUMMARY_TAB).warning(err.to_string());
        ctx.terminate(at);
    }
    image_data(ctx, &state);
    summary(ctx, &state);
}

fn walk(ctx: &mut Context<'_>, state: &mut PngState) -> Result<()> {
    ctx.take(MAGIC.len(), "PNG signature", ColorId::Accent1)?;

    while ctx.cursor.remaining() > 0 {
        if state.iend {
            let trailing = ctx.cursor.remaining();
            ctx.tab(SUMMARY_TAB).warning(format!("{trailing} bytes after the IEND chunk"));
            ctx.tag_remaining("Data after IEND", ColorId::Error);
            break;
        }
        chunk(ctx, state)?;
    }
    Ok(())
}

fn chunk(ctx: &mut Context<'_>, state: &mut PngState) -> Result<()> {
    let chunk_start = ctx.position();
    let length = ctx.take_u32(Endian::Big, "Chunk length", ColorId::Accent5)? as usize;
    let type_bytes = ctx.cursor.read_array::<4>()?;
    let kind = ChunkType::from_bytes(type_bytes);
    let type_name = String::from_utf8_lossy(&type_bytes).into_owned();

    let misplaced = misplaced_reason(state, kind);
    ctx.emit(
        Field::new(
            ctx.position(),
            4,
            "Chunk type",
            if misplaced.is_some() { ColorId::Error } else { ColorId::Accent6 },
        )
        .with_navigation(format!("{type_name} @ {chunk_start}")),
    );
    ctx.cursor.advance(4);
    trace!("{} chunk at {} with {} bytes", type_name, chunk_start, length);

    // The data, plus the CRC, has to be present before any parser runs
    let start = ctx.position();
    ctx.cursor.read_at(Offset(start), length.saturating_add(4))?;

    state.counts[kind.index()] += 1;
    let chunk = Chunk { kind, start, length };

    if let Some(reason) = misplaced {
        ctx.tab(CHUNKS_TAB).warning(format!("{type_name} at {chunk_start}: {reason}"));
        ctx.tag_until(chunk.end(), format!("{type_name} data ({reason})"), ColorId::Error);
    } else if kind == ChunkType::Idat {
        // Tagged with the rest of the stream once every IDAT is known
        state.idat.push((start, length));
        ctx.cursor.set_position(chunk.end());
    } else {
        let result = ctx.bounded(chunk.end(), |ctx| chunks::parse(ctx, state, chunk, &type_name));
        if let Err(err) = result {
            trace!("{} parser stopped: {}", type_name, err);
            ctx.tab(CHUNKS_TAB).warning(format!("{type_name} at {chunk_start}: {err}"));
        }
        ctx.tag_until(chunk.end(), UNRECOGNIZED, ColorId::Error);
    }
    ctx.cursor.set_position(chunk.end());

    crc(ctx, chunk, &type_name)?;
    if kind == ChunkType::Iend {
        state.iend = true;
    }
    Ok(())
}

/// Why a chunk cannot appear where it does, if it cannot
fn misplaced_reason(state: &PngState, kind: ChunkType) -> Option<&'static str> {
    let ihdr_seen = state.count(ChunkType::Ihdr) > 0;
    match kind {
        ChunkType::Ihdr if ihdr_seen => Some("duplicate IHDR"),
        ChunkType::Ihdr => None,
        _ if !ihdr_seen => Some("chunk before IHDR"),
        ChunkType::Plte if state.count(ChunkType::Plte) > 0 => Some("duplicate PLTE"),
        ChunkType::Plte if !state.idat.is_empty() => Some("PLTE after IDAT"),
        _ => None,
    }
}

fn crc(ctx: &mut Context<'_>, chunk: Chunk, type_name: &str) -> Result<()> {
    let stored = u32::from_be_bytes(ctx.cursor.read_array::<4>()?);
    let valid = !ctx.config.verify_checksums || {
        let covered = &ctx.data()[chunk.start - 4..chunk.end()];
        crc32fast::hash(covered) == stored
    };
    if !valid {
        ctx.tab(CHUNKS_TAB)
            .warning(format!("CRC mismatch in {type_name} chunk at {}", chunk.start - 8));
    }
    ctx.take(
        4,
        "CRC-32",
        if valid { ColorId::Accent7 } else { ColorId::Error },
    )?;
    Ok(())
}

/// Tags the concatenated IDAT data as one zlib stream
fn image_data(ctx: &mut Context<'_>, state: &PngState) {
    if state.idat.is_empty() {
        return;
    }
    let data = ctx.data();
    let stream: Vec<u8> = state
        .idat
        .iter()
        .flat_map(|&(offset, length)| &data[offset..offset + length])
        .copied()
        .collect();
    debug!("Decoding {} IDAT bytes from {} chunks", stream.len(), state.idat.len());

    let mut tagger = IdatChunkTagger::new(&state.idat);
    let inflated = zlib::tag_stream(ctx, &mut tagger, &stream);

    let expected = state.ihdr.and_then(|ihdr| ihdr.expected_image_size());
    let tab = ctx.tab(SUMMARY_TAB);
    tab.section("Image data")
        .entry("IDAT chunks", state.idat.len().to_string())
        .entry("Compressed size", stream.len().to_string());

    let Some(inflated) = inflated else {
        tab.warning("Image data could not be decompressed");
        return;
    };
    tab.entry("Decompressed size", inflated.data.len().to_string());
    if let Some(expected) = expected {
        tab.entry("Expected size", expected.to_string());
        if expected != inflated.data.len() as u64 {
            tab.warning(format!(
                "Decompressed image data is {} bytes, the header implies {}",
                inflated.data.len(),
                expected
            ));
        }
    }
    if let Some(blocks) = inflated.blocks {
        tab.entry("DEFLATE blocks", blocks.total().to_string())
            .entry("Stored blocks", blocks.stored.to_string())
            .entry("Fixed Huffman blocks", blocks.fixed.to_string())
            .entry("Dynamic Huffman blocks", blocks.dynamic.to_string());
    }
}

fn summary(ctx: &mut Context<'_>, state: &PngState) {
    let tab = ctx.tab(SUMMARY_TAB);
    if let Some(ihdr) = state.ihdr {
        tab.section("Image")
            .entry("Width", ihdr.width.to_string())
            .entry("Height", ihdr.height.to_string())
            .entry("Bit depth", ihdr.bit_depth.to_string())
            .entry("Color type", color_type_name(ihdr.color_type))
            .entry(
                "Interlace method",
                match ihdr.interlace {
                    0 => "None",
                    1 => "Adam7",
                    _ => "Invalid",
                },
            );
        if let Some(entries) = state.palette_entries {
            tab.entry("Palette entries", entries.to_string());
        }
    }

    tab.section("Chunk counts");
    for kind in ChunkType::ALL {
        let count = state.count(kind);
        if count > 0 {
            tab.entry(kind.tag(), count.to_string());
        }
    }
    if !state.iend {
        tab.warning("The file has no IEND chunk");
    }
    if state.count(ChunkType::Ihdr) > 0 && state.idat.is_empty() {
        tab.warning("The file has no IDAT chunk");
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    //! PNG builders shared by the chunk parser tests.

    use super::MAGIC;

    /// Encodes one chunk with a correct CRC
    pub(crate) fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() + 12);
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(kind);
        hasher.update(data);
        out.extend_from_slice(&hasher.finalize().to_be_bytes());
        out
    }

    pub(crate) fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
        chunk(b"IHDR", &data)
    }

    /// Signature followed by `chunks`
    pub(crate) fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        for chunk in chunks {
            out.extend_from_slice(chunk);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::testutil::chunk;
    use super::*;
    use crate::dispatch::{analyze, Dissector, DissectorConfig, Format};
    use crate::inflate::{BlockCounts, InflateError, Inflated, Inflater};
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// 2x2 8-bit grayscale, one filter byte per row
    fn tiny_png() -> Vec<u8> {
        png(&[
            ihdr(2, 2, 8, 0),
            chunk(b"IDAT", &zlib(&[0, 10, 20, 0, 30, 40])),
            chunk(b"IEND", &[]),
        ])
    }

    #[test]
    fn test_minimal_png() {
        let data = tiny_png();
        let analysis = analyze(&data);

        assert_eq!(analysis.format, Format::Png);
        assert!(!analysis.reconciled);
        assert_eq!(analysis.error_fields().count(), 0);
        assert!(analysis.uncovered().is_empty());
        assert_eq!(analysis.warnings().count(), 0);

        let summary = analysis.tab(SUMMARY_TAB).unwrap();
        assert_eq!(summary.value("Width"), Some("2"));
        assert_eq!(summary.value("Color type"), Some("Grayscale"));
        assert_eq!(summary.value("Decompressed size"), Some("6"));
        assert_eq!(summary.value("Expected size"), Some("6"));
        assert_eq!(summary.value("IEND"), Some("1"));
        assert_eq!(summary.value("DEFLATE blocks"), None);
    }

    #[test]
    fn test_expected_size_adam7() {
        let ihdr = Ihdr {
            width: 8,
            height: 8,
            bit_depth: 8,
            color_type: 2,
            interlace: 1,
        };
        // Pass sizes: 1x1, 1x1, 2x1, 2x2, 4x2, 4x4, 8x4
        let rows = [(1, 1), (1, 1), (2, 1), (2, 2), (4, 2), (4, 4), (8, 4)];
        let expected: u64 = rows.iter().map(|&(w, h)| (w * 3 + 1) * h).sum();
        assert_eq!(ihdr.expected_image_size(), Some(expected));

        let one_pixel = Ihdr {
            width: 1,
            height: 1,
            ..ihdr
        };
        assert_eq!(one_pixel.expected_image_size(), Some(4));

        let packed = Ihdr {
            width: 3,
            height: 2,
            bit_depth: 1,
            color_type: 0,
            interlace: 0,
        };
        assert_eq!(packed.expected_image_size(), Some(4));
    }

    #[test]
    fn test_truncated_chunk_terminates() {
        let mut data = tiny_png();
        data.truncate(8 + 25 + 10);
        let analysis = analyze(&data);

        // IDAT length and type are intact, its data is not
        let last = analysis.fields.last().unwrap();
        assert_eq!(last.name, UNRECOGNIZED);
        assert_eq!(last.range(), 41..43);
        assert_eq!(analysis.fields[analysis.fields.len() - 2].name, "Chunk type");
        assert!(analysis.uncovered().is_empty());
        assert!(analysis.warnings().any(|w| w.contains("IEND")));
    }

    #[test]
    fn test_data_after_iend() {
        let mut data = tiny_png();
        data.extend_from_slice(b"junk");
        let analysis = analyze(&data);

        let last = analysis.fields.last().unwrap();
        assert_eq!(last.name, "Data after IEND");
        assert_eq!(last.range(), data.len() - 4..data.len());
        assert!(last.is_error());
    }

    #[test]
    fn test_crc_mismatch() {
        let mut data = tiny_png();
        // Last byte of the IHDR CRC
        data[8 + 24] ^= 1;
        let analysis = analyze(&data);

        let crcs: Vec<&Field> = analysis.fields_named("CRC-32").collect();
        assert_eq!(crcs.len(), 3);
        assert!(crcs[0].is_error());
        assert!(!crcs[1].is_error());

        let lenient = Dissector::with_config(DissectorConfig::new().verify_checksums(false));
        assert_eq!(lenient.analyze(&data).error_fields().count(), 0);
    }

    #[test]
    fn test_chunk_before_ihdr() {
        let data = png(&[
            chunk(b"gAMA", &45455u32.to_be_bytes()),
            ihdr(1, 1, 8, 0),
            chunk(b"IEND", &[]),
        ]);
        let analysis = analyze(&data);

        let errors: Vec<&str> = analysis.error_fields().map(|f| f.name.as_ref()).collect();
        assert_eq!(errors, vec!["Chunk type", "gAMA data (chunk before IHDR)"]);
    }

    #[test]
    fn test_unknown_chunk() {
        let data = png(&[ihdr(1, 1, 8, 0), chunk(b"vpAg", &[1, 2, 3]), chunk(b"IEND", &[])]);
        let analysis = analyze(&data);

        let unknown = analysis.fields_named("Unknown chunk data").next().unwrap();
        assert_eq!(unknown.length, 3);
        assert!(unknown.is_error());
        assert_eq!(analysis.tab(SUMMARY_TAB).unwrap().value("unknown"), Some("1"));
    }

    /// Consumes a fixed number of bytes and reports block counts
    struct StubInflater {
        consumed: usize,
        output: Vec<u8>,
    }

    impl Inflater for StubInflater {
        fn inflate(&self, input: &[u8]) -> std::result::Result<Inflated, InflateError> {
            if input.len() < self.consumed {
                return Err(InflateError::Truncated);
            }
            Ok(Inflated {
                data: self.output.clone(),
                consumed: self.consumed,
                blocks: Some(BlockCounts {
                    stored: 1,
                    fixed: 0,
                    dynamic: 2,
                }),
            })
        }
    }

    #[test]
    fn test_idat_split_across_chunks() {
        let output = vec![0u8, 7];
        // CMF FLG | 5 bytes DEFLATE | Adler-32 | 1 stray byte = 12 bytes
        let mut stream = vec![0x78, 0x9C, 1, 2, 3, 4, 5];
        stream.extend_from_slice(&adler2::adler32_slice(&output).to_be_bytes());
        stream.push(0xEE);

        let data = png(&[
            ihdr(1, 1, 8, 0),
            chunk(b"IDAT", &stream[0..3]),
            chunk(b"IDAT", &stream[3..8]),
            chunk(b"IDAT", &stream[8..12]),
            chunk(b"IEND", &[]),
        ]);
        let dissector = Dissector::new().with_inflater(StubInflater { consumed: 5, output });
        let analysis = dissector.analyze(&data);

        // Data of the three IDAT chunks starts at 41, 56 and 73
        let spans = |name: &str| -> Vec<(usize, usize)> {
            analysis
                .fields_named(name)
                .map(|f| (f.offset, f.length))
                .collect()
        };
        assert_eq!(spans("Compression method and flags"), vec![(41, 1)]);
        assert_eq!(spans("Additional flags"), vec![(42, 1)]);
        assert_eq!(spans("Compressed data"), vec![(43, 1), (56, 4)]);
        assert_eq!(spans("Adler-32 checksum"), vec![(60, 1), (73, 3)]);
        assert_eq!(spans(UNRECOGNIZED), vec![(76, 1)]);
        assert!(analysis.uncovered().is_empty());

        let summary = analysis.tab(SUMMARY_TAB).unwrap();
        assert_eq!(summary.value("IDAT chunks"), Some("3"));
        assert_eq!(summary.value("DEFLATE blocks"), Some("3"));
        assert_eq!(summary.value("Dynamic Huffman blocks"), Some("2"));
    }

    #[test]
    fn test_idempotent() {
        let data = tiny_png();
        assert_eq!(analyze(&data), analyze(&data));
    }
}
