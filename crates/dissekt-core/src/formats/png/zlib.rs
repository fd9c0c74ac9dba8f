//! zlib stream tagging.
//!
//! A zlib stream is `CMF FLG <raw DEFLATE> ADLER32`. The same stream layout
//! shows up inside one chunk (zTXt, iTXt, iCCP) and spread over many (IDAT),
//! so the walk works on logical offsets into the stream bytes and leaves
//! placing them in the file to a [`SpanTagger`].

use crate::context::{Context, UNRECOGNIZED};
use crate::field::{ColorId, Field};
use crate::inflate::Inflated;
use tracing::debug;

pub(super) const INFLATE_FAILED: &str = "Compressed data (inflate failed)";

/// Places logical stream spans in the file
pub(super) trait SpanTagger {
    /// Tags `len` stream bytes starting at logical offset `start`
    fn tag(
        &mut self,
        ctx: &mut Context<'_>,
        start: usize,
        len: usize,
        name: &'static str,
        color: ColorId,
    );
}

/// Stream stored contiguously at `base`
pub(super) struct LinearTagger {
    pub(super) base: usize,
}

impl SpanTagger for LinearTagger {
    fn tag(
        &mut self,
        ctx: &mut Context<'_>,
        start: usize,
        len: usize,
        name: &'static str,
        color: ColorId,
    ) {
        ctx.emit(Field::new(self.base + start, len, name, color));
    }
}

/// Stream split over the data of several IDAT chunks
///
/// A span crossing a chunk boundary becomes one field per chunk, so no
/// field ever covers a chunk's CRC, length or type.
pub(super) struct IdatChunkTagger<'c> {
    chunks: &'c [(usize, usize)],
}

impl<'c> IdatChunkTagger<'c> {
    /// `chunks` holds `(file offset, length)` of each chunk's data, in
    /// stream order
    pub(super) fn new(chunks: &'c [(usize, usize)]) -> Self {
        Self { chunks }
    }
}

impl SpanTagger for IdatChunkTagger<'_> {
    fn tag(
        &mut self,
        ctx: &mut Context<'_>,
        start: usize,
        len: usize,
        name: &'static str,
        color: ColorId,
    ) {
        let end = start + len;
        let mut logical = 0;
        for &(offset, length) in self.chunks {
            let chunk_end = logical + length;
            let from = start.max(logical);
            let to = end.min(chunk_end);
            if from < to {
                ctx.emit(Field::new(offset + (from - logical), to - from, name, color));
            }
            if chunk_end >= end {
                break;
            }
            logical = chunk_end;
        }
    }
}

/// Tags a zlib stream and returns its decoded contents
///
/// Returns `None` when the header is unusable or DEFLATE decoding fails; the
/// stream is tagged either way.
pub(super) fn tag_stream(
    ctx: &mut Context<'_>,
    tagger: &mut impl SpanTagger,
    stream: &[u8],
) -> Option<Inflated> {
    if stream.len() < 2 {
        tagger.tag(ctx, 0, stream.len(), UNRECOGNIZED, ColorId::Error);
        return None;
    }

    let (cmf, flg) = (stream[0], stream[1]);
    let method_ok = cmf & 0x0F == 8 && cmf >> 4 <= 7;
    let check_ok = (u16::from(cmf) << 8 | u16::from(flg)) % 31 == 0;
    let preset_dictionary = flg & 0x20 != 0;

    tagger.tag(
        ctx,
        0,
        1,
        "Compression method and flags",
        if method_ok { ColorId::Accent1 } else { ColorId::Error },
    );
    tagger.tag(
        ctx,
        1,
        1,
        "Additional flags",
        if check_ok && !preset_dictionary { ColorId::Accent2 } else { ColorId::Error },
    );

    if !method_ok || preset_dictionary {
        debug!("Unsupported zlib header {:02x} {:02x}", cmf, flg);
        tagger.tag(ctx, 2, stream.len() - 2, INFLATE_FAILED, ColorId::Error);
        return None;
    }

    let payload = &stream[2..];
    let inflated = match ctx.inflater.inflate(payload) {
        Ok(inflated) => inflated,
        Err(err) => {
            debug!("Inflate failed: {}", err);
            tagger.tag(ctx, 2, payload.len(), INFLATE_FAILED, ColorId::Error);
            return None;
        }
    };

    let consumed = inflated.consumed.min(payload.len());
    tagger.tag(ctx, 2, consumed, "Compressed data", ColorId::Accent3);

    let checksum_at = 2 + consumed;
    let rest = stream.len() - checksum_at;
    if rest < 4 {
        tagger.tag(ctx, checksum_at, rest, "Truncated Adler-32 checksum", ColorId::Error);
        return Some(inflated);
    }

    let stored = u32::from_be_bytes([
        stream[checksum_at],
        stream[checksum_at + 1],
        stream[checksum_at + 2],
        stream[checksum_at + 3],
    ]);
    let valid = !ctx.config.verify_checksums || stored == adler2::adler32_slice(&inflated.data);
    tagger.tag(
        ctx,
        checksum_at,
        4,
        "Adler-32 checksum",
        if valid { ColorId::Accent4 } else { ColorId::Error },
    );
    tagger.tag(ctx, checksum_at + 4, rest - 4, UNRECOGNIZED, ColorId::Error);
    Some(inflated)
}
