//! Textual chunks (tEXt, zTXt, iTXt) and the embedded ICC profile (iCCP).
//!
//! All four start with a NUL-terminated Latin-1 keyword of 1 to 79 bytes.
//! Compressed payloads run to the end of the chunk and are tagged as a zlib
//! stream.

use super::zlib::{self, LinearTagger};
use super::{Chunk, CHUNKS_TAB};
use crate::context::Context;
use crate::cursor::latin1;
use crate::error::{Error, Result};
use crate::field::ColorId;

const MAX_KEYWORD: usize = 79;

/// Longest text shown in a description tab
const PREVIEW_LEN: usize = 512;

/// Tags a NUL-terminated keyword and its terminator
pub(super) fn keyword(ctx: &mut Context<'_>, name: &'static str) -> Result<String> {
    let start = ctx.position();
    let rest = ctx.cursor.read(ctx.cursor.remaining())?;
    let Some(len) = rest.iter().position(|&b| b == 0) else {
        ctx.tag_remaining("Unterminated keyword", ColorId::Error);
        return Err(Error::malformed(start, format!("{name} has no NUL terminator")));
    };

    let valid = (1..=MAX_KEYWORD).contains(&len);
    ctx.take(len, name, if valid { ColorId::Accent1 } else { ColorId::Error })?;
    // An empty keyword has no bytes to color, so the separator carries the error
    let separator = if len == 0 { ColorId::Error } else { ColorId::Accent2 };
    ctx.take(1, "Null separator", separator)?;
    let keyword = latin1(&rest[..len]);
    if !valid {
        ctx.tab(CHUNKS_TAB)
            .warning(format!("{name} at {start} is {len} bytes, expected 1 to {MAX_KEYWORD}"));
    }
    Ok(keyword)
}

/// Tags a NUL-terminated UTF-8 string
fn utf8_string(ctx: &mut Context<'_>, name: &'static str, color: ColorId) -> Result<String> {
    let start = ctx.position();
    let rest = ctx.cursor.read(ctx.cursor.remaining())?;
    let Some(len) = rest.iter().position(|&b| b == 0) else {
        ctx.tag_remaining(format!("Unterminated {}", name.to_lowercase()), ColorId::Error);
        return Err(Error::malformed(start, format!("{name} has no NUL terminator")));
    };
    let value = std::str::from_utf8(&rest[..len]).map(str::to_string);
    ctx.take(len, name, if value.is_ok() { color } else { ColorId::Error })?;
    ctx.take(1, "Null separator", ColorId::Accent2)?;
    Ok(value.unwrap_or_else(|_| String::from_utf8_lossy(&rest[..len]).into_owned()))
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Compression method byte; only 0 (zlib) is defined
fn compression_method(ctx: &mut Context<'_>) -> Result<bool> {
    let method = ctx.cursor.read_array::<1>()?[0];
    ctx.take(
        1,
        "Compression method",
        if method == 0 { ColorId::Accent4 } else { ColorId::Error },
    )?;
    Ok(method == 0)
}

/// Tags the rest of the chunk as a zlib stream and returns the decoded bytes
fn compressed_rest(ctx: &mut Context<'_>) -> Result<Option<Vec<u8>>> {
    let base = ctx.position();
    let stream = ctx.cursor.read(ctx.cursor.remaining())?;
    let inflated = zlib::tag_stream(ctx, &mut LinearTagger { base }, stream);
    ctx.cursor.set_position(ctx.len());
    Ok(inflated.map(|inflated| inflated.data))
}

pub(super) fn text(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    let keyword = keyword(ctx, "Keyword")?;
    let body = ctx.cursor.read(ctx.cursor.remaining())?;
    ctx.tag_remaining("Text", ColorId::Accent3);

    ctx.tab(CHUNKS_TAB)
        .section(format!("tEXt @ {}", chunk.start - 8))
        .entry("Keyword", keyword)
        .text(preview(&latin1(body)));
    Ok(())
}

pub(super) fn ztxt(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    let keyword = keyword(ctx, "Keyword")?;
    let known_method = compression_method(ctx)?;
    let decoded = if known_method {
        compressed_rest(ctx)?
    } else {
        ctx.tag_remaining("Compressed text", ColorId::Error);
        None
    };

    let tab = ctx.tab(CHUNKS_TAB);
    tab.section(format!("zTXt @ {}", chunk.start - 8))
        .entry("Keyword", keyword);
    match decoded {
        Some(bytes) => tab.text(preview(&latin1(&bytes))),
        None => tab.warning("zTXt text could not be decompressed"),
    };
    Ok(())
}

pub(super) fn itxt(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    let keyword = keyword(ctx, "Keyword")?;
    let flag = ctx.cursor.read_array::<1>()?[0];
    ctx.take(
        1,
        "Compression flag",
        if flag <= 1 { ColorId::Accent3 } else { ColorId::Error },
    )?;
    let known_method = compression_method(ctx)?;
    let language = utf8_string(ctx, "Language tag", ColorId::Accent5)?;
    let translated = utf8_string(ctx, "Translated keyword", ColorId::Accent6)?;

    let decoded = match flag {
        0 => {
            let body = ctx.cursor.read(ctx.cursor.remaining())?.to_vec();
            ctx.tag_remaining("Text", ColorId::Accent7);
            Some(body)
        }
        1 if known_method => compressed_rest(ctx)?,
        _ => {
            ctx.tag_remaining("Compressed text", ColorId::Error);
            None
        }
    };

    let tab = ctx.tab(CHUNKS_TAB);
    tab.section(format!("iTXt @ {}", chunk.start - 8))
        .entry("Keyword", keyword)
        .entry("Language", language)
        .entry("Translated keyword", translated);
    match decoded {
        Some(bytes) => tab.text(preview(&String::from_utf8_lossy(&bytes))),
        None => tab.warning("iTXt text could not be decoded"),
    };
    Ok(())
}

pub(super) fn iccp(ctx: &mut Context<'_>, chunk: Chunk) -> Result<()> {
    let name = keyword(ctx, "Profile name")?;
    let known_method = compression_method(ctx)?;
    let profile = if known_method {
        compressed_rest(ctx)?
    } else {
        ctx.tag_remaining("Compressed profile", ColorId::Error);
        None
    };

    let tab = ctx.tab(CHUNKS_TAB);
    tab.section(format!("iCCP @ {}", chunk.start - 8))
        .entry("Profile name", name);
    match profile {
        Some(profile) => {
            tab.entry("Profile size", profile.len().to_string());
            if let Some(class) = profile.get(12..16) {
                tab.entry("Device class", latin1(class).trim_end().to_string());
            }
        }
        None => {
            tab.warning("ICC profile could not be decompressed");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testutil::*;
    use crate::dispatch::analyze;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn with_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        png(&[ihdr(1, 1, 8, 0), chunk(kind, data), chunk(b"IEND", &[])])
    }

    #[test]
    fn test_text_chunk() {
        let analysis = analyze(&with_chunk(b"tEXt", b"Title\0Caf\xe9"));
        assert_eq!(analysis.error_fields().count(), 0);
        let tab = analysis.tab("Chunks").unwrap();
        assert_eq!(tab.value("Keyword"), Some("Title"));
        assert!(tab.lines.contains(&crate::Line::Text("Caf\u{e9}".to_string())));
    }

    #[test]
    fn test_keyword_limits() {
        let empty = analyze(&with_chunk(b"tEXt", b"\0text"));
        let errors: Vec<_> = empty.error_fields().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "Null separator");
        assert_eq!(errors[0].length, 1);
        assert!(empty.warnings().any(|w| w.contains("0 bytes")));

        let mut long = vec![b'k'; 80];
        long.extend_from_slice(b"\0text");
        let analysis = analyze(&with_chunk(b"tEXt", &long));
        let keyword = analysis.fields_named("Keyword").next().unwrap();
        assert!(keyword.is_error());
        assert_eq!(keyword.length, 80);
    }

    #[test]
    fn test_unterminated_keyword() {
        let analysis = analyze(&with_chunk(b"tEXt", b"NoTerminator"));
        let field = analysis.fields_named("Unterminated keyword").next().unwrap();
        assert_eq!(field.length, 12);
        assert!(analysis.uncovered().is_empty());
    }

    #[test]
    fn test_ztxt_with_trailing_bytes() {
        let mut data = b"Comment\0\0".to_vec();
        data.extend_from_slice(&zlib(b"compressed comment"));
        data.extend_from_slice(b"??");
        let analysis = analyze(&with_chunk(b"zTXt", &data));

        let tab = analysis.tab("Chunks").unwrap();
        assert!(tab
            .lines
            .contains(&crate::Line::Text("compressed comment".to_string())));
        let errors: Vec<(&str, usize)> = analysis
            .error_fields()
            .map(|f| (f.name.as_ref(), f.length))
            .collect();
        assert_eq!(errors, vec![("Unrecognized data", 2)]);
        assert!(analysis.uncovered().is_empty());
    }

    #[test]
    fn test_itxt_compressed_and_plain() {
        let mut compressed = b"Author\0\x01\0en\0Auteur\0".to_vec();
        compressed.extend_from_slice(&zlib("Zoë".as_bytes()));
        let analysis = analyze(&with_chunk(b"iTXt", &compressed));
        assert_eq!(analysis.error_fields().count(), 0);
        let tab = analysis.tab("Chunks").unwrap();
        assert_eq!(tab.value("Language"), Some("en"));
        assert_eq!(tab.value("Translated keyword"), Some("Auteur"));
        assert!(tab.lines.contains(&crate::Line::Text("Zoë".to_string())));

        let plain = b"Author\0\0\0\0\0plain";
        let analysis = analyze(&with_chunk(b"iTXt", plain));
        assert_eq!(analysis.error_fields().count(), 0);
        assert_eq!(analysis.fields_named("Text").next().unwrap().length, 5);
    }

    #[test]
    fn test_iccp_inflate_failure() {
        let analysis = analyze(&with_chunk(b"iCCP", b"sRGB\0\0\x78\x9c\xff\xff\xff"));
        let failed = analysis
            .fields_named("Compressed data (inflate failed)")
            .next()
            .unwrap();
        assert_eq!(failed.length, 3);
        assert!(analysis.warnings().any(|w| w.contains("ICC profile")));
    }
}
