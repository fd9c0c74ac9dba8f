//! Properties every analyzer has to hold, checked through the public API.

use dissekt_core::{analyze, Analysis, Dissector, Format};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use std::io::Write;

/// ELF64 little-endian header without tables, plus 16 trailing bytes
fn elf() -> Vec<u8> {
    let mut out = vec![0x7f, b'E', b'L', b'F', 2, 1, 1, 0, 0];
    out.resize(16, 0);
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&62u16.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0x401000u64.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    for half in [64u16, 56, 0, 64, 0, 0] {
        out.extend_from_slice(&half.to_le_bytes());
    }
    out.resize(80, 0xcc);
    out
}

fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
    out
}

/// 1x1 8-bit grayscale PNG with a text chunk
fn png() -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&[0, 0x7f]).unwrap();
    let idat = encoder.finish().unwrap();

    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&1u32.to_be_bytes());
    ihdr.extend_from_slice(&1u32.to_be_bytes());
    ihdr.extend_from_slice(&[8, 0, 0, 0, 0]);

    let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
    out.extend(png_chunk(b"IHDR", &ihdr));
    out.extend(png_chunk(b"tEXt", b"Title\0Test"));
    out.extend(png_chunk(b"IDAT", &idat));
    out.extend(png_chunk(b"IEND", &[]));
    out
}

/// Little-endian TIFF: one IFD with ImageWidth and an out-of-line Make
fn tiff() -> Vec<u8> {
    let mut out = b"II\x2a\x00".to_vec();
    out.extend_from_slice(&8u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    // ImageWidth, SHORT x 1
    out.extend_from_slice(&0x0100u16.to_le_bytes());
    out.extend_from_slice(&3u16.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&[1, 0, 0, 0]);
    // Make, ASCII x 6 at 38
    out.extend_from_slice(&0x010Fu16.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&6u32.to_le_bytes());
    out.extend_from_slice(&38u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(b"Nikon\0");
    out
}

/// ustar archive with one file and both end-of-archive blocks
fn tar() -> Vec<u8> {
    fn put(header: &mut [u8], at: usize, bytes: &[u8]) {
        header[at..at + bytes.len()].copy_from_slice(bytes);
    }

    let content = b"hello\n";
    let mut header = [0u8; 512];
    put(&mut header, 0, b"hello.txt");
    put(&mut header, 100, b"0000644\0");
    put(&mut header, 108, b"0001750\0");
    put(&mut header, 116, b"0001750\0");
    put(&mut header, 124, format!("{:011o}\0", content.len()).as_bytes());
    put(&mut header, 136, b"14524770400\0");
    put(&mut header, 148, b"        ");
    header[156] = b'0';
    put(&mut header, 257, b"ustar\0");
    put(&mut header, 263, b"00");
    let sum: u32 = header.iter().map(|&b| u32::from(b)).sum();
    put(&mut header, 148, format!("{sum:06o}\0 ").as_bytes());

    let mut out = header.to_vec();
    out.extend_from_slice(content);
    out.resize(2048, 0);
    out
}

fn samples() -> Vec<(&'static str, Format, Vec<u8>)> {
    vec![
        ("elf", Format::Elf, elf()),
        ("png", Format::Png, png()),
        ("tiff", Format::Tiff, tiff()),
        ("tar", Format::Tar, tar()),
    ]
}

fn assert_covered(analysis: &Analysis, what: &str) {
    assert!(
        analysis.uncovered().is_empty(),
        "{what}: uncovered {:?}",
        analysis.uncovered()
    );
}

#[test]
fn test_samples_are_detected_and_covered() {
    for (name, format, data) in samples() {
        let analysis = analyze(&data);
        assert_eq!(analysis.format, format, "{name}");
        assert_eq!(analysis.len, data.len());
        assert_covered(&analysis, name);
    }
}

#[test]
fn test_samples_have_no_error_fields() {
    for (name, _, data) in samples() {
        let analysis = analyze(&data);
        let errors: Vec<_> = analysis.error_fields().collect();
        assert!(errors.is_empty(), "{name}: {errors:?}");
    }
}

#[test]
fn test_every_truncation_is_covered() {
    for (name, _, data) in samples() {
        for len in 0..=data.len() {
            let analysis = analyze(&data[..len]);
            assert_covered(&analysis, &format!("{name} truncated to {len}"));
        }
    }
}

#[test]
fn test_every_single_byte_corruption_is_covered() {
    for (name, _, data) in samples() {
        for at in 0..data.len() {
            for flip in [0xff, 0x80, 0x01] {
                let mut corrupt = data.clone();
                corrupt[at] ^= flip;
                let analysis = analyze(&corrupt);
                assert_covered(&analysis, &format!("{name} with byte {at} ^ {flip:#x}"));
            }
        }
    }
}

#[test]
fn test_empty_buffer() {
    let analysis = analyze(&[]);
    assert_eq!(analysis.format, Format::Unknown);
    assert!(analysis.fields.is_empty());
    assert!(analysis.uncovered().is_empty());
}

#[test]
fn test_analysis_is_idempotent_across_interleaved_buffers() {
    let dissector = Dissector::new();
    let samples = samples();
    let first: Vec<Analysis> = samples.iter().map(|(_, _, data)| dissector.analyze(data)).collect();

    // Run them again in reverse, interleaved with an unrelated buffer
    let noise: Vec<u8> = (0..=255).collect();
    for (index, (name, _, data)) in samples.iter().enumerate().rev() {
        dissector.analyze(&noise);
        let again = dissector.analyze(data);
        assert_eq!(again, first[index], "{name}");
        assert_eq!(analyze(data), first[index], "{name} with a fresh dissector");
    }
}

#[test]
fn test_fields_are_sorted_by_offset() {
    for (name, _, data) in samples() {
        let analysis = analyze(&data);
        let offsets: Vec<usize> = analysis.fields.iter().map(|f| f.offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted, "{name}");
    }
}

#[test]
fn test_only_offset_following_formats_reconcile() {
    for (name, format, data) in samples() {
        assert_eq!(analyze(&data).reconciled, format.reconciles(), "{name}");
    }
}
