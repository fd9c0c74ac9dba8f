//! Tag tables.
//!
//! Each directory kind has a static table sorted by tag id. A [`TagSpec`]
//! says which field types and counts are legal and how to interpret the
//! value; the walker never matches on tag numbers itself.

use super::entry::FieldType;
use super::{exif, gps};

pub(super) const BYTE: &[FieldType] = &[FieldType::Byte];
pub(super) const ASCII: &[FieldType] = &[FieldType::Ascii];
pub(super) const SHORT: &[FieldType] = &[FieldType::Short];
pub(super) const LONG: &[FieldType] = &[FieldType::Long];
pub(super) const SHORT_LONG: &[FieldType] = &[FieldType::Short, FieldType::Long];
pub(super) const RATIONAL: &[FieldType] = &[FieldType::Rational];
pub(super) const SRATIONAL: &[FieldType] = &[FieldType::SRational];
pub(super) const UNDEFINED: &[FieldType] = &[FieldType::Undefined];

/// Which table an IFD is read against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Directory {
    /// Main image directory, numbered along the IFD chain
    Tiff(usize),
    Exif,
    Gps,
}

impl Directory {
    pub(super) fn title(self) -> String {
        match self {
            Directory::Tiff(index) => format!("IFD {index}"),
            Directory::Exif => "Exif".to_string(),
            Directory::Gps => "GPSInfo".to_string(),
        }
    }

    fn table(self) -> &'static [TagSpec] {
        match self {
            Directory::Tiff(_) => TIFF_TAGS,
            Directory::Exif => exif::EXIF_TAGS,
            Directory::Gps => gps::GPS_TAGS,
        }
    }

    pub(super) fn lookup(self, tag: u16) -> Option<&'static TagSpec> {
        let table = self.table();
        table
            .binary_search_by_key(&tag, |spec| spec.id)
            .ok()
            .map(|index| &table[index])
    }
}

/// How a tag's value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Kind {
    /// Plain rendering of the decoded values
    Plain,
    /// Text, NUL-trimmed
    Ascii,
    /// Single value with named meanings
    Enum(&'static [(u32, &'static str)]),
    PageNumber,
    YCbCrSubSampling,
    YCbCrCoefficients,
    ReferenceBlackWhite,
    Flash,
    /// Four ASCII digits, checked against known versions
    Version(&'static [(&'static [u8; 4], &'static str)]),
    ComponentsConfiguration,
    /// One byte with named meanings
    ByteEnum(&'static [(u8, &'static str)]),
    /// 8-byte character code, then text
    UserComment,
    /// Vendor or sensor data shown only by size
    Opaque,
    StripOffsets,
    StripByteCounts,
    JpegOffset,
    JpegLength,
    /// Offset of a nested directory
    SubIfd(Directory),
    GpsVersion,
    GpsCoordinate,
    GpsTimeStamp,
}

/// Static description of one tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct TagSpec {
    pub(super) id: u16,
    pub(super) name: &'static str,
    pub(super) types: &'static [FieldType],
    /// Required count, if the tag has a fixed one
    pub(super) count: Option<u32>,
    pub(super) kind: Kind,
}

pub(super) const fn tag(
    id: u16,
    name: &'static str,
    types: &'static [FieldType],
    count: Option<u32>,
    kind: Kind,
) -> TagSpec {
    TagSpec {
        id,
        name,
        types,
        count,
        kind,
    }
}

const COMPRESSION: &[(u32, &str)] = &[
    (1, "Uncompressed"),
    (2, "CCITT modified Huffman RLE"),
    (3, "CCITT Group 3 fax"),
    (4, "CCITT Group 4 fax"),
    (5, "LZW"),
    (6, "JPEG (old-style)"),
    (7, "JPEG"),
    (8, "Deflate (Adobe)"),
    (32773, "PackBits"),
    (32946, "Deflate"),
];

const PHOTOMETRIC: &[(u32, &str)] = &[
    (0, "WhiteIsZero"),
    (1, "BlackIsZero"),
    (2, "RGB"),
    (3, "Palette color"),
    (4, "Transparency mask"),
    (5, "CMYK"),
    (6, "YCbCr"),
    (8, "CIE L*a*b*"),
];

const SUBFILE_TYPE: &[(u32, &str)] = &[
    (1, "Full-resolution image"),
    (2, "Reduced-resolution image"),
    (3, "Single page of a multi-page image"),
];

const THRESHHOLDING: &[(u32, &str)] = &[
    (1, "No dithering or halftoning"),
    (2, "Ordered dither or halftone"),
    (3, "Randomized process"),
];

const FILL_ORDER: &[(u32, &str)] = &[
    (1, "Most significant bit first"),
    (2, "Least significant bit first"),
];

const ORIENTATION: &[(u32, &str)] = &[
    (1, "Top-left"),
    (2, "Top-right"),
    (3, "Bottom-right"),
    (4, "Bottom-left"),
    (5, "Left-top"),
    (6, "Right-top"),
    (7, "Right-bottom"),
    (8, "Left-bottom"),
];

const PLANAR_CONFIGURATION: &[(u32, &str)] = &[(1, "Chunky"), (2, "Planar")];

pub(super) const RESOLUTION_UNIT: &[(u32, &str)] =
    &[(1, "No unit"), (2, "Inch"), (3, "Centimeter")];

const PREDICTOR: &[(u32, &str)] = &[
    (1, "None"),
    (2, "Horizontal differencing"),
    (3, "Floating point"),
];

const EXTRA_SAMPLES: &[(u32, &str)] = &[
    (0, "Unspecified"),
    (1, "Associated alpha"),
    (2, "Unassociated alpha"),
];

const YCBCR_POSITIONING: &[(u32, &str)] = &[(1, "Centered"), (2, "Co-sited")];

/// Baseline and extension TIFF tags, sorted by id
pub(super) const TIFF_TAGS: &[TagSpec] = &[
    tag(0x00FE, "NewSubfileType", LONG, Some(1), Kind::Plain),
    tag(0x00FF, "SubfileType", SHORT, Some(1), Kind::Enum(SUBFILE_TYPE)),
    tag(0x0100, "ImageWidth", SHORT_LONG, Some(1), Kind::Plain),
    tag(0x0101, "ImageLength", SHORT_LONG, Some(1), Kind::Plain),
    tag(0x0102, "BitsPerSample", SHORT, None, Kind::Plain),
    tag(0x0103, "Compression", SHORT, Some(1), Kind::Enum(COMPRESSION)),
    tag(0x0106, "PhotometricInterpretation", SHORT, Some(1), Kind::Enum(PHOTOMETRIC)),
    tag(0x0107, "Threshholding", SHORT, Some(1), Kind::Enum(THRESHHOLDING)),
    tag(0x010A, "FillOrder", SHORT, Some(1), Kind::Enum(FILL_ORDER)),
    tag(0x010D, "DocumentName", ASCII, None, Kind::Ascii),
    tag(0x010E, "ImageDescription", ASCII, None, Kind::Ascii),
    tag(0x010F, "Make", ASCII, None, Kind::Ascii),
    tag(0x0110, "Model", ASCII, None, Kind::Ascii),
    tag(0x0111, "StripOffsets", SHORT_LONG, None, Kind::StripOffsets),
    tag(0x0112, "Orientation", SHORT, Some(1), Kind::Enum(ORIENTATION)),
    tag(0x0115, "SamplesPerPixel", SHORT, Some(1), Kind::Plain),
    tag(0x0116, "RowsPerStrip", SHORT_LONG, Some(1), Kind::Plain),
    tag(0x0117, "StripByteCounts", SHORT_LONG, None, Kind::StripByteCounts),
    tag(0x0118, "MinSampleValue", SHORT, None, Kind::Plain),
    tag(0x0119, "MaxSampleValue", SHORT, None, Kind::Plain),
    tag(0x011A, "XResolution", RATIONAL, Some(1), Kind::Plain),
    tag(0x011B, "YResolution", RATIONAL, Some(1), Kind::Plain),
    tag(0x011C, "PlanarConfiguration", SHORT, Some(1), Kind::Enum(PLANAR_CONFIGURATION)),
    tag(0x011D, "PageName", ASCII, None, Kind::Ascii),
    tag(0x0128, "ResolutionUnit", SHORT, Some(1), Kind::Enum(RESOLUTION_UNIT)),
    tag(0x0129, "PageNumber", SHORT, Some(2), Kind::PageNumber),
    tag(0x012D, "TransferFunction", SHORT, None, Kind::Plain),
    tag(0x0131, "Software", ASCII, None, Kind::Ascii),
    tag(0x0132, "DateTime", ASCII, Some(20), Kind::Ascii),
    tag(0x013B, "Artist", ASCII, None, Kind::Ascii),
    tag(0x013C, "HostComputer", ASCII, None, Kind::Ascii),
    tag(0x013D, "Predictor", SHORT, Some(1), Kind::Enum(PREDICTOR)),
    tag(0x013E, "WhitePoint", RATIONAL, Some(2), Kind::Plain),
    tag(0x013F, "PrimaryChromaticities", RATIONAL, Some(6), Kind::Plain),
    tag(0x0140, "ColorMap", SHORT, None, Kind::Plain),
    tag(0x0152, "ExtraSamples", SHORT, None, Kind::Enum(EXTRA_SAMPLES)),
    tag(0x0201, "JPEGInterchangeFormat", LONG, Some(1), Kind::JpegOffset),
    tag(0x0202, "JPEGInterchangeFormatLength", LONG, Some(1), Kind::JpegLength),
    tag(0x0211, "YCbCrCoefficients", RATIONAL, Some(3), Kind::YCbCrCoefficients),
    tag(0x0212, "YCbCrSubSampling", SHORT, Some(2), Kind::YCbCrSubSampling),
    tag(0x0213, "YCbCrPositioning", SHORT, Some(1), Kind::Enum(YCBCR_POSITIONING)),
    tag(0x0214, "ReferenceBlackWhite", RATIONAL, Some(6), Kind::ReferenceBlackWhite),
    tag(0x8298, "Copyright", ASCII, None, Kind::Ascii),
    tag(0x8769, "ExifIFD", LONG, Some(1), Kind::SubIfd(Directory::Exif)),
    tag(0x8825, "GPSInfoIFD", LONG, Some(1), Kind::SubIfd(Directory::Gps)),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sorted(table: &[TagSpec]) {
        for pair in table.windows(2) {
            assert!(
                pair[0].id < pair[1].id,
                "{} (0x{:04x}) must come after {} (0x{:04x})",
                pair[1].name,
                pair[1].id,
                pair[0].name,
                pair[0].id
            );
        }
    }

    #[test]
    fn test_tables_sorted() {
        assert_sorted(TIFF_TAGS);
        assert_sorted(exif::EXIF_TAGS);
        assert_sorted(gps::GPS_TAGS);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(Directory::Tiff(0).lookup(0x0100).map(|s| s.name), Some("ImageWidth"));
        assert_eq!(Directory::Exif.lookup(0x9209).map(|s| s.name), Some("Flash"));
        assert_eq!(Directory::Gps.lookup(0x0002).map(|s| s.name), Some("GPSLatitude"));
        assert!(Directory::Tiff(1).lookup(0x9209).is_none());
    }
}
