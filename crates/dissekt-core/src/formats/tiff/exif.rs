//! Exif private IFD tags (Exif 2.32).

use super::tags::{
    tag, Kind, TagSpec, ASCII, LONG, RATIONAL, SHORT, SHORT_LONG, SRATIONAL, UNDEFINED,
};

const EXPOSURE_PROGRAM: &[(u32, &str)] = &[
    (0, "Not defined"),
    (1, "Manual"),
    (2, "Normal program"),
    (3, "Aperture priority"),
    (4, "Shutter priority"),
    (5, "Creative program"),
    (6, "Action program"),
    (7, "Portrait mode"),
    (8, "Landscape mode"),
];

const SENSITIVITY_TYPE: &[(u32, &str)] = &[
    (0, "Unknown"),
    (1, "Standard output sensitivity"),
    (2, "Recommended exposure index"),
    (3, "ISO speed"),
    (4, "Standard output sensitivity and recommended exposure index"),
    (5, "Standard output sensitivity and ISO speed"),
    (6, "Recommended exposure index and ISO speed"),
    (7, "Standard output sensitivity, recommended exposure index and ISO speed"),
];

const METERING_MODE: &[(u32, &str)] = &[
    (0, "Unknown"),
    (1, "Average"),
    (2, "Center-weighted average"),
    (3, "Spot"),
    (4, "Multi-spot"),
    (5, "Pattern"),
    (6, "Partial"),
    (255, "Other"),
];

const LIGHT_SOURCE: &[(u32, &str)] = &[
    (0, "Unknown"),
    (1, "Daylight"),
    (2, "Fluorescent"),
    (3, "Tungsten"),
    (4, "Flash"),
    (9, "Fine weather"),
    (10, "Cloudy weather"),
    (11, "Shade"),
    (12, "Daylight fluorescent"),
    (13, "Day white fluorescent"),
    (14, "Cool white fluorescent"),
    (15, "White fluorescent"),
    (16, "Warm white fluorescent"),
    (17, "Standard light A"),
    (18, "Standard light B"),
    (19, "Standard light C"),
    (20, "D55"),
    (21, "D65"),
    (22, "D75"),
    (23, "D50"),
    (24, "ISO studio tungsten"),
    (255, "Other"),
];

const COLOR_SPACE: &[(u32, &str)] = &[(1, "sRGB"), (0xFFFF, "Uncalibrated")];

const FOCAL_PLANE_UNIT: &[(u32, &str)] = &[(1, "No unit"), (2, "Inch"), (3, "Centimeter")];

const SENSING_METHOD: &[(u32, &str)] = &[
    (1, "Not defined"),
    (2, "One-chip color area sensor"),
    (3, "Two-chip color area sensor"),
    (4, "Three-chip color area sensor"),
    (5, "Color sequential area sensor"),
    (7, "Trilinear sensor"),
    (8, "Color sequential linear sensor"),
];

const CUSTOM_RENDERED: &[(u32, &str)] = &[(0, "Normal process"), (1, "Custom process")];

const EXPOSURE_MODE: &[(u32, &str)] = &[
    (0, "Auto exposure"),
    (1, "Manual exposure"),
    (2, "Auto bracket"),
];

const WHITE_BALANCE: &[(u32, &str)] = &[(0, "Auto white balance"), (1, "Manual white balance")];

const SCENE_CAPTURE_TYPE: &[(u32, &str)] = &[
    (0, "Standard"),
    (1, "Landscape"),
    (2, "Portrait"),
    (3, "Night scene"),
];

const GAIN_CONTROL: &[(u32, &str)] = &[
    (0, "None"),
    (1, "Low gain up"),
    (2, "High gain up"),
    (3, "Low gain down"),
    (4, "High gain down"),
];

const CONTRAST: &[(u32, &str)] = &[(0, "Normal"), (1, "Soft"), (2, "Hard")];

const SATURATION: &[(u32, &str)] = &[(0, "Normal"), (1, "Low saturation"), (2, "High saturation")];

const SUBJECT_DISTANCE_RANGE: &[(u32, &str)] = &[
    (0, "Unknown"),
    (1, "Macro"),
    (2, "Close view"),
    (3, "Distant view"),
];

const EXIF_VERSIONS: &[(&[u8; 4], &str)] = &[
    (b"0110", "Exif 1.1"),
    (b"0120", "Exif 1.2"),
    (b"0200", "Exif 2.0"),
    (b"0210", "Exif 2.1"),
    (b"0220", "Exif 2.2"),
    (b"0221", "Exif 2.21"),
    (b"0230", "Exif 2.3"),
    (b"0231", "Exif 2.31"),
    (b"0232", "Exif 2.32"),
    (b"0300", "Exif 3.0"),
];

const FLASHPIX_VERSIONS: &[(&[u8; 4], &str)] =
    &[(b"0100", "Flashpix 1.0"), (b"0101", "Flashpix 1.01")];

const FILE_SOURCE: &[(u8, &str)] = &[
    (0, "Others"),
    (1, "Scanner of transparent type"),
    (2, "Scanner of reflex type"),
    (3, "Digital still camera"),
];

const SCENE_TYPE: &[(u8, &str)] = &[(1, "Directly photographed")];

/// Exif tags, sorted by id
pub(super) const EXIF_TAGS: &[TagSpec] = &[
    tag(0x829A, "ExposureTime", RATIONAL, Some(1), Kind::Plain),
    tag(0x829D, "FNumber", RATIONAL, Some(1), Kind::Plain),
    tag(0x8822, "ExposureProgram", SHORT, Some(1), Kind::Enum(EXPOSURE_PROGRAM)),
    tag(0x8824, "SpectralSensitivity", ASCII, None, Kind::Ascii),
    tag(0x8827, "PhotographicSensitivity", SHORT, None, Kind::Plain),
    tag(0x8830, "SensitivityType", SHORT, Some(1), Kind::Enum(SENSITIVITY_TYPE)),
    tag(0x9000, "ExifVersion", UNDEFINED, Some(4), Kind::Version(EXIF_VERSIONS)),
    tag(0x9003, "DateTimeOriginal", ASCII, Some(20), Kind::Ascii),
    tag(0x9004, "DateTimeDigitized", ASCII, Some(20), Kind::Ascii),
    tag(0x9010, "OffsetTime", ASCII, Some(7), Kind::Ascii),
    tag(0x9011, "OffsetTimeOriginal", ASCII, Some(7), Kind::Ascii),
    tag(0x9012, "OffsetTimeDigitized", ASCII, Some(7), Kind::Ascii),
    tag(0x9101, "ComponentsConfiguration", UNDEFINED, Some(4), Kind::ComponentsConfiguration),
    tag(0x9102, "CompressedBitsPerPixel", RATIONAL, Some(1), Kind::Plain),
    tag(0x9201, "ShutterSpeedValue", SRATIONAL, Some(1), Kind::Plain),
    tag(0x9202, "ApertureValue", RATIONAL, Some(1), Kind::Plain),
    tag(0x9203, "BrightnessValue", SRATIONAL, Some(1), Kind::Plain),
    tag(0x9204, "ExposureBiasValue", SRATIONAL, Some(1), Kind::Plain),
    tag(0x9205, "MaxApertureValue", RATIONAL, Some(1), Kind::Plain),
    tag(0x9206, "SubjectDistance", RATIONAL, Some(1), Kind::Plain),
    tag(0x9207, "MeteringMode", SHORT, Some(1), Kind::Enum(METERING_MODE)),
    tag(0x9208, "LightSource", SHORT, Some(1), Kind::Enum(LIGHT_SOURCE)),
    tag(0x9209, "Flash", SHORT, Some(1), Kind::Flash),
    tag(0x920A, "FocalLength", RATIONAL, Some(1), Kind::Plain),
    tag(0x9214, "SubjectArea", SHORT, None, Kind::Plain),
    tag(0x927C, "MakerNote", UNDEFINED, None, Kind::Opaque),
    tag(0x9286, "UserComment", UNDEFINED, None, Kind::UserComment),
    tag(0x9290, "SubSecTime", ASCII, None, Kind::Ascii),
    tag(0x9291, "SubSecTimeOriginal", ASCII, None, Kind::Ascii),
    tag(0x9292, "SubSecTimeDigitized", ASCII, None, Kind::Ascii),
    tag(0xA000, "FlashpixVersion", UNDEFINED, Some(4), Kind::Version(FLASHPIX_VERSIONS)),
    tag(0xA001, "ColorSpace", SHORT, Some(1), Kind::Enum(COLOR_SPACE)),
    tag(0xA002, "PixelXDimension", SHORT_LONG, Some(1), Kind::Plain),
    tag(0xA003, "PixelYDimension", SHORT_LONG, Some(1), Kind::Plain),
    tag(0xA004, "RelatedSoundFile", ASCII, Some(13), Kind::Ascii),
    tag(0xA005, "InteroperabilityIFD", LONG, Some(1), Kind::Plain),
    tag(0xA20E, "FocalPlaneXResolution", RATIONAL, Some(1), Kind::Plain),
    tag(0xA20F, "FocalPlaneYResolution", RATIONAL, Some(1), Kind::Plain),
    tag(0xA210, "FocalPlaneResolutionUnit", SHORT, Some(1), Kind::Enum(FOCAL_PLANE_UNIT)),
    tag(0xA215, "ExposureIndex", RATIONAL, Some(1), Kind::Plain),
    tag(0xA217, "SensingMethod", SHORT, Some(1), Kind::Enum(SENSING_METHOD)),
    tag(0xA300, "FileSource", UNDEFINED, Some(1), Kind::ByteEnum(FILE_SOURCE)),
    tag(0xA301, "SceneType", UNDEFINED, Some(1), Kind::ByteEnum(SCENE_TYPE)),
    tag(0xA302, "CFAPattern", UNDEFINED, None, Kind::Opaque),
    tag(0xA401, "CustomRendered", SHORT, Some(1), Kind::Enum(CUSTOM_RENDERED)),
    tag(0xA402, "ExposureMode", SHORT, Some(1), Kind::Enum(EXPOSURE_MODE)),
    tag(0xA403, "WhiteBalance", SHORT, Some(1), Kind::Enum(WHITE_BALANCE)),
    tag(0xA404, "DigitalZoomRatio", RATIONAL, Some(1), Kind::Plain),
    tag(0xA405, "FocalLengthIn35mmFilm", SHORT, Some(1), Kind::Plain),
    tag(0xA406, "SceneCaptureType", SHORT, Some(1), Kind::Enum(SCENE_CAPTURE_TYPE)),
    tag(0xA407, "GainControl", SHORT, Some(1), Kind::Enum(GAIN_CONTROL)),
    tag(0xA408, "Contrast", SHORT, Some(1), Kind::Enum(CONTRAST)),
    tag(0xA409, "Saturation", SHORT, Some(1), Kind::Enum(SATURATION)),
    tag(0xA40A, "Sharpness", SHORT, Some(1), Kind::Enum(CONTRAST)),
    tag(0xA40C, "SubjectDistanceRange", SHORT, Some(1), Kind::Enum(SUBJECT_DISTANCE_RANGE)),
    tag(0xA420, "ImageUniqueID", ASCII, Some(33), Kind::Ascii),
    tag(0xA430, "CameraOwnerName", ASCII, None, Kind::Ascii),
    tag(0xA431, "BodySerialNumber", ASCII, None, Kind::Ascii),
    tag(0xA432, "LensSpecification", RATIONAL, Some(4), Kind::Plain),
    tag(0xA433, "LensMake", ASCII, None, Kind::Ascii),
    tag(0xA434, "LensModel", ASCII, None, Kind::Ascii),
    tag(0xA435, "LensSerialNumber", ASCII, None, Kind::Ascii),
];
