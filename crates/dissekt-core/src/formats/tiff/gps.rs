//! GPSInfo IFD tags.

use super::tags::{tag, Kind, TagSpec, ASCII, BYTE, RATIONAL, SHORT, UNDEFINED};

const ALTITUDE_REF: &[(u32, &str)] = &[(0, "Above sea level"), (1, "Below sea level")];

const DIFFERENTIAL: &[(u32, &str)] = &[
    (0, "Without correction"),
    (1, "Differential correction applied"),
];

/// GPSInfo tags, sorted by id
pub(super) const GPS_TAGS: &[TagSpec] = &[
    tag(0x0000, "GPSVersionID", BYTE, Some(4), Kind::GpsVersion),
    tag(0x0001, "GPSLatitudeRef", ASCII, Some(2), Kind::Ascii),
    tag(0x0002, "GPSLatitude", RATIONAL, Some(3), Kind::GpsCoordinate),
    tag(0x0003, "GPSLongitudeRef", ASCII, Some(2), Kind::Ascii),
    tag(0x0004, "GPSLongitude", RATIONAL, Some(3), Kind::GpsCoordinate),
    tag(0x0005, "GPSAltitudeRef", BYTE, Some(1), Kind::Enum(ALTITUDE_REF)),
    tag(0x0006, "GPSAltitude", RATIONAL, Some(1), Kind::Plain),
    tag(0x0007, "GPSTimeStamp", RATIONAL, Some(3), Kind::GpsTimeStamp),
    tag(0x0008, "GPSSatellites", ASCII, None, Kind::Ascii),
    tag(0x0009, "GPSStatus", ASCII, Some(2), Kind::Ascii),
    tag(0x000A, "GPSMeasureMode", ASCII, Some(2), Kind::Ascii),
    tag(0x000B, "GPSDOP", RATIONAL, Some(1), Kind::Plain),
    tag(0x000C, "GPSSpeedRef", ASCII, Some(2), Kind::Ascii),
    tag(0x000D, "GPSSpeed", RATIONAL, Some(1), Kind::Plain),
    tag(0x000E, "GPSTrackRef", ASCII, Some(2), Kind::Ascii),
    tag(0x000F, "GPSTrack", RATIONAL, Some(1), Kind::Plain),
    tag(0x0010, "GPSImgDirectionRef", ASCII, Some(2), Kind::Ascii),
    tag(0x0011, "GPSImgDirection", RATIONAL, Some(1), Kind::Plain),
    tag(0x0012, "GPSMapDatum", ASCII, None, Kind::Ascii),
    tag(0x0013, "GPSDestLatitudeRef", ASCII, Some(2), Kind::Ascii),
    tag(0x0014, "GPSDestLatitude", RATIONAL, Some(3), Kind::GpsCoordinate),
    tag(0x0015, "GPSDestLongitudeRef", ASCII, Some(2), Kind::Ascii),
    tag(0x0016, "GPSDestLongitude", RATIONAL, Some(3), Kind::GpsCoordinate),
    tag(0x0017, "GPSDestBearingRef", ASCII, Some(2), Kind::Ascii),
    tag(0x0018, "GPSDestBearing", RATIONAL, Some(1), Kind::Plain),
    tag(0x0019, "GPSDestDistanceRef", ASCII, Some(2), Kind::Ascii),
    tag(0x001A, "GPSDestDistance", RATIONAL, Some(1), Kind::Plain),
    tag(0x001B, "GPSProcessingMethod", UNDEFINED, None, Kind::UserComment),
    tag(0x001C, "GPSAreaInformation", UNDEFINED, None, Kind::UserComment),
    tag(0x001D, "GPSDateStamp", ASCII, Some(11), Kind::Ascii),
    tag(0x001E, "GPSDifferential", SHORT, Some(1), Kind::Enum(DIFFERENTIAL)),
    tag(0x001F, "GPSHPositioningError", RATIONAL, Some(1), Kind::Plain),
];
