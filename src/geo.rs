// GPS position and capture time from an image's EXIF block.

use crate::error::Result;
use exif::{Exif, In, Rational, Tag, Value};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Where and when a photo was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub date_time: Option<String>,
}

/// Convert a degrees/minutes/seconds triple to decimal degrees.
///
/// The hemisphere reference is not applied, so the result is never
/// negative. Returns `None` unless `dms` holds exactly three rationals with
/// non-zero denominators.
pub fn to_decimal_degrees(dms: &[Rational]) -> Option<f64> {
    let [degrees, minutes, seconds] = dms else {
        return None;
    };
    if [degrees, minutes, seconds].iter().any(|r| r.denom == 0) {
        return None;
    }
    Some(degrees.to_f64() + minutes.to_f64() / 60.0 + seconds.to_f64() / 3600.0)
}

/// Read the GPS fix of the image at `path`.
///
/// Failing to open the file is an error. A file without EXIF data, without
/// a GPS block, or with malformed GPS fields yields `Ok(None)`.
pub fn read_gps(path: &Path) -> Result<Option<GpsFix>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(gps_fix(&exif)),
        Err(e) => {
            debug!("no EXIF data in {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

/// Extract latitude, longitude and the optional timestamp from parsed EXIF
/// data.
pub fn gps_fix(exif: &Exif) -> Option<GpsFix> {
    let latitude = coordinate(exif, Tag::GPSLatitude)?;
    let longitude = coordinate(exif, Tag::GPSLongitude)?;
    Some(GpsFix {
        latitude,
        longitude,
        date_time: date_time(exif),
    })
}

fn coordinate(exif: &Exif, tag: Tag) -> Option<f64> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(dms) => to_decimal_degrees(dms),
        _ => None,
    }
}

fn date_time(exif: &Exif) -> Option<String> {
    match &exif.get_field(Tag::DateTime, In::PRIMARY)?.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn r(num: u32, denom: u32) -> Rational {
        Rational { num, denom }
    }

    #[rstest]
    #[case([(42, 1), (3, 1), (2, 1)], 42.0 + 3.0 / 60.0 + 2.0 / 3600.0)]
    #[case([(87, 1), (4050, 100), (0, 1)], 87.675)]
    #[case([(0, 1), (0, 1), (3600, 1)], 1.0)]
    #[case([(1, 2), (30, 1), (1800, 10)], 0.5 + 0.5 + 0.05)]
    fn converts_degrees_minutes_seconds(#[case] dms: [(u32, u32); 3], #[case] expected: f64) {
        let dms: Vec<Rational> = dms.iter().map(|&(n, d)| r(n, d)).collect();
        let got = to_decimal_degrees(&dms).unwrap();
        assert!((got - expected).abs() < 1e-9, "{got} != {expected}");
    }

    #[test]
    fn zero_denominator_is_rejected() {
        assert_eq!(to_decimal_degrees(&[r(1, 1), r(1, 0), r(0, 1)]), None);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        assert_eq!(to_decimal_degrees(&[r(1, 1), r(1, 1)]), None);
        assert_eq!(to_decimal_degrees(&[]), None);
    }

    #[test]
    fn file_without_exif_has_no_fix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert_eq!(read_gps(&path).unwrap(), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_gps(&dir.path().join("absent.jpg")).is_err());
    }
}
