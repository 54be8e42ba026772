use crate::error::VariableError;
use crate::metadata::{exif_keys, MetadataMap, MetadataProvider};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use exif::{Exif, Field, In, Rational, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExifProvider;

impl MetadataProvider for ExifProvider {
    fn extract_fields(&self, path: &Path) -> Result<MetadataMap, VariableError> {
        let file = File::open(path).map_err(|err| VariableError::io(path, err))?;
        let mut buf = BufReader::new(file);
        let exif = match Reader::new().read_from_container(&mut buf) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => {
                debug!(path = %path.display(), "no exif block");
                return Ok(MetadataMap::new());
            }
            Err(err) => return Err(VariableError::metadata(path, err)),
        };
        Ok(collect_fields(&exif))
    }
}

fn collect_fields(exif: &Exif) -> MetadataMap {
    let mut map = MetadataMap::new();

    let text_fields = [
        (exif_keys::MAKE, Tag::Make),
        (exif_keys::MODEL, Tag::Model),
        (exif_keys::LENS, Tag::LensModel),
        (exif_keys::SOFTWARE, Tag::Software),
        (exif_keys::DATE_TIME_ORIGINAL, Tag::DateTimeOriginal),
    ];
    for (key, tag) in text_fields {
        if let Some(value) = find_field(exif, &[tag]).and_then(ascii_value) {
            map.insert(key, value);
        }
    }

    let integer_fields: [(&str, &[Tag]); 4] = [
        (exif_keys::ISO, &[Tag::PhotographicSensitivity]),
        (exif_keys::WIDTH, &[Tag::PixelXDimension, Tag::ImageWidth]),
        (exif_keys::HEIGHT, &[Tag::PixelYDimension, Tag::ImageLength]),
        (exif_keys::FOCAL_LENGTH_35, &[Tag::FocalLengthIn35mmFilm]),
    ];
    for (key, tags) in integer_fields {
        if let Some(value) = find_field(exif, tags).and_then(|f| f.value.get_uint(0)) {
            map.insert(key, value.to_string());
        }
    }

    if let Some(rational) = find_field(exif, &[Tag::ExposureTime]).and_then(rational_value) {
        map.insert(exif_keys::EXPOSURE_TIME, format_exposure(rational));
    }
    for (key, tag) in [
        (exif_keys::FOCAL_LENGTH, Tag::FocalLength),
        (exif_keys::F_NUMBER, Tag::FNumber),
    ] {
        if let Some(rational) = find_field(exif, &[tag]).and_then(rational_value) {
            map.insert(key, format_decimal(rational.to_f64(), 2));
        }
    }

    if let Some(lat) = gps_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, "S") {
        map.insert(exif_keys::LATITUDE, lat);
    }
    if let Some(lon) = gps_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, "W") {
        map.insert(exif_keys::LONGITUDE, lon);
    }

    map
}

fn find_field<'a>(exif: &'a Exif, tags: &[Tag]) -> Option<&'a Field> {
    tags.iter().find_map(|tag| {
        exif.get_field(*tag, In::PRIMARY)
            .or_else(|| exif.fields().find(|field| field.tag == *tag))
    })
}

fn ascii_value(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(parts) => parts.first().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_matches(char::from(0))
                .trim()
                .to_string()
        }),
        _ => None,
    }
}

fn rational_value(field: &Field) -> Option<Rational> {
    match &field.value {
        Value::Rational(values) => values.first().cloned(),
        _ => None,
    }
}

fn format_exposure(value: Rational) -> String {
    if value.num == 0 || value.denom == 0 {
        return "0".to_string();
    }
    if value.num >= value.denom {
        return format_decimal(value.to_f64(), 1);
    }
    let divisor = gcd(value.num, value.denom);
    format!("{}/{}", value.num / divisor, value.denom / divisor)
}

fn format_decimal(value: f64, precision: usize) -> String {
    let text = format!("{value:.precision$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn gps_coordinate(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: &str) -> Option<String> {
    let field = find_field(exif, &[tag])?;
    let Value::Rational(parts) = &field.value else {
        return None;
    };
    let degrees = parts
        .iter()
        .take(3)
        .zip([1.0, 60.0, 3600.0])
        .map(|(part, divisor)| part.to_f64() / divisor)
        .sum::<f64>();
    let negative = find_field(exif, &[ref_tag])
        .and_then(ascii_value)
        .is_some_and(|r| r.eq_ignore_ascii_case(negative_ref));
    let signed = if negative { -degrees } else { degrees };
    Some(format_decimal(signed, 6))
}

pub(crate) fn parse_exif_datetime(input: &str) -> Option<DateTime<Local>> {
    let normalized = input.trim();

    let candidates = [
        "%Y:%m:%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
    ];

    for fmt in candidates {
        if let Ok(dt) = DateTime::parse_from_str(normalized, fmt) {
            return Some(dt.with_timezone(&Local));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(normalized, fmt) {
            if let Some(local) = Local.from_local_datetime(&naive).single() {
                return Some(local);
            }
        }
    }

    None
}
