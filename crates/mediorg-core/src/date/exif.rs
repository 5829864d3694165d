use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Reader, Tag, Value};

/// Raw fields pulled from embedded metadata. Each field may be absent
/// independently; a file with GPS but no dates (or the reverse) is fine.
#[derive(Debug, Clone, Default)]
pub struct RawMetadata {
    /// EXIF DateTimeOriginal (capture time)
    pub capture: Option<String>,
    /// EXIF DateTimeDigitized
    pub digitized: Option<String>,
    /// EXIF DateTime (modification time)
    pub modified: Option<String>,
    /// GPS position as signed decimal degrees, unvalidated
    pub gps: Option<(f64, f64)>,
}

/// Read whatever embedded metadata the file has. Unreadable or EXIF-less
/// files yield an empty RawMetadata so the caller falls through to the
/// filesystem timestamp.
pub fn read_raw(path: &Path) -> RawMetadata {
    let Ok(file) = File::open(path) else {
        return RawMetadata::default();
    };
    let Ok(reader) = Reader::new().read_from_container(&mut BufReader::new(file)) else {
        return RawMetadata::default();
    };

    let field_string = |tag: Tag| -> Option<String> {
        reader
            .get_field(tag, In::PRIMARY)
            .map(|f| f.display_value().to_string())
    };

    RawMetadata {
        capture: field_string(Tag::DateTimeOriginal),
        digitized: field_string(Tag::DateTimeDigitized),
        modified: field_string(Tag::DateTime),
        gps: read_gps(&reader),
    }
}

fn read_gps(reader: &exif::Exif) -> Option<(f64, f64)> {
    let lat = dms_to_degrees(reader.get_field(Tag::GPSLatitude, In::PRIMARY)?)?;
    let lon = dms_to_degrees(reader.get_field(Tag::GPSLongitude, In::PRIMARY)?)?;

    let lat = apply_ref(lat, reader.get_field(Tag::GPSLatitudeRef, In::PRIMARY), 'S');
    let lon = apply_ref(lon, reader.get_field(Tag::GPSLongitudeRef, In::PRIMARY), 'W');
    Some((lat, lon))
}

/// EXIF stores positions as degree/minute/second rationals; some writers
/// emit a single decimal-degrees rational instead.
fn dms_to_degrees(field: &exif::Field) -> Option<f64> {
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    match parts.len() {
        0 => None,
        1 | 2 => Some(parts[0].to_f64()),
        _ => Some(parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0),
    }
}

fn apply_ref(value: f64, ref_field: Option<&exif::Field>, negative: char) -> f64 {
    let is_negative = ref_field
        .map(|f| f.display_value().to_string().contains(negative))
        .unwrap_or(false);
    if is_negative {
        -value
    } else {
        value
    }
}
