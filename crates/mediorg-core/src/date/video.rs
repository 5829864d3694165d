use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDateTime;

/// Seconds between the QuickTime epoch (1904-01-01) and the Unix epoch.
const QUICKTIME_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Creation time from an ISO-BMFF container (MP4, MOV, M4V, 3GP). Other
/// containers fail to parse and yield None, and the chain moves on to the
/// filesystem fallback.
pub fn read_creation_date(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let size = file.metadata().ok()?.len();
    let reader = mp4::Mp4Reader::read_header(BufReader::new(file), size).ok()?;
    creation_to_naive(reader.moov.mvhd.creation_time)
}

/// Container creation times count from 1904-01-01 UTC, but some writers
/// emit Unix-epoch seconds instead. Zero means the field was never set.
fn creation_to_naive(secs: u64) -> Option<NaiveDateTime> {
    let secs = secs as i64;
    let unix = if secs >= QUICKTIME_EPOCH_OFFSET {
        secs - QUICKTIME_EPOCH_OFFSET
    } else {
        secs
    };
    if unix <= 0 {
        return None;
    }
    let utc = chrono::DateTime::from_timestamp(unix, 0)?;
    Some(utc.with_timezone(&chrono::Local).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    // 2024-03-15 00:00:00 UTC
    const UNIX_SECS: i64 = 1_710_460_800;

    fn expected_local() -> NaiveDateTime {
        chrono::DateTime::from_timestamp(UNIX_SECS, 0)
            .unwrap()
            .with_timezone(&chrono::Local)
            .naive_local()
    }

    #[test]
    fn test_quicktime_epoch_conversion() {
        let qt = (UNIX_SECS + QUICKTIME_EPOCH_OFFSET) as u64;
        assert_eq!(creation_to_naive(qt), Some(expected_local()));
    }

    #[test]
    fn test_unix_epoch_writers() {
        assert_eq!(creation_to_naive(UNIX_SECS as u64), Some(expected_local()));
    }

    #[test]
    fn test_unset_field_is_none() {
        assert_eq!(creation_to_naive(0), None);
    }

    #[test]
    fn test_non_container_bytes_yield_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        File::create(&path).unwrap().write_all(b"not a real container").unwrap();
        assert_eq!(read_creation_date(&path), None);
    }
}
