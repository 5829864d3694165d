pub mod exif;
pub mod video;

use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub use exif::RawMetadata;

/// Which source produced the resolved timestamp. Declaration order is the
/// fallback priority; an earlier source is never overwritten by a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimestampSource {
    CaptureTime,
    DigitizedTime,
    ModifyTime,
    ContainerTime,
    FileCreated,
    Unknown,
}

impl TimestampSource {
    pub const ALL: [TimestampSource; 6] = [
        TimestampSource::CaptureTime,
        TimestampSource::DigitizedTime,
        TimestampSource::ModifyTime,
        TimestampSource::ContainerTime,
        TimestampSource::FileCreated,
        TimestampSource::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimestampSource::CaptureTime => "capture-time",
            TimestampSource::DigitizedTime => "digitized-time",
            TimestampSource::ModifyTime => "modify-time",
            TimestampSource::ContainerTime => "container-create-time",
            TimestampSource::FileCreated => "file-created",
            TimestampSource::Unknown => "unknown",
        }
    }
}

/// Timestamp plus provenance. `date` is None only for `Unknown`, which
/// routes the item to the Unknown_Year/Unknown_Month bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTimestamp {
    pub date: Option<NaiveDateTime>,
    pub source: TimestampSource,
}

impl ResolvedTimestamp {
    pub fn unknown() -> Self {
        Self {
            date: None,
            source: TimestampSource::Unknown,
        }
    }
}

/// Walk the fallback chain: embedded capture -> digitized -> modify ->
/// video container creation time -> filesystem creation time. A field that
/// fails to parse counts as unavailable and the chain continues; if
/// everything fails the item resolves to the unknown sentinel rather than
/// erroring.
pub fn resolve_timestamp(
    raw: &RawMetadata,
    container_date: Option<NaiveDateTime>,
    fs_created: Option<NaiveDateTime>,
) -> ResolvedTimestamp {
    let probes = [
        (TimestampSource::CaptureTime, raw.capture.as_deref()),
        (TimestampSource::DigitizedTime, raw.digitized.as_deref()),
        (TimestampSource::ModifyTime, raw.modified.as_deref()),
    ];

    for (source, value) in probes {
        if let Some(date) = value.and_then(parse_exif_datetime) {
            return ResolvedTimestamp {
                date: Some(date),
                source,
            };
        }
    }

    if let Some(date) = container_date {
        return ResolvedTimestamp {
            date: Some(date),
            source: TimestampSource::ContainerTime,
        };
    }

    if let Some(date) = fs_created {
        return ResolvedTimestamp {
            date: Some(date),
            source: TimestampSource::FileCreated,
        };
    }

    ResolvedTimestamp::unknown()
}

/// Filesystem creation time as the last-resort source. Unsupported on some
/// filesystems, in which case the chain ends at the unknown sentinel.
pub fn file_created(path: &Path) -> Option<NaiveDateTime> {
    let created = std::fs::metadata(path).ok()?.created().ok()?;
    let local: DateTime<Local> = created.into();
    Some(local.naive_local())
}

/// EXIF datetimes carry no timezone; they are local time as-is. Writers
/// disagree on separators, so normalize before parsing.
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s
        .trim()
        .replace('-', ":")
        .replace('/', ":")
        .replace('\\', ":")
        .replace('T', " ");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }

    if let Ok(d) = chrono::NaiveDate::parse_from_str(cleaned.split(' ').next()?, "%Y:%m:%d") {
        return Some(d.and_hms_opt(0, 0, 0)?);
    }

    None
}
