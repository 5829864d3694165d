use std::path::{Path, PathBuf};

use chrono::Datelike;

use crate::date::ResolvedTimestamp;

pub const UNKNOWN_YEAR: &str = "Unknown_Year";
pub const UNKNOWN_MONTH: &str = "Unknown_Month";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Canonical destination for one item:
/// `<root>/<year>/<MM-Month>/<location>/<filename>`. Pure; identical inputs
/// always yield the same path. Conflict suffixes are applied later by the
/// conflict resolver, never here.
pub fn build(
    root: &Path,
    timestamp: &ResolvedTimestamp,
    location_label: &str,
    filename: &str,
) -> PathBuf {
    let (year, month) = match timestamp.date {
        Some(date) => (
            date.year().to_string(),
            format!("{:02}-{}", date.month(), MONTH_NAMES[date.month0() as usize]),
        ),
        None => (UNKNOWN_YEAR.to_string(), UNKNOWN_MONTH.to_string()),
    };

    root.join(year)
        .join(month)
        .join(sanitize_label(location_label))
        .join(filename)
}

/// Make a place label safe as a single directory segment: runs of spaces,
/// separators and other path-unsafe characters collapse to one underscore.
pub fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_was_sep = true;
    for c in label.chars() {
        if c.is_alphanumeric() || c == '-' || c == '.' {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        crate::location::UNKNOWN_LOCATION.to_string()
    } else {
        out
    }
}
