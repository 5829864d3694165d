pub mod conflict;
pub mod date;
pub mod dest;
pub mod fingerprint;
pub mod gps;
pub mod location;
pub mod media;
pub mod scan;
pub mod writer;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::Context;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::conflict::{Decision, PathRegistry};
use crate::date::TimestampSource;
use crate::gps::Coordinates;
use crate::location::{Geocoder, LocationCache};
use crate::media::{MediaItem, MediaKind};

pub use crate::location::OfflineGeocoder;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeOptions {
    pub source: PathBuf,
    pub dest: PathBuf,
    /// Move instead of copy; the source is deleted only after the
    /// destination write succeeded.
    #[serde(default)]
    pub move_files: bool,
    /// Run every resolution and decision but mutate nothing.
    #[serde(default)]
    pub dry_run: bool,
}

/// Terminal state of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Placed,
    SkippedDuplicate,
    RenamedPlaced,
    Failed,
}

/// What happened to one item, reported through the item callback and
/// tallied into RunStatistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub source: PathBuf,
    pub placement: Placement,
    pub dest: Option<PathBuf>,
    pub timestamp_source: Option<TimestampSource>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStatistics {
    pub discovered: u64,
    pub placed: u64,
    pub skipped_duplicate: u64,
    pub renamed: u64,
    pub failed: u64,
    /// Items per timestamp provenance, keyed by TimestampSource::label()
    pub by_source: BTreeMap<String, u64>,
    pub failures: Vec<(PathBuf, String)>,
    pub dry_run: bool,
}

impl RunStatistics {
    fn tally(&mut self, outcome: &ItemOutcome) {
        match outcome.placement {
            Placement::Placed => self.placed += 1,
            Placement::SkippedDuplicate => self.skipped_duplicate += 1,
            Placement::RenamedPlaced => self.renamed += 1,
            Placement::Failed => {
                self.failed += 1;
                self.failures
                    .push((outcome.source.clone(), outcome.reason.clone()));
            }
        }
        if let Some(src) = outcome.timestamp_source {
            *self.by_source.entry(src.label().to_string()).or_insert(0) += 1;
        }
    }
}

/// Progress callback: (stage, current, total, message)
pub type ProgressCallback = dyn Fn(&str, u64, u64, &str) + Send + Sync;

/// Per-item event callback, invoked once per terminal outcome
pub type ItemCallback = dyn Fn(&ItemOutcome) + Send + Sync;

/// Throttled progress reporter: emits at most every 200ms or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback,
    last_emit: std::sync::Mutex<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback) -> Self {
        Self {
            inner,
            last_emit: std::sync::Mutex::new(Instant::now() - std::time::Duration::from_secs(1)),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            let mut last = self.last_emit.lock().unwrap();
            if last.elapsed().as_millis() < 200 {
                return;
            }
            *last = Instant::now();
        }
        (self.inner)(stage, current, total, message);
    }
}

/// Organize everything under `options.source` into
/// `<dest>/<year>/<MM-Month>/<location>/`. One bad item never aborts the
/// run; only configuration errors (missing source, uncreatable destination)
/// do, and those fail before any item is processed.
pub fn organize(
    options: &OrganizeOptions,
    geocoder: &dyn Geocoder,
    progress_callback: &ProgressCallback,
    on_item: &ItemCallback,
) -> anyhow::Result<RunStatistics> {
    anyhow::ensure!(
        options.source.is_dir(),
        "source directory does not exist: {}",
        options.source.display()
    );
    if !options.dry_run {
        std::fs::create_dir_all(&options.dest)
            .with_context(|| format!("destination root not writable: {}", options.dest.display()))?;
    }

    let tp = ThrottledProgress::new(progress_callback);

    let items = scan::discover(&options.source, &tp);
    let total = items.len() as u64;
    log::info!("found {} media files under {}", total, options.source.display());

    let occupied = if options.dest.is_dir() {
        writer::scan_existing_files(&options.dest)
    } else {
        Default::default()
    };

    let registry = PathRegistry::new(occupied);
    let cache = LocationCache::new();
    let counter = AtomicU64::new(0);

    let outcomes: Vec<ItemOutcome> = items
        .into_par_iter()
        .map(|item| {
            let outcome = process_item(item, options, geocoder, &cache, &registry);
            let current = counter.fetch_add(1, Ordering::Relaxed);
            tp.report(
                "organize",
                current,
                total,
                &outcome.source.display().to_string(),
            );
            on_item(&outcome);
            outcome
        })
        .collect();

    let mut stats = RunStatistics {
        discovered: total,
        dry_run: options.dry_run,
        ..Default::default()
    };
    for outcome in &outcomes {
        stats.tally(outcome);
    }
    Ok(stats)
}

/// Discovered -> MetadataResolved -> LocationResolved -> PathBuilt ->
/// terminal decision. Resolution fields on the item are written exactly
/// once; per-item failures come back as a Failed outcome, never an Err.
fn process_item(
    mut item: MediaItem,
    options: &OrganizeOptions,
    geocoder: &dyn Geocoder,
    cache: &LocationCache,
    registry: &PathRegistry,
) -> ItemOutcome {
    let fp = match fingerprint::hash_file(&item.path) {
        Ok(fp) => fp,
        Err(e) => {
            return ItemOutcome {
                source: item.path,
                placement: Placement::Failed,
                dest: None,
                timestamp_source: None,
                reason: format!("unreadable source: {e:#}"),
            };
        }
    };
    item.fingerprint = Some(fp.clone());

    let raw = date::exif::read_raw(&item.path);
    let container_date = match item.kind {
        MediaKind::Video => date::video::read_creation_date(&item.path),
        MediaKind::Photo => None,
    };
    let timestamp = date::resolve_timestamp(&raw, container_date, date::file_created(&item.path));
    item.timestamp = Some(timestamp);
    item.coordinates = raw
        .gps
        .and_then(|(lat, lon)| Coordinates::new(lat, lon));

    let label = cache.resolve(item.coordinates, geocoder);
    let candidate = dest::build(&options.dest, &timestamp, &label, item.filename());

    match registry.decide(&candidate, &fp) {
        Decision::SkipDuplicate => ItemOutcome {
            source: item.path,
            placement: Placement::SkippedDuplicate,
            dest: None,
            timestamp_source: Some(timestamp.source),
            reason: "identical content already placed this run".to_string(),
        },
        Decision::Exhausted(last) => ItemOutcome {
            source: item.path,
            placement: Placement::Failed,
            dest: None,
            timestamp_source: Some(timestamp.source),
            reason: format!("conflict suffixes exhausted, last tried {}", last.display()),
        },
        Decision::Place(path) | Decision::Rename(path)
            if !options.dry_run =>
        {
            let renamed = path != candidate;
            match writer::place(&item.path, &path, timestamp.date, options.move_files) {
                Ok(()) => ItemOutcome {
                    source: item.path,
                    placement: if renamed {
                        Placement::RenamedPlaced
                    } else {
                        Placement::Placed
                    },
                    dest: Some(path),
                    timestamp_source: Some(timestamp.source),
                    reason: String::new(),
                },
                Err(e) => {
                    registry.release(&path);
                    ItemOutcome {
                        source: item.path,
                        placement: Placement::Failed,
                        dest: None,
                        timestamp_source: Some(timestamp.source),
                        reason: format!("destination write failed: {e:#}"),
                    }
                }
            }
        }
        Decision::Place(path) => ItemOutcome {
            source: item.path,
            placement: Placement::Placed,
            dest: Some(path),
            timestamp_source: Some(timestamp.source),
            reason: "dry run".to_string(),
        },
        Decision::Rename(path) => ItemOutcome {
            source: item.path,
            placement: Placement::RenamedPlaced,
            dest: Some(path),
            timestamp_source: Some(timestamp.source),
            reason: "dry run".to_string(),
        },
    }
}
