use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use reverse_geocoder::ReverseGeocoder;

use crate::gps::{Coordinates, QuantizedKey};

pub const UNKNOWN_LOCATION: &str = "Unknown_Location";

/// Coordinates -> place name capability. Implementations may fail; the
/// cache degrades a failure to `Unknown_Location` and remembers it so a
/// failing area is only attempted once per run.
pub trait Geocoder: Send + Sync {
    fn reverse(&self, latitude: f64, longitude: f64) -> anyhow::Result<String>;
}

/// Offline lookup against the embedded geonames dataset. No network, so
/// no timeout to manage; city name plus country, e.g. "Paris, France".
pub struct OfflineGeocoder {
    inner: ReverseGeocoder,
}

impl OfflineGeocoder {
    pub fn new() -> Self {
        Self {
            inner: ReverseGeocoder::new(),
        }
    }
}

impl Default for OfflineGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder for OfflineGeocoder {
    fn reverse(&self, latitude: f64, longitude: f64) -> anyhow::Result<String> {
        let result = self.inner.search((latitude, longitude));
        let record = result.record;
        let country = rust_iso3166::from_alpha2(&record.cc)
            .map(|c| c.name.to_string())
            .unwrap_or_else(|| record.cc.clone());
        Ok(format!("{}, {}", record.name, country))
    }
}

/// Run-scoped memo of quantized coordinates -> place label. One lookup is
/// in flight per key; concurrent requesters for the same key block on the
/// cell and reuse its result instead of issuing their own lookup.
pub struct LocationCache {
    cells: Mutex<HashMap<QuantizedKey, Arc<OnceLock<String>>>>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Absent coordinates short-circuit to `Unknown_Location` with no lookup.
    pub fn resolve(&self, coordinates: Option<Coordinates>, geocoder: &dyn Geocoder) -> String {
        let Some(coords) = coordinates else {
            return UNKNOWN_LOCATION.to_string();
        };

        let cell = {
            let mut cells = self.cells.lock().unwrap();
            cells.entry(coords.quantized_key()).or_default().clone()
        };

        cell.get_or_init(|| {
            match geocoder.reverse(coords.latitude, coords.longitude) {
                Ok(label) => label,
                Err(e) => {
                    log::warn!(
                        "geocode failed for ({}, {}): {e}",
                        coords.latitude,
                        coords.longitude
                    );
                    UNKNOWN_LOCATION.to_string()
                }
            }
        })
        .clone()
    }

    /// Number of distinct quantized keys looked up so far.
    pub fn len(&self) -> usize {
        self.cells.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.lock().unwrap().is_empty()
    }
}

impl Default for LocationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGeocoder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingGeocoder {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl Geocoder for CountingGeocoder {
        fn reverse(&self, latitude: f64, longitude: f64) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("service unavailable");
            }
            Ok(format!("Place {latitude:.3} {longitude:.3}"))
        }
    }

    #[test]
    fn test_absent_coordinates_skip_lookup() {
        let cache = LocationCache::new();
        let geo = CountingGeocoder::new(false);
        assert_eq!(cache.resolve(None, &geo), UNKNOWN_LOCATION);
        assert_eq!(geo.calls.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_one_lookup_per_quantized_key() {
        let cache = LocationCache::new();
        let geo = CountingGeocoder::new(false);
        let a = Coordinates::new(48.85661, 2.35221).unwrap();
        let b = Coordinates::new(48.85663, 2.35219).unwrap();

        let first = cache.resolve(Some(a), &geo);
        let second = cache.resolve(Some(b), &geo);
        assert_eq!(first, second);
        assert_eq!(geo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failures_are_cached_too() {
        let cache = LocationCache::new();
        let geo = CountingGeocoder::new(true);
        let coords = Coordinates::new(10.0, 10.0).unwrap();

        assert_eq!(cache.resolve(Some(coords), &geo), UNKNOWN_LOCATION);
        assert_eq!(cache.resolve(Some(coords), &geo), UNKNOWN_LOCATION);
        assert_eq!(geo.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_offline_geocoder_names_paris() {
        let geo = OfflineGeocoder::new();
        let label = geo.reverse(48.8566, 2.3522).unwrap();
        assert_eq!(label, "Paris, France");
    }

    #[test]
    fn test_distinct_keys_get_distinct_lookups() {
        let cache = LocationCache::new();
        let geo = CountingGeocoder::new(false);
        let paris = Coordinates::new(48.8566, 2.3522).unwrap();
        let tokyo = Coordinates::new(35.6762, 139.6503).unwrap();

        let l1 = cache.resolve(Some(paris), &geo);
        let l2 = cache.resolve(Some(tokyo), &geo);
        assert_ne!(l1, l2);
        assert_eq!(geo.calls.load(Ordering::SeqCst), 2);
    }
}
