use serde::{Deserialize, Serialize};

/// Decimal places kept when quantizing coordinates for the location cache.
/// Three decimals is roughly 100m, enough to share one geocode lookup
/// between shots taken at the same spot.
const QUANTIZE_FACTOR: f64 = 1000.0;

/// Validated capture coordinates in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Cache key for the location resolver: coordinates rounded to a fixed
/// precision so nearby points collapse onto one lookup.
pub type QuantizedKey = (i64, i64);

impl Coordinates {
    /// Returns None for out-of-range values (e.g. a corrupt latitude of 999);
    /// malformed GPS metadata is "absent", never an error.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }

    pub fn quantized_key(&self) -> QuantizedKey {
        (
            (self.latitude * QUANTIZE_FACTOR).round() as i64,
            (self.longitude * QUANTIZE_FACTOR).round() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ranges() {
        assert!(Coordinates::new(48.8566, 2.3522).is_some());
        assert!(Coordinates::new(-90.0, 180.0).is_some());
        assert!(Coordinates::new(0.0, 0.0).is_some());
    }

    #[test]
    fn test_corrupt_values_are_absent() {
        assert!(Coordinates::new(999.0, 2.3522).is_none());
        assert!(Coordinates::new(48.0, -181.0).is_none());
        assert!(Coordinates::new(f64::NAN, 2.0).is_none());
        assert!(Coordinates::new(48.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_nearby_points_share_a_key() {
        let a = Coordinates::new(48.85661, 2.35221).unwrap();
        let b = Coordinates::new(48.85664, 2.35218).unwrap();
        assert_eq!(a.quantized_key(), b.quantized_key());

        let far = Coordinates::new(48.86, 2.36).unwrap();
        assert_ne!(a.quantized_key(), far.quantized_key());
    }

    #[test]
    fn test_hemispheres_do_not_collide() {
        let north = Coordinates::new(10.0, 20.0).unwrap();
        let south = Coordinates::new(-10.0, 20.0).unwrap();
        assert_ne!(north.quantized_key(), south.quantized_key());
    }
}
