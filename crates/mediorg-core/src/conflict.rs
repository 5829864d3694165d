use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Rename attempts before an item is reported as path-exhausted.
const MAX_RENAME_ATTEMPTS: u32 = 1000;

/// Terminal decision for one candidate destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Path was free; it is now reserved for this fingerprint.
    Place(PathBuf),
    /// Identical content was already assigned somewhere this run.
    SkipDuplicate,
    /// Distinct content collided on the candidate name; reserved under a
    /// numeric suffix instead.
    Rename(PathBuf),
    /// Every suffix up to the cap was taken. Carries the last path tried.
    Exhausted(PathBuf),
}

struct RegistryState {
    /// Destination path -> fingerprint assigned to it this run
    assigned: HashMap<PathBuf, String>,
    /// Every fingerprint reserved this run, for exact-content dedup across
    /// differing filenames
    seen: HashSet<String>,
    /// Paths that existed under the destination root before the run;
    /// content unknown, so collisions with them always rename
    occupied: HashSet<PathBuf>,
}

/// Fingerprint store plus conflict resolver. `decide` is one critical
/// section per call so two items cannot race onto the same destination.
pub struct PathRegistry {
    state: Mutex<RegistryState>,
}

impl PathRegistry {
    pub fn new(occupied: HashSet<PathBuf>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                assigned: HashMap::new(),
                seen: HashSet::new(),
                occupied,
            }),
        }
    }

    /// Check-and-reserve: duplicate content skips, a free path places, an
    /// occupied path retries with `stem_N.ext` suffixes up to a fixed cap.
    pub fn decide(&self, candidate: &Path, fingerprint: &str) -> Decision {
        let mut state = self.state.lock().unwrap();

        if state.seen.contains(fingerprint) {
            return Decision::SkipDuplicate;
        }

        let mut last = candidate.to_path_buf();
        for attempt in 0..=MAX_RENAME_ATTEMPTS {
            let path = if attempt == 0 {
                candidate.to_path_buf()
            } else {
                with_suffix(candidate, attempt)
            };

            if !state.assigned.contains_key(&path) && !state.occupied.contains(&path) {
                state.assigned.insert(path.clone(), fingerprint.to_string());
                state.seen.insert(fingerprint.to_string());
                return if attempt == 0 {
                    Decision::Place(path)
                } else {
                    Decision::Rename(path)
                };
            }
            last = path;
        }

        Decision::Exhausted(last)
    }

    /// Forget a reservation whose write failed, so the name can be reused
    /// and an identical file later in the run is not misreported as a
    /// duplicate of something that was never placed.
    pub fn release(&self, path: &Path) {
        let mut state = self.state.lock().unwrap();
        if let Some(fingerprint) = state.assigned.remove(path) {
            state.seen.remove(&fingerprint);
        }
    }
}

/// `IMG_1.jpg` + 2 -> `IMG_1_2.jpg`; extension preserved.
fn with_suffix(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let name = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}_{n}.{ext}"),
        None => format!("{stem}_{n}"),
    };
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PathRegistry {
        PathRegistry::new(HashSet::new())
    }

    #[test]
    fn test_free_path_places() {
        let reg = registry();
        let p = Path::new("/out/2024/03-March/Paris_France/IMG_1.jpg");
        assert_eq!(reg.decide(p, "aaa"), Decision::Place(p.to_path_buf()));
    }

    #[test]
    fn test_same_content_skips_regardless_of_name() {
        let reg = registry();
        reg.decide(Path::new("/out/a/IMG_1.jpg"), "aaa");
        // Same fingerprint, entirely different candidate path
        assert_eq!(reg.decide(Path::new("/out/b/other.jpg"), "aaa"), Decision::SkipDuplicate);
    }

    #[test]
    fn test_distinct_content_same_name_renames() {
        let reg = registry();
        let p = Path::new("/out/2024/03-March/Paris_France/IMG_1.jpg");
        reg.decide(p, "content-a");
        assert_eq!(
            reg.decide(p, "content-b"),
            Decision::Rename(PathBuf::from("/out/2024/03-March/Paris_France/IMG_1_1.jpg"))
        );
        assert_eq!(
            reg.decide(p, "content-c"),
            Decision::Rename(PathBuf::from("/out/2024/03-March/Paris_France/IMG_1_2.jpg"))
        );
    }

    #[test]
    fn test_preexisting_destination_file_forces_rename() {
        let p = PathBuf::from("/out/x/IMG_1.jpg");
        let reg = PathRegistry::new(HashSet::from([p.clone()]));
        assert_eq!(
            reg.decide(&p, "aaa"),
            Decision::Rename(PathBuf::from("/out/x/IMG_1_1.jpg"))
        );
    }

    #[test]
    fn test_release_frees_path_and_fingerprint() {
        let reg = registry();
        let p = Path::new("/out/x/IMG_1.jpg");
        reg.decide(p, "aaa");
        reg.release(p);
        assert_eq!(reg.decide(p, "aaa"), Decision::Place(p.to_path_buf()));
    }

    #[test]
    fn test_suffix_preserves_extension() {
        assert_eq!(
            with_suffix(Path::new("/d/IMG_1.jpg"), 1),
            PathBuf::from("/d/IMG_1_1.jpg")
        );
        assert_eq!(with_suffix(Path::new("/d/noext"), 3), PathBuf::from("/d/noext_3"));
    }

    #[test]
    fn test_exhaustion_is_reported_not_unbounded() {
        let p = PathBuf::from("/out/x/IMG.jpg");
        let mut occupied = HashSet::from([p.clone()]);
        for n in 1..=MAX_RENAME_ATTEMPTS {
            occupied.insert(with_suffix(&p, n));
        }
        let reg = PathRegistry::new(occupied);
        match reg.decide(&p, "aaa") {
            Decision::Exhausted(last) => {
                assert_eq!(last, with_suffix(&p, MAX_RENAME_ATTEMPTS));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }
}
