//! Snapshot persistence: a whole-collection JSON file.
//!
//! The store deliberately exposes only load-full-array / save-full-array and
//! an identity-keyed upsert built on top of them; all filtering and matching
//! happens in the core. Saves go through a temp file and rename, so a failed
//! write leaves the previous snapshot intact.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::merge::merge_richer;
use crate::model::Vessel;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File-backed vessel snapshot.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full vessel array. A missing file is an empty collection.
    pub fn load(&self) -> Result<Vec<Vessel>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Writes the full vessel array, atomically replacing the previous
    /// snapshot.
    pub fn save(&self, vessels: &[Vessel]) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(vessels)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Field-scoped upsert by identity key: merges each incoming record into
    /// the stored collection with richer-wins semantics and saves the result.
    ///
    /// Returns the number of records absorbed (unidentifiable records are
    /// skipped).
    pub fn upsert(&self, incoming: &[Vessel]) -> Result<usize, StoreError> {
        let mut vessels = self.load()?;
        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, vessel) in vessels.iter().enumerate() {
            if let Some(key) = vessel.identity_key() {
                index.insert(key.to_string(), i);
            }
        }

        let mut absorbed = 0;
        for record in incoming {
            let Some(key) = record.identity_key().map(str::to_string) else {
                continue;
            };
            match index.get(&key) {
                Some(&i) => vessels[i] = merge_richer(&vessels[i], record),
                None => {
                    index.insert(key, vessels.len());
                    vessels.push(record.clone());
                }
            }
            absorbed += 1;
        }

        self.save(&vessels)?;
        Ok(absorbed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_store(tag: &str) -> SnapshotStore {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "yachtwatch-store-{}-{}-{}.json",
            std::process::id(),
            tag,
            n
        ));
        let _ = fs::remove_file(&path);
        SnapshotStore::new(path)
    }

    fn vessel(name: &str, mmsi: &str) -> Vessel {
        Vessel {
            name: name.into(),
            mmsi: mmsi.into(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_file_is_empty_collection() {
        let store = temp_store("missing");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = temp_store("roundtrip");
        let vessels = vec![vessel("KORU", "319189000"), vessel("VENUS", "319085600")];
        store.save(&vessels).unwrap();
        assert_eq!(store.load().unwrap(), vessels);
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn upsert_merges_by_identity_key() {
        let store = temp_store("upsert");
        let mut koru = vessel("KORU", "319189000");
        koru.length_meters = 127;
        store.save(&[koru]).unwrap();

        let mut sighting = vessel("", "319189000");
        sighting.lat = Some(17.9);
        let absorbed = store
            .upsert(&[sighting, vessel("VENUS", "319085600")])
            .unwrap();
        assert_eq!(absorbed, 2);

        let vessels = store.load().unwrap();
        assert_eq!(vessels.len(), 2);
        assert_eq!(vessels[0].name, "KORU");
        assert_eq!(vessels[0].length_meters, 127);
        assert_eq!(vessels[0].lat, Some(17.9));
        assert_eq!(vessels[1].name, "VENUS");
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn unidentifiable_records_are_skipped() {
        let store = temp_store("noid");
        let absorbed = store.upsert(&[Vessel::default()]).unwrap();
        assert_eq!(absorbed, 0);
        assert!(store.load().unwrap().is_empty());
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn save_into_missing_directory_fails_cleanly() {
        let store = SnapshotStore::new(
            std::env::temp_dir()
                .join("yachtwatch-no-such-dir")
                .join("snapshot.json"),
        );
        assert!(store.save(&[]).is_err());
    }
}
