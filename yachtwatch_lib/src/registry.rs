//! Curated registry of notable vessels and the load-time merge against a
//! captured dataset.
//!
//! The curated side is small, hand-maintained, and authoritative for
//! ownership and provenance; the captured side is large, automatically
//! gathered, and authoritative for live telemetry and breadth. The merge
//! produces one entry per captured record, in captured order; curated-only
//! vessels are not surfaced.

use std::fs;
use std::path::Path;

use crate::model::{Owner, Vessel};
use crate::store::StoreError;

const BUNDLED_REGISTRY: &str = include_str!("../data/curated.json");

/// Hand-maintained registry of notable vessels with ownership metadata.
pub struct CuratedRegistry {
    pub vessels: Vec<Vessel>,
}

impl CuratedRegistry {
    /// The registry bundled into the binary.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Ok(Self {
            vessels: serde_json::from_str(BUNDLED_REGISTRY)?,
        })
    }

    /// Loads an operator-maintained registry file (canonical vessel JSON).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(path)?;
        Ok(Self {
            vessels: serde_json::from_str(&raw)?,
        })
    }
}

/// Whether two length measurements plausibly describe the same vessel.
///
/// An unknown length on either side passes; two confident measurements must
/// agree within the ratio threshold, which keeps two different vessels that
/// happen to share a display name from merging.
pub fn lengths_plausible(a: u32, b: u32, ratio_threshold: f64) -> bool {
    if a == 0 || b == 0 {
        return true;
    }
    let (lo, hi) = (a.min(b) as f64, a.max(b) as f64);
    lo / hi > ratio_threshold
}

/// Reconciles a captured dataset against the curated registry.
///
/// Output is one merged vessel per captured record, in the captured
/// dataset's order. On a name-plus-plausible-length match, identity and
/// descriptive fields take the captured value when present and fall back to
/// curated; the owner composite comes wholly from curated when curated
/// names one, else wholly from captured.
pub fn merge_registry(
    captured: &[Vessel],
    curated: &[Vessel],
    ratio_threshold: f64,
) -> Vec<Vessel> {
    let curated_by_name: std::collections::HashMap<String, &Vessel> = curated
        .iter()
        .map(|u| (u.name.to_uppercase(), u))
        .collect();

    captured
        .iter()
        .map(|raw| {
            // Captured snapshots written before sentinel normalization may
            // still carry 511.
            let mut c = raw.clone();
            c.length_meters = c.effective_length();

            let matched = curated_by_name.get(&c.name.to_uppercase()).filter(|u| {
                lengths_plausible(c.length_meters, u.effective_length(), ratio_threshold)
            });

            match matched {
                Some(u) => fill_from_curated(&c, u),
                None => c,
            }
        })
        .collect()
}

fn fill_from_curated(c: &Vessel, u: &Vessel) -> Vessel {
    Vessel {
        name: c.name.clone(),
        imo: pick(&c.imo, &u.imo),
        mmsi: pick(&c.mmsi, &u.mmsi),
        vessel_id: pick(&c.vessel_id, &u.vessel_id),
        length_meters: if c.length_meters > 0 {
            c.length_meters
        } else {
            u.effective_length()
        },
        builder: pick(&c.builder, &u.builder),
        year_built: if c.year_built > 0 {
            c.year_built
        } else {
            u.year_built
        },
        category: c.category,
        photo_url: pick(&c.photo_url, &u.photo_url),
        flag: c.flag.clone(),
        detailed_type: c.detailed_type.clone(),
        call_sign: c.call_sign.clone(),
        beam_meters: c.beam_meters,
        gross_tonnage: c.gross_tonnage,
        deadweight: c.deadweight,
        notable_info: c.notable_info.clone(),
        wikipedia_url: pick(&c.wikipedia_url, &u.wikipedia_url),
        owner: if u.has_owner() {
            u.owner.clone()
        } else if c.has_owner() {
            c.owner.clone()
        } else {
            Owner::default()
        },
        lat: c.lat,
        lon: c.lon,
        speed_knots: c.speed_knots,
        heading_degrees: c.heading_degrees,
        nav_status: c.nav_status.clone(),
        last_seen_at: c.last_seen_at,
    }
}

fn pick(captured: &str, curated: &str) -> String {
    if captured.is_empty() { curated } else { captured }.to_string()
}
