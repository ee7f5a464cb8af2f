//! The "richer record wins" merge reducer.
//!
//! Merging is a pure function over two partial records with explicit
//! per-field precedence, so the rules stay auditable in one place instead of
//! scattered across call sites. Used by the live session store when two
//! sightings share an identity key, and by the snapshot upsert path.

use crate::model::Vessel;

/// Merges `incoming` over `existing`, field by field.
///
/// A new non-empty value replaces the old value; otherwise the old value is
/// kept. This lets fresher live fields overwrite stale ones while still
/// filling gaps from prior partial sightings. A known field is never blanked
/// by an unknown one.
pub fn merge_richer(existing: &Vessel, incoming: &Vessel) -> Vessel {
    Vessel {
        name: pick_str(&existing.name, &incoming.name),
        imo: pick_str(&existing.imo, &incoming.imo),
        mmsi: pick_str(&existing.mmsi, &incoming.mmsi),
        vessel_id: pick_str(&existing.vessel_id, &incoming.vessel_id),
        length_meters: pick_num(existing.length_meters, incoming.length_meters),
        builder: pick_str(&existing.builder, &incoming.builder),
        year_built: pick_num(existing.year_built, incoming.year_built),
        // Every normalized record carries a category (motor-biased default),
        // so the newer sighting's category stands.
        category: incoming.category,
        photo_url: pick_str(&existing.photo_url, &incoming.photo_url),
        flag: pick_str(&existing.flag, &incoming.flag),
        detailed_type: pick_str(&existing.detailed_type, &incoming.detailed_type),
        call_sign: pick_str(&existing.call_sign, &incoming.call_sign),
        beam_meters: pick_num(existing.beam_meters, incoming.beam_meters),
        gross_tonnage: pick_num(existing.gross_tonnage, incoming.gross_tonnage),
        deadweight: pick_num(existing.deadweight, incoming.deadweight),
        notable_info: pick_str(&existing.notable_info, &incoming.notable_info),
        wikipedia_url: pick_str(&existing.wikipedia_url, &incoming.wikipedia_url),
        // Owner is an atomic composite, never field-merged across records.
        owner: if incoming.has_owner() {
            incoming.owner.clone()
        } else {
            existing.owner.clone()
        },
        lat: incoming.lat.or(existing.lat),
        lon: incoming.lon.or(existing.lon),
        speed_knots: incoming.speed_knots.or(existing.speed_knots),
        heading_degrees: incoming.heading_degrees.or(existing.heading_degrees),
        nav_status: incoming.nav_status.clone().or(existing.nav_status.clone()),
        last_seen_at: incoming.last_seen_at.or(existing.last_seen_at),
    }
}

fn pick_str(old: &str, new: &str) -> String {
    if new.is_empty() { old } else { new }.to_string()
}

fn pick_num(old: u32, new: u32) -> u32 {
    if new == 0 {
        old
    } else {
        new
    }
}
