//! Source Normalizer: converts one raw capture record into the canonical
//! [`Vessel`] shape.
//!
//! Capture payloads drift: keys arrive upper-snake ("SHIPNAME", "LAT",
//! "SPEED" in tenths of a knot) or camelCase already in canonical units.
//! Extraction is permissive and multi-pattern rather than schema-validated;
//! a non-numeric value in a numeric field becomes "unknown", never NaN.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::{Category, Owner, Vessel, LENGTH_SENTINEL};

/// Tracking-site type code for sailing rigs. Every other or missing code
/// maps to motor.
const SAILING_TYPE_CODE: i64 = 36;

/// Normalizes one raw record, or returns `None` for a record with neither
/// latitude nor longitude: a position-less record carries no actionable
/// identity for the live layer.
pub fn normalize_record(raw: &Value) -> Option<Vessel> {
    let lat = f64_at(raw, &["LAT", "lat"]);
    let lon = f64_at(raw, &["LON", "lon"]);
    if lat.is_none() && lon.is_none() {
        return None;
    }

    // The upper-snake feed reports speed in tenths of a knot; the camelCase
    // shape is already in knots.
    let speed_knots = if raw.get("SPEED").is_some() {
        f64_at(raw, &["SPEED"]).map(|s| s / 10.0)
    } else {
        f64_at(raw, &["speed", "speedKnots"])
    };

    let mut length_meters = u32_at(raw, &["LENGTH", "length", "lengthMeters"]).unwrap_or(0);
    if length_meters == LENGTH_SENTINEL {
        length_meters = 0;
    }

    let owner = raw
        .get("owner")
        .and_then(|v| serde_json::from_value::<Owner>(v.clone()).ok())
        .unwrap_or_default();

    Some(Vessel {
        name: str_at(raw, &["SHIPNAME", "NAME", "shipname", "name"]).unwrap_or_default(),
        imo: str_at(raw, &["IMO", "imo"]).unwrap_or_default(),
        mmsi: str_at(raw, &["MMSI", "mmsi"]).unwrap_or_default(),
        vessel_id: str_at(raw, &["SHIP_ID", "ship_id", "SHIPID", "vesselId"]).unwrap_or_default(),
        length_meters,
        builder: str_at(raw, &["builder"]).unwrap_or_default(),
        year_built: u32_at(raw, &["YEAR_BUILT", "year_built", "yearBuilt"]).unwrap_or(0),
        category: category_of(raw),
        photo_url: str_at(raw, &["photoUrl"]).unwrap_or_default(),
        flag: str_at(raw, &["FLAG", "flag"]).unwrap_or_default(),
        detailed_type: str_at(raw, &["detailedType"]).unwrap_or_default(),
        call_sign: str_at(raw, &["CALLSIGN", "callSign"]).unwrap_or_default(),
        beam_meters: u32_at(raw, &["WIDTH", "beamMeters"]).unwrap_or(0),
        gross_tonnage: u32_at(raw, &["grossTonnage"]).unwrap_or(0),
        deadweight: u32_at(raw, &["DWT", "deadweight"]).unwrap_or(0),
        notable_info: str_at(raw, &["notableInfo"]).unwrap_or_default(),
        wikipedia_url: str_at(raw, &["wikipediaUrl"]).unwrap_or_default(),
        owner,
        lat,
        lon,
        speed_knots,
        heading_degrees: u32_at(raw, &["HEADING", "heading", "headingDegrees"])
            .and_then(|h| u16::try_from(h).ok()),
        nav_status: str_at(raw, &["STATUS", "status", "navStatus"]),
        last_seen_at: last_seen_at(raw),
    })
}

/// Pulls the vessel array out of a capture payload, tolerating the known
/// response shapes: a top-level array, `{data:{rows:[..]}}`, `{data:[..]}`,
/// `{rows:[..]}`, or an object of arrays keyed by type code.
pub fn extract_payload_vessels(payload: &Value) -> Vec<Vessel> {
    if let Some(items) = payload.as_array() {
        return normalize_all(items);
    }

    if let Some(data) = payload.get("data") {
        if let Some(rows) = data.get("rows").and_then(Value::as_array) {
            return normalize_all(rows);
        }
        if let Some(items) = data.as_array() {
            return normalize_all(items);
        }
    }

    if let Some(rows) = payload.get("rows").and_then(Value::as_array) {
        return normalize_all(rows);
    }

    if let Some(map) = payload.as_object() {
        for value in map.values() {
            if let Some(items) = value.as_array() {
                let vessel_shaped = items.first().is_some_and(|first| {
                    ["SHIPNAME", "MMSI", "LAT", "name"]
                        .iter()
                        .any(|key| first.get(key).is_some())
                });
                if vessel_shaped {
                    return normalize_all(items);
                }
            }
        }
    }

    Vec::new()
}

fn normalize_all(items: &[Value]) -> Vec<Vessel> {
    items.iter().filter_map(normalize_record).collect()
}

fn category_of(raw: &Value) -> Category {
    if let Some(code) = i64_at(raw, &["SHIPTYPE", "shiptype", "TYPE_SPECIFIC"]) {
        if code == SAILING_TYPE_CODE {
            return Category::Sailing;
        }
        return Category::Motor;
    }
    match str_at(raw, &["category", "type"]).as_deref() {
        Some("sailing") => Category::Sailing,
        _ => Category::Motor,
    }
}

fn last_seen_at(raw: &Value) -> Option<DateTime<Utc>> {
    // Epoch seconds from the live feed, RFC3339 from normalized records.
    if let Some(epoch) = i64_at(raw, &["LAST_POS"]) {
        return DateTime::from_timestamp(epoch, 0);
    }
    str_at(raw, &["TIMESTAMP", "lastSeenAt", "lastUpdate"])
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn first_value<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| raw.get(*key))
        .filter(|v| !v.is_null())
}

fn str_at(raw: &Value, keys: &[&str]) -> Option<String> {
    let value = first_value(raw, keys)?;
    let s = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn f64_at(raw: &Value, keys: &[&str]) -> Option<f64> {
    let value = first_value(raw, keys)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn i64_at(raw: &Value, keys: &[&str]) -> Option<i64> {
    let value = first_value(raw, keys)?;
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn u32_at(raw: &Value, keys: &[&str]) -> Option<u32> {
    f64_at(raw, keys).and_then(|f| {
        if f.is_sign_negative() {
            None
        } else {
            Some(f.round() as u32)
        }
    })
}
