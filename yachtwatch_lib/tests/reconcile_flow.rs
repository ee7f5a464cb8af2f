//! Capture-to-registry flow: raw feed frames through normalization, the
//! live session, and the curated-registry merge.

use serde_json::json;

use yachtwatch_lib::model::Category;
use yachtwatch_lib::normalize::normalize_record;
use yachtwatch_lib::registry::merge_registry;
use yachtwatch_lib::{CuratedRegistry, SessionStore};

#[test]
fn raw_frame_reconciles_against_curated_registry() {
    let raw = json!({
        "SHIPNAME": "MOONRISE",
        "LAT": "17.9",
        "LON": "-62.85",
        "SPEED": "12",
        "MMSI": "244067000"
    });
    let vessel = normalize_record(&raw).expect("positioned record normalizes");
    assert_eq!(vessel.speed_knots, Some(1.2));
    assert_eq!(vessel.mmsi, "244067000");

    let session = SessionStore::new();
    assert!(session.upsert(vessel));
    let captured = session.snapshot();

    let curated = CuratedRegistry::bundled().expect("bundled registry parses");
    let merged = merge_registry(&captured, &curated.vessels, 0.6);
    assert_eq!(merged.len(), 1);

    let moonrise = &merged[0];
    assert_eq!(moonrise.builder, "Feadship");
    assert_eq!(moonrise.owner.name, "Jan Koum");
    assert!(!moonrise.owner.business_summary.is_empty());
    // Live telemetry always comes from the captured side.
    assert_eq!(moonrise.lat, Some(17.9));
    assert_eq!(moonrise.lon, Some(-62.85));
    assert_eq!(moonrise.speed_knots, Some(1.2));
}

#[test]
fn repeated_frames_merge_in_session_before_registry() {
    let session = SessionStore::new();
    let first = json!({
        "SHIPNAME": "KORU",
        "MMSI": "319228000",
        "LAT": 43.2,
        "LON": 6.6,
        "SHIPTYPE": 36
    });
    let second = json!({
        "MMSI": "319228000",
        "LAT": 43.3,
        "LON": 6.7,
        "SPEED": "85"
    });
    assert_eq!(session.ingest_payload(&json!([first, second])), 2);
    assert_eq!(session.len(), 1);

    let captured = session.snapshot();
    let koru = &captured[0];
    assert_eq!(koru.name, "KORU");
    assert_eq!(koru.category, Category::Sailing);
    assert_eq!(koru.lat, Some(43.3));
    assert_eq!(koru.speed_knots, Some(8.5));

    let curated = CuratedRegistry::bundled().expect("bundled registry parses");
    let merged = merge_registry(&captured, &curated.vessels, 0.6);
    let koru = merged
        .iter()
        .find(|v| v.name.eq_ignore_ascii_case("KORU"))
        .expect("koru present after merge");
    assert_eq!(koru.owner.name, "Jeff Bezos");
    assert!(koru.length_meters > 0);
}
