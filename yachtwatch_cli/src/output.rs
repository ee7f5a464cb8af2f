use serde::Serialize;
use tabled::{Table, Tabled};

use yachtwatch_lib::Vessel;

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled, Serialize)]
struct VesselRow {
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Class")]
    #[serde(rename = "Class")]
    class: String,
    #[tabled(rename = "Length")]
    #[serde(rename = "Length")]
    length: String,
    #[tabled(rename = "Builder")]
    #[serde(rename = "Builder")]
    builder: String,
    #[tabled(rename = "Year")]
    #[serde(rename = "Year")]
    year: String,
    #[tabled(rename = "Owner")]
    #[serde(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
    #[tabled(rename = "Position")]
    #[serde(rename = "Position")]
    position: String,
}

// -- Row builders --

fn build_vessel_rows(vessels: &[Vessel]) -> Vec<VesselRow> {
    vessels
        .iter()
        .map(|v| VesselRow {
            name: v.name.clone(),
            class: v.display_category().as_str().to_string(),
            length: format_length(v.effective_length()),
            builder: v.builder.clone(),
            year: if v.year_built == 0 {
                String::new()
            } else {
                v.year_built.to_string()
            },
            owner: v.owner.name.clone(),
            status: v.motion_status().as_str().to_string(),
            position: format_position(v.lat, v.lon),
        })
        .collect()
}

fn format_length(length: u32) -> String {
    if length == 0 {
        String::new()
    } else {
        format!("{} m", length)
    }
}

fn format_position(lat: Option<f64>, lon: Option<f64>) -> String {
    match (lat, lon) {
        (Some(lat), Some(lon)) => format!("{:.3}, {:.3}", lat, lon),
        _ => String::new(),
    }
}

// -- Table output --

pub fn print_vessels_table(vessels: &[Vessel]) {
    println!("{}", Table::new(build_vessel_rows(vessels)));
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yachtwatch_lib::model::Owner;

    fn sample() -> Vessel {
        Vessel {
            name: "MOONRISE".into(),
            length_meters: 100,
            builder: "Feadship".into(),
            year_built: 2020,
            owner: Owner {
                name: "Jan Koum".into(),
                ..Default::default()
            },
            lat: Some(17.9),
            lon: Some(-62.85),
            speed_knots: Some(0.1),
            ..Default::default()
        }
    }

    #[test]
    fn row_mapping_formats_fields() {
        let rows = build_vessel_rows(&[sample()]);
        let row = &rows[0];
        assert_eq!(row.name, "MOONRISE");
        assert_eq!(row.class, "superyacht");
        assert_eq!(row.length, "100 m");
        assert_eq!(row.year, "2020");
        assert_eq!(row.owner, "Jan Koum");
        assert_eq!(row.status, "anchored");
        assert_eq!(row.position, "17.900, -62.850");
    }

    #[test]
    fn unknown_fields_render_blank() {
        let v = Vessel {
            name: "GHOST".into(),
            lat: Some(1.0),
            ..Default::default()
        };
        let rows = build_vessel_rows(&[v]);
        let row = &rows[0];
        assert_eq!(row.length, "");
        assert_eq!(row.year, "");
        assert_eq!(row.position, "");
        assert_eq!(row.status, "unknown");
    }

    #[test]
    fn empty_input_builds_no_rows() {
        assert!(build_vessel_rows(&[]).is_empty());
    }
}
