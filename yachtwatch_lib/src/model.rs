//! The canonical vessel record and its owner composite.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Length value used by the source ecosystem to mean "unavailable".
/// Normalized to 0 at ingestion and treated as unknown everywhere else.
pub const LENGTH_SENTINEL: u32 = 511;

static TENDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bTT\b|TENDER|CHASE\b|\bRIB\b|\bAUX\b|UTILITY").expect("valid tender pattern")
});

/// Hull category. The capture feed's type codes default to motor when the
/// code is missing or unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Motor,
    Sailing,
}

/// Owner of a vessel. An atomic composite: a vessel either has an owner with
/// a non-empty name or carries the empty owner, never a partial one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub wikipedia_url: String,
    #[serde(default)]
    pub business_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_worth: Option<String>,
}

impl Owner {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// Canonical vessel record.
///
/// Descriptive fields use empty string / 0 for "unknown"; live telemetry
/// fields are `Option` because a record with no position never enters the
/// live layer in the first place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub imo: String,
    #[serde(default)]
    pub mmsi: String,
    /// Site-specific numeric id from the tracking site.
    #[serde(default)]
    pub vessel_id: String,
    /// Length overall in meters; 0 = unknown.
    #[serde(default)]
    pub length_meters: u32,
    #[serde(default)]
    pub builder: String,
    /// 0 = unknown.
    #[serde(default)]
    pub year_built: u32,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub photo_url: String,
    #[serde(default)]
    pub flag: String,
    #[serde(default)]
    pub detailed_type: String,
    #[serde(default)]
    pub call_sign: String,
    #[serde(default)]
    pub beam_meters: u32,
    #[serde(default)]
    pub gross_tonnage: u32,
    #[serde(default)]
    pub deadweight: u32,
    #[serde(default)]
    pub notable_info: String,
    #[serde(default)]
    pub wikipedia_url: String,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_knots: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_degrees: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl Vessel {
    /// Stable identity key: mmsi > site id > name, first non-empty.
    ///
    /// Two records sharing an identity key denote the same physical vessel
    /// and must merge rather than duplicate. Returns `None` for a record
    /// with no usable identity at all.
    pub fn identity_key(&self) -> Option<&str> {
        [&self.mmsi, &self.vessel_id, &self.name]
            .into_iter()
            .find(|field| !field.is_empty())
            .map(|s| s.as_str())
    }

    pub fn has_owner(&self) -> bool {
        !self.owner.is_empty()
    }

    /// Length with the sentinel treated as unknown. Snapshots written before
    /// sentinel normalization existed may still carry 511.
    pub fn effective_length(&self) -> u32 {
        if self.length_meters == LENGTH_SENTINEL {
            0
        } else {
            self.length_meters
        }
    }

    pub fn is_tender(&self) -> bool {
        is_tender_name(&self.name)
    }

    pub fn display_category(&self) -> DisplayCategory {
        if self.is_tender() {
            return DisplayCategory::Tender;
        }
        match self.effective_length() {
            50.. => DisplayCategory::Superyacht,
            20..=49 => DisplayCategory::Yacht,
            1..=19 => DisplayCategory::Boat,
            0 => DisplayCategory::Unknown,
        }
    }

    pub fn motion_status(&self) -> MotionStatus {
        MotionStatus::from_speed(self.speed_knots)
    }
}

/// Matches support/chase craft by name: "KORU TT1", "BLUE TENDER", etc.
pub fn is_tender_name(name: &str) -> bool {
    TENDER_RE.is_match(name)
}

/// Display category derived from tender status and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCategory {
    Tender,
    Superyacht,
    Yacht,
    Boat,
    Unknown,
}

impl DisplayCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tender => "tender",
            Self::Superyacht => "superyacht",
            Self::Yacht => "yacht",
            Self::Boat => "boat",
            Self::Unknown => "unknown",
        }
    }
}

/// Coarse motion status derived from speed over ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStatus {
    Anchored,
    Slow,
    Cruising,
    Underway,
    Unknown,
}

impl MotionStatus {
    pub fn from_speed(speed_knots: Option<f64>) -> Self {
        match speed_knots {
            None => Self::Unknown,
            Some(s) if s < 0.3 => Self::Anchored,
            Some(s) if s < 1.5 => Self::Slow,
            Some(s) if s < 5.0 => Self::Cruising,
            Some(_) => Self::Underway,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anchored => "anchored",
            Self::Slow => "slow",
            Self::Cruising => "cruising",
            Self::Underway => "underway",
            Self::Unknown => "unknown",
        }
    }
}
