// Downtime log domain model
use super::duration::format_duration;
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_DOWNTIME_LIMIT: u32 = 50;

/// One downtime event as reported by `GET /downtime/history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DowntimeEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub end_timestamp: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    /// Minutes.
    #[serde(default)]
    pub duration: u64,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ongoing: bool,
}

/// Display-ready downtime row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DowntimeEntry {
    pub id: String,
    pub timestamp: String,
    pub component: String,
    pub reason: String,
    pub duration: String,
    pub duration_minutes: u64,
    pub severity: String,
    pub resolved: bool,
    pub resolved_by: String,
    pub actions: Vec<String>,
    pub preventive_maintenance: bool,
    pub ongoing: bool,
}

impl DowntimeEntry {
    /// `index` keeps generated ids unique within one listing.
    pub fn from_event(event: &DowntimeEvent, index: usize) -> Self {
        Self {
            id: event
                .id
                .clone()
                .unwrap_or_else(|| format!("downtime-{}", index + 1)),
            timestamp: event
                .timestamp
                .as_deref()
                .and_then(display_timestamp)
                .unwrap_or_else(|| "N/A".to_string()),
            component: event
                .component
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            reason: event
                .reason
                .clone()
                .unwrap_or_else(|| "No reason specified".to_string()),
            duration: format_duration(event.duration as f64),
            duration_minutes: event.duration,
            severity: event
                .severity
                .as_deref()
                .map(capitalize)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            resolved: event.status.as_deref() == Some("resolved"),
            resolved_by: event
                .technician
                .clone()
                .unwrap_or_else(|| "Auto-detected".to_string()),
            actions: vec![
                event
                    .notes
                    .clone()
                    .unwrap_or_else(|| "No additional notes".to_string()),
            ],
            preventive_maintenance: event.event_type.as_deref() == Some("preventive"),
            ongoing: event.ongoing,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Backend timestamps are ISO 8601, with or without an offset.
fn display_timestamp(raw: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|t| t.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()?;
    Some(parsed.format("%d/%m/%Y %H.%M").to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDowntime {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total_duration: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DowntimeStatistics {
    #[serde(default)]
    pub total_downtime: u64,
    #[serde(default)]
    pub total_duration_minutes: u64,
    #[serde(default)]
    pub average_duration_minutes: f64,
    #[serde(default)]
    pub preventive_count: u64,
    #[serde(default)]
    pub reactive_count: u64,
    #[serde(default)]
    pub by_component: BTreeMap<String, ComponentDowntime>,
    #[serde(default)]
    pub by_severity: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeFilter {
    pub limit: u32,
    /// `None` lists every component.
    pub component: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for DowntimeFilter {
    fn default() -> Self {
        Self {
            limit: DEFAULT_DOWNTIME_LIMIT,
            component: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl DowntimeFilter {
    /// Query parameters in backend order; `all` means no component filter.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        if let Some(component) = self.component.as_deref().filter(|c| *c != "all") {
            pairs.push(("component", component.to_string()));
        }
        pairs.extend(date_pairs(self.start_date, self.end_date));
        pairs
    }
}

pub fn date_pairs(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(start) = start_date {
        pairs.push(("start_date", start.format("%Y-%m-%d").to_string()));
    }
    if let Some(end) = end_date {
        pairs.push(("end_date", end.format("%Y-%m-%d").to_string()));
    }
    pairs
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    #[serde(rename = "last_7_days", alias = "7days")]
    Last7Days,
    #[default]
    #[serde(rename = "last_30_days", alias = "30days")]
    Last30Days,
    #[serde(rename = "last_90_days", alias = "90days")]
    Last90Days,
    All,
}

impl DateRange {
    /// `(start, end)` for a listing ending `today`; `All` has no start.
    pub fn resolve(&self, today: NaiveDate) -> (Option<NaiveDate>, NaiveDate) {
        let days = match self {
            DateRange::Last7Days => 7,
            DateRange::Last30Days => 30,
            DateRange::Last90Days => 90,
            DateRange::All => return (None, today),
        };
        (today.checked_sub_days(Days::new(days)), today)
    }
}
