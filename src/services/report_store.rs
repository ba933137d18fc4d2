use crate::{
    error::AppResult,
    models::{IssueKind, Location, Report, ReportStatus},
    storage::KeyValueStore,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::sync::Arc;

pub const REPORTS_KEY: &str = "reports";

/// Shape accepted when reading the persisted collection. Every field is
/// optional so older or hand-edited entries can still be normalized.
#[derive(Debug, Deserialize)]
struct StoredReport {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    location: Option<serde_json::Value>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Gateway to the persisted report collection.
///
/// Every mutation reads the whole collection, changes it in memory and
/// writes the whole collection back. Nothing is merged: if two writers
/// interleave, the later write replaces the earlier one.
#[derive(Clone)]
pub struct ReportStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ReportStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load, normalize and sort (newest first) the stored reports.
    ///
    /// A missing key is initialized to `[]`. Unreadable data is logged and
    /// replaced with `[]`.
    pub fn load_all(&self) -> AppResult<Vec<Report>> {
        let Some(bytes) = self.kv.get(REPORTS_KEY)? else {
            self.write(&[])?;
            return Ok(Vec::new());
        };

        let stored: Vec<StoredReport> = match serde_json::from_slice(&bytes) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!("Error loading reports, resetting collection: {}", e);
                self.write(&[])?;
                return Ok(Vec::new());
            }
        };

        let now = Utc::now();
        let mut reports = Vec::with_capacity(stored.len());
        let mut missing_ids = Vec::new();
        for (position, raw) in stored.into_iter().enumerate() {
            // Derived from what is stored, so repeated loads agree.
            let fallback_id = raw
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .map(timestamp_id)
                .unwrap_or_else(|| position.to_string());
            let report = normalize(raw, now);
            if report.id.is_empty() {
                missing_ids.push((reports.len(), fallback_id));
            }
            reports.push(report);
        }
        for (index, fallback_id) in missing_ids {
            reports[index].id = unique_id(&reports, fallback_id);
        }

        sort_newest_first(&mut reports);
        Ok(reports)
    }

    pub fn find(&self, id: &str) -> AppResult<Option<Report>> {
        Ok(self.load_all()?.into_iter().find(|r| r.id == id))
    }

    /// Store `report` as the newest entry. An id already taken is bumped
    /// until unique, so the stored report is returned.
    pub fn append(&self, mut report: Report) -> AppResult<Report> {
        let mut reports = self.load_all()?;
        report.id = unique_id(&reports, report.id);
        reports.insert(0, report.clone());
        self.write(&reports)?;
        Ok(report)
    }

    /// Returns whether a report with `id` existed. Nothing is written when
    /// it did not.
    pub fn update_status(&self, id: &str, status: ReportStatus) -> AppResult<bool> {
        let mut reports = self.load_all()?;
        let mut found = false;
        for report in reports.iter_mut().filter(|r| r.id == id) {
            report.status = status;
            found = true;
        }
        if found {
            self.write(&reports)?;
        }
        Ok(found)
    }

    /// Returns whether a report with `id` existed. Nothing is written when
    /// it did not.
    pub fn remove(&self, id: &str) -> AppResult<bool> {
        let mut reports = self.load_all()?;
        let before = reports.len();
        reports.retain(|r| r.id != id);
        if reports.len() == before {
            return Ok(false);
        }
        self.write(&reports)?;
        Ok(true)
    }

    fn write(&self, reports: &[Report]) -> AppResult<()> {
        let bytes = serde_json::to_vec(reports)?;
        self.kv.set(REPORTS_KEY, &bytes)?;
        Ok(())
    }
}

/// Report ids are the creation time in epoch milliseconds.
fn unique_id(reports: &[Report], id: String) -> String {
    let taken = |candidate: &str| reports.iter().any(|r| r.id == candidate);
    if !taken(&id) {
        return id;
    }
    match id.parse::<i64>() {
        Ok(mut n) => loop {
            n += 1;
            let candidate = n.to_string();
            if !taken(&candidate) {
                return candidate;
            }
        },
        Err(_) => (1..)
            .map(|n| format!("{}-{}", id, n))
            .find(|candidate| !taken(candidate))
            .unwrap_or(id),
    }
}

pub fn timestamp_id(now: DateTime<Utc>) -> String {
    now.timestamp_millis().to_string()
}

/// `created_at` values are RFC 3339 in UTC with millisecond precision.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored `created_at`. Besides RFC 3339, bare dates and
/// zone-less date-times are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Stable; timestamps that do not parse sort after everything else.
fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by_cached_key(|r| std::cmp::Reverse(parse_timestamp(&r.created_at)));
}

fn normalize(raw: StoredReport, now: DateTime<Utc>) -> Report {
    Report {
        id: non_empty(raw.id).unwrap_or_default(),
        image: non_empty(raw.image),
        audio: non_empty(raw.audio),
        kind: non_empty(raw.kind).unwrap_or_else(|| IssueKind::fallback_label().to_string()),
        location: raw.location.as_ref().and_then(coerce_location),
        created_at: non_empty(raw.created_at).unwrap_or_else(|| format_timestamp(now)),
        status: raw
            .status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn coerce_location(value: &serde_json::Value) -> Option<Location> {
    let lat = value.get("lat")?.as_f64()?;
    let lng = value.get("lng")?.as_f64()?;
    Location::new(lat, lng)
}
