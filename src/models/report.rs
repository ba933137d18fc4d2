use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// A citizen report as persisted under the `reports` key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Report {
    /// Creation epoch in milliseconds, as a string
    pub id: String,
    /// Photo as a data URL
    pub image: Option<String>,
    /// Voice note as a data URL
    pub audio: Option<String>,
    /// Issue category label, possibly empty
    #[serde(rename = "type")]
    pub kind: String,
    pub location: Option<Location>,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    pub status: ReportStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    /// Both coordinates must be finite numbers.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if lat.is_finite() && lng.is_finite() {
            Some(Self { lat, lng })
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    New,
    InProgress,
    Resolved,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [Self::New, Self::InProgress, Self::Resolved];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }

    /// Arabic label shown to administrators.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "جديد",
            Self::InProgress => "قيد المعالجة",
            Self::Resolved => "تم الحل",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "status must be one of: {} (got '{}')",
                    Self::ALL.map(|status| status.as_str()).join(", "),
                    s
                )
            })
    }
}

/// Issue categories offered by the report form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueKind {
    Cleanliness,
    Lighting,
    Roads,
    Water,
    Other,
}

impl IssueKind {
    pub const ALL: [IssueKind; 5] = [
        Self::Cleanliness,
        Self::Lighting,
        Self::Roads,
        Self::Water,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cleanliness => "نظافة",
            Self::Lighting => "إنارة",
            Self::Roads => "طرق",
            Self::Water => "ماء",
            Self::Other => "أخرى",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == label)
    }

    /// Label substituted for reports stored without a category.
    pub fn fallback_label() -> &'static str {
        Self::Other.label()
    }
}
