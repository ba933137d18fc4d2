use crate::models::Location;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Upper bound on a position lookup.
pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a position could not be obtained.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location information unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Unknown geolocation error")]
    Unknown,
}

impl GeolocationError {
    /// Message shown to the person filing the report.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "تم رفض الوصول إلى الموقع، يرجى السماح بالوصول.",
            Self::PositionUnavailable => "معلومات الموقع غير متوفرة حالياً.",
            Self::Timeout => "انتهت مهلة تحديد الموقع.",
            Self::Unknown => "تعذر الحصول على الموقع.",
        }
    }
}

/// Source of the reporter's current position.
pub trait GeolocationProvider: Send + Sync {
    fn current_position(
        &self,
    ) -> impl Future<Output = Result<Location, GeolocationError>> + Send;
}

/// Look up a position, giving up after [`GEOLOCATION_TIMEOUT`].
pub async fn locate<G: GeolocationProvider>(provider: &G) -> Result<Location, GeolocationError> {
    locate_within(provider, GEOLOCATION_TIMEOUT).await
}

pub async fn locate_within<G: GeolocationProvider>(
    provider: &G,
    limit: Duration,
) -> Result<Location, GeolocationError> {
    match tokio::time::timeout(limit, provider.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout),
    }
}

/// Position resolved by the browser and sent along with the submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportedPosition {
    Resolved(Location),
    Failed(GeolocationError),
}

impl ReportedPosition {
    /// Build from the optional request fields. Coordinates win over an
    /// error code. With neither, the position counts as unavailable.
    pub fn from_request(location: Option<Location>, error: Option<GeolocationError>) -> Self {
        match (location.and_then(|l| Location::new(l.lat, l.lng)), error) {
            (Some(location), _) => Self::Resolved(location),
            (None, Some(error)) => Self::Failed(error),
            (None, None) => Self::Failed(GeolocationError::PositionUnavailable),
        }
    }
}

impl GeolocationProvider for ReportedPosition {
    fn current_position(
        &self,
    ) -> impl Future<Output = Result<Location, GeolocationError>> + Send {
        let result = match *self {
            Self::Resolved(location) => Ok(location),
            Self::Failed(error) => Err(error),
        };
        std::future::ready(result)
    }
}
