use crate::config::media::MediaConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Location, Report};
use crate::response::ApiResponse;
use crate::services::report_form::SUBMITTED_MESSAGE;
use crate::services::{GeolocationError, ReportForm, ReportStore, ReportedPosition, Submission};
use axum::{response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReportRequest {
    /// Photo as a base64 data URL (required)
    pub image: Option<String>,
    /// Voice note as a base64 data URL
    pub audio: Option<String>,
    /// Issue category label, or empty
    #[serde(default, rename = "type")]
    #[validate(length(max = 50))]
    pub kind: String,
    /// Position resolved by the browser
    pub location: Option<Location>,
    /// Why the browser could not resolve a position
    pub geolocation_error: Option<GeolocationError>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitReportResponse {
    pub report: Report,
    /// Set when the report was filed without a location
    pub location_error: Option<GeolocationError>,
    /// User-facing explanation of `location_error`
    pub location_message: Option<String>,
    /// Why the voice note was left out, if it was
    pub audio_warning: Option<String>,
}

impl From<Submission> for SubmitReportResponse {
    fn from(s: Submission) -> Self {
        Self {
            report: s.report,
            location_message: s.location_error.map(|e| e.user_message().to_string()),
            location_error: s.location_error,
            audio_warning: s.audio_error.map(|e| format!("Audio not attached: {}", e)),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = CreateReportRequest,
    responses(
        (status = 200, description = "Report submitted", body = SubmitReportResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 413, description = "Media too large", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report(
    Extension(store): Extension<ReportStore>,
    Extension(media): Extension<MediaConfig>,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let position = ReportedPosition::from_request(payload.location, payload.geolocation_error);

    let mut form = ReportForm::new();
    if let Some(image) = payload.image {
        form.capture_image(image);
    }
    if let Some(audio) = payload.audio {
        form.record_audio(audio);
    }
    form.select_kind(payload.kind);

    let submission = form.submit(&store, &position, &media).await?;

    Ok(ApiResponse::with_message(
        SubmitReportResponse::from(submission),
        SUBMITTED_MESSAGE,
    ))
}
