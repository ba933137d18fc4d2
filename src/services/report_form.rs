use crate::{
    config::media::MediaConfig,
    error::{AppError, AppResult},
    models::{IssueKind, Report, ReportStatus},
    services::{
        geolocation::{locate, GeolocationError, GeolocationProvider},
        report_store::{format_timestamp, timestamp_id, ReportStore},
    },
    utils::{DataUrl, DataUrlError, MediaKind},
};

pub const MISSING_IMAGE_MESSAGE: &str = "يرجى اختيار صورة على الأقل";
pub const SUBMITTED_MESSAGE: &str = "تم إرسال البلاغ بنجاح!";

/// Fields collected by the public report form before submission.
#[derive(Debug, Default, Clone)]
pub struct ReportForm {
    image: Option<String>,
    audio: Option<String>,
    kind: String,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub report: Report,
    /// Set when the report was filed without a location.
    pub location_error: Option<GeolocationError>,
    /// Set when the recorded clip was discarded.
    pub audio_error: Option<DataUrlError>,
}

impl ReportForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture_image(&mut self, data_url: impl Into<String>) {
        self.image = Some(data_url.into());
    }

    pub fn retake_image(&mut self) {
        self.image = None;
    }

    pub fn record_audio(&mut self, data_url: impl Into<String>) {
        self.audio = Some(data_url.into());
    }

    pub fn select_kind(&mut self, label: impl Into<String>) {
        self.kind = label.into();
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn audio(&self) -> Option<&str> {
        self.audio.as_deref()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.audio.is_none() && self.kind.is_empty()
    }

    /// Validate, locate and file the report. The form is cleared only when
    /// the report was stored.
    ///
    /// A missing image blocks submission. A failed location lookup does not:
    /// the report is stored without coordinates and the failure is returned
    /// in [`Submission::location_error`].
    pub async fn submit<G: GeolocationProvider>(
        &mut self,
        store: &ReportStore,
        geolocation: &G,
        media: &MediaConfig,
    ) -> AppResult<Submission> {
        let image = self
            .image
            .as_deref()
            .filter(|i| !i.trim().is_empty())
            .ok_or_else(|| AppError::Validation(MISSING_IMAGE_MESSAGE.to_string()))?;
        check_image(image, media)?;

        // The voice note is optional, so a clip that fails the type checks
        // is dropped rather than losing the report.
        let mut audio = self.audio.as_deref().filter(|a| !a.trim().is_empty());
        let mut audio_error = None;
        if let Some(clip) = audio {
            match DataUrl::validate(clip, MediaKind::Audio, media.max_bytes) {
                Ok(_) => {}
                Err(DataUrlError::TooLarge { .. }) => return Err(AppError::PayloadTooLarge),
                Err(e) => {
                    tracing::warn!("Dropping unreadable audio clip: {}", e);
                    audio = None;
                    audio_error = Some(e);
                }
            }
        }

        if !self.kind.is_empty() && IssueKind::from_label(&self.kind).is_none() {
            return Err(AppError::Validation(format!(
                "type must be empty or one of: {}",
                IssueKind::ALL.map(|k| k.label()).join(", ")
            )));
        }

        let (location, location_error) = match locate(geolocation).await {
            Ok(location) => (Some(location), None),
            Err(e) => {
                tracing::warn!("Filing report without location: {}", e);
                (None, Some(e))
            }
        };

        let now = chrono::Utc::now();
        let report = store.append(Report {
            id: timestamp_id(now),
            image: Some(image.to_string()),
            audio: audio.map(str::to_string),
            kind: self.kind.clone(),
            location,
            created_at: format_timestamp(now),
            status: ReportStatus::New,
        })?;
        tracing::info!("Report {} submitted", report.id);

        *self = Self::default();
        Ok(Submission {
            report,
            location_error,
            audio_error,
        })
    }
}

fn check_image(raw: &str, media: &MediaConfig) -> AppResult<()> {
    match DataUrl::validate(raw, MediaKind::Image, media.max_bytes) {
        Ok(_) => Ok(()),
        Err(DataUrlError::TooLarge { .. }) => Err(AppError::PayloadTooLarge),
        Err(e) => Err(AppError::Validation(format!("Invalid image: {}", e))),
    }
}
