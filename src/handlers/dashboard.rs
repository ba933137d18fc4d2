use crate::error::{AppError, AppResult};
use crate::middleware::AdminSession;
use crate::models::ReportStatus;
use crate::response::ApiResponse;
use crate::services::{Dashboard, DashboardStats, ReportStore, Tab};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListReportsQuery {
    /// all, new, in_progress or resolved
    pub tab: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// new, in_progress or resolved
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusUpdateResponse {
    pub id: String,
    pub status: ReportStatus,
    /// False when no report had this id
    pub updated: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteReportResponse {
    pub id: String,
    /// False when no report had this id
    pub deleted: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/reports",
    params(
        ("tab" = Option<String>, Query, description = "Status tab: all, new, in_progress, resolved"),
    ),
    responses(
        (status = 200, description = "Reports in the tab plus overall counts", body = crate::services::DashboardView),
        (status = 400, description = "Unknown tab", body = AppError),
        (status = 401, description = "No admin session", body = AppError),
    ),
    tag = "dashboard"
)]
pub async fn list_reports(
    Extension(store): Extension<ReportStore>,
    _session: AdminSession,
    Query(params): Query<ListReportsQuery>,
) -> AppResult<impl IntoResponse> {
    let tab = match params.tab.as_deref() {
        Some(raw) => raw.parse::<Tab>().map_err(AppError::Validation)?,
        None => Tab::All,
    };

    let mut dashboard = Dashboard::mount(store)?;
    dashboard.set_tab(tab);

    Ok(ApiResponse::ok(dashboard.view()))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/reports/{id}",
    params(("id" = String, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report details", body = crate::models::Report),
        (status = 401, description = "No admin session", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "dashboard"
)]
pub async fn get_report(
    Extension(store): Extension<ReportStore>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let report = store.find(&id)?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok(report))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/reports/{id}/status",
    params(("id" = String, Path, description = "Report ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status written (or id unknown)", body = StatusUpdateResponse),
        (status = 400, description = "Unknown status", body = AppError),
        (status = 401, description = "No admin session", body = AppError),
    ),
    tag = "dashboard"
)]
pub async fn update_status(
    Extension(store): Extension<ReportStore>,
    session: AdminSession,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let status: ReportStatus = payload.status.parse().map_err(AppError::Validation)?;

    let updated = store.update_status(&id, status)?;
    if updated {
        tracing::info!("{} set report {} to {}", session.0.username, id, status);
    }

    let message = format!("الحالة: {}", status.label());
    Ok(ApiResponse::with_message(
        StatusUpdateResponse {
            id,
            status,
            updated,
        },
        message,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/reports/{id}",
    params(("id" = String, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report removed (or id unknown)", body = DeleteReportResponse),
        (status = 401, description = "No admin session", body = AppError),
    ),
    tag = "dashboard"
)]
pub async fn delete_report(
    Extension(store): Extension<ReportStore>,
    session: AdminSession,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let deleted = store.remove(&id)?;
    if deleted {
        tracing::info!("{} deleted report {}", session.0.username, id);
    }

    Ok(ApiResponse::ok(DeleteReportResponse { id, deleted }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    responses(
        (status = 200, description = "Report counts by status and type", body = DashboardStats),
        (status = 401, description = "No admin session", body = AppError),
    ),
    tag = "dashboard"
)]
pub async fn get_stats(
    Extension(store): Extension<ReportStore>,
    _session: AdminSession,
) -> AppResult<impl IntoResponse> {
    let reports = store.load_all()?;
    Ok(ApiResponse::ok(DashboardStats::from_reports(&reports)))
}
