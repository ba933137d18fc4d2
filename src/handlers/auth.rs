use crate::error::{AppError, AppResult};
use crate::middleware::AdminSession;
use crate::models::Session;
use crate::response::ApiResponse;
use crate::services::AuthService;
use axum::{response::IntoResponse, Extension, Json};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = Session),
        (status = 401, description = "Invalid credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(auth): Extension<AuthService>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let session = auth.login(&payload.username, &payload.password)?;
    Ok(ApiResponse::ok(session))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Session closed"),
    ),
    tag = "auth"
)]
pub async fn logout(Extension(auth): Extension<AuthService>) -> AppResult<impl IntoResponse> {
    auth.logout()?;
    Ok(ApiResponse::with_message((), "Logged out"))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current admin session", body = Session),
        (status = 401, description = "No admin session", body = AppError),
    ),
    tag = "auth"
)]
pub async fn current_session(session: AdminSession) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(session.0))
}
