use crate::{error::AppError, models::Session, services::AuthService};
use axum::{
    extract::{FromRequestParts, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;

/// Where the dashboard sends visitors without a session.
pub const LOGIN_PATH: &str = "/admin/login";

/// Session of the admin behind the current request.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

/// Dashboard guard
///
/// Rejects the request unless an admin session is stored, and adds the
/// session to request extensions otherwise.
pub async fn require_session(
    Extension(auth): Extension<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(session) = auth.current()? else {
        return Ok(login_redirect());
    };

    request.extensions_mut().insert(AdminSession(session));
    Ok(next.run(request).await)
}

fn login_redirect() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Unauthorized",
            "redirect": LOGIN_PATH,
        })),
    )
        .into_response()
}

/// Extractor for AdminSession from request extensions
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminSession>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
