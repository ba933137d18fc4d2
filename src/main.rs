use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use balagh::config::{
    auth::AuthConfig, dashboard::DashboardConfig, media::MediaConfig, storage::StorageConfig,
};
use balagh::services::report_store::REPORTS_KEY;
use balagh::services::{AuthService, DashboardFeed, ReportStore};
use balagh::storage::{KeyValueStore, NotifyingStore};
use balagh::{middleware::security::security_headers_middleware, routes};
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        balagh::handlers::auth::login,
        balagh::handlers::auth::logout,
        balagh::handlers::auth::current_session,
        // Report routes
        balagh::handlers::report::create_report,
        // Dashboard routes
        balagh::handlers::dashboard::list_reports,
        balagh::handlers::dashboard::get_report,
        balagh::handlers::dashboard::update_status,
        balagh::handlers::dashboard::delete_report,
        balagh::handlers::dashboard::get_stats,
    ),
    components(
        schemas(
            balagh::response::ApiResponse<serde_json::Value>,
            balagh::error::AppError,
            balagh::models::Report,
            balagh::models::Location,
            balagh::models::ReportStatus,
            balagh::models::Session,
            balagh::services::GeolocationError,
            balagh::services::Tab,
            balagh::services::DashboardStats,
            balagh::services::DashboardView,
            // Auth
            balagh::handlers::auth::LoginRequest,
            // Report
            balagh::handlers::report::CreateReportRequest,
            balagh::handlers::report::SubmitReportResponse,
            // Dashboard
            balagh::handlers::dashboard::ListReportsQuery,
            balagh::handlers::dashboard::UpdateStatusRequest,
            balagh::handlers::dashboard::StatusUpdateResponse,
            balagh::handlers::dashboard::DeleteReportResponse,
        )
    ),
    tags(
        (name = "auth", description = "Admin session operations"),
        (name = "reports", description = "Public report submission"),
        (name = "dashboard", description = "Admin report management"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "balagh=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Balagh v{}...", env!("CARGO_PKG_VERSION"));

    // Fail fast on bad storage settings
    let storage_config = StorageConfig::from_env()?;
    let media_config = MediaConfig::from_env();
    let dashboard_config = DashboardConfig::from_env();
    let auth_config = AuthConfig::from_env();

    let store = NotifyingStore::new(storage_config.open()?);
    let feed = store.feed();
    let kv: Arc<dyn KeyValueStore> = Arc::new(store);
    tracing::info!("Storage opened: {:?}", storage_config.backend);

    let reports = ReportStore::new(kv.clone());
    let auth = AuthService::new(kv.clone(), auth_config);
    let dashboard_feed = DashboardFeed::new(dashboard_config, feed);
    tracing::info!(
        "Dashboard refresh: {:?} every {:?}",
        dashboard_config.refresh,
        dashboard_config.poll_interval
    );

    let app = create_app(media_config.body_limit)
        .layer(Extension(kv))
        .layer(Extension(reports))
        .layer(Extension(auth))
        .layer(Extension(media_config))
        .layer(Extension(dashboard_feed));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app(body_limit: usize) -> Router {
    let mut app = Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes(body_limit))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Static build of the reporting and dashboard pages, when present
    if let Ok(public_dir) = env::var("PUBLIC_DIR") {
        tracing::info!("Serving {} at /app", public_dir);
        app = app.nest_service("/app", ServeDir::new(public_dir));
    }

    // Same order as a ServiceBuilder (CORS outermost, security headers innermost),
    // applied per-layer so each response body is re-boxed into axum's `Body`.
    app.layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(kv): Extension<Arc<dyn KeyValueStore>>) -> impl IntoResponse {
    let storage_ok = kv.get(REPORTS_KEY).is_ok();

    let status = if storage_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Balagh",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
