use crate::config::rate_limit::{LimitGroup, RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::require_session;
use crate::websocket;
use axum::{extract::DefaultBodyLimit, middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes(body_limit: usize) -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    Router::new()
        .nest("/api/v1", api_routes(&rate_limit_config, body_limit))
        .route(
            "/ws/dashboard",
            routing::get(websocket::dashboard::ws_handler)
                .route_layer(middleware::from_fn(require_session)),
        )
}

fn api_routes(config: &RateLimitConfig, body_limit: usize) -> Router {
    let auth = auth_routes(config);
    let submit = submit_routes(config, body_limit);
    let admin = admin_routes(config).route_layer(middleware::from_fn(require_session));

    auth.merge(submit).merge(admin)
}

/// Session routes: login, logout, me.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/login", routing::post(handlers::auth::login))
        .route("/auth/logout", routing::post(handlers::auth::logout))
        .route(
            "/auth/me",
            routing::get(handlers::auth::current_session)
                .route_layer(middleware::from_fn(require_session)),
        );

    with_optional_rate_limit(router, config.enabled, config.rule(LimitGroup::Auth))
}

/// Public report submission. Media travels inline, so the body limit is raised.
fn submit_routes(config: &RateLimitConfig, body_limit: usize) -> Router {
    let router = Router::new()
        .route("/reports", routing::post(handlers::report::create_report))
        .layer(DefaultBodyLimit::max(body_limit));

    with_optional_rate_limit(router, config.enabled, config.rule(LimitGroup::Submit))
}

/// Dashboard routes, all behind the admin session guard.
fn admin_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/admin/reports",
            routing::get(handlers::dashboard::list_reports),
        )
        .route(
            "/admin/reports/{id}",
            routing::get(handlers::dashboard::get_report)
                .delete(handlers::dashboard::delete_report),
        )
        .route(
            "/admin/reports/{id}/status",
            routing::put(handlers::dashboard::update_status),
        )
        .route("/admin/stats", routing::get(handlers::dashboard::get_stats));

    with_optional_rate_limit(router, config.enabled, config.rule(LimitGroup::Admin))
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::error!("Invalid rate limit rule {:?}, limiter disabled", rule);
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
