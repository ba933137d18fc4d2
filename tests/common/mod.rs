#![allow(dead_code)]

use balagh::config::{auth::AuthConfig, dashboard::DashboardConfig, media::MediaConfig};
use balagh::services::{AuthService, DashboardFeed, ReportStore};
use balagh::storage::{KeyValueStore, MemoryStore, NotifyingStore};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

fn init_env() {
    INIT.call_once(|| {
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
    });
}

pub struct TestApp {
    pub addr: String,
    pub kv: Arc<dyn KeyValueStore>,
    pub reports: ReportStore,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_media(MediaConfig::default()).await
}

pub async fn spawn_app_with_media(media: MediaConfig) -> TestApp {
    init_env();

    let store = NotifyingStore::new(MemoryStore::new());
    let feed = store.feed();
    let kv: Arc<dyn KeyValueStore> = Arc::new(store);

    let reports = ReportStore::new(kv.clone());
    let auth = AuthService::new(
        kv.clone(),
        AuthConfig {
            username: ADMIN_USERNAME.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        },
    );
    let dashboard_feed = DashboardFeed::new(DashboardConfig::default(), feed);

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(balagh::routes::create_routes(media.body_limit))
        .layer(axum::middleware::from_fn(
            balagh::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(kv.clone()))
        .layer(axum::extract::Extension(reports.clone()))
        .layer(axum::extract::Extension(auth))
        .layer(axum::extract::Extension(media))
        .layer(axum::extract::Extension(dashboard_feed));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        kv,
        reports,
        client: Client::new(),
    }
}

/// Open the admin session.
pub async fn login(app: &TestApp) {
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({
            "username": ADMIN_USERNAME,
            "password": ADMIN_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to log in");

    assert_eq!(resp.status(), 200, "admin login failed");
}

/// Smallest payload that passes the PNG signature check.
pub fn png_data_url() -> String {
    format!(
        "data:image/png;base64,{}",
        STANDARD.encode([0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00])
    )
}

pub fn webm_data_url() -> String {
    format!(
        "data:audio/webm;base64,{}",
        STANDARD.encode([0x1A, 0x45, 0xDF, 0xA3, 0x9F])
    )
}

/// Submit a report and return its id.
pub async fn submit_report(app: &TestApp, kind: &str) -> String {
    let resp = app
        .client
        .post(app.url("/reports"))
        .json(&serde_json::json!({
            "image": png_data_url(),
            "type": kind,
            "location": { "lat": 24.71, "lng": 46.67 }
        }))
        .send()
        .await
        .expect("Failed to submit report");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to submit report: status={}, body={}", status, body);
    }

    body["data"]["report"]["id"]
        .as_str()
        .expect("Response missing report id")
        .to_string()
}
