mod common;

use serde_json::Value;

#[tokio::test]
async fn dashboard_requires_session() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/admin/reports"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["redirect"], "/admin/login");
}

#[tokio::test]
async fn websocket_requires_session() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(format!("{}/ws/dashboard", app.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn list_reports_newest_first_with_stats() {
    let app = common::spawn_app().await;
    let older = common::submit_report(&app, "طرق").await;
    let newer = common::submit_report(&app, "نظافة").await;
    common::login(&app).await;

    let resp = app
        .client
        .get(app.url("/admin/reports"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["tab"], "all");
    assert_eq!(data["reports"][0]["id"], newer.as_str());
    assert_eq!(data["reports"][1]["id"], older.as_str());
    assert_eq!(data["stats"]["total"], 2);
    assert_eq!(data["stats"]["new"], 2);
    assert_eq!(data["stats"]["types"]["طرق"], 1);
}

#[tokio::test]
async fn tab_filters_listing_but_not_stats() {
    let app = common::spawn_app().await;
    let id = common::submit_report(&app, "طرق").await;
    common::submit_report(&app, "ماء").await;
    common::login(&app).await;

    let resp = app
        .client
        .put(app.url(&format!("/admin/reports/{}/status", id)))
        .json(&serde_json::json!({ "status": "resolved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url("/admin/reports?tab=resolved"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let reports = body["data"]["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["id"], id.as_str());
    assert_eq!(body["data"]["stats"]["total"], 2);
    assert_eq!(body["data"]["stats"]["resolved"], 1);
}

#[tokio::test]
async fn unknown_tab_is_rejected() {
    let app = common::spawn_app().await;
    common::login(&app).await;

    let resp = app
        .client
        .get(app.url("/admin/reports?tab=archived"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn update_status_persists() {
    let app = common::spawn_app().await;
    let id = common::submit_report(&app, "إنارة").await;
    common::login(&app).await;

    let resp = app
        .client
        .put(app.url(&format!("/admin/reports/{}/status", id)))
        .json(&serde_json::json!({ "status": "in_progress" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["updated"], true);
    assert_eq!(body["data"]["status"], "in_progress");
    assert_eq!(body["message"], "الحالة: قيد المعالجة");

    let stored = app.reports.find(&id).unwrap().unwrap();
    assert_eq!(stored.status.as_str(), "in_progress");
}

#[tokio::test]
async fn update_unknown_id_changes_nothing() {
    let app = common::spawn_app().await;
    common::submit_report(&app, "إنارة").await;
    common::login(&app).await;
    let before = app.reports.load_all().unwrap();

    let resp = app
        .client
        .put(app.url("/admin/reports/missing/status"))
        .json(&serde_json::json!({ "status": "resolved" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["updated"], false);
    assert_eq!(app.reports.load_all().unwrap(), before);
}

#[tokio::test]
async fn invalid_status_is_rejected() {
    let app = common::spawn_app().await;
    let id = common::submit_report(&app, "إنارة").await;
    common::login(&app).await;

    let resp = app
        .client
        .put(app.url(&format!("/admin/reports/{}/status", id)))
        .json(&serde_json::json!({ "status": "closed" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn delete_report_removes_it() {
    let app = common::spawn_app().await;
    let id = common::submit_report(&app, "طرق").await;
    let kept = common::submit_report(&app, "طرق").await;
    common::login(&app).await;

    let resp = app
        .client
        .delete(app.url(&format!("/admin/reports/{}", id)))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["deleted"], true);

    let remaining = app.reports.load_all().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept);

    let resp = app
        .client
        .delete(app.url(&format!("/admin/reports/{}", id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["deleted"], false);
}

#[tokio::test]
async fn report_detail_and_missing() {
    let app = common::spawn_app().await;
    let id = common::submit_report(&app, "ماء").await;
    common::login(&app).await;

    let resp = app
        .client
        .get(app.url(&format!("/admin/reports/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["type"], "ماء");

    let resp = app
        .client
        .get(app.url("/admin/reports/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn stats_endpoint_counts_by_status() {
    let app = common::spawn_app().await;
    let id = common::submit_report(&app, "نظافة").await;
    common::submit_report(&app, "نظافة").await;
    common::login(&app).await;

    app.client
        .put(app.url(&format!("/admin/reports/{}/status", id)))
        .json(&serde_json::json!({ "status": "in_progress" }))
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url("/admin/stats"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["new"], 1);
    assert_eq!(body["data"]["in_progress"], 1);
    assert_eq!(body["data"]["resolved"], 0);
    assert_eq!(body["data"]["types"]["نظافة"], 2);
}
