use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use traidenis::bootstrap::build_app_state;
use traidenis::config::Config;
use traidenis::domain::entities::DEFAULT_TEMPLATE_HTML;
use traidenis::infrastructure::http::router::build_router;
use traidenis::infrastructure::persistence::InMemoryTemplateRepository;

async fn setup_app() -> (Router, Arc<InMemoryTemplateRepository>) {
    let repo = Arc::new(InMemoryTemplateRepository::new());
    let state = build_app_state(repo.clone(), &Config::default()).await;
    (build_router(state), repo)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn save_body(html: &str) -> Value {
    json!({
        "html_content": html,
        "author_id": "agent-1",
        "author_name": "Ona"
    })
}

#[tokio::test]
async fn test_current_template_defaults() {
    let (app, _) = setup_app().await;

    let (status, body) = send(&app, "GET", "/api/templates/current", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["html_content"], DEFAULT_TEMPLATE_HTML);
    assert_eq!(body["is_customized"], false);
    assert!(body["version"].is_null());
}

#[tokio::test]
async fn test_save_list_and_revert() {
    let (app, _) = setup_app().await;

    let (status, body) = send(&app, "PUT", "/api/templates/current", Some(save_body("<p>first</p>"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 1);

    let (status, body) = send(&app, "PUT", "/api/templates/current", Some(save_body("<p>second</p>"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 2);

    let (status, versions) = send(&app, "GET", "/api/templates/versions?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    let versions = versions.as_array().unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0]["version_number"], 1);
    assert!(versions[0].get("html_content").is_none());

    let id = versions[0]["id"].as_str().unwrap().to_string();
    let (status, version) = send(&app, "GET", &format!("/api/templates/versions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(version["html_content"], "<p>first</p>");

    let (status, report) = send(&app, "GET", &format!("/api/templates/versions/{}/diff", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["segments"][0]["kind"], "removed");
    assert_eq!(report["segments"][1]["kind"], "added");

    let author = json!({ "author_id": "agent-2", "author_name": "Jonas" });
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/templates/versions/{}/revert", id),
        Some(author),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 3);
    assert_eq!(body["html_content"], "<p>first</p>");

    let (_, current) = send(&app, "GET", "/api/templates/current", None).await;
    assert_eq!(current["version"], 3);
    assert_eq!(current["is_customized"], true);
}

#[tokio::test]
async fn test_revert_unknown_version_is_404() {
    let (app, _) = setup_app().await;
    let author = json!({ "author_id": "agent-2", "author_name": "Jonas" });

    let (status, body) = send(&app, "POST", "/api/templates/versions/nope/revert", Some(author)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_save_validation() {
    let (app, _) = setup_app().await;

    let (status, _) = send(&app, "PUT", "/api/templates/current", Some(save_body("   "))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "html_content": "<p>x</p>", "author_id": "", "author_name": "Ona" });
    let (status, _) = send(&app, "PUT", "/api/templates/current", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_restores_default() {
    let (app, _) = setup_app().await;
    send(&app, "PUT", "/api/templates/current", Some(save_body("<p>custom</p>"))).await;

    let author = json!({ "author_id": "agent-1", "author_name": "Ona" });
    let (status, body) = send(&app, "POST", "/api/templates/current/reset", Some(author)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 2);

    let (_, current) = send(&app, "GET", "/api/templates/current", None).await;
    assert_eq!(current["is_customized"], false);
}

#[tokio::test]
async fn test_render_uses_saved_template() {
    let (app, _) = setup_app().await;
    let template = r#"<body><p onclick="x()">{{client}} {{date}}</p><hr style="page-break-before: always"><p>2</p></body>"#;
    send(&app, "PUT", "/api/templates/current", Some(save_body(template))).await;

    let request = json!({ "variables": { "client": "UAB Ąžuolas" } });
    let (status, body) = send(&app, "POST", "/api/templates/render", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["unfilled_keys"], json!(["date"]));
    assert_eq!(body["variable_keys"], json!(["client", "date"]));

    let html = body["html"].as_str().unwrap();
    assert!(html.contains("UAB Ąžuolas"));
    assert!(html.contains("<!--PAGE_SPLIT-->"));
    assert!(!html.contains("onclick"));
}

#[tokio::test]
async fn test_render_supplied_html_in_print_mode() {
    let (app, _) = setup_app().await;

    let request = json!({
        "html_content": "<p>{{a}}</p>",
        "variables": { "a": "line 1\nline 2" },
        "mode": "print"
    });
    let (status, body) = send(&app, "POST", "/api/templates/render", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["html"], "<p>line 1<br>line 2</p>");
    assert_eq!(body["total_pages"], 1);
}

#[tokio::test]
async fn test_diff_endpoint() {
    let (app, _) = setup_app().await;

    let request = json!({ "old_html": "the quick fox", "new_html": "the slow fox" });
    let (status, body) = send(&app, "POST", "/api/templates/diff", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Text changes");
    assert_eq!(
        body["segments"],
        json!([
            { "kind": "same", "text": "the" },
            { "kind": "removed", "text": "quick" },
            { "kind": "added", "text": "slow" },
            { "kind": "same", "text": "fox" }
        ])
    );
}

#[tokio::test]
async fn test_save_during_outage_returns_500() {
    let (app, repo) = setup_app().await;
    repo.set_unavailable(true);

    let (status, body) = send(&app, "PUT", "/api/templates/current", Some(save_body("<p>x</p>"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    // Rendering still works from the cache
    let (status, body) = send(&app, "POST", "/api/templates/render", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_pages"], 2);
}

#[tokio::test]
async fn test_current_template_read_during_outage_serves_default() {
    let (app, repo) = setup_app().await;
    send(&app, "PUT", "/api/templates/current", Some(save_body("<p>saved</p>"))).await;
    repo.set_unavailable(true);

    let (status, body) = send(&app, "GET", "/api/templates/current", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["html_content"], DEFAULT_TEMPLATE_HTML);
    assert_eq!(body["is_customized"], false);
    assert!(body["version"].is_null());
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup_app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
