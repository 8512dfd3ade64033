use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{
    app, app_with, Application, ErrorBody, LoginOutput, Store, Trigger, API_KEY, API_PREFIX,
    LOGIN_PATH, USERNAME,
};
use tower::ServiceExt;

const GROUP_ID: &str = "g1";
const APP_ID: &str = "a1";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(format!("{API_PREFIX}{uri}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(format!("{API_PREFIX}{uri}"))
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

fn seeded() -> Router {
    app_with(
        Store::default()
            .with_app(Application {
                id: APP_ID.to_string(),
                name: "orders".to_string(),
                group_id: GROUP_ID.to_string(),
                product: "standard".to_string(),
                ..Default::default()
            })
            .with_app(Application {
                id: "a2".to_string(),
                name: "sync".to_string(),
                group_id: GROUP_ID.to_string(),
                product: "atlas".to_string(),
                ..Default::default()
            }),
    )
}

async fn login(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            LOGIN_PATH,
            "",
            &format!(r#"{{"username":"{USERNAME}","apiKey":"{API_KEY}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token: LoginOutput = body_json(resp).await;
    token.access_token
}

// --- login ---

#[tokio::test]
async fn login_issues_token() {
    let token = login(&app()).await;
    assert_eq!(token.len(), 32);
}

#[tokio::test]
async fn login_rejects_wrong_key() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            LOGIN_PATH,
            "",
            &format!(r#"{{"username":"{USERNAME}","apiKey":"wrong"}}"#),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.error_code, "InvalidSession");
    assert_eq!(err.reason, "Unauthorized");
}

// --- apps ---

#[tokio::test]
async fn list_apps_requires_token() {
    let resp = seeded()
        .oneshot(empty_request("GET", "/groups/g1/apps", "forged"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.error_code, "InvalidSession");
}

#[tokio::test]
async fn list_apps_filters_by_product() {
    let app = seeded();
    let token = login(&app).await;

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/groups/g1/apps", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let apps: Vec<Application> = body_json(resp).await;
    assert_eq!(apps.len(), 2);

    let resp = app
        .oneshot(empty_request("GET", "/groups/g1/apps?product=atlas", &token))
        .await
        .unwrap();
    let apps: Vec<Application> = body_json(resp).await;
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].name, "sync");
}

#[tokio::test]
async fn list_apps_unknown_group_is_empty() {
    let app = seeded();
    let token = login(&app).await;

    let resp = app
        .oneshot(empty_request("GET", "/groups/other/apps", &token))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let apps: Vec<Application> = body_json(resp).await;
    assert!(apps.is_empty());
}

// --- triggers ---

#[tokio::test]
async fn triggers_of_unknown_app_return_404() {
    let app = seeded();
    let token = login(&app).await;

    let resp = app
        .oneshot(empty_request("GET", "/groups/g1/apps/missing/triggers", &token))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.error_code, "AppNotFound");
}

#[tokio::test]
async fn create_trigger_without_name_returns_400() {
    let app = seeded();
    let token = login(&app).await;

    let resp = app
        .oneshot(json_request(
            "POST",
            "/groups/g1/apps/a1/triggers",
            &token,
            r#"{"type":"DATABASE","function_id":"f1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.error, "trigger name must be set");
}

#[tokio::test]
async fn get_trigger_not_found() {
    let app = seeded();
    let token = login(&app).await;

    let resp = app
        .oneshot(empty_request("GET", "/groups/g1/apps/a1/triggers/nope", &token))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.error_code, "EventSubscriptionNotFound");
}

#[tokio::test]
async fn delete_trigger_not_found() {
    let app = seeded();
    let token = login(&app).await;

    let resp = app
        .oneshot(empty_request("DELETE", "/groups/g1/apps/a1/triggers/nope", &token))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn trigger_crud_lifecycle() {
    let app = seeded();
    let token = login(&app).await;
    let base = "/groups/g1/apps/a1/triggers";

    // create
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            base,
            &token,
            r#"{"name":"nightly","type":"SCHEDULED","function_id":"f1","config":{"schedule":"0 0 * * *"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Trigger = body_json(resp).await;
    assert_eq!(created.name, "nightly");
    assert_eq!(created.config["schedule_type"], "ADVANCED");
    assert_eq!(created.id.len(), 24);
    let id = created.id;

    // list — should contain the one trigger
    let resp = app
        .clone()
        .oneshot(empty_request("GET", base, &token))
        .await
        .unwrap();
    let triggers: Vec<Trigger> = body_json(resp).await;
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0].id, id);

    // update
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("{base}/{id}"),
            &token,
            r#"{"name":"hourly","type":"SCHEDULED","function_id":"f1","disabled":true,"config":{"schedule":"0 * * * *"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Trigger = body_json(resp).await;
    assert_eq!(updated.id, id);
    assert_eq!(updated.name, "hourly");
    assert!(updated.disabled);

    // get
    let resp = app
        .clone()
        .oneshot(empty_request("GET", &format!("{base}/{id}"), &token))
        .await
        .unwrap();
    let fetched: Trigger = body_json(resp).await;
    assert_eq!(fetched.config["schedule"], "0 * * * *");

    // delete
    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("{base}/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete — 404
    let resp = app
        .clone()
        .oneshot(empty_request("GET", &format!("{base}/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list after delete — empty
    let resp = app
        .oneshot(empty_request("GET", base, &token))
        .await
        .unwrap();
    let triggers: Vec<Trigger> = body_json(resp).await;
    assert!(triggers.is_empty());
}
