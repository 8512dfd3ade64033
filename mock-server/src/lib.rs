//! In-memory fake of the App Services administration API.
//!
//! Serves the login route plus the apps and triggers endpoints under
//! `/api/admin/v3.0`. API routes require a bearer token previously issued by
//! the login route. Errors use the `{error_code, reason, error}` body.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/admin/v3.0";
pub const LOGIN_PATH: &str = "/auth/providers/mongodb-cloud/login";
pub const USERNAME: &str = "mock-user";
pub const API_KEY: &str = "mock-api-key";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: String,
    pub client_app_id: String,
    pub name: String,
    pub location: String,
    pub deployment_model: String,
    pub domain_id: String,
    pub group_id: String,
    /// Only used for the `product` filter.
    #[serde(default, skip_serializing)]
    pub product: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function_id: String,
    pub disabled: bool,
    pub config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_processors: Option<Value>,
    pub last_modified: i64,
}

#[derive(Deserialize)]
pub struct TriggerInput {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub function_id: String,
    pub disabled: Option<bool>,
    pub config: Option<Value>,
    pub event_processors: Option<Value>,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub username: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub device_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_code: String,
    pub reason: String,
    pub error: String,
}

/// Backing state of the fake server.
#[derive(Default)]
pub struct Store {
    tokens: HashSet<String>,
    apps: HashMap<String, Vec<Application>>,
    triggers: HashMap<(String, String), Vec<Trigger>>,
}

impl Store {
    /// Seeds an application into its `group_id`.
    pub fn with_app(mut self, app: Application) -> Self {
        self.apps.entry(app.group_id.clone()).or_default().push(app);
        self
    }

    fn has_app(&self, group_id: &str, app_id: &str) -> bool {
        self.apps
            .get(group_id)
            .is_some_and(|apps| apps.iter().any(|app| app.id == app_id))
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error_code: &str, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error_code: error_code.to_string(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                error: error.into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn app() -> Router {
    app_with(Store::default())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    let api = Router::new()
        .route(LOGIN_PATH, post(login))
        .route("/groups/{group_id}/apps", get(list_apps))
        .route(
            "/groups/{group_id}/apps/{app_id}/triggers",
            get(list_triggers).post(create_trigger),
        )
        .route(
            "/groups/{group_id}/apps/{app_id}/triggers/{trigger_id}",
            get(get_trigger).put(update_trigger).delete(delete_trigger),
        );
    Router::new().nest(API_PREFIX, api).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Store::default()).await
}

pub async fn run_with(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(store)).await
}

async fn login(State(db): State<Db>, Json(input): Json<LoginInput>) -> Result<Json<LoginOutput>, ApiError> {
    if input.username != USERNAME || input.api_key != API_KEY {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "InvalidSession",
            "invalid username/password",
        ));
    }
    let access_token = Uuid::new_v4().simple().to_string();
    db.write().await.tokens.insert(access_token.clone());
    tracing::info!(username = %input.username, "issued access token");
    Ok(Json(LoginOutput {
        access_token,
        refresh_token: Uuid::new_v4().simple().to_string(),
        user_id: object_id(),
        device_id: "000000000000000000000000".to_string(),
    }))
}

async fn list_apps(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Application>>, ApiError> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let product = params.get("product");
    let apps = store
        .apps
        .get(&group_id)
        .map(|apps| {
            apps.iter()
                .filter(|app| product.map_or(true, |p| &app.product == p))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Ok(Json(apps))
}

async fn list_triggers(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((group_id, app_id)): Path<(String, String)>,
) -> Result<Json<Vec<Trigger>>, ApiError> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    require_app(&store, &group_id, &app_id)?;
    let triggers = store
        .triggers
        .get(&(group_id, app_id))
        .cloned()
        .unwrap_or_default();
    Ok(Json(triggers))
}

async fn create_trigger(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((group_id, app_id)): Path<(String, String)>,
    Json(input): Json<TriggerInput>,
) -> Result<(StatusCode, Json<Trigger>), ApiError> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    require_app(&store, &group_id, &app_id)?;
    let trigger = build_trigger(object_id(), input)?;
    store
        .triggers
        .entry((group_id, app_id))
        .or_default()
        .push(trigger.clone());
    Ok((StatusCode::CREATED, Json(trigger)))
}

async fn get_trigger(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((group_id, app_id, trigger_id)): Path<(String, String, String)>,
) -> Result<Json<Trigger>, ApiError> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    require_app(&store, &group_id, &app_id)?;
    store
        .triggers
        .get(&(group_id, app_id))
        .and_then(|triggers| triggers.iter().find(|t| t.id == trigger_id))
        .cloned()
        .map(Json)
        .ok_or_else(|| trigger_not_found(&trigger_id))
}

async fn update_trigger(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((group_id, app_id, trigger_id)): Path<(String, String, String)>,
    Json(input): Json<TriggerInput>,
) -> Result<Json<Trigger>, ApiError> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    require_app(&store, &group_id, &app_id)?;
    let updated = build_trigger(trigger_id.clone(), input)?;
    let slot = store
        .triggers
        .get_mut(&(group_id, app_id))
        .and_then(|triggers| triggers.iter_mut().find(|t| t.id == trigger_id))
        .ok_or_else(|| trigger_not_found(&trigger_id))?;
    *slot = updated.clone();
    Ok(Json(updated))
}

async fn delete_trigger(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((group_id, app_id, trigger_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    require_app(&store, &group_id, &app_id)?;
    let triggers = store.triggers.entry((group_id, app_id)).or_default();
    let before = triggers.len();
    triggers.retain(|t| t.id != trigger_id);
    if triggers.len() == before {
        return Err(trigger_not_found(&trigger_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn authorize(store: &Store, headers: &HeaderMap) -> Result<(), ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match token {
        Some(token) if store.tokens.contains(token) => Ok(()),
        _ => Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "InvalidSession",
            "invalid session: access token invalid",
        )),
    }
}

fn require_app(store: &Store, group_id: &str, app_id: &str) -> Result<(), ApiError> {
    if store.has_app(group_id, app_id) {
        return Ok(());
    }
    Err(ApiError::new(
        StatusCode::NOT_FOUND,
        "AppNotFound",
        format!("app not found: '{app_id}'"),
    ))
}

fn trigger_not_found(trigger_id: &str) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "EventSubscriptionNotFound",
        format!("trigger not found: '{trigger_id}'"),
    )
}

fn build_trigger(id: String, input: TriggerInput) -> Result<Trigger, ApiError> {
    if input.name.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "InvalidParameter",
            "trigger name must be set",
        ));
    }
    if input.function_id.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "InvalidParameter",
            "function_id must be set",
        ));
    }
    let mut config = input.config.unwrap_or_else(|| Value::Object(Default::default()));
    if input.kind == "SCHEDULED" {
        if let Some(config) = config.as_object_mut() {
            config
                .entry("schedule_type")
                .or_insert_with(|| Value::String("ADVANCED".to_string()));
        }
    }
    Ok(Trigger {
        id,
        name: input.name,
        kind: input.kind,
        function_id: input.function_id,
        disabled: input.disabled.unwrap_or(false),
        config,
        event_processors: input.event_processors,
        last_modified: now_secs(),
    })
}

/// A 24-hex-digit identifier in the shape of an ObjectId.
fn object_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(24);
    id
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
