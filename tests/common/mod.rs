//! In-process fake of the Keycloak token and account endpoints.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use tokio::sync::oneshot;

use keycloak_account_provider::api::{EndpointLayout, UpdateMode};
use keycloak_account_provider::config::ProviderConfig;

pub const CLIENT_ID: &str = "terraform";
pub const CLIENT_SECRET: &str = "secret";
pub const TOKEN: &str = "test-token";
pub const CREATED_ON: i64 = 1_700_000_000;
/// Account id for which the fake answers 500
pub const EXPLODING_ID: &str = "explode";

#[derive(Default)]
pub struct Store {
    accounts: Mutex<HashMap<(String, String), Value>>,
    next_id: AtomicU64,
    pub puts: AtomicUsize,
    pub token_requests: AtomicUsize,
    /// When set, every GET answers 404 even for stored accounts
    pub hide_reads: AtomicBool,
}

impl Store {
    pub fn account(&self, realm: &str, id: &str) -> Option<Value> {
        self.accounts
            .lock()
            .unwrap()
            .get(&(realm.to_string(), id.to_string()))
            .cloned()
    }

    pub fn insert(&self, realm: &str, id: &str, account: Value) {
        self.accounts
            .lock()
            .unwrap()
            .insert((realm.to_string(), id.to_string()), account);
    }

    pub fn len(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

pub struct FakeKeycloak {
    pub base_url: String,
    pub store: Arc<Store>,
    _shutdown_tx: oneshot::Sender<()>,
}

impl FakeKeycloak {
    pub async fn start() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let store = Arc::new(Store::default());
        let app = Router::new()
            .route("/realms/{realm}/protocol/openid-connect/token", post(token))
            .route("/realms/{realm}/api/v1/accounts", post(create_account))
            .route(
                "/realms/{realm}/api/v1/accounts/{id}",
                get(get_account).put(put_account).delete(delete_account),
            )
            .route("/realms/{realm}/accounts", post(create_account))
            .route(
                "/realms/{realm}/accounts/{id}",
                get(get_account).put(put_account).delete(delete_account),
            )
            .with_state(store.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake keycloak");
        let addr = listener.local_addr().expect("local addr");

        let (_shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
        });

        Self {
            base_url: format!("http://{}", addr),
            store,
            _shutdown_tx,
        }
    }

    pub fn config(&self, layout: EndpointLayout, update_mode: UpdateMode) -> ProviderConfig {
        ProviderConfig {
            url: self.base_url.clone(),
            client_id: CLIENT_ID.to_string(),
            client_secret: Some(CLIENT_SECRET.to_string()),
            endpoint_layout: layout,
            update_mode,
            ..Default::default()
        }
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn token(
    State(store): State<Arc<Store>>,
    Path(_realm): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    store.token_requests.fetch_add(1, Ordering::SeqCst);

    let valid = match form.get("grant_type").map(String::as_str) {
        Some("client_credentials") => {
            form.get("client_id").map(String::as_str) == Some(CLIENT_ID)
                && form.get("client_secret").map(String::as_str) == Some(CLIENT_SECRET)
        }
        Some("password") => {
            form.get("username").map(String::as_str) == Some("admin")
                && form.get("password").map(String::as_str) == Some("admin")
        }
        _ => false,
    };

    if !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_client" })),
        )
            .into_response();
    }

    Json(json!({ "access_token": TOKEN, "expires_in": 300, "refresh_token": "refresh" }))
        .into_response()
}

async fn create_account(
    State(store): State<Arc<Store>>,
    Path(realm): Path<String>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if body.get("id").is_some() {
        return (StatusCode::BAD_REQUEST, "id is server-assigned").into_response();
    }

    let id = format!("acc-{}", store.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    body["id"] = json!(id);
    body["createdOn"] = json!(CREATED_ON);
    store.insert(&realm, &id, body.clone());

    (StatusCode::CREATED, Json(body)).into_response()
}

async fn get_account(
    State(store): State<Arc<Store>>,
    Path((realm, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if store.hide_reads.load(Ordering::SeqCst) {
        return StatusCode::NOT_FOUND.into_response();
    }
    if id == EXPLODING_ID {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }
    match store.account(&realm, &id) {
        Some(account) => Json(account).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn put_account(
    State(store): State<Arc<Store>>,
    Path((realm, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    store.puts.fetch_add(1, Ordering::SeqCst);

    let Some(existing) = store.account(&realm, &id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    body["id"] = json!(id);
    body["createdOn"] = existing["createdOn"].clone();
    store.insert(&realm, &id, body);

    StatusCode::NO_CONTENT.into_response()
}

async fn delete_account(
    State(store): State<Arc<Store>>,
    Path((realm, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let removed = store
        .accounts
        .lock()
        .unwrap()
        .remove(&(realm, id));
    match removed {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
