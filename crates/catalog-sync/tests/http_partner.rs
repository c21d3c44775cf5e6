//! Drives the real reqwest-backed partner client against a fake partner
//! served by axum on an ephemeral port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use catalog_core::NewProduct;
use catalog_db::{Database, DbConfig};
use catalog_sync::client::build_http_client;
use catalog_sync::{
    HttpMethod, HttpPartnerApi, OfferReconciler, PartnerApi, ProductRegistrar, RefreshOutcome,
    RefreshSettings, RegistrationOutcome, ServiceClient, SyncError, TokenRefresher, TokenStore,
    UpstreamFailurePolicy,
};
use serde_json::{json, Value};
use uuid::Uuid;

const REFRESH_SECRET: &str = "refresh-secret";
const ISSUED_TOKEN: &str = "issued-token";

// =============================================================================
// Fake Partner
// =============================================================================

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    authorization: Option<String>,
    accept: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct PartnerState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    offers: Arc<Mutex<Vec<Value>>>,
}

impl PartnerState {
    fn record(&self, method: &str, path: String, headers: &HeaderMap, body: &Bytes) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().unwrap().push(Recorded {
            method: method.to_string(),
            path,
            authorization: header("authorization"),
            accept: header("accept"),
            body: serde_json::from_slice(body).ok(),
        });
    }

    fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

fn bearer_is(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {token}"))
}

async fn auth(State(state): State<PartnerState>, headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
    state.record("POST", "/auth".to_string(), &headers, &body);
    if bearer_is(&headers, REFRESH_SECRET) {
        (StatusCode::CREATED, Json(json!({ "access_token": ISSUED_TOKEN })))
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": "bad credential" })))
    }
}

async fn register(State(state): State<PartnerState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    state.record("POST", "/products/register".to_string(), &headers, &body);
    if bearer_is(&headers, ISSUED_TOKEN) {
        StatusCode::CREATED
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn offers(
    State(state): State<PartnerState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.record("GET", format!("/products/{id}/offers"), &headers, &Bytes::new());
    if !bearer_is(&headers, ISSUED_TOKEN) {
        return (StatusCode::UNAUTHORIZED, Json(json!([])));
    }
    let offers = state.offers.lock().unwrap().clone();
    (StatusCode::OK, Json(Value::Array(offers)))
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Value> {
    Json(json!({
        "method": method.as_str(),
        "authorization": headers.get("authorization").and_then(|v| v.to_str().ok()),
        "body": serde_json::from_slice::<Value>(&body).ok(),
    }))
}

async fn slow() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK
}

struct FakePartner {
    base_url: String,
    state: PartnerState,
    handle: tokio::task::JoinHandle<()>,
}

impl FakePartner {
    async fn spawn() -> Self {
        let state = PartnerState::default();
        let app = Router::new()
            .route("/auth", post(auth))
            .route("/products/register", post(register))
            .route("/products/{id}/offers", get(offers))
            .route("/echo", any(echo))
            .route("/slow", get(slow))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    fn api(&self) -> Arc<HttpPartnerApi> {
        let http = build_http_client(Duration::from_secs(5)).unwrap();
        Arc::new(HttpPartnerApi::new(http, &self.base_url))
    }
}

impl Drop for FakePartner {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn refresh_exchanges_credential_for_token() {
    let partner = FakePartner::spawn().await;
    let store = TokenStore::in_memory();
    let tokens = store.reader();
    let refresher = TokenRefresher::new(
        partner.api(),
        store,
        REFRESH_SECRET,
        RefreshSettings::default(),
    );

    let outcome = refresher.refresh().await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Refreshed);
    assert_eq!(tokens.bearer().as_deref(), Some(ISSUED_TOKEN));

    let requests = partner.state.requests_to("/auth");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer refresh-secret")
    );
    assert_eq!(requests[0].accept.as_deref(), Some("application/json"));
    assert_eq!(
        requests[0].body,
        Some(json!({ "refresh_token": REFRESH_SECRET }))
    );
}

#[tokio::test]
async fn register_then_reconcile_over_http() {
    let partner = FakePartner::spawn().await;
    let api = partner.api();
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let store = TokenStore::in_memory();
    let tokens = store.reader();
    TokenRefresher::new(api.clone(), store, REFRESH_SECRET, RefreshSettings::default())
        .refresh()
        .await
        .unwrap();

    let registrar = ProductRegistrar::new(db.clone(), api.clone(), tokens.clone());
    let outcome = registrar
        .register(NewProduct {
            id: None,
            name: Some("Widget".to_string()),
            description: None,
        })
        .await
        .unwrap();
    let RegistrationOutcome::Registered { product, status } = outcome else {
        panic!("expected Registered, got {outcome:?}");
    };
    assert_eq!(status, 201);

    let sent = partner.state.requests_to("/products/register");
    assert_eq!(
        sent[0].body,
        Some(json!({
            "id": product.id.to_string(),
            "name": "Widget",
            "description": ""
        }))
    );

    let in_stock = Uuid::new_v4();
    partner.state.offers.lock().unwrap().extend([
        json!({ "id": in_stock, "price": 1999, "items_in_stock": 7 }),
        json!({ "id": Uuid::new_v4(), "price": 2999, "items_in_stock": 0 }),
    ]);

    let reconciler = OfferReconciler::new(db.clone(), api, tokens, UpstreamFailurePolicy::Fail);
    let offers = reconciler.offers_for_product(product.id).await.unwrap();

    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].id, in_stock);
    assert_eq!(offers[0].price, Some(1999));
    assert_eq!(offers[0].product_id, product.id);
    assert_eq!(db.offers().count_for_product(product.id).await.unwrap(), 2);

    let path = format!("/products/{}/offers", product.id);
    let fetched = partner.state.requests_to(&path);
    assert_eq!(fetched[0].authorization.as_deref(), Some("Bearer issued-token"));
}

#[tokio::test]
async fn service_client_dispatches_every_method() {
    let partner = FakePartner::spawn().await;
    let http = build_http_client(Duration::from_secs(5)).unwrap();
    let url = format!("{}/echo", partner.base_url);
    let body = json!({ "name": "Widget" });

    for (method, expected) in [
        (HttpMethod::Get, "GET"),
        (HttpMethod::Post, "POST"),
        (HttpMethod::Patch, "PATCH"),
        (HttpMethod::Delete, "DELETE"),
    ] {
        let client = ServiceClient::new(http.clone(), method, &url, "abc");
        let response = client.call(Some(&body)).await.unwrap();

        assert_eq!(response.status(), 200);
        let echoed: Value = response.json().unwrap();
        assert_eq!(echoed["method"], expected);
        assert_eq!(echoed["authorization"], "Bearer abc");
        assert_eq!(echoed["body"], body);
    }
}

#[tokio::test]
async fn slow_partner_is_a_transport_error() {
    let partner = FakePartner::spawn().await;
    let http = build_http_client(Duration::from_millis(100)).unwrap();
    let client = ServiceClient::new(
        http,
        HttpMethod::Get,
        format!("{}/slow", partner.base_url),
        "abc",
    );

    let err = client.call(None).await.unwrap_err();
    assert!(matches!(err, SyncError::Transport(_)));
}

#[tokio::test]
async fn wrong_credential_gets_400() {
    let partner = FakePartner::spawn().await;

    let response = partner.api().authenticate("wrong").await.unwrap();

    assert_eq!(response.status(), 400);
}
