use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use supplyline_api::{
    config::AppConfig,
    db::{self, DbConfig},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

/// Helper harness for spinning up the full application router backed by an
/// in-memory SQLite database.
///
/// The pool is pinned to a single connection so every test shares one
/// `:memory:` database; writes serialize through it exactly like they
/// would through a single Postgres row lock.
#[allow(dead_code)]
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );

        let db_config = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout: Duration::from_secs(3600),
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));
        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = supplyline_api::app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Sends one request through the router with the given actor headers.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        actor_id: Uuid,
        role: &str,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("X-Actor-Id", actor_id.to_string())
            .header("X-Actor-Role", role);

        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response")
    }

    // Scenario helpers: walk a request through the lifecycle via the same
    // endpoints real actors use.

    /// Creates a request with the given items, returning its id.
    pub async fn create_request(
        &self,
        franchise_id: Uuid,
        franchise_name: &str,
        owner_name: Option<&str>,
        items: Value,
    ) -> Uuid {
        let response = self
            .request(
                Method::POST,
                "/procurement/franchise/requests",
                franchise_id,
                "franchise",
                Some(json!({
                    "franchiseName": franchise_name,
                    "ownerName": owner_name,
                    "items": items,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        Uuid::parse_str(body["id"].as_str().expect("request id")).expect("uuid")
    }

    pub async fn quote(&self, request_id: Uuid, vendor_id: Uuid, items: Value) -> Response {
        self.request(
            Method::POST,
            &format!("/procurement/vendor/{}/quote", request_id),
            vendor_id,
            "vendor",
            Some(json!({ "items": items })),
        )
        .await
    }

    pub async fn approve(&self, request_id: Uuid, franchise_id: Uuid) -> Response {
        self.request(
            Method::POST,
            &format!("/procurement/franchise/requests/{}/approve", request_id),
            franchise_id,
            "franchise",
            None,
        )
        .await
    }

    pub async fn begin_packing(&self, request_id: Uuid, vendor_id: Uuid) -> Response {
        self.request(
            Method::POST,
            &format!("/procurement/vendor/{}/packing", request_id),
            vendor_id,
            "vendor",
            None,
        )
        .await
    }

    pub async fn packing_check(
        &self,
        request_id: Uuid,
        vendor_id: Uuid,
        item_name: &str,
    ) -> Response {
        self.request(
            Method::POST,
            &format!("/procurement/vendor/{}/packing-check", request_id),
            vendor_id,
            "vendor",
            Some(json!({ "itemName": item_name, "checked": true })),
        )
        .await
    }

    pub async fn record_weight(
        &self,
        request_id: Uuid,
        vendor_id: Uuid,
        weight: Value,
    ) -> Response {
        self.request(
            Method::POST,
            &format!("/procurement/vendor/{}/weight", request_id),
            vendor_id,
            "vendor",
            Some(json!({ "weightKg": weight })),
        )
        .await
    }

    pub async fn dispatch(&self, request_id: Uuid, vendor_id: Uuid) -> Response {
        self.request(
            Method::POST,
            &format!("/procurement/vendor/{}/dispatch", request_id),
            vendor_id,
            "vendor",
            None,
        )
        .await
    }

    pub async fn record_receipt(
        &self,
        request_id: Uuid,
        franchise_id: Uuid,
        items: Value,
    ) -> Response {
        self.request(
            Method::POST,
            &format!("/procurement/franchise/requests/{}/receipt", request_id),
            franchise_id,
            "franchise",
            Some(json!({ "items": items })),
        )
        .await
    }

    pub async fn get_request(&self, request_id: Uuid, actor_id: Uuid, role: &str) -> Value {
        let response = self
            .request(
                Method::GET,
                &format!("/procurement/requests/{}", request_id),
                actor_id,
                role,
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        response_json(response).await
    }

    /// Drives a fresh request all the way to `completed`, returning
    /// (request_id, franchise_id, vendor_id).
    pub async fn completed_request(&self) -> (Uuid, Uuid, Uuid) {
        let franchise_id = Uuid::new_v4();
        let vendor_id = Uuid::new_v4();
        let request_id = self
            .create_request(
                franchise_id,
                "North Node",
                Some("R. Kaur"),
                json!([{ "name": "Tomato", "unit": "KG", "quantity": 10 }]),
            )
            .await;

        let response = self
            .quote(
                request_id,
                vendor_id,
                json!([{ "name": "Tomato", "quotedPrice": 20 }]),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            self.approve(request_id, franchise_id).await.status(),
            StatusCode::OK
        );
        assert_eq!(
            self.begin_packing(request_id, vendor_id).await.status(),
            StatusCode::OK
        );
        assert_eq!(
            self.packing_check(request_id, vendor_id, "Tomato")
                .await
                .status(),
            StatusCode::OK
        );
        assert_eq!(
            self.record_weight(request_id, vendor_id, json!(9.8))
                .await
                .status(),
            StatusCode::OK
        );
        assert_eq!(
            self.dispatch(request_id, vendor_id).await.status(),
            StatusCode::OK
        );

        (request_id, franchise_id, vendor_id)
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Reads a decimal field that may be serialized as string or number.
#[allow(dead_code)]
pub fn decimal_field(value: &Value, key: &str) -> Decimal {
    match &value[key] {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("field '{}' is not a decimal: {:?}", key, other),
    }
}
