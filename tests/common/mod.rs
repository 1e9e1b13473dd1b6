#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use chrono::Utc;
use procurement_api::{
    app_router,
    config::AppConfig,
    db,
    entities::{item, parent_item},
    errors::ServiceError,
    events::{self, Event, EventHandler, EventSender, WmsIntegrationHandler},
    handlers::AppServices,
    services::wms::{WmsGateway, WmsPurchaseOrder},
    AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Records every event the processor dispatches.
#[derive(Default)]
pub struct EventRecorder {
    events: Mutex<Vec<Event>>,
}

impl EventRecorder {
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for EventRecorder {
    async fn handle_event(&self, event: Event) -> Result<(), String> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// WMS gateway that keeps the payloads it receives and assigns `WMS-<po number>`.
#[derive(Default)]
pub struct RecordingWmsGateway {
    payloads: Mutex<Vec<WmsPurchaseOrder>>,
}

impl RecordingWmsGateway {
    pub fn payloads(&self) -> Vec<WmsPurchaseOrder> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl WmsGateway for RecordingWmsGateway {
    async fn create_purchase_order(
        &self,
        order: &WmsPurchaseOrder,
    ) -> Result<Option<String>, ServiceError> {
        self.payloads.lock().unwrap().push(order.clone());
        Ok(Some(format!("WMS-{}", order.po_number)))
    }
}

/// Catalog rows created by [`TestApp::new`].
pub struct SeededCatalog {
    pub small_box: item::Model,
    pub large_box: item::Model,
    pub tape: item::Model,
}

/// Helper harness for spinning up an application state backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub catalog: SeededCatalog,
    pub events: Arc<EventRecorder>,
    pub wms: Arc<RecordingWmsGateway>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Same as [`TestApp::new`] with document conversion pointed at `base_url`.
    pub async fn with_openai(base_url: &str) -> Self {
        let base_url = base_url.to_string();
        Self::with_config(move |cfg| {
            cfg.openai.api_key = Some("sk-test".to_string());
            cfg.openai.base_url = base_url;
            cfg.openai.poll_interval_ms = 10;
            cfg.openai.max_poll_attempts = 5;
        })
        .await
    }

    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        // One connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        customize(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let catalog = seed_catalog(&pool).await;

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);

        let wms = Arc::new(RecordingWmsGateway::default());
        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            &cfg,
            wms.clone(),
        )
        .expect("services should build");

        let recorder = Arc::new(EventRecorder::default());
        let handlers: Vec<Arc<dyn EventHandler>> = vec![
            recorder.clone(),
            Arc::new(WmsIntegrationHandler::new(services.wms.clone())),
        ];
        let event_task = tokio::spawn(events::process_events(event_rx, handlers));

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            router: app_router(state.clone()),
            state,
            catalog,
            events: recorder,
            wms,
            _event_task: event_task,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Upload `contents` as the `file` field of a multipart form.
    pub async fn upload(&self, uri: &str, file_name: &str, contents: &[u8]) -> axum::response::Response {
        let boundary = "procurement-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: text/plain\r\n\r\n");
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("failed to build multipart request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Creates an order through the API and returns the response body.
    pub async fn create_order(&self, payload: Value) -> Value {
        let response = self
            .request(Method::POST, "/api/purchase-orders", Some(payload))
            .await;
        assert_eq!(response.status(), 201, "create failed");
        json_body(response).await
    }

    /// Polls the recorder until `count` events arrived or a second passed.
    pub async fn wait_for_events(&self, count: usize) -> Vec<Event> {
        for _ in 0..100 {
            let events = self.events.snapshot();
            if events.len() >= count {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.events.snapshot()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

async fn seed_catalog(pool: &db::DbPool) -> SeededCatalog {
    let now = Utc::now();
    let boxes = parent_item::ActiveModel {
        name: Set("Boxes".into()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("seed parent item");
    let supplies = parent_item::ActiveModel {
        name: Set("Supplies".into()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("seed parent item");

    let seed_item = |parent_item_id: i32, name: &'static str, sku: &'static str| {
        item::ActiveModel {
            parent_item_id: Set(parent_item_id),
            name: Set(name.into()),
            sku: Set(sku.into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    };

    SeededCatalog {
        small_box: seed_item(boxes.id, "Small box", "BOX-S")
            .insert(pool)
            .await
            .expect("seed item"),
        large_box: seed_item(boxes.id, "Large box", "BOX-L")
            .insert(pool)
            .await
            .expect("seed item"),
        tape: seed_item(supplies.id, "Packing tape", "TAPE")
            .insert(pool)
            .await
            .expect("seed item"),
    }
}
