//! Test utilities for tally-core
//!
//! Provides a mock transaction-service HTTP server used by integration
//! tests (and handy for development against a fake backend).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Shared state behind the mock server routes
#[derive(Default)]
struct MockApiState {
    fail: AtomicBool,
    next_id: AtomicU64,
    records: Mutex<Vec<Value>>,
}

/// Mock transaction service server for testing and development
pub struct MockApiServer {
    addr: SocketAddr,
    state: Arc<MockApiState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockApiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = Arc::new(MockApiState::default());
        let app = Router::new()
            .route(
                "/api/transactions",
                post(handle_create).get(handle_list),
            )
            .route(
                "/api/transactions/:id",
                get(handle_get).put(handle_update).delete(handle_delete),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// When set, every route answers 500
    pub fn set_fail(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of records currently stored
    pub fn record_count(&self) -> usize {
        self.state.records.lock().unwrap().len()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn failing(state: &MockApiState) -> Option<(StatusCode, Json<Value>)> {
    if state.fail.load(Ordering::SeqCst) {
        Some((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "mock server failure"})),
        ))
    } else {
        None
    }
}

async fn handle_create(
    State(state): State<Arc<MockApiState>>,
    Json(mut body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(response) = failing(&state) {
        return response;
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(obj) = body.as_object_mut() {
        obj.insert("id".to_string(), json!(format!("srv-{}", id)));
        obj.remove("temp_id");
        obj.insert("is_optimistic".to_string(), json!(false));
    }
    state.records.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn handle_list(State(state): State<Arc<MockApiState>>) -> (StatusCode, Json<Value>) {
    if let Some(response) = failing(&state) {
        return response;
    }
    let records = state.records.lock().unwrap().clone();
    (StatusCode::OK, Json(Value::Array(records)))
}

async fn handle_get(
    State(state): State<Arc<MockApiState>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    if let Some(response) = failing(&state) {
        return response;
    }
    let records = state.records.lock().unwrap();
    match records.iter().find(|r| r["id"] == json!(id)) {
        Some(record) => (StatusCode::OK, Json(record.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))),
    }
}

async fn handle_update(
    State(state): State<Arc<MockApiState>>,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(response) = failing(&state) {
        return response;
    }
    let mut records = state.records.lock().unwrap();
    match records.iter_mut().find(|r| r["id"] == json!(id)) {
        Some(record) => {
            if let (Some(target), Some(fields)) = (record.as_object_mut(), patch.as_object()) {
                for (key, value) in fields {
                    if key != "id" && key != "temp_id" {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
            (StatusCode::OK, Json(record.clone()))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))),
    }
}

async fn handle_delete(
    State(state): State<Arc<MockApiState>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    if let Some(response) = failing(&state) {
        return response;
    }
    let mut records = state.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| r["id"] != json!(id));
    if records.len() == before {
        (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})))
    } else {
        (StatusCode::OK, Json(json!({"deleted": true})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_lifecycle() {
        let mut server = MockApiServer::start().await;
        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert_eq!(server.record_count(), 0);
        server.stop();
    }
}
