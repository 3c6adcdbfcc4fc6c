use crate::config::CoreConfig;
use crate::db;
use crate::error::FetchError;
use crate::services::completion::CompletionClient;
use crate::services::readings::{Reading, ReadingSource, RecentQuery};
use crate::state::AppState;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub fn test_config() -> CoreConfig {
    CoreConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        apply_schema_on_startup: false,
        completion_api_base_url: "http://127.0.0.1:9".to_string(),
        completion_api_key: None,
        completion_model: "gpt-test".to_string(),
        live_working_set_cap: 10,
        live_dedupe_by_id: false,
        live_broadcast_capacity: 64,
        recent_readings_limit: 10,
        analysis_batch_limit: 50,
        locations_page_size: 5,
        daily_energy_target_kwh: 10.0,
    }
}

/// State over a lazy pool that is never connected and no completion key.
pub fn test_state() -> AppState {
    let config = test_config();
    let pool = db::connect_lazy(&config.database_url).expect("connect_lazy");
    AppState::new(config, pool, reqwest::Client::new())
}

pub fn test_state_with_completions(client: CompletionClient) -> AppState {
    let mut state = test_state();
    state.completions = Arc::new(client);
    state
}

fn fixture_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0)
        .single()
        .expect("valid fixture time")
}

/// A Balikpapan reading stamped `minutes` after the fixture epoch.
pub fn reading(
    location: &str,
    energy_kwh: f64,
    efficiency_percent: f64,
    pedestrians_per_day: i64,
    minutes: i64,
) -> Reading {
    Reading {
        id: Uuid::new_v4(),
        location: location.to_string(),
        city: "Balikpapan".to_string(),
        daily_energy_kwh: energy_kwh,
        efficiency_percent,
        pedestrians_per_day,
        latitude: -1.2379,
        longitude: 116.8312,
        created_at: fixture_epoch() + Duration::minutes(minutes),
    }
}

/// In-memory reading store with a switchable failure mode.
pub struct MemoryReadingSource {
    rows: Mutex<Vec<Reading>>,
    failing: AtomicBool,
}

impl MemoryReadingSource {
    pub fn new(rows: Vec<Reading>) -> Self {
        Self {
            rows: Mutex::new(rows),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ReadingSource for MemoryReadingSource {
    async fn fetch_recent(&self, query: &RecentQuery) -> Result<Vec<Reading>, FetchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Unavailable("memory source offline".to_string()));
        }
        let mut rows: Vec<Reading> = self
            .rows
            .lock()
            .expect("rows lock")
            .iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(query.limit.max(0) as usize);
        Ok(rows)
    }
}

/// Chat completion endpoint on an ephemeral port that answers every request
/// with one canned response and records the request bodies.
pub struct FakeCompletionServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
    task: tokio::task::JoinHandle<()>,
}

impl FakeCompletionServer {
    pub async fn reply(content: &str) -> Self {
        Self::raw(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }
            ]
        }))
        .await
    }

    pub async fn raw(body: Value) -> Self {
        Self::start(StatusCode::OK, body.to_string()).await
    }

    pub async fn status(code: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(code).expect("valid status code");
        Self::start(status, body.to_string()).await
    }

    async fn start(status: StatusCode, body: String) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(request): Json<Value>| {
                let recorded = recorded.clone();
                let body = body.clone();
                async move {
                    recorded.lock().expect("requests lock").push(request);
                    (
                        status,
                        [(axum::http::header::CONTENT_TYPE, "application/json")],
                        body,
                    )
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake completion server");
        let addr = listener.local_addr().expect("local addr");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            addr,
            requests,
            task,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> CompletionClient {
        CompletionClient::new(
            self.base_url(),
            Some("sk-test".to_string()),
            "gpt-test".to_string(),
            reqwest::Client::new(),
        )
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn last_request(&self) -> Option<Value> {
        self.requests.lock().expect("requests lock").last().cloned()
    }
}

impl Drop for FakeCompletionServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
