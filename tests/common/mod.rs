#![allow(dead_code)]

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use order_process::application::processor::{OrderProcessor, ProcessorConfig};
use order_process::infrastructure::http_callback::{HttpCallbackNotifier, RetryPolicy};
use order_process::infrastructure::in_memory::InMemoryOrderProcessStore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type Responder = Arc<dyn Fn(usize) -> StatusCode + Send + Sync>;

/// One request seen by the callback endpoint.
#[derive(Debug, Clone)]
pub struct Received {
    pub content_type: Option<String>,
    pub body: serde_json::Value,
    pub at: Instant,
}

#[derive(Clone)]
struct Recorder {
    received: Arc<Mutex<Vec<Received>>>,
    respond: Responder,
    delay: Duration,
}

/// A local callback endpoint that records every POST it receives.
pub struct CallbackServer {
    pub url: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl CallbackServer {
    /// Starts an endpoint that always answers with `status`.
    pub async fn start(status: StatusCode) -> Self {
        Self::start_with(move |_| status).await
    }

    /// Starts an endpoint whose answer depends on the 0-based hit index.
    pub async fn start_with<F>(respond: F) -> Self
    where
        F: Fn(usize) -> StatusCode + Send + Sync + 'static,
    {
        Self::spawn(Arc::new(respond), Duration::ZERO).await
    }

    /// Starts an endpoint that records each hit, then waits `delay` before answering 200.
    pub async fn start_slow(delay: Duration) -> Self {
        Self::spawn(Arc::new(|_: usize| StatusCode::OK), delay).await
    }

    async fn spawn(respond: Responder, delay: Duration) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let recorder = Recorder {
            received: received.clone(),
            respond,
            delay,
        };
        let app = Router::new()
            .route("/callback", post(record))
            .with_state(recorder);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}/callback"),
            received,
        }
    }

    pub fn hits(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

async fn record(State(recorder): State<Recorder>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

    let index = {
        let mut received = recorder.received.lock().unwrap();
        received.push(Received {
            content_type,
            body,
            at: Instant::now(),
        });
        received.len() - 1
    };
    if !recorder.delay.is_zero() {
        tokio::time::sleep(recorder.delay).await;
    }
    (recorder.respond)(index)
}

/// Retry policy with the production budget but a tiny backoff.
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10))
}

pub fn fast_notifier() -> HttpCallbackNotifier {
    HttpCallbackNotifier::new(fast_retry_policy(), Duration::from_secs(5)).unwrap()
}

/// Processor over a fresh in-memory store, the fast notifier and a seeded rng.
pub fn processor(config: ProcessorConfig, seed: u64) -> OrderProcessor {
    OrderProcessor::new(
        Arc::new(InMemoryOrderProcessStore::new()),
        Arc::new(fast_notifier()),
        config,
    )
    .with_rng(StdRng::seed_from_u64(seed))
}

pub fn instant_config(max_duplicate_callbacks: u32) -> ProcessorConfig {
    ProcessorConfig {
        max_duplicate_callbacks,
        max_order_process_duration: 1,
    }
}
