//! Axum router and handlers for the order process API.
//!
//! `build_router` returns the bare router; `main.rs` adds the trace layer so
//! tests can drive the router directly with `oneshot`.

use super::error::ApiError;
use crate::application::processor::OrderProcessor;
use crate::domain::order_process::OrderProcess;
use crate::error::OrderProcessError;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

pub fn build_router(processor: OrderProcessor) -> Router {
    Router::new()
        .route(
            "/order_process",
            get(get_order_process).post(start_order_process),
        )
        .route("/health", get(health))
        .with_state(processor)
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderProcessQuery {
    pub order_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartOrderProcessQuery {
    pub callback_url: Option<String>,
}

/// Registration body. Any `status` sent by the client is ignored.
#[derive(Debug, Deserialize)]
pub struct StartOrderProcessRequest {
    #[serde(default)]
    pub order_id: String,
}

/// `GET /order_process[?order_id=..]`
///
/// Lists every process, or returns one. An unknown id yields `{}` rather than
/// an error status.
async fn get_order_process(
    State(processor): State<OrderProcessor>,
    Query(query): Query<OrderProcessQuery>,
) -> Result<Response, ApiError> {
    let store = processor.store();

    let Some(order_id) = query.order_id.filter(|id| !id.is_empty()) else {
        let processes = store.get_all().await?;
        return Ok(Json(processes).into_response());
    };

    match store.get_by_id(&order_id).await {
        Ok(process) => Ok(Json(process).into_response()),
        Err(OrderProcessError::NotFound(_)) => {
            info!(order_id = %order_id, "order process does not exist");
            Ok(Json(json!({})).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /order_process[?callback_url=..]`
///
/// Validates everything before registering, so a rejected request never
/// leaves a `RUNNING` record behind.
async fn start_order_process(
    State(processor): State<OrderProcessor>,
    Query(query): Query<StartOrderProcessQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<OrderProcess>), ApiError> {
    if !is_json(&headers) {
        return Err(ApiError::bad_request(
            "invalid content type. Valid: application/json",
        ));
    }

    let request: StartOrderProcessRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::bad_request("invalid request body"))?;

    if request.order_id.is_empty() {
        return Err(ApiError::bad_request("missing order id"));
    }

    let callback_url = query
        .callback_url
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_callback_url(&raw))
        .transpose()?;

    let process = processor.start(request.order_id, callback_url).await?;
    Ok((StatusCode::ACCEPTED, Json(process)))
}

async fn health(State(processor): State<OrderProcessor>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "in_flight": processor.in_flight() }))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Accepts only absolute `http`/`https` URLs with a host.
fn parse_callback_url(raw: &str) -> Result<String, ApiError> {
    match reqwest::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(url.to_string())
        }
        _ => Err(ApiError::bad_request(format!("invalid callback_url: {raw}"))),
    }
}
