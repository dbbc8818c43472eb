//! Single-attempt request sending.
//!
//! Game-state mutations are not idempotent, so nothing here retries: a request
//! is sent exactly once and its outcome classified. Every attempt carries an
//! `X-Request-Id` header so client and server logs can be correlated.

use std::time::Instant;

use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use uuid::Uuid;

use crate::Endpoint;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Outcome of one request.
///
/// This is a sum type that structurally distinguishes success from failure,
/// ensuring callers cannot accidentally treat an error response as success.
#[derive(Debug)]
pub enum SendOutcome {
    /// 2xx status.
    Success(Response),
    /// The server answered with a non-2xx status.
    /// The response is provided for error body inspection.
    HttpError(Response),
    /// The request never completed.
    ConnectionError(reqwest::Error),
}

impl SendOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[must_use]
pub fn generate_request_id() -> String {
    format!("tubesort-{}", Uuid::new_v4())
}

pub async fn send_once(builder: RequestBuilder, endpoint: Endpoint) -> SendOutcome {
    let request_id = generate_request_id();
    let started = Instant::now();
    let request = builder.header("X-Request-Id", request_id.as_str());

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            tracing::debug!(
                endpoint = endpoint.path(),
                %request_id,
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis(),
                "Backend responded"
            );
            if status.is_success() {
                SendOutcome::Success(response)
            } else {
                SendOutcome::HttpError(response)
            }
        }
        Err(e) => {
            tracing::debug!(
                endpoint = endpoint.path(),
                %request_id,
                error = %e,
                "Backend request failed"
            );
            SendOutcome::ConnectionError(e)
        }
    }
}

pub async fn read_capped_error_body(response: Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Pull a human-readable message out of an error body.
///
/// The server answers failures with `{"success": false, "error": "..."}`;
/// `/error/message` and `/message` are accepted too.
#[must_use]
pub fn extract_error_message(raw: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(raw.trim()).ok()?;
    payload
        .pointer("/error")
        .and_then(Value::as_str)
        .or_else(|| payload.pointer("/error/message").and_then(Value::as_str))
        .or_else(|| payload.pointer("/message").and_then(Value::as_str))
        .or_else(|| payload.as_str())
        .map(ToString::to_string)
}
