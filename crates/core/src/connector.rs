//! Connector and request dispatcher for the documents hub API
//!
//! [`ElementsConnector`] owns one base URL, one authorization value and one
//! transport handle. Every API operation funnels through [`ElementsConnector::
//! execute`], which counts the attempt, times the call, captures the vendor
//! error envelope on failure and emits a diagnostic line.

use std::sync::Mutex;
use std::time::Instant;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, Response};
use serde::Serialize;

use crate::auth::{CloudAuthorization, PLACEHOLDER_AUTH_HEADER};
use crate::error::{Error, Result};
use crate::stats;
use crate::trace::{self, DiagSink, TraceLevel};
use crate::types::Pong;

/// Default public endpoint of the documents hub API
pub const DEFAULT_ELEMENTS_URL: &str = "https://api.cloud-elements.com/elements/api-v2/";

/// HTTP verbs the API uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Delete,
    Post,
    Patch,
}

impl Verb {
    fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Delete => Method::DELETE,
            Verb::Post => Method::POST,
            Verb::Patch => Method::PATCH,
        }
    }

    fn requires_body(self) -> bool {
        matches!(self, Verb::Post | Verb::Patch)
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Verb::Get => "GET",
            Verb::Delete => "DELETE",
            Verb::Post => "POST",
            Verb::Patch => "PATCH",
        };
        f.write_str(name)
    }
}

/// Request body for POST/PATCH calls
pub enum Payload {
    Json(serde_json::Value),
    Multipart(reqwest::multipart::Form),
}

impl Payload {
    /// JSON payload from a serializable record; `None` fields are omitted
    /// by the record's serde attributes
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct InstanceCounters {
    requests: u64,
    total_request_ms: f64,
}

/// Client for the documents hub API
///
/// Connectors are independent: each carries its own transport handle,
/// authorization and usage counters, and shares only the process-wide
/// statistics with other instances. `reqwest::Client` is safe for concurrent
/// use, so calls on one connector may overlap freely.
pub struct ElementsConnector {
    base_url: String,
    authorization: Option<CloudAuthorization>,
    http: reqwest::Client,
    instance_number: u64,
    created: Instant,
    counters: Mutex<InstanceCounters>,
    last_failure: Mutex<String>,
    diag_sink: Option<DiagSink>,
}

impl ElementsConnector {
    /// Connector against the default public endpoint
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ELEMENTS_URL)
    }

    /// Connector against a specific base URL (trailing slash added if missing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let instance_number = stats::register_connector();
        stats::register_transport_handle();
        Self {
            base_url,
            authorization: None,
            http: reqwest::Client::new(),
            instance_number,
            created: Instant::now(),
            counters: Mutex::new(InstanceCounters::default()),
            last_failure: Mutex::new(String::new()),
            diag_sink: None,
        }
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Instance number assigned at creation (1-based, process-wide)
    pub fn instance_number(&self) -> u64 {
        self.instance_number
    }

    /// Replace the authorization value; `None` sends a placeholder header
    /// that the server will reject
    pub fn set_authorization(&mut self, authorization: Option<CloudAuthorization>) {
        self.authorization = authorization;
    }

    /// Current authorization value
    pub fn authorization(&self) -> Option<&CloudAuthorization> {
        self.authorization.as_ref()
    }

    /// Subscribe at most one diagnostic sink; `None` falls back to the
    /// default log sink
    pub fn set_diag_sink(&mut self, sink: Option<DiagSink>) {
        self.diag_sink = sink;
    }

    /// Current diagnostic sink
    pub fn diag_sink(&self) -> Option<&DiagSink> {
        self.diag_sink.as_ref()
    }

    /// Most recent vendor-supplied failure message/requestId pair, or empty
    pub fn last_failure_information(&self) -> String {
        self.lock_last_failure().clone()
    }

    /// Verify the hub endpoint answers
    pub async fn ping(&self) -> Result<Pong> {
        let response = self.get("hubs/documents/ping").await?;
        Ok(response.json().await?)
    }

    /// Human-readable usage summary for this instance plus process totals
    pub fn statistics_summary(&self) -> String {
        let global = stats::snapshot();
        let counters = *self.lock_counters();
        if counters.requests == 0 {
            return "No work has been performed".to_string();
        }
        let mut lifespan_ms = self.created.elapsed().as_secs_f64() * 1000.0;
        if lifespan_ms == 0.0 {
            lifespan_ms = 1.0;
        }
        let avg_s = counters.total_request_ms / counters.requests as f64 / 1000.0;
        format!(
            "#{}/{}  r={}; Life={:.1}s; Used={:.1}s; Avg={:.1}s; Busy={:.1}%; Connector Totals: r={}, Used={:.1}s",
            self.instance_number,
            global.connector_instances,
            counters.requests,
            lifespan_ms / 1000.0,
            counters.total_request_ms / 1000.0,
            avg_s,
            100.0 * counters.total_request_ms / lifespan_ms,
            global.requests,
            global.total_request_ms / 1000.0,
        )
    }

    /// Release authorization and the diagnostic subscription, emitting a
    /// final summary if any work was done. In-flight calls are unaffected.
    pub fn close(&mut self) {
        if self.lock_counters().requests > 0 {
            let line = format!("ce(close,) {}", self.statistics_summary());
            trace::emit(self.diag_sink.as_ref(), self.instance_number, &line, false);
        }
        self.authorization = None;
        self.diag_sink = None;
    }

    /// Execute one API call: count the attempt, time it, classify the
    /// outcome, and surface non-2xx responses as [`Error::Api`].
    ///
    /// POST and PATCH require a payload; GET and DELETE never carry one.
    pub async fn execute(
        &self,
        verb: Verb,
        uri: &str,
        payload: Option<Payload>,
    ) -> Result<Response> {
        if verb.requires_body() && payload.is_none() {
            return Err(Error::InvalidInput(format!("{verb} requests require a body")));
        }

        self.lock_last_failure().clear();

        let started = Instant::now();
        // Attempts are counted before completion, not after.
        let request_number = stats::record_request();
        self.lock_counters().requests += 1;

        let mut request = self
            .http
            .request(verb.method(), format!("{}{}", self.base_url, uri))
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, self.auth_header_value());
        match payload {
            Some(Payload::Json(value)) => request = request.json(&value),
            Some(Payload::Multipart(form)) => request = request.multipart(form),
            None => {}
        }

        let response = request.send().await?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        stats::record_request_time(elapsed_ms);
        self.lock_counters().total_request_ms += elapsed_ms;

        let status = response.status();
        if status.is_success() {
            if trace::trace_level() > TraceLevel::NonSuccess {
                let line = format!(
                    "ce({},{}) s={:.1}; status={}",
                    verb,
                    trace::uri_for_logging(uri),
                    elapsed_ms / 1000.0,
                    status.as_u16(),
                );
                trace::emit(self.diag_sink.as_ref(), self.instance_number, &line, false);
            }
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let mut line = format!(
            "ce({},{}) s={:.1}; status={}",
            verb,
            trace::uri_for_logging(uri),
            elapsed_ms / 1000.0,
            status.as_u16(),
        );
        if let Ok(envelope) = serde_json::from_str::<serde_json::Value>(&body) {
            let request_id = field_string(&envelope, "requestId");
            let message = field_string(&envelope, "message");
            if let Some(id) = &request_id {
                line.push_str("; RequestId=");
                line.push_str(id);
            }
            if let Some(msg) = &message {
                line.push_str(" - ");
                line.push_str(msg);
                let failure = match &request_id {
                    Some(id) => format!("{msg}; (Request #{request_number}, ID {id})"),
                    None => msg.clone(),
                };
                *self.lock_last_failure() = failure;
            }
        }
        trace::emit(self.diag_sink.as_ref(), self.instance_number, &line, true);

        Err(Error::Api {
            status: status.as_u16(),
            body,
        })
    }

    pub(crate) async fn get(&self, uri: &str) -> Result<Response> {
        self.execute(Verb::Get, uri, None).await
    }

    pub(crate) async fn delete(&self, uri: &str) -> Result<Response> {
        self.execute(Verb::Delete, uri, None).await
    }

    pub(crate) async fn post(&self, uri: &str, payload: Payload) -> Result<Response> {
        self.execute(Verb::Post, uri, Some(payload)).await
    }

    pub(crate) async fn patch(&self, uri: &str, payload: Payload) -> Result<Response> {
        self.execute(Verb::Patch, uri, Some(payload)).await
    }

    fn auth_header_value(&self) -> String {
        match &self.authorization {
            Some(auth) => auth.header_value(),
            None => PLACEHOLDER_AUTH_HEADER.to_string(),
        }
    }

    fn lock_counters(&self) -> std::sync::MutexGuard<'_, InstanceCounters> {
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_last_failure(&self) -> std::sync::MutexGuard<'_, String> {
        self.last_failure.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ElementsConnector {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning yields an independent connector: same base URL, authorization and
/// diagnostic sink, but a fresh transport handle and zeroed counters.
impl Clone for ElementsConnector {
    fn clone(&self) -> Self {
        let mut clone = Self::with_base_url(self.base_url.clone());
        clone.authorization = self.authorization.clone();
        clone.diag_sink = self.diag_sink.clone();
        clone
    }
}

fn field_string(envelope: &serde_json::Value, key: &str) -> Option<String> {
    envelope.get(key).map(|v| match v.as_str() {
        Some(s) => s.to_string(),
        None => v.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve canned HTTP responses on a fresh port, one connection per
    /// response, then stop. Returns the base URL.
    async fn spawn_server(responses: Vec<(u16, &'static str)>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = vec![0u8; 8192];
                let mut seen = Vec::new();
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            seen.extend_from_slice(&buf[..n]);
                            if seen.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                    }
                }
                let reason = if status < 400 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_post_without_body_is_usage_error() {
        let connector = ElementsConnector::with_base_url("http://127.0.0.1:1/");
        let result = connector.execute(Verb::Post, "hubs/documents/folders", None).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        // No network attempt was counted
        assert_eq!(connector.statistics_summary(), "No work has been performed");
    }

    #[tokio::test]
    async fn test_patch_without_body_is_usage_error() {
        let connector = ElementsConnector::with_base_url("http://127.0.0.1:1/");
        let result = connector
            .execute(Verb::Patch, "hubs/documents/files/1/metadata", None)
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_fresh_connector_reports_no_work() {
        let connector = ElementsConnector::new();
        assert_eq!(connector.statistics_summary(), "No work has been performed");
    }

    #[tokio::test]
    async fn test_failure_captures_message_and_request_id() {
        let base = spawn_server(vec![(
            404,
            r#"{"message":"Not found","requestId":"abc123"}"#,
        )])
        .await;
        let connector = ElementsConnector::with_base_url(base);

        let result = connector.get("hubs/documents/files/zzz/metadata").await;
        match result {
            Err(Error::Api { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected Api error, got {other:?}"),
        }

        let info = connector.last_failure_information();
        assert!(info.contains("Not found"), "missing message: {info}");
        assert!(info.contains("abc123"), "missing request id: {info}");
    }

    #[tokio::test]
    async fn test_success_clears_last_failure() {
        let base = spawn_server(vec![
            (500, r#"{"message":"provider unavailable"}"#),
            (200, r#"{"dateTime":"now","endpoint":"box"}"#),
        ])
        .await;
        let connector = ElementsConnector::with_base_url(base);

        assert!(connector.get("hubs/documents/ping").await.is_err());
        assert!(!connector.last_failure_information().is_empty());

        connector.get("hubs/documents/ping").await.unwrap();
        assert_eq!(connector.last_failure_information(), "");
    }

    #[tokio::test]
    async fn test_counters_track_completed_calls() {
        let base = spawn_server(vec![(200, r#"{"dateTime":"now"}"#)]).await;
        let connector = ElementsConnector::with_base_url(base);
        let before = stats::snapshot();

        connector.get("hubs/documents/ping").await.unwrap();

        let after = stats::snapshot();
        // Other tests share the process-wide counters, so the global check
        // is a lower bound; the instance counter is exact.
        assert!(after.requests >= before.requests + 1);
        assert!(after.total_request_ms >= before.total_request_ms);
        let summary = connector.statistics_summary();
        assert!(summary.contains("r=1;"), "unexpected summary: {summary}");
        assert!(summary.contains("Connector Totals"), "unexpected summary: {summary}");
    }

    #[tokio::test]
    async fn test_missing_message_leaves_failure_empty() {
        let base = spawn_server(vec![(502, "gateway timeout")]).await;
        let connector = ElementsConnector::with_base_url(base);

        let result = connector.get("hubs/documents/storage").await;
        assert!(matches!(result, Err(Error::Api { status: 502, .. })));
        assert_eq!(connector.last_failure_information(), "");
    }

    #[tokio::test]
    async fn test_diag_sink_receives_failure_line() {
        let base = spawn_server(vec![(
            404,
            r#"{"message":"Not found","requestId":"abc123"}"#,
        )])
        .await;
        let mut connector = ElementsConnector::with_base_url(base);

        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink_lines = Arc::clone(&lines);
        connector.set_diag_sink(Some(Arc::new(move |_, line| {
            sink_lines.lock().unwrap().push(line.to_string());
        })));

        let _ = connector.get("hubs/documents/files/zzz/metadata").await;

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ce(GET,"), "line: {}", lines[0]);
        assert!(lines[0].contains("status=404"), "line: {}", lines[0]);
        assert!(lines[0].contains("RequestId=abc123"), "line: {}", lines[0]);
        assert!(lines[0].contains("Not found"), "line: {}", lines[0]);
    }

    #[tokio::test]
    async fn test_clone_is_independent_with_shared_identity() {
        let base = spawn_server(vec![(200, "{}")]).await;
        let mut source = ElementsConnector::with_base_url(base);
        source.set_authorization(Some(CloudAuthorization::new("usr", "org")));
        source.set_diag_sink(Some(Arc::new(|_, _| {})));

        source.get("hubs/documents/storage").await.unwrap();

        let instances_before_clone = stats::snapshot().connector_instances;
        let clone = source.clone();

        assert_eq!(clone.authorization(), source.authorization());
        assert!(Arc::ptr_eq(
            clone.diag_sink().unwrap(),
            source.diag_sink().unwrap()
        ));
        assert_eq!(clone.base_url(), source.base_url());
        // Fresh counters for the clone, untouched source counters
        assert_eq!(clone.statistics_summary(), "No work has been performed");
        assert!(source.statistics_summary().contains("r=1;"));
        assert!(clone.instance_number() > source.instance_number());
        assert!(stats::snapshot().connector_instances >= instances_before_clone + 1);
    }

    #[tokio::test]
    async fn test_close_clears_authorization_and_sink() {
        let mut connector = ElementsConnector::new();
        connector.set_authorization(Some(CloudAuthorization::new("usr", "org")));
        connector.set_diag_sink(Some(Arc::new(|_, _| {})));

        connector.close();

        assert!(connector.authorization().is_none());
        assert!(connector.diag_sink().is_none());
    }

    #[test]
    fn test_verb_display() {
        assert_eq!(Verb::Get.to_string(), "GET");
        assert_eq!(Verb::Patch.to_string(), "PATCH");
    }
}
