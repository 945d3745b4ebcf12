//! HTTP client for the VMS inference backend.
//!
//! One method per remote operation, one request per call: no retry, no
//! caching. Every error crossing this boundary is a [`TransportError`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use vms_core::{Alert, HealthInfo, InferenceResult, StreamDescriptor};

const ERROR_BODY_SNIPPET_LEN: usize = 200;

/// Backend endpoint configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_trailing_slash(base_url.into()),
            timeout: Duration::from_secs(30),
        }
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// The only error kind the client surfaces. Callers decide whether a failed
/// call is fatal; the client never retries on their behalf.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
}

/// Observes every completed request. Injected at construction so transport
/// instrumentation stays composed into the client instead of living in some
/// process-global hook.
pub trait RequestObserver: Send + Sync {
    fn observe(&self, method: &str, path: &str, outcome: Result<u16, &TransportError>);
}

/// Default observer: failures at warn, successes at trace.
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn observe(&self, method: &str, path: &str, outcome: Result<u16, &TransportError>) {
        match outcome {
            Ok(status) => tracing::trace!("api_ok: {method} {path} -> {status}"),
            Err(err) => tracing::warn!("api_error: {method} {path}: {err}"),
        }
    }
}

#[derive(Debug, Serialize)]
struct StreamConfigBody<'a> {
    stream_id: &'a str,
    source: &'a str,
    models: &'a [String],
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct StartStreamRequest<'a> {
    config: StreamConfigBody<'a>,
}

#[derive(Debug, Serialize)]
struct StopStreamRequest<'a> {
    stream_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct StreamsBody {
    #[serde(default)]
    streams: Vec<StreamDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ResultsBody {
    #[serde(default)]
    results: Vec<InferenceResult>,
}

#[derive(Debug, Deserialize)]
struct AlertsBody {
    #[serde(default)]
    alerts: Vec<Alert>,
}

/// Start/stop acknowledgement. Receipt of `ok` only means the backend
/// accepted the request, not that the stream has changed state yet.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub ok: bool,
}

pub struct BackendClient {
    config: ClientConfig,
    http: reqwest::Client,
    observer: Arc<dyn RequestObserver>,
}

impl BackendClient {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    pub fn with_observer(
        config: ClientConfig,
        observer: Arc<dyn RequestObserver>,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self {
            config,
            http,
            observer,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub async fn health(&self) -> Result<HealthInfo, TransportError> {
        self.get_json("/health").await
    }

    pub async fn list_streams(&self) -> Result<Vec<StreamDescriptor>, TransportError> {
        let body: StreamsBody = self.get_json("/streams").await?;
        Ok(body.streams)
    }

    pub async fn start_stream(
        &self,
        stream_id: &str,
        source: &str,
        models: &[String],
    ) -> Result<Ack, TransportError> {
        let request = StartStreamRequest {
            config: StreamConfigBody {
                stream_id,
                source,
                models,
                enabled: true,
            },
        };
        self.post_json("/streams/start", &request).await
    }

    pub async fn stop_stream(&self, stream_id: &str) -> Result<Ack, TransportError> {
        let request = StopStreamRequest { stream_id };
        self.post_json("/streams/stop", &request).await
    }

    pub async fn results(
        &self,
        stream_id: &str,
        limit: usize,
    ) -> Result<Vec<InferenceResult>, TransportError> {
        let path = format!("/results/{stream_id}?limit={limit}");
        let body: ResultsBody = self.get_json(&path).await?;
        Ok(body.results)
    }

    pub async fn alerts(&self) -> Result<Vec<Alert>, TransportError> {
        let body: AlertsBody = self.get_json("/alerts").await?;
        Ok(body.alerts)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let request = self.http.get(format!("{}{path}", self.config.base_url));
        self.dispatch("GET", path, request).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let request = self
            .http
            .post(format!("{}{path}", self.config.base_url))
            .json(body);
        self.dispatch("POST", path, request).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TransportError> {
        let outcome = Self::execute(request).await;
        match outcome {
            Ok((status, parsed)) => {
                self.observer.observe(method, path, Ok(status));
                Ok(parsed)
            }
            Err(err) => {
                self.observer.observe(method, path, Err(&err));
                Err(err)
            }
        }
    }

    async fn execute<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> Result<(u16, T), TransportError> {
        let response = request
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }
        let parsed = response
            .json::<T>()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        Ok((status.as_u16(), parsed))
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= ERROR_BODY_SNIPPET_LEN {
        return trimmed.to_string();
    }
    let mut cut = ERROR_BODY_SNIPPET_LEN;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &trimmed[..cut])
}
