//! Fire-and-forget start/stop commands.
//!
//! Outcomes never feed back into engine state; the operator sees the effect
//! when the stream list and pollers catch up on their next ticks.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{info, warn};
use vms_client::BackendClient;

/// Raw operator input from the start form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartForm {
    /// Optional; a time-based id is generated when left empty.
    pub stream_id: String,
    /// Webcam index or video path/URI. Required.
    pub source: String,
    /// Comma-separated model names.
    pub models: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("source must not be empty")]
    EmptySource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StartRequest {
    stream_id: String,
    source: String,
    models: Vec<String>,
}

fn prepare_start(form: &StartForm, now_millis: u64) -> Result<StartRequest, DispatchError> {
    let source = form.source.trim();
    if source.is_empty() {
        return Err(DispatchError::EmptySource);
    }

    let stream_id = match form.stream_id.trim() {
        // Best-effort unique, matching the console's historical fallback;
        // collisions with a concurrently chosen id are not guarded against.
        "" => format!("s-{now_millis}"),
        id => id.to_string(),
    };
    let models = form
        .models
        .split(',')
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .map(str::to_string)
        .collect();

    Ok(StartRequest {
        stream_id,
        source: source.to_string(),
        models,
    })
}

#[derive(Clone)]
pub struct ActionDispatcher {
    client: Arc<BackendClient>,
}

impl ActionDispatcher {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }

    /// Validate the form and dispatch the start request in the background.
    /// Returns the stream id the request was sent under.
    pub fn start(&self, form: &StartForm) -> Result<String, DispatchError> {
        let request = prepare_start(form, unix_millis())?;
        let stream_id = request.stream_id.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            match client
                .start_stream(&request.stream_id, &request.source, &request.models)
                .await
            {
                Ok(ack) if ack.ok => info!("start_accepted: {}", request.stream_id),
                Ok(_) => warn!("start_rejected: {}", request.stream_id),
                Err(err) => warn!("start_error: {}: {err}", request.stream_id),
            }
        });
        Ok(stream_id)
    }

    pub fn stop(&self, stream_id: &str) {
        let stream_id = stream_id.to_string();
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.stop_stream(&stream_id).await {
                Ok(ack) if ack.ok => info!("stop_accepted: {stream_id}"),
                Ok(_) => warn!("stop_rejected: {stream_id}"),
                Err(err) => warn!("stop_error: {stream_id}: {err}"),
            }
        });
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
