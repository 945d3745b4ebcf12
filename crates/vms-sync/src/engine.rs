//! Registry and poller tasks.
//!
//! One registry task reconciles the known stream set against the backend on
//! a fixed period and supervises one poller task per live stream. All state
//! flows to the UI as [`EngineEvent`]s over a single mpsc channel; nothing
//! here is shared mutably across tasks.

use crate::config::EngineConfig;
use crate::poll::PollState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use vms_client::BackendClient;
use vms_core::{Alert, StreamDescriptor};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Fresh authoritative stream list; descriptors replace previous ones
    /// wholesale.
    Streams(Vec<StreamDescriptor>),
    /// A poller was spawned for a stream that just appeared. `generation`
    /// tags every poll event that poller will emit.
    StreamAdded { stream_id: String, generation: u64 },
    /// The stream vanished from the backend list; its poller is gone and its
    /// state must be discarded.
    StreamRemoved(String),
    /// Snapshot from one poller tick. Consumers must drop snapshots whose
    /// generation does not match the stream's current poller: a snapshot can
    /// race teardown and arrive after its poller was destroyed.
    Poll {
        stream_id: String,
        generation: u64,
        state: PollState,
    },
    Alerts(Vec<Alert>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Diff the known stream ids against a freshly fetched list. Ids present in
/// both sets are untouched; their pollers keep running with state intact.
pub fn diff_streams<'a, K>(known: K, incoming: &[StreamDescriptor]) -> StreamDiff
where
    K: IntoIterator<Item = &'a String>,
{
    let incoming_ids: Vec<&str> = incoming.iter().map(|s| s.stream_id.as_str()).collect();
    let known_ids: Vec<&String> = known.into_iter().collect();

    let removed = known_ids
        .iter()
        .filter(|id| !incoming_ids.contains(&id.as_str()))
        .map(|id| (*id).clone())
        .collect();
    let added = incoming_ids
        .iter()
        .filter(|id| !known_ids.iter().any(|known| known.as_str() == **id))
        .map(|id| (*id).to_string())
        .collect();

    StreamDiff { added, removed }
}

struct PollerHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl PollerHandle {
    fn destroy(self) {
        self.task.abort();
    }
}

/// Stream-list reconciliation loop. Runs until the event receiver closes,
/// then tears down every poller it spawned. A failed list fetch leaves the
/// known set untouched and is retried on the next tick indefinitely.
pub async fn registry_loop(
    client: Arc<BackendClient>,
    config: EngineConfig,
    tx: mpsc::Sender<EngineEvent>,
) {
    let mut interval = tokio::time::interval(config.registry_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pollers: HashMap<String, PollerHandle> = HashMap::new();
    let mut next_generation: u64 = 0;

    loop {
        interval.tick().await;

        let streams = match client.list_streams().await {
            Ok(streams) => streams,
            Err(err) => {
                warn!("stream_list_error: {err}");
                continue;
            }
        };

        let diff = diff_streams(pollers.keys(), &streams);
        for stream_id in diff.removed {
            if let Some(handle) = pollers.remove(&stream_id) {
                debug!("poller_destroyed: {stream_id} gen={}", handle.generation);
                handle.destroy();
            }
            if tx
                .send(EngineEvent::StreamRemoved(stream_id))
                .await
                .is_err()
            {
                return shutdown(pollers);
            }
        }
        for stream_id in diff.added {
            next_generation += 1;
            let generation = next_generation;
            debug!("poller_spawned: {stream_id} gen={generation}");
            let task = tokio::spawn(poller_loop(
                client.clone(),
                config,
                stream_id.clone(),
                generation,
                tx.clone(),
            ));
            pollers.insert(stream_id.clone(), PollerHandle { generation, task });
            if tx
                .send(EngineEvent::StreamAdded {
                    stream_id,
                    generation,
                })
                .await
                .is_err()
            {
                return shutdown(pollers);
            }
        }

        if tx.send(EngineEvent::Streams(streams)).await.is_err() {
            return shutdown(pollers);
        }
    }
}

fn shutdown(pollers: HashMap<String, PollerHandle>) {
    for (_, handle) in pollers {
        handle.destroy();
    }
}

/// One stream's polling loop. The task owns its [`PollState`] outright and
/// publishes a snapshot after every tick. The loop awaits each fetch before
/// the next tick fires, so at most one request is in flight per stream.
async fn poller_loop(
    client: Arc<BackendClient>,
    config: EngineConfig,
    stream_id: String,
    generation: u64,
    tx: mpsc::Sender<EngineEvent>,
) {
    let mut interval = tokio::time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut state = PollState::default();

    loop {
        interval.tick().await;
        match client.results(&stream_id, config.result_limit).await {
            Ok(results) => state.apply_success(&results, config.history_cap),
            Err(err) => {
                warn!("results_error: {stream_id}: {err}");
                state.apply_failure(err.to_string());
            }
        }
        let event = EngineEvent::Poll {
            stream_id: stream_id.clone(),
            generation,
            state: state.clone(),
        };
        if tx.send(event).await.is_err() {
            return;
        }
    }
}

/// Unresolved-alerts polling loop, same swallow-and-retry contract as the
/// registry.
pub async fn alerts_loop(
    client: Arc<BackendClient>,
    config: EngineConfig,
    tx: mpsc::Sender<EngineEvent>,
) {
    let mut interval = tokio::time::interval(config.alerts_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match client.alerts().await {
            Ok(alerts) => {
                if tx.send(EngineEvent::Alerts(alerts)).await.is_err() {
                    return;
                }
            }
            Err(err) => warn!("alerts_error: {err}"),
        }
    }
}
