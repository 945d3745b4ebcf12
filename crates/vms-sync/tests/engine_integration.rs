//! End-to-end engine behavior against a scripted HTTP backend: a stream
//! appears, its poller reports aggregated results, the stream vanishes and
//! its poller is torn down.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use vms_client::{BackendClient, ClientConfig};
use vms_sync::{registry_loop, EngineConfig, EngineEvent, PollStatus};

const STREAMS_WITH_S1: &str = concat!(
    r#"{"streams":[{"stream_id":"s1","source":"0","#,
    r#""models":["asset_detection"],"running":true}]}"#
);
const STREAMS_EMPTY: &str = r#"{"streams":[]}"#;
const RESULTS_S1: &str = concat!(
    r#"{"results":["#,
    r#"{"stream_id":"s1","model":"asset_detection","timestamp":1.0,"#,
    r#""summary":{"objects":1,"detections":[]}},"#,
    r#"{"stream_id":"s1","model":"asset_detection","timestamp":2.0,"#,
    r#""summary":{"objects":3,"detections":[]}}"#,
    r#"]}"#
);

/// Minimal scripted backend. `/streams` lists s1 for the first
/// `listings_with_s1` calls, then an empty list forever.
async fn spawn_backend(listings_with_s1: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let stream_listings = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let stream_listings = stream_listings.clone();
            tokio::spawn(async move {
                handle_connection(socket, stream_listings, listings_with_s1).await;
            });
        }
    });

    format!("http://{addr}")
}

async fn handle_connection(
    mut socket: TcpStream,
    stream_listings: Arc<AtomicUsize>,
    listings_with_s1: usize,
) {
    let mut buf = vec![0u8; 4096];
    let mut read = 0;
    loop {
        let Ok(n) = socket.read(&mut buf[read..]).await else {
            return;
        };
        read += n;
        if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    let request = String::from_utf8_lossy(&buf[..read]);
    let path = request
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();

    let body = if path == "/streams" {
        let served = stream_listings.fetch_add(1, Ordering::SeqCst);
        if served < listings_with_s1 {
            STREAMS_WITH_S1
        } else {
            STREAMS_EMPTY
        }
    } else if path.starts_with("/results/s1") {
        RESULTS_S1
    } else if path == "/alerts" {
        r#"{"alerts":[]}"#
    } else {
        r#"{}"#
    };

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        registry_interval: Duration::from_millis(50),
        poll_interval: Duration::from_millis(50),
        alerts_interval: Duration::from_millis(50),
        history_cap: 8,
        result_limit: 10,
    }
}

async fn wait_for<F>(rx: &mut mpsc::Receiver<EngineEvent>, mut predicate: F) -> EngineEvent
where
    F: FnMut(&EngineEvent) -> bool,
{
    timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.expect("engine channel closed early");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for engine event")
}

#[tokio::test]
async fn stream_lifecycle_spawns_polls_and_tears_down() {
    let base = spawn_backend(3).await;
    let client =
        Arc::new(BackendClient::new(ClientConfig::new(base)).expect("client"));
    let (tx, mut rx) = mpsc::channel(64);
    let registry = tokio::spawn(registry_loop(client, fast_config(), tx));

    let added = wait_for(&mut rx, |event| {
        matches!(event, EngineEvent::StreamAdded { stream_id, .. } if stream_id == "s1")
    })
    .await;
    let EngineEvent::StreamAdded { generation, .. } = added else {
        unreachable!();
    };

    wait_for(&mut rx, |event| {
        matches!(event, EngineEvent::Streams(streams)
            if streams.len() == 1 && streams[0].stream_id == "s1" && streams[0].running)
    })
    .await;

    let poll = wait_for(&mut rx, |event| {
        matches!(event, EngineEvent::Poll { stream_id, .. } if stream_id == "s1")
    })
    .await;
    let EngineEvent::Poll {
        generation: poll_generation,
        state,
        ..
    } = poll
    else {
        unreachable!();
    };
    assert_eq!(poll_generation, generation);
    assert_eq!(state.status, PollStatus::Ready);
    assert_eq!(state.window.len(), 2);
    assert_eq!(state.latest_by_model["asset_detection"].timestamp, 2.0);

    // Backend stops listing s1; registry must remove it and report an empty
    // list on the same tick.
    wait_for(&mut rx, |event| {
        matches!(event, EngineEvent::StreamRemoved(stream_id) if stream_id == "s1")
    })
    .await;
    wait_for(&mut rx, |event| {
        matches!(event, EngineEvent::Streams(streams) if streams.is_empty())
    })
    .await;

    registry.abort();
}

#[tokio::test]
async fn registry_survives_backend_outage() {
    // Nothing listens here; every list fetch fails.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = Arc::new(
        BackendClient::new(ClientConfig::new(format!("http://{addr}"))).expect("client"),
    );
    let (tx, mut rx) = mpsc::channel(64);
    let registry = tokio::spawn(registry_loop(client, fast_config(), tx));

    // Failed ticks emit nothing and must not kill the loop.
    let outcome = timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(outcome.is_err(), "no events expected during outage");
    assert!(!registry.is_finished());

    registry.abort();
}
