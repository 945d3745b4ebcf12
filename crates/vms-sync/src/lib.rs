//! Synchronization engine for the VMS console: keeps the known stream set
//! reconciled against the backend and runs one polling task per live stream,
//! feeding aggregated views to the UI over a single event channel.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod poll;

pub use config::EngineConfig;
pub use dispatch::{ActionDispatcher, DispatchError, StartForm};
pub use engine::{alerts_loop, diff_streams, registry_loop, EngineEvent, StreamDiff};
pub use poll::{PollState, PollStatus};
