use std::time::Duration;

const DEFAULT_REGISTRY_INTERVAL_MS: u64 = 1_500;
const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
const DEFAULT_ALERTS_INTERVAL_MS: u64 = 5_000;
const DEFAULT_HISTORY_CAP: usize = 8;
const DEFAULT_RESULT_LIMIT: usize = 10;

/// Engine cadences and caps. The source deployments disagree on refresh
/// cadence and history depth, so every knob here is env-tunable rather than
/// hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Period of the stream-list reconciliation tick.
    pub registry_interval: Duration,
    /// Period of each per-stream result poll.
    pub poll_interval: Duration,
    /// Period of the alerts poll.
    pub alerts_interval: Duration,
    /// Most-recent results kept per stream after aggregation.
    pub history_cap: usize,
    /// `limit` passed to the backend results fetch.
    pub result_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registry_interval: Duration::from_millis(DEFAULT_REGISTRY_INTERVAL_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            alerts_interval: Duration::from_millis(DEFAULT_ALERTS_INTERVAL_MS),
            history_cap: DEFAULT_HISTORY_CAP,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            registry_interval: resolve_millis(
                "VMS_REGISTRY_INTERVAL_MS",
                DEFAULT_REGISTRY_INTERVAL_MS,
            ),
            poll_interval: resolve_millis("VMS_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
            alerts_interval: resolve_millis("VMS_ALERTS_INTERVAL_MS", DEFAULT_ALERTS_INTERVAL_MS),
            history_cap: resolve_count("VMS_HISTORY_CAP", defaults.history_cap),
            result_limit: resolve_count("VMS_RESULT_LIMIT", defaults.result_limit),
        }
    }
}

fn resolve_millis(name: &str, fallback_ms: u64) -> Duration {
    let value = std::env::var(name).ok();
    Duration::from_millis(parse_positive_u64(value.as_deref()).unwrap_or(fallback_ms))
}

fn resolve_count(name: &str, fallback: usize) -> usize {
    let value = std::env::var(name).ok();
    parse_positive_u64(value.as_deref())
        .map(|parsed| parsed as usize)
        .unwrap_or(fallback)
}

fn parse_positive_u64(value: Option<&str>) -> Option<u64> {
    let parsed = value?.trim().parse::<u64>().ok()?;
    if parsed == 0 {
        return None;
    }
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_latest_console_variant() {
        let config = EngineConfig::default();
        assert_eq!(config.registry_interval, Duration::from_millis(1_500));
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.history_cap, 8);
        assert_eq!(config.result_limit, 10);
    }

    #[test]
    fn parse_rejects_zero_and_garbage() {
        assert_eq!(parse_positive_u64(Some("2500")), Some(2_500));
        assert_eq!(parse_positive_u64(Some("  42 ")), Some(42));
        assert_eq!(parse_positive_u64(Some("0")), None);
        assert_eq!(parse_positive_u64(Some("fast")), None);
        assert_eq!(parse_positive_u64(Some("-5")), None);
        assert_eq!(parse_positive_u64(None), None);
    }

    #[test]
    fn env_overrides_apply() {
        std::env::set_var("VMS_HISTORY_CAP", "5");
        std::env::set_var("VMS_POLL_INTERVAL_MS", "2000");
        let config = EngineConfig::from_env();
        std::env::remove_var("VMS_HISTORY_CAP");
        std::env::remove_var("VMS_POLL_INTERVAL_MS");

        assert_eq!(config.history_cap, 5);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.registry_interval, Duration::from_millis(1_500));
    }
}
