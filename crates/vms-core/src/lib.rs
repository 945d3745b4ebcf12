use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub mod aggregate;

pub use aggregate::{aggregate, Aggregated};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub stream_id: String,
    pub source: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub last_timestamp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthInfo {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub models: Vec<String>,
}

/// One timestamped result emitted by a backend analysis model. The wire
/// carries `model` as a string discriminant next to an untyped `summary`
/// object; decoding folds the pair into the closed [`ModelSummary`] union so
/// downstream code can match instead of string-branching. Unknown models
/// decode to [`ModelSummary::Other`] rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireResult", into = "WireResult")]
pub struct InferenceResult {
    pub stream_id: String,
    pub model: String,
    pub timestamp: f64,
    pub summary: ModelSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireResult {
    #[serde(default)]
    stream_id: String,
    model: String,
    timestamp: f64,
    #[serde(default)]
    summary: Value,
}

impl From<WireResult> for InferenceResult {
    fn from(wire: WireResult) -> Self {
        let summary = ModelSummary::decode(&wire.model, wire.summary);
        Self {
            stream_id: wire.stream_id,
            model: wire.model,
            timestamp: wire.timestamp,
            summary,
        }
    }
}

impl From<InferenceResult> for WireResult {
    fn from(result: InferenceResult) -> Self {
        Self {
            stream_id: result.stream_id,
            model: result.model,
            timestamp: result.timestamp,
            summary: result.summary.into_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelSummary {
    AssetDetection(AssetDetection),
    DefectAnalysis(DefectAnalysis),
    RoadCondition(RoadCondition),
    TrafficAnalysis(TrafficAnalysis),
    Other(Value),
}

impl ModelSummary {
    /// Decode a raw summary payload against its model discriminant. A model
    /// the console does not know, or a known model whose payload does not
    /// match its contract, yields `Other` so a single odd result never sinks
    /// the whole response.
    pub fn decode(model: &str, payload: Value) -> Self {
        fn typed<T, F>(payload: Value, wrap: F) -> ModelSummary
        where
            T: for<'de> Deserialize<'de>,
            F: FnOnce(T) -> ModelSummary,
        {
            match serde_json::from_value::<T>(payload.clone()) {
                Ok(parsed) => wrap(parsed),
                Err(_) => ModelSummary::Other(payload),
            }
        }

        match model {
            "asset_detection" => typed(payload, ModelSummary::AssetDetection),
            "defect_analysis" => typed(payload, ModelSummary::DefectAnalysis),
            "road_condition" => typed(payload, ModelSummary::RoadCondition),
            "traffic_analysis" => typed(payload, ModelSummary::TrafficAnalysis),
            _ => ModelSummary::Other(payload),
        }
    }

    fn into_value(self) -> Value {
        let encoded = match self {
            ModelSummary::AssetDetection(summary) => serde_json::to_value(summary),
            ModelSummary::DefectAnalysis(summary) => serde_json::to_value(summary),
            ModelSummary::RoadCondition(summary) => serde_json::to_value(summary),
            ModelSummary::TrafficAnalysis(summary) => serde_json::to_value(summary),
            ModelSummary::Other(value) => return value,
        };
        encoded.unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDetection {
    #[serde(default)]
    pub objects: u32,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectAnalysis {
    pub defect_score: f64,
    pub defect_type: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadCondition {
    pub condition: RoadState,
    pub score: f64,
    #[serde(default)]
    pub surface_type: String,
    #[serde(default)]
    pub weather_impact: String,
}

/// Backend road-condition label. Backends have shipped labels outside the
/// agreed four (`critical` among them); those land in `Other` with the raw
/// label preserved for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoadState {
    Excellent,
    Good,
    Fair,
    Poor,
    Other(String),
}

impl RoadState {
    pub fn label(&self) -> &str {
        match self {
            RoadState::Excellent => "excellent",
            RoadState::Good => "good",
            RoadState::Fair => "fair",
            RoadState::Poor => "poor",
            RoadState::Other(raw) => raw,
        }
    }
}

impl From<String> for RoadState {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "excellent" => RoadState::Excellent,
            "good" => RoadState::Good,
            "fair" => RoadState::Fair,
            "poor" => RoadState::Poor,
            _ => RoadState::Other(raw),
        }
    }
}

impl From<RoadState> for String {
    fn from(state: RoadState) -> Self {
        state.label().to_string()
    }
}

impl fmt::Display for RoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficAnalysis {
    pub vehicle_count: u32,
    pub average_speed: f64,
    pub density: Density,
    pub congestion_level: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Low,
    Medium,
    High,
}

impl Density {
    pub fn as_str(&self) -> &'static str {
        match self {
            Density::Low => "low",
            Density::Medium => "medium",
            Density::High => "high",
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub stream_id: String,
    pub level: AlertLevel,
    pub message: String,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warn,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warn => "warn",
            AlertLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertLevel {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "info" => Ok(AlertLevel::Info),
            "warn" | "warning" => Ok(AlertLevel::Warn),
            "critical" | "error" => Ok(AlertLevel::Critical),
            other => Err(format!("Unknown alert level: {other}")),
        }
    }
}
