//! Pure reduction from a stream's raw result history to the view the console
//! renders: a bounded most-recent window plus the single latest result per
//! model.

use crate::InferenceResult;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregated {
    /// Last `cap` results in arrival order, most recent last.
    pub window: Vec<InferenceResult>,
    pub latest_by_model: BTreeMap<String, InferenceResult>,
}

/// Reduce an arrival-ordered result sequence to the bounded window and the
/// latest result per model. On equal timestamps the later-arriving entry
/// wins, keeping the reduction deterministic for any fixed input order.
pub fn aggregate(results: &[InferenceResult], cap: usize) -> Aggregated {
    let start = results.len().saturating_sub(cap);
    let window: Vec<InferenceResult> = results[start..].to_vec();

    let mut latest_by_model: BTreeMap<String, InferenceResult> = BTreeMap::new();
    for result in &window {
        let replace = match latest_by_model.get(&result.model) {
            Some(current) => result.timestamp >= current.timestamp,
            None => true,
        };
        if replace {
            latest_by_model.insert(result.model.clone(), result.clone());
        }
    }

    Aggregated {
        window,
        latest_by_model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelSummary;
    use serde_json::json;

    fn result(model: &str, timestamp: f64, tag: &str) -> InferenceResult {
        InferenceResult {
            stream_id: "s1".to_string(),
            model: model.to_string(),
            timestamp,
            summary: ModelSummary::Other(json!({ "tag": tag })),
        }
    }

    #[test]
    fn window_is_bounded_and_keeps_tail_order() {
        let input: Vec<_> = (0..12)
            .map(|i| result("asset_detection", i as f64, &format!("r{i}")))
            .collect();

        let out = aggregate(&input, 8);
        assert_eq!(out.window.len(), 8);
        let timestamps: Vec<f64> = out.window.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn short_input_passes_through_whole() {
        let input = vec![result("asset_detection", 1.0, "a")];
        let out = aggregate(&input, 8);
        assert_eq!(out.window.len(), 1);
        assert_eq!(out.latest_by_model.len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_view() {
        let out = aggregate(&[], 8);
        assert!(out.window.is_empty());
        assert!(out.latest_by_model.is_empty());
    }

    #[test]
    fn zero_cap_yields_empty_view() {
        let input = vec![result("asset_detection", 1.0, "a")];
        let out = aggregate(&input, 0);
        assert!(out.window.is_empty());
        assert!(out.latest_by_model.is_empty());
    }

    #[test]
    fn latest_per_model_tracks_max_timestamp() {
        let input = vec![
            result("asset_detection", 1.0, "a1"),
            result("defect_analysis", 2.0, "d1"),
            result("asset_detection", 3.0, "a2"),
            result("asset_detection", 2.0, "a-late-but-older"),
        ];

        let out = aggregate(&input, 8);
        assert_eq!(out.window.len(), 4);
        assert_eq!(out.latest_by_model["asset_detection"].timestamp, 3.0);
        assert_eq!(out.latest_by_model["defect_analysis"].timestamp, 2.0);
    }

    #[test]
    fn mixed_models_spec_scenario() {
        let input = vec![
            result("asset_detection", 1.0, "a1"),
            result("defect_analysis", 2.0, "d1"),
            result("asset_detection", 2.0, "a2"),
            result("asset_detection", 3.0, "a3"),
        ];

        let out = aggregate(&input, 8);
        assert_eq!(out.window.len(), 4);
        assert_eq!(out.latest_by_model.len(), 2);
        assert_eq!(out.latest_by_model["asset_detection"].timestamp, 3.0);
        assert_eq!(out.latest_by_model["defect_analysis"].timestamp, 2.0);
    }

    #[test]
    fn equal_timestamps_resolve_to_later_arrival() {
        let input = vec![
            result("asset_detection", 5.0, "first"),
            result("asset_detection", 5.0, "second"),
        ];

        let out = aggregate(&input, 8);
        let winner = &out.latest_by_model["asset_detection"];
        assert_eq!(
            winner.summary,
            ModelSummary::Other(json!({ "tag": "second" }))
        );
    }

    #[test]
    fn truncation_happens_before_reduction() {
        // An old result pushed out of the window must not surface as latest.
        let mut input: Vec<_> = vec![result("defect_analysis", 99.0, "evicted")];
        input.extend((0..8).map(|i| result("asset_detection", i as f64, &format!("r{i}"))));

        let out = aggregate(&input, 8);
        assert_eq!(out.window.len(), 8);
        assert!(!out.latest_by_model.contains_key("defect_analysis"));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let input = vec![
            result("asset_detection", 1.0, "a1"),
            result("traffic_analysis", 4.0, "t1"),
            result("asset_detection", 3.0, "a2"),
        ];

        assert_eq!(aggregate(&input, 2), aggregate(&input, 2));
        assert_eq!(aggregate(&input, 8), aggregate(&input, 8));
    }
}
