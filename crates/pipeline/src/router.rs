//! Intent routing: free text to an ordered list of stages.
//!
//! Pure keyword matching. The first matching rule wins; text matching no
//! rule gets [`FALLBACK_ROUTE`]. Runs never consult the router.

use iqraa_core::stage::{Stage, StageId};
use serde::Serialize;

use crate::stages::get_stage;

pub const FALLBACK_ROUTE: &[StageId] = &[StageId(1), StageId(2), StageId(3), StageId(10)];

/// `(keywords, route)`, checked in order against the lowercased intent.
const RULES: &[(&[&str], &[StageId])] = &[
    (&["analy"], &[StageId(1), StageId(2), StageId(3), StageId(10)]),
    (
        &["search"],
        &[StageId(1), StageId(4), StageId(2), StageId(3), StageId(10)],
    ),
    (&["plan", "project"], &[StageId(1), StageId(7), StageId(5), StageId(10)]),
    (
        &["reason", "logic"],
        &[StageId(1), StageId(11), StageId(2), StageId(3), StageId(10)],
    ),
    (&["document", "file"], &[StageId(9), StageId(2), StageId(3), StageId(10)]),
    (&["code", "run"], &[StageId(1), StageId(8), StageId(10)]),
];

pub fn route(intent: &str) -> &'static [StageId] {
    let intent = intent.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| intent.contains(*k)))
        .map_or(FALLBACK_ROUTE, |(_, stages)| *stages)
}

/// A route with its stages resolved, for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub intent: String,
    pub stage_ids: Vec<StageId>,
    pub stages: Vec<&'static Stage>,
}

pub fn route_plan(intent: &str) -> RoutePlan {
    let ids = route(intent);
    RoutePlan {
        intent: intent.to_string(),
        stage_ids: ids.to_vec(),
        stages: ids.iter().filter_map(|id| get_stage(*id)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(route: &[StageId]) -> Vec<u8> {
        route.iter().map(|s| s.0).collect()
    }

    #[test]
    fn keyword_routes() {
        assert_eq!(ids(route("Analyze this essay")), vec![1, 2, 3, 10]);
        assert_eq!(ids(route("search the archive")), vec![1, 4, 2, 3, 10]);
        assert_eq!(ids(route("draft a project timeline")), vec![1, 7, 5, 10]);
        assert_eq!(ids(route("check the LOGIC")), vec![1, 11, 2, 3, 10]);
        assert_eq!(ids(route("summarize this file")), vec![9, 2, 3, 10]);
        assert_eq!(ids(route("write some code")), vec![1, 8, 10]);
    }

    #[test]
    fn first_matching_rule_wins() {
        // "analysis plan" matches both; analysis comes first
        assert_eq!(ids(route("analysis plan")), vec![1, 2, 3, 10]);
    }

    #[test]
    fn unmatched_and_empty_use_fallback() {
        assert_eq!(route("hello there"), FALLBACK_ROUTE);
        assert_eq!(route(""), FALLBACK_ROUTE);
    }

    #[test]
    fn every_routed_stage_exists() {
        for (_, stages) in RULES {
            for id in *stages {
                assert!(get_stage(*id).is_some());
            }
        }
    }

    #[test]
    fn plan_resolves_stage_entries() {
        let plan = route_plan("search");
        assert_eq!(plan.stages.len(), plan.stage_ids.len());
        assert_eq!(plan.stages[1].name, "Advanced Search & Retrieval");
    }
}
