//! Single-line JSON run report (§6), matching `FLP_Main.cc`'s `cout <<`
//! sequence field-for-field.

use serde::Serialize;

/// Reported once per run: initial-state cost breakdown, final cost
/// breakdown, timings, and a couple of structural ratios.
///
/// `iterations` is only populated for the time-bounded annealer (`CSKSAtb`);
/// every other runner serializes it as absent, matching the original's
/// conditional `cout <<` of that field.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub cost: i64,
    pub supply: i64,
    pub opening: i64,
    pub init_cost: i64,
    pub init_supply: i64,
    pub init_opening: i64,
    pub init_time: f64,
    pub time: f64,
    pub consistent: &'static str,
    pub ss_ratio: f64,
    pub open_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,
    pub seed: u64,
}

impl RunReport {
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).expect("RunReport always serializes")
    }
}

/// Emitted in place of a [`RunReport`] when greedy construction exhausts its
/// retry budget (spec §6/§7): `{"cost": 100000000000, "greedy": "infeasible"}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GreedyFailureReport {
    pub cost: i64,
    pub greedy: &'static str,
}

impl Default for GreedyFailureReport {
    fn default() -> Self {
        Self {
            cost: crate::builders::INFEASIBLE_GREEDY_COST,
            greedy: "infeasible",
        }
    }
}

impl GreedyFailureReport {
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).expect("GreedyFailureReport always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_order_matches_flp_main() {
        let report = RunReport {
            cost: 1,
            supply: 2,
            opening: 3,
            init_cost: 4,
            init_supply: 5,
            init_opening: 6,
            init_time: 0.1,
            time: 0.2,
            consistent: "yes",
            ss_ratio: 0.5,
            open_ratio: 0.25,
            iterations: None,
            seed: 42,
        };
        let line = report.to_json_line();
        let cost_pos = line.find("\"cost\"").unwrap();
        let seed_pos = line.find("\"seed\"").unwrap();
        assert!(cost_pos < seed_pos);
        assert!(!line.contains("iterations"));
    }

    #[test]
    fn iterations_present_when_set() {
        let report = RunReport {
            cost: 1,
            supply: 2,
            opening: 3,
            init_cost: 4,
            init_supply: 5,
            init_opening: 6,
            init_time: 0.1,
            time: 0.2,
            consistent: "yes",
            ss_ratio: 0.5,
            open_ratio: 0.25,
            iterations: Some(17),
            seed: 42,
        };
        assert!(report.to_json_line().contains("\"iterations\":17"));
    }

    #[test]
    fn greedy_failure_report_matches_sentinel() {
        let report = GreedyFailureReport::default();
        assert_eq!(report.to_json_line(), r#"{"cost":100000000000,"greedy":"infeasible"}"#);
    }
}
