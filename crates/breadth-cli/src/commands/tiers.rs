//! 규칙 표와 알고리즘 목록 출력.

use super::print_json;
use anyhow::Result;
use breadth_engine::AlgorithmRegistry;
use breadth_risk::{BreadthRule, VixExitTier, BREADTH_RULES, VIX_EXIT_TIERS};
use serde::Serialize;

#[derive(Serialize)]
struct TierTables {
    breadth_rules: &'static [BreadthRule],
    vix_tiers: &'static [VixExitTier],
}

#[derive(Serialize)]
struct AlgorithmInfo {
    id: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
}

/// BIDBACK 규칙 표를 출력합니다.
pub fn run_tiers() -> Result<()> {
    print_json(&TierTables {
        breadth_rules: &BREADTH_RULES,
        vix_tiers: &VIX_EXIT_TIERS,
    })
}

/// 등록된 점수 알고리즘을 출력합니다.
pub fn run_algorithms() -> Result<()> {
    let algorithms: Vec<AlgorithmInfo> = AlgorithmRegistry::all()
        .iter()
        .map(|entry| AlgorithmInfo {
            id: entry.algorithm.id(),
            aliases: entry.algorithm.aliases(),
            description: entry.description,
        })
        .collect();
    print_json(&algorithms)
}
