//! 로지스틱 정규화 모델.
//!
//! 순상승 폭과 섹터 참여도를 로지스틱 곡선으로 눌러 극단값의 영향을 줄입니다.
//! 곡선 기울기는 설정의 [`AlgorithmParameters`](breadth_core::AlgorithmParameters)에서 읽습니다.

use super::{net_advances, t2108_unit, up_ratio, AlgorithmOutput};
use crate::resolver::{BreadthField, ResolvedInputs};
use breadth_core::BreadthCalculationConfig;

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn net_advance_ratio(inputs: &ResolvedInputs) -> Option<f64> {
    let pairs = [
        (BreadthField::AdvancingIssues, BreadthField::DecliningIssues),
        (BreadthField::StocksUp4Pct, BreadthField::StocksDown4Pct),
    ];
    pairs.iter().find_map(|(up, down)| {
        let (up, down) = (inputs.get(*up)?, inputs.get(*down)?);
        let total = up + down;
        (total > 0.0).then(|| (up - down) / total)
    })
}

pub(super) fn compute(
    inputs: &ResolvedInputs,
    config: &BreadthCalculationConfig,
) -> AlgorithmOutput {
    let gains = config.parameters;
    let mut out = AlgorithmOutput::new();

    let primary = net_advance_ratio(inputs).map(|r| logistic(gains.net_advance_gain * r));
    let secondary = up_ratio(
        inputs.get(BreadthField::NewHighs),
        inputs.get(BreadthField::NewLows),
    );
    let sector = (!inputs.sectors.is_empty()).then(|| {
        let mean = inputs.sectors.values().sum::<f64>() / inputs.sectors.len() as f64;
        logistic(gains.sector_gain * (mean / 100.0 - 0.5))
    });

    out.components.primary_score = out.score_or_neutral("primary", primary);
    out.components.secondary_score = out.score_or_neutral("secondary", secondary);
    out.components.reference_score = out.score_or_neutral("reference", t2108_unit(inputs));
    out.components.sector_score = out.score_or_neutral("sector", sector);
    out.components.net_advances = net_advances(inputs);
    out
}
