//! 6팩터 모델.
//!
//! - primary: 당일 4% 상승/하락 비율
//! - secondary: 13%/34일, 25%/분기, 25%/월, 50%/월 상승 비율의 평균
//! - reference: T2108
//! - sector: 섹터 비율 평균

use super::{mean_sector_unit, net_advances, t2108_unit, up_ratio, AlgorithmOutput};
use crate::resolver::{BreadthField, ResolvedInputs};
use breadth_core::BreadthCalculationConfig;

const HORIZON_PAIRS: [(BreadthField, BreadthField); 4] = [
    (BreadthField::StocksUp13Pct34Days, BreadthField::StocksDown13Pct34Days),
    (BreadthField::StocksUp25PctQuarter, BreadthField::StocksDown25PctQuarter),
    (BreadthField::StocksUp25PctMonth, BreadthField::StocksDown25PctMonth),
    (BreadthField::StocksUp50PctMonth, BreadthField::StocksDown50PctMonth),
];

pub(super) fn compute(
    inputs: &ResolvedInputs,
    _config: &BreadthCalculationConfig,
) -> AlgorithmOutput {
    let mut out = AlgorithmOutput::new();

    let primary = up_ratio(
        inputs.get(BreadthField::StocksUp4Pct),
        inputs.get(BreadthField::StocksDown4Pct),
    );

    let horizon: Vec<f64> = HORIZON_PAIRS
        .iter()
        .filter_map(|(up, down)| up_ratio(inputs.get(*up), inputs.get(*down)))
        .collect();
    let secondary = (!horizon.is_empty()).then(|| horizon.iter().sum::<f64>() / horizon.len() as f64);

    out.components.primary_score = out.score_or_neutral("primary", primary);
    out.components.secondary_score = out.score_or_neutral("secondary", secondary);
    out.components.reference_score = out.score_or_neutral("reference", t2108_unit(inputs));
    out.components.sector_score = out.score_or_neutral("sector", mean_sector_unit(inputs));
    out.components.net_advances = net_advances(inputs);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use breadth_core::AlgorithmType;

    #[test]
    fn test_strong_breadth_scores_high() {
        let inputs = ResolvedInputs::default()
            .with(BreadthField::StocksUp4Pct, 900.0)
            .with(BreadthField::StocksDown4Pct, 100.0)
            .with(BreadthField::StocksUp25PctQuarter, 800.0)
            .with(BreadthField::StocksDown25PctQuarter, 200.0)
            .with(BreadthField::T2108, 70.0);
        let config = BreadthCalculationConfig::builtin(AlgorithmType::SixFactor);

        let out = compute(&inputs, &config);
        assert!((out.components.primary_score - 0.9).abs() < 1e-12);
        assert!((out.components.secondary_score - 0.8).abs() < 1e-12);
        assert!((out.components.reference_score - 0.7).abs() < 1e-12);
        assert_eq!(out.fallbacks, vec!["sector"]);
        assert_eq!(out.components.net_advances, 800.0);
    }
}
