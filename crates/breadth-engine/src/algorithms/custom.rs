//! 5일/10일 비율 모델.

use super::{mean_sector_unit, net_advances, ratio_to_unit, t2108_unit, AlgorithmOutput};
use crate::resolver::{BreadthField, ResolvedInputs};
use breadth_core::BreadthCalculationConfig;

pub(super) fn compute(
    inputs: &ResolvedInputs,
    _config: &BreadthCalculationConfig,
) -> AlgorithmOutput {
    let mut out = AlgorithmOutput::new();

    let primary = ratio_to_unit(inputs.get(BreadthField::Ratio5Day));
    let secondary = ratio_to_unit(inputs.get(BreadthField::Ratio10Day));

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
    fn test_ratios_map_to_unit_interval() {
        let inputs = ResolvedInputs::default()
            .with(BreadthField::Ratio5Day, 3.0)
            .with(BreadthField::Ratio10Day, 0.25);
        let config = BreadthCalculationConfig::builtin(AlgorithmType::Custom);

        let out = compute(&inputs, &config);
        assert!((out.components.primary_score - 0.75).abs() < 1e-12);
        assert!((out.components.secondary_score - 0.2).abs() < 1e-12);
        assert_eq!(out.fallbacks, vec!["reference", "sector"]);
    }
}
