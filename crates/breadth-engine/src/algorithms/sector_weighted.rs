//! 섹터 시가총액 가중 모델.

use super::{net_advances, t2108_unit, up_ratio, AlgorithmOutput};
use crate::resolver::{BreadthField, ResolvedInputs};
use breadth_core::{BreadthCalculationConfig, Sector};

/// S&P 500 섹터 비중 (근사치).
fn sector_weight(sector: Sector) -> f64 {
    match sector {
        Sector::InformationTechnology => 0.325,
        Sector::Financials => 0.13,
        Sector::HealthCare => 0.11,
        Sector::ConsumerDiscretionary => 0.10,
        Sector::CommunicationServices => 0.09,
        Sector::Industrials => 0.08,
        Sector::ConsumerStaples => 0.06,
        Sector::Energy => 0.035,
        Sector::Utilities => 0.025,
        Sector::Materials => 0.023,
        Sector::RealEstate => 0.022,
    }
}

/// 존재하는 섹터 비중으로 재정규화한 가중 평균.
fn weighted_sector_unit(inputs: &ResolvedInputs) -> Option<f64> {
    let (sum, weight) = inputs
        .sectors
        .iter()
        .fold((0.0, 0.0), |(sum, weight), (sector, pct)| {
            let w = sector_weight(*sector);
            (sum + w * pct / 100.0, weight + w)
        });
    (weight > 0.0).then(|| sum / weight)
}

pub(super) fn compute(
    inputs: &ResolvedInputs,
    _config: &BreadthCalculationConfig,
) -> AlgorithmOutput {
    let mut out = AlgorithmOutput::new();

    let primary = up_ratio(
        inputs.get(BreadthField::StocksUp4Pct),
        inputs.get(BreadthField::StocksDown4Pct),
    );
    let secondary = up_ratio(
        inputs.get(BreadthField::UpVolume),
        inputs.get(BreadthField::DownVolume),
    );

    out.components.primary_score = out.score_or_neutral("primary", primary);
    out.components.secondary_score = out.score_or_neutral("secondary", secondary);
    out.components.reference_score = out.score_or_neutral("reference", t2108_unit(inputs));
    out.components.sector_score = out.score_or_neutral("sector", weighted_sector_unit(inputs));
    out.components.net_advances = net_advances(inputs);
    out
}
