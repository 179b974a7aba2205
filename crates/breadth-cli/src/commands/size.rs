//! BIDBACK 포지션 사이징 명령어.
//!
//! ```bash
//! breadth size --up4 1200 --down4 200 --t2108 15 --vix 12 --portfolio 100000
//! breadth size --up4 500 --t2108 50 --vix 20 --portfolio 100000 --base-pct 0.10
//! ```

use super::print_json;
use anyhow::Result;
use breadth_engine::AppConfig;
use breadth_risk::{BreadthInputs, PortfolioParams, PositionRiskCalculator};
use rust_decimal::Decimal;
use tracing::info;

/// 사이징 명령 인자.
#[derive(Debug, Clone)]
pub struct SizeArgs {
    pub up4: u32,
    pub down4: u32,
    pub t2108: f64,
    pub vix: f64,
    pub portfolio: Decimal,
    pub base_pct: Option<Decimal>,
}

/// 사이징을 계산해 출력합니다.
pub fn run_size(config: &AppConfig, args: SizeArgs) -> Result<()> {
    let calculator = PositionRiskCalculator::new(config.bidback.clone());

    let mut params = PortfolioParams::new(args.portfolio);
    if let Some(pct) = args.base_pct {
        params = params.with_base_size_percentage(pct);
    }

    let decision = calculator.compute(
        BreadthInputs::new(args.up4, args.down4, args.t2108),
        args.vix,
        params,
    )?;
    info!(
        tier = %decision.breadth_tier,
        regime = decision.vix_regime.as_str(),
        amount = %decision.final_amount,
        "Position sized"
    );
    print_json(&decision)
}
