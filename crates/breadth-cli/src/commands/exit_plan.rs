//! 청산 계획 명령어.
//!
//! ```bash
//! breadth exit-plan --entry-date 2025-03-06 --entry-price 100 --vix 18
//! breadth exit-plan --entry-date 2025-03-06 --entry-price 100 --vix 18 --true-range 2.5 --t2108 15
//! ```

use super::print_json;
use anyhow::Result;
use breadth_engine::AppConfig;
use breadth_risk::{ExitAdjustments, ExitScheduler};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// 청산 계획 명령 인자.
#[derive(Debug, Clone)]
pub struct ExitPlanArgs {
    pub entry_date: NaiveDate,
    pub entry_price: Decimal,
    pub vix: f64,
    pub true_range: Option<Decimal>,
    pub t2108: Option<f64>,
}

/// 청산 계획을 계산해 출력합니다.
pub fn run_exit_plan(config: &AppConfig, args: ExitPlanArgs) -> Result<()> {
    let scheduler =
        ExitScheduler::us_equities(config.calendar.first_year, config.calendar.last_year);
    let adjustments = ExitAdjustments {
        true_range: args.true_range,
        t2108: args.t2108,
    };
    let plan =
        scheduler.compute_exit_plan_with(args.entry_date, args.entry_price, args.vix, adjustments)?;
    print_json(&plan)
}
