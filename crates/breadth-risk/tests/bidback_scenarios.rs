//! BIDBACK 사이징/청산 규칙 통합 테스트.

use breadth_risk::{
    vix_tier, BidbackConfig, BreadthInputs, BreadthTier, ExitScheduler, PortfolioParams,
    PositionRiskCalculator, VixRegime, VIX_EXIT_TIERS,
};
use chrono::{Datelike, NaiveDate, Weekday};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn calculator() -> PositionRiskCalculator {
    PositionRiskCalculator::new(BidbackConfig::default())
}

#[test]
fn test_big_opportunity_in_ultra_low_vix() {
    let decision = calculator()
        .compute(
            BreadthInputs::new(1200, 200, 15.0),
            12.0,
            PortfolioParams::new(dec!(100000)),
        )
        .unwrap();

    assert!(decision.big_opportunity);
    assert_eq!(decision.breadth_tier, BreadthTier::BigOpportunity);
    assert_eq!(decision.breadth_multiplier, dec!(2.0));
    assert_eq!(decision.vix_multiplier, dec!(0.8));
    assert_eq!(decision.vix_regime, VixRegime::UltraLow);
}

#[test]
fn test_weak_breadth_extreme_vix() {
    let decision = calculator()
        .compute(
            BreadthInputs::new(80, 300, 85.0),
            45.0,
            PortfolioParams::new(dec!(100000)),
        )
        .unwrap();

    assert!(decision.avoid_entry);
    assert_eq!(decision.breadth_multiplier, Decimal::ZERO);
    assert_eq!(decision.vix_regime.as_str(), "extreme");
    assert_eq!(decision.final_amount, Decimal::ZERO);
}

#[test]
fn test_normal_sizing_uncapped() {
    let params = PortfolioParams::new(dec!(100000)).with_base_size_percentage(dec!(0.10));
    let decision = calculator()
        .compute(BreadthInputs::new(500, 200, 50.0), 20.0, params)
        .unwrap();

    assert_eq!(decision.breadth_multiplier, dec!(1.0));
    assert_eq!(decision.vix_multiplier, dec!(1.0));
    assert_eq!(decision.final_amount, dec!(10000));
    assert!(!decision.capped);
}

#[test]
fn test_extreme_sizing_capped_at_thirty_percent() {
    let decision = calculator()
        .compute(
            BreadthInputs::new(2000, 0, 5.0),
            50.0,
            PortfolioParams::new(dec!(50000)),
        )
        .unwrap();

    assert_eq!(decision.final_amount, dec!(15000));
    assert!(decision.capped);
    assert_eq!(decision.portfolio_percent, dec!(30));
}

#[test]
fn test_exit_plan_reuses_sizing_regime() {
    let scheduler = ExitScheduler::us_equities(2024, 2026);
    let entry = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    let plan = scheduler.compute_exit_plan(entry, dec!(100), 12.0).unwrap();

    // 7/3 조기폐장은 거래일, 7/4 휴장
    assert_eq!(plan.regime, VixRegime::UltraLow);
    assert_eq!(plan.exit_date, NaiveDate::from_ymd_opt(2025, 7, 3).unwrap());
}

proptest! {
    #[test]
    fn prop_final_amount_never_exceeds_cap(
        up4 in 0u32..=10_000,
        down4 in 0u32..=10_000,
        t2108 in 0.0f64..=100.0,
        vix in 0.0f64..200.0,
        portfolio in 1u32..=10_000_000,
        base_bp in 1u32..=10_000,
    ) {
        let portfolio = Decimal::from(portfolio);
        let params = PortfolioParams::new(portfolio)
            .with_base_size_percentage(Decimal::new(base_bp as i64, 4));
        let decision = calculator()
            .compute(BreadthInputs::new(up4, down4, t2108), vix, params)
            .unwrap();

        prop_assert!(decision.final_amount <= portfolio * dec!(0.30));
        prop_assert!(decision.final_amount >= Decimal::ZERO);
        prop_assert_eq!(decision.capped, decision.raw_amount > decision.cap_amount);
    }

    #[test]
    fn prop_no_entry_below_hundred(
        up4 in 0u32..100,
        t2108 in 0.0f64..=100.0,
        vix in 0.0f64..200.0,
    ) {
        let decision = calculator()
            .compute(BreadthInputs::new(up4, 0, t2108), vix, PortfolioParams::new(dec!(100000)))
            .unwrap();

        prop_assert_eq!(decision.breadth_multiplier, Decimal::ZERO);
        prop_assert_eq!(decision.final_amount, Decimal::ZERO);
        prop_assert!(decision.avoid_entry);
    }

    #[test]
    fn prop_big_opportunity_iff_strict(
        up4 in 0u32..=3000,
        t2108 in 0.0f64..=100.0,
    ) {
        let decision = calculator()
            .compute(BreadthInputs::new(up4, 0, t2108), 18.0, PortfolioParams::new(dec!(100000)))
            .unwrap();

        prop_assert_eq!(decision.big_opportunity, t2108 < 20.0 && up4 > 1000);
    }

    #[test]
    fn prop_every_vix_matches_exactly_one_tier(vix in 0.0f64..1000.0) {
        let matching = VIX_EXIT_TIERS.iter().filter(|t| t.contains(vix)).count();
        prop_assert_eq!(matching, 1);
        prop_assert!(vix_tier(vix).is_ok());
    }

    #[test]
    fn prop_exit_date_is_trading_day(
        offset in 0i64..300,
        vix in 0.0f64..80.0,
    ) {
        let scheduler = ExitScheduler::us_equities(2024, 2027);
        let entry = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(offset);
        let plan = scheduler.compute_exit_plan(entry, dec!(100), vix).unwrap();

        prop_assert!(scheduler.calendar().is_trading_day(plan.exit_date));
        prop_assert!(!matches!(plan.exit_date.weekday(), Weekday::Sat | Weekday::Sun));
        prop_assert!(plan.exit_date > entry);
    }
}
