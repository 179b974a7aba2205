//! 청산 계획 계산.
//!
//! VIX 구간에서 최대 보유 거래일과 손절/익절 비율을 가져와
//! 휴장일/주말을 건너뛴 청산일과 가격을 계산합니다.
//!
//! 선택 입력으로 진입일 true range와 T2108을 받으면:
//! - 손절: 비율 손절과 true range 손절 중 진입가에서 더 먼 쪽, 이후 breadth 보정
//!   (T2108 < 20 이면 ×0.8, T2108 > 60 이면 ×1.2)
//! - 익절: 비율 목표와 true range 목표 중 진입가에서 더 먼 쪽
//! - 분할 청산: 1차/2차 목표에서 구간별 누적 비율만큼, 나머지는 청산일에 정리

use crate::position_sizing::validate_finite;
use crate::tiers::{vix_tier, VixExitTier, VixRegime};
use breadth_core::{BreadthError, CoreResult, HolidayCalendar};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::{Validate, ValidationError};

/// 가격 입력 상한 (1조).
pub const MAX_PRICE: Decimal = dec!(1000000000000);

/// 손절 비율 하한. 손절가는 0 아래로 내려가지 않습니다.
const MIN_STOP_PERCENT: Decimal = dec!(-100);

/// T2108이 이 값 미만이면 손절을 좁힘.
const WEAK_BREADTH_T2108: f64 = 20.0;
/// T2108이 이 값 초과이면 손절을 넓힘.
const STRONG_BREADTH_T2108: f64 = 60.0;

fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("price_not_positive")
            .with_message("must be greater than 0".into()));
    }
    if *value > MAX_PRICE {
        return Err(ValidationError::new("price_too_large")
            .with_message(format!("must be at most {}", MAX_PRICE).into()));
    }
    Ok(())
}

/// 청산 계획 보정 입력.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitAdjustments {
    /// 진입일 true range (가격 단위)
    #[serde(default)]
    pub true_range: Option<Decimal>,
    /// 진입 시점 T2108
    #[serde(default)]
    pub t2108: Option<f64>,
}

impl ExitAdjustments {
    pub fn with_true_range(mut self, true_range: Decimal) -> Self {
        self.true_range = Some(true_range);
        self
    }

    pub fn with_t2108(mut self, t2108: f64) -> Self {
        self.t2108 = Some(t2108);
        self
    }
}

#[derive(Debug, Validate)]
struct ExitRequest {
    #[validate(custom(function = "validate_price"))]
    entry_price: Decimal,
    #[validate(custom(function = "validate_price"))]
    true_range: Option<Decimal>,
    #[validate(
        range(min = 0.0, max = 100.0, message = "must be between 0 and 100"),
        custom(function = "validate_finite")
    )]
    t2108: Option<f64>,
}

/// 손절 거리를 정한 기준.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBasis {
    Percent,
    TrueRange,
}

/// 분할 청산 트리거.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitTrigger {
    ProfitTarget1,
    ProfitTarget2,
    TimeExit,
}

/// 분할 청산 단계.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleOutStep {
    pub trigger: ExitTrigger,
    /// 목표가 (시간 청산은 None)
    pub price: Option<Decimal>,
    /// 이 단계에서 청산하는 포지션 비율 (%)
    pub close_percent: Decimal,
    /// 이 단계까지 누적 청산 비율 (%)
    pub cumulative_percent: Decimal,
}

/// 청산 계획.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitPlan {
    pub entry_date: NaiveDate,
    pub entry_price: Decimal,
    /// 항상 거래일
    pub exit_date: NaiveDate,
    pub stop_loss: Decimal,
    /// 진입가 대비 최종 손절 비율 (음수)
    pub stop_loss_percent: Decimal,
    pub stop_basis: StopBasis,
    pub profit_target_1: Decimal,
    pub profit_target_2: Decimal,
    pub scale_out: Vec<ScaleOutStep>,
    pub regime: VixRegime,
    pub max_hold_days: u32,
}

/// 진입가에 비율(%)을 적용.
fn apply_pct(price: Decimal, pct: Decimal) -> Decimal {
    price * (Decimal::ONE + pct / Decimal::ONE_HUNDRED)
}

/// 손절 비율과 기준.
fn stop_percent(
    entry_price: Decimal,
    tier: &VixExitTier,
    adjustments: &ExitAdjustments,
) -> (Decimal, StopBasis) {
    let mut pct = tier.stop_loss_percent;
    let mut basis = StopBasis::Percent;

    if let Some(tr) = adjustments.true_range {
        let tr_pct = tr
            .checked_mul(tier.stop_true_range_multiplier)
            .and_then(|distance| distance.checked_div(entry_price))
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(MIN_STOP_PERCENT, |p| -p);
        if tr_pct < pct {
            pct = tr_pct;
            basis = StopBasis::TrueRange;
        }
    }

    pct = pct.max(MIN_STOP_PERCENT);
    match adjustments.t2108 {
        Some(t) if t < WEAK_BREADTH_T2108 => pct *= dec!(0.8),
        Some(t) if t > STRONG_BREADTH_T2108 => pct *= dec!(1.2),
        _ => {}
    }
    (pct.max(MIN_STOP_PERCENT), basis)
}

/// 비율 목표와 true range 목표 중 더 먼 쪽.
fn profit_target(
    entry_price: Decimal,
    pct: Decimal,
    tr_multiplier: Decimal,
    true_range: Option<Decimal>,
) -> Decimal {
    let by_pct = apply_pct(entry_price, pct);
    true_range
        .and_then(|tr| tr.checked_mul(tr_multiplier))
        .and_then(|distance| entry_price.checked_add(distance))
        .map_or(by_pct, |by_tr| by_tr.max(by_pct))
}

fn scale_out_steps(tier: &VixExitTier, targets: [Decimal; 2]) -> Vec<ScaleOutStep> {
    let [first, second] = tier.scale_out_percent;
    vec![
        ScaleOutStep {
            trigger: ExitTrigger::ProfitTarget1,
            price: Some(targets[0]),
            close_percent: first,
            cumulative_percent: first,
        },
        ScaleOutStep {
            trigger: ExitTrigger::ProfitTarget2,
            price: Some(targets[1]),
            close_percent: second - first,
            cumulative_percent: second,
        },
        ScaleOutStep {
            trigger: ExitTrigger::TimeExit,
            price: None,
            close_percent: Decimal::ONE_HUNDRED - second,
            cumulative_percent: Decimal::ONE_HUNDRED,
        },
    ]
}

/// 휴장일을 고려한 청산 스케줄러.
#[derive(Debug, Clone)]
pub struct ExitScheduler {
    calendar: HolidayCalendar,
}

impl ExitScheduler {
    /// 주어진 캘린더로 스케줄러를 생성.
    pub fn new(calendar: HolidayCalendar) -> Self {
        Self { calendar }
    }

    /// 미국 주식시장 캘린더로 스케줄러를 생성.
    pub fn us_equities(first_year: i32, last_year: i32) -> Self {
        Self::new(HolidayCalendar::us_equities(first_year, last_year))
    }

    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    /// `from`에서 거래일 `days`일 뒤의 날짜.
    ///
    /// 조기 폐장일은 온전한 거래일로 셉니다. 캘린더 범위를 벗어나면 설정 에러입니다.
    pub fn advance_trading_days(&self, from: NaiveDate, days: u32) -> CoreResult<NaiveDate> {
        if !self.calendar.covers(from) {
            return Err(self.out_of_coverage(from));
        }
        let mut date = from;
        for _ in 0..days {
            date = self
                .calendar
                .next_trading_day(date)
                .ok_or_else(|| self.out_of_coverage(date))?;
        }
        Ok(date)
    }

    /// 청산 계획을 계산합니다.
    ///
    /// VIX 구간은 한 번만 조회하여 날짜와 가격 계산에 함께 사용합니다.
    pub fn compute_exit_plan(
        &self,
        entry_date: NaiveDate,
        entry_price: Decimal,
        vix: f64,
    ) -> CoreResult<ExitPlan> {
        self.compute_exit_plan_with(entry_date, entry_price, vix, ExitAdjustments::default())
    }

    /// true range / T2108 보정을 적용한 청산 계획.
    pub fn compute_exit_plan_with(
        &self,
        entry_date: NaiveDate,
        entry_price: Decimal,
        vix: f64,
        adjustments: ExitAdjustments,
    ) -> CoreResult<ExitPlan> {
        ExitRequest {
            entry_price,
            true_range: adjustments.true_range,
            t2108: adjustments.t2108,
        }
        .validate()?;
        let tier = vix_tier(vix)?;
        self.plan_for_tier(entry_date, entry_price, tier, &adjustments)
    }

    fn plan_for_tier(
        &self,
        entry_date: NaiveDate,
        entry_price: Decimal,
        tier: &VixExitTier,
        adjustments: &ExitAdjustments,
    ) -> CoreResult<ExitPlan> {
        let exit_date = self.advance_trading_days(entry_date, tier.max_hold_days)?;
        let (stop_loss_percent, stop_basis) = stop_percent(entry_price, tier, adjustments);
        let targets = [
            profit_target(
                entry_price,
                tier.profit_target_1_percent,
                tier.target_true_range_multipliers[0],
                adjustments.true_range,
            ),
            profit_target(
                entry_price,
                tier.profit_target_2_percent,
                tier.target_true_range_multipliers[1],
                adjustments.true_range,
            ),
        ];

        debug!(
            %entry_date,
            %exit_date,
            regime = %tier.regime,
            max_hold_days = tier.max_hold_days,
            %stop_loss_percent,
            ?stop_basis,
            "Exit plan computed"
        );

        Ok(ExitPlan {
            entry_date,
            entry_price,
            exit_date,
            stop_loss: apply_pct(entry_price, stop_loss_percent),
            stop_loss_percent,
            stop_basis,
            profit_target_1: targets[0],
            profit_target_2: targets[1],
            scale_out: scale_out_steps(tier, targets),
            regime: tier.regime,
            max_hold_days: tier.max_hold_days,
        })
    }

    fn out_of_coverage(&self, date: NaiveDate) -> BreadthError {
        let (first, last) = self.calendar.coverage();
        BreadthError::config(format!(
            "holiday calendar covers {}..={} but {} falls outside it",
            first, last, date
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breadth_core::Holiday;
    use chrono::NaiveTime;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_apply_pct() {
        assert_eq!(apply_pct(dec!(100), dec!(-4)), dec!(96));
        assert_eq!(apply_pct(dec!(50), dec!(10)), dec!(55));
    }

    #[test]
    fn test_exit_skips_weekend() {
        let scheduler = ExitScheduler::us_equities(2025, 2025);
        // 2025-03-06 목요일 + 3거래일 (ultra_low) → 금, 월, 화
        let plan = scheduler
            .compute_exit_plan(d(2025, 3, 6), dec!(100), 11.0)
            .unwrap();

        assert_eq!(plan.regime, VixRegime::UltraLow);
        assert_eq!(plan.exit_date, d(2025, 3, 11));
        assert_eq!(plan.stop_loss, dec!(96));
        assert_eq!(plan.profit_target_1, dec!(104));
        assert_eq!(plan.profit_target_2, dec!(107));
    }

    #[test]
    fn test_exit_skips_thanksgiving_counts_early_close() {
        let scheduler = ExitScheduler::us_equities(2025, 2025);
        // 2025-11-25 화요일 + 4거래일 (low) → 수, 금(조기폐장), 월, 화
        let plan = scheduler
            .compute_exit_plan(d(2025, 11, 25), dec!(200), 14.0)
            .unwrap();
        assert_eq!(plan.exit_date, d(2025, 12, 2));
    }

    #[test]
    fn test_outside_coverage_is_configuration_error() {
        let scheduler = ExitScheduler::us_equities(2025, 2025);
        let err = scheduler
            .compute_exit_plan(d(2024, 6, 3), dec!(100), 18.0)
            .unwrap_err();
        assert!(err.is_fatal());

        let err = scheduler
            .compute_exit_plan(d(2025, 12, 29), dec!(100), 45.0)
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_price_and_vix() {
        let scheduler = ExitScheduler::us_equities(2025, 2025);
        let err = scheduler
            .compute_exit_plan(d(2025, 3, 6), Decimal::ZERO, 18.0)
            .unwrap_err();
        assert!(err.is_recoverable());

        let err = scheduler
            .compute_exit_plan(d(2025, 3, 6), dec!(100), -3.0)
            .unwrap_err();
        assert_eq!(err.field_errors()[0].field, "vix");
    }

    #[test]
    fn test_static_holiday_rows_extend_the_hold() {
        // 2025-03-10(월)을 임의 휴장일로 둔 정적 캘린더
        let calendar = HolidayCalendar::new(
            2025,
            2025,
            vec![
                Holiday::closed(d(2025, 3, 10), "Exchange outage"),
                Holiday::early_close(
                    d(2025, 3, 7),
                    NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
                    "Half day",
                ),
            ],
        );
        let scheduler = ExitScheduler::new(calendar);
        // 목 → 금(조기폐장), 월 휴장, 화, 수
        let plan = scheduler
            .compute_exit_plan(d(2025, 3, 6), dec!(100), 11.0)
            .unwrap();
        assert_eq!(plan.exit_date, d(2025, 3, 12));
        assert!(scheduler.calendar().is_trading_day(plan.exit_date));
    }

    #[test]
    fn test_true_range_widens_stop_and_targets() {
        let scheduler = ExitScheduler::us_equities(2025, 2025);
        let adjustments = ExitAdjustments::default().with_true_range(dec!(5));
        // normal: -6% vs -(5 × 1.8)% → -9%
        let plan = scheduler
            .compute_exit_plan_with(d(2025, 3, 6), dec!(100), 18.0, adjustments)
            .unwrap();

        assert_eq!(plan.stop_basis, StopBasis::TrueRange);
        assert_eq!(plan.stop_loss_percent, dec!(-9));
        assert_eq!(plan.stop_loss, dec!(91));
        assert_eq!(plan.profit_target_1, dec!(110));
        assert_eq!(plan.profit_target_2, dec!(117.5));

        // 좁은 true range는 비율 손절을 유지
        let narrow = ExitAdjustments::default().with_true_range(dec!(0.5));
        let plan = scheduler
            .compute_exit_plan_with(d(2025, 3, 6), dec!(100), 18.0, narrow)
            .unwrap();
        assert_eq!(plan.stop_basis, StopBasis::Percent);
        assert_eq!(plan.stop_loss, dec!(94));
        assert_eq!(plan.profit_target_1, dec!(106));
    }

    #[test]
    fn test_breadth_adjusts_stop_distance() {
        let scheduler = ExitScheduler::us_equities(2025, 2025);
        let weak = scheduler
            .compute_exit_plan_with(
                d(2025, 3, 6),
                dec!(100),
                11.0,
                ExitAdjustments::default().with_t2108(15.0),
            )
            .unwrap();
        assert_eq!(weak.stop_loss_percent, dec!(-3.2));
        assert_eq!(weak.stop_loss, dec!(96.8));

        let strong = scheduler
            .compute_exit_plan_with(
                d(2025, 3, 6),
                dec!(100),
                18.0,
                ExitAdjustments::default()
                    .with_true_range(dec!(5))
                    .with_t2108(70.0),
            )
            .unwrap();
        assert_eq!(strong.stop_loss_percent, dec!(-10.8));

        let neutral = scheduler
            .compute_exit_plan_with(
                d(2025, 3, 6),
                dec!(100),
                18.0,
                ExitAdjustments::default().with_t2108(40.0),
            )
            .unwrap();
        assert_eq!(neutral.stop_loss_percent, dec!(-6));
    }

    #[test]
    fn test_scale_out_fractions_by_regime() {
        let scheduler = ExitScheduler::us_equities(2025, 2025);
        let low = scheduler
            .compute_exit_plan(d(2025, 3, 6), dec!(100), 11.0)
            .unwrap();
        let closes: Vec<Decimal> = low.scale_out.iter().map(|s| s.close_percent).collect();
        assert_eq!(closes, vec![dec!(30), dec!(30), dec!(40)]);
        assert_eq!(low.scale_out[0].price, Some(low.profit_target_1));
        assert_eq!(low.scale_out[2].trigger, ExitTrigger::TimeExit);
        assert!(low.scale_out[2].price.is_none());

        let high = scheduler
            .compute_exit_plan(d(2025, 3, 6), dec!(100), 28.0)
            .unwrap();
        let closes: Vec<Decimal> = high.scale_out.iter().map(|s| s.close_percent).collect();
        assert_eq!(closes, vec![dec!(25), dec!(25), dec!(50)]);
        assert_eq!(high.scale_out[2].cumulative_percent, dec!(100));
    }

    #[test]
    fn test_extreme_true_range_keeps_stop_non_negative() {
        let scheduler = ExitScheduler::us_equities(2025, 2025);
        let plan = scheduler
            .compute_exit_plan_with(
                d(2025, 3, 6),
                dec!(0.0001),
                45.0,
                ExitAdjustments::default()
                    .with_true_range(MAX_PRICE)
                    .with_t2108(80.0),
            )
            .unwrap();
        assert_eq!(plan.stop_loss_percent, dec!(-100));
        assert_eq!(plan.stop_loss, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_adjustments_are_reported_together() {
        let scheduler = ExitScheduler::us_equities(2025, 2025);
        let err = scheduler
            .compute_exit_plan_with(
                d(2025, 3, 6),
                Decimal::ZERO,
                18.0,
                ExitAdjustments {
                    true_range: Some(dec!(-1)),
                    t2108: Some(130.0),
                },
            )
            .unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["entry_price", "t2108", "true_range"]);
    }
}
