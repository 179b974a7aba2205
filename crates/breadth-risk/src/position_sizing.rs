//! BIDBACK 포지션 사이징.
//!
//! 제공 기능:
//! - breadth 구간/VIX 구간 배수를 적용한 포지션 금액 계산
//! - Big Opportunity, Avoid Entry 플래그
//! - 악화 점수 (참고용 지표)
//! - 포트폴리오 절대 상한 적용

use crate::config::{BidbackConfig, ABSOLUTE_MAX_PORTFOLIO_FRACTION};
use crate::tiers::{breadth_rule, vix_tier, BreadthTier, VixRegime};
use breadth_core::CoreResult;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::{Validate, ValidationError};

/// 이 값 미만의 up4는 약한 breadth로 간주 (진입 회피, 악화 +2).
const WEAK_BREADTH_UP4: u32 = 150;

/// 포트폴리오 총액 상한 (1000조). 배수를 곱해도 Decimal 범위를 넘지 않습니다.
pub const MAX_PORTFOLIO_SIZE: Decimal = dec!(1000000000000000);

// ==================== 커스텀 검증 함수 ====================

pub(crate) fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("not_finite").with_message("must be a finite number".into()))
    }
}

/// 포트폴리오 총액 검증 (0 초과, 1000조 이하)
fn validate_portfolio_size(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("portfolio_size_not_positive")
            .with_message("must be greater than 0".into()));
    }
    if *value > MAX_PORTFOLIO_SIZE {
        return Err(ValidationError::new("portfolio_size_too_large")
            .with_message(format!("must be at most {}", MAX_PORTFOLIO_SIZE).into()));
    }
    Ok(())
}

/// 기본 포지션 비율 검증 (0, 1]
fn validate_base_size_percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO || *value > Decimal::ONE {
        return Err(ValidationError::new("base_size_percentage_out_of_range")
            .with_message("must be in (0, 1]".into()));
    }
    Ok(())
}

/// 사이징 한 번의 입력 전체에 대한 검증 규칙.
#[derive(Debug, Validate)]
struct SizingRequest {
    #[validate(range(max = 10000, message = "must be at most 10000"))]
    up4: u32,
    #[validate(range(max = 10000, message = "must be at most 10000"))]
    down4: u32,
    #[validate(
        range(min = 0.0, max = 100.0, message = "must be between 0 and 100"),
        custom(function = "validate_finite")
    )]
    t2108: f64,
    #[validate(
        range(min = 0.0, message = "must be a non-negative finite number"),
        custom(function = "validate_finite")
    )]
    vix: f64,
    #[validate(custom(function = "validate_portfolio_size"))]
    portfolio_size: Decimal,
    #[validate(custom(function = "validate_base_size_percentage"))]
    base_size_percentage: Decimal,
}

/// 사이징에 쓰이는 breadth 입력.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreadthInputs {
    /// 당일 4% 이상 상승 종목 수
    pub up4: u32,
    /// 당일 4% 이상 하락 종목 수
    #[serde(default)]
    pub down4: u32,
    /// T2108 (0~100)
    pub t2108: f64,
}

impl BreadthInputs {
    pub fn new(up4: u32, down4: u32, t2108: f64) -> Self {
        Self { up4, down4, t2108 }
    }
}

/// 포트폴리오 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioParams {
    /// 포트폴리오 총액
    pub portfolio_size: Decimal,
    /// 기본 포지션 비율 (없으면 설정값 사용)
    #[serde(default)]
    pub base_size_percentage: Option<Decimal>,
}

impl PortfolioParams {
    pub fn new(portfolio_size: Decimal) -> Self {
        Self {
            portfolio_size,
            base_size_percentage: None,
        }
    }

    /// 기본 포지션 비율을 재정의합니다.
    pub fn with_base_size_percentage(mut self, pct: Decimal) -> Self {
        self.base_size_percentage = Some(pct);
        self
    }
}

/// 포지션 사이징 결정.
///
/// 매 호출마다 현재 입력에서 새로 계산되며 영속 식별자가 없습니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSizingDecision {
    /// 포트폴리오 × 기본 비율
    pub base_amount: Decimal,
    pub breadth_tier: BreadthTier,
    pub breadth_multiplier: Decimal,
    pub vix_regime: VixRegime,
    pub vix_multiplier: Decimal,
    pub big_opportunity: bool,
    /// 참고용 플래그, 배수를 0으로 만들지 않음
    pub avoid_entry: bool,
    /// 악화 점수 (0~4)
    pub deterioration_score: u8,
    /// 상한 적용 전 금액
    pub raw_amount: Decimal,
    /// 포트폴리오 × 최대 비율
    pub cap_amount: Decimal,
    pub final_amount: Decimal,
    pub capped: bool,
    /// 최종 금액의 포트폴리오 대비 비율 (%)
    pub portfolio_percent: Decimal,
}

/// BIDBACK 포지션 계산기.
#[derive(Debug, Clone, Default)]
pub struct PositionRiskCalculator {
    config: BidbackConfig,
}

impl PositionRiskCalculator {
    /// 주어진 설정으로 새 계산기를 생성.
    pub fn new(config: BidbackConfig) -> Self {
        Self { config }
    }

    /// 현재 설정.
    pub fn config(&self) -> &BidbackConfig {
        &self.config
    }

    /// 진입 회피 여부.
    pub fn avoid_entry(&self, inputs: &BreadthInputs) -> bool {
        inputs.up4 < WEAK_BREADTH_UP4 || inputs.t2108 > self.config.avoid_entry_t2108
    }

    /// 악화 점수.
    pub fn deterioration_score(&self, inputs: &BreadthInputs) -> u8 {
        let mut score = 0;
        if inputs.t2108 > self.config.deterioration_t2108 {
            score += 1;
        }
        if inputs.down4 > inputs.up4 {
            score += 1;
        }
        if inputs.up4 < WEAK_BREADTH_UP4 {
            score += 2;
        }
        score
    }

    /// 포지션 크기를 계산합니다.
    ///
    /// # 인자
    /// * `inputs` - up4/down4/T2108
    /// * `vix` - VIX 값 (0 이상)
    /// * `params` - 포트폴리오 총액과 선택적 기본 비율
    ///
    /// # 에러
    /// 범위를 벗어난 입력은 위반된 모든 필드를 담은 검증 에러를 반환합니다.
    pub fn compute(
        &self,
        inputs: BreadthInputs,
        vix: f64,
        params: PortfolioParams,
    ) -> CoreResult<PositionSizingDecision> {
        let base_pct = params
            .base_size_percentage
            .unwrap_or(self.config.base_size_percentage);
        SizingRequest {
            up4: inputs.up4,
            down4: inputs.down4,
            t2108: inputs.t2108,
            vix,
            portfolio_size: params.portfolio_size,
            base_size_percentage: base_pct,
        }
        .validate()?;

        let rule = breadth_rule(inputs.up4, inputs.t2108);
        let tier = vix_tier(vix)?;

        let portfolio = params.portfolio_size;
        let base_amount = portfolio * base_pct;
        let raw_amount = base_amount * rule.multiplier * tier.size_multiplier;
        let cap_amount = portfolio * self.cap_fraction();
        let capped = raw_amount > cap_amount;
        let final_amount = raw_amount.min(cap_amount);
        let portfolio_percent = (final_amount / portfolio * Decimal::ONE_HUNDRED).round_dp(4);

        debug!(
            up4 = inputs.up4,
            t2108 = inputs.t2108,
            vix,
            breadth_tier = %rule.tier,
            vix_regime = %tier.regime,
            %final_amount,
            capped,
            "Position sizing computed"
        );

        Ok(PositionSizingDecision {
            base_amount,
            breadth_tier: rule.tier,
            breadth_multiplier: rule.multiplier,
            vix_regime: tier.regime,
            vix_multiplier: tier.size_multiplier,
            big_opportunity: rule.tier == BreadthTier::BigOpportunity,
            avoid_entry: self.avoid_entry(&inputs),
            deterioration_score: self.deterioration_score(&inputs),
            raw_amount,
            cap_amount,
            final_amount,
            capped,
            portfolio_percent,
        })
    }

    /// 적용되는 상한 비율. 설정이 절대 상한보다 크면 절대 상한을 씁니다.
    pub fn cap_fraction(&self) -> Decimal {
        self.config
            .max_portfolio_fraction
            .clamp(Decimal::ZERO, ABSOLUTE_MAX_PORTFOLIO_FRACTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn calculator() -> PositionRiskCalculator {
        PositionRiskCalculator::default()
    }

    #[test]
    fn test_no_entry_zeroes_amount() {
        let decision = calculator()
            .compute(
                BreadthInputs::new(80, 300, 85.0),
                45.0,
                PortfolioParams::new(dec!(100000)),
            )
            .unwrap();

        assert_eq!(decision.breadth_multiplier, Decimal::ZERO);
        assert_eq!(decision.final_amount, Decimal::ZERO);
        assert!(!decision.capped);
        assert!(decision.avoid_entry);
        assert_eq!(decision.deterioration_score, 4);
    }

    #[test]
    fn test_avoid_entry_does_not_zero_multiplier() {
        let decision = calculator()
            .compute(
                BreadthInputs::new(300, 100, 75.0),
                18.0,
                PortfolioParams::new(dec!(100000)),
            )
            .unwrap();

        assert!(decision.avoid_entry);
        assert_eq!(decision.breadth_multiplier, dec!(1.0));
        assert!(decision.final_amount > Decimal::ZERO);
        assert_eq!(decision.deterioration_score, 1);
    }

    #[test]
    fn test_base_size_override() {
        let params = PortfolioParams::new(dec!(100000)).with_base_size_percentage(dec!(0.10));
        let decision = calculator()
            .compute(BreadthInputs::new(300, 100, 50.0), 18.0, params)
            .unwrap();

        assert_eq!(decision.base_amount, dec!(10000));
        assert_eq!(decision.portfolio_percent, dec!(10));
    }

    #[test]
    fn test_validation_collects_all_fields() {
        let err = calculator()
            .compute(
                BreadthInputs::new(20_000, 0, 120.0),
                -1.0,
                PortfolioParams::new(Decimal::ZERO),
            )
            .unwrap_err();

        let fields: Vec<&str> = err.field_errors().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["portfolio_size", "t2108", "up4", "vix"]);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_conservative_cap() {
        let calc = PositionRiskCalculator::new(BidbackConfig::conservative());
        let decision = calc
            .compute(
                BreadthInputs::new(1500, 10, 10.0),
                45.0,
                PortfolioParams::new(dec!(100000)),
            )
            .unwrap();

        assert!(decision.capped);
        assert_eq!(decision.final_amount, dec!(20000));
    }

    #[test]
    fn test_cap_holds_when_config_exceeds_absolute_limit() {
        let calc = PositionRiskCalculator::new(BidbackConfig {
            max_portfolio_fraction: dec!(0.60),
            ..Default::default()
        });
        let decision = calc
            .compute(
                BreadthInputs::new(2000, 0, 5.0),
                50.0,
                PortfolioParams::new(dec!(50000)),
            )
            .unwrap();

        assert_eq!(calc.cap_fraction(), dec!(0.30));
        assert_eq!(decision.cap_amount, dec!(15000));
        assert!(decision.final_amount <= dec!(15000));
        assert!(decision.capped);
    }

    #[test]
    fn test_huge_portfolio_is_rejected_not_overflowed() {
        let params = PortfolioParams::new(Decimal::MAX).with_base_size_percentage(Decimal::ONE);
        let err = calculator()
            .compute(BreadthInputs::new(1200, 0, 10.0), 50.0, params)
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.field_errors()[0].field, "portfolio_size");

        let at_limit = PortfolioParams::new(MAX_PORTFOLIO_SIZE).with_base_size_percentage(Decimal::ONE);
        assert!(calculator()
            .compute(BreadthInputs::new(1200, 0, 10.0), 50.0, at_limit)
            .is_ok());
    }
}
