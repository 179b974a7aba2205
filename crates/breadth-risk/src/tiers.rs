//! BIDBACK 규칙 테이블.
//!
//! breadth 구간과 VIX 구간을 범위+값 레코드의 순서 있는 배열로 표현합니다.
//! 조회는 항상 첫 번째 일치 행을 반환합니다.

use breadth_core::ValidationError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// breadth 구간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreadthTier {
    /// T2108 < 20 이고 up4 > 1000 (다른 구간보다 우선)
    BigOpportunity,
    /// up4 < 100
    NoEntry,
    Weak,
    Moderate,
    Normal,
    /// up4 > 500 이고 T2108 < 40
    Strong,
    /// up4 > 500 이고 T2108 ≥ 40
    Extended,
}

impl BreadthTier {
    /// snake_case 식별자.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BigOpportunity => "big_opportunity",
            Self::NoEntry => "no_entry",
            Self::Weak => "weak",
            Self::Moderate => "moderate",
            Self::Normal => "normal",
            Self::Strong => "strong",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for BreadthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// breadth 규칙 행.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreadthRule {
    pub tier: BreadthTier,
    /// up4 포함 하한
    pub up4_min: u32,
    /// up4 포함 상한 (None이면 무제한)
    pub up4_max: Option<u32>,
    /// T2108 엄격 상한 (None이면 조건 없음)
    pub t2108_below: Option<f64>,
    pub multiplier: Decimal,
}

impl BreadthRule {
    /// 입력이 이 행에 해당하는지.
    pub fn matches(&self, up4: u32, t2108: f64) -> bool {
        up4 >= self.up4_min
            && self.up4_max.map_or(true, |max| up4 <= max)
            && self.t2108_below.map_or(true, |below| t2108 < below)
    }
}

/// breadth 규칙 테이블 (첫 번째 일치 우선).
pub const BREADTH_RULES: [BreadthRule; 7] = [
    BreadthRule {
        tier: BreadthTier::BigOpportunity,
        up4_min: 1001,
        up4_max: None,
        t2108_below: Some(20.0),
        multiplier: dec!(2.0),
    },
    BreadthRule {
        tier: BreadthTier::NoEntry,
        up4_min: 0,
        up4_max: Some(99),
        t2108_below: None,
        multiplier: dec!(0.0),
    },
    BreadthRule {
        tier: BreadthTier::Weak,
        up4_min: 100,
        up4_max: Some(149),
        t2108_below: None,
        multiplier: dec!(0.3),
    },
    BreadthRule {
        tier: BreadthTier::Moderate,
        up4_min: 150,
        up4_max: Some(199),
        t2108_below: None,
        multiplier: dec!(0.5),
    },
    BreadthRule {
        tier: BreadthTier::Normal,
        up4_min: 200,
        up4_max: Some(500),
        t2108_below: None,
        multiplier: dec!(1.0),
    },
    BreadthRule {
        tier: BreadthTier::Strong,
        up4_min: 501,
        up4_max: None,
        t2108_below: Some(40.0),
        multiplier: dec!(1.5),
    },
    BreadthRule {
        tier: BreadthTier::Extended,
        up4_min: 501,
        up4_max: None,
        t2108_below: None,
        multiplier: dec!(1.0),
    },
];

/// breadth 규칙 조회.
///
/// 마지막 행(Extended)은 up4 > 500 전체를 덮고, 앞의 행들이 0..=500을 덮으므로
/// 모든 `u32` 값이 정확히 하나의 행에 도달합니다.
pub fn breadth_rule(up4: u32, t2108: f64) -> &'static BreadthRule {
    BREADTH_RULES
        .iter()
        .find(|rule| rule.matches(up4, t2108))
        .unwrap_or(&BREADTH_RULES[BREADTH_RULES.len() - 1])
}

/// VIX 국면.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VixRegime {
    UltraLow,
    Low,
    Normal,
    Elevated,
    High,
    VeryHigh,
    Extreme,
}

impl VixRegime {
    /// snake_case 식별자.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UltraLow => "ultra_low",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::High => "high",
            Self::VeryHigh => "very_high",
            Self::Extreme => "extreme",
        }
    }
}

impl fmt::Display for VixRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// VIX 구간 행.
///
/// 구간은 (lower, upper] 형태입니다. 첫 행의 하한과 마지막 행의 상한은 열려 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VixExitTier {
    pub regime: VixRegime,
    /// 배타적 하한 (None이면 -∞)
    pub lower_exclusive: Option<f64>,
    /// 포함 상한 (None이면 +∞)
    pub upper_inclusive: Option<f64>,
    pub size_multiplier: Decimal,
    /// 진입가 대비 손절 비율 (음수)
    pub stop_loss_percent: Decimal,
    pub profit_target_1_percent: Decimal,
    pub profit_target_2_percent: Decimal,
    /// 최대 보유 거래일 수
    pub max_hold_days: u32,
    /// 손절 거리로 쓰는 true range 배수
    pub stop_true_range_multiplier: Decimal,
    /// 1차/2차 익절 목표의 true range 배수
    pub target_true_range_multipliers: [Decimal; 2],
    /// 1차/2차 목표에서 누적 청산하는 포지션 비율 (%). 나머지는 청산일에 정리
    pub scale_out_percent: [Decimal; 2],
}

impl VixExitTier {
    /// VIX 값이 이 구간에 속하는지.
    pub fn contains(&self, vix: f64) -> bool {
        self.lower_exclusive.map_or(true, |lo| vix > lo)
            && self.upper_inclusive.map_or(true, |hi| vix <= hi)
    }
}

/// VIX 청산 테이블 (오름차순, 연속).
pub const VIX_EXIT_TIERS: [VixExitTier; 7] = [
    VixExitTier {
        regime: VixRegime::UltraLow,
        lower_exclusive: None,
        upper_inclusive: Some(12.0),
        size_multiplier: dec!(0.8),
        stop_loss_percent: dec!(-4),
        profit_target_1_percent: dec!(4),
        profit_target_2_percent: dec!(7),
        max_hold_days: 3,
        stop_true_range_multiplier: dec!(1.2),
        target_true_range_multipliers: [dec!(1.8), dec!(3.0)],
        scale_out_percent: [dec!(30), dec!(60)],
    },
    VixExitTier {
        regime: VixRegime::Low,
        lower_exclusive: Some(12.0),
        upper_inclusive: Some(15.0),
        size_multiplier: dec!(0.9),
        stop_loss_percent: dec!(-5),
        profit_target_1_percent: dec!(5),
        profit_target_2_percent: dec!(8),
        max_hold_days: 4,
        stop_true_range_multiplier: dec!(1.2),
        target_true_range_multipliers: [dec!(1.8), dec!(3.0)],
        scale_out_percent: [dec!(30), dec!(60)],
    },
    VixExitTier {
        regime: VixRegime::Normal,
        lower_exclusive: Some(15.0),
        upper_inclusive: Some(20.0),
        size_multiplier: dec!(1.0),
        stop_loss_percent: dec!(-6),
        profit_target_1_percent: dec!(6),
        profit_target_2_percent: dec!(10),
        max_hold_days: 5,
        stop_true_range_multiplier: dec!(1.8),
        target_true_range_multipliers: [dec!(2.0), dec!(3.5)],
        scale_out_percent: [dec!(25), dec!(50)],
    },
    VixExitTier {
        regime: VixRegime::Elevated,
        lower_exclusive: Some(20.0),
        upper_inclusive: Some(25.0),
        size_multiplier: dec!(1.1),
        stop_loss_percent: dec!(-7),
        profit_target_1_percent: dec!(7),
        profit_target_2_percent: dec!(12),
        max_hold_days: 5,
        stop_true_range_multiplier: dec!(1.8),
        target_true_range_multipliers: [dec!(2.0), dec!(3.5)],
        scale_out_percent: [dec!(25), dec!(50)],
    },
    VixExitTier {
        regime: VixRegime::High,
        lower_exclusive: Some(25.0),
        upper_inclusive: Some(30.0),
        size_multiplier: dec!(1.2),
        stop_loss_percent: dec!(-8),
        profit_target_1_percent: dec!(9),
        profit_target_2_percent: dec!(15),
        max_hold_days: 6,
        stop_true_range_multiplier: dec!(1.8),
        target_true_range_multipliers: [dec!(2.0), dec!(3.5)],
        scale_out_percent: [dec!(25), dec!(50)],
    },
    VixExitTier {
        regime: VixRegime::VeryHigh,
        lower_exclusive: Some(30.0),
        upper_inclusive: Some(40.0),
        size_multiplier: dec!(1.3),
        stop_loss_percent: dec!(-10),
        profit_target_1_percent: dec!(12),
        profit_target_2_percent: dec!(20),
        max_hold_days: 7,
        stop_true_range_multiplier: dec!(2.0),
        target_true_range_multipliers: [dec!(2.5), dec!(4.0)],
        scale_out_percent: [dec!(25), dec!(50)],
    },
    VixExitTier {
        regime: VixRegime::Extreme,
        lower_exclusive: Some(40.0),
        upper_inclusive: None,
        size_multiplier: dec!(1.4),
        stop_loss_percent: dec!(-12),
        profit_target_1_percent: dec!(15),
        profit_target_2_percent: dec!(25),
        max_hold_days: 10,
        stop_true_range_multiplier: dec!(2.5),
        target_true_range_multipliers: [dec!(3.0), dec!(5.0)],
        scale_out_percent: [dec!(25), dec!(50)],
    },
];

/// VIX 구간 조회.
///
/// 음수 또는 유한하지 않은 VIX는 어느 구간에도 넣지 않고 검증 에러로 거부합니다.
pub fn vix_tier(vix: f64) -> Result<&'static VixExitTier, ValidationError> {
    if !vix.is_finite() || vix < 0.0 {
        return Err(ValidationError::single(
            "vix",
            format!("must be a non-negative finite number, got {}", vix),
        ));
    }
    VIX_EXIT_TIERS
        .iter()
        .find(|tier| tier.contains(vix))
        .ok_or_else(|| ValidationError::single("vix", format!("no exit tier for {}", vix)))
}
