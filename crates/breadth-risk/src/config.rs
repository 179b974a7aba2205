//! BIDBACK 사이징 설정.
//!
//! 기본 포지션 비율, 포트폴리오 상한, 진입 회피/악화 판단 임계값을 정의합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// 포트폴리오 대비 절대 상한. 설정으로 낮출 수는 있지만 올릴 수는 없습니다.
pub const ABSOLUTE_MAX_PORTFOLIO_FRACTION: Decimal = dec!(0.30);

/// BIDBACK 사이징 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidbackConfig {
    /// 포트폴리오 대비 기본 포지션 비율 (기본값: 0.15)
    #[serde(default = "default_base_size_percentage")]
    pub base_size_percentage: Decimal,

    /// 포트폴리오 대비 최대 포지션 비율 (기본값: 0.30, 0.30 초과 불가)
    #[serde(default = "default_max_portfolio_fraction")]
    pub max_portfolio_fraction: Decimal,

    /// 이 값을 초과하는 T2108이면 진입 회피 (기본값: 70)
    #[serde(default = "default_avoid_entry_t2108")]
    pub avoid_entry_t2108: f64,

    /// 이 값을 초과하는 T2108이면 악화 점수 +1 (기본값: 65)
    #[serde(default = "default_deterioration_t2108")]
    pub deterioration_t2108: f64,
}

// 기본값 함수들
fn default_base_size_percentage() -> Decimal {
    dec!(0.15)
}

fn default_max_portfolio_fraction() -> Decimal {
    ABSOLUTE_MAX_PORTFOLIO_FRACTION
}

fn default_avoid_entry_t2108() -> f64 {
    70.0
}

fn default_deterioration_t2108() -> f64 {
    65.0
}

impl Default for BidbackConfig {
    fn default() -> Self {
        Self {
            base_size_percentage: default_base_size_percentage(),
            max_portfolio_fraction: default_max_portfolio_fraction(),
            avoid_entry_t2108: default_avoid_entry_t2108(),
            deterioration_t2108: default_deterioration_t2108(),
        }
    }
}

impl BidbackConfig {
    /// 기본값으로 새 설정을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 보수적인 설정 (작은 기본 비율, 낮은 상한).
    ///
    /// 프리셋은 사이징 비율만 바꾸며 T2108 진입 회피/악화 임계값은 기본값(70/65)을 유지합니다.
    pub fn conservative() -> Self {
        Self {
            base_size_percentage: dec!(0.10),
            max_portfolio_fraction: dec!(0.20),
            ..Self::default()
        }
    }

    /// 공격적인 설정 (큰 기본 비율, 상한은 절대 상한 그대로).
    pub fn aggressive() -> Self {
        Self {
            base_size_percentage: dec!(0.20),
            max_portfolio_fraction: ABSOLUTE_MAX_PORTFOLIO_FRACTION,
            ..Self::default()
        }
    }

    /// 기본 비율을 변경합니다.
    pub fn with_base_size_percentage(mut self, pct: Decimal) -> Self {
        self.base_size_percentage = pct;
        self
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.base_size_percentage <= Decimal::ZERO || self.base_size_percentage > Decimal::ONE
        {
            return Err(ConfigValidationError::InvalidValue(
                "base_size_percentage must be in (0, 1]".into(),
            ));
        }

        if self.max_portfolio_fraction <= Decimal::ZERO
            || self.max_portfolio_fraction > ABSOLUTE_MAX_PORTFOLIO_FRACTION
        {
            return Err(ConfigValidationError::InvalidValue(format!(
                "max_portfolio_fraction must be in (0, {}]",
                ABSOLUTE_MAX_PORTFOLIO_FRACTION
            )));
        }

        for (name, value) in [
            ("avoid_entry_t2108", self.avoid_entry_t2108),
            ("deterioration_t2108", self.deterioration_t2108),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "{} must be between 0 and 100",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// 설정 검증 오류.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BidbackConfig::default();

        assert_eq!(config.base_size_percentage, dec!(0.15));
        assert_eq!(config.max_portfolio_fraction, dec!(0.30));
        assert_eq!(config.avoid_entry_t2108, 70.0);
        assert_eq!(config.deterioration_t2108, 65.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(BidbackConfig::conservative().validate().is_ok());
        assert!(BidbackConfig::aggressive().validate().is_ok());
        assert!(
            BidbackConfig::conservative().max_portfolio_fraction
                < BidbackConfig::aggressive().max_portfolio_fraction
        );
    }

    #[test]
    fn test_presets_keep_t2108_thresholds() {
        for preset in [BidbackConfig::conservative(), BidbackConfig::aggressive()] {
            assert_eq!(preset.avoid_entry_t2108, 70.0);
            assert_eq!(preset.deterioration_t2108, 65.0);
        }
    }

    #[test]
    fn test_cap_cannot_be_raised() {
        let config = BidbackConfig {
            max_portfolio_fraction: dec!(0.35),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_base_size() {
        assert!(BidbackConfig::new()
            .with_base_size_percentage(Decimal::ZERO)
            .validate()
            .is_err());
        assert!(BidbackConfig::new()
            .with_base_size_percentage(dec!(1.5))
            .validate()
            .is_err());
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: BidbackConfig =
            serde_json::from_str(r#"{"base_size_percentage":"0.10"}"#).unwrap();
        assert_eq!(config.base_size_percentage, dec!(0.10));
        assert_eq!(config.max_portfolio_fraction, dec!(0.30));
    }
}
