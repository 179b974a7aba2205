//! 버전 관리되는 breadth 계산 설정.
//!
//! 알고리즘 유형, 컴포넌트 가중치, 스케일링 정책을 묶은 설정 스키마와
//! 기본값 규칙을 정의합니다. 저장은 외부 협력자의 몫이지만
//! 스키마와 검증 규칙은 코어에 속합니다.

use crate::error::{BreadthError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 점수 계산 알고리즘 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmType {
    /// 4%/13%/25%/50% 이동 종목 수와 T2108을 조합한 6팩터 모델
    SixFactor,
    /// 순상승 폭을 로지스틱으로 정규화한 모델
    Normalized,
    /// 섹터 시가총액 가중 모델
    SectorWeighted,
    /// 5일/10일 비율 기반 사용자 모델
    Custom,
}

impl AlgorithmType {
    /// 전체 알고리즘 목록.
    pub const ALL: [AlgorithmType; 4] = [
        AlgorithmType::SixFactor,
        AlgorithmType::Normalized,
        AlgorithmType::SectorWeighted,
        AlgorithmType::Custom,
    ];

    /// 정식 식별자.
    pub fn id(self) -> &'static str {
        match self {
            Self::SixFactor => "six_factor",
            Self::Normalized => "normalized",
            Self::SectorWeighted => "sector_weighted",
            Self::Custom => "custom",
        }
    }

    /// 별칭 (레거시 UI 값 포함).
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::SixFactor => &["six-factor", "sixfactor", "6factor"],
            Self::Normalized => &["normalised", "norm"],
            Self::SectorWeighted => &["sector-weighted", "sector"],
            Self::Custom => &["user"],
        }
    }

    /// ID 또는 별칭으로 매칭.
    pub fn matches(self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        self.id() == q || self.aliases().contains(&q.as_str())
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AlgorithmType {
    type Err = BreadthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.matches(s))
            .ok_or_else(|| BreadthError::config(format!("Unknown algorithm type: {}", s)))
    }
}

/// 컴포넌트 가중치.
///
/// 음수가 아니어야 하며, 합이 1.0이 되도록 작성하는 것이 관례입니다.
/// 합이 1.0이 아니면 합성기가 합으로 나누어 재정규화합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub primary: f64,
    pub secondary: f64,
    pub reference: f64,
    pub sector: f64,
}

impl ComponentWeights {
    /// 새 가중치 생성.
    pub fn new(primary: f64, secondary: f64, reference: f64, sector: f64) -> Self {
        Self {
            primary,
            secondary,
            reference,
            sector,
        }
    }

    /// 가중치 합.
    pub fn sum(&self) -> f64 {
        self.primary + self.secondary + self.reference + self.sector
    }

    /// 합이 1.0인지 (허용 오차 1e-6).
    pub fn is_unit_sum(&self) -> bool {
        (self.sum() - 1.0).abs() <= 1e-6
    }

    fn as_array(&self) -> [(&'static str, f64); 4] {
        [
            ("primary", self.primary),
            ("secondary", self.secondary),
            ("reference", self.reference),
            ("sector", self.sector),
        ]
    }

    /// 가중치 검증.
    pub fn validate(&self) -> CoreResult<()> {
        for (name, w) in self.as_array() {
            if !w.is_finite() || w < 0.0 {
                return Err(BreadthError::config(format!(
                    "weight '{}' must be a non-negative number, got {}",
                    name, w
                )));
            }
        }
        if self.sum() <= 0.0 {
            return Err(BreadthError::config("weights must not all be zero"));
        }
        Ok(())
    }
}

/// 정규화 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// 내부 단위 구간 [0,1]을 선형으로 [min,max]에 매핑
    #[default]
    Linear,
    /// 0.5를 중심으로 로지스틱 곡선을 적용한 뒤 매핑
    Sigmoid,
}

/// 스케일링 정책.
///
/// 출력 점수 범위와 시장 국면 임계값을 함께 담습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    pub min_score: f64,
    pub max_score: f64,
    #[serde(default)]
    pub normalization: NormalizationMode,
    /// 이 값을 초과하면 BULL
    pub bull_threshold: f64,
    /// 이 값 미만이면 BEAR
    pub bear_threshold: f64,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            max_score: 100.0,
            normalization: NormalizationMode::Linear,
            bull_threshold: 60.0,
            bear_threshold: 40.0,
        }
    }
}

impl ScalingPolicy {
    /// 스케일링 정책 검증.
    pub fn validate(&self) -> CoreResult<()> {
        let values = [
            self.min_score,
            self.max_score,
            self.bull_threshold,
            self.bear_threshold,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BreadthError::config("scaling values must be finite"));
        }
        if self.min_score >= self.max_score {
            return Err(BreadthError::config(format!(
                "min_score ({}) must be less than max_score ({})",
                self.min_score, self.max_score
            )));
        }
        if self.bear_threshold > self.bull_threshold {
            return Err(BreadthError::config(format!(
                "bear_threshold ({}) must not exceed bull_threshold ({})",
                self.bear_threshold, self.bull_threshold
            )));
        }
        let in_range = |v: f64| v >= self.min_score && v <= self.max_score;
        if !in_range(self.bull_threshold) || !in_range(self.bear_threshold) {
            return Err(BreadthError::config(
                "phase thresholds must lie within [min_score, max_score]",
            ));
        }
        Ok(())
    }

    /// 점수를 [min, max]로 제한.
    pub fn clamp(&self, score: f64) -> f64 {
        score.clamp(self.min_score, self.max_score)
    }
}

/// 알고리즘 튜닝 파라미터.
///
/// 가중치/스케일링과 달리 알고리즘 함수가 직접 읽습니다.
/// 현재는 로지스틱 정규화 모델의 기울기만 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmParameters {
    /// 순상승 비율((adv - dec) / (adv + dec))에 곱하는 기울기
    pub net_advance_gain: f64,
    /// 섹터 평균의 0.5 대비 편차에 곱하는 기울기
    pub sector_gain: f64,
}

impl Default for AlgorithmParameters {
    fn default() -> Self {
        Self {
            net_advance_gain: 4.0,
            sector_gain: 6.0,
        }
    }
}

impl AlgorithmParameters {
    /// 파라미터 검증 (유한한 양수).
    pub fn validate(&self) -> CoreResult<()> {
        for (name, v) in [
            ("net_advance_gain", self.net_advance_gain),
            ("sector_gain", self.sector_gain),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(BreadthError::config(format!(
                    "parameter '{}' must be a positive number, got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }
}

/// 설정 버전 식별자.
///
/// 저장소가 단조 증가하는 번호를 부여하며, 0은 내장 기본 설정입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigVersion(pub u64);

impl ConfigVersion {
    /// 내장 기본 설정 버전.
    pub const BUILTIN: ConfigVersion = ConfigVersion(0);

    /// 내장 설정 여부.
    pub fn is_builtin(self) -> bool {
        self == Self::BUILTIN
    }
}

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// breadth 계산 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreadthCalculationConfig {
    pub version: ConfigVersion,
    pub name: String,
    pub algorithm: AlgorithmType,
    pub weights: ComponentWeights,
    pub scaling: ScalingPolicy,
    #[serde(default)]
    pub parameters: AlgorithmParameters,
    pub is_active: bool,
    /// 저장소 집합체의 기본 포인터에서 투영된 값
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl BreadthCalculationConfig {
    /// 알고리즘별 내장 기본 설정.
    pub fn builtin(algorithm: AlgorithmType) -> Self {
        let weights = match algorithm {
            AlgorithmType::SixFactor => ComponentWeights::new(0.40, 0.25, 0.20, 0.15),
            AlgorithmType::Normalized => ComponentWeights::new(0.35, 0.30, 0.20, 0.15),
            AlgorithmType::SectorWeighted => ComponentWeights::new(0.30, 0.20, 0.15, 0.35),
            AlgorithmType::Custom => ComponentWeights::new(0.25, 0.25, 0.25, 0.25),
        };
        let scaling = match algorithm {
            AlgorithmType::Normalized => ScalingPolicy {
                normalization: NormalizationMode::Sigmoid,
                ..ScalingPolicy::default()
            },
            _ => ScalingPolicy::default(),
        };

        Self {
            version: ConfigVersion::BUILTIN,
            name: format!("{} (builtin)", algorithm),
            algorithm,
            weights,
            scaling,
            parameters: AlgorithmParameters::default(),
            is_active: true,
            is_default: true,
            created_at: DateTime::<Utc>::default(),
        }
    }

    /// 가중치, 스케일링, 파라미터를 함께 검증.
    pub fn validate(&self) -> CoreResult<()> {
        self.weights.validate()?;
        self.scaling.validate()?;
        self.parameters.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_from_str_with_aliases() {
        assert_eq!(
            "six_factor".parse::<AlgorithmType>().unwrap(),
            AlgorithmType::SixFactor
        );
        assert_eq!(
            "Sector-Weighted".parse::<AlgorithmType>().unwrap(),
            AlgorithmType::SectorWeighted
        );
        let err = "momentum".parse::<AlgorithmType>().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_builtin_configs_are_valid() {
        for algorithm in AlgorithmType::ALL {
            let config = BreadthCalculationConfig::builtin(algorithm);
            assert!(config.validate().is_ok(), "{} builtin invalid", algorithm);
            assert!(config.weights.is_unit_sum());
            assert!(config.version.is_builtin());
        }
    }

    #[test]
    fn test_weights_reject_negative_and_zero() {
        assert!(ComponentWeights::new(-0.1, 0.5, 0.3, 0.3).validate().is_err());
        assert!(ComponentWeights::new(0.0, 0.0, 0.0, 0.0).validate().is_err());
        assert!(ComponentWeights::new(f64::NAN, 0.5, 0.3, 0.2).validate().is_err());
        assert!(ComponentWeights::new(0.5, 0.5, 0.5, 0.5).validate().is_ok());
    }

    #[test]
    fn test_scaling_validation() {
        assert!(ScalingPolicy::default().validate().is_ok());

        let inverted = ScalingPolicy {
            min_score: 10.0,
            max_score: 10.0,
            ..ScalingPolicy::default()
        };
        assert!(inverted.validate().is_err());

        let crossed = ScalingPolicy {
            bull_threshold: 30.0,
            bear_threshold: 70.0,
            ..ScalingPolicy::default()
        };
        assert!(crossed.validate().is_err());

        let outside = ScalingPolicy {
            bull_threshold: 120.0,
            ..ScalingPolicy::default()
        };
        assert!(outside.validate().is_err());
    }

    #[test]
    fn test_parameters_default_when_absent() {
        let mut json = serde_json::to_value(BreadthCalculationConfig::builtin(
            AlgorithmType::Normalized,
        ))
        .unwrap();
        json.as_object_mut().unwrap().remove("parameters");
        let config: BreadthCalculationConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.parameters, AlgorithmParameters::default());

        let flat = AlgorithmParameters {
            sector_gain: 0.0,
            ..Default::default()
        };
        assert!(flat.validate().is_err());
    }

    #[test]
    fn test_config_version_display() {
        assert_eq!(ConfigVersion(3).to_string(), "v3");
        assert!(ConfigVersion::BUILTIN.is_builtin());
    }
}
