//! Breadth 점수 계산 결과.

use super::calculation_config::{AlgorithmType, ConfigVersion};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 시장 국면.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketPhase {
    /// 정규화 점수가 상단 임계값 초과
    Bull,
    /// 정규화 점수가 하단 임계값 미만
    Bear,
    /// 그 외
    #[default]
    Neutral,
}

impl fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bull => "BULL",
            Self::Bear => "BEAR",
            Self::Neutral => "NEUTRAL",
        };
        write!(f, "{}", s)
    }
}

/// 1차 breadth 신호의 강도.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStrength {
    Weak,
    Moderate,
    Strong,
}

impl fmt::Display for MarketStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Weak => "weak",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
        };
        write!(f, "{}", s)
    }
}

/// 상승/하락 종목 차이의 부호.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Flat => "flat",
        };
        write!(f, "{}", s)
    }
}

/// 시장 상태 (국면/강도/방향).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCondition {
    pub phase: MarketPhase,
    pub strength: MarketStrength,
    pub trend_direction: TrendDirection,
}

/// 컴포넌트별 점수.
///
/// 네 점수는 모두 내부 단위 구간 [0, 1]에 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub primary_score: f64,
    pub secondary_score: f64,
    pub reference_score: f64,
    pub sector_score: f64,
    /// 상승류 - 하락류 종목 수 (추세 방향 판단용)
    pub net_advances: f64,
}

impl ComponentScores {
    /// 모든 컴포넌트가 중립(0.5)인 점수.
    pub fn neutral() -> Self {
        Self {
            primary_score: 0.5,
            secondary_score: 0.5,
            reference_score: 0.5,
            sector_score: 0.5,
            net_advances: 0.0,
        }
    }
}

/// 계산 메타데이터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub algorithm_used: AlgorithmType,
    pub config_version: ConfigVersion,
    pub calculation_time: DateTime<Utc>,
    /// 입력 레코드의 데이터 품질 (0~100)
    pub data_quality: f64,
    pub warnings: Vec<String>,
}

/// 일별 breadth 점수 결과.
///
/// 입력 레코드마다 하나씩 생성되며 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreadthResult {
    pub date: NaiveDate,
    pub raw_score: f64,
    /// [min_score, max_score]로 제한된 점수
    pub normalized_score: f64,
    /// (0, 1]
    pub confidence: f64,
    pub components: ComponentScores,
    pub market_condition: MarketCondition,
    pub metadata: ResultMetadata,
}

impl BreadthResult {
    /// 경고가 하나라도 있는지.
    pub fn has_warnings(&self) -> bool {
        !self.metadata.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serde_uppercase() {
        assert_eq!(serde_json::to_string(&MarketPhase::Bull).unwrap(), "\"BULL\"");
        assert_eq!(MarketPhase::Neutral.to_string(), "NEUTRAL");
        assert_eq!(MarketPhase::default(), MarketPhase::Neutral);
    }

    #[test]
    fn test_strength_ordering() {
        assert!(MarketStrength::Weak < MarketStrength::Moderate);
        assert!(MarketStrength::Moderate < MarketStrength::Strong);
        assert_eq!(
            serde_json::to_string(&MarketStrength::Moderate).unwrap(),
            "\"moderate\""
        );
    }
}
