//! 시장 상태 분류.
//!
//! 정규화 점수와 컴포넌트 점수만으로 국면/강도/방향을 결정하는 순수 함수입니다.

use breadth_core::{
    ComponentScores, MarketCondition, MarketPhase, MarketStrength, ScalingPolicy, TrendDirection,
};

/// 이 값 미만이면 weak.
const WEAK_BELOW: f64 = 0.25;
/// 이 값 미만이면 moderate, 이상이면 strong.
const MODERATE_BELOW: f64 = 0.6;

/// 국면: 상단 임계값 초과 BULL, 하단 임계값 미만 BEAR.
pub fn phase(normalized_score: f64, scaling: &ScalingPolicy) -> MarketPhase {
    if normalized_score > scaling.bull_threshold {
        MarketPhase::Bull
    } else if normalized_score < scaling.bear_threshold {
        MarketPhase::Bear
    } else {
        MarketPhase::Neutral
    }
}

/// 강도: 1차 신호가 중립(0.5)에서 벗어난 정도 `|primary - 0.5| × 2`.
pub fn strength(primary_score: f64) -> MarketStrength {
    let magnitude = ((primary_score - 0.5).abs() * 2.0).min(1.0);
    if magnitude < WEAK_BELOW {
        MarketStrength::Weak
    } else if magnitude < MODERATE_BELOW {
        MarketStrength::Moderate
    } else {
        MarketStrength::Strong
    }
}

/// 방향: 순상승 폭의 부호.
pub fn trend_direction(net_advances: f64) -> TrendDirection {
    if net_advances > 0.0 {
        TrendDirection::Up
    } else if net_advances < 0.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    }
}

/// 시장 상태를 분류합니다.
pub fn classify(
    normalized_score: f64,
    components: &ComponentScores,
    scaling: &ScalingPolicy,
) -> MarketCondition {
    MarketCondition {
        phase: phase(normalized_score, scaling),
        strength: strength(components.primary_score),
        trend_direction: trend_direction(components.net_advances),
    }
}
