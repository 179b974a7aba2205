//! 컴포넌트 점수 합성.
//!
//! 가중 합으로 원점수를 만들고, 스케일링 정책에 따라 [min, max]로 변환하며,
//! 입력 완전도와 데이터 품질로 신뢰도를 계산합니다.

use breadth_core::{BreadthCalculationConfig, ComponentScores, NormalizationMode};

/// 시그모이드 정규화 기울기.
const SIGMOID_GAIN: f64 = 6.0;

/// 합성 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    /// 가중 합 (내부 단위 구간 [0,1])
    pub raw_score: f64,
    /// [min_score, max_score]로 제한된 점수
    pub normalized_score: f64,
    /// (0, 1]
    pub confidence: f64,
    pub warnings: Vec<String>,
}

/// 점수 합성기.
#[derive(Debug, Clone, Copy)]
pub struct ScoreCompositor {
    min_confidence: f64,
    sparse_warning_threshold: f64,
}

impl Default for ScoreCompositor {
    fn default() -> Self {
        Self::new(0.1, 0.5)
    }
}

impl ScoreCompositor {
    /// 신뢰도 하한과 희소 경고 임계값으로 생성.
    ///
    /// 하한이 (0, 1] 밖이면 기본값 0.1을 사용합니다.
    pub fn new(min_confidence: f64, sparse_warning_threshold: f64) -> Self {
        let min_confidence = if min_confidence > 0.0 && min_confidence <= 1.0 {
            min_confidence
        } else {
            0.1
        };
        Self {
            min_confidence,
            sparse_warning_threshold,
        }
    }

    /// 가중 원점수 (가중치 합으로 재정규화).
    pub fn raw_score(components: &ComponentScores, config: &BreadthCalculationConfig) -> f64 {
        let w = &config.weights;
        let sum = w.sum();
        if sum <= 0.0 {
            return 0.5;
        }
        let weighted = w.primary * components.primary_score
            + w.secondary * components.secondary_score
            + w.reference * components.reference_score
            + w.sector * components.sector_score;
        (weighted / sum).clamp(0.0, 1.0)
    }

    /// 단위 구간 값을 스케일링 정책 범위로 변환.
    pub fn rescale(raw: f64, config: &BreadthCalculationConfig) -> f64 {
        let scaling = &config.scaling;
        let unit = match scaling.normalization {
            NormalizationMode::Linear => raw,
            NormalizationMode::Sigmoid => 1.0 / (1.0 + (-SIGMOID_GAIN * (raw - 0.5)).exp()),
        };
        let scaled = scaling.min_score + unit * (scaling.max_score - scaling.min_score);
        scaling.clamp(scaled)
    }

    /// 신뢰도: `max(min_confidence, completeness × quality)`, 상한 1.0.
    pub fn confidence(&self, completeness: f64, data_quality: f64) -> f64 {
        let completeness = if completeness.is_finite() {
            completeness.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let quality = if data_quality.is_finite() {
            (data_quality / 100.0).clamp(0.0, 1.0)
        } else {
            1.0
        };
        (completeness * quality).max(self.min_confidence).min(1.0)
    }

    /// 컴포넌트 점수를 합성합니다.
    pub fn compose(
        &self,
        components: &ComponentScores,
        config: &BreadthCalculationConfig,
        completeness: f64,
        data_quality: f64,
    ) -> Composite {
        let mut warnings = Vec::new();

        if !config.weights.is_unit_sum() {
            warnings.push(format!(
                "weights sum to {:.4}; renormalized to 1.0",
                config.weights.sum()
            ));
        }
        if completeness < self.sparse_warning_threshold {
            warnings.push(format!(
                "sparse input: {:.0}% of optional secondary/sector fields present",
                completeness * 100.0
            ));
        }

        let raw_score = Self::raw_score(components, config);
        Composite {
            raw_score,
            normalized_score: Self::rescale(raw_score, config),
            confidence: self.confidence(completeness, data_quality),
            warnings,
        }
    }
}
