//! 점수 계산 알고리즘 레지스트리.
//!
//! 각 알고리즘은 `(ResolvedInputs, Config) → AlgorithmOutput` 형태의 순수 함수이며
//! 전역 계산기 객체는 없습니다. 알고리즘이 설정에서 읽는 값은 `parameters`뿐이고
//! (현재 `normalized`의 로지스틱 기울기), 가중치와 스케일링은 합성기가 적용합니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! let entry = AlgorithmRegistry::find("sector-weighted")?;
//! let output = (entry.compute)(&inputs, &config);
//! ```

mod custom;
mod normalized;
mod sector_weighted;
mod six_factor;

use crate::resolver::{BreadthField, ResolvedInputs};
use breadth_core::{
    AlgorithmType, BreadthCalculationConfig, BreadthError, ComponentScores, CoreResult,
};

/// 중립 점수.
pub const NEUTRAL: f64 = 0.5;

/// 알고리즘 계산 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmOutput {
    /// [0,1] 구간의 컴포넌트 점수와 순상승 폭
    pub components: ComponentScores,
    /// 입력이 없어 중립값(0.5)으로 대체된 컴포넌트 이름
    pub fallbacks: Vec<&'static str>,
}

impl AlgorithmOutput {
    fn new() -> Self {
        Self {
            components: ComponentScores::neutral(),
            fallbacks: Vec::new(),
        }
    }

    /// 값이 있으면 [0,1]로 제한해 반환하고, 없으면 중립값을 쓰고 기록합니다.
    fn score_or_neutral(&mut self, component: &'static str, value: Option<f64>) -> f64 {
        match value {
            Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
            _ => {
                self.fallbacks.push(component);
                NEUTRAL
            }
        }
    }
}

/// 알고리즘 함수 시그니처.
///
/// 설정 파라미터를 쓰지 않는 알고리즘은 두 번째 인자를 무시합니다.
pub type AlgorithmFn = fn(&ResolvedInputs, &BreadthCalculationConfig) -> AlgorithmOutput;

/// 레지스트리 항목.
#[derive(Clone, Copy)]
pub struct AlgorithmEntry {
    pub algorithm: AlgorithmType,
    pub description: &'static str,
    pub compute: AlgorithmFn,
}

impl std::fmt::Debug for AlgorithmEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmEntry")
            .field("algorithm", &self.algorithm)
            .field("description", &self.description)
            .finish()
    }
}

static ENTRIES: [AlgorithmEntry; 4] = [
    AlgorithmEntry {
        algorithm: AlgorithmType::SixFactor,
        description: "4% daily ratio, four longer-horizon move ratios and T2108",
        compute: six_factor::compute,
    },
    AlgorithmEntry {
        algorithm: AlgorithmType::Normalized,
        description: "Logistic net advances, new high/low ratio and sector participation",
        compute: normalized::compute,
    },
    AlgorithmEntry {
        algorithm: AlgorithmType::SectorWeighted,
        description: "Market-cap weighted sector breadth with volume confirmation",
        compute: sector_weighted::compute,
    },
    AlgorithmEntry {
        algorithm: AlgorithmType::Custom,
        description: "Rolling 5-day and 10-day up/down 4% ratios",
        compute: custom::compute,
    },
];

/// 고정된 알고리즘 레지스트리.
pub struct AlgorithmRegistry;

impl AlgorithmRegistry {
    /// 알고리즘 유형으로 항목 조회.
    pub fn get(algorithm: AlgorithmType) -> &'static AlgorithmEntry {
        match algorithm {
            AlgorithmType::SixFactor => &ENTRIES[0],
            AlgorithmType::Normalized => &ENTRIES[1],
            AlgorithmType::SectorWeighted => &ENTRIES[2],
            AlgorithmType::Custom => &ENTRIES[3],
        }
    }

    /// ID 또는 별칭으로 항목 조회.
    pub fn find(name: &str) -> CoreResult<&'static AlgorithmEntry> {
        ENTRIES
            .iter()
            .find(|e| e.algorithm.matches(name))
            .ok_or_else(|| BreadthError::config(format!("Unknown algorithm type: {}", name)))
    }

    /// 전체 항목.
    pub fn all() -> &'static [AlgorithmEntry] {
        &ENTRIES
    }

    /// 등록된 ID 목록.
    pub fn list_ids() -> Vec<&'static str> {
        ENTRIES.iter().map(|e| e.algorithm.id()).collect()
    }
}

/// 상승 비율 up / (up + down). 합이 0이면 `None`.
pub(crate) fn up_ratio(up: Option<f64>, down: Option<f64>) -> Option<f64> {
    let (up, down) = (up?, down?);
    let total = up + down;
    (total > 0.0).then(|| up / total)
}

/// 0 이상의 비율 r을 r / (1 + r)로 [0,1)에 매핑 (r = 1 → 0.5).
pub(crate) fn ratio_to_unit(ratio: Option<f64>) -> Option<f64> {
    ratio.filter(|r| *r >= 0.0).map(|r| r / (1.0 + r))
}

/// T2108(0~100)을 [0,1]로 매핑.
pub(crate) fn t2108_unit(inputs: &ResolvedInputs) -> Option<f64> {
    inputs.get(BreadthField::T2108).map(|t| t / 100.0)
}

/// 섹터 비율 평균을 [0,1]로 매핑.
pub(crate) fn mean_sector_unit(inputs: &ResolvedInputs) -> Option<f64> {
    if inputs.sectors.is_empty() {
        return None;
    }
    let sum: f64 = inputs.sectors.values().sum();
    Some(sum / inputs.sectors.len() as f64 / 100.0)
}

/// 순상승 폭: 상승/하락 종목 수가 있으면 그 차이, 없으면 4% 이동 종목 수 차이.
pub(crate) fn net_advances(inputs: &ResolvedInputs) -> f64 {
    let issues = (
        inputs.get(BreadthField::AdvancingIssues),
        inputs.get(BreadthField::DecliningIssues),
    );
    let four_pct = (
        inputs.get(BreadthField::StocksUp4Pct),
        inputs.get(BreadthField::StocksDown4Pct),
    );
    match (issues, four_pct) {
        ((Some(adv), Some(dec)), _) => adv - dec,
        (_, (Some(up), Some(down))) => up - down,
        _ => 0.0,
    }
}
