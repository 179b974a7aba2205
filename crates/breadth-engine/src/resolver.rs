//! 필드 값 해석 파이프라인.
//!
//! 레거시 호환용 심(shim)입니다. 과거 저장 형식(보조 주석 값, 상관 추정치,
//! 옛 컬럼 이름)에 흩어진 값을 정해진 순서의 추출기로 찾아냅니다.
//! 새 데이터 소스는 정식 필드를 채워야 하며 이 파이프라인을 확장하지 않습니다.
//!
//! 정책: 순서대로 실행해 처음 `Some`을 반환한 추출기가 이깁니다.
//! 추출기 간 값이 달라도 비교하거나 보정하지 않습니다.

use breadth_core::{BreadthRecord, RawBreadthRecord, Sector};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// 상승/하락 종목 수에서 4% 이동 종목 수를 추정할 때 쓰는 계수.
const FOUR_PCT_CORRELATION: f64 = 0.12;

/// 해석 대상 필드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreadthField {
    AdvancingIssues,
    DecliningIssues,
    NewHighs,
    NewLows,
    UpVolume,
    DownVolume,
    StocksUp4Pct,
    StocksDown4Pct,
    StocksUp13Pct34Days,
    StocksDown13Pct34Days,
    StocksUp25PctQuarter,
    StocksDown25PctQuarter,
    StocksUp25PctMonth,
    StocksDown25PctMonth,
    StocksUp50PctMonth,
    StocksDown50PctMonth,
    Ratio5Day,
    Ratio10Day,
    T2108,
    Vix,
    IndexLevel,
    WordenUniverse,
}

impl BreadthField {
    /// 전체 필드 목록.
    pub const ALL: [BreadthField; 22] = [
        BreadthField::AdvancingIssues,
        BreadthField::DecliningIssues,
        BreadthField::NewHighs,
        BreadthField::NewLows,
        BreadthField::UpVolume,
        BreadthField::DownVolume,
        BreadthField::StocksUp4Pct,
        BreadthField::StocksDown4Pct,
        BreadthField::StocksUp13Pct34Days,
        BreadthField::StocksDown13Pct34Days,
        BreadthField::StocksUp25PctQuarter,
        BreadthField::StocksDown25PctQuarter,
        BreadthField::StocksUp25PctMonth,
        BreadthField::StocksDown25PctMonth,
        BreadthField::StocksUp50PctMonth,
        BreadthField::StocksDown50PctMonth,
        BreadthField::Ratio5Day,
        BreadthField::Ratio10Day,
        BreadthField::T2108,
        BreadthField::Vix,
        BreadthField::IndexLevel,
        BreadthField::WordenUniverse,
    ];

    /// 신뢰도 계산에 쓰이는 선택(보조) 필드.
    pub const SECONDARY: [BreadthField; 14] = [
        BreadthField::NewHighs,
        BreadthField::NewLows,
        BreadthField::UpVolume,
        BreadthField::DownVolume,
        BreadthField::StocksUp13Pct34Days,
        BreadthField::StocksDown13Pct34Days,
        BreadthField::StocksUp25PctQuarter,
        BreadthField::StocksDown25PctQuarter,
        BreadthField::StocksUp25PctMonth,
        BreadthField::StocksDown25PctMonth,
        BreadthField::StocksUp50PctMonth,
        BreadthField::StocksDown50PctMonth,
        BreadthField::Ratio5Day,
        BreadthField::Ratio10Day,
    ];

    /// 정식 필드 이름 (주석 키로도 사용).
    pub fn name(self) -> &'static str {
        match self {
            Self::AdvancingIssues => "advancing_issues",
            Self::DecliningIssues => "declining_issues",
            Self::NewHighs => "new_highs",
            Self::NewLows => "new_lows",
            Self::UpVolume => "up_volume",
            Self::DownVolume => "down_volume",
            Self::StocksUp4Pct => "stocks_up_4pct",
            Self::StocksDown4Pct => "stocks_down_4pct",
            Self::StocksUp13Pct34Days => "stocks_up_13pct_34days",
            Self::StocksDown13Pct34Days => "stocks_down_13pct_34days",
            Self::StocksUp25PctQuarter => "stocks_up_25pct_quarter",
            Self::StocksDown25PctQuarter => "stocks_down_25pct_quarter",
            Self::StocksUp25PctMonth => "stocks_up_25pct_month",
            Self::StocksDown25PctMonth => "stocks_down_25pct_month",
            Self::StocksUp50PctMonth => "stocks_up_50pct_month",
            Self::StocksDown50PctMonth => "stocks_down_50pct_month",
            Self::Ratio5Day => "ratio_5day",
            Self::Ratio10Day => "ratio_10day",
            Self::T2108 => "t2108",
            Self::Vix => "vix",
            Self::IndexLevel => "index_level",
            Self::WordenUniverse => "worden_universe",
        }
    }

    /// 옛 저장 형식의 컬럼 이름.
    pub fn legacy_names(self) -> &'static [&'static str] {
        match self {
            Self::StocksUp4Pct => &["stocks_up_4pct_daily", "up4%"],
            Self::StocksDown4Pct => &["stocks_down_4pct_daily", "down4%"],
            Self::Ratio5Day => &["5d", "ratio_5d"],
            Self::Ratio10Day => &["10d", "ratio_10d"],
            Self::T2108 => &["T2108"],
            Self::IndexLevel => &["sp500", "SP"],
            Self::AdvancingIssues => &["advancers"],
            Self::DecliningIssues => &["decliners"],
            _ => &[],
        }
    }

    /// 정식 이름이나 옛 컬럼 이름으로 필드를 찾습니다.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == key || f.legacy_names().contains(&key))
    }

    /// 원시 레코드의 정식 컬럼에 값을 넣습니다.
    pub fn assign(self, raw: &mut RawBreadthRecord, value: f64) {
        let slot = match self {
            Self::AdvancingIssues => &mut raw.advancing_issues,
            Self::DecliningIssues => &mut raw.declining_issues,
            Self::NewHighs => &mut raw.new_highs,
            Self::NewLows => &mut raw.new_lows,
            Self::UpVolume => &mut raw.up_volume,
            Self::DownVolume => &mut raw.down_volume,
            Self::StocksUp4Pct => &mut raw.stocks_up_4pct,
            Self::StocksDown4Pct => &mut raw.stocks_down_4pct,
            Self::StocksUp13Pct34Days => &mut raw.stocks_up_13pct_34days,
            Self::StocksDown13Pct34Days => &mut raw.stocks_down_13pct_34days,
            Self::StocksUp25PctQuarter => &mut raw.stocks_up_25pct_quarter,
            Self::StocksDown25PctQuarter => &mut raw.stocks_down_25pct_quarter,
            Self::StocksUp25PctMonth => &mut raw.stocks_up_25pct_month,
            Self::StocksDown25PctMonth => &mut raw.stocks_down_25pct_month,
            Self::StocksUp50PctMonth => &mut raw.stocks_up_50pct_month,
            Self::StocksDown50PctMonth => &mut raw.stocks_down_50pct_month,
            Self::Ratio5Day => &mut raw.ratio_5day,
            Self::Ratio10Day => &mut raw.ratio_10day,
            Self::T2108 => &mut raw.t2108,
            Self::Vix => &mut raw.vix,
            Self::IndexLevel => &mut raw.index_level,
            Self::WordenUniverse => &mut raw.worden_universe,
        };
        *slot = Some(value);
    }

    /// 원시 레코드의 정식 컬럼 값.
    pub fn raw_value(self, raw: &RawBreadthRecord) -> Option<f64> {
        match self {
            Self::AdvancingIssues => raw.advancing_issues,
            Self::DecliningIssues => raw.declining_issues,
            Self::NewHighs => raw.new_highs,
            Self::NewLows => raw.new_lows,
            Self::UpVolume => raw.up_volume,
            Self::DownVolume => raw.down_volume,
            Self::StocksUp4Pct => raw.stocks_up_4pct,
            Self::StocksDown4Pct => raw.stocks_down_4pct,
            Self::StocksUp13Pct34Days => raw.stocks_up_13pct_34days,
            Self::StocksDown13Pct34Days => raw.stocks_down_13pct_34days,
            Self::StocksUp25PctQuarter => raw.stocks_up_25pct_quarter,
            Self::StocksDown25PctQuarter => raw.stocks_down_25pct_quarter,
            Self::StocksUp25PctMonth => raw.stocks_up_25pct_month,
            Self::StocksDown25PctMonth => raw.stocks_down_25pct_month,
            Self::StocksUp50PctMonth => raw.stocks_up_50pct_month,
            Self::StocksDown50PctMonth => raw.stocks_down_50pct_month,
            Self::Ratio5Day => raw.ratio_5day,
            Self::Ratio10Day => raw.ratio_10day,
            Self::T2108 => raw.t2108,
            Self::Vix => raw.vix,
            Self::IndexLevel => raw.index_level,
            Self::WordenUniverse => raw.worden_universe,
        }
    }

    fn primary_value(self, record: &BreadthRecord) -> Option<f64> {
        let count = |v: Option<u32>| v.map(f64::from);
        match self {
            Self::AdvancingIssues => count(record.advancing_issues),
            Self::DecliningIssues => count(record.declining_issues),
            Self::NewHighs => count(record.new_highs),
            Self::NewLows => count(record.new_lows),
            Self::UpVolume => record.up_volume,
            Self::DownVolume => record.down_volume,
            Self::StocksUp4Pct => count(record.stocks_up_4pct),
            Self::StocksDown4Pct => count(record.stocks_down_4pct),
            Self::StocksUp13Pct34Days => count(record.stocks_up_13pct_34days),
            Self::StocksDown13Pct34Days => count(record.stocks_down_13pct_34days),
            Self::StocksUp25PctQuarter => count(record.stocks_up_25pct_quarter),
            Self::StocksDown25PctQuarter => count(record.stocks_down_25pct_quarter),
            Self::StocksUp25PctMonth => count(record.stocks_up_25pct_month),
            Self::StocksDown25PctMonth => count(record.stocks_down_25pct_month),
            Self::StocksUp50PctMonth => count(record.stocks_up_50pct_month),
            Self::StocksDown50PctMonth => count(record.stocks_down_50pct_month),
            Self::Ratio5Day => record.ratio_5day,
            Self::Ratio10Day => record.ratio_10day,
            Self::T2108 => record.t2108,
            Self::Vix => record.vix,
            Self::IndexLevel => record.index_level,
            Self::WordenUniverse => count(record.worden_universe),
        }
    }
}

impl fmt::Display for BreadthField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 값을 찾아낸 추출기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// 정제 레코드의 정식 필드
    PrimaryColumn,
    /// 구조화된 보조 값 (정식 이름 키)
    Annotation,
    /// 상승/하락 종목 수 기반 추정
    CorrelationEstimate,
    /// 옛 컬럼 이름
    LegacyColumn,
}

impl ResolutionSource {
    /// 추정치 여부.
    pub fn is_estimate(self) -> bool {
        self == Self::CorrelationEstimate
    }

    fn extract(self, field: BreadthField, record: &BreadthRecord) -> Option<f64> {
        match self {
            Self::PrimaryColumn => field.primary_value(record),
            Self::Annotation => record.annotations.get(field.name()).copied(),
            Self::CorrelationEstimate => {
                let base = match field {
                    BreadthField::StocksUp4Pct => record.advancing_issues,
                    BreadthField::StocksDown4Pct => record.declining_issues,
                    _ => None,
                }?;
                Some((f64::from(base) * FOUR_PCT_CORRELATION).round())
            }
            Self::LegacyColumn => field
                .legacy_names()
                .iter()
                .find_map(|name| record.legacy.get(*name).copied()),
        }
    }
}

/// 해석된 값과 출처.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolved {
    pub value: f64,
    pub source: ResolutionSource,
}

/// 알고리즘에 전달되는 해석 완료 입력.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedInputs {
    values: BTreeMap<BreadthField, Resolved>,
    pub sectors: BTreeMap<Sector, f64>,
}

impl ResolvedInputs {
    /// 필드 값.
    pub fn get(&self, field: BreadthField) -> Option<f64> {
        self.values.get(&field).map(|r| r.value)
    }

    /// 필드 값과 출처.
    pub fn resolved(&self, field: BreadthField) -> Option<Resolved> {
        self.values.get(&field).copied()
    }

    /// 값을 직접 설정합니다 (정식 필드 출처).
    pub fn with(mut self, field: BreadthField, value: f64) -> Self {
        self.values.insert(
            field,
            Resolved {
                value,
                source: ResolutionSource::PrimaryColumn,
            },
        );
        self
    }

    /// 섹터 값을 설정합니다.
    pub fn with_sector(mut self, sector: Sector, pct: f64) -> Self {
        self.sectors.insert(sector, pct);
        self
    }

    /// 추정으로 채워진 필드 목록.
    pub fn estimated_fields(&self) -> Vec<BreadthField> {
        self.values
            .iter()
            .filter(|(_, r)| r.source.is_estimate())
            .map(|(f, _)| *f)
            .collect()
    }

    /// 선택 필드(보조 필드 + 섹터) 중 채워진 비율.
    pub fn completeness(&self) -> f64 {
        let total = BreadthField::SECONDARY.len() + Sector::ALL.len();
        let present = BreadthField::SECONDARY
            .iter()
            .filter(|f| self.values.contains_key(*f))
            .count()
            + self.sectors.len().min(Sector::ALL.len());
        present as f64 / total as f64
    }
}

/// 순서 있는 추출기 목록.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    extractors: Vec<ResolutionSource>,
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self {
            extractors: vec![
                ResolutionSource::PrimaryColumn,
                ResolutionSource::Annotation,
                ResolutionSource::CorrelationEstimate,
                ResolutionSource::LegacyColumn,
            ],
        }
    }
}

impl FieldResolver {
    /// 추출기 순서를 지정해 생성.
    pub fn with_extractors(extractors: Vec<ResolutionSource>) -> Self {
        Self { extractors }
    }

    /// 단일 필드를 해석합니다.
    pub fn resolve(&self, record: &BreadthRecord, field: BreadthField) -> Option<Resolved> {
        self.extractors.iter().find_map(|source| {
            source
                .extract(field, record)
                .filter(|v| v.is_finite())
                .map(|value| Resolved {
                    value,
                    source: *source,
                })
        })
    }

    /// 모든 필드를 해석합니다.
    pub fn resolve_all(&self, record: &BreadthRecord) -> ResolvedInputs {
        let values = BreadthField::ALL
            .iter()
            .filter_map(|field| self.resolve(record, *field).map(|r| (*field, r)))
            .collect();
        ResolvedInputs {
            values,
            sectors: record.sectors.clone(),
        }
    }
}
