//! 일별 market breadth 레코드.
//!
//! 외부 협력자(CSV 임포트, DB)가 넘겨주는 원시 레코드와
//! 검증 게이트를 통과한 정제 레코드를 정의합니다.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::{Validate, ValidationError};

/// 레코드 날짜 형식.
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/// 가장 이른 허용 날짜.
pub fn earliest_record_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2007, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// 레코드 날짜를 해석합니다 (앞뒤 공백 무시).
pub fn parse_record_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), RECORD_DATE_FORMAT).ok()
}

// ==================== 커스텀 검증 함수 ====================

/// 날짜 형식과 하한 검증. 미래 상한은 기준일을 아는 검증 게이트가 확인합니다.
fn validate_record_date(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("is required".into()));
    }
    match parse_record_date(value) {
        None => Err(ValidationError::new("invalid_date_format").with_message(
            format!("'{}' is not a valid YYYY-MM-DD date", value.trim()).into(),
        )),
        Some(date) if date < earliest_record_date() => Err(ValidationError::new("date_too_early")
            .with_message("must not be before 2007-01-01".into())),
        Some(_) => Ok(()),
    }
}

/// NaN/무한대 거부. 범위 검증은 NaN을 통과시키므로 함께 붙입니다.
fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("not_finite").with_message("must be a finite number".into()))
    }
}

/// 위반 키를 `keys` 파라미터에 담은 에러.
fn keyed_error(code: &'static str, message: &'static str, keys: Vec<String>) -> ValidationError {
    let mut err = ValidationError::new(code).with_message(message.into());
    err.add_param("keys".into(), &keys);
    err
}

/// 섹터 비율 검증 (0~100).
fn validate_sector_pcts(sectors: &BTreeMap<Sector, f64>) -> Result<(), ValidationError> {
    let offending: Vec<String> = sectors
        .iter()
        .filter(|(_, pct)| !pct.is_finite() || !(0.0..=100.0).contains(*pct))
        .map(|(sector, _)| sector.as_str().to_string())
        .collect();
    if offending.is_empty() {
        Ok(())
    } else {
        Err(keyed_error("sector_out_of_range", "must be between 0 and 100", offending))
    }
}

/// 보조/레거시 값은 최소한 유한한 수여야 합니다.
fn validate_finite_values(values: &BTreeMap<String, f64>) -> Result<(), ValidationError> {
    let offending: Vec<String> = values
        .iter()
        .filter(|(_, v)| !v.is_finite())
        .map(|(key, _)| key.clone())
        .collect();
    if offending.is_empty() {
        Ok(())
    } else {
        Err(keyed_error("not_finite", "must be a finite number", offending))
    }
}

/// GICS 11개 섹터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    CommunicationServices,
    ConsumerDiscretionary,
    ConsumerStaples,
    Energy,
    Financials,
    HealthCare,
    Industrials,
    InformationTechnology,
    Materials,
    RealEstate,
    Utilities,
}

impl Sector {
    /// 전체 섹터 목록.
    pub const ALL: [Sector; 11] = [
        Sector::CommunicationServices,
        Sector::ConsumerDiscretionary,
        Sector::ConsumerStaples,
        Sector::Energy,
        Sector::Financials,
        Sector::HealthCare,
        Sector::Industrials,
        Sector::InformationTechnology,
        Sector::Materials,
        Sector::RealEstate,
        Sector::Utilities,
    ];

    /// snake_case 식별자.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommunicationServices => "communication_services",
            Self::ConsumerDiscretionary => "consumer_discretionary",
            Self::ConsumerStaples => "consumer_staples",
            Self::Energy => "energy",
            Self::Financials => "financials",
            Self::HealthCare => "health_care",
            Self::Industrials => "industrials",
            Self::InformationTechnology => "information_technology",
            Self::Materials => "materials",
            Self::RealEstate => "real_estate",
            Self::Utilities => "utilities",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 검증 전 원시 breadth 레코드.
///
/// 모든 필드는 선택적이며, 수치는 임포트 경계에서 변환된 그대로의 `f64`입니다.
/// 하루에 한 번 생성되고 호출자가 소유합니다.
///
/// 범위 규칙은 `validator` 속성으로 선언되며 [`Validate::validate`]가
/// 위반된 모든 필드를 한 번에 모읍니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RawBreadthRecord {
    /// 거래일 (YYYY-MM-DD)
    #[validate(required(message = "is required"), custom(function = "validate_record_date"))]
    pub date: Option<String>,
    /// 수집 시각
    pub timestamp: Option<DateTime<Utc>>,

    /// 상승 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub advancing_issues: Option<f64>,
    /// 하락 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub declining_issues: Option<f64>,
    /// 신고가 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub new_highs: Option<f64>,
    /// 신저가 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub new_lows: Option<f64>,
    /// 상승 거래량
    #[validate(range(min = 0.0, message = "cannot be negative"), custom(function = "validate_finite"))]
    pub up_volume: Option<f64>,
    /// 하락 거래량
    #[validate(range(min = 0.0, message = "cannot be negative"), custom(function = "validate_finite"))]
    pub down_volume: Option<f64>,

    /// 당일 4% 이상 상승 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub stocks_up_4pct: Option<f64>,
    /// 당일 4% 이상 하락 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub stocks_down_4pct: Option<f64>,
    /// 34일간 13% 이상 상승 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub stocks_up_13pct_34days: Option<f64>,
    /// 34일간 13% 이상 하락 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub stocks_down_13pct_34days: Option<f64>,
    /// 분기 25% 이상 상승 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub stocks_up_25pct_quarter: Option<f64>,
    /// 분기 25% 이상 하락 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub stocks_down_25pct_quarter: Option<f64>,
    /// 월간 25% 이상 상승 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub stocks_up_25pct_month: Option<f64>,
    /// 월간 25% 이상 하락 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub stocks_down_25pct_month: Option<f64>,
    /// 월간 50% 이상 상승 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub stocks_up_50pct_month: Option<f64>,
    /// 월간 50% 이상 하락 종목 수
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"), custom(function = "validate_finite"))]
    pub stocks_down_50pct_month: Option<f64>,

    /// 5일 상승/하락 4% 비율
    #[validate(range(min = 0.001, max = 100.0, message = "must be between 0.001 and 100"), custom(function = "validate_finite"))]
    pub ratio_5day: Option<f64>,
    /// 10일 상승/하락 4% 비율
    #[validate(range(min = 0.001, max = 100.0, message = "must be between 0.001 and 100"), custom(function = "validate_finite"))]
    pub ratio_10day: Option<f64>,

    /// T2108 (40일선 상회 종목 비율, 0~100)
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"), custom(function = "validate_finite"))]
    pub t2108: Option<f64>,
    /// VIX
    #[validate(range(min = 0.0, max = 150.0, message = "must be between 0 and 150"), custom(function = "validate_finite"))]
    pub vix: Option<f64>,
    /// 기준 지수 (S&P 500)
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"), custom(function = "validate_finite"))]
    pub index_level: Option<f64>,
    /// Worden 보통주 유니버스 크기
    #[validate(range(min = 1.0, max = 10000.0, message = "must be between 1 and 10000"), custom(function = "validate_finite"))]
    pub worden_universe: Option<f64>,

    /// 섹터별 비율 (0~100)
    #[validate(custom(function = "validate_sector_pcts"))]
    pub sectors: BTreeMap<Sector, f64>,

    /// 데이터 품질 점수 (0~100)
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"), custom(function = "validate_finite"))]
    pub data_quality: Option<f64>,

    /// 구조화된 보조 값 (정식 필드 이름 → 값)
    #[validate(custom(function = "validate_finite_values"))]
    pub annotations: BTreeMap<String, f64>,

    /// 레거시 컬럼 이름으로 저장된 값
    #[validate(custom(function = "validate_finite_values"))]
    pub legacy: BTreeMap<String, f64>,
}

impl RawBreadthRecord {
    /// 날짜만 채워진 레코드 생성.
    pub fn for_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Default::default()
        }
    }
}

/// 검증 게이트를 통과한 breadth 레코드.
///
/// 검증 이후에는 변경되지 않습니다. 종목 수 필드는 0 이상의 정수로 정제됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreadthRecord {
    pub date: NaiveDate,
    pub timestamp: Option<DateTime<Utc>>,

    pub advancing_issues: Option<u32>,
    pub declining_issues: Option<u32>,
    pub new_highs: Option<u32>,
    pub new_lows: Option<u32>,
    pub up_volume: Option<f64>,
    pub down_volume: Option<f64>,

    pub stocks_up_4pct: Option<u32>,
    pub stocks_down_4pct: Option<u32>,
    pub stocks_up_13pct_34days: Option<u32>,
    pub stocks_down_13pct_34days: Option<u32>,
    pub stocks_up_25pct_quarter: Option<u32>,
    pub stocks_down_25pct_quarter: Option<u32>,
    pub stocks_up_25pct_month: Option<u32>,
    pub stocks_down_25pct_month: Option<u32>,
    pub stocks_up_50pct_month: Option<u32>,
    pub stocks_down_50pct_month: Option<u32>,

    pub ratio_5day: Option<f64>,
    pub ratio_10day: Option<f64>,

    pub t2108: Option<f64>,
    pub vix: Option<f64>,
    pub index_level: Option<f64>,
    pub worden_universe: Option<u32>,

    pub sectors: BTreeMap<Sector, f64>,
    pub data_quality: Option<f64>,

    pub annotations: BTreeMap<String, f64>,
    pub legacy: BTreeMap<String, f64>,
}

impl BreadthRecord {
    /// 날짜만 있는 빈 레코드.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            timestamp: None,
            advancing_issues: None,
            declining_issues: None,
            new_highs: None,
            new_lows: None,
            up_volume: None,
            down_volume: None,
            stocks_up_4pct: None,
            stocks_down_4pct: None,
            stocks_up_13pct_34days: None,
            stocks_down_13pct_34days: None,
            stocks_up_25pct_quarter: None,
            stocks_down_25pct_quarter: None,
            stocks_up_25pct_month: None,
            stocks_down_25pct_month: None,
            stocks_up_50pct_month: None,
            stocks_down_50pct_month: None,
            ratio_5day: None,
            ratio_10day: None,
            t2108: None,
            vix: None,
            index_level: None,
            worden_universe: None,
            sectors: BTreeMap::new(),
            data_quality: None,
            annotations: BTreeMap::new(),
            legacy: BTreeMap::new(),
        }
    }

    /// 데이터 품질 (없으면 100).
    pub fn data_quality_or_full(&self) -> f64 {
        self.data_quality.unwrap_or(100.0)
    }
}
